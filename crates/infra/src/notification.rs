//! # 通知送信
//!
//! 送信プロバイダへのメール送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **4 つの実装**: SendGrid（本番既定）、SMTP（Mailpit 等のローカル検証）、SES、Noop
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **送信元は実装が保持**: 呼び出し側は宛先・件名・本文だけを渡す

mod noop;
mod sendgrid;
mod ses;
mod smtp;

use async_trait::async_trait;
use bcimail_domain::notification::{EmailMessage, NotificationError};
pub use noop::NoopNotificationSender;
pub use sendgrid::SendGridNotificationSender;
pub use ses::{SesNotificationSender, create_client as create_ses_client};
pub use smtp::SmtpNotificationSender;

/// メール送信トレイト
///
/// プロバイダが受理した場合に `Ok(())`、拒否・通信失敗は
/// [`NotificationError::SendFailed`] を返す。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}
