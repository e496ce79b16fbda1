//! # 配信ログ
//!
//! 送信試行 1 回につき 1 件だけ追記されるレコード。成功・失敗どちらも記録する。
//!
//! ## 不変条件
//!
//! - `status = failed` のときに限り `error_message` を持つ（[`DeliveryOutcome`] で表現）
//! - 追記専用。更新・削除しない
//! - 宛先メールアドレスと受信者名は送信時点の値を複製して保持する

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{customer::CustomerId, notification::EmailType};

/// 配信ログ ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(transparent)]
#[display("{_0}")]
pub struct EmailLogId(i64);

impl EmailLogId {
    pub fn from_i64(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// 送信ステータス
///
/// `email_logs.status` カラムに格納される値。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// 送信結果
///
/// 失敗時のみエラーメッセージを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed { error_message: String },
}

impl DeliveryOutcome {
    pub fn status(&self) -> DeliveryStatus {
        match self {
            Self::Sent => DeliveryStatus::Sent,
            Self::Failed { .. } => DeliveryStatus::Failed,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Sent => None,
            Self::Failed { error_message } => Some(error_message),
        }
    }
}

/// 追記する配信ログ（リポジトリ INSERT 用データ型）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmailLog {
    pub customer_id:     CustomerId,
    pub email_type:      EmailType,
    pub recipient_email: String,
    pub recipient_name:  String,
    pub subject:         String,
    pub outcome:         DeliveryOutcome,
    pub sent_at:         DateTime<Utc>,
}

/// 配信ログ一覧の 1 行
///
/// 顧客の現在の表示名・メールアドレスを外部結合で付与した読み取りモデル。
/// 顧客が存在しない行も返すため、顧客側の値は `Option`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailLogEntry {
    pub id:              EmailLogId,
    pub customer_id:     CustomerId,
    pub email_type:      EmailType,
    pub recipient_email: String,
    pub recipient_name:  String,
    pub subject:         String,
    pub status:          DeliveryStatus,
    pub error_message:   Option<String>,
    pub sent_at:         DateTime<Utc>,
    pub customer_name:   Option<String>,
    pub customer_email:  Option<String>,
}

/// イベント種別ごとの送信件数集計
///
/// `total = successful + failed` が常に成り立つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailTypeStats {
    pub email_type: EmailType,
    pub total:      i64,
    pub successful: i64,
    pub failed:     i64,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_delivery_statusの文字列変換が正しい() {
        assert_eq!(DeliveryStatus::Sent.to_string(), "sent");
        assert_eq!(DeliveryStatus::Failed.to_string(), "failed");
        assert_eq!(DeliveryStatus::from_str("failed").unwrap(), DeliveryStatus::Failed);
        assert!(DeliveryStatus::from_str("queued").is_err());
    }

    #[test]
    fn test_送信成功の結果はエラーメッセージを持たない() {
        let outcome = DeliveryOutcome::Sent;

        assert_eq!(outcome.status(), DeliveryStatus::Sent);
        assert_eq!(outcome.error_message(), None);
    }

    #[test]
    fn test_送信失敗の結果はエラーメッセージを持つ() {
        let outcome = DeliveryOutcome::Failed {
            error_message: "Failed to send email".to_string(),
        };

        assert_eq!(outcome.status(), DeliveryStatus::Failed);
        assert_eq!(outcome.error_message(), Some("Failed to send email"));
    }
}
