//! # プロバイダクライアント
//!
//! [`NotificationSender`] の呼び出し結果を [`DispatchResult`] に分類する。
//!
//! 送信失敗はエラーとして伝播させず `success: false` の値に変換する。
//! プロバイダの生のエラーは診断ログにのみ出力し、呼び出し元には
//! 汎用メッセージ（`Failed to send email`）だけを返す。

use std::sync::Arc;

use bcimail_domain::notification::{DispatchResult, EmailMessage, EmailType};
use bcimail_infra::notification::NotificationSender;
use bcimail_shared::event_log::error;

/// 送信プロバイダのラッパー
#[derive(Clone)]
pub struct ProviderClient {
    sender: Arc<dyn NotificationSender>,
}

impl ProviderClient {
    pub fn new(sender: Arc<dyn NotificationSender>) -> Self {
        Self { sender }
    }

    /// メールを 1 通送信し、結果を分類して返す
    pub async fn send(&self, email: &EmailMessage, email_type: EmailType) -> DispatchResult {
        match self.sender.send_email(email).await {
            Ok(()) => DispatchResult::sent(email_type),
            Err(e) => {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::EMAIL_PROVIDER,
                    email_type = %email_type,
                    error = %e,
                    "メール送信プロバイダの呼び出しに失敗"
                );
                DispatchResult::failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bcimail_infra::mock::MockNotificationSender;
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_email() -> EmailMessage {
        EmailMessage {
            to:        "john@example.com".to_string(),
            subject:   "DMIT Scans Successfully Collected".to_string(),
            html_body: "<p>html</p>".to_string(),
            text_body: "text".to_string(),
        }
    }

    #[tokio::test]
    async fn test_送信成功で種別ごとのメッセージを返す() {
        let sender = MockNotificationSender::new();
        let client = ProviderClient::new(Arc::new(sender.clone()));

        let result = client.send(&make_email(), EmailType::DmitScans).await;

        assert_eq!(result, DispatchResult::sent(EmailType::DmitScans));
        assert_eq!(sender.sent_emails(), vec![make_email()]);
    }

    #[tokio::test]
    async fn test_送信失敗は汎用メッセージのfailureになる() {
        let client = ProviderClient::new(Arc::new(MockNotificationSender::failing()));

        let result = client.send(&make_email(), EmailType::DmitScans).await;

        assert!(!result.success);
        assert_eq!(result.message, "Failed to send email");
    }
}
