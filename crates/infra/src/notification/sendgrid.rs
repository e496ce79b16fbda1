//! SendGrid 通知送信実装
//!
//! SendGrid v3 Mail Send API（`POST /v3/mail/send`）を reqwest で呼び出す。
//! 2xx 以外のステータスは全て送信失敗として扱う（SendGrid は受理時に 202 を返す）。

use async_trait::async_trait;
use bcimail_domain::notification::{EmailMessage, NotificationError};
use serde::Serialize;

use super::NotificationSender;

/// SendGrid 通知送信
pub struct SendGridNotificationSender {
    client:       reqwest::Client,
    base_url:     String,
    api_key:      String,
    from_address: String,
}

impl SendGridNotificationSender {
    /// SendGrid API のデフォルトベース URL
    pub const DEFAULT_BASE_URL: &'static str = "https://api.sendgrid.com";

    /// # 引数
    ///
    /// - `base_url`: API のベース URL（テストではスタブサーバーを指す）
    /// - `api_key`: SendGrid API キー
    /// - `from_address`: 送信元メールアドレス（SendGrid で認証済みであること）
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        from_address: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from_address,
        }
    }
}

// --- Mail Send API のリクエストボディ ---

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from:             Address<'a>,
    subject:          &'a str,
    content:          [MailContent<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct MailContent<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value:        &'a str,
}

impl<'a> MailSendRequest<'a> {
    /// SendGrid は content の順序を text/plain → text/html に制限している
    fn new(from: &'a str, email: &'a EmailMessage) -> Self {
        Self {
            personalizations: [Personalization {
                to: [Address { email: &email.to }],
            }],
            from:             Address { email: from },
            subject:          &email.subject,
            content:          [
                MailContent {
                    content_type: "text/plain",
                    value:        &email.text_body,
                },
                MailContent {
                    content_type: "text/html",
                    value:        &email.html_body,
                },
            ],
        }
    }
}

#[async_trait]
impl NotificationSender for SendGridNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let url = format!("{}/v3/mail/send", self.base_url);
        let body = MailSendRequest::new(&self.from_address, email);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SendGrid 通信失敗: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // エラー本文は診断用にのみ使う（呼び出し元には汎用メッセージが返る）
        let detail = response.text().await.unwrap_or_default();
        Err(NotificationError::SendFailed(format!(
            "SendGrid 送信失敗: status={status}, body={detail}"
        )))
    }
}
