//! # 管理ユースケース
//!
//! 管理画面向けの顧客・配信ログの参照、顧客の手動登録、統計、手動送信を提供する。
//!
//! ## 設計方針
//!
//! - **手動送信は正規ペイロードに変換**: 管理画面のフォーム形式を
//!   イベント API と同じペイロードに写像し、[`DispatchService::dispatch`] に渡す。
//!   検証・件名生成・ログ記録はイベント API と共通
//! - **統計は集計結果から導出**: 全体の件数は種別ごとの集計の合計

use std::{str::FromStr, sync::Arc};

use bcimail_domain::{
    DomainError,
    clock::Clock,
    customer::Customer,
    email_log::{EmailLogEntry, EmailTypeStats},
    notification::{DispatchResult, EmailType, field},
    value_objects::{DisplayName, Email},
};
use bcimail_infra::repository::{CustomerRepository, EmailLogRepository};
use bcimail_shared::{event_log::event, log_business_event};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::DispatchService;
use crate::error::ServiceError;

/// 配信統計
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total_customers:   i64,
    pub total_emails:      i64,
    pub successful_emails: i64,
    pub failed_emails:     i64,
    pub email_type_stats:  Vec<EmailTypeStats>,
}

/// 手動送信リクエスト
///
/// `displayName` / `recipientEmail` / `emailType` 以外のフィールドは
/// テンプレートの差し込み値として扱う。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSendRequest {
    pub display_name:    Option<String>,
    pub recipient_email: Option<String>,
    pub email_type:      Option<String>,
    #[serde(flatten)]
    pub template_fields: Map<String, Value>,
}

impl ManualSendRequest {
    /// イベント種別と正規ペイロードに変換する
    ///
    /// 宛先と種別の有無だけをここで確認し、種別ごとの必須フィールドは
    /// 正規ペイロードの検証に任せる。
    pub fn into_dispatch(self) -> Result<(EmailType, Value), DomainError> {
        let (Some(display_name), Some(recipient_email), Some(email_type)) = (
            non_blank(self.display_name),
            non_blank(self.recipient_email),
            non_blank(self.email_type),
        ) else {
            return Err(DomainError::Validation(
                "Missing required fields: displayName, recipientEmail, emailType".to_string(),
            ));
        };

        let email_type = EmailType::from_str(&email_type)
            .map_err(|_| DomainError::Validation("Invalid email type".to_string()))?;

        let mut payload = self.template_fields;
        match email_type {
            EmailType::Appointment => {
                payload.insert(field::NAME.to_string(), Value::String(display_name));
                payload.insert(field::EMAIL.to_string(), Value::String(recipient_email));
            }
            EmailType::Counseling => {
                let mut session = Map::new();
                for (form_key, key) in [
                    ("sessionDate", field::DATE),
                    ("sessionTime", field::TIME),
                    (field::COUNSELOR, field::COUNSELOR),
                    (field::MEETING_LINK, field::MEETING_LINK),
                ] {
                    if let Some(value) = payload.remove(form_key) {
                        session.insert(key.to_string(), value);
                    }
                }
                payload.insert(field::SESSION_DETAILS.to_string(), Value::Object(session));
                payload.insert(field::USERNAME.to_string(), Value::String(display_name));
                payload.insert(field::EMAIL_ID.to_string(), Value::String(recipient_email));
            }
            _ => {
                payload.insert(field::USERNAME.to_string(), Value::String(display_name));
                payload.insert(field::EMAIL_ID.to_string(), Value::String(recipient_email));
            }
        }

        Ok((email_type, Value::Object(payload)))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// 管理ユースケース
pub struct AdminUseCase {
    customers:  Arc<dyn CustomerRepository>,
    email_logs: Arc<dyn EmailLogRepository>,
    dispatch:   Arc<DispatchService>,
    clock:      Arc<dyn Clock>,
}

impl AdminUseCase {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        email_logs: Arc<dyn EmailLogRepository>,
        dispatch: Arc<DispatchService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            customers,
            email_logs,
            dispatch,
            clock,
        }
    }

    /// 全顧客を作成日時の新しい順に返す
    pub async fn list_customers(&self) -> Result<Vec<Customer>, ServiceError> {
        Ok(self.customers.list_all().await?)
    }

    /// 顧客を登録する（作成 or 取得）
    ///
    /// 同じメールアドレスの顧客が既に存在する場合はその顧客を返す。
    pub async fn add_customer(
        &self,
        display_name: Option<String>,
        email: Option<String>,
    ) -> Result<Customer, ServiceError> {
        let (Some(display_name), Some(email)) = (non_blank(display_name), non_blank(email)) else {
            return Err(ServiceError::BadRequest(
                "Missing required fields: displayName, email".to_string(),
            ));
        };

        let display_name = DisplayName::new(display_name)?;
        let email = Email::new(email)?;

        let created = self
            .customers
            .create(&display_name, &email, self.clock.now())
            .await?;

        if created.is_created() {
            log_business_event!(
                event.category = event::category::CUSTOMER,
                event.action = event::action::CUSTOMER_CREATED,
                event.entity_type = event::entity_type::CUSTOMER,
                event.entity_id = %created.customer().id(),
                event.result = event::result::SUCCESS,
                "管理画面から顧客を作成"
            );
        }

        Ok(created.into_customer())
    }

    /// 全配信ログを送信日時の新しい順に返す
    pub async fn list_email_logs(&self) -> Result<Vec<EmailLogEntry>, ServiceError> {
        Ok(self.email_logs.list_all().await?)
    }

    /// 顧客数と配信件数の統計を返す
    pub async fn statistics(&self) -> Result<Statistics, ServiceError> {
        let total_customers = self.customers.count().await?;
        let email_type_stats = self.email_logs.aggregate_by_type().await?;

        Ok(Statistics {
            total_customers,
            total_emails: email_type_stats.iter().map(|s| s.total).sum(),
            successful_emails: email_type_stats.iter().map(|s| s.successful).sum(),
            failed_emails: email_type_stats.iter().map(|s| s.failed).sum(),
            email_type_stats,
        })
    }

    /// 管理画面から通知を手動送信する
    pub async fn send_email(
        &self,
        request: ManualSendRequest,
    ) -> Result<DispatchResult, ServiceError> {
        let (email_type, payload) = request.into_dispatch()?;
        Ok(self.dispatch.dispatch(email_type, &payload).await?)
    }
}
