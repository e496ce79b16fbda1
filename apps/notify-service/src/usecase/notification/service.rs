//! # 配信サービス
//!
//! 1 件の通知配信を最初から最後まで実行する。
//!
//! 検証 → 顧客解決（作成 or 取得） → テンプレートレンダリング → 送信 → 配信ログ記録
//!
//! ## 設計方針
//!
//! - **送信失敗は値**: プロバイダの失敗は `DispatchResult { success: false }` として返し、
//!   配信ログにも `failed` で記録する
//! - **ログ記録はベストエフォート**: 配信ログの追記に失敗しても結果は変えない。
//!   エラーログと `metrics` のカウンタ（[`LOG_APPEND_FAILURES_TOTAL`]）で検知する
//!
//! [`LOG_APPEND_FAILURES_TOTAL`]: super::metrics::LOG_APPEND_FAILURES_TOTAL
//! - **検証失敗は何も残さない**: 顧客作成・送信・ログ記録のいずれも行わない
//! - **依存性注入**: リポジトリ・送信プロバイダ・時刻源は trait で抽象化

use std::sync::Arc;

use bcimail_domain::{
    DomainError,
    clock::Clock,
    customer::Customer,
    email_log::{DeliveryOutcome, NewEmailLog},
    notification::{
        CounselingAction,
        DispatchResult,
        EmailType,
        NotificationError,
        NotificationEvent,
        Recipient,
        SessionDetails,
    },
};
use bcimail_infra::{
    InfraError,
    repository::{CustomerRepository, EmailLogRepository},
};
use bcimail_shared::{
    event_log::{error, event},
    log_business_event,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::{ProviderClient, TemplateRenderer, metrics};

/// 配信エラー
///
/// 送信失敗はここに含まれない（[`DispatchResult`] で表す）。
#[derive(Debug, Error)]
pub enum DispatchError {
    /// ペイロードの検証に失敗（呼び出し元の誤り）
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// 顧客の検索・作成に失敗
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// テンプレートのレンダリングに失敗
    #[error(transparent)]
    Render(NotificationError),
}

/// 疎通確認メール 1 通の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmokeTestOutcome {
    pub test:   &'static str,
    pub result: DispatchResult,
}

/// 配信オーケストレータ
pub struct DispatchService {
    customers:  Arc<dyn CustomerRepository>,
    email_logs: Arc<dyn EmailLogRepository>,
    renderer:   Arc<TemplateRenderer>,
    provider:   ProviderClient,
    clock:      Arc<dyn Clock>,
}

impl DispatchService {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        email_logs: Arc<dyn EmailLogRepository>,
        renderer: Arc<TemplateRenderer>,
        provider: ProviderClient,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            customers,
            email_logs,
            renderer,
            provider,
            clock,
        }
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// イベント種別と JSON ペイロードから通知を配信する
    ///
    /// # エラー
    ///
    /// - 必須フィールドの欠落など: [`DispatchError::Validation`]（副作用なし）
    /// - 顧客の検索・作成に失敗: [`DispatchError::Infra`]
    /// - レンダリングに失敗: [`DispatchError::Render`]
    ///
    /// 送信失敗はエラーではなく `success: false` の結果として返す。
    #[tracing::instrument(skip_all, fields(email_type = %email_type))]
    pub async fn dispatch(
        &self,
        email_type: EmailType,
        payload: &Value,
    ) -> Result<DispatchResult, DispatchError> {
        let event = match NotificationEvent::from_payload(email_type, payload) {
            Ok(event) => event,
            Err(e) => {
                metrics::record_validation_rejected();
                tracing::debug!(error = %e, "ペイロードの検証に失敗");
                return Err(e.into());
            }
        };

        self.dispatch_event(event).await
    }

    /// 検証済みイベントを配信する
    pub async fn dispatch_event(
        &self,
        event: NotificationEvent,
    ) -> Result<DispatchResult, DispatchError> {
        let email_type = event.email_type();
        let email_type_str: &str = email_type.into();
        let recipient = event.recipient();

        let customer = self.resolve_customer(recipient).await?;
        let email = self.renderer.render(&event).map_err(DispatchError::Render)?;

        let result = self.provider.send(&email, email_type).await;

        let outcome = if result.success {
            metrics::record_sent();
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_SENT,
                event.entity_type = event::entity_type::CUSTOMER,
                event.entity_id = %customer.id(),
                event.result = event::result::SUCCESS,
                notification.email_type = email_type_str,
                "通知メール送信成功"
            );
            DeliveryOutcome::Sent
        } else {
            metrics::record_failed();
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_FAILED,
                event.entity_type = event::entity_type::CUSTOMER,
                event.entity_id = %customer.id(),
                event.result = event::result::FAILURE,
                notification.email_type = email_type_str,
                "通知メール送信失敗"
            );
            DeliveryOutcome::Failed {
                error_message: result.message.clone(),
            }
        };

        let log = NewEmailLog {
            customer_id: customer.id(),
            email_type,
            recipient_email: email.to,
            recipient_name: recipient.name.as_str().to_string(),
            subject: email.subject,
            outcome,
            sent_at: self.clock.now(),
        };

        if let Err(e) = self.email_logs.append(&log).await {
            metrics::record_log_append_failure();
            tracing::error!(
                error.category = error::category::INFRASTRUCTURE,
                error.kind = error::kind::DISPATCH_LOG,
                email_type = email_type_str,
                customer_id = %customer.id(),
                span_trace = %e.span_trace(),
                "配信ログの記録に失敗: {}",
                e
            );
        }

        Ok(result)
    }

    /// 全種別の疎通確認メールを送信する
    ///
    /// 固定のサンプルデータでレンダリングし、`recipient` 宛てに送る。
    /// 顧客ディレクトリと配信ログには記録しない。
    pub async fn smoke_test(
        &self,
        recipient: &Recipient,
    ) -> Result<Vec<SmokeTestOutcome>, DispatchError> {
        let mut outcomes = Vec::new();

        for (test, event) in smoke_test_events(recipient) {
            let email = self.renderer.render(&event).map_err(DispatchError::Render)?;
            let result = self.provider.send(&email, event.email_type()).await;
            outcomes.push(SmokeTestOutcome { test, result });
        }

        Ok(outcomes)
    }

    /// 宛先メールアドレスの顧客を取得し、存在しなければ作成する
    async fn resolve_customer(&self, recipient: &Recipient) -> Result<Customer, DispatchError> {
        if let Some(customer) = self.customers.find_by_email(&recipient.email).await? {
            return Ok(customer);
        }

        let created = self
            .customers
            .create(&recipient.name, &recipient.email, self.clock.now())
            .await?;

        if created.is_created() {
            log_business_event!(
                event.category = event::category::CUSTOMER,
                event.action = event::action::CUSTOMER_CREATED,
                event.entity_type = event::entity_type::CUSTOMER,
                event.entity_id = %created.customer().id(),
                event.result = event::result::SUCCESS,
                "顧客を作成"
            );
        }

        Ok(created.into_customer())
    }
}

/// 疎通確認に使うサンプルイベント
fn smoke_test_events(recipient: &Recipient) -> Vec<(&'static str, NotificationEvent)> {
    const TEST_TYPE: &str = "psychometric";

    vec![
        (
            "Registration Email",
            NotificationEvent::Registration {
                recipient: recipient.clone(),
                user_code: "TEST123".to_string(),
                test_type: TEST_TYPE.to_string(),
            },
        ),
        (
            "Test Start Email",
            NotificationEvent::TestStart {
                recipient:  recipient.clone(),
                test_type:  TEST_TYPE.to_string(),
                start_url:  "https://example.com/start".to_string(),
                resume_url: "https://example.com/resume".to_string(),
            },
        ),
        (
            "Test Completion Email",
            NotificationEvent::TestCompletion {
                recipient:  recipient.clone(),
                test_type:  TEST_TYPE.to_string(),
                report_url: "https://example.com/report".to_string(),
            },
        ),
        (
            "DMIT Scans Email",
            NotificationEvent::DmitScans {
                recipient: recipient.clone(),
            },
        ),
        (
            "Counseling Session Email",
            NotificationEvent::Counseling {
                recipient: recipient.clone(),
                action:    CounselingAction::Schedule,
                session:   SessionDetails {
                    date:         "2024-02-20".to_string(),
                    time:         "10:00 AM".to_string(),
                    counselor:    "Dr. Smith".to_string(),
                    meeting_link: Some("https://meet.google.com/abc-defg-hij".to_string()),
                },
            },
        ),
    ]
}
