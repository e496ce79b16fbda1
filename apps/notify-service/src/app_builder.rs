//! # Notify Service アプリケーション構築
//!
//! DI（リポジトリ・送信プロバイダ・State）の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use anyhow::Context as _;
use axum::{
    Router,
    routing::{get, post},
};
use bcimail_domain::{
    clock::Clock,
    notification::Recipient,
    value_objects::{DisplayName, Email},
};
use bcimail_infra::{
    notification::{
        NoopNotificationSender,
        NotificationSender,
        SendGridNotificationSender,
        SesNotificationSender,
        SmtpNotificationSender,
        create_ses_client,
    },
    repository::{CustomerRepository, EmailLogRepository},
};
use bcimail_shared::observability::{MakeRequestUuidV7, make_request_span};
use sqlx::SqlitePool;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    config::{ConfigError, NotificationBackend, NotificationConfig, ServiceConfig},
    handler::{
        AdminState,
        EmailState,
        HealthState,
        add_customer,
        book_appointment,
        get_metrics,
        get_statistics,
        health_check,
        list_customers,
        list_email_logs,
        readiness_check,
        run_test_emails,
        send_event_email,
        send_manual_email,
    },
    usecase::{
        AdminUseCase,
        DispatchMetrics,
        DispatchService,
        TemplateRenderer,
        notification::ProviderClient,
    },
};

/// `/api/test-emails` の宛先の表示名
const TEST_RECIPIENT_NAME: &str = "Test User";

/// ルーターが依存する外部リソース
pub struct AppDependencies {
    pub pool:       SqlitePool,
    pub customers:  Arc<dyn CustomerRepository>,
    pub email_logs: Arc<dyn EmailLogRepository>,
    pub sender:     Arc<dyn NotificationSender>,
    pub clock:      Arc<dyn Clock>,
    pub metrics:    DispatchMetrics,
}

/// ルーターを構築する
///
/// テンプレートの登録や疎通確認の宛先が不正な場合はエラーを返す。
pub fn build_app(config: &ServiceConfig, deps: AppDependencies) -> anyhow::Result<Router> {
    let renderer = Arc::new(TemplateRenderer::new().context("テンプレートの登録に失敗しました")?);

    let dispatch = Arc::new(DispatchService::new(
        deps.customers.clone(),
        deps.email_logs.clone(),
        renderer,
        ProviderClient::new(deps.sender),
        deps.clock.clone(),
    ));

    let test_recipient = Recipient {
        name:  DisplayName::new(TEST_RECIPIENT_NAME)?,
        email: Email::new(config.test_email_recipient.as_str())
            .context("TEST_EMAIL_RECIPIENT が不正です")?,
    };

    let email_state = Arc::new(EmailState {
        dispatch: dispatch.clone(),
        test_recipient,
    });

    let admin_state = Arc::new(AdminState {
        usecase: AdminUseCase::new(
            deps.customers,
            deps.email_logs,
            dispatch,
            deps.clock.clone(),
        ),
    });

    let health_state = Arc::new(HealthState {
        pool: deps.pool,
        metrics: deps.metrics,
        clock: deps.clock,
        environment: config.environment,
    });

    let router = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/health/ready", get(readiness_check))
        .route("/api/metrics", get(get_metrics))
        .with_state(health_state)
        .merge(
            Router::new()
                .route("/book", post(book_appointment))
                .route("/api/email/{kind}", post(send_event_email))
                .route("/api/test-emails", get(run_test_emails))
                .with_state(email_state),
        )
        .merge(
            Router::new()
                .route("/api/admin/send-email", post(send_manual_email))
                .route(
                    "/api/admin/customers",
                    get(list_customers).post(add_customer),
                )
                .route("/api/admin/email-logs", get(list_email_logs))
                .route("/api/admin/statistics", get(get_statistics))
                .with_state(admin_state),
        )
        // 下に書いたものが外側:
        // SetRequestIdLayer で ID を採番し、TraceLayer のスパンに含め、レスポンスヘッダーに戻す
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));

    Ok(router)
}

/// 設定に応じた送信バックエンドを構築する
pub async fn build_sender(
    config: &NotificationConfig,
) -> Result<Arc<dyn NotificationSender>, ConfigError> {
    let sender: Arc<dyn NotificationSender> = match config.backend {
        NotificationBackend::SendGrid => {
            let api_key = config
                .sendgrid_api_key
                .as_deref()
                .ok_or(ConfigError::MissingSendGridApiKey)?;
            Arc::new(SendGridNotificationSender::new(
                config.sendgrid_base_url.as_str(),
                api_key,
                config.from_address.clone(),
            ))
        }
        NotificationBackend::Smtp => Arc::new(SmtpNotificationSender::new(
            &config.smtp_host,
            config.smtp_port,
            config.from_address.clone(),
        )),
        NotificationBackend::Ses => Arc::new(SesNotificationSender::new(
            create_ses_client().await,
            config.from_address.clone(),
        )),
        NotificationBackend::Noop => Arc::new(NoopNotificationSender),
    };

    tracing::info!(backend = %config.backend, "送信バックエンドを初期化しました");
    Ok(sender)
}
