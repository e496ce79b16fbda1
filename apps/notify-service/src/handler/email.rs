//! # 通知ハンドラ
//!
//! 外部の評価ワークフローから呼ばれる通知 API を提供する。
//!
//! ## エンドポイント
//!
//! - `POST /book` - 予約フォーム（HTML を返す）
//! - `POST /api/email/{kind}` - イベント種別ごとの通知
//! - `GET /api/test-emails` - 全種別の疎通確認メール

use std::{str::FromStr, sync::Arc};

use axum::{
    Form,
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use bcimail_domain::notification::{DispatchResult, EmailType, NotificationEvent, Recipient, field};
use bcimail_shared::event_log::error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::json_body;
use crate::{
    error::ServiceError,
    usecase::{DispatchService, notification::SmokeTestOutcome},
};

/// `/book` が失敗したときに返す本文
pub const BOOKING_FAILURE_MESSAGE: &str = "Something went wrong.";

/// 通知 API の共有状態
pub struct EmailState {
    pub dispatch:       Arc<DispatchService>,
    /// `/api/test-emails` の宛先
    pub test_recipient: Recipient,
}

/// 予約フォーム
#[derive(Debug, Deserialize)]
pub struct BookingForm {
    pub name:  Option<String>,
    pub email: Option<String>,
}

/// 疎通確認のレスポンス
#[derive(Debug, Serialize)]
pub struct TestEmailsResponse {
    pub success: bool,
    pub message: &'static str,
    pub results: Vec<SmokeTestOutcome>,
}

/// POST /book
///
/// 予約確認メールを送り、完了ページを返す。
/// 検証失敗・送信失敗を含め、失敗時は 500 と固定の文言を返す。
pub async fn book_appointment(
    State(state): State<Arc<EmailState>>,
    Form(form): Form<BookingForm>,
) -> Response {
    let mut payload = Map::new();
    if let Some(name) = form.name {
        payload.insert(field::NAME.to_string(), Value::String(name));
    }
    if let Some(email) = form.email {
        payload.insert(field::EMAIL.to_string(), Value::String(email));
    }

    let payload = Value::Object(payload);
    let event = match NotificationEvent::from_payload(EmailType::Appointment, &payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(error = %e, "予約フォームの検証に失敗");
            return booking_failure();
        }
    };
    let recipient = event.recipient().clone();

    match state.dispatch.dispatch_event(event).await {
        Ok(result) if result.success => {}
        Ok(_) => return booking_failure(),
        Err(e) => {
            tracing::error!(
                error.kind = error::kind::INTERNAL,
                "予約メールの配信に失敗: {}",
                e
            );
            return booking_failure();
        }
    }

    match state.dispatch.renderer().render_booking_confirmation(&recipient) {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::error!(
                error.kind = error::kind::TEMPLATE,
                "予約完了ページの生成に失敗: {}",
                e
            );
            booking_failure()
        }
    }
}

fn booking_failure() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, BOOKING_FAILURE_MESSAGE).into_response()
}

/// POST /api/email/{kind}
///
/// ペイロードを検証して通知を配信する。送信失敗も 200 で
/// `{ "success": false, "message": "Failed to send email" }` を返す。
pub async fn send_event_email(
    State(state): State<Arc<EmailState>>,
    Path(kind): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DispatchResult>, ServiceError> {
    let email_type = EmailType::from_str(&kind)
        .map_err(|_| ServiceError::BadRequest("Invalid email type".to_string()))?;
    let payload = json_body(payload)?;

    let result = state.dispatch.dispatch(email_type, &payload).await?;
    Ok(Json(result))
}

/// GET /api/test-emails
///
/// サンプルデータで全種別のメールを送る。顧客・配信ログには記録しない。
pub async fn run_test_emails(
    State(state): State<Arc<EmailState>>,
) -> Result<Json<TestEmailsResponse>, ServiceError> {
    let results = state.dispatch.smoke_test(&state.test_recipient).await?;

    Ok(Json(TestEmailsResponse {
        success: true,
        message: "All email tests completed",
        results,
    }))
}
