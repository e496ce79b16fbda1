//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲

pub mod admin;
pub mod email;
pub mod health;

use axum::{Json, extract::rejection::JsonRejection};

pub use admin::{
    AdminState,
    add_customer,
    get_statistics,
    list_customers,
    list_email_logs,
    send_manual_email,
};
pub use email::{EmailState, book_appointment, run_test_emails, send_event_email};
pub use health::{HealthState, get_metrics, health_check, readiness_check};

use crate::error::ServiceError;

/// JSON ボディの取り出しに失敗した場合は 400 にする
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "JSON ボディの解析に失敗");
            Err(ServiceError::BadRequest("Invalid JSON body".to_string()))
        }
    }
}
