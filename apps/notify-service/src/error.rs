//! # Notify Service エラー定義
//!
//! Notify Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! レスポンスボディは旧サービスと互換の `{ "success": false, "message": ... }`。
//! 内部エラーの詳細はログにのみ出力し、クライアントには汎用メッセージを返す。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bcimail_domain::DomainError;
use bcimail_infra::InfraError;
use bcimail_shared::{api_response::ActionResponse, event_log::error};
use thiserror::Error;

use crate::usecase::notification::DispatchError;

/// クライアントに返す内部エラーメッセージ
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Notify Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 不正なリクエスト（400）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// データベースエラー（500）
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),

    /// 内部エラー（500）
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        Self::BadRequest(e.message().to_string())
    }
}

impl From<DispatchError> for ServiceError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Validation(e) => e.into(),
            DispatchError::Infra(e) => Self::Database(e),
            DispatchError::Render(e) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServiceError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::Database(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::DATABASE,
                    span_trace = %e.span_trace(),
                    "データベースエラー: {}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
            ServiceError::Internal(msg) => {
                tracing::error!(error.kind = error::kind::INTERNAL, "内部エラー: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ActionResponse::failure(message))).into_response()
    }
}
