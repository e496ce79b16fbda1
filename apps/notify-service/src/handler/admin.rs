//! # 管理ハンドラ
//!
//! 管理画面から呼ばれる API を提供する。
//!
//! ## エンドポイント
//!
//! - `POST /api/admin/send-email` - 手動送信
//! - `GET /api/admin/customers` - 顧客一覧
//! - `POST /api/admin/customers` - 顧客登録（作成 or 取得）
//! - `GET /api/admin/email-logs` - 配信ログ一覧
//! - `GET /api/admin/statistics` - 配信統計
//!
//! 一覧と統計はエンベロープで包まず、そのままの JSON を返す。
//! 顧客・配信ログの各フィールドは管理画面との互換のため snake_case、
//! 統計は camelCase で返す。

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use bcimail_domain::{
    customer::Customer,
    email_log::{EmailLogEntry, EmailTypeStats},
    notification::DispatchResult,
};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::{
    error::ServiceError,
    usecase::{AdminUseCase, Statistics, admin::ManualSendRequest},
};

/// 管理 API の共有状態
pub struct AdminState {
    pub usecase: AdminUseCase,
}

// --- リクエスト/レスポンス型 ---

/// 顧客 DTO
#[derive(Debug, Serialize)]
pub struct CustomerDto {
    pub id:           i64,
    pub display_name: String,
    pub email:        String,
    pub created_at:   String,
}

impl From<Customer> for CustomerDto {
    fn from(customer: Customer) -> Self {
        Self {
            id:           customer.id().as_i64(),
            display_name: customer.display_name().as_str().to_string(),
            email:        customer.email().as_str().to_string(),
            created_at:   customer.created_at().to_rfc3339(),
        }
    }
}

/// 配信ログ DTO
#[derive(Debug, Serialize)]
pub struct EmailLogDto {
    pub id:              i64,
    pub customer_id:     i64,
    pub email_type:      String,
    pub recipient_email: String,
    pub recipient_name:  String,
    pub subject:         String,
    pub status:          String,
    pub error_message:   Option<String>,
    pub sent_at:         String,
    pub customer_name:   Option<String>,
    pub customer_email:  Option<String>,
}

impl From<EmailLogEntry> for EmailLogDto {
    fn from(entry: EmailLogEntry) -> Self {
        Self {
            id:              entry.id.as_i64(),
            customer_id:     entry.customer_id.as_i64(),
            email_type:      entry.email_type.to_string(),
            recipient_email: entry.recipient_email,
            recipient_name:  entry.recipient_name,
            subject:         entry.subject,
            status:          entry.status.to_string(),
            error_message:   entry.error_message,
            sent_at:         entry.sent_at.to_rfc3339(),
            customer_name:   entry.customer_name,
            customer_email:  entry.customer_email,
        }
    }
}

/// 種別ごとの集計 DTO
#[derive(Debug, Serialize)]
pub struct EmailTypeStatsDto {
    pub email_type: String,
    pub total_sent: i64,
    pub successful: i64,
    pub failed:     i64,
}

impl From<EmailTypeStats> for EmailTypeStatsDto {
    fn from(stats: EmailTypeStats) -> Self {
        Self {
            email_type: stats.email_type.to_string(),
            total_sent: stats.total,
            successful: stats.successful,
            failed:     stats.failed,
        }
    }
}

/// 統計 DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsDto {
    pub total_customers:   i64,
    pub total_emails:      i64,
    pub successful_emails: i64,
    pub failed_emails:     i64,
    pub email_type_stats:  Vec<EmailTypeStatsDto>,
}

impl From<Statistics> for StatisticsDto {
    fn from(stats: Statistics) -> Self {
        Self {
            total_customers:   stats.total_customers,
            total_emails:      stats.total_emails,
            successful_emails: stats.successful_emails,
            failed_emails:     stats.failed_emails,
            email_type_stats:  stats
                .email_type_stats
                .into_iter()
                .map(EmailTypeStatsDto::from)
                .collect(),
        }
    }
}

/// 顧客登録リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCustomerRequest {
    pub display_name: Option<String>,
    pub email:        Option<String>,
}

/// 顧客登録レスポンス
#[derive(Debug, Serialize)]
pub struct AddCustomerResponse {
    pub success:  bool,
    pub customer: CustomerDto,
}

// --- ハンドラ ---

/// POST /api/admin/send-email
///
/// 管理画面のフォームを正規ペイロードに変換して配信する。
pub async fn send_manual_email(
    State(state): State<Arc<AdminState>>,
    payload: Result<Json<ManualSendRequest>, JsonRejection>,
) -> Result<Json<DispatchResult>, ServiceError> {
    let request = json_body(payload)?;
    let result = state.usecase.send_email(request).await?;
    Ok(Json(result))
}

/// GET /api/admin/customers
pub async fn list_customers(
    State(state): State<Arc<AdminState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let customers: Vec<CustomerDto> = state
        .usecase
        .list_customers()
        .await?
        .into_iter()
        .map(CustomerDto::from)
        .collect();

    Ok((StatusCode::OK, Json(customers)))
}

/// POST /api/admin/customers
///
/// 同じメールアドレスの顧客が既に存在する場合はその顧客を返す。
pub async fn add_customer(
    State(state): State<Arc<AdminState>>,
    payload: Result<Json<AddCustomerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = json_body(payload)?;
    let customer = state
        .usecase
        .add_customer(request.display_name, request.email)
        .await?;

    Ok((
        StatusCode::OK,
        Json(AddCustomerResponse {
            success:  true,
            customer: customer.into(),
        }),
    ))
}

/// GET /api/admin/email-logs
pub async fn list_email_logs(
    State(state): State<Arc<AdminState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let logs: Vec<EmailLogDto> = state
        .usecase
        .list_email_logs()
        .await?
        .into_iter()
        .map(EmailLogDto::from)
        .collect();

    Ok((StatusCode::OK, Json(logs)))
}

/// GET /api/admin/statistics
pub async fn get_statistics(
    State(state): State<Arc<AdminState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let stats = state.usecase.statistics().await?;
    Ok((StatusCode::OK, Json(StatisticsDto::from(stats))))
}
