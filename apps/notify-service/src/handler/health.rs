//! # ヘルスチェックハンドラ
//!
//! Notify Service の稼働状態と配信カウンタを返すエンドポイント。
//!
//! ## エンドポイント
//!
//! ```text
//! GET /api/health        Liveness
//! GET /api/health/ready  Readiness（SQLite への疎通確認）
//! GET /api/metrics       配信カウンタのスナップショット
//! ```

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bcimail_domain::clock::Clock;
use bcimail_infra::db;
use bcimail_shared::{ApiResponse, CheckStatus, HealthResponse, ReadinessResponse};
use sqlx::SqlitePool;

use crate::{config::AppEnvironment, usecase::DispatchMetrics};

/// 外部に公開するサービス名
pub const SERVICE_NAME: &str = "BCI Email Service";

/// 稼働中を表す `status` の値
pub const STATUS_OK: &str = "OK";

/// ヘルスチェック API の共有状態
pub struct HealthState {
    pub pool:        SqlitePool,
    pub metrics:     DispatchMetrics,
    pub clock:       Arc<dyn Clock>,
    pub environment: AppEnvironment,
}

/// GET /api/health
pub async fn health_check(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status:      STATUS_OK.to_string(),
        timestamp:   state.clock.now(),
        service:     SERVICE_NAME.to_string(),
        version:     env!("CARGO_PKG_VERSION").to_string(),
        environment: state.environment.to_string(),
    })
}

/// GET /api/health/ready
///
/// データベースに到達できなければ 503 を返す。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let mut checks = HashMap::new();
    checks.insert("database".to_string(), check_database(&state.pool).await);

    let response = ReadinessResponse::from_checks(checks);
    let http_status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (http_status, Json(response))
}

async fn check_database(pool: &SqlitePool) -> CheckStatus {
    match tokio::time::timeout(Duration::from_secs(5), db::ping(pool)).await {
        Ok(Ok(())) => CheckStatus::Ok,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check: database ping failed");
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!("readiness check: database check timed out");
            CheckStatus::Error
        }
    }
}

/// GET /api/metrics
pub async fn get_metrics(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    Json(ApiResponse::new(state.metrics.snapshot()))
}
