//! # テストユーティリティ
//!
//! ルーターを実 SQLite（インメモリ）とモック送信プロバイダで組み立てる。
//! 統合テストから `tower::ServiceExt::oneshot` で呼び出すために使う。

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use bcimail_domain::clock::{Clock, SteppingClock};
use bcimail_infra::{
    db,
    mock::MockNotificationSender,
    repository::{SqliteCustomerRepository, SqliteEmailLogRepository},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    app_builder::{AppDependencies, build_app},
    config::ServiceConfig,
    usecase::DispatchMetrics,
};

/// テスト用に組み立てたアプリケーション
pub struct TestApp {
    pub router: Router,
    pub pool:   SqlitePool,
    pub sender: MockNotificationSender,
    /// `/api/metrics` が読むカウンタ
    ///
    /// 記録させるにはテスト内で `metrics::set_default_local_recorder` に
    /// `app.metrics.recorder()` を渡す。
    pub metrics: DispatchMetrics,
}

/// テストの基準時刻（2025-01-15 09:00 UTC）
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()
}

/// 環境変数を一切参照しない設定
pub fn test_config() -> ServiceConfig {
    ServiceConfig::from_lookup(|_| None).unwrap()
}

/// 送信が常に成功するアプリケーション
pub async fn spawn_app() -> TestApp {
    spawn_app_with(MockNotificationSender::new()).await
}

/// 指定した送信モックでアプリケーションを組み立てる
///
/// 時刻は呼び出しごとに 1 分進むため、一覧の並び順が作成順と一致する。
pub async fn spawn_app_with(sender: MockNotificationSender) -> TestApp {
    let pool = db::create_memory_pool().await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let clock: Arc<dyn Clock> = Arc::new(SteppingClock::new(base_time(), Duration::minutes(1)));
    let metrics = DispatchMetrics::new();
    let router = build_app(
        &test_config(),
        AppDependencies {
            pool: pool.clone(),
            customers: Arc::new(SqliteCustomerRepository::new(pool.clone())),
            email_logs: Arc::new(SqliteEmailLogRepository::new(pool.clone())),
            sender: Arc::new(sender.clone()),
            clock,
            metrics: metrics.clone(),
        },
    )
    .unwrap();

    TestApp {
        router,
        pool,
        sender,
        metrics,
    }
}

/// JSON ボディの POST リクエスト
pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// フォームの POST リクエスト
pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// GET リクエスト
pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// レスポンスボディを文字列として読み出す
pub async fn response_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// レスポンスボディを JSON として読み出す
pub async fn response_body(response: Response<Body>) -> Value {
    serde_json::from_str(&response_text(response).await).unwrap()
}
