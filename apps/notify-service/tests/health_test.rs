//! ヘルスチェック・疎通確認・リクエスト ID の統合テスト

use axum::http::StatusCode;
use bcimail_infra::mock::MockNotificationSender;
use bcimail_notify_service::test_utils::{
    base_time,
    get,
    post_json,
    response_body,
    spawn_app,
    spawn_app_with,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_ヘルスチェックはサービス情報を返す() {
    let app = spawn_app().await;

    let response = app.router.clone().oneshot(get("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body(response).await;
    assert_eq!(body["status"], "OK");
    let timestamp: chrono::DateTime<chrono::Utc> =
        body["timestamp"].as_str().unwrap().parse().unwrap();
    assert!(timestamp >= base_time());
    assert_eq!(body["service"], "BCI Email Service");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["environment"], "development");
}

#[tokio::test]
async fn test_dbに接続できればreadyを返す() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/health/ready"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_body(response).await,
        json!({ "status": "ready", "checks": { "database": "ok" } })
    );
}

#[tokio::test]
async fn test_dbに接続できなければ503を返す() {
    let app = spawn_app().await;
    app.pool.close().await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/health/ready"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response_body(response).await,
        json!({ "status": "not_ready", "checks": { "database": "error" } })
    );
}

#[tokio::test]
async fn test_リクエストidが採番されレスポンスに付与される() {
    let app = spawn_app().await;

    let response = app.router.clone().oneshot(get("/api/health")).await.unwrap();

    let request_id = response.headers().get("x-request-id").unwrap();
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn test_クライアントのリクエストidはそのまま返す() {
    let app = spawn_app().await;
    let request = axum::http::Request::get("/api/health")
        .header("x-request-id", "req-123")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-123");
}

#[tokio::test]
async fn test_疎通確認は5種類を送信しログを残さない() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/test-emails"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "All email tests completed");
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
    assert_eq!(
        body["results"][0],
        json!({
            "test": "Registration Email",
            "result": { "success": true, "message": "Registration email sent successfully" }
        })
    );

    let sent = app.sender.sent_emails();
    assert_eq!(sent.len(), 5);
    assert!(sent.iter().all(|email| email.to == "test@example.com"));

    let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM email_logs")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(logs, 0);
}

#[tokio::test]
async fn test_疎通確認の送信失敗は結果に含まれる() {
    let app = spawn_app_with(MockNotificationSender::failing()).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/test-emails"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body(response).await;
    assert!(
        body["results"]
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["result"]["success"] == false)
    );
}

#[tokio::test]
async fn test_メトリクスはファサード経由の配信結果を集計する() {
    let app = spawn_app().await;
    let _guard = metrics::set_default_local_recorder(app.metrics.recorder());

    for payload in [
        json!({ "username": "A", "emailid": "a@example.com" }),
        json!({ "username": "A" }),
    ] {
        app.router
            .clone()
            .oneshot(post_json("/api/email/dmit-scans", &payload))
            .await
            .unwrap();
    }

    let response = app.router.clone().oneshot(get("/api/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_body(response).await["data"],
        json!({ "sent": 1, "failed": 0, "validationRejected": 1, "logAppendFailures": 0 })
    );
}
