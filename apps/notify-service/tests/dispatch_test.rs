//! イベント通知 API の統合テスト
//!
//! ルーター → ユースケース → SQLite（インメモリ）を通し、送信だけをモックにする。

use axum::http::StatusCode;
use bcimail_infra::mock::MockNotificationSender;
use bcimail_notify_service::{
    test_utils::{
        post_form,
        post_json,
        response_body,
        response_text,
        spawn_app,
        spawn_app_with,
    },
    usecase::notification::metrics::{
        FAILED_TOTAL,
        LOG_APPEND_FAILURES_TOTAL,
        SENT_TOTAL,
        debug_counter,
    },
};
use metrics_util::debugging::DebuggingRecorder;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::SqlitePool;
use tower::ServiceExt;

#[derive(Debug, PartialEq, sqlx::FromRow)]
struct LogRow {
    customer_id:   i64,
    email_type:    String,
    subject:       String,
    status:        String,
    error_message: Option<String>,
}

async fn email_logs(pool: &SqlitePool) -> Vec<LogRow> {
    sqlx::query_as(
        r#"
        SELECT customer_id, email_type, subject, status, error_message
        FROM email_logs
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

async fn customer_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(pool)
        .await
        .unwrap()
}

fn registration_payload() -> serde_json::Value {
    json!({
        "username": "John",
        "emailid": "john@example.com",
        "usercode": "U1",
        "testType": "IQ"
    })
}

fn counseling_payload(action: &str, meeting_link: Option<&str>) -> serde_json::Value {
    let mut details = json!({
        "date": "2025-02-01",
        "time": "10:00 AM",
        "counselor": "Dr. Mehta"
    });
    if let Some(link) = meeting_link {
        details["meetingLink"] = json!(link);
    }
    json!({
        "username": "John",
        "emailid": "john@example.com",
        "action": action,
        "sessionDetails": details
    })
}

#[tokio::test]
async fn test_登録通知で顧客1000が作成され送信ログが1件残る() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/email/registration", &registration_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_body(response).await,
        json!({ "success": true, "message": "Registration email sent successfully" })
    );

    let sent = app.sender.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "john@example.com");
    assert_eq!(sent[0].subject, "Welcome to IQ Test - Registration Confirmed");

    let (id, name): (i64, String) =
        sqlx::query_as("SELECT id, display_name FROM customers WHERE email = 'john@example.com'")
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(id, 1000);
    assert_eq!(name, "John");

    assert_eq!(
        email_logs(&app.pool).await,
        vec![LogRow {
            customer_id:   1000,
            email_type:    "registration".to_string(),
            subject:       "Welcome to IQ Test - Registration Confirmed".to_string(),
            status:        "sent".to_string(),
            error_message: None,
        }]
    );
}

#[tokio::test]
async fn test_送信失敗は200のfailureで失敗ログが残る() {
    let app = spawn_app_with(MockNotificationSender::failing()).await;

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/email/registration", &registration_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_body(response).await,
        json!({ "success": false, "message": "Failed to send email" })
    );

    let logs = email_logs(&app.pool).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, "failed");
    assert_eq!(logs[0].error_message.as_deref(), Some("Failed to send email"));
}

#[tokio::test]
async fn test_必須項目の欠落は400で何も作成しない() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/email/registration",
            &json!({ "username": "John", "emailid": "john@example.com", "usercode": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_body(response).await,
        json!({
            "success": false,
            "message": "Missing required fields: username, emailid, usercode, testType"
        })
    );
    assert_eq!(customer_count(&app.pool).await, 0);
    assert!(email_logs(&app.pool).await.is_empty());
    assert!(app.sender.sent_emails().is_empty());
}

#[tokio::test]
async fn test_未知の種別は400() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/email/newsletter", &registration_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_body(response).await,
        json!({ "success": false, "message": "Invalid email type" })
    );
}

#[tokio::test]
async fn test_不正なjsonは400() {
    let app = spawn_app().await;
    let request = axum::http::Request::post("/api/email/dmit-scans")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_body(response).await["message"], "Invalid JSON body");
}

#[tokio::test]
async fn test_カウンセリングのキャンセルはリンクなしで送れる() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/email/counseling",
            &counseling_payload("cancel", None),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_body(response).await["message"],
        "Counseling session email sent successfully"
    );

    let sent = app.sender.sent_emails();
    assert_eq!(sent[0].subject, "Cancel Counseling Session");
    assert!(!sent[0].html_body.contains("Join Meeting"));
    assert!(!sent[0].text_body.contains("Meeting Link"));
}

#[tokio::test]
async fn test_カウンセリングの予約はリンクを含む() {
    let app = spawn_app().await;

    app.router
        .clone()
        .oneshot(post_json(
            "/api/email/counseling",
            &counseling_payload("schedule", Some("https://meet.example.com/abc")),
        ))
        .await
        .unwrap();

    let sent = app.sender.sent_emails();
    assert_eq!(sent[0].subject, "Schedule Counseling Session");
    assert!(sent[0].html_body.contains("Join Meeting"));
    assert!(
        sent[0]
            .text_body
            .contains("Meeting Link: https://meet.example.com/abc")
    );
}

#[tokio::test]
async fn test_カウンセリングの予約でリンクがなければ400() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/email/counseling",
            &counseling_payload("schedule", None),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_body(response).await["message"],
        "Missing required session details: date, time, counselor, meetingLink"
    );
}

#[tokio::test]
async fn test_配信ログの記録に失敗しても結果は変わらずメトリクスに現れる() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let _guard = metrics::set_default_local_recorder(&recorder);

    let app = spawn_app().await;
    sqlx::query("DROP TABLE email_logs")
        .execute(&app.pool)
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/email/registration", &registration_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_body(response).await["success"], true);

    assert_eq!(debug_counter(&snapshotter, LOG_APPEND_FAILURES_TOTAL), 1);
    assert_eq!(debug_counter(&snapshotter, SENT_TOTAL), 1);
    assert_eq!(debug_counter(&snapshotter, FAILED_TOTAL), 0);
}

#[tokio::test]
async fn test_顧客ストアの障害は500で詳細を返さない() {
    let app = spawn_app().await;
    sqlx::query("DROP TABLE email_logs")
        .execute(&app.pool)
        .await
        .unwrap();
    sqlx::query("DROP TABLE customers")
        .execute(&app.pool)
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/email/registration", &registration_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response_body(response).await,
        json!({ "success": false, "message": "Internal server error" })
    );
    assert!(app.sender.sent_emails().is_empty());
}

#[tokio::test]
async fn test_同じメールアドレスへの2回目の通知は既存顧客に紐づく() {
    let app = spawn_app().await;

    for _ in 0..2 {
        app.router
            .clone()
            .oneshot(post_json("/api/email/registration", &registration_payload()))
            .await
            .unwrap();
    }
    app.router
        .clone()
        .oneshot(post_json(
            "/api/email/dmit-scans",
            &json!({ "username": "Jane", "emailid": "jane@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(customer_count(&app.pool).await, 2);
    let customer_ids: Vec<i64> = email_logs(&app.pool)
        .await
        .into_iter()
        .map(|log| log.customer_id)
        .collect();
    assert_eq!(customer_ids, vec![1000, 1000, 1001]);
}

#[tokio::test]
async fn test_予約フォームは完了ページを返す() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_form("/book", "name=Asha&email=asha%40example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_text(response).await.trim_end(),
        "<h2>Thank you, Asha. A confirmation email has been sent to asha@example.com.</h2>"
    );

    let sent = app.sender.sent_emails();
    assert_eq!(sent[0].subject, "Appointment Confirmed");
    assert_eq!(
        sent[0].text_body.trim_end(),
        "Thank you, Asha, for booking your appointment!"
    );

    let logs = email_logs(&app.pool).await;
    assert_eq!(logs[0].email_type, "appointment");
    assert_eq!(logs[0].status, "sent");
}

#[tokio::test]
async fn test_予約フォームの送信失敗は500で失敗ログが残る() {
    let app = spawn_app_with(MockNotificationSender::failing()).await;

    let response = app
        .router
        .clone()
        .oneshot(post_form("/book", "name=Asha&email=asha%40example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response_text(response).await, "Something went wrong.");
    assert_eq!(email_logs(&app.pool).await[0].status, "failed");
}

#[tokio::test]
async fn test_予約フォームでメールアドレスがなければ500() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_form("/book", "name=Asha"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response_text(response).await, "Something went wrong.");
    assert_eq!(customer_count(&app.pool).await, 0);
}
