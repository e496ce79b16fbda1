//! 管理 API の統合テスト

use axum::http::StatusCode;
use bcimail_infra::mock::MockNotificationSender;
use bcimail_notify_service::test_utils::{
    get,
    post_json,
    response_body,
    spawn_app,
    spawn_app_with,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn call(
    router: &axum::Router,
    request: axum::http::Request<axum::body::Body>,
) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, response_body(response).await)
}

#[tokio::test]
async fn test_顧客を登録して一覧で新しい順に取得できる() {
    let app = spawn_app().await;

    let (status, body) = call(
        &app.router,
        post_json(
            "/api/admin/customers",
            &json!({ "displayName": "Asha", "email": "asha@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["customer"]["id"], 1000);
    assert_eq!(body["customer"]["display_name"], "Asha");

    call(
        &app.router,
        post_json(
            "/api/admin/customers",
            &json!({ "displayName": "Ben", "email": "ben@example.com" }),
        ),
    )
    .await;

    let (status, body) = call(&app.router, get("/api/admin/customers")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["display_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ben", "Asha"]);
}

#[tokio::test]
async fn test_登録済みのメールアドレスでは既存顧客を返す() {
    let app = spawn_app().await;
    let request = json!({ "displayName": "Asha", "email": "asha@example.com" });
    call(&app.router, post_json("/api/admin/customers", &request)).await;

    let (status, body) = call(
        &app.router,
        post_json(
            "/api/admin/customers",
            &json!({ "displayName": "Someone Else", "email": "asha@example.com" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer"]["id"], 1000);
    assert_eq!(body["customer"]["display_name"], "Asha");
}

#[tokio::test]
async fn test_顧客登録の必須項目が欠けると400() {
    let app = spawn_app().await;

    let (status, body) = call(
        &app.router,
        post_json("/api/admin/customers", &json!({ "displayName": "Asha" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "success": false, "message": "Missing required fields: displayName, email" })
    );
}

#[tokio::test]
async fn test_手動送信はイベントapiと同じ件名でログに残る() {
    let app = spawn_app().await;

    let (status, body) = call(
        &app.router,
        post_json(
            "/api/admin/send-email",
            &json!({
                "displayName": "John",
                "recipientEmail": "john@example.com",
                "emailType": "test-start",
                "startUrl": "https://tests.example.com/start",
                "resumeUrl": "https://tests.example.com/resume",
                "testType": "IQ"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "message": "Test start email sent successfully" })
    );

    let (_, logs) = call(&app.router, get("/api/admin/email-logs")).await;
    let log = &logs[0];
    assert_eq!(log["email_type"], "test-start");
    assert_eq!(log["subject"], "Your IQ Test is Ready to Begin");
    assert_eq!(log["status"], "sent");
    assert_eq!(log["error_message"], Value::Null);
    assert_eq!(log["customer_name"], "John");
    assert_eq!(log["customer_email"], "john@example.com");
}

#[tokio::test]
async fn test_手動送信の不正な種別は400() {
    let app = spawn_app().await;

    let (status, body) = call(
        &app.router,
        post_json(
            "/api/admin/send-email",
            &json!({
                "displayName": "John",
                "recipientEmail": "john@example.com",
                "emailType": "newsletter"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email type");
}

#[tokio::test]
async fn test_手動送信のカウンセリングはフォーム項目から送れる() {
    let app = spawn_app().await;

    let (status, body) = call(
        &app.router,
        post_json(
            "/api/admin/send-email",
            &json!({
                "displayName": "John",
                "recipientEmail": "john@example.com",
                "emailType": "counseling",
                "action": "reschedule",
                "sessionDate": "2025-02-02",
                "sessionTime": "11:00 AM",
                "counselor": "Dr. Mehta",
                "meetingLink": "https://meet.example.com/abc"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let sent = app.sender.sent_emails();
    assert_eq!(sent[0].subject, "Reschedule Counseling Session");
    assert!(sent[0].text_body.contains("New Date: 2025-02-02"));
}

#[tokio::test]
async fn test_統計は種別ごとの件数と合計を返す() {
    let app = spawn_app_with(MockNotificationSender::new()).await;
    for (name, email) in [("A", "a@example.com"), ("B", "b@example.com")] {
        call(
            &app.router,
            post_json(
                "/api/email/dmit-scans",
                &json!({ "username": name, "emailid": email }),
            ),
        )
        .await;
    }
    call(
        &app.router,
        post_json(
            "/api/email/appointment",
            &json!({ "name": "A", "email": "a@example.com" }),
        ),
    )
    .await;

    let (status, body) = call(&app.router, get("/api/admin/statistics")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "totalCustomers": 2,
            "totalEmails": 3,
            "successfulEmails": 3,
            "failedEmails": 0,
            "emailTypeStats": [
                { "email_type": "dmit-scans", "total_sent": 2, "successful": 2, "failed": 0 },
                { "email_type": "appointment", "total_sent": 1, "successful": 1, "failed": 0 }
            ]
        })
    );
}

#[tokio::test]
async fn test_統計は失敗件数も数える() {
    let app = spawn_app_with(MockNotificationSender::failing()).await;
    call(
        &app.router,
        post_json(
            "/api/email/dmit-scans",
            &json!({ "username": "A", "emailid": "a@example.com" }),
        ),
    )
    .await;

    let (_, body) = call(&app.router, get("/api/admin/statistics")).await;

    assert_eq!(body["totalEmails"], 1);
    assert_eq!(body["successfulEmails"], 0);
    assert_eq!(body["failedEmails"], 1);
}

#[tokio::test]
async fn test_一覧と統計はエンベロープなしのjsonを返す() {
    let app = spawn_app().await;

    let (status, customers) = call(&app.router, get("/api/admin/customers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customers, json!([]));

    let (status, logs) = call(&app.router, get("/api/admin/email-logs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs, json!([]));

    let (status, stats) = call(&app.router, get("/api/admin/statistics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({
            "totalCustomers": 0,
            "totalEmails": 0,
            "successfulEmails": 0,
            "failedEmails": 0,
            "emailTypeStats": []
        })
    );
}
