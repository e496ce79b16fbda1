//! SendGridNotificationSender の統合テスト
//!
//! ローカルに axum のスタブサーバーを立て、Mail Send API との通信を検証する。

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use bcimail_domain::notification::{EmailMessage, NotificationError};
use bcimail_infra::notification::{NotificationSender, SendGridNotificationSender};
use pretty_assertions::assert_eq;
use serde_json::Value;

#[derive(Clone, Default)]
struct Captured {
    authorization: Arc<Mutex<Option<String>>>,
    body:          Arc<Mutex<Option<Value>>>,
}

#[derive(Clone)]
struct StubState {
    status:   StatusCode,
    captured: Captured,
}

async fn mail_send(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, &'static str) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.captured.authorization.lock().unwrap() = authorization;
    *state.captured.body.lock().unwrap() = Some(body);
    (state.status, "")
}

/// スタブサーバーを起動し、ベース URL と記録先を返す
async fn start_stub(status: StatusCode) -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/v3/mail/send", post(mail_send))
        .with_state(StubState {
            status,
            captured: captured.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), captured)
}

fn message() -> EmailMessage {
    EmailMessage {
        to:        "a@x.com".to_string(),
        subject:   "Your DMIT Scans Have Been Collected".to_string(),
        html_body: "<p>Hello A</p>".to_string(),
        text_body: "Hello A".to_string(),
    }
}

#[tokio::test]
async fn test_202応答で送信成功になる() {
    let (base_url, captured) = start_stub(StatusCode::ACCEPTED).await;
    let sender =
        SendGridNotificationSender::new(base_url, "SG.test-key", "noreply@bci.example.com".into());

    sender.send_email(&message()).await.unwrap();

    assert_eq!(
        captured.authorization.lock().unwrap().as_deref(),
        Some("Bearer SG.test-key")
    );
    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["personalizations"][0]["to"][0]["email"], "a@x.com");
    assert_eq!(body["from"]["email"], "noreply@bci.example.com");
    assert_eq!(body["subject"], "Your DMIT Scans Have Been Collected");
}

#[tokio::test]
async fn test_4xx応答は送信失敗になる() {
    let (base_url, _) = start_stub(StatusCode::UNAUTHORIZED).await;
    let sender = SendGridNotificationSender::new(base_url, "bad", "noreply@bci.example.com".into());

    let err = sender.send_email(&message()).await.unwrap_err();

    match err {
        NotificationError::SendFailed(detail) => assert!(detail.contains("401")),
        other => panic!("SendFailed を期待したが {other:?}"),
    }
}

#[tokio::test]
async fn test_5xx応答は送信失敗になる() {
    let (base_url, _) = start_stub(StatusCode::INTERNAL_SERVER_ERROR).await;
    let sender = SendGridNotificationSender::new(base_url, "key", "noreply@bci.example.com".into());

    let result = sender.send_email(&message()).await;

    assert!(matches!(result, Err(NotificationError::SendFailed(_))));
}

#[tokio::test]
async fn test_接続できない場合は送信失敗になる() {
    // バインドして即座に解放したポートには接続できない
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let sender = SendGridNotificationSender::new(
        format!("http://{addr}"),
        "key",
        "noreply@bci.example.com".into(),
    );

    let result = sender.send_email(&message()).await;

    assert!(matches!(result, Err(NotificationError::SendFailed(_))));
}
