//! 統合テスト共通ヘルパー

#![allow(dead_code)]

use bcimail_domain::{
    customer::{Customer, CustomerId},
    email_log::{DeliveryOutcome, NewEmailLog},
    notification::EmailType,
    value_objects::{DisplayName, Email},
};
use bcimail_infra::{
    db,
    repository::{CustomerRepository, SqliteCustomerRepository},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;

/// マイグレーション適用済みのインメモリプールを作成する
pub async fn setup_pool() -> SqlitePool {
    let pool = db::create_memory_pool().await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

/// テスト用の基準時刻
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()
}

pub fn minutes_later(minutes: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(minutes)
}

pub fn name(value: &str) -> DisplayName {
    DisplayName::new(value).unwrap()
}

pub fn email(value: &str) -> Email {
    Email::new(value).unwrap()
}

/// 顧客を 1 件作成して返す
pub async fn insert_customer(pool: &SqlitePool, display_name: &str, address: &str) -> Customer {
    SqliteCustomerRepository::new(pool.clone())
        .create(&name(display_name), &email(address), base_time())
        .await
        .unwrap()
        .into_customer()
}

pub fn sent_log(
    customer_id: CustomerId,
    email_type: EmailType,
    sent_at: DateTime<Utc>,
) -> NewEmailLog {
    NewEmailLog {
        customer_id,
        email_type,
        recipient_email: "a@x.com".to_string(),
        recipient_name: "A".to_string(),
        subject: "Subject".to_string(),
        outcome: DeliveryOutcome::Sent,
        sent_at,
    }
}

pub fn failed_log(
    customer_id: CustomerId,
    email_type: EmailType,
    sent_at: DateTime<Utc>,
) -> NewEmailLog {
    NewEmailLog {
        outcome: DeliveryOutcome::Failed {
            error_message: "SendGrid 送信失敗: status=401".to_string(),
        },
        ..sent_log(customer_id, email_type, sent_at)
    }
}
