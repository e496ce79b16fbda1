//! # EmailLogRepository
//!
//! 配信ログの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **追記専用**: 更新・削除の操作を持たない
//! - **一覧は顧客と外部結合**: 顧客の現在の表示名・メールアドレスを付与する
//! - **集計は DB 側で行う**: 種別ごとに total / successful / failed を GROUP BY で求める

use std::str::FromStr;

use async_trait::async_trait;
use bcimail_domain::{
    customer::CustomerId,
    email_log::{DeliveryStatus, EmailLogEntry, EmailLogId, EmailTypeStats, NewEmailLog},
    notification::EmailType,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::InfraError;

/// 配信ログリポジトリトレイト
#[async_trait]
pub trait EmailLogRepository: Send + Sync {
    /// 配信ログを追記する
    async fn append(&self, log: &NewEmailLog) -> Result<EmailLogId, InfraError>;

    /// 全配信ログを送信日時の新しい順に返す
    async fn list_all(&self) -> Result<Vec<EmailLogEntry>, InfraError>;

    /// イベント種別ごとの件数を送信総数の多い順に返す
    async fn aggregate_by_type(&self) -> Result<Vec<EmailTypeStats>, InfraError>;
}

/// SQLite 実装の EmailLogRepository
#[derive(Debug, Clone)]
pub struct SqliteEmailLogRepository {
    pool: SqlitePool,
}

impl SqliteEmailLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EmailLogRow {
    id:              i64,
    customer_id:     i64,
    email_type:      String,
    recipient_email: String,
    recipient_name:  String,
    subject:         String,
    status:          String,
    error_message:   Option<String>,
    sent_at:         DateTime<Utc>,
    customer_name:   Option<String>,
    customer_email:  Option<String>,
}

impl TryFrom<EmailLogRow> for EmailLogEntry {
    type Error = InfraError;

    fn try_from(row: EmailLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id:              EmailLogId::from_i64(row.id),
            customer_id:     CustomerId::from_i64(row.customer_id),
            email_type:      parse_email_type(&row.email_type)?,
            recipient_email: row.recipient_email,
            recipient_name:  row.recipient_name,
            subject:         row.subject,
            status:          DeliveryStatus::from_str(&row.status).map_err(|_| {
                InfraError::unexpected(format!("不正な status: {}", row.status))
            })?,
            error_message:   row.error_message,
            sent_at:         row.sent_at,
            customer_name:   row.customer_name,
            customer_email:  row.customer_email,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EmailTypeStatsRow {
    email_type: String,
    total:      i64,
    successful: i64,
    failed:     i64,
}

fn parse_email_type(value: &str) -> Result<EmailType, InfraError> {
    EmailType::from_str(value)
        .map_err(|_| InfraError::unexpected(format!("不正な email_type: {value}")))
}

#[async_trait]
impl EmailLogRepository for SqliteEmailLogRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(email_type = %log.email_type))]
    async fn append(&self, log: &NewEmailLog) -> Result<EmailLogId, InfraError> {
        let status: &str = log.outcome.status().into();
        let email_type: &str = log.email_type.into();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO email_logs (
                customer_id, email_type, recipient_email, recipient_name,
                subject, status, error_message, sent_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(log.customer_id.as_i64())
        .bind(email_type)
        .bind(&log.recipient_email)
        .bind(&log.recipient_name)
        .bind(&log.subject)
        .bind(status)
        .bind(log.outcome.error_message())
        .bind(log.sent_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(EmailLogId::from_i64(id))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_all(&self) -> Result<Vec<EmailLogEntry>, InfraError> {
        let rows: Vec<EmailLogRow> = sqlx::query_as(
            r#"
            SELECT
                l.id,
                l.customer_id,
                l.email_type,
                l.recipient_email,
                l.recipient_name,
                l.subject,
                l.status,
                l.error_message,
                l.sent_at,
                c.display_name AS customer_name,
                c.email AS customer_email
            FROM email_logs l
            LEFT JOIN customers c ON c.id = l.customer_id
            ORDER BY l.sent_at DESC, l.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EmailLogEntry::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn aggregate_by_type(&self) -> Result<Vec<EmailTypeStats>, InfraError> {
        let rows: Vec<EmailTypeStatsRow> = sqlx::query_as(
            r#"
            SELECT
                email_type,
                COUNT(*) AS total,
                SUM(CASE WHEN status = 'sent' THEN 1 ELSE 0 END) AS successful,
                SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END) AS failed
            FROM email_logs
            GROUP BY email_type
            ORDER BY total DESC, email_type ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(EmailTypeStats {
                    email_type: parse_email_type(&row.email_type)?,
                    total:      row.total,
                    successful: row.successful,
                    failed:     row.failed,
                })
            })
            .collect()
    }
}
