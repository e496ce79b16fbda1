//! # CustomerRepository
//!
//! 顧客ディレクトリの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **作成 or 取得**: 同じメールアドレスでの作成は一意制約違反を捕捉し、
//!   既存レコードを返す。呼び出し側にエラーは返さない
//! - **ID 払い出しのトランザクション化**: カウンタの更新を最初の文にして書き込みロックを取り、
//!   INSERT と同じトランザクションで確定する。INSERT が失敗した場合はロールバックされ、
//!   カウンタは進まない
//! - **カウンタは DB に置く**: プロセス再起動や複数プロセスでも ID が重複しない

use async_trait::async_trait;
use bcimail_domain::{
    customer::{Customer, CustomerId},
    value_objects::{DisplayName, Email},
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::InfraError;

/// `create` の結果
///
/// 新規作成したのか、同じメールアドレスの既存顧客を返したのかを区別する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOrFetch {
    Created(Customer),
    Existing(Customer),
}

impl CreateOrFetch {
    pub fn customer(&self) -> &Customer {
        match self {
            Self::Created(customer) | Self::Existing(customer) => customer,
        }
    }

    pub fn into_customer(self) -> Customer {
        match self {
            Self::Created(customer) | Self::Existing(customer) => customer,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// 顧客リポジトリトレイト
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// メールアドレスで顧客を検索する
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, InfraError>;

    /// 顧客を作成する
    ///
    /// 同じメールアドレスの顧客が既に存在する場合は、その顧客を
    /// [`CreateOrFetch::Existing`] で返す。表示名は更新しない。
    async fn create(
        &self,
        display_name: &DisplayName,
        email: &Email,
        created_at: DateTime<Utc>,
    ) -> Result<CreateOrFetch, InfraError>;

    /// 全顧客を作成日時の新しい順に返す
    async fn list_all(&self) -> Result<Vec<Customer>, InfraError>;

    /// 顧客数を返す
    async fn count(&self) -> Result<i64, InfraError>;
}

/// SQLite 実装の CustomerRepository
#[derive(Debug, Clone)]
pub struct SqliteCustomerRepository {
    pool: SqlitePool,
}

impl SqliteCustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id:           i64,
    display_name: String,
    email:        String,
    created_at:   DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = InfraError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let display_name = DisplayName::new(row.display_name)
            .map_err(|e| InfraError::unexpected(format!("customers.id={}: {e}", row.id)))?;
        let email = Email::new(row.email)
            .map_err(|e| InfraError::unexpected(format!("customers.id={}: {e}", row.id)))?;

        Ok(Customer::from_db(
            CustomerId::from_i64(row.id),
            display_name,
            email,
            row.created_at,
        ))
    }
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, InfraError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, email, created_at
            FROM customers
            WHERE email = ?
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn create(
        &self,
        display_name: &DisplayName,
        email: &Email,
        created_at: DateTime<Utc>,
    ) -> Result<CreateOrFetch, InfraError> {
        let mut tx = self.pool.begin().await?;

        // 最初の文を書き込みにして、ID を読む前に書き込みロックを取得する
        let allocated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE customer_id_counter
            SET next_id = next_id + 1
            WHERE id = 1
            RETURNING next_id - 1
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = allocated else {
            tx.rollback().await?;
            return Err(InfraError::unexpected(
                "customer_id_counter が初期化されていません",
            ));
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO customers (id, display_name, email, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(display_name.as_str())
        .bind(email.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(InfraError::from);

        match inserted {
            Ok(_) => {
                tx.commit().await?;
                Ok(CreateOrFetch::Created(Customer::from_db(
                    CustomerId::from_i64(id),
                    display_name.clone(),
                    email.clone(),
                    created_at,
                )))
            }
            Err(e) if e.is_unique_violation() => {
                tx.rollback().await?;
                tracing::debug!("メールアドレスが登録済みのため既存顧客を返す");
                let existing = self.find_by_email(email).await?.ok_or_else(|| {
                    InfraError::unexpected("一意制約違反の直後に顧客が見つからない")
                })?;
                Ok(CreateOrFetch::Existing(existing))
            }
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_all(&self) -> Result<Vec<Customer>, InfraError> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, email, created_at
            FROM customers
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Customer::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn count(&self) -> Result<i64, InfraError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
