//! # SQLite データベース接続管理
//!
//! 接続プールの作成、マイグレーション、疎通確認を行う。
//!
//! ## 設計方針
//!
//! - **WAL モード + busy_timeout**: 同時書き込みは待機させ、即座に `SQLITE_BUSY` で失敗させない。
//!   顧客 ID の払い出しは書き込みトランザクションで直列化されるため、待機が前提になる
//! - **外部キー有効化**: 配信ログは必ず既存の顧客を参照する
//! - **インメモリ DB**: テスト・ローカル検証用。接続ごとに別 DB になるため接続数を 1 に固定し、
//!   アイドル切断もしない
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use bcimail_infra::db;
//!
//! let pool = db::create_pool("sqlite://data/bci_email.db").await?;
//! db::run_migrations(&pool).await?;
//! ```

use std::{str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};

use crate::error::InfraError;

/// 書き込みロック待ちの上限
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite 接続プールを作成する
///
/// データベースファイルが存在しない場合は作成する（親ディレクトリは呼び出し側で用意する）。
///
/// # 引数
///
/// * `database_url` - `sqlite://path/to/file.db` 形式の URL
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
}

/// インメモリ SQLite の接続プールを作成する
///
/// プールが破棄されるとデータも消える。
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// データベースマイグレーションを実行する
///
/// `sqlx::migrate!()` でリポジトリルートの `migrations/` を埋め込む。
/// 適用済みのマイグレーションはスキップされる。
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), InfraError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// データベースの疎通を確認する（Readiness Check 用）
#[tracing::instrument(skip_all, level = "debug")]
pub async fn ping(pool: &SqlitePool) -> Result<(), InfraError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
