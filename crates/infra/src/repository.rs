//! # リポジトリ
//!
//! 顧客ディレクトリと配信ログの永続化を担当する。
//!
//! - [`customer_repository`] - 顧客の検索・作成（作成済みなら取得に切り替え）・一覧
//! - [`email_log_repository`] - 配信ログの追記・一覧・種別ごとの集計

pub mod customer_repository;
pub mod email_log_repository;

pub use customer_repository::{CreateOrFetch, CustomerRepository, SqliteCustomerRepository};
pub use email_log_repository::{EmailLogRepository, SqliteEmailLogRepository};
