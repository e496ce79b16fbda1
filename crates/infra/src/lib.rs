//! # BCI Mail インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: SQLite への接続プール管理とマイグレーション
//! - **リポジトリ実装**: 顧客ディレクトリと配信ログの永続化
//! - **送信プロバイダ**: SendGrid / SMTP / SES へのメール送信
//!
//! ## 依存関係
//!
//! ```text
//! notify-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - SQLite 接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - メール送信の抽象化と実装
//! - [`repository`] - リポジトリ実装
//! - `mock` - テスト用インメモリ実装（`test-utils` feature）

pub mod db;
pub mod error;
#[cfg(feature = "test-utils")]
pub mod mock;
pub mod notification;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
