//! # BCI Mail ドメイン層
//!
//! 通知配信サービスのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **外部依存なし**: データベースや HTTP の詳細を持たない
//! - **不変条件の型表現**: 送信ステータスとエラーメッセージの対応、
//!   イベント種別ごとの必須フィールドを型で表す
//! - **検証は生成時に一度だけ**: 値オブジェクト・イベントは検証済みの値しか持たない
//!
//! ## モジュール構成
//!
//! - [`customer`] - 顧客（配信先ディレクトリのエンティティ）
//! - [`email_log`] - 配信ログ（送信試行の追記専用レコード）
//! - [`notification`] - イベント種別、通知イベント、メールメッセージ、配信結果
//! - [`value_objects`] - 表示名・メールアドレス
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層エラー

#[macro_use]
mod macros;

pub mod clock;
pub mod customer;
pub mod email_log;
pub mod error;
pub mod notification;
pub mod value_objects;

pub use error::DomainError;
