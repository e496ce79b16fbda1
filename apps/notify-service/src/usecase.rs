//! # ユースケース層
//!
//! Notify Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・送信プロバイダ・時刻源を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - [`notification`]: 通知配信（検証 → 顧客解決 → レンダリング → 送信 → ログ記録）
//! - [`admin`]: 管理画面向けの顧客・配信ログ参照と統計

pub mod admin;
pub mod notification;

pub use admin::{AdminUseCase, Statistics};
pub use notification::{DispatchError, DispatchMetrics, DispatchService, TemplateRenderer};
