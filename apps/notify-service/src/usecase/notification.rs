//! # 通知ユースケース
//!
//! イベント通知の検証・顧客解決・メール生成・送信・ログ記録を統合する。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - tera テンプレートエンジンによるメール生成
//! - [`provider`] - 送信プロバイダ呼び出しと結果の分類
//! - [`metrics`] - 配信カウンタ
//! - [`service`] - 上記を束ねる配信オーケストレータ

pub mod metrics;
pub mod provider;
pub mod service;
pub mod template_renderer;

pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use provider::ProviderClient;
pub use service::{DispatchError, DispatchService, SmokeTestOutcome};
pub use template_renderer::TemplateRenderer;
