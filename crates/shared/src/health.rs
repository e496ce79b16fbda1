//! # ヘルスチェック共通型
//!
//! `/api/health`（Liveness）と `/api/health/ready`（Readiness）のレスポンス型。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ヘルスチェックレスポンス
///
/// `status` はプロセスの稼働状態、`version` は Cargo.toml のバージョン。
/// 旧サービスとの互換のため、応答時刻・稼働環境名・サービス名も返す。
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 稼働状態（`"OK"`）
    pub status:      String,
    /// 応答時刻（RFC 3339）
    pub timestamp:   DateTime<Utc>,
    /// サービス名
    pub service:     String,
    /// アプリケーションバージョン
    pub version:     String,
    /// 稼働環境（`"development"` / `"production"`）
    pub environment: String,
}

/// 個別チェックの結果ステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

/// Readiness 全体のステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    /// 全依存先が利用可能
    Ready,
    /// 一部の依存先が利用不可
    NotReady,
}

/// Readiness Check レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: ReadinessStatus,
    /// 個別チェック結果（キー: チェック名）
    pub checks: HashMap<String, CheckStatus>,
}

impl ReadinessResponse {
    /// 個別チェック結果から全体ステータスを決定する
    ///
    /// 1 つでも [`CheckStatus::Error`] があれば [`ReadinessStatus::NotReady`]。
    pub fn from_checks(checks: HashMap<String, CheckStatus>) -> Self {
        let status = if checks.values().all(|s| *s == CheckStatus::Ok) {
            ReadinessStatus::Ready
        } else {
            ReadinessStatus::NotReady
        };
        Self { status, checks }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ReadinessStatus::Ready
    }
}
