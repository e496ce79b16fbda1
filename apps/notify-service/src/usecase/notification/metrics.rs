//! # 配信メトリクス
//!
//! 配信結果のカウンタは `metrics` ファサード経由で記録する。
//! 記録先はプロセスに設定されたレコーダーで、本番では [`DispatchMetrics`] を
//! グローバルレコーダーとして登録し、`/api/metrics` でスナップショットを返す。
//!
//! 配信ログの追記失敗は呼び出し元に返らないため、
//! [`LOG_APPEND_FAILURES_TOTAL`] とエラーログだけが検知手段になる。

use std::sync::{Arc, atomic::Ordering};

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use serde::Serialize;
use thiserror::Error;

/// 送信成功数
pub const SENT_TOTAL: &str = "dispatch_sent_total";
/// 送信失敗数
pub const FAILED_TOTAL: &str = "dispatch_failed_total";
/// ペイロード検証で拒否した数
pub const VALIDATION_REJECTED_TOTAL: &str = "dispatch_validation_rejected_total";
/// 配信ログの追記に失敗した数
pub const LOG_APPEND_FAILURES_TOTAL: &str = "dispatch_log_append_failures_total";

pub(crate) fn record_sent() {
    metrics::counter!(SENT_TOTAL).increment(1);
}

pub(crate) fn record_failed() {
    metrics::counter!(FAILED_TOTAL).increment(1);
}

pub(crate) fn record_validation_rejected() {
    metrics::counter!(VALIDATION_REJECTED_TOTAL).increment(1);
}

pub(crate) fn record_log_append_failure() {
    metrics::counter!(LOG_APPEND_FAILURES_TOTAL).increment(1);
}

/// グローバルレコーダーが既に設定されていた
#[derive(Debug, Error)]
#[error("メトリクスのレコーダーは既に設定されています")]
pub struct RecorderAlreadyInstalled;

/// 配信カウンタを保持するレコーダー
///
/// `metrics-util` のレジストリに集計し、[`DispatchMetrics::snapshot`] で読み出す。
#[derive(Clone)]
pub struct DispatchRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl Recorder for DispatchRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| Counter::from_arc(c.clone()))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| Gauge::from_arc(g.clone()))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry.get_or_create_histogram(key, |h| Histogram::from_arc(h.clone()))
    }
}

/// 配信カウンタのハンドル
#[derive(Clone)]
pub struct DispatchMetrics {
    recorder: DispatchRecorder,
}

/// カウンタのある時点の値
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub sent:                u64,
    pub failed:              u64,
    pub validation_rejected: u64,
    pub log_append_failures: u64,
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            recorder: DispatchRecorder {
                registry: Arc::new(Registry::atomic()),
            },
        }
    }

    /// このハンドルのレコーダー
    ///
    /// テストでは `metrics::set_default_local_recorder` に渡してスレッド単位で使う。
    pub fn recorder(&self) -> &DispatchRecorder {
        &self.recorder
    }

    /// プロセス全体のレコーダーとして登録する
    pub fn install(&self) -> Result<(), RecorderAlreadyInstalled> {
        metrics::set_global_recorder(self.recorder.clone())
            .map_err(|_| RecorderAlreadyInstalled)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sent:                self.counter(SENT_TOTAL),
            failed:              self.counter(FAILED_TOTAL),
            validation_rejected: self.counter(VALIDATION_REJECTED_TOTAL),
            log_append_failures: self.counter(LOG_APPEND_FAILURES_TOTAL),
        }
    }

    /// ラベル違いを合算したカウンタ値
    fn counter(&self, name: &str) -> u64 {
        let mut total = 0;
        self.recorder.registry.visit_counters(|key, counter| {
            if key.name() == name {
                total += counter.load(Ordering::Relaxed);
            }
        });
        total
    }
}

/// デバッグ用レコーダーのスナップショットからカウンタ値を取り出す
#[cfg(any(test, feature = "test-utils"))]
pub fn debug_counter(snapshotter: &metrics_util::debugging::Snapshotter, name: &str) -> u64 {
    use metrics_util::{MetricKind, debugging::DebugValue};

    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, ..)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(.., value)| match value {
            DebugValue::Counter(v) => v,
            _ => 0,
        })
        .sum()
}
