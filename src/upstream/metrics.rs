//! Lightweight counters tracking upstream attempts, failures, exhausted calls
//! and latency so the fetcher can expose aggregated snapshots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct FetchMetrics {
    total_attempts: AtomicU64,
    total_failures: AtomicU64,
    total_exhausted: AtomicU64,
    total_latency_ns: AtomicU64,
}

impl FetchMetrics {
    pub(crate) fn record_success(&self, latency: Duration) {
        self.total_attempts.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, latency: Duration) {
        self.total_attempts.fetch_add(1, Ordering::Relaxed);
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Every origin failed for one call.
    pub(crate) fn record_exhausted(&self) {
        self.total_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> FetchMetricsSnapshot {
        let total_attempts = self.total_attempts.load(Ordering::Relaxed);
        let total_failures = self.total_failures.load(Ordering::Relaxed);
        let total_latency_ns = self.total_latency_ns.load(Ordering::Relaxed);

        let average_latency_ms = if total_attempts == 0 {
            0.0
        } else {
            (total_latency_ns as f64 / total_attempts as f64) / 1_000_000.0
        };

        let error_rate = if total_attempts == 0 {
            0.0
        } else {
            total_failures as f64 / total_attempts as f64
        };

        FetchMetricsSnapshot {
            total_attempts,
            total_failures,
            total_exhausted: self.total_exhausted.load(Ordering::Relaxed),
            average_latency_ms,
            error_rate,
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct FetchMetricsSnapshot {
    pub total_attempts: u64,
    pub total_failures: u64,
    pub total_exhausted: u64,
    pub average_latency_ms: f64,
    pub error_rate: f64,
}
