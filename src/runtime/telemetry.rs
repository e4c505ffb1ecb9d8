use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default interval used by the metrics reporter task.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(60);

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Rolling ingestion counters shared by every tick.
#[derive(Default, Debug)]
pub struct Telemetry {
    pages_fetched: AtomicU64,
    page_errors: AtomicU64,
    records_resolved: AtomicU64,
    records_filtered: AtomicU64,
    records_unresolved: AtomicU64,
    rows_inserted: AtomicU64,
    rows_updated: AtomicU64,
    rows_unchanged: AtomicU64,
    write_failures: AtomicU64,
}

impl Telemetry {
    pub fn record_page(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_page_error(&self) {
        self.page_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resolved(&self) {
        self.records_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filtered(&self) {
        self.records_filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unresolved(&self) {
        self.records_unresolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inserted(&self) {
        self.rows_inserted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_updated(&self) {
        self.rows_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unchanged(&self) {
        self.rows_unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            page_errors: self.page_errors.load(Ordering::Relaxed),
            records_resolved: self.records_resolved.load(Ordering::Relaxed),
            records_filtered: self.records_filtered.load(Ordering::Relaxed),
            records_unresolved: self.records_unresolved.load(Ordering::Relaxed),
            rows_inserted: self.rows_inserted.load(Ordering::Relaxed),
            rows_updated: self.rows_updated.load(Ordering::Relaxed),
            rows_unchanged: self.rows_unchanged.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub pages_fetched: u64,
    pub page_errors: u64,
    pub records_resolved: u64,
    pub records_filtered: u64,
    pub records_unresolved: u64,
    pub rows_inserted: u64,
    pub rows_updated: u64,
    pub rows_unchanged: u64,
    pub write_failures: u64,
}

/// Spawns a background task that periodically logs ingestion counters and
/// the deltas since the previous report.
pub fn spawn_metrics_reporter(
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_snapshot = telemetry.snapshot();

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(
                        target: "realm_indexer::metrics",
                        "metrics reporter shutting down"
                    );
                    break;
                }
                _ = ticker.tick() => {
                    let current = telemetry.snapshot();
                    let written = (current.rows_inserted + current.rows_updated)
                        .saturating_sub(last_snapshot.rows_inserted + last_snapshot.rows_updated);

                    tracing::info!(
                        target: "realm_indexer::metrics",
                        pages = current.pages_fetched,
                        page_errors = current.page_errors,
                        resolved = current.records_resolved,
                        filtered = current.records_filtered,
                        unresolved = current.records_unresolved,
                        inserted = current.rows_inserted,
                        updated = current.rows_updated,
                        write_failures = current.write_failures,
                        written_since_last = written,
                        "ingestion metrics snapshot"
                    );

                    last_snapshot = current;
                }
            }
        }
    })
}
