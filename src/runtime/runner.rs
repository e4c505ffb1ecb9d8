use crate::ingest::orchestrator::{CheckpointWrite, Orchestrator};
use crate::runtime::config::IndexerConfig;
use crate::runtime::telemetry::{spawn_metrics_reporter, Telemetry};
use anyhow::{anyhow, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Drives the tail and rescan schedules in-process and handles OS signals for
/// graceful shutdowns.
///
/// Both loops take the same tick guard, so a tail poll never overlaps a rescan
/// tick inside one process.
pub struct Runner {
    orchestrator: Orchestrator,
    telemetry: Arc<Telemetry>,
    tail_interval: Duration,
    rescan_interval: Duration,
    metrics_interval: Duration,
    shutdown: CancellationToken,
    tick_guard: Arc<Mutex<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Runner {
    pub fn new(
        config: &IndexerConfig,
        orchestrator: Orchestrator,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            orchestrator,
            telemetry,
            tail_interval: config.tail_interval(),
            rescan_interval: config.rescan_interval(),
            metrics_interval: config.metrics_interval(),
            shutdown: CancellationToken::new(),
            tick_guard: Arc::new(Mutex::new(())),
            tasks: Vec::new(),
        }
    }

    /// Returns a clone of the root shutdown token so external callers can integrate
    /// with their own signal handlers or cancellation strategies.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Spawns the tail loop, the rescan loop and the metrics reporter.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let tail = self.orchestrator.clone();
        let tail_task = self.spawn_schedule("tail", self.tail_interval, move || {
            let tail = tail.clone();
            async move {
                let (report, summary) = tail.tail_tick().await?;
                tracing::debug!(
                    outcome = ?report.outcome,
                    entries = summary.entries,
                    "tail tick finished"
                );
                settle_logged(report.write).await;
                Ok(())
            }
        });

        let rescan = self.orchestrator.clone();
        let rescan_task = self.spawn_schedule("rescan", self.rescan_interval, move || {
            let rescan = rescan.clone();
            async move {
                let report = rescan.rescan_tick().await?;
                tracing::debug!(
                    page = report.page,
                    outcome = ?report.outcome,
                    next_cursor = report.checkpoint.page_cursor,
                    "rescan tick finished"
                );
                settle_logged(report.write).await;
                Ok(())
            }
        });

        self.tasks.push(tail_task);
        self.tasks.push(rescan_task);
        self.tasks.push(spawn_metrics_reporter(
            Arc::clone(&self.telemetry),
            self.shutdown.clone(),
            self.metrics_interval,
        ));

        tracing::info!(
            tail_interval_secs = self.tail_interval.as_secs_f64(),
            rescan_interval_secs = self.rescan_interval.as_secs_f64(),
            "runner started"
        );
    }

    /// Cancels every loop and waits for in-flight ticks to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }

        self.shutdown.cancel();
        let mut failure = None;
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                failure.get_or_insert_with(|| anyhow!("runner task failed: {err}"));
            }
        }
        self.shutdown = CancellationToken::new();

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs until a Ctrl-C (SIGINT) is received or the shutdown token is cancelled elsewhere.
    pub async fn run_until_ctrl_c(&mut self) -> Result<()> {
        self.start();
        tracing::info!("waiting for Ctrl-C (SIGINT) to initiate shutdown");

        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("Ctrl-C received; shutting down runner");
            }
            _ = self.shutdown.cancelled() => {
                tracing::info!("runner shutdown token cancelled");
            }
        }

        self.stop().await
    }

    fn spawn_schedule<F, Fut>(
        &self,
        name: &'static str,
        period: Duration,
        tick: F,
    ) -> JoinHandle<()>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let guard = Arc::clone(&self.tick_guard);

        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let _permit = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    permit = guard.lock() => permit,
                };
                if let Err(err) = tick().await {
                    tracing::error!(schedule = name, error = %err, "tick failed");
                }
            }

            tracing::info!(schedule = name, "schedule stopped");
        })
    }
}

/// Waits for the checkpoint write so the next tick on this schedule reads it.
/// A failed write is already logged by the orchestrator.
async fn settle_logged(write: CheckpointWrite) {
    if write.settle().await.is_err() {
        tracing::debug!("continuing after lost checkpoint write");
    }
}
