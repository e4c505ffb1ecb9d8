//! Per-tick entry points. A rescan tick reads the mode checkpoint, processes
//! exactly one page at the stored cursor and hands the advanced checkpoint to
//! a background write. A tail tick polls the newest entries.
//!
//! Checkpoint writes are best-effort: the tick returns as soon as the page is
//! processed and the write may land late or never. A lost write means the
//! same page is processed again, which the upsert path absorbs.

use crate::ingest::checkpoint::{Checkpoint, ScanMode};
use crate::ingest::paginator::{DrainSummary, PageOutcome, Paginator};
use crate::ingest::record::{RecordPipeline, RecordTally};
use crate::ingest::resolver::RecordResolver;
use crate::ingest::tail::{TailPoller, TailSummary};
use crate::ingest::writer::UpsertWriter;
use crate::runtime::config::IndexerConfig;
use crate::runtime::telemetry::Telemetry;
use crate::store::{CheckpointStore, ProfileStore};
use crate::upstream::fetcher::{FailoverFetcher, UpstreamFetch};
use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct OrchestratorParams {
    pub fetch: Arc<dyn UpstreamFetch>,
    pub profiles: Arc<dyn ProfileStore>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub telemetry: Arc<Telemetry>,
    pub page_size: usize,
    pub tail_limit: usize,
}

/// Handle to a spawned checkpoint write.
#[derive(Debug)]
pub struct CheckpointWrite(JoinHandle<Result<()>>);

impl CheckpointWrite {
    /// Waits for the write to land. Dropping the handle instead leaves the
    /// write running detached.
    pub async fn settle(self) -> Result<()> {
        self.0
            .await
            .map_err(|err| anyhow!("checkpoint write task failed: {err}"))?
    }
}

#[derive(Debug)]
pub struct TickReport {
    pub mode: ScanMode,
    /// Page index processed by the tick; always 0 for tail ticks.
    pub page: u64,
    pub outcome: PageOutcome,
    /// Checkpoint handed to the background write.
    pub checkpoint: Checkpoint,
    pub records: RecordTally,
    pub write: CheckpointWrite,
}

#[derive(Clone)]
pub struct Orchestrator {
    paginator: Paginator,
    tail: TailPoller,
    checkpoints: Arc<dyn CheckpointStore>,
    page_size: usize,
    tail_limit: usize,
}

impl Orchestrator {
    pub fn new(params: OrchestratorParams) -> Result<Self> {
        let OrchestratorParams {
            fetch,
            profiles,
            checkpoints,
            telemetry,
            page_size,
            tail_limit,
        } = params;

        if page_size == 0 {
            bail!("page_size must be greater than 0");
        }
        if tail_limit == 0 {
            bail!("tail_limit must be greater than 0");
        }

        let records = RecordPipeline::new(
            RecordResolver::new(fetch.clone()),
            UpsertWriter::new(profiles),
            telemetry.clone(),
        );

        Ok(Self {
            paginator: Paginator::new(fetch.clone(), records.clone(), telemetry.clone()),
            tail: TailPoller::new(fetch, records, telemetry),
            checkpoints,
            page_size,
            tail_limit,
        })
    }

    /// Builds an orchestrator backed by a [`FailoverFetcher`] over the configured origins.
    pub fn from_config(
        config: &IndexerConfig,
        profiles: Arc<dyn ProfileStore>,
        checkpoints: Arc<dyn CheckpointStore>,
        telemetry: Arc<Telemetry>,
    ) -> Result<Self> {
        let fetcher = FailoverFetcher::from_config(config)?;
        Self::new(OrchestratorParams {
            fetch: Arc::new(fetcher),
            profiles,
            checkpoints,
            telemetry,
            page_size: config.page_size(),
            tail_limit: config.tail_limit(),
        })
    }

    /// Processes the page at the stored rescan cursor.
    ///
    /// Fails only when the checkpoint cannot be read; page and record
    /// failures are reported through [`TickReport::outcome`].
    pub async fn rescan_tick(&self) -> Result<TickReport> {
        let current = self.checkpoint(ScanMode::Rescan).await?;
        let page = current.page_cursor;

        let report = self.paginator.step(page, self.page_size).await;
        let next = current.after_step(report.outcome);
        if report.outcome == PageOutcome::Error {
            tracing::warn!(
                page,
                error_count = next.error_count,
                "rescan tick abandoned; cursor unchanged"
            );
        }

        Ok(TickReport {
            mode: ScanMode::Rescan,
            page,
            outcome: report.outcome,
            checkpoint: next,
            records: report.records,
            write: self.spawn_save(ScanMode::Rescan, next),
        })
    }

    /// Polls the newest entries. Only failures are recorded in the tail checkpoint.
    pub async fn tail_tick(&self) -> Result<(TickReport, TailSummary)> {
        let current = match self.checkpoint(ScanMode::Tail).await {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                tracing::warn!(error = %err, "tail checkpoint unreadable; starting from empty");
                Checkpoint::default()
            }
        };

        let (outcome, summary) = self.tail.poll(self.tail_limit).await;
        let next = current.after_tail(outcome);

        let report = TickReport {
            mode: ScanMode::Tail,
            page: 0,
            outcome,
            checkpoint: next,
            records: summary.records,
            write: self.spawn_save(ScanMode::Tail, next),
        };
        Ok((report, summary))
    }

    /// Walks every page from 0 in one call without touching the checkpoints.
    pub async fn drain(&self) -> DrainSummary {
        self.paginator.drain(self.page_size).await
    }

    /// Stored checkpoint for `mode`, or the zero checkpoint when none exists.
    pub async fn checkpoint(&self, mode: ScanMode) -> Result<Checkpoint> {
        let stored = self
            .checkpoints
            .load(mode)
            .await
            .with_context(|| format!("failed to load checkpoint {mode}"))?;
        Ok(stored.unwrap_or_default())
    }

    fn spawn_save(&self, mode: ScanMode, checkpoint: Checkpoint) -> CheckpointWrite {
        let checkpoints = Arc::clone(&self.checkpoints);
        CheckpointWrite(tokio::spawn(async move {
            let result = checkpoints
                .save(mode, checkpoint)
                .await
                .with_context(|| format!("failed to save checkpoint {mode}"));
            match &result {
                Ok(()) => tracing::debug!(
                    %mode,
                    page_cursor = checkpoint.page_cursor,
                    high_water_mark = checkpoint.high_water_mark,
                    error_count = checkpoint.error_count,
                    "checkpoint saved"
                ),
                Err(err) => tracing::warn!(%mode, error = %err, "checkpoint write lost"),
            }
            result
        }))
    }
}
