//! Ledger-scan pagination over `find_realms`.
//!
//! Two modes share the page fetch:
//! - [`Paginator::step`] processes exactly one page and reports whether more
//!   pages are likely pending, which keeps each scheduler tick bounded.
//! - [`Paginator::drain`] walks from page 0 to the first short page in one
//!   call and gives up on the first page-level failure.
//!
//! Entries of a page are decoded, resolved and written one at a time. A
//! malformed entry or a record-level failure is absorbed by
//! [`RecordPipeline`]; only a failure to obtain the page itself is a
//! page-level error.

use crate::ingest::record::{RecordPipeline, RecordTally};
use crate::runtime::telemetry::Telemetry;
use crate::upstream::envelope::parse_result;
use crate::upstream::fetcher::UpstreamFetch;
use crate::upstream::methods::{find_realms_path, FIND_REALMS};
use crate::upstream::schema::ListingEntry;
use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Result of processing one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Page was full; more data is likely pending.
    Continue,
    /// Page was short; end of data reached.
    Done,
    /// Page could not be fetched or parsed.
    Error,
}

impl PageOutcome {
    pub fn for_page_len(len: usize, page_size: usize) -> Self {
        if len < page_size {
            PageOutcome::Done
        } else {
            PageOutcome::Continue
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub page: u64,
    pub outcome: PageOutcome,
    pub entries: usize,
    pub records: RecordTally,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub pages: u64,
    pub entries: usize,
    pub records: RecordTally,
    /// `true` when the scan reached a short page, `false` when it was abandoned.
    pub completed: bool,
}

#[derive(Clone)]
pub struct Paginator {
    fetch: Arc<dyn UpstreamFetch>,
    records: RecordPipeline,
    telemetry: Arc<Telemetry>,
}

impl Paginator {
    pub fn new(
        fetch: Arc<dyn UpstreamFetch>,
        records: RecordPipeline,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            fetch,
            records,
            telemetry,
        }
    }

    pub async fn step(&self, page: u64, page_size: usize) -> StepReport {
        let entries = match self.fetch_page(page, page_size).await {
            Ok(entries) => entries,
            Err(err) => {
                self.telemetry.record_page_error();
                tracing::error!(page, page_size, error = %err, "failed to fetch realm page");
                return StepReport {
                    page,
                    outcome: PageOutcome::Error,
                    entries: 0,
                    records: RecordTally::default(),
                };
            }
        };
        self.telemetry.record_page();

        let records = self.process_entries(&entries).await;
        let outcome = PageOutcome::for_page_len(entries.len(), page_size);

        tracing::info!(
            page,
            entries = entries.len(),
            inserted = records.inserted,
            updated = records.updated,
            filtered = records.filtered,
            unresolved = records.unresolved,
            write_failures = records.write_failures,
            outcome = ?outcome,
            "processed realm page"
        );

        StepReport {
            page,
            outcome,
            entries: entries.len(),
            records,
        }
    }

    pub async fn drain(&self, page_size: usize) -> DrainSummary {
        let mut summary = DrainSummary::default();
        let mut page = 0u64;

        loop {
            let report = self.step(page, page_size).await;
            summary.entries += report.entries;
            summary.records.merge(report.records);

            match report.outcome {
                PageOutcome::Continue => {
                    summary.pages += 1;
                    page += 1;
                }
                PageOutcome::Done => {
                    summary.pages += 1;
                    summary.completed = true;
                    tracing::info!(
                        pages = summary.pages,
                        entries = summary.entries,
                        "realm scan drained"
                    );
                    return summary;
                }
                PageOutcome::Error => {
                    tracing::warn!(page, pages = summary.pages, "abandoning realm scan");
                    return summary;
                }
            }
        }
    }

    async fn fetch_page(&self, page: u64, page_size: usize) -> Result<Vec<Value>> {
        let offset = page.saturating_mul(page_size as u64);
        let response = self.fetch.fetch(&find_realms_path(page_size, offset)).await;
        if !response.is_success() {
            bail!(
                "{FIND_REALMS} at offset {offset} returned status {}: {}",
                response.status,
                response.body
            );
        }
        Ok(parse_result(FIND_REALMS, &response.body)?)
    }

    async fn process_entries(&self, entries: &[Value]) -> RecordTally {
        let mut tally = RecordTally::default();
        for raw in entries {
            let outcome = match ListingEntry::deserialize(raw) {
                Ok(entry) => self.records.ingest(&entry.name, &entry.id).await,
                Err(err) => self.records.reject(FIND_REALMS, raw, &err),
            };
            tally.record(outcome);
        }
        tally
    }
}
