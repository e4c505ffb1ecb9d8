//! Checkpoint-less poll of the most recently minted atomicals.
//!
//! The `list` endpoint reports newest entries with their subtype and the
//! resolved realm name, so non-realm entries are dropped before any detail
//! fetch is issued.

use crate::ingest::paginator::PageOutcome;
use crate::ingest::record::{RecordPipeline, RecordTally};
use crate::ingest::resolver::is_realm_subtype;
use crate::runtime::telemetry::Telemetry;
use crate::upstream::envelope::parse_result;
use crate::upstream::fetcher::UpstreamFetch;
use crate::upstream::methods::{list_path, LIST};
use crate::upstream::schema::TailEntry;
use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailSummary {
    pub entries: usize,
    /// Entries whose subtype is not a realm, dropped without a detail fetch.
    pub skipped: usize,
    /// Realm entries that carried no usable name.
    pub unnamed: usize,
    /// Entries that did not decode as a tail entry.
    pub malformed: usize,
    pub records: RecordTally,
}

#[derive(Clone)]
pub struct TailPoller {
    fetch: Arc<dyn UpstreamFetch>,
    records: RecordPipeline,
    telemetry: Arc<Telemetry>,
}

impl TailPoller {
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

    /// Polls the newest `limit` entries. The outcome is `Error` only when the
    /// listing itself could not be obtained; it is never `Continue`.
    pub async fn poll(&self, limit: usize) -> (PageOutcome, TailSummary) {
        let entries = match self.fetch_recent(limit).await {
            Ok(entries) => entries,
            Err(err) => {
                self.telemetry.record_page_error();
                tracing::error!(limit, error = %err, "failed to fetch recent atomicals");
                return (PageOutcome::Error, TailSummary::default());
            }
        };
        self.telemetry.record_page();

        let mut summary = TailSummary {
            entries: entries.len(),
            ..TailSummary::default()
        };
        for raw in &entries {
            let entry = match TailEntry::deserialize(raw) {
                Ok(entry) => entry,
                Err(err) => {
                    summary.malformed += 1;
                    tracing::warn!(entry = %raw, error = %err, "skipping undecodable recent entry");
                    continue;
                }
            };
            if !is_realm_subtype(entry.subtype.as_deref()) {
                summary.skipped += 1;
                continue;
            }
            let Some(name) = entry.name() else {
                summary.unnamed += 1;
                tracing::debug!(id = %entry.atomical_id, "recent realm has no name; skipping");
                continue;
            };
            summary
                .records
                .record(self.records.ingest(name, &entry.atomical_id).await);
        }

        tracing::info!(
            entries = summary.entries,
            skipped = summary.skipped,
            unnamed = summary.unnamed,
            malformed = summary.malformed,
            inserted = summary.records.inserted,
            updated = summary.records.updated,
            "polled recent realms"
        );
        (PageOutcome::Done, summary)
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<Value>> {
        let response = self.fetch.fetch(&list_path(limit)).await;
        if !response.is_success() {
            bail!(
                "{LIST} returned status {}: {}",
                response.status,
                response.body
            );
        }
        Ok(parse_result(LIST, &response.body)?)
    }
}
