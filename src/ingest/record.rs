use crate::ingest::resolver::{RecordResolver, Resolution};
use crate::ingest::writer::{UpsertAction, UpsertWriter};
use crate::runtime::telemetry::Telemetry;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Written(UpsertAction),
    Filtered,
    Unresolved,
    WriteFailed,
}

/// Resolve-then-write for a single record. Every failure stays local to the
/// record so the enclosing page keeps going.
#[derive(Clone)]
pub struct RecordPipeline {
    resolver: RecordResolver,
    writer: UpsertWriter,
    telemetry: Arc<Telemetry>,
}

impl RecordPipeline {
    pub fn new(resolver: RecordResolver, writer: UpsertWriter, telemetry: Arc<Telemetry>) -> Self {
        Self {
            resolver,
            writer,
            telemetry,
        }
    }

    pub async fn ingest(&self, name: &str, id: &str) -> RecordOutcome {
        let profile = match self.resolver.try_resolve(id).await {
            Ok(Resolution::Matched(profile)) => profile,
            Ok(Resolution::Filtered { .. }) => {
                self.telemetry.record_filtered();
                return RecordOutcome::Filtered;
            }
            Err(err) => {
                self.telemetry.record_unresolved();
                tracing::warn!(name, id, error = %err, "failed to resolve realm profile");
                return RecordOutcome::Unresolved;
            }
        };
        self.telemetry.record_resolved();

        match self.writer.try_upsert(name, &profile).await {
            Ok(action) => {
                match action {
                    UpsertAction::Inserted => self.telemetry.record_inserted(),
                    UpsertAction::Updated => self.telemetry.record_updated(),
                    UpsertAction::Unchanged => self.telemetry.record_unchanged(),
                }
                RecordOutcome::Written(action)
            }
            Err(err) => {
                self.telemetry.record_write_failure();
                tracing::error!(name, id, error = %err, "failed to persist realm");
                RecordOutcome::WriteFailed
            }
        }
    }

    /// Counts an entry that could not be decoded from a listing as unresolved.
    pub fn reject(&self, method: &str, raw: &Value, err: &serde_json::Error) -> RecordOutcome {
        self.telemetry.record_unresolved();
        tracing::warn!(method, entry = %raw, error = %err, "skipping undecodable entry");
        RecordOutcome::Unresolved
    }
}

/// Per-page tally of record outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordTally {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub filtered: usize,
    pub unresolved: usize,
    pub write_failures: usize,
}

impl RecordTally {
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Written(UpsertAction::Inserted) => self.inserted += 1,
            RecordOutcome::Written(UpsertAction::Updated) => self.updated += 1,
            RecordOutcome::Written(UpsertAction::Unchanged) => self.unchanged += 1,
            RecordOutcome::Filtered => self.filtered += 1,
            RecordOutcome::Unresolved => self.unresolved += 1,
            RecordOutcome::WriteFailed => self.write_failures += 1,
        }
    }

    pub fn merge(&mut self, other: RecordTally) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.filtered += other.filtered;
        self.unresolved += other.unresolved;
        self.write_failures += other.write_failures;
    }

    pub fn written(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}
