use crate::ingest::paginator::PageOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scan modes that own an independent checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanMode {
    Rescan,
    Tail,
}

impl ScanMode {
    pub fn key(self) -> &'static str {
        match self {
            ScanMode::Rescan => "realms:rescan",
            ScanMode::Tail => "realms:tail",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Durable scan progress, stored as `{ pageCursor, highWaterMark, errorCount }`.
///
/// `high_water_mark` is the highest page index ever fetched successfully. It
/// survives cycle resets so operators can see how far a full rescan reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(default)]
    pub page_cursor: u64,
    #[serde(default)]
    pub high_water_mark: u64,
    #[serde(default)]
    pub error_count: u64,
}

impl Checkpoint {
    /// Checkpoint after a stepped tick over `self.page_cursor`.
    pub fn after_step(self, outcome: PageOutcome) -> Self {
        let page = self.page_cursor;
        match outcome {
            PageOutcome::Continue => Self {
                page_cursor: page.saturating_add(1),
                high_water_mark: self.high_water_mark.max(page),
                ..self
            },
            PageOutcome::Done => Self {
                page_cursor: 0,
                high_water_mark: self.high_water_mark.max(page),
                ..self
            },
            PageOutcome::Error => Self {
                error_count: self.error_count.saturating_add(1),
                ..self
            },
        }
    }

    /// Checkpoint after a tail poll. The tail never pages, so only failures
    /// are recorded.
    pub fn after_tail(self, outcome: PageOutcome) -> Self {
        match outcome {
            PageOutcome::Error => Self {
                error_count: self.error_count.saturating_add(1),
                ..self
            },
            PageOutcome::Continue | PageOutcome::Done => self,
        }
    }
}
