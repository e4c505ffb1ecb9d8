//! Persistence ports for resolved realm rows and scan checkpoints, with a
//! SQLite backend for production and an in-memory backend for tests and dry
//! runs.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::ingest::checkpoint::{Checkpoint, ScanMode};
use crate::ingest::resolver::ResolvedProfile;
use anyhow::Result;
use futures::future::BoxFuture;

/// Stored realm row keyed by `name`. Identity fields (`id`, `sequence_number`,
/// `mint_time`, `mint_address`) are written once on insert; only
/// [`MutableFields`] change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRow {
    pub name: String,
    pub id: String,
    pub sequence_number: u64,
    pub mint_time: Option<i64>,
    pub mint_address: Option<String>,
    pub owner_address: Option<String>,
    pub profile_pointer: Option<String>,
}

impl PersistedRow {
    pub fn from_profile(name: &str, profile: &ResolvedProfile) -> Self {
        Self {
            name: name.to_owned(),
            id: profile.id.clone(),
            sequence_number: profile.sequence_number,
            mint_time: profile.mint_time,
            mint_address: profile.mint_address.clone(),
            owner_address: profile.owner_address.clone(),
            profile_pointer: profile.profile_pointer.clone(),
        }
    }

    pub fn mutable_fields(&self) -> MutableFields {
        MutableFields {
            owner_address: self.owner_address.clone(),
            profile_pointer: self.profile_pointer.clone(),
        }
    }
}

/// Fields that follow ownership and profile transfers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableFields {
    pub owner_address: Option<String>,
    pub profile_pointer: Option<String>,
}

impl MutableFields {
    pub fn from_profile(profile: &ResolvedProfile) -> Self {
        Self {
            owner_address: profile.owner_address.clone(),
            profile_pointer: profile.profile_pointer.clone(),
        }
    }
}

/// Row storage keyed by realm name. `find` and the writes are separate calls;
/// callers that need insert-or-update semantics compose them.
pub trait ProfileStore: Send + Sync {
    fn find<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Option<PersistedRow>>>;

    fn insert<'a>(&'a self, row: &'a PersistedRow) -> BoxFuture<'a, Result<()>>;

    fn update_mutable<'a>(
        &'a self,
        name: &'a str,
        fields: &'a MutableFields,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Whole-value checkpoint storage keyed by scan mode.
pub trait CheckpointStore: Send + Sync {
    fn load(&self, mode: ScanMode) -> BoxFuture<'_, Result<Option<Checkpoint>>>;

    fn save(&self, mode: ScanMode, checkpoint: Checkpoint) -> BoxFuture<'_, Result<()>>;
}
