use super::{CheckpointStore, MutableFields, PersistedRow, ProfileStore};
use crate::ingest::checkpoint::{Checkpoint, ScanMode};
use anyhow::{bail, Result};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-memory implementation of both store ports.
///
/// Write counters and failure switches let tests observe exactly which store
/// operations the pipeline issued.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, PersistedRow>>,
    checkpoints: RwLock<HashMap<ScanMode, Checkpoint>>,
    inserts: AtomicU64,
    updates: AtomicU64,
    fail_writes: AtomicBool,
    fail_checkpoints: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn row(&self, name: &str) -> Option<PersistedRow> {
        self.rows.read().await.get(name).cloned()
    }

    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn checkpoint(&self, mode: ScanMode) -> Option<Checkpoint> {
        self.checkpoints.read().await.get(&mode).copied()
    }

    pub async fn set_checkpoint(&self, mode: ScanMode, checkpoint: Checkpoint) {
        self.checkpoints.write().await.insert(mode, checkpoint);
    }

    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u64 {
        self.inserts() + self.updates()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_checkpoints(&self, fail: bool) {
        self.fail_checkpoints.store(fail, Ordering::SeqCst);
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("memory store rejected write");
        }
        Ok(())
    }
}

impl ProfileStore for MemoryStore {
    fn find<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Option<PersistedRow>>> {
        Box::pin(async move { Ok(self.rows.read().await.get(name).cloned()) })
    }

    fn insert<'a>(&'a self, row: &'a PersistedRow) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.ensure_writable()?;
            let mut rows = self.rows.write().await;
            if rows.contains_key(&row.name) {
                bail!("realm {} already exists", row.name);
            }
            rows.insert(row.name.clone(), row.clone());
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn update_mutable<'a>(
        &'a self,
        name: &'a str,
        fields: &'a MutableFields,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.ensure_writable()?;
            let mut rows = self.rows.write().await;
            let Some(row) = rows.get_mut(name) else {
                bail!("realm {name} does not exist");
            };
            row.owner_address = fields.owner_address.clone();
            row.profile_pointer = fields.profile_pointer.clone();
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

impl CheckpointStore for MemoryStore {
    fn load(&self, mode: ScanMode) -> BoxFuture<'_, Result<Option<Checkpoint>>> {
        Box::pin(async move {
            if self.fail_checkpoints.load(Ordering::SeqCst) {
                bail!("memory store rejected checkpoint read");
            }
            Ok(self.checkpoints.read().await.get(&mode).copied())
        })
    }

    fn save(&self, mode: ScanMode, checkpoint: Checkpoint) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.fail_checkpoints.load(Ordering::SeqCst) {
                bail!("memory store rejected checkpoint write");
            }
            self.checkpoints.write().await.insert(mode, checkpoint);
            Ok(())
        })
    }
}
