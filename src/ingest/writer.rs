//! Idempotent persistence of resolved profiles keyed by realm name.
//!
//! The first sighting of a name inserts the full row. Later sightings update
//! only the owner address and the profile pointer; identity columns and the
//! `name -> id` binding are never rewritten. Repeated delivery of the same
//! profile converges on the same row, so duplicate processing after an
//! interrupted tick is harmless.

use crate::ingest::resolver::ResolvedProfile;
use crate::store::{MutableFields, PersistedRow, ProfileStore};
use anyhow::Result;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Inserted,
    Updated,
    /// Row already carried the same mutable fields; nothing was written.
    Unchanged,
}

#[derive(Clone)]
pub struct UpsertWriter {
    store: Arc<dyn ProfileStore>,
}

impl UpsertWriter {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Returns `true` when the row is stored (inserted, updated, or already
    /// current). Store failures are logged and reported as `false`.
    pub async fn upsert(&self, name: &str, profile: &ResolvedProfile) -> bool {
        match self.try_upsert(name, profile).await {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(name, id = %profile.id, error = %err, "failed to persist realm");
                false
            }
        }
    }

    /// Existence check and write are two store calls, not one transaction.
    /// Overlapping callers for the same name can race into a duplicate insert,
    /// which the store rejects and the next visit repairs.
    pub async fn try_upsert(&self, name: &str, profile: &ResolvedProfile) -> Result<UpsertAction> {
        let Some(existing) = self.store.find(name).await? else {
            let row = PersistedRow::from_profile(name, profile);
            self.store.insert(&row).await?;
            tracing::debug!(name, id = %profile.id, "inserted realm");
            return Ok(UpsertAction::Inserted);
        };

        if existing.id != profile.id {
            tracing::warn!(
                name,
                stored_id = %existing.id,
                incoming_id = %profile.id,
                "realm name is bound to a different atomical; keeping stored binding"
            );
        }

        let fields = MutableFields::from_profile(profile);
        if existing.mutable_fields() == fields {
            return Ok(UpsertAction::Unchanged);
        }

        self.store.update_mutable(name, &fields).await?;
        tracing::debug!(name, id = %existing.id, "updated realm owner/profile");
        Ok(UpsertAction::Updated)
    }
}
