//! Per-record resolution: fetch `get_state`, apply the realm filter, extract
//! the profile fields, and decode both scripts.

use crate::ingest::decoder::decode_script_address;
use crate::upstream::envelope::parse_result;
use crate::upstream::fetcher::UpstreamFetch;
use crate::upstream::methods::{get_state_path, GET_STATE};
use crate::upstream::schema::StateResult;
use anyhow::{bail, Result};
use std::sync::Arc;

pub const NFT_KIND: &str = "NFT";
pub const REALM_SUBTYPES: [&str; 2] = ["realm", "subrealm"];

/// Fully fetched and filtered detail for one record, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub id: String,
    pub sequence_number: u64,
    pub mint_time: Option<i64>,
    pub mint_address: Option<String>,
    pub owner_address: Option<String>,
    pub profile_pointer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched(ResolvedProfile),
    Filtered {
        kind: String,
        subtype: Option<String>,
    },
}

pub fn is_realm_subtype(subtype: Option<&str>) -> bool {
    subtype.is_some_and(|subtype| REALM_SUBTYPES.contains(&subtype))
}

pub fn is_realm(kind: &str, subtype: Option<&str>) -> bool {
    kind == NFT_KIND && is_realm_subtype(subtype)
}

/// Applies the realm predicate and extracts profile fields from a parsed state.
pub fn resolution_from_state(id: &str, state: StateResult) -> Resolution {
    if !is_realm(&state.kind, state.subtype.as_deref()) {
        return Resolution::Filtered {
            kind: state.kind,
            subtype: state.subtype,
        };
    }

    Resolution::Matched(ResolvedProfile {
        id: id.to_owned(),
        sequence_number: state.atomical_number,
        mint_time: state.mint_time(),
        mint_address: decode_script_address(state.mint_script()),
        owner_address: decode_script_address(state.location_script()),
        profile_pointer: state.profile_pointer().map(str::to_owned),
    })
}

#[derive(Clone)]
pub struct RecordResolver {
    fetch: Arc<dyn UpstreamFetch>,
}

impl RecordResolver {
    pub fn new(fetch: Arc<dyn UpstreamFetch>) -> Self {
        Self { fetch }
    }

    /// Resolves `id` into a profile, or `None` when the record is filtered out
    /// or could not be fetched/parsed. Failures are logged, never propagated.
    pub async fn resolve(&self, id: &str) -> Option<ResolvedProfile> {
        match self.try_resolve(id).await {
            Ok(Resolution::Matched(profile)) => Some(profile),
            Ok(Resolution::Filtered { .. }) => None,
            Err(err) => {
                tracing::warn!(id, error = %err, "failed to resolve realm profile");
                None
            }
        }
    }

    pub async fn try_resolve(&self, id: &str) -> Result<Resolution> {
        let response = self.fetch.fetch(&get_state_path(id)).await;
        if !response.is_success() {
            bail!(
                "{GET_STATE} for {id} returned status {}: {}",
                response.status,
                response.body
            );
        }

        let state: StateResult = parse_result(GET_STATE, &response.body)?;
        let resolution = resolution_from_state(id, state);
        if let Resolution::Filtered { kind, subtype } = &resolution {
            tracing::debug!(
                id,
                kind = %kind,
                subtype = ?subtype,
                "record is not a realm; skipping"
            );
        }
        Ok(resolution)
    }
}
