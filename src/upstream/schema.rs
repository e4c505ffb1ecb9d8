//! Result shapes returned by the proxy methods. Only the fields the pipeline
//! reads are modelled; everything else in the payload is ignored.

use serde::Deserialize;

/// One row of a `find_realms` scan page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingEntry {
    #[serde(rename = "atomical_id")]
    pub id: String,
    #[serde(rename = "realm")]
    pub name: String,
    #[serde(rename = "realm_hex", default)]
    pub raw_name_hex: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "tx_num", default)]
    pub sequence_hint: Option<u64>,
}

/// `get_state` result for one atomical.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StateResult {
    #[serde(rename = "atomical_id", default)]
    pub id: Option<String>,
    pub atomical_number: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub mint_info: Option<MintInfo>,
    #[serde(default)]
    pub location_info: Vec<LocationInfo>,
    #[serde(default)]
    pub state: Option<StateInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MintInfo {
    #[serde(default)]
    pub reveal_location_script: Option<String>,
    #[serde(default)]
    pub args: Option<MintArgs>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MintArgs {
    #[serde(default)]
    pub time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationInfo {
    #[serde(default)]
    pub script: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StateInfo {
    #[serde(default)]
    pub latest: Option<LatestState>,
}

/// Latest mod-state; `d` points at the profile atomical delegated by the realm.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LatestState {
    #[serde(default)]
    pub d: Option<String>,
}

impl StateResult {
    pub fn mint_script(&self) -> Option<&str> {
        self.mint_info
            .as_ref()
            .and_then(|info| info.reveal_location_script.as_deref())
    }

    pub fn mint_time(&self) -> Option<i64> {
        self.mint_info
            .as_ref()
            .and_then(|info| info.args.as_ref())
            .and_then(|args| args.time)
    }

    pub fn location_script(&self) -> Option<&str> {
        self.location_info
            .first()
            .and_then(|location| location.script.as_deref())
    }

    pub fn profile_pointer(&self) -> Option<&str> {
        self.state
            .as_ref()
            .and_then(|state| state.latest.as_ref())
            .and_then(|latest| latest.d.as_deref())
    }
}

/// One entry of the `list` tail query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TailEntry {
    pub atomical_id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(rename = "$full_realm_name", default)]
    pub full_realm_name: Option<String>,
    #[serde(rename = "$request_realm", default)]
    pub request_realm: Option<String>,
}

impl TailEntry {
    /// Name the entry is persisted under; prefers the resolved full name.
    pub fn name(&self) -> Option<&str> {
        self.full_realm_name
            .as_deref()
            .or(self.request_realm.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
