//! Path builders for the ElectrumX proxy methods used by the indexer. Params
//! travel as a JSON array in the `params` query argument.

use serde_json::{json, Value};

pub const FIND_REALMS: &str = "blockchain.atomicals.find_realms";
pub const GET_STATE: &str = "blockchain.atomicals.get_state";
pub const LIST: &str = "blockchain.atomicals.list";

/// Sentinel offset that asks `list` for the newest entries.
pub const LIST_LATEST_OFFSET: i64 = -1;

fn method_path(method: &str, params: Value) -> String {
    format!("{method}?params={params}")
}

/// `find_realms(prefix="", flag=false, limit, offset, verbose=true)`.
pub fn find_realms_path(page_size: usize, offset: u64) -> String {
    method_path(FIND_REALMS, json!(["", false, page_size, offset, true]))
}

pub fn get_state_path(id: &str) -> String {
    method_path(GET_STATE, json!([id]))
}

pub fn list_path(limit: usize) -> String {
    method_path(LIST, json!([limit, LIST_LATEST_OFFSET, true]))
}
