//! Scripted [`UpstreamFetch`] used by unit tests, plus JSON fixture builders
//! for the proxy result shapes.

use crate::upstream::fetcher::{FetchResponse, UpstreamFetch};
use crate::upstream::methods::{find_realms_path, get_state_path, list_path};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) const OWNER_SCRIPT: &str = "76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac";
pub(crate) const OWNER_ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
pub(crate) const MINT_SCRIPT: &str = "0014751e76e8199196d454941c45d1b3a323f1433bd6";
pub(crate) const MINT_ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
pub(crate) const OTHER_OWNER_SCRIPT: &str = "a914162c5ea71c0b23f5b9022ef047c4a86470a5b07087";
pub(crate) const OTHER_OWNER_ADDRESS: &str = "33iFwdLuRpW1uK1RTRqsoi8rR4NpDzk66k";

#[derive(Default)]
pub(crate) struct ScriptedFetch {
    routes: Mutex<HashMap<String, FetchResponse>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, path: impl Into<String>, response: FetchResponse) {
        self.routes
            .lock()
            .expect("routes poisoned")
            .insert(path.into(), response);
    }

    pub(crate) fn respond_result(&self, path: impl Into<String>, result: Value) {
        self.respond(path, ok(envelope(result)));
    }

    pub(crate) fn page(&self, page_size: usize, offset: u64, entries: Vec<Value>) {
        self.respond_result(find_realms_path(page_size, offset), Value::Array(entries));
    }

    pub(crate) fn state(&self, id: &str, result: Value) {
        self.respond_result(get_state_path(id), result);
    }

    pub(crate) fn recent(&self, limit: usize, entries: Vec<Value>) {
        self.respond_result(list_path(limit), Value::Array(entries));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls poisoned").clone()
    }

    pub(crate) fn calls_to(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|path| path.starts_with(method))
            .count()
    }
}

impl UpstreamFetch for ScriptedFetch {
    fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, FetchResponse> {
        Box::pin(async move {
            self.calls
                .lock()
                .expect("calls poisoned")
                .push(path.to_owned());
            self.routes
                .lock()
                .expect("routes poisoned")
                .get(path)
                .cloned()
                .unwrap_or_else(|| FetchResponse::new(404, "not found", None))
        })
    }
}

pub(crate) fn ok(body: Value) -> FetchResponse {
    FetchResponse::new(200, body.to_string(), Some("stub".into()))
}

pub(crate) fn envelope(result: Value) -> Value {
    json!({"success": true, "response": {"result": result}})
}

pub(crate) fn listing(index: usize) -> Value {
    json!({
        "atomical_id": format!("{index:064x}i0"),
        "realm": format!("realm{index}"),
        "realm_hex": hex::encode(format!("realm{index}")),
        "status": "verified",
        "tx_num": 1_000 + index,
    })
}

pub(crate) fn listings(range: std::ops::Range<usize>) -> Vec<Value> {
    range.map(listing).collect()
}

pub(crate) fn listing_id(index: usize) -> String {
    format!("{index:064x}i0")
}

pub(crate) fn realm_state(number: u64, subtype: &str, owner_script: &str) -> Value {
    json!({
        "atomical_number": number,
        "type": "NFT",
        "subtype": subtype,
        "mint_info": {
            "reveal_location_script": MINT_SCRIPT,
            "args": {"time": 1_700_000_000}
        },
        "location_info": [{"script": owner_script}],
        "state": {"latest": {"d": "profilei0"}}
    })
}
