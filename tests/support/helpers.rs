use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use realm_indexer::{
    FailoverFetcher, IndexerConfig, Orchestrator, OrchestratorParams, SqliteStore, Telemetry,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

pub const OWNER_SCRIPT: &str = "76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac";
pub const OWNER_ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
pub const NEXT_OWNER_SCRIPT: &str = "a914162c5ea71c0b23f5b9022ef047c4a86470a5b07087";
pub const NEXT_OWNER_ADDRESS: &str = "33iFwdLuRpW1uK1RTRqsoi8rR4NpDzk66k";
pub const MINT_SCRIPT: &str = "0014751e76e8199196d454941c45d1b3a323f1433bd6";
pub const MINT_ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

pub fn realm_id(index: usize) -> String {
    format!("{index:064x}i0")
}

/// `get_state` result for an NFT with the given subtype and current owner script.
pub fn atomical_state(number: u64, subtype: &str, owner_script: &str) -> Value {
    json!({
        "atomical_number": number,
        "type": "NFT",
        "subtype": subtype,
        "mint_info": {
            "reveal_location_script": MINT_SCRIPT,
            "args": {"time": 1_700_000_000}
        },
        "location_info": [{"script": owner_script, "location": "txidi0"}],
        "state": {"latest": {"d": format!("profile{number}i0")}}
    })
}

pub fn fetcher(origins: &[&str]) -> FailoverFetcher {
    let config = IndexerConfig::builder()
        .origins(origins.iter().copied())
        .request_timeout(Duration::from_secs(2))
        .build()
        .expect("test config must build");
    FailoverFetcher::from_config(&config).expect("fetcher must build")
}

pub fn orchestrator(
    origins: &[&str],
    store: Arc<SqliteStore>,
    page_size: usize,
) -> (Orchestrator, Arc<Telemetry>) {
    let telemetry = Arc::new(Telemetry::default());
    let orchestrator = Orchestrator::new(OrchestratorParams {
        fetch: Arc::new(fetcher(origins)),
        profiles: store.clone(),
        checkpoints: store,
        telemetry: telemetry.clone(),
        page_size,
        tail_limit: 20,
    })
    .expect("orchestrator must build");
    (orchestrator, telemetry)
}
