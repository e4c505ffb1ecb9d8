use std::sync::Arc;

use crate::support::{
    helpers::{atomical_state, init_tracing, orchestrator, OWNER_ADDRESS, OWNER_SCRIPT},
    mock_upstream::{MockUpstream, MockUpstreamServer},
};
use anyhow::Result;
use realm_indexer::{PageOutcome, ProfileStore, ScanMode, SqliteStore};
use serde_json::json;

#[tokio::test]
async fn tail_poll_ingests_recent_realms_under_their_full_name() -> Result<()> {
    init_tracing();
    let upstream = MockUpstream::new();
    upstream.push_recent(json!({
        "atomical_id": "parenti0", "type": "NFT", "subtype": "realm",
        "$full_realm_name": "parent", "$request_realm": "parent"
    }));
    upstream.push_recent(json!({
        "atomical_id": "childi0", "type": "NFT", "subtype": "subrealm",
        "$full_realm_name": "parent.child", "$request_realm": "child"
    }));
    upstream.push_recent(json!({"atomical_id": "tokeni0", "type": "FT", "$request_ticker": "atom"}));
    upstream.push_recent(json!({"atomical_id": "anoni0", "type": "NFT", "subtype": "realm"}));
    upstream.set_state("parenti0", atomical_state(10, "realm", OWNER_SCRIPT));
    upstream.set_state("childi0", atomical_state(11, "subrealm", OWNER_SCRIPT));

    let server = MockUpstreamServer::start(upstream).await?;
    let store = Arc::new(SqliteStore::in_memory()?);
    let (orchestrator, _) = orchestrator(&[server.origin()], store.clone(), 400);

    let (report, summary) = orchestrator.tail_tick().await?;
    report.write.settle().await?;

    assert_eq!(report.outcome, PageOutcome::Done);
    assert_eq!(summary.entries, 4);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.unnamed, 1);
    assert_eq!(summary.records.inserted, 2);

    let child = store.find("parent.child").await?.expect("subrealm stored");
    assert_eq!(child.id, "childi0");
    assert_eq!(child.sequence_number, 11);
    assert_eq!(child.owner_address.as_deref(), Some(OWNER_ADDRESS));
    assert!(store.find("child").await?.is_none());
    assert_eq!(orchestrator.checkpoint(ScanMode::Tail).await?.error_count, 0);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn tail_outage_is_recorded_in_the_tail_checkpoint_only() -> Result<()> {
    init_tracing();
    let upstream = MockUpstream::new();
    upstream.force_status(Some(500));
    let server = MockUpstreamServer::start(upstream).await?;
    let store = Arc::new(SqliteStore::in_memory()?);
    let (orchestrator, telemetry) = orchestrator(&[server.origin()], store.clone(), 400);

    let (report, _) = orchestrator.tail_tick().await?;
    report.write.settle().await?;

    assert_eq!(report.outcome, PageOutcome::Error);
    assert_eq!(orchestrator.checkpoint(ScanMode::Tail).await?.error_count, 1);
    assert_eq!(orchestrator.checkpoint(ScanMode::Rescan).await?.error_count, 0);
    assert_eq!(telemetry.snapshot().page_errors, 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn undecodable_recent_entry_leaves_the_rest_of_the_poll_intact() -> Result<()> {
    init_tracing();
    let upstream = MockUpstream::new();
    upstream.push_recent(json!({
        "atomical_id": "alphai0", "type": "NFT", "subtype": "realm", "$full_realm_name": "alpha"
    }));
    upstream.push_recent(json!({"type": "NFT", "subtype": "realm", "$full_realm_name": "ghost"}));
    upstream.set_state("alphai0", atomical_state(12, "realm", OWNER_SCRIPT));

    let server = MockUpstreamServer::start(upstream).await?;
    let store = Arc::new(SqliteStore::in_memory()?);
    let (orchestrator, _) = orchestrator(&[server.origin()], store.clone(), 400);

    let (report, summary) = orchestrator.tail_tick().await?;
    report.write.settle().await?;

    assert_eq!(report.outcome, PageOutcome::Done);
    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.records.inserted, 1);
    assert!(store.find("alpha").await?.is_some());
    assert_eq!(orchestrator.checkpoint(ScanMode::Tail).await?.error_count, 0);

    server.shutdown().await;
    Ok(())
}
