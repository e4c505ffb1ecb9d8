use std::sync::Arc;

use crate::support::{
    helpers::{
        atomical_state, init_tracing, orchestrator, realm_id, MINT_ADDRESS, NEXT_OWNER_ADDRESS,
        NEXT_OWNER_SCRIPT, OWNER_ADDRESS, OWNER_SCRIPT,
    },
    mock_upstream::{MockUpstream, MockUpstreamServer},
};
use anyhow::Result;
use realm_indexer::{Checkpoint, PageOutcome, ProfileStore, ScanMode, SqliteStore};

fn seeded_upstream(count: usize) -> MockUpstream {
    let upstream = MockUpstream::new();
    for index in 0..count {
        upstream.add_realm(
            &format!("realm{index}"),
            &realm_id(index),
            atomical_state(index as u64, "realm", OWNER_SCRIPT),
        );
    }
    upstream
}

#[tokio::test]
async fn stepped_ticks_walk_the_ledger_and_wrap() -> Result<()> {
    init_tracing();
    let upstream = seeded_upstream(5);
    let server = MockUpstreamServer::start(upstream).await?;
    let store = Arc::new(SqliteStore::in_memory()?);
    let (orchestrator, telemetry) = orchestrator(&[server.origin()], store.clone(), 2);

    let mut outcomes = Vec::new();
    let mut cursors = Vec::new();
    for _ in 0..4 {
        let report = orchestrator.rescan_tick().await?;
        report.write.settle().await?;
        outcomes.push(report.outcome);
        cursors.push(orchestrator.checkpoint(ScanMode::Rescan).await?.page_cursor);
    }

    assert_eq!(
        outcomes,
        vec![
            PageOutcome::Continue,
            PageOutcome::Continue,
            PageOutcome::Done,
            PageOutcome::Continue,
        ]
    );
    assert_eq!(cursors, vec![1, 2, 0, 1]);
    assert_eq!(
        orchestrator.checkpoint(ScanMode::Rescan).await?,
        Checkpoint {
            page_cursor: 1,
            high_water_mark: 2,
            error_count: 0,
        }
    );

    let row = store.find("realm4").await?.expect("last realm must be stored");
    assert_eq!(row.id, realm_id(4));
    assert_eq!(row.sequence_number, 4);
    assert_eq!(row.mint_time, Some(1_700_000_000));
    assert_eq!(row.mint_address.as_deref(), Some(MINT_ADDRESS));
    assert_eq!(row.owner_address.as_deref(), Some(OWNER_ADDRESS));
    assert_eq!(row.profile_pointer.as_deref(), Some("profile4i0"));

    let snapshot = telemetry.snapshot();
    assert_eq!(snapshot.rows_inserted, 5);
    assert_eq!(snapshot.rows_unchanged, 2);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn ownership_transfer_updates_only_mutable_fields() -> Result<()> {
    init_tracing();
    let upstream = seeded_upstream(3);
    let server = MockUpstreamServer::start(upstream.clone()).await?;
    let store = Arc::new(SqliteStore::in_memory()?);
    let (orchestrator, _) = orchestrator(&[server.origin()], store.clone(), 10);

    assert!(orchestrator.drain().await.completed);
    let before = store.find("realm1").await?.expect("realm1 stored");

    let mut moved = atomical_state(1, "realm", NEXT_OWNER_SCRIPT);
    moved["atomical_number"] = 999.into();
    moved["state"]["latest"]["d"] = "nextprofilei0".into();
    upstream.set_state(&realm_id(1), moved);

    let summary = orchestrator.drain().await;
    assert_eq!(summary.records.updated, 1);
    assert_eq!(summary.records.unchanged, 2);

    let after = store.find("realm1").await?.expect("realm1 stored");
    assert_eq!(after.owner_address.as_deref(), Some(NEXT_OWNER_ADDRESS));
    assert_eq!(after.profile_pointer.as_deref(), Some("nextprofilei0"));
    assert_eq!(after.id, before.id);
    assert_eq!(after.sequence_number, before.sequence_number);
    assert_eq!(after.mint_address, before.mint_address);
    assert_eq!(after.mint_time, before.mint_time);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn non_realm_records_are_never_written() -> Result<()> {
    init_tracing();
    let upstream = MockUpstream::new();
    upstream.add_realm("kept", &realm_id(1), atomical_state(1, "subrealm", OWNER_SCRIPT));
    upstream.add_realm("token", &realm_id(2), atomical_state(2, "token", OWNER_SCRIPT));
    let server = MockUpstreamServer::start(upstream).await?;
    let store = Arc::new(SqliteStore::in_memory()?);
    let (orchestrator, _) = orchestrator(&[server.origin()], store.clone(), 10);

    let report = orchestrator.rescan_tick().await?;
    report.write.settle().await?;
    assert_eq!(report.outcome, PageOutcome::Done);
    assert_eq!(report.records.inserted, 1);
    assert_eq!(report.records.filtered, 1);
    assert!(store.find("kept").await?.is_some());
    assert!(store.find("token").await?.is_none());

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn outage_counts_an_error_and_resumes_at_the_same_page() -> Result<()> {
    init_tracing();
    let upstream = seeded_upstream(4);
    let server = MockUpstreamServer::start(upstream.clone()).await?;
    let store = Arc::new(SqliteStore::in_memory()?);
    let (orchestrator, _) = orchestrator(&[server.origin()], store.clone(), 2);

    orchestrator.rescan_tick().await?.write.settle().await?;

    upstream.force_status(Some(503));
    let report = orchestrator.rescan_tick().await?;
    report.write.settle().await?;
    assert_eq!(report.outcome, PageOutcome::Error);
    assert_eq!(report.page, 1);
    assert_eq!(
        orchestrator.checkpoint(ScanMode::Rescan).await?,
        Checkpoint {
            page_cursor: 1,
            high_water_mark: 0,
            error_count: 1,
        }
    );

    upstream.force_status(None);
    let report = orchestrator.rescan_tick().await?;
    report.write.settle().await?;
    assert_eq!(report.page, 1);
    assert_eq!(report.outcome, PageOutcome::Continue);
    assert!(store.find("realm3").await?.is_some());

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn drain_stops_at_the_first_short_page() -> Result<()> {
    init_tracing();
    let upstream = seeded_upstream(7);
    let server = MockUpstreamServer::start(upstream.clone()).await?;
    let store = Arc::new(SqliteStore::in_memory()?);
    let (orchestrator, _) = orchestrator(&[server.origin()], store.clone(), 3);

    let summary = orchestrator.drain().await;
    assert!(summary.completed);
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.entries, 7);
    assert_eq!(summary.records.inserted, 7);
    assert_eq!(orchestrator.checkpoint(ScanMode::Rescan).await?, Checkpoint::default());

    server.shutdown().await;
    Ok(())
}
