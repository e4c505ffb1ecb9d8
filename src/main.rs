//! Realm indexer
//!
//! Scans the Atomicals realm ledger through a set of interchangeable
//! ElectrumX proxies and keeps a SQLite table of realm profiles current.
//!
//! # Example
//!
//! ```bash
//! realm-indexer --db /var/lib/realms.db run
//! realm-indexer --origins http://127.0.0.1:8080/proxy tick-rescan
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use realm_indexer::{
    init_tracing, IndexerConfig, Orchestrator, Runner, ScanMode, SqliteStore, Telemetry,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "realm-indexer")]
#[command(about = "Incremental ingestion of Atomicals realm profiles")]
struct Args {
    /// Comma-separated API origins tried in rotation
    #[arg(long, env = "REALM_INDEXER_ORIGINS", value_delimiter = ',')]
    origins: Option<Vec<String>>,

    /// SQLite database file
    #[arg(long = "db", env = "REALM_INDEXER_DB", default_value = "realms.db")]
    database_path: String,

    /// Entries requested per ledger page
    #[arg(long, env = "REALM_INDEXER_PAGE_SIZE", default_value = "400")]
    page_size: usize,

    /// Entries requested per tail poll
    #[arg(long, env = "REALM_INDEXER_TAIL_LIMIT", default_value = "100")]
    tail_limit: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "REALM_INDEXER_REQUEST_TIMEOUT_SECS", default_value = "10")]
    request_timeout_secs: u64,

    /// Seconds between rescan ticks
    #[arg(long, env = "REALM_INDEXER_RESCAN_INTERVAL_SECS", default_value = "60")]
    rescan_interval_secs: u64,

    /// Seconds between tail polls
    #[arg(long, env = "REALM_INDEXER_TAIL_INTERVAL_SECS", default_value = "15")]
    tail_interval_secs: u64,

    /// Seconds between metrics reports
    #[arg(long, env = "REALM_INDEXER_METRICS_INTERVAL_SECS", default_value = "60")]
    metrics_interval_secs: u64,

    /// User-Agent header sent to every origin
    #[arg(long, env = "REALM_INDEXER_USER_AGENT")]
    user_agent: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the tail and rescan schedules until Ctrl-C
    Run,
    /// Process one page at the stored rescan cursor
    TickRescan,
    /// Poll the newest entries once
    TickTail,
    /// Walk every page from the start in one pass
    Drain,
    /// Print the stored checkpoint for both scan modes
    Checkpoint,
}

impl Args {
    fn config(&self) -> Result<IndexerConfig> {
        let mut builder = IndexerConfig::builder()
            .database_path(self.database_path.clone())
            .page_size(self.page_size)
            .tail_limit(self.tail_limit)
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .rescan_interval(Duration::from_secs(self.rescan_interval_secs))
            .tail_interval(Duration::from_secs(self.tail_interval_secs))
            .metrics_interval(Duration::from_secs(self.metrics_interval_secs));
        if let Some(origins) = &self.origins {
            builder = builder.origins(origins.iter().cloned());
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        builder.build()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = args.config()?;

    let store = Arc::new(SqliteStore::open(config.database_path())?);
    let telemetry = Arc::new(Telemetry::default());
    let orchestrator =
        Orchestrator::from_config(&config, store.clone(), store, telemetry.clone())?;

    match args.command {
        Command::Run => {
            let mut runner = Runner::new(&config, orchestrator, telemetry);
            runner.run_until_ctrl_c().await?;
        }
        Command::TickRescan => {
            let report = orchestrator.rescan_tick().await?;
            let page = report.page;
            let outcome = report.outcome;
            let checkpoint = report.checkpoint;
            report.write.settle().await?;
            println!(
                "page {page}: {outcome:?}; next cursor {}, high water mark {}, errors {}",
                checkpoint.page_cursor, checkpoint.high_water_mark, checkpoint.error_count
            );
        }
        Command::TickTail => {
            let (report, summary) = orchestrator.tail_tick().await?;
            let outcome = report.outcome;
            report.write.settle().await?;
            println!(
                "tail: {outcome:?}; {} entries, {} inserted, {} updated, {} skipped",
                summary.entries, summary.records.inserted, summary.records.updated, summary.skipped
            );
        }
        Command::Drain => {
            let summary = orchestrator.drain().await;
            println!(
                "drain {}: {} pages, {} entries, {} written",
                if summary.completed { "completed" } else { "abandoned" },
                summary.pages,
                summary.entries,
                summary.records.written()
            );
        }
        Command::Checkpoint => {
            for mode in [ScanMode::Rescan, ScanMode::Tail] {
                let checkpoint = orchestrator.checkpoint(mode).await?;
                println!("{mode}: {}", serde_json::to_string(&checkpoint)?);
            }
        }
    }

    Ok(())
}
