pub mod ingest;
pub mod runtime;
pub mod store;
pub mod upstream;

pub use ingest::checkpoint::{Checkpoint, ScanMode};
pub use ingest::decoder::decode_script_address;
pub use ingest::orchestrator::{CheckpointWrite, Orchestrator, OrchestratorParams, TickReport};
pub use ingest::paginator::{DrainSummary, PageOutcome, Paginator, StepReport};
pub use ingest::record::{RecordOutcome, RecordPipeline, RecordTally};
pub use ingest::resolver::{RecordResolver, Resolution, ResolvedProfile};
pub use ingest::tail::{TailPoller, TailSummary};
pub use ingest::writer::{UpsertAction, UpsertWriter};
pub use runtime::config::{IndexerConfig, IndexerConfigBuilder, IndexerConfigParams};
pub use runtime::runner::Runner;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use store::{
    CheckpointStore, MemoryStore, MutableFields, PersistedRow, ProfileStore, SqliteStore,
};
pub use upstream::{FailoverFetcher, FetchResponse, ParseError, UpstreamFetch};
