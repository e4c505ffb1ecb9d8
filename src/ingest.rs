//! Ingestion pipeline: checkpointed pagination over the realm ledger, a tail
//! poll over recent mints, per-record resolution and idempotent persistence.

pub mod checkpoint;
pub mod decoder;
pub mod orchestrator;
pub mod paginator;
pub mod record;
pub mod resolver;
pub mod tail;
pub mod writer;
