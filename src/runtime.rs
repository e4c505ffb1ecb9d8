//! Runtime glue that wires configuration, tracing, telemetry and the interval
//! runner.

pub mod config;
pub mod runner;
pub mod telemetry;
