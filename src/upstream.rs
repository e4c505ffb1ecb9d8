//! Upstream plumbing for the ElectrumX proxies: failover fetching, request
//! options, metrics, method paths, and typed envelope/result parsing.

pub mod envelope;
pub mod fetcher;
mod headers;
pub mod methods;
pub mod metrics;
pub mod options;
pub mod schema;

#[cfg(test)]
pub(crate) mod stub;

pub use envelope::{parse_result, ParseError};
pub use fetcher::{FailoverFetcher, FetchResponse, UpstreamFetch};
pub use metrics::FetchMetricsSnapshot;
pub use options::FetcherOptions;
pub use schema::{ListingEntry, StateResult, TailEntry};
