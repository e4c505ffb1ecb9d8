//! Multi-origin HTTP fetcher. Every call walks an ordered rotation of the
//! configured origins, trying each one at most once, and hands back the first
//! successful response. Exhausting the rotation yields a synthetic 503 rather
//! than an error so callers branch on status alone.

use crate::runtime::config::IndexerConfig;
use crate::upstream::headers::build_default_headers;
use crate::upstream::metrics::{FetchMetrics, FetchMetricsSnapshot};
use crate::upstream::options::FetcherOptions;
use anyhow::{anyhow, bail, Context, Result};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

pub const UNAVAILABLE_STATUS: u16 = 503;
pub const UNAVAILABLE_BODY: &str = "All API servers are unavailable";

/// Raw upstream reply. `origin` is `None` for the synthetic unavailable result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    pub origin: Option<String>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>, origin: Option<String>) -> Self {
        Self {
            status,
            body: body.into(),
            origin,
        }
    }

    pub fn unavailable() -> Self {
        Self::new(UNAVAILABLE_STATUS, UNAVAILABLE_BODY, None)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Read-side seam consumed by the resolver, paginator and tail poller.
pub trait UpstreamFetch: Send + Sync {
    fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, FetchResponse>;
}

#[derive(Debug)]
pub struct FailoverFetcher {
    origins: Arc<[String]>,
    client: reqwest::Client,
    next_start: AtomicUsize,
    metrics: Arc<FetchMetrics>,
}

impl UpstreamFetch for FailoverFetcher {
    fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, FetchResponse> {
        Box::pin(self.fetch(path))
    }
}

impl FailoverFetcher {
    pub fn new(origins: Vec<String>) -> Result<Self> {
        Self::with_options(origins, FetcherOptions::default())
    }

    pub fn with_options(origins: Vec<String>, options: FetcherOptions) -> Result<Self> {
        options.validate()?;

        let origins: Vec<String> = origins
            .into_iter()
            .map(|origin| origin.trim().trim_end_matches('/').to_owned())
            .filter(|origin| !origin.is_empty())
            .collect();
        if origins.is_empty() {
            bail!("at least one upstream origin is required");
        }

        let headers = build_default_headers(&options.user_agent)?;
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|err| anyhow!("failed to build HTTP client: {err}"))?;

        Ok(Self {
            origins: origins.into(),
            client,
            next_start: AtomicUsize::new(0),
            metrics: Arc::new(FetchMetrics::default()),
        })
    }

    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        config.validate()?;
        let options = FetcherOptions {
            request_timeout: config.request_timeout(),
            user_agent: config.user_agent().to_owned(),
            ..FetcherOptions::default()
        };
        Self::with_options(config.origins().to_vec(), options)
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    pub fn metrics(&self) -> FetchMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Origin indices to try for the next call. Consecutive calls start one
    /// origin further along so load spreads evenly across healthy origins.
    fn rotation(&self) -> Vec<usize> {
        let count = self.origins.len();
        let start = self.next_start.fetch_add(1, Ordering::Relaxed) % count;
        (0..count).map(|step| (start + step) % count).collect()
    }

    pub async fn fetch(&self, path: &str) -> FetchResponse {
        let rotation = self.rotation();
        let path = path.trim_start_matches('/');

        for (attempt, index) in rotation.iter().copied().enumerate() {
            let origin = &self.origins[index];
            let url = format!("{origin}/{path}");
            let start = Instant::now();

            match self.attempt(&url).await {
                Ok((status, body)) if (200..300).contains(&status) => {
                    self.metrics.record_success(start.elapsed());
                    tracing::debug!(
                        attempt = attempt + 1,
                        origin = %origin,
                        status,
                        "upstream request succeeded"
                    );
                    return FetchResponse::new(status, body, Some(origin.clone()));
                }
                Ok((status, _)) => {
                    self.metrics.record_failure(start.elapsed());
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %url,
                        status,
                        "upstream origin responded with non-success status"
                    );
                }
                Err(err) => {
                    self.metrics.record_failure(start.elapsed());
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %url,
                        error = %err,
                        "upstream origin request failed"
                    );
                }
            }
        }

        self.metrics.record_exhausted();
        tracing::error!(
            path,
            origins = rotation.len(),
            "all upstream origins failed"
        );
        FetchResponse::unavailable()
    }

    async fn attempt(&self, url: &str) -> Result<(u16, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read body from {url}"))?;
        Ok((status, body))
    }
}
