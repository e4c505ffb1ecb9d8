use crate::runtime::telemetry;
use crate::upstream::options::DEFAULT_USER_AGENT;
use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Public ElectrumX proxies that serve the atomicals methods.
pub const DEFAULT_ORIGINS: [&str; 3] = [
    "https://ep.wizz.cash/proxy",
    "https://ep.atomicalmarket.com/proxy",
    "https://ep.nextdao.xyz/proxy",
];

const DEFAULT_PAGE_SIZE: usize = 400;
const DEFAULT_TAIL_LIMIT: usize = 100;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RESCAN_INTERVAL_SECS: u64 = 60;
const DEFAULT_TAIL_INTERVAL_SECS: u64 = 15;
const DEFAULT_DATABASE_PATH: &str = "realms.db";

/// Runtime configuration for the realm indexer.
///
/// All instances must be constructed via [`IndexerConfig::builder`] or [`IndexerConfig::new`]
/// so invariants are validated before any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    origins: Vec<String>,
    page_size: usize,
    tail_limit: usize,
    request_timeout: Duration,
    rescan_interval: Duration,
    tail_interval: Duration,
    metrics_interval: Duration,
    database_path: String,
    user_agent: String,
}

pub struct IndexerConfigParams {
    pub origins: Vec<String>,
    pub page_size: usize,
    pub tail_limit: usize,
    pub request_timeout: Duration,
    pub rescan_interval: Duration,
    pub tail_interval: Duration,
    pub metrics_interval: Duration,
    pub database_path: String,
    pub user_agent: String,
}

impl IndexerConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> IndexerConfigBuilder {
        IndexerConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    ///
    /// Prefer [`IndexerConfig::builder`] when most values use defaults.
    pub fn new(params: IndexerConfigParams) -> Result<Self> {
        let IndexerConfigParams {
            origins,
            page_size,
            tail_limit,
            request_timeout,
            rescan_interval,
            tail_interval,
            metrics_interval,
            database_path,
            user_agent,
        } = params;

        let config = Self {
            origins: origins
                .into_iter()
                .map(trimmed_string)
                .filter(|origin| !origin.is_empty())
                .collect(),
            page_size,
            tail_limit,
            request_timeout,
            rescan_interval,
            tail_interval,
            metrics_interval,
            database_path: trimmed_string(database_path),
            user_agent: trimmed_string(user_agent),
        };

        config.validate()?;
        Ok(config)
    }

    /// API origins tried in rotation by the failover fetcher.
    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    /// Entries requested per `find_realms` page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Entries requested per tail poll.
    pub fn tail_limit(&self) -> usize {
        self.tail_limit
    }

    /// Per-request timeout applied to every origin attempt.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn rescan_interval(&self) -> Duration {
        self.rescan_interval
    }

    pub fn tail_interval(&self) -> Duration {
        self.tail_interval
    }

    /// Interval used by the telemetry reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    /// SQLite database file holding realm rows and checkpoints.
    pub fn database_path(&self) -> &str {
        &self.database_path
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        if self.origins.is_empty() {
            bail!("origins must contain at least one API origin");
        }
        for origin in &self.origins {
            validate_url(origin)?;
        }

        if self.page_size == 0 {
            bail!("page_size must be greater than 0");
        }

        if self.tail_limit == 0 {
            bail!("tail_limit must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than 0");
        }

        if self.rescan_interval.is_zero() {
            bail!("rescan_interval must be greater than 0");
        }

        if self.tail_interval.is_zero() {
            bail!("tail_interval must be greater than 0");
        }

        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }

        ensure_not_empty(&self.database_path, "database_path")?;
        ensure_not_empty(&self.user_agent, "user_agent")?;

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct IndexerConfigBuilder {
    origins: Option<Vec<String>>,
    page_size: Option<usize>,
    tail_limit: Option<usize>,
    request_timeout: Option<Duration>,
    rescan_interval: Option<Duration>,
    tail_interval: Option<Duration>,
    metrics_interval: Option<Duration>,
    database_path: Option<String>,
    user_agent: Option<String>,
}

impl IndexerConfigBuilder {
    pub fn origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origins = Some(origins.into_iter().map(Into::into).collect());
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn tail_limit(mut self, limit: usize) -> Self {
        self.tail_limit = Some(limit);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn rescan_interval(mut self, interval: Duration) -> Self {
        self.rescan_interval = Some(interval);
        self
    }

    pub fn tail_interval(mut self, interval: Duration) -> Self {
        self.tail_interval = Some(interval);
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<IndexerConfig> {
        let params = IndexerConfigParams {
            origins: self.origins.unwrap_or_else(default_origins),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            tail_limit: self.tail_limit.unwrap_or(DEFAULT_TAIL_LIMIT),
            request_timeout: self
                .request_timeout
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            rescan_interval: self
                .rescan_interval
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_RESCAN_INTERVAL_SECS)),
            tail_interval: self
                .tail_interval
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_TAIL_INTERVAL_SECS)),
            metrics_interval: self
                .metrics_interval
                .unwrap_or(telemetry::DEFAULT_METRICS_INTERVAL),
            database_path: self
                .database_path
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_owned()),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
        };

        IndexerConfig::new(params).context("invalid indexer configuration")
    }
}

pub fn default_origins() -> Vec<String> {
    DEFAULT_ORIGINS.iter().map(|origin| (*origin).to_owned()).collect()
}

fn trimmed_string(value: String) -> String {
    value.trim().to_owned()
}

fn ensure_not_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} cannot be empty");
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("origin {url} must start with http:// or https://");
    }
    Ok(())
}
