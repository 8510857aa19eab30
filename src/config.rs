//! Client configuration
//!
//! Configuration is read once and then shared read-only by the transport and
//! the retrier. The security token is validated up front and never printed.

use crate::query::retry::{Backoff, RetryPolicy};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Production API endpoint
pub const DEFAULT_BASE_URL: &str = "https://web-api.tp.entsoe.eu/api";

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Range chunks executed concurrently
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Platform allowance per user and minute
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 400;

/// Environment variable holding the security token
pub const TOKEN_ENV_VAR: &str = "ENTSOE_API";

const TIMEOUT_ENV_VAR: &str = "ENTSOE_TIMEOUT_SECS";
const RETRIES_ENV_VAR: &str = "ENTSOE_RETRIES";
const RETRY_DELAY_ENV_VAR: &str = "ENTSOE_RETRY_DELAY_SECS";
const MAX_WORKERS_ENV_VAR: &str = "ENTSOE_MAX_WORKERS";
const BASE_URL_ENV_VAR: &str = "ENTSOE_BASE_URL";
const REQUESTS_PER_MINUTE_ENV_VAR: &str = "ENTSOE_REQUESTS_PER_MINUTE";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No token configured
    #[error("security token not configured: set {TOKEN_ENV_VAR}")]
    MissingToken,

    /// Token is not a UUID
    #[error("security token is not a valid UUID")]
    InvalidToken,

    /// A setting could not be parsed or is out of range
    #[error("invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        /// Setting name
        name: String,
        /// Offending value
        value: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Platform security token
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityToken(String);

impl SecurityToken {
    /// Validate and wrap a token
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        uuid::Uuid::parse_str(trimmed).map_err(|_| ConfigError::InvalidToken)?;
        Ok(Self(trimmed.to_string()))
    }

    /// Raw token value for the wire
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecurityToken(****)")
    }
}

impl fmt::Display for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    security_token: SecurityToken,
    /// Timeout applied to each HTTP call
    pub timeout: Duration,
    /// Attempts and backoff for transient failures
    pub retry: RetryPolicy,
    /// Concurrent range chunks
    pub max_workers: usize,
    /// API endpoint
    pub base_url: String,
    /// Client-side request throttle; `None` disables it
    pub requests_per_minute: Option<u32>,
}

impl Config {
    /// Configuration with defaults and the given token
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            security_token: SecurityToken::new(token)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_minute: Some(DEFAULT_REQUESTS_PER_MINUTE),
        })
    }

    /// Load from the process environment, reading `.env` first when present
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV_VAR).ok_or(ConfigError::MissingToken)?;
        let mut config = Self::new(token)?;

        if let Some(secs) = parse_var::<u64, _>(&lookup, TIMEOUT_ENV_VAR)? {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = parse_var::<u32, _>(&lookup, RETRIES_ENV_VAR)? {
            config = config.with_retries(retries)?;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, RETRY_DELAY_ENV_VAR)? {
            config = config.with_backoff(Backoff::Constant(Duration::from_secs(secs)));
        }
        if let Some(workers) = parse_var::<usize, _>(&lookup, MAX_WORKERS_ENV_VAR)? {
            config = config.with_max_workers(workers)?;
        }
        if let Some(url) = lookup(BASE_URL_ENV_VAR) {
            config = config.with_base_url(url);
        }
        if let Some(rpm) = parse_var::<u32, _>(&lookup, REQUESTS_PER_MINUTE_ENV_VAR)? {
            config = config.with_requests_per_minute(Some(rpm));
        }

        Ok(config)
    }

    /// Security token
    pub fn security_token(&self) -> &SecurityToken {
        &self.security_token
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the total number of attempts
    pub fn with_retries(mut self, retries: u32) -> Result<Self, ConfigError> {
        if retries == 0 {
            return Err(invalid(RETRIES_ENV_VAR, "0", "must be at least 1"));
        }
        self.retry.retries = retries;
        Ok(self)
    }

    /// Override the delay between attempts
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.retry.backoff = backoff;
        self
    }

    /// Override the worker pool size
    pub fn with_max_workers(mut self, max_workers: usize) -> Result<Self, ConfigError> {
        if max_workers == 0 {
            return Err(invalid(MAX_WORKERS_ENV_VAR, "0", "must be at least 1"));
        }
        self.max_workers = max_workers;
        Ok(self)
    }

    /// Override the API endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the request throttle; `None` or `Some(0)` disables it
    pub fn with_requests_per_minute(mut self, requests_per_minute: Option<u32>) -> Self {
        self.requests_per_minute = requests_per_minute.filter(|&rpm| rpm > 0);
        self
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(name, &raw, &e.to_string())),
    }
}

fn invalid(name: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
