//! Retry with backoff
//!
//! [`Retrier`] wraps the fetch chain as a unit: a transient failure anywhere in
//! transport, unpacking or parsing restarts the whole request. Non-transient
//! errors propagate on the first occurrence. After the last attempt the last
//! error is returned unchanged.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::params::{QueryOptions, QueryParams};
use crate::schema::Document;

use super::retry_formatter::RetryContext;
use super::{QueryError, QueryResult, QueryStage};

/// Default number of attempts
pub const DEFAULT_RETRIES: u32 = 5;

/// Delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `2^attempt` seconds, attempt counted from 0
    Exponential,
    /// Same delay every time
    Constant(Duration),
}

impl Backoff {
    /// Delay after the failed attempt `attempt` (0-indexed)
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Exponential => Duration::from_secs(2u64.saturating_pow(attempt)),
            Backoff::Constant(delay) => *delay,
        }
    }
}

/// Attempt count and backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, backoff: Backoff) -> Self {
        Self { retries, backoff }
    }

    /// Delay after the failed attempt `attempt` (0-indexed)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

/// Suspends between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retries the inner stage on transient errors
pub struct Retrier<S> {
    inner: S,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<S> Retrier<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self::with_sleeper(inner, policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(inner: S, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            inner,
            policy,
            sleeper,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: fmt::Debug> fmt::Debug for Retrier<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("inner", &self.inner)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: QueryStage> QueryStage for Retrier<S> {
    async fn execute(
        &self,
        params: QueryParams,
        options: QueryOptions,
    ) -> QueryResult<Vec<Document>> {
        let retries = self.policy.retries;
        let mut last_error = None;

        for attempt in 0..retries {
            match self.inner.execute(params.clone(), options).await {
                Ok(documents) => {
                    if attempt > 0 {
                        if let Some(err) = &last_error {
                            let context =
                                RetryContext::new(attempt + 1, retries, err, Duration::ZERO, &params);
                            info!("{}", context.format_success());
                        }
                    }
                    return Ok(documents);
                }
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    if attempt + 1 < retries {
                        let delay = self.policy.delay(attempt);
                        let context =
                            RetryContext::new(attempt + 1, retries, &err, delay, &params);
                        warn!("{}", context.format_retry());
                        last_error = Some(err);
                        self.sleeper.sleep(delay).await;
                    } else {
                        let context =
                            RetryContext::new(attempt + 1, retries, &err, Duration::ZERO, &params);
                        error!("{}", context.format_failure());
                        last_error = Some(err);
                    }
                }
            }
        }

        Err(last_error.unwrap_or(QueryError::RetriesExhausted { attempts: retries }))
    }

    fn describe(&self) -> Vec<&'static str> {
        let mut stages = vec!["retrier"];
        stages.extend(self.inner.describe());
        stages
    }
}
