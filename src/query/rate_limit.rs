//! Client-side request throttling
//!
//! The platform allows a fixed number of requests per user and minute and
//! answers overruns with temporary bans. Every request takes a permit that is
//! released once the window has elapsed, so concurrent range chunks share one
//! budget.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::debug;

/// Sliding request budget
#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    /// Limiter allowing `max_requests` per `window`, at least one
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_requests)),
            max_requests,
            window,
        }
    }

    /// Limiter allowing `max_requests` per minute
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests as usize, Duration::from_secs(60))
    }

    /// Configured budget
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Permits currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a permit; it is returned when the window elapses
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        if self.available() == 0 {
            debug!(
                "Request budget of {} per {:?} exhausted, waiting",
                self.max_requests, self.window
            );
        }

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RateLimitError::AcquireError(e.to_string()))?;

        let window = self.window;
        tokio::spawn(async move {
            sleep(window).await;
            drop(permit);
        });

        Ok(())
    }
}

/// Rate limiter errors
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Failed to acquire a permit
    #[error("failed to acquire rate limit permit: {0}")]
    AcquireError(String),
}
