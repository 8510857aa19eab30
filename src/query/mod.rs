//! Query orchestration pipeline
//!
//! A query flows through a fixed chain of stages, outermost first:
//!
//! 1. [`range::RangeSplitter`] breaks windows longer than the report's ceiling
//!    into chunks and runs them sequentially or on a bounded pool.
//! 2. [`pagination::Paginator`] walks the `offset` cursor until an empty page
//!    or the platform's hard ceiling.
//! 3. [`retry::Retrier`] repeats transient failures with backoff.
//! 4. [`pipeline::FetchDocuments`] sends one request, unpacks ZIP payloads and
//!    parses every payload into a [`Document`](crate::schema::Document).
//!
//! Each stage implements [`QueryStage`]. [`QueryOptions`] travels by value
//! through every call so concurrently running chunks never share it.

use crate::config::ConfigError;
use crate::params::{QueryOptions, QueryParams};
use crate::period::PeriodError;
use crate::schema::{Document, ParseError};
use async_trait::async_trait;
use std::fmt;

pub mod document;
pub mod pagination;
pub mod pipeline;
pub mod range;
pub mod rate_limit;
pub mod retry;
pub mod retry_formatter;
pub mod transport;
pub mod unzip;

#[cfg(test)]
pub(crate) mod testing;

pub use pipeline::{FetchDocuments, QueryClient};
pub use range::ExecutionMode;
pub use retry::{Backoff, RetryPolicy};
pub use transport::{HttpTransport, RawPayload, Transport};

/// Transport failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// Request or connect timed out
    Timeout,
    /// Connection refused, DNS failure, TLS failure
    Connect,
    /// Request could not be sent
    Request,
    /// Response body could not be read
    Body,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::Connect => "connection failed",
            NetworkErrorKind::Request => "request failed",
            NetworkErrorKind::Body => "body read failed",
        };
        write!(f, "{s}")
    }
}

/// Query errors
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Transport level failure
    #[error("network error ({kind}): {message}")]
    Network {
        /// Failure category
        kind: NetworkErrorKind,
        /// Underlying message
        message: String,
    },

    /// HTTP 503
    #[error("service unavailable (HTTP 503)")]
    ServiceUnavailable,

    /// Acknowledgement reporting an unexpected server error
    #[error("transient server error: {0}")]
    TransientServerError(String),

    /// Acknowledgement with any other reason
    #[error("acknowledgement error: {0}")]
    Acknowledgement(String),

    /// Schema resolution or XML failure
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// ZIP payload could not be read
    #[error("archive error: {0}")]
    Archive(String),

    /// Parameters the pipeline cannot act on
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Client misconfiguration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Retries ended without a captured error
    #[error("request failed after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
    },
}

impl QueryError {
    /// Whether the retrier should try again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QueryError::Network { .. }
                | QueryError::ServiceUnavailable
                | QueryError::TransientServerError(_)
        )
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            NetworkErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            NetworkErrorKind::Body
        } else {
            NetworkErrorKind::Request
        };
        QueryError::Network {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<PeriodError> for QueryError {
    fn from(err: PeriodError) -> Self {
        QueryError::InvalidParameter(err.to_string())
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// One layer of the query pipeline
#[async_trait]
pub trait QueryStage: Send + Sync {
    /// Run the stage for one parameter set
    async fn execute(
        &self,
        params: QueryParams,
        options: QueryOptions,
    ) -> QueryResult<Vec<Document>>;

    /// Stage names from this stage inward
    fn describe(&self) -> Vec<&'static str>;
}

#[async_trait]
impl<S: QueryStage + ?Sized> QueryStage for std::sync::Arc<S> {
    async fn execute(
        &self,
        params: QueryParams,
        options: QueryOptions,
    ) -> QueryResult<Vec<Document>> {
        (**self).execute(params, options).await
    }

    fn describe(&self) -> Vec<&'static str> {
        (**self).describe()
    }
}
