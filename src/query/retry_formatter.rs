//! Retry log message formatting
//!
//! Builds the warn line emitted before each retry and the multi-line summary
//! logged once attempts run out.

use std::time::Duration;

use crate::params::QueryParams;
use crate::period::parse_period;

use super::{NetworkErrorKind, QueryError};

/// Classification of retry errors for user messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Request or connect timeout
    NetworkTimeout,
    /// Connection refused, DNS failure
    NetworkOffline,
    /// HTTP 503
    ServiceUnavailable,
    /// Acknowledgement reporting an unexpected server error
    ServerError,
    /// Acknowledgement with any other reason
    Rejected,
    /// Schema resolution or XML failure
    Parse,
    /// Bad parameters or configuration
    InvalidRequest,
    /// Anything else on the wire
    NetworkGeneric,
}

impl RetryErrorType {
    /// Classify a query error
    pub fn from_error(err: &QueryError) -> Self {
        match err {
            QueryError::Network {
                kind: NetworkErrorKind::Timeout,
                ..
            } => Self::NetworkTimeout,
            QueryError::Network {
                kind: NetworkErrorKind::Connect,
                ..
            } => Self::NetworkOffline,
            QueryError::Network { .. } => Self::NetworkGeneric,
            QueryError::ServiceUnavailable => Self::ServiceUnavailable,
            QueryError::TransientServerError(_) => Self::ServerError,
            QueryError::Acknowledgement(_) => Self::Rejected,
            QueryError::Parse(_) | QueryError::Archive(_) => Self::Parse,
            QueryError::InvalidParameter(_) | QueryError::Config(_) => Self::InvalidRequest,
            QueryError::RetriesExhausted { .. } => Self::NetworkGeneric,
        }
    }

    /// Short description used inside retry messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::ServiceUnavailable => "service unavailable",
            Self::ServerError => "unexpected server error",
            Self::Rejected => "request rejected",
            Self::Parse => "unreadable response",
            Self::InvalidRequest => "invalid request",
            Self::NetworkGeneric => "network error",
        }
    }

    /// Remediation hint shown after failures
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "Increase --timeout or check your network connection",
            Self::NetworkOffline => "Verify internet connectivity and DNS resolution",
            Self::ServiceUnavailable | Self::ServerError => {
                "The platform may be under maintenance, try again later"
            }
            Self::Rejected => "Check the document type, domains and period for this report",
            Self::Parse => "The response format may have changed, check the schema registry",
            Self::InvalidRequest => "Check the query parameters and security token",
            Self::NetworkGeneric => "Check network connectivity and try again",
        }
    }
}

/// Context for formatting retry messages
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Current attempt number (1-based)
    pub attempt: u32,
    /// Attempts configured
    pub max_attempts: u32,
    pub error_type: RetryErrorType,
    /// Wait before the next attempt
    pub backoff_duration: Duration,
    /// `documentType` of the request, empty when absent
    pub document_type: String,
    /// Governing window in `YYYYMMDDHHMM`
    pub window: Option<(i64, i64)>,
    /// Page offset, when paginating
    pub offset: Option<i64>,
    /// Full error text
    pub error_message: String,
}

impl RetryContext {
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        error: &QueryError,
        backoff_duration: Duration,
        params: &QueryParams,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            error_type: RetryErrorType::from_error(error),
            backoff_duration,
            document_type: params
                .get("documentType")
                .map(ToString::to_string)
                .unwrap_or_default(),
            window: params.window(),
            offset: params.get_i64(crate::params::OFFSET),
            error_message: error.to_string(),
        }
    }

    /// `Retrying (attempt n/N) after <error> - waiting x.y seconds...`
    pub fn format_retry(&self) -> String {
        let mut message = format!(
            "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds...",
            self.attempt,
            self.max_attempts,
            self.error_type.description(),
            self.backoff_duration.as_secs_f64()
        );
        self.append_request(&mut message);
        message
    }

    /// Logged when an attempt after a failure succeeds
    pub fn format_success(&self) -> String {
        let mut message = format!(
            "Retry attempt {}/{} succeeded",
            self.attempt, self.max_attempts
        );
        self.append_request(&mut message);
        message
    }

    /// Final failure summary with suggestions
    pub fn format_failure(&self) -> String {
        let mut lines = vec![
            format!("[FAILED] Query failed after {} attempts", self.max_attempts),
            format!("  Last error: {}", self.error_message),
        ];

        let document_type = if self.document_type.is_empty() {
            "unknown"
        } else {
            &self.document_type
        };
        lines.push(format!("  Document type: {document_type}"));

        let window = self
            .window
            .map(|(start, end)| format_window(start, end))
            .unwrap_or_else(|| "unbounded".to_string());
        lines.push(format!("  Window: {window}"));

        if let Some(offset) = self.offset {
            lines.push(format!("  Offset: {offset}"));
        }

        lines.push("  Suggestions:".to_string());
        for suggestion in self.format_suggestions() {
            lines.push(format!("    - {suggestion}"));
        }

        lines.join("\n")
    }

    pub fn format_suggestions(&self) -> Vec<String> {
        vec![
            self.error_type.suggestion().to_string(),
            format!(
                "Try increasing --max-retries (current: {})",
                self.max_attempts
            ),
            "Check platform status at https://transparency.entsoe.eu".to_string(),
        ]
    }

    fn append_request(&self, buffer: &mut String) {
        if !self.document_type.is_empty() {
            buffer.push_str(&format!(" ({})", self.document_type));
        }
        if let Some((start, end)) = self.window {
            buffer.push(' ');
            buffer.push_str(&format_window(start, end));
        }
        if let Some(offset) = self.offset {
            buffer.push_str(&format!(" offset {offset}"));
        }
    }
}

fn format_window(start: i64, end: i64) -> String {
    format!("{} to {}", format_period_value(start), format_period_value(end))
}

fn format_period_value(value: i64) -> String {
    parse_period(value)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| value.to_string())
}
