//! HTTP transport
//!
//! Issues one authenticated GET per call. Only HTTP 503 is translated into an
//! error here; every other status is handed to the parser, which decides from
//! the document whether the call succeeded.

use crate::config::{Config, SecurityToken};
use crate::params::{QueryParams, SECURITY_TOKEN};
use crate::schema::ParseError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::rate_limit::RateLimiter;
use super::{NetworkErrorKind, QueryError, QueryResult};

/// Where a payload came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    /// Endpoint URL without query string
    pub url: String,
    /// Parameters sent, security token excluded
    pub params: QueryParams,
}

/// One response body with its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header value
    pub content_type: String,
    /// Body bytes
    pub content: Bytes,
    /// Originating request
    pub request: RequestMeta,
}

impl RawPayload {
    /// Whether the body is a ZIP archive
    pub fn is_zip(&self) -> bool {
        let media_type = self
            .content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        matches!(
            media_type.as_str(),
            "application/zip" | "application/x-zip-compressed"
        )
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> Result<&str, ParseError> {
        std::str::from_utf8(&self.content).map_err(|e| ParseError::Encoding(e.to_string()))
    }
}

/// Sends one request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `params` and return the raw response
    async fn send(&self, params: &QueryParams) -> QueryResult<RawPayload>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    security_token: SecurityToken,
    rate_limiter: Option<RateLimiter>,
}

impl HttpTransport {
    /// Build a client with the configured timeout
    pub fn new(config: &Config) -> QueryResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| QueryError::Network {
                kind: NetworkErrorKind::Request,
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self::with_client(client, config))
    }

    /// Use an existing client
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            security_token: config.security_token().clone(),
            rate_limiter: config.requests_per_minute.map(RateLimiter::per_minute),
        }
    }

    /// Endpoint URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, params: &QueryParams) -> QueryResult<RawPayload> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await.map_err(|e| QueryError::Network {
                kind: NetworkErrorKind::Request,
                message: e.to_string(),
            })?;
        }

        debug!("Making API request to {} with params {}", self.base_url, params);

        let mut query = params.to_query_pairs();
        query.push((
            SECURITY_TOKEN.to_string(),
            self.security_token.expose().to_string(),
        ));

        // Errors carry the full URL including the token; strip it before surfacing
        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| QueryError::from_reqwest(&e.without_url()))?;

        let status = response.status();
        debug!("API response status: {}", status);

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(QueryError::ServiceUnavailable);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        let content = response
            .bytes()
            .await
            .map_err(|e| QueryError::from_reqwest(&e.without_url()))?;

        debug!("Received {} bytes of {}", content.len(), content_type);

        Ok(RawPayload {
            status: status.as_u16(),
            content_type,
            content,
            request: RequestMeta {
                url: self.base_url.clone(),
                params: params.clone(),
            },
        })
    }
}
