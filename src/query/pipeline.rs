//! Pipeline composition
//!
//! The stage order is fixed: range splitting outermost so each chunk is
//! paginated on its own, then pagination, then retry around one complete
//! fetch (transport, unpacking and parsing).

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::params::{QueryOptions, QueryParams};
use crate::schema::Document;

use super::document::DocumentParser;
use super::pagination::Paginator;
use super::range::{ExecutionMode, RangeSplitter};
use super::retry::{Retrier, RetryPolicy, Sleeper};
use super::transport::{HttpTransport, Transport};
use super::unzip::unpack;
use super::{QueryResult, QueryStage};

/// One request: send, unpack, parse
#[derive(Debug, Clone)]
pub struct FetchDocuments<T> {
    transport: T,
    parser: DocumentParser,
}

impl<T> FetchDocuments<T> {
    pub fn new(transport: T) -> Self {
        Self::with_parser(transport, DocumentParser::default())
    }

    pub fn with_parser(transport: T, parser: DocumentParser) -> Self {
        Self { transport, parser }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: Transport> QueryStage for FetchDocuments<T> {
    async fn execute(
        &self,
        params: QueryParams,
        _options: QueryOptions,
    ) -> QueryResult<Vec<Document>> {
        let payload = self.transport.send(&params).await?;
        let payloads = unpack(&payload)?;

        let mut documents = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            if let Some(document) = self.parser.parse(payload)? {
                documents.push(document);
            }
        }

        debug!(
            "Fetched {} documents from {} payloads",
            documents.len(),
            payloads.len()
        );
        Ok(documents)
    }

    fn describe(&self) -> Vec<&'static str> {
        vec!["parser", "unpacker", "transport"]
    }
}

/// The composed stage chain
pub type Pipeline<T> = RangeSplitter<Paginator<Retrier<FetchDocuments<T>>>>;

/// Compose the stages around a transport
pub fn compose<T: Transport>(
    transport: T,
    retry: RetryPolicy,
    mode: ExecutionMode,
) -> Pipeline<T> {
    RangeSplitter::new(
        Paginator::new(Retrier::new(FetchDocuments::new(transport), retry)),
        mode,
    )
}

/// Entry point for queries
#[derive(Debug)]
pub struct QueryClient<T = HttpTransport> {
    pipeline: Pipeline<T>,
}

impl QueryClient<HttpTransport> {
    /// Client over HTTP using `config`
    pub fn new(config: &Config) -> QueryResult<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> QueryClient<T> {
    /// Client over any transport, retry policy and pool size from `config`
    pub fn with_transport(transport: T, config: &Config) -> Self {
        Self {
            pipeline: compose(
                transport,
                config.retry,
                ExecutionMode::Concurrent {
                    max_workers: config.max_workers,
                },
            ),
        }
    }

    /// Client from explicit parts
    pub fn from_parts(transport: T, retry: RetryPolicy, mode: ExecutionMode) -> Self {
        Self {
            pipeline: compose(transport, retry, mode),
        }
    }

    /// Client whose retrier suspends through `sleeper`
    pub fn with_sleeper(
        transport: T,
        retry: RetryPolicy,
        mode: ExecutionMode,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            pipeline: RangeSplitter::new(
                Paginator::new(Retrier::with_sleeper(
                    FetchDocuments::new(transport),
                    retry,
                    sleeper,
                )),
                mode,
            ),
        }
    }

    /// Switch between sequential and pooled chunk execution
    pub fn with_mode(self, mode: ExecutionMode) -> Self {
        Self {
            pipeline: self.pipeline.with_mode(mode),
        }
    }

    /// Run a query through every stage
    ///
    /// A window with no data yields an empty list, not an error.
    pub async fn query(
        &self,
        params: QueryParams,
        options: QueryOptions,
    ) -> QueryResult<Vec<Document>> {
        info!(
            "Querying {} (max {} days per request, {} per page)",
            params, options.max_days_limit, options.offset_increment
        );
        let documents = self.pipeline.execute(params, options).await?;
        info!("Query returned {} documents", documents.len());
        Ok(documents)
    }

    /// Stage names, outermost first
    pub fn describe(&self) -> Vec<&'static str> {
        self.pipeline.describe()
    }

    pub fn transport(&self) -> &T {
        self.pipeline.inner().inner().inner().transport()
    }
}
