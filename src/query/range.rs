//! Date window splitting
//!
//! The governing window is `periodStartUpdate`/`periodEndUpdate` when both are
//! present, otherwise `periodStart`/`periodEnd`. A window longer than the
//! query's `max_days_limit` is cut into contiguous chunks; each chunk is a
//! clone of the parameters with only the governing window rewritten. Chunks
//! run one after another or on a bounded pool, and their results are
//! concatenated in chunk order either way.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use crate::config::DEFAULT_MAX_WORKERS;
use crate::params::{QueryOptions, QueryParams, WindowFields};
use crate::period;
use crate::schema::Document;

use super::{QueryError, QueryResult, QueryStage};

/// How range chunks are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One chunk at a time
    Sequential,
    /// Up to `max_workers` chunks in flight
    Concurrent {
        /// Pool size
        max_workers: usize,
    },
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Concurrent {
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

/// Chunk parameters for a window, or `None` when no split is needed
pub fn chunk_params(
    params: &QueryParams,
    max_days_limit: u32,
) -> QueryResult<Option<Vec<QueryParams>>> {
    let Some(fields) = params.window_fields() else {
        return Ok(None);
    };

    let start = window_value(params, fields.start)?;
    let end = window_value(params, fields.end)?;

    if !period::exceeds_limit(start, end, max_days_limit)? {
        return Ok(None);
    }

    let chunks = period::split_windows(start, end, max_days_limit)?
        .into_iter()
        .map(|(chunk_start, chunk_end)| with_window(params, fields, chunk_start, chunk_end))
        .collect();
    Ok(Some(chunks))
}

fn window_value(params: &QueryParams, key: &str) -> QueryResult<i64> {
    params.get_i64(key).ok_or_else(|| {
        QueryError::InvalidParameter(format!(
            "{key} must be an integer datetime (YYYYMMDDHHMM), got {}",
            params
                .get(key)
                .map(ToString::to_string)
                .unwrap_or_default()
        ))
    })
}

fn with_window(params: &QueryParams, fields: WindowFields, start: i64, end: i64) -> QueryParams {
    let mut chunk = params.clone();
    chunk.insert(fields.start, start);
    chunk.insert(fields.end, end);
    chunk
}

/// Splits long windows before calling the inner stage
#[derive(Debug, Clone)]
pub struct RangeSplitter<S> {
    inner: S,
    mode: ExecutionMode,
}

impl<S> RangeSplitter<S> {
    pub fn new(inner: S, mode: ExecutionMode) -> Self {
        Self { inner, mode }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: QueryStage> QueryStage for RangeSplitter<S> {
    async fn execute(
        &self,
        params: QueryParams,
        options: QueryOptions,
    ) -> QueryResult<Vec<Document>> {
        let Some(chunks) = chunk_params(&params, options.max_days_limit)? else {
            return self.inner.execute(params, options).await;
        };

        debug!(
            "Splitting {} into {} chunks of at most {} days ({:?})",
            params,
            chunks.len(),
            options.max_days_limit,
            self.mode
        );

        let documents = match self.mode {
            ExecutionMode::Sequential => {
                let mut documents = Vec::new();
                for (index, chunk) in chunks.into_iter().enumerate() {
                    let chunk_documents = self.inner.execute(chunk, options).await?;
                    debug!("Chunk {} returned {} documents", index + 1, chunk_documents.len());
                    documents.extend(chunk_documents);
                }
                documents
            }
            ExecutionMode::Concurrent { max_workers } => {
                let per_chunk: Vec<Vec<Document>> = stream::iter(chunks)
                    .map(|chunk| self.inner.execute(chunk, options))
                    .buffered(max_workers.max(1))
                    .try_collect()
                    .await?;
                per_chunk.into_iter().flatten().collect()
            }
        };

        debug!("Range split complete. Total documents: {}", documents.len());
        Ok(documents)
    }

    fn describe(&self) -> Vec<&'static str> {
        let mut stages = vec!["range_splitter"];
        stages.extend(self.inner.describe());
        stages
    }
}
