//! Offset pagination
//!
//! Active only when the parameters carry an `offset` field. Pages are requested
//! at `0, increment, 2 * increment, ...` up to and including [`MAX_OFFSET`],
//! the platform's own limit. An empty page ends the walk; reaching the ceiling
//! ends it silently even while pages keep coming.

use async_trait::async_trait;
use tracing::debug;

use crate::params::{QueryOptions, QueryParams, OFFSET};
use crate::schema::Document;

use super::{QueryError, QueryResult, QueryStage};

/// Largest offset the platform accepts
pub const MAX_OFFSET: u32 = 4800;

/// Offsets visited for a page size, ceiling included
pub fn offsets(increment: u32) -> impl Iterator<Item = u32> {
    (0..=MAX_OFFSET).step_by(increment.max(1) as usize)
}

/// Walks the offset cursor of the inner stage
#[derive(Debug, Clone)]
pub struct Paginator<S> {
    inner: S,
}

impl<S> Paginator<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: QueryStage> QueryStage for Paginator<S> {
    async fn execute(
        &self,
        params: QueryParams,
        options: QueryOptions,
    ) -> QueryResult<Vec<Document>> {
        if !params.contains(OFFSET) {
            return self.inner.execute(params, options).await;
        }

        let increment = options.offset_increment;
        if increment == 0 {
            return Err(QueryError::InvalidParameter(
                "offset increment must be at least 1".to_string(),
            ));
        }

        let mut documents = Vec::new();

        for (page, offset) in offsets(increment).enumerate() {
            let mut page_params = params.clone();
            page_params.insert(OFFSET, offset);

            let page_documents = self.inner.execute(page_params, options).await?;

            if page_documents.is_empty() {
                debug!(
                    "Pagination complete: empty page at offset {}. Total documents: {}",
                    offset,
                    documents.len()
                );
                return Ok(documents);
            }

            debug!(
                "Page {} (offset {}) returned {} documents",
                page + 1,
                offset,
                page_documents.len()
            );
            documents.extend(page_documents);
        }

        debug!(
            "Pagination stopped at offset ceiling {}. Total documents: {}",
            MAX_OFFSET,
            documents.len()
        );
        Ok(documents)
    }

    fn describe(&self) -> Vec<&'static str> {
        let mut stages = vec!["paginator"];
        stages.extend(self.inner.describe());
        stages
    }
}
