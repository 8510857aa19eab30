//! Stage doubles shared by the pipeline unit tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::params::{QueryOptions, QueryParams};
use crate::schema::{Document, SchemaType, XmlElement};

use super::{QueryResult, QueryStage};

/// Market document carrying `label` as its only text
pub(crate) fn document(label: impl Into<String>) -> Document {
    Document::market(
        SchemaType::market("Test_MarketDocument", "urn:test"),
        XmlElement::new("Test_MarketDocument").with_text(label),
    )
}

pub(crate) fn label(document: &Document) -> String {
    document
        .root()
        .and_then(|root| root.text.clone())
        .unwrap_or_default()
}

type Calls = Arc<Mutex<Vec<(QueryParams, QueryOptions)>>>;

/// Records every call and answers through a closure
pub(crate) struct RecordingStage<F> {
    respond: F,
    calls: Calls,
}

impl<F> RecordingStage<F>
where
    F: Fn(&QueryParams) -> QueryResult<Vec<Document>> + Send + Sync,
{
    pub(crate) fn new(respond: F) -> Self {
        Self {
            respond,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn calls(&self) -> Calls {
        self.calls.clone()
    }
}

#[async_trait]
impl<F> QueryStage for RecordingStage<F>
where
    F: Fn(&QueryParams) -> QueryResult<Vec<Document>> + Send + Sync,
{
    async fn execute(
        &self,
        params: QueryParams,
        options: QueryOptions,
    ) -> QueryResult<Vec<Document>> {
        let response = (self.respond)(&params);
        self.calls.lock().unwrap().push((params, options));
        response
    }

    fn describe(&self) -> Vec<&'static str> {
        vec!["recording"]
    }
}
