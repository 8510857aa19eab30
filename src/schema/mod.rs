//! Schema registry
//!
//! Maps XML namespaces to schema descriptors and turns payload text into
//! [`Document`]s. The registry is an explicit table built once; lookup never
//! inspects types at runtime.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub mod acknowledgement;
pub mod element;
pub mod namespaces;

pub use acknowledgement::{AcknowledgementDocument, AcknowledgementOutcome};
pub use element::XmlElement;

/// Schema resolution and deserialization errors
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// Root element has no default namespace
    #[error("no default namespace found in root element")]
    MissingNamespace,

    /// Root element declares an empty namespace
    #[error("empty namespace found in root element")]
    EmptyNamespace,

    /// No registered schema for the namespace
    #[error("no schema registered for namespace '{0}'")]
    SchemaNotFound(String),

    /// Several schemas share the namespace
    #[error("multiple schemas registered for namespace '{namespace}': {candidates:?}")]
    SchemaAmbiguous {
        /// Namespace looked up
        namespace: String,
        /// Names of the matching schemas
        candidates: Vec<String>,
    },

    /// Malformed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// Payload is not valid UTF-8
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// How a schema is deserialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Acknowledgement pseudo-error document
    Acknowledgement,
    /// Any market document carrying data
    Market,
}

/// Schema descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SchemaType {
    /// Root element name
    pub name: &'static str,
    /// Declared default namespace
    pub namespace: &'static str,
    /// Deserialization strategy
    pub kind: SchemaKind,
}

impl SchemaType {
    /// Market document schema
    pub const fn market(name: &'static str, namespace: &'static str) -> Self {
        Self {
            name,
            namespace,
            kind: SchemaKind::Market,
        }
    }

    /// Acknowledgement schema
    pub const fn acknowledgement(name: &'static str, namespace: &'static str) -> Self {
        Self {
            name,
            namespace,
            kind: SchemaKind::Acknowledgement,
        }
    }
}

/// Parsed payload content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DocumentContent {
    /// Typed acknowledgement
    Acknowledgement(AcknowledgementDocument),
    /// Generic market document tree
    Market(XmlElement),
}

/// A parsed response document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Schema the payload resolved to
    pub schema: SchemaType,
    /// Parsed content
    pub content: DocumentContent,
}

impl Document {
    /// Market document from a root element
    pub fn market(schema: SchemaType, root: XmlElement) -> Self {
        Self {
            schema,
            content: DocumentContent::Market(root),
        }
    }

    /// Schema name
    pub fn schema_name(&self) -> &'static str {
        self.schema.name
    }

    /// Root element for market documents
    pub fn root(&self) -> Option<&XmlElement> {
        match &self.content {
            DocumentContent::Market(root) => Some(root),
            DocumentContent::Acknowledgement(_) => None,
        }
    }

    /// Acknowledgement content, if this is one
    pub fn acknowledgement(&self) -> Option<&AcknowledgementDocument> {
        match &self.content {
            DocumentContent::Acknowledgement(ack) => Some(ack),
            DocumentContent::Market(_) => None,
        }
    }

    /// JSON view of the document body with snake_case keys
    pub fn to_json(&self) -> Value {
        match &self.content {
            DocumentContent::Market(root) => root.to_json(),
            DocumentContent::Acknowledgement(ack) => {
                serde_json::to_value(ack).unwrap_or(Value::Null)
            }
        }
    }
}

/// Namespace to schema table
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: Vec<SchemaType>,
}

static STANDARD_REGISTRY: Lazy<SchemaRegistry> =
    Lazy::new(|| SchemaRegistry::new(namespaces::STANDARD_SCHEMAS.to_vec()));

impl SchemaRegistry {
    /// Registry over the given schemas
    pub fn new(types: Vec<SchemaType>) -> Self {
        Self { types }
    }

    /// Shared registry of the platform's published schemas
    pub fn standard() -> &'static SchemaRegistry {
        &STANDARD_REGISTRY
    }

    /// Add a schema
    pub fn register(&mut self, schema: SchemaType) {
        self.types.push(schema);
    }

    /// Registered schemas
    pub fn types(&self) -> &[SchemaType] {
        &self.types
    }

    /// Resolve exactly one schema for a namespace
    pub fn resolve(&self, namespace: &str) -> Result<SchemaType, ParseError> {
        let matches: Vec<&SchemaType> = self
            .types
            .iter()
            .filter(|schema| schema.namespace == namespace)
            .collect();

        match matches.as_slice() {
            [] => Err(ParseError::SchemaNotFound(namespace.to_string())),
            [schema] => {
                debug!("Resolved namespace {} to {}", namespace, schema.name);
                Ok(**schema)
            }
            many => Err(ParseError::SchemaAmbiguous {
                namespace: namespace.to_string(),
                candidates: many.iter().map(|schema| schema.name.to_string()).collect(),
            }),
        }
    }

    /// Deserialize payload text as the given schema
    pub fn deserialize(&self, text: &str, schema: &SchemaType) -> Result<Document, ParseError> {
        let content = match schema.kind {
            SchemaKind::Acknowledgement => {
                DocumentContent::Acknowledgement(AcknowledgementDocument::parse(text)?)
            }
            SchemaKind::Market => DocumentContent::Market(XmlElement::parse(text)?),
        };
        Ok(Document {
            schema: *schema,
            content,
        })
    }
}
