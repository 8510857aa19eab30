//! Payload to document parsing
//!
//! Resolves the schema from the root element's namespace, deserializes through
//! the registry and classifies acknowledgements into empty results, transient
//! failures or rejections.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use tracing::{debug, info};

use crate::schema::{AcknowledgementOutcome, Document, ParseError, SchemaRegistry};

use super::transport::RawPayload;
use super::{QueryError, QueryResult};

/// Extract the namespace of the root element
pub fn root_namespace(text: &str) -> Result<String, ParseError> {
    let mut reader = NsReader::from_str(text);
    reader.trim_text(true);

    loop {
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| ParseError::Xml(e.to_string()))?;

        match event {
            Event::Start(root) | Event::Empty(root) => {
                return match resolved {
                    ResolveResult::Bound(ns) => {
                        let namespace = std::str::from_utf8(ns.as_ref())
                            .map_err(|e| ParseError::Encoding(e.to_string()))?;
                        if namespace.trim().is_empty() {
                            Err(ParseError::EmptyNamespace)
                        } else {
                            Ok(namespace.to_string())
                        }
                    }
                    // quick-xml reports `xmlns=""` as unbound
                    ResolveResult::Unbound if declares_empty_namespace(&root) => {
                        Err(ParseError::EmptyNamespace)
                    }
                    ResolveResult::Unbound => Err(ParseError::MissingNamespace),
                    ResolveResult::Unknown(prefix) => Err(ParseError::Xml(format!(
                        "undeclared namespace prefix '{}'",
                        String::from_utf8_lossy(&prefix)
                    ))),
                };
            }
            Event::Eof => return Err(ParseError::Xml("document has no root element".into())),
            _ => continue,
        }
    }
}

fn declares_empty_namespace(root: &BytesStart<'_>) -> bool {
    root.attributes().flatten().any(|attribute| {
        attribute.key.as_ref() == b"xmlns"
            && attribute.value.iter().all(u8::is_ascii_whitespace)
    })
}

/// Turns raw payloads into documents
#[derive(Debug, Clone, Copy)]
pub struct DocumentParser {
    registry: &'static SchemaRegistry,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new(SchemaRegistry::standard())
    }
}

impl DocumentParser {
    pub fn new(registry: &'static SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.registry
    }

    /// Parse one payload
    ///
    /// Returns `Ok(None)` for a "no matching data" acknowledgement.
    pub fn parse(&self, payload: &RawPayload) -> QueryResult<Option<Document>> {
        let text = payload.text()?;
        let namespace = root_namespace(text)?;
        let schema = self.registry.resolve(&namespace)?;
        let document = self.registry.deserialize(text, &schema)?;

        let Some(ack) = document.acknowledgement() else {
            debug!(
                "Parsed {} (HTTP {}) for {}",
                schema.name, payload.status, payload.request.params
            );
            return Ok(Some(document));
        };

        match ack.outcome() {
            AcknowledgementOutcome::NoData => {
                info!(
                    "No matching data for {}: {}",
                    payload.request.params,
                    ack.reason_text()
                );
                Ok(None)
            }
            AcknowledgementOutcome::Transient(reason) => {
                Err(QueryError::TransientServerError(reason))
            }
            AcknowledgementOutcome::Rejected(reason) => Err(QueryError::Acknowledgement(reason)),
        }
    }
}
