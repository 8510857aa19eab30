//! Acknowledgement document model
//!
//! The platform answers with an acknowledgement instead of an HTTP error when a
//! query yields no data or fails server side. The reason text decides how the
//! pipeline reacts.

use serde::{Deserialize, Serialize};

use super::ParseError;

/// Reason text marking an empty but valid result
pub const NO_MATCHING_DATA: &str = "No matching data found";

/// Reason text marking a transient server failure
pub const UNEXPECTED_ERROR: &str = "Unexpected error occurred";

/// `Acknowledgement_MarketDocument`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgementDocument {
    /// Document identifier
    #[serde(rename(deserialize = "mRID"), default)]
    pub m_rid: Option<String>,

    /// Creation timestamp
    #[serde(rename(deserialize = "createdDateTime"), default)]
    pub created_date_time: Option<String>,

    /// Creation timestamp of the document being acknowledged
    #[serde(
        rename(deserialize = "received_MarketDocument.createdDateTime"),
        default
    )]
    pub received_market_document_created_date_time: Option<String>,

    /// Reasons, first one is authoritative
    #[serde(rename(deserialize = "Reason"), default)]
    pub reason: Vec<Reason>,
}

/// One `Reason` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    /// Reason code (e.g. `999`)
    #[serde(default)]
    pub code: Option<String>,

    /// Free text explanation
    #[serde(default)]
    pub text: Option<String>,
}

/// How the pipeline treats an acknowledgement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcknowledgementOutcome {
    /// Valid empty result
    NoData,
    /// Retry the request
    Transient(String),
    /// Surface the reason to the caller
    Rejected(String),
}

impl AcknowledgementDocument {
    /// Deserialize from XML
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        quick_xml::de::from_str(xml).map_err(|e| ParseError::Xml(e.to_string()))
    }

    /// Text of the first reason, empty when absent
    pub fn reason_text(&self) -> &str {
        self.reason
            .first()
            .and_then(|reason| reason.text.as_deref())
            .unwrap_or("")
    }

    /// Classify by reason text
    pub fn outcome(&self) -> AcknowledgementOutcome {
        classify_reason(self.reason_text())
    }
}

/// Classify an acknowledgement reason text
pub fn classify_reason(reason: &str) -> AcknowledgementOutcome {
    if reason.contains(NO_MATCHING_DATA) {
        AcknowledgementOutcome::NoData
    } else if reason.contains(UNEXPECTED_ERROR) {
        AcknowledgementOutcome::Transient(reason.to_string())
    } else {
        AcknowledgementOutcome::Rejected(reason.to_string())
    }
}
