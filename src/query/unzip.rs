//! ZIP payload unpacking
//!
//! Bulk reports arrive as ZIP archives holding one XML document per entry.
//! Each entry becomes its own payload with the source's status and request
//! metadata; anything that is not a ZIP passes through untouched.

use bytes::Bytes;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

use super::transport::RawPayload;
use super::{QueryError, QueryResult};

/// Content type given to unpacked entries
pub const XML_CONTENT_TYPE: &str = "text/xml";

/// Split a payload into one payload per archive entry
pub fn unpack(payload: &RawPayload) -> QueryResult<Vec<RawPayload>> {
    if !payload.is_zip() {
        return Ok(vec![payload.clone()]);
    }

    let mut archive = ZipArchive::new(Cursor::new(payload.content.as_ref()))
        .map_err(|e| QueryError::Archive(format!("Failed to open ZIP: {e}")))?;

    debug!("Unpacking ZIP payload with {} entries", archive.len());

    let mut payloads = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| QueryError::Archive(format!("Failed to read ZIP entry {index}: {e}")))?;

        if entry.is_dir() {
            continue;
        }

        let mut text = String::new();
        entry.read_to_string(&mut text).map_err(|e| {
            QueryError::Archive(format!("Failed to decode ZIP entry '{}': {e}", entry.name()))
        })?;

        payloads.push(RawPayload {
            status: payload.status,
            content_type: XML_CONTENT_TYPE.to_string(),
            content: Bytes::from(text),
            request: payload.request.clone(),
        });
    }

    Ok(payloads)
}
