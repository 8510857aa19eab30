//! Fixtures shared by the integration tests

#![allow(dead_code)]

use bytes::Bytes;
use entsoe_client::query::transport::RequestMeta;
use entsoe_client::query::RawPayload;
use entsoe_client::{Config, QueryParams};
use std::io::{Cursor, Write};
use std::time::Duration;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const TOKEN: &str = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";

pub const ACTUAL_LOAD: &str = include_str!("../fixtures/actual_load.xml");
pub const NO_DATA: &str = include_str!("../fixtures/no_data.xml");
pub const REJECTED: &str = include_str!("../fixtures/rejected.xml");

/// Config pointed at a mock server, without throttling or backoff delays
pub fn config(base_url: &str) -> Config {
    Config::new(TOKEN)
        .unwrap()
        .with_base_url(base_url)
        .with_requests_per_minute(None)
        .with_backoff(entsoe_client::query::Backoff::Constant(Duration::ZERO))
}

/// In-memory ZIP archive with the given entries
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// XML payload as the transport would return it
pub fn xml_payload(text: &str) -> RawPayload {
    RawPayload {
        status: 200,
        content_type: "text/xml".to_string(),
        content: Bytes::from(text.to_string()),
        request: RequestMeta {
            url: "http://localhost/api".to_string(),
            params: QueryParams::new(),
        },
    }
}
