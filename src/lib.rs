//! # ENTSO-E Transparency Platform client
//!
//! Typed access to the ENTSO-E Transparency Platform REST API: parameter sets
//! for the documented report types, a query pipeline that works around the
//! platform's request limits, and flattening of the XML documents it returns
//! into tabular records.
//!
//! ## Quick Start
//!
//! ```no_run
//! use entsoe_client::{reports, Config, QueryClient};
//! use entsoe_client::records::{extract_records, RecordOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let client = QueryClient::new(&config)?;
//!
//! // Actual total load for the Czech bidding zone, all of 2023
//! let preset = reports::find("6.1.A").ok_or("unknown report")?;
//! let params = preset
//!     .builder()
//!     .period(202301010000, 202401010000)
//!     .out_bidding_zone_domain("10YCZ-CEPS-----N")
//!     .build();
//!
//! let documents = client.query(params, preset.options()).await?;
//! let records = extract_records(&documents, &RecordOptions::default())?;
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`params`] - Query parameters, the generic builder and pipeline options
//! - [`reports`] - Preset table of documented report types
//! - [`query`] - Range splitting, pagination, retries, unpacking and parsing
//! - [`schema`] - Namespace registry and document types
//! - [`records`] - Flattening documents into records
//! - [`timestamps`] - Point timestamps from start, resolution and position
//! - [`output`] - CSV and JSON record writers
//! - [`config`] - Security token and client settings
//!
//! A window with no published data yields an empty document list; only
//! genuine failures surface as errors.

#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// Security token and client settings
pub mod config;

/// Record output writers
pub mod output;

/// Query parameters and pipeline options
pub mod params;

/// Integer datetimes and window arithmetic
pub mod period;

/// Query pipeline
pub mod query;

/// Flattening documents into records
pub mod records;

/// Report presets
pub mod reports;

/// Schema registry and document types
pub mod schema;

/// Timestamp reconstruction
pub mod timestamps;

// Re-export commonly used types
pub use config::{Config, ConfigError, SecurityToken};
pub use params::{ParamsBuilder, QueryOptions, QueryParams};
pub use query::{ExecutionMode, QueryClient, QueryError, QueryResult, QueryStage};
pub use schema::{Document, SchemaRegistry};
