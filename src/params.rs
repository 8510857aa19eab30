//! Query parameters and per-query pipeline options
//!
//! [`QueryParams`] is the wire-level parameter set sent to the platform. It is a
//! plain ordered map of field names to scalar values; every stage that needs a
//! variant of it (a range chunk, a page) works on its own clone.
//!
//! [`QueryOptions`] carries the two knobs that steer the pipeline but never go
//! on the wire: the range ceiling in days and the pagination increment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Primary window start (`YYYYMMDDHHMM`)
pub const PERIOD_START: &str = "periodStart";
/// Primary window end (`YYYYMMDDHHMM`)
pub const PERIOD_END: &str = "periodEnd";
/// Update-tracking window start (`YYYYMMDDHHMM`)
pub const PERIOD_START_UPDATE: &str = "periodStartUpdate";
/// Update-tracking window end (`YYYYMMDDHHMM`)
pub const PERIOD_END_UPDATE: &str = "periodEndUpdate";
/// Pagination cursor
pub const OFFSET: &str = "offset";
/// Credential field appended by the transport
pub const SECURITY_TOKEN: &str = "securityToken";

/// Default range ceiling for most report types
pub const DEFAULT_MAX_DAYS_LIMIT: u32 = 365;
/// Range ceiling used for reports without a platform limit
pub const UNBOUNDED_MAX_DAYS_LIMIT: u32 = 36_500;
/// Range ceiling for unit-level reports
pub const UNIT_LEVEL_MAX_DAYS_LIMIT: u32 = 1;
/// Documents per page for most report types
pub const DEFAULT_OFFSET_INCREMENT: u32 = 100;
/// Documents per page for outage reports
pub const OUTAGES_OFFSET_INCREMENT: u32 = 200;

/// Parameter building errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParamsError {
    /// In/out domains violate the report's equality rule
    #[error("{rule}: got in_Domain='{in_domain}' and out_Domain='{out_domain}'")]
    DomainEquality {
        /// Rule that was violated
        rule: DomainRule,
        /// in_Domain value
        in_domain: String,
        /// out_Domain value
        out_domain: String,
    },

    /// Malformed `key=value` pair
    #[error("invalid parameter '{0}': expected key=value")]
    InvalidPair(String),
}

/// A scalar wire value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer value (periods, offsets)
    Integer(i64),
    /// Text value (codes, EICs)
    Text(String),
}

impl ParamValue {
    /// Integer view of the value; text is parsed when it holds digits only.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(value) => Some(*value),
            ParamValue::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Parse a command-line value, keeping all-digit strings as integers.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(value) if !raw.starts_with('+') => ParamValue::Integer(value),
            _ => ParamValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(value) => write!(f, "{value}"),
            ParamValue::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(i64::from(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Wire-level query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams {
    entries: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field, returning the previous value
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Chainable insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Look up a field as an integer
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ParamValue::as_i64)
    }

    /// Whether a field is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.remove(key)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.entries.iter()
    }

    /// Field pair that bounds the query in time
    ///
    /// The update-tracking pair wins when both of its fields are present.
    pub fn window_fields(&self) -> Option<WindowFields> {
        [WindowFields::UPDATE, WindowFields::PRIMARY]
            .into_iter()
            .find(|fields| self.contains(fields.start) && self.contains(fields.end))
    }

    /// Values of the governing window, when both parse as integers
    pub fn window(&self) -> Option<(i64, i64)> {
        let fields = self.window_fields()?;
        Some((self.get_i64(fields.start)?, self.get_i64(fields.end)?))
    }

    /// Render as query-string pairs
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }
}

/// Names of a start/end field pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFields {
    pub start: &'static str,
    pub end: &'static str,
}

impl WindowFields {
    /// `periodStart` / `periodEnd`
    pub const PRIMARY: WindowFields = WindowFields {
        start: PERIOD_START,
        end: PERIOD_END,
    };

    /// `periodStartUpdate` / `periodEndUpdate`
    pub const UPDATE: WindowFields = WindowFields {
        start: PERIOD_START_UPDATE,
        end: PERIOD_END_UPDATE,
    };
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        write!(f, "{{{}}}", rendered.join(", "))
    }
}

/// Parse a `key=value` pair from the command line
pub fn parse_pair(raw: &str) -> Result<(String, ParamValue), ParamsError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ParamsError::InvalidPair(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParamsError::InvalidPair(raw.to_string()));
    }
    Ok((key.to_string(), ParamValue::parse_lenient(value.trim())))
}

/// Per-query pipeline options, passed by value into every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Largest window in days sent in a single request
    pub max_days_limit: u32,
    /// Page size used to advance the `offset` cursor
    pub offset_increment: u32,
}

impl QueryOptions {
    /// Options with explicit values
    pub fn new(max_days_limit: u32, offset_increment: u32) -> Self {
        Self {
            max_days_limit,
            offset_increment,
        }
    }

    /// Override the range ceiling
    pub fn with_max_days_limit(mut self, max_days_limit: u32) -> Self {
        self.max_days_limit = max_days_limit;
        self
    }

    /// Override the page size
    pub fn with_offset_increment(mut self, offset_increment: u32) -> Self {
        self.offset_increment = offset_increment;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DAYS_LIMIT, DEFAULT_OFFSET_INCREMENT)
    }
}

/// Report families that share pipeline options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportGroup {
    /// Load, generation, market, transmission and balancing reports
    Default,
    /// Unavailability reports (larger pages)
    Outages,
    /// Master data and configuration reports (no range ceiling)
    MasterData,
    /// Per-unit reports limited to one day per request
    UnitLevel,
}

impl ReportGroup {
    /// Pipeline options for this group
    pub fn options(&self) -> QueryOptions {
        match self {
            ReportGroup::Default => QueryOptions::default(),
            ReportGroup::Outages => {
                QueryOptions::new(DEFAULT_MAX_DAYS_LIMIT, OUTAGES_OFFSET_INCREMENT)
            }
            ReportGroup::MasterData => {
                QueryOptions::new(UNBOUNDED_MAX_DAYS_LIMIT, DEFAULT_OFFSET_INCREMENT)
            }
            ReportGroup::UnitLevel => {
                QueryOptions::new(UNIT_LEVEL_MAX_DAYS_LIMIT, DEFAULT_OFFSET_INCREMENT)
            }
        }
    }
}

impl fmt::Display for ReportGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportGroup::Default => "default",
            ReportGroup::Outages => "outages",
            ReportGroup::MasterData => "master-data",
            ReportGroup::UnitLevel => "unit-level",
        };
        write!(f, "{s}")
    }
}

/// Equality constraint between `in_Domain` and `out_Domain`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainRule {
    /// Both domains must name the same area
    MustEqual,
    /// Domains must name different areas
    MustDiffer,
}

impl fmt::Display for DomainRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainRule::MustEqual => write!(f, "in_Domain and out_Domain must be the same"),
            DomainRule::MustDiffer => write!(f, "in_Domain and out_Domain must be different"),
        }
    }
}

/// Check the in/out domain rule; skipped when either side is absent.
pub fn validate_domain_equality(params: &QueryParams, rule: DomainRule) -> Result<(), ParamsError> {
    let (Some(in_domain), Some(out_domain)) = (params.get("in_Domain"), params.get("out_Domain"))
    else {
        return Ok(());
    };

    let equal = in_domain == out_domain;
    let violated = match rule {
        DomainRule::MustEqual => !equal,
        DomainRule::MustDiffer => equal,
    };

    if violated {
        return Err(ParamsError::DomainEquality {
            rule,
            in_domain: in_domain.to_string(),
            out_domain: out_domain.to_string(),
        });
    }
    Ok(())
}

/// Builder for [`QueryParams`] grouped the way the platform documents them
#[derive(Debug, Clone)]
pub struct ParamsBuilder {
    params: QueryParams,
}

impl ParamsBuilder {
    /// Start a parameter set for a document type (e.g. `A44`)
    pub fn new(document_type: impl Into<String>) -> Self {
        Self {
            params: QueryParams::new().with("documentType", document_type.into()),
        }
    }

    /// Start from an existing parameter set
    pub fn from_params(params: QueryParams) -> Self {
        Self { params }
    }

    /// Set an arbitrary wire field
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Set a field only when a value is given
    pub fn optional(self, key: &str, value: Option<impl Into<ParamValue>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    // Period

    /// Primary window (`YYYYMMDDHHMM`)
    pub fn period(self, start: i64, end: i64) -> Self {
        self.param(PERIOD_START, start).param(PERIOD_END, end)
    }

    /// Update-tracking window (`YYYYMMDDHHMM`)
    pub fn update_period(self, start: i64, end: i64) -> Self {
        self.param(PERIOD_START_UPDATE, start)
            .param(PERIOD_END_UPDATE, end)
    }

    /// `TimeIntervalUpdate`, an alternative to the update window
    pub fn time_interval_update(self, interval: impl Into<String>) -> Self {
        self.param("TimeIntervalUpdate", interval.into())
    }

    /// `updatedDateAndOrTime`
    pub fn updated_date_and_or_time(self, value: impl Into<String>) -> Self {
        self.param("updatedDateAndOrTime", value.into())
    }

    /// `implementation_DateAndOrTime`
    pub fn implementation_date_and_or_time(self, value: impl Into<String>) -> Self {
        self.param("implementation_DateAndOrTime", value.into())
    }

    // Domains

    /// `in_Domain`
    pub fn in_domain(self, eic: impl Into<String>) -> Self {
        self.param("in_Domain", eic.into())
    }

    /// `out_Domain`
    pub fn out_domain(self, eic: impl Into<String>) -> Self {
        self.param("out_Domain", eic.into())
    }

    /// `domain.mRID`
    pub fn domain_mrid(self, eic: impl Into<String>) -> Self {
        self.param("domain.mRID", eic.into())
    }

    /// `biddingZone_Domain`
    pub fn bidding_zone_domain(self, eic: impl Into<String>) -> Self {
        self.param("biddingZone_Domain", eic.into())
    }

    /// `outBiddingZone_Domain`
    pub fn out_bidding_zone_domain(self, eic: impl Into<String>) -> Self {
        self.param("outBiddingZone_Domain", eic.into())
    }

    /// `acquiring_Domain`
    pub fn acquiring_domain(self, eic: impl Into<String>) -> Self {
        self.param("acquiring_Domain", eic.into())
    }

    /// `connecting_Domain`
    pub fn connecting_domain(self, eic: impl Into<String>) -> Self {
        self.param("connecting_Domain", eic.into())
    }

    /// `controlArea_Domain`
    pub fn control_area_domain(self, eic: impl Into<String>) -> Self {
        self.param("controlArea_Domain", eic.into())
    }

    /// `area_Domain`
    pub fn area_domain(self, eic: impl Into<String>) -> Self {
        self.param("area_Domain", eic.into())
    }

    /// `Domain`
    pub fn domain(self, eic: impl Into<String>) -> Self {
        self.param("Domain", eic.into())
    }

    // Business

    /// `businessType`
    pub fn business_type(self, code: impl Into<String>) -> Self {
        self.param("businessType", code.into())
    }

    /// `processType`
    pub fn process_type(self, code: impl Into<String>) -> Self {
        self.param("processType", code.into())
    }

    /// `psrType`
    pub fn psr_type(self, code: impl Into<String>) -> Self {
        self.param("psrType", code.into())
    }

    // Market

    /// `contract_MarketAgreement.Type`
    pub fn contract_market_agreement_type(self, code: impl Into<String>) -> Self {
        self.param("contract_MarketAgreement.Type", code.into())
    }

    /// `auction.Type`
    pub fn auction_type(self, code: impl Into<String>) -> Self {
        self.param("auction.Type", code.into())
    }

    /// `auction.category`
    pub fn auction_category(self, code: impl Into<String>) -> Self {
        self.param("auction.category", code.into())
    }

    /// `type_MarketAgreement.Type`
    pub fn type_market_agreement_type(self, code: impl Into<String>) -> Self {
        self.param("type_MarketAgreement.Type", code.into())
    }

    // Balancing

    /// `Standard_MarketProduct`
    pub fn standard_market_product(self, code: impl Into<String>) -> Self {
        self.param("Standard_MarketProduct", code.into())
    }

    /// `Original_MarketProduct`
    pub fn original_market_product(self, code: impl Into<String>) -> Self {
        self.param("Original_MarketProduct", code.into())
    }

    /// `Direction` (A01 up, A02 down)
    pub fn direction(self, code: impl Into<String>) -> Self {
        self.param("Direction", code.into())
    }

    /// `ExportType`
    pub fn export_type(self, code: impl Into<String>) -> Self {
        self.param("ExportType", code.into())
    }

    // Resources

    /// `registeredResource`
    pub fn registered_resource(self, eic: impl Into<String>) -> Self {
        self.param("registeredResource", eic.into())
    }

    /// `subject_Party.name`
    pub fn subject_party_name(self, name: impl Into<String>) -> Self {
        self.param("subject_Party.name", name.into())
    }

    /// `subject_Party.marketRole.type`
    pub fn subject_party_market_role(self, code: impl Into<String>) -> Self {
        self.param("subject_Party.marketRole.type", code.into())
    }

    // Outages

    /// `docStatus`
    pub fn doc_status(self, code: impl Into<String>) -> Self {
        self.param("docStatus", code.into())
    }

    /// `mRID`
    pub fn m_rid(self, id: impl Into<String>) -> Self {
        self.param("mRID", id.into())
    }

    /// Enable pagination starting at the given offset
    pub fn offset(self, offset: u32) -> Self {
        self.param(OFFSET, offset)
    }

    /// Finish building
    pub fn build(self) -> QueryParams {
        self.params
    }
}
