//! Timestamp reconstruction for time series points
//!
//! Points carry only a 1-based position inside a period with a start and an
//! ISO-8601 resolution. The point's instant is `start + (position - 1) *
//! resolution` for the interval start, or `start + position * resolution` for
//! its end. Month and year resolutions follow the calendar.

use chrono::{
    DateTime, Duration, FixedOffset, Months, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::records::Record;

/// Timestamp calculation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("invalid start time '{0}'")]
    InvalidStart(String),

    #[error("invalid resolution '{0}'")]
    InvalidResolution(String),

    #[error("invalid position '{0}': expected an integer >= 1")]
    InvalidPosition(String),

    #[error("timestamp out of range")]
    OutOfRange,
}

/// Which edge of a point's interval to report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum IntervalEdge {
    #[default]
    Start,
    End,
}

impl fmt::Display for IntervalEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalEdge::Start => write!(f, "start"),
            IntervalEdge::End => write!(f, "end"),
        }
    }
}

/// ISO-8601 duration split into calendar months and a fixed part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    months: u32,
    fixed: Duration,
}

impl Resolution {
    /// `start + steps * self`
    pub fn advance(
        &self,
        start: DateTime<FixedOffset>,
        steps: u32,
    ) -> Option<DateTime<FixedOffset>> {
        let months = self.months.checked_mul(steps)?;
        let shifted = start.checked_add_months(Months::new(months))?;
        let fixed = self.fixed.checked_mul(i32::try_from(steps).ok()?)?;
        shifted.checked_add_signed(fixed)
    }
}

impl FromStr for Resolution {
    type Err = TimestampError;

    /// Parses `P[nY][nM][nW][nD][T[nH][nM][nS]]`
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || TimestampError::InvalidResolution(raw.to_string());

        let body = raw.trim().strip_prefix('P').ok_or_else(invalid)?;
        let (date_part, time_part) = match body.split_once('T') {
            Some((date, time)) if !time.is_empty() => (date, Some(time)),
            Some(_) => return Err(invalid()),
            None => (body, None),
        };
        if date_part.is_empty() && time_part.is_none() {
            return Err(invalid());
        }

        let mut months: u32 = 0;
        let mut fixed = Duration::zero();

        for (value, unit) in components(date_part).ok_or_else(invalid)? {
            match unit {
                'Y' => {
                    months = value
                        .checked_mul(12)
                        .and_then(|years| months.checked_add(years))
                        .ok_or_else(invalid)?;
                }
                'M' => months = months.checked_add(value).ok_or_else(invalid)?,
                'W' => fixed = add_fixed(fixed, Duration::try_weeks(value.into()), invalid)?,
                'D' => fixed = add_fixed(fixed, Duration::try_days(value.into()), invalid)?,
                _ => return Err(invalid()),
            }
        }

        if let Some(time_part) = time_part {
            for (value, unit) in components(time_part).ok_or_else(invalid)? {
                match unit {
                    'H' => fixed = add_fixed(fixed, Duration::try_hours(value.into()), invalid)?,
                    'M' => fixed = add_fixed(fixed, Duration::try_minutes(value.into()), invalid)?,
                    'S' => fixed = add_fixed(fixed, Duration::try_seconds(value.into()), invalid)?,
                    _ => return Err(invalid()),
                }
            }
        }

        if months == 0 && fixed == Duration::zero() {
            return Err(invalid());
        }
        Ok(Self { months, fixed })
    }
}

/// `fixed + part`, failing when the part or the sum is out of range
fn add_fixed<E>(
    fixed: Duration,
    part: Option<Duration>,
    invalid: impl Fn() -> E,
) -> Result<Duration, E> {
    part.and_then(|part| fixed.checked_add(&part))
        .ok_or_else(invalid)
}

/// Split `1D12H` style text into `(number, unit)` pairs
fn components(text: &str) -> Option<Vec<(u32, char)>> {
    let mut parts = Vec::new();
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else {
            if digits.is_empty() {
                return None;
            }
            parts.push((digits.parse().ok()?, c));
            digits.clear();
        }
    }
    digits.is_empty().then_some(parts)
}

/// Parse an RFC 3339 or `YYYY-MM-DDTHH:MMZ` start time
pub fn parse_start(raw: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
        .map_err(|_| TimestampError::InvalidStart(raw.to_string()))
}

/// Instant of the point at `position` (1-based), as RFC 3339
pub fn calculate_timestamp(
    start: &str,
    resolution: &str,
    position: i64,
    edge: IntervalEdge,
) -> Result<String, TimestampError> {
    let start = parse_start(start)?;
    let resolution: Resolution = resolution.parse()?;
    if position < 1 {
        return Err(TimestampError::InvalidPosition(position.to_string()));
    }

    let steps = match edge {
        IntervalEdge::Start => position - 1,
        IntervalEdge::End => position,
    };
    let steps = u32::try_from(steps)
        .map_err(|_| TimestampError::InvalidPosition(position.to_string()))?;

    resolution
        .advance(start, steps)
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        .ok_or(TimestampError::OutOfRange)
}

/// Which record fields feed the calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFields {
    /// Matched exactly or as a key suffix
    pub start: String,
    pub resolution: String,
    pub position: String,
    /// Field written to
    pub timestamp: String,
    pub edge: IntervalEdge,
}

impl Default for TimestampFields {
    fn default() -> Self {
        Self {
            start: "period.time_interval.start".to_string(),
            resolution: "period.resolution".to_string(),
            position: "period.point.position".to_string(),
            timestamp: "timestamp".to_string(),
            edge: IntervalEdge::Start,
        }
    }
}

impl TimestampFields {
    pub fn with_edge(mut self, edge: IntervalEdge) -> Self {
        self.edge = edge;
        self
    }
}

/// Key equal to `field`, or else the first key ending with it
pub fn find_field_key<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record
        .keys()
        .find(|key| key.as_str() == field)
        .or_else(|| record.keys().find(|key| key.ends_with(field)))
        .map(String::as_str)
}

fn position_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn record_timestamp(
    record: &Record,
    keys: (&str, &str, &str),
    edge: IntervalEdge,
) -> Result<String, TimestampError> {
    let (start, resolution, position) = (&record[keys.0], &record[keys.1], &record[keys.2]);

    let start_text = start
        .as_str()
        .ok_or_else(|| TimestampError::InvalidStart(start.to_string()))?;
    let resolution_text = resolution
        .as_str()
        .ok_or_else(|| TimestampError::InvalidResolution(resolution.to_string()))?;
    let position = position_value(position)
        .ok_or_else(|| TimestampError::InvalidPosition(position.to_string()))?;

    calculate_timestamp(start_text, resolution_text, position, edge)
}

/// Add a timestamp field to every record that carries the period fields
///
/// Records missing a field pass through unchanged; records whose values fail
/// to parse are logged and passed through unchanged.
pub fn add_timestamps(records: Vec<Record>, fields: &TimestampFields) -> Vec<Record> {
    let mut missing_logged = false;

    records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            let found = [
                find_field_key(&record, &fields.start).map(str::to_string),
                find_field_key(&record, &fields.resolution).map(str::to_string),
                find_field_key(&record, &fields.position).map(str::to_string),
            ];

            let [Some(start), Some(resolution), Some(position)] = &found else {
                if !missing_logged {
                    let missing: Vec<&str> = found
                        .iter()
                        .zip([&fields.start, &fields.resolution, &fields.position])
                        .filter(|(key, _)| key.is_none())
                        .map(|(_, field)| field.as_str())
                        .collect();
                    let available: Vec<&String> = record.keys().take(3).collect();
                    debug!(
                        "Skipping timestamp calculation: missing required fields: {:?}. Available keys: {:?}...",
                        missing, available
                    );
                    missing_logged = true;
                }
                return record;
            };

            let keys = (start.as_str(), resolution.as_str(), position.as_str());
            match record_timestamp(&record, keys, fields.edge) {
                Ok(timestamp) => {
                    record.insert(fields.timestamp.clone(), Value::String(timestamp));
                }
                Err(e) => {
                    warn!(
                        "Failed to calculate timestamp for record {}: {}. Values: start={}, resolution={}, position={}",
                        index,
                        e,
                        record[start.as_str()],
                        record[resolution.as_str()],
                        record[position.as_str()]
                    );
                }
            }
            record
        })
        .collect()
}
