//! `YYYYMMDDHHMM` integer datetimes and window arithmetic
//!
//! The platform encodes every period bound as a twelve digit integer in UTC.
//! Splitting a window produces contiguous chunks whose bounds are encoded the
//! same way, each ending `max_days` after its start except possibly the last.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

/// Period parsing errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeriodError {
    /// Value is not a valid `YYYYMMDDHHMM` datetime
    #[error("invalid period '{0}': expected YYYYMMDDHHMM")]
    Invalid(i64),

    /// Range ceiling of zero days
    #[error("max_days must be at least 1")]
    ZeroMaxDays,
}

/// Parse a `YYYYMMDDHHMM` integer
pub fn parse_period(value: i64) -> Result<NaiveDateTime, PeriodError> {
    if !(1000_01_01_00_00..=9999_12_31_23_59).contains(&value) {
        return Err(PeriodError::Invalid(value));
    }

    let year = (value / 100_000_000) as i32;
    let month = ((value / 1_000_000) % 100) as u32;
    let day = ((value / 10_000) % 100) as u32;
    let hour = ((value / 100) % 100) as u32;
    let minute = (value % 100) as u32;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .ok_or(PeriodError::Invalid(value))
}

/// Encode a datetime as `YYYYMMDDHHMM`
pub fn format_period(datetime: NaiveDateTime) -> i64 {
    i64::from(datetime.year()) * 100_000_000
        + i64::from(datetime.month()) * 1_000_000
        + i64::from(datetime.day()) * 10_000
        + i64::from(datetime.hour()) * 100
        + i64::from(datetime.minute())
}

/// Whole days between two bounds (partial days truncate)
pub fn span_days(start: i64, end: i64) -> Result<i64, PeriodError> {
    let start = parse_period(start)?;
    let end = parse_period(end)?;
    Ok((end - start).num_days())
}

/// Whether the window is strictly longer than `max_days`
pub fn exceeds_limit(start: i64, end: i64, max_days: u32) -> Result<bool, PeriodError> {
    Ok(span_days(start, end)? > i64::from(max_days))
}

/// Partition `[start, end]` into contiguous chunks of at most `max_days`
pub fn split_windows(start: i64, end: i64, max_days: u32) -> Result<Vec<(i64, i64)>, PeriodError> {
    if max_days == 0 {
        return Err(PeriodError::ZeroMaxDays);
    }

    let end_dt = parse_period(end)?;
    let step = Duration::days(i64::from(max_days));
    let mut current = parse_period(start)?;
    let mut windows = Vec::new();

    while current < end_dt {
        let next = (current + step).min(end_dt);
        windows.push((format_period(current), format_period(next)));
        current = next;
    }

    Ok(windows)
}
