//! Resolution of human-readable expirations into Unix timestamps

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::{UploadcareError, UploadcareResult};

/// Matches relative expirations such as `in 30m` or `in 3 days`
static RELATIVE_EXPIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^in\s+(\d+)\s*([a-z]+)$").expect("relative expire pattern is valid")
});

/// Naive date-time layouts accepted for absolute expirations, read as UTC
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Date-only layout, read as UTC midnight
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Expiration of a secure upload signature.
///
/// Either an absolute Unix timestamp, or a string that is resolved when the
/// request is signed:
/// - `"in <N> <unit>"` with seconds, minutes, hours, days or weeks (`"in 30m"`, `"in 3 days"`)
/// - an RFC 3339 date (`"2030-01-01T00:00:00+02:00"`)
/// - `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`, all in UTC
/// - a decimal Unix timestamp (`"1893456000"`)
#[derive(Debug, Clone, PartialEq)]
pub enum Expire {
    /// Absolute Unix timestamp in seconds
    Timestamp(f64),
    /// Relative or absolute expiration string
    Text(String),
}

impl Expire {
    /// Resolves the expiration against `now`, returning a Unix timestamp in seconds.
    ///
    /// Fractional timestamps are truncated.
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::InvalidExpiration` when the value is not in a recognized format
    pub fn resolve_at(&self, now: DateTime<Utc>) -> UploadcareResult<i64> {
        match self {
            Self::Timestamp(ts) => timestamp_from_f64(*ts),
            Self::Text(text) => resolve_text(text.trim(), now),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn timestamp_from_f64(ts: f64) -> UploadcareResult<i64> {
    if !ts.is_finite() || ts.abs() >= 9.0e15 {
        return Err(UploadcareError::InvalidExpiration(format!(
            "timestamp out of range: {ts}"
        )));
    }
    Ok(ts.trunc() as i64)
}

fn resolve_text(text: &str, now: DateTime<Utc>) -> UploadcareResult<i64> {
    if let Ok(ts) = text.parse::<f64>() {
        return timestamp_from_f64(ts);
    }

    if let Some(captures) = RELATIVE_EXPIRE.captures(text) {
        let amount: i64 = captures[1].parse().map_err(|_| {
            UploadcareError::InvalidExpiration(format!("amount out of range: {text}"))
        })?;
        let unit_secs = unit_seconds(&captures[2]).ok_or_else(|| {
            UploadcareError::InvalidExpiration(format!("unknown time unit in: {text}"))
        })?;
        return amount
            .checked_mul(unit_secs)
            .and_then(|offset| now.timestamp().checked_add(offset))
            .ok_or_else(|| {
                UploadcareError::InvalidExpiration(format!("offset out of range: {text}"))
            });
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Ok(datetime.timestamp());
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(datetime.and_utc().timestamp());
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc().timestamp());
    }

    Err(UploadcareError::InvalidExpiration(format!(
        "unrecognized expiration: {text:?}"
    )))
}

fn unit_seconds(unit: &str) -> Option<i64> {
    match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(60 * 60),
        "d" | "day" | "days" => Some(24 * 60 * 60),
        "w" | "week" | "weeks" => Some(7 * 24 * 60 * 60),
        _ => None,
    }
}

impl fmt::Display for Expire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Expire {
    #[allow(clippy::cast_precision_loss)]
    fn from(ts: i64) -> Self {
        Self::Timestamp(ts as f64)
    }
}

impl From<i32> for Expire {
    fn from(ts: i32) -> Self {
        Self::Timestamp(f64::from(ts))
    }
}

impl From<u32> for Expire {
    fn from(ts: u32) -> Self {
        Self::Timestamp(f64::from(ts))
    }
}

impl From<f64> for Expire {
    fn from(ts: f64) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<&str> for Expire {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Expire {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}
