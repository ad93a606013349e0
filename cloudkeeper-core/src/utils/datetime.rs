//! Clock helpers.

use chrono::Utc;

/// Current time as epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time as an RFC 3339 string.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Current UTC date as `YYYY-MM-DD`.
#[must_use]
pub fn date_stamp() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}
