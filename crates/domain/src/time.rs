//! Time and timestamp helpers.

use chrono::{DateTime, SecondsFormat, Utc};

/// UTC timestamp used for Alexa `timeOfSample` reporting.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// ISO-8601 with millisecond precision and a `Z` suffix, the shape Alexa
/// expects in `timeOfSample`.
#[must_use]
pub fn iso_millis(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
