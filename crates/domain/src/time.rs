//! Timestamps for property changes and hub events.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `last_changed` and event times.
pub type Timestamp = DateTime<Utc>;

/// Current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
