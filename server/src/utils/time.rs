//! Time utility functions

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name, falling back to UTC
pub fn parse_timezone(tz: Option<&str>) -> Tz {
    tz.and_then(|s| s.trim().parse::<Tz>().ok())
        .unwrap_or(chrono_tz::UTC)
}

/// Convert Unix seconds to DateTime<Utc>
pub fn unix_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(|| {
        tracing::warn!(secs, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Convert Unix seconds to a wall-clock time in `tz`
pub fn unix_to_local(secs: i64, tz: &Tz) -> DateTime<Tz> {
    unix_to_datetime(secs).with_timezone(tz)
}
