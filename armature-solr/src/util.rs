//! Small helpers shared across modules.

use chrono::{DateTime, TimeZone, Utc};

/// Render a timestamp in Solr's date syntax (`YYYY-MM-DDTHH:MM:SSZ`, UTC).
pub fn to_iso8601<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    date.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}
