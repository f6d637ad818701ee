use chrono::{TimeZone, Utc};

/// Current server wall-clock time in Unix milliseconds
/// The single authority for expiry decisions; clients only ever use it to
/// cosmetically align countdown displays
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a millisecond timestamp as an ISO-8601 / RFC 3339 string in UTC
pub fn to_iso(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        None => String::new(),
    }
}
