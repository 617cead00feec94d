use chrono::{DateTime, TimeZone, Utc};
use time::OffsetDateTime;

pub fn millis_to_utc(ms: i64) -> OffsetDateTime {
    let nanos = i128::from(ms).saturating_mul(1_000_000);
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn to_offset(at: DateTime<Utc>) -> OffsetDateTime {
    millis_to_utc(at.timestamp_millis())
}

pub fn from_offset(at: OffsetDateTime) -> DateTime<Utc> {
    let ms = (at.unix_timestamp_nanos() / 1_000_000) as i64;
    from_millis(ms)
}

pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_default()
}

/// Empty strings are how ClickHouse stores an absent optional string.
pub fn none_if_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
