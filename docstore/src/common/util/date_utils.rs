use chrono::{DateTime, SecondsFormat, Utc};

/// Current wall-clock time as a UTC date-time.
#[inline]
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Returns a timestamp strictly later than `previous`.
///
/// Wall clocks can step backwards or repeat a reading; document timestamps
/// must still move forward.
#[inline]
pub fn monotonic_after(previous: Option<&DateTime<Utc>>) -> DateTime<Utc> {
    let now = now_utc();
    match previous {
        Some(prev) if *prev >= now => *prev + chrono::Duration::nanoseconds(1),
        _ => now,
    }
}

/// RFC 3339 rendering with as many fractional digits as needed to round trip.
#[inline]
pub fn format_rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[inline]
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// Unix milliseconds, used to stamp quarantined files.
#[inline]
pub fn unix_millis() -> i64 {
    now_utc().timestamp_millis()
}
