/// Utility functions
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Round to the nearest whole degree, halves away from zero
pub fn round_temp(v: f64) -> i32 {
    v.round() as i32
}

/// Parse an Open-Meteo local timestamp (`2026-01-15T10:00`, seconds optional)
pub fn parse_local_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Fixed offset from a provider's `utc_offset_seconds`
pub fn fixed_offset(seconds: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(seconds)
}

/// Wall-clock time at the location
pub fn local_now(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    now.with_timezone(&offset).naive_local()
}

/// Attach an offset to a local timestamp
pub fn with_offset(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset.from_local_datetime(&local).single()
}

/// Index of the sample closest in time to `target`
pub fn nearest_index(times: &[NaiveDateTime], target: NaiveDateTime) -> Option<usize> {
    times
        .iter()
        .enumerate()
        .min_by_key(|(_, t)| (**t - target).num_seconds().abs())
        .map(|(i, _)| i)
}

/// Keep upstream error bodies short in logs and error messages
pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
