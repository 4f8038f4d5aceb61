use crate::error::ArcError;
use chrono::{DateTime, SecondsFormat, Utc};

/// Parses an RFC3339 timestamp with offset and re-renders it in UTC, so stored
/// timestamps compare correctly as strings.
pub fn normalize_rfc3339(ts: &str, label: &str) -> Result<String, ArcError> {
    let t = ts.trim();
    if t.is_empty() {
        return Err(ArcError::usage(format!("Invalid {}: (empty)", label)));
    }
    DateTime::parse_from_rfc3339(t)
        .map(|dt| format_utc(dt.with_timezone(&Utc)))
        .map_err(|_| ArcError::usage(format!("Invalid {}: {}", label, ts)))
}

pub fn system_now_utc() -> String {
    format_utc(Utc::now())
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
