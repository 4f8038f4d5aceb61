use crate::error::ArcError;
use chrono::{Days, NaiveDate, Utc};

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str, label: &str) -> Result<NaiveDate, ArcError> {
    let ss = s.trim();
    let invalid = || ArcError::invalid_period_key(format!("Invalid {}: {}", label, s));

    // chrono's %Y alone would also accept signed and short years.
    let bytes = ss.as_bytes();
    if ss.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(ss, "%Y-%m-%d").map_err(|_| invalid())
}

pub fn add_days(date: NaiveDate, delta_days: i64) -> Result<NaiveDate, ArcError> {
    let moved = if delta_days >= 0 {
        date.checked_add_days(Days::new(delta_days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(delta_days.unsigned_abs()))
    };
    moved.ok_or_else(|| ArcError::invalid_period_key(format!("Date out of range: {}", date)))
}

pub fn check_range(from: NaiveDate, to: NaiveDate) -> Result<(), ArcError> {
    if from > to {
        return Err(ArcError::usage(format!("Invalid range: {} > {}", from, to)));
    }
    Ok(())
}

pub fn system_today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
