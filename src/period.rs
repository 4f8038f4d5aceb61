//! Period keys: calendar days and ISO weeks.
//!
//! Daily records are keyed by `YYYY-MM-DD`, weekly records by `YYYY-Www`.
//! Week arithmetic follows true ISO-8601 week numbering, so years with 53
//! weeks chain correctly into week 1 of the next year.

use crate::error::ArcError;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Daily,
    Weekly,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Daily => "daily",
            PeriodKind::Weekly => "weekly",
        }
    }
}

/// A unit of time that completion records are kept for.
pub trait Period: Copy + Ord + fmt::Display {
    /// The period immediately before this one, `None` at the edge of the calendar.
    fn previous(self) -> Option<Self>;
}

impl Period for NaiveDate {
    fn previous(self) -> Option<Self> {
        self.pred_opt()
    }
}

/// An ISO-8601 week, identified internally by its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoWeek {
    monday: NaiveDate,
}

impl IsoWeek {
    pub fn new(year: i32, week: u32) -> Result<Self, ArcError> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|monday| Self { monday })
            .ok_or_else(|| {
                ArcError::invalid_period_key(format!("Invalid ISO week: {}-W{:02}", year, week))
            })
    }

    pub fn containing(date: NaiveDate) -> Self {
        let back = u64::from(date.weekday().num_days_from_monday());
        Self {
            monday: date.checked_sub_days(Days::new(back)).unwrap_or(date),
        }
    }

    pub fn parse(s: &str) -> Result<Self, ArcError> {
        let ss = s.trim();
        let invalid = || ArcError::invalid_period_key(format!("Invalid week: {}", s));

        let (y, w) = ss.split_once("-W").ok_or_else(invalid)?;
        if y.len() != 4 || w.len() != 2 {
            return Err(invalid());
        }
        if !y.chars().chain(w.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = y.parse().map_err(|_| invalid())?;
        let week: u32 = w.parse().map_err(|_| invalid())?;
        Self::new(year, week)
    }

    pub fn year(&self) -> i32 {
        self.monday.iso_week().year()
    }

    pub fn week(&self) -> u32 {
        self.monday.iso_week().week()
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    pub fn sunday(&self) -> Option<NaiveDate> {
        self.monday.checked_add_days(Days::new(6))
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year(), self.week())
    }
}

impl Period for IsoWeek {
    fn previous(self) -> Option<Self> {
        self.monday
            .checked_sub_days(Days::new(7))
            .map(|monday| Self { monday })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        crate::date::parse_date(s, "date").unwrap()
    }

    #[test]
    fn containing_week_matches_iso_calendar() {
        let w = IsoWeek::containing(d("2026-01-31"));
        assert_eq!(w.to_string(), "2026-W05");
        assert_eq!(w.monday(), d("2026-01-26"));
        assert_eq!(w.sunday(), Some(d("2026-02-01")));

        // Jan 1 2027 is a Friday, so it still belongs to the last week of 2026.
        assert_eq!(IsoWeek::containing(d("2027-01-01")).to_string(), "2026-W53");
        assert_eq!(IsoWeek::containing(d("2026-01-01")).to_string(), "2026-W01");
    }

    #[test]
    fn week_53_only_exists_in_long_years() {
        assert!(IsoWeek::new(2020, 53).is_ok());
        assert!(IsoWeek::new(2026, 53).is_ok());
        assert!(IsoWeek::new(2021, 53).is_err());
        assert!(IsoWeek::new(2025, 0).is_err());
        assert!(IsoWeek::new(2025, 54).is_err());
    }

    #[test]
    fn previous_week_crosses_year_boundaries() {
        let w = IsoWeek::new(2021, 1).unwrap();
        assert_eq!(w.previous().unwrap().to_string(), "2020-W53");

        let w = IsoWeek::new(2026, 1).unwrap();
        assert_eq!(w.previous().unwrap().to_string(), "2025-W52");
    }

    #[test]
    fn parse_is_strict() {
        assert_eq!(IsoWeek::parse("2026-W05").unwrap(), IsoWeek::new(2026, 5).unwrap());
        assert!(IsoWeek::parse("2026-W5").is_err());
        assert!(IsoWeek::parse("2026W05").is_err());
        assert!(IsoWeek::parse("2021-W53").is_err());

        let err = IsoWeek::parse("abcd-W01").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidPeriodKey);
    }

    #[test]
    fn previous_day_is_one_calendar_day() {
        assert_eq!(d("2026-03-01").previous(), Some(d("2026-02-28")));
    }
}
