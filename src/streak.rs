use crate::period::{IsoWeek, Period};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completed: u32,
}

/// Derives streaks from an unordered set of completed periods.
///
/// The current streak is the length of the run that contains `current` or the
/// period right before it; any other run only counts toward the longest one.
/// Periods after `current` are ignored for every counter.
pub fn calculate_streak<P: Period>(
    completed: impl IntoIterator<Item = P>,
    current: P,
) -> StreakSummary {
    let mut periods: Vec<P> = completed.into_iter().filter(|p| *p <= current).collect();
    periods.sort_unstable_by(|a, b| b.cmp(a));
    periods.dedup();

    let anchor_prev = current.previous();

    let mut current_streak = 0u32;
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut run_is_current = false;
    let mut last: Option<P> = None;

    for p in periods.iter().copied() {
        let consecutive = last.and_then(|l| l.previous()) == Some(p);
        if consecutive {
            run += 1;
        } else {
            longest = longest.max(run);
            run = 1;
            run_is_current = false;
        }

        if p == current || Some(p) == anchor_prev {
            run_is_current = true;
        }
        if run_is_current {
            current_streak = run;
        }

        last = Some(p);
    }

    StreakSummary {
        current_streak,
        longest_streak: longest.max(run),
        total_completed: periods.len() as u32,
    }
}

pub fn daily_streak(completed: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> StreakSummary {
    calculate_streak(completed, today)
}

pub fn weekly_streak(completed: impl IntoIterator<Item = IsoWeek>, today: NaiveDate) -> StreakSummary {
    calculate_streak(completed, IsoWeek::containing(today))
}
