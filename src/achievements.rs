//! Badge catalog and unlock evaluation.
//!
//! Every predicate is a threshold over a single progress counter, so once a
//! badge qualifies it stays qualified while progress only grows.

use crate::model::{Db, ProgressAggregate, UnlockedAchievement};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CurrentDailyStreak,
    CurrentWeeklyStreak,
    TotalDaysCompleted,
    TimerCompletions,
}

impl Metric {
    pub fn read(self, p: &ProgressAggregate) -> u32 {
        match self {
            Metric::CurrentDailyStreak => p.current_daily_streak,
            Metric::CurrentWeeklyStreak => p.current_weekly_streak,
            Metric::TotalDaysCompleted => p.total_days_completed,
            Metric::TimerCompletions => p.three_min_timer_completions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct AchievementDefinition {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub metric: Metric,
    pub threshold: u32,
}

impl AchievementDefinition {
    pub fn is_met(&self, p: &ProgressAggregate) -> bool {
        self.metric.read(p) >= self.threshold
    }
}

const fn def(
    code: &'static str,
    name: &'static str,
    description: &'static str,
    metric: Metric,
    threshold: u32,
) -> AchievementDefinition {
    AchievementDefinition {
        code,
        name,
        description,
        metric,
        threshold,
    }
}

pub const CATALOG: &[AchievementDefinition] = &[
    def(
        "FIRST_DAY",
        "First Day",
        "Completed your first full daily checklist.",
        Metric::CurrentDailyStreak,
        1,
    ),
    def(
        "WEEK_WARRIOR",
        "Week Warrior",
        "Kept a 7-day daily streak.",
        Metric::CurrentDailyStreak,
        7,
    ),
    def(
        "FORTNIGHT_FORCE",
        "Fortnight Force",
        "Kept a 14-day daily streak.",
        Metric::CurrentDailyStreak,
        14,
    ),
    def(
        "MONTH_MASTER",
        "Month Master",
        "Kept a 30-day daily streak.",
        Metric::CurrentDailyStreak,
        30,
    ),
    def(
        "PERFECT_WEEK",
        "Perfect Week",
        "Completed a full weekly checklist.",
        Metric::CurrentWeeklyStreak,
        1,
    ),
    def(
        "MONTHLY_MOMENTUM",
        "Monthly Momentum",
        "Kept a 4-week weekly streak.",
        Metric::CurrentWeeklyStreak,
        4,
    ),
    def(
        "SILENCE_SEEKER",
        "Silence Seeker",
        "Finished the 3-minute timer 10 times.",
        Metric::TimerCompletions,
        10,
    ),
    def(
        "MEDITATION_MASTER",
        "Meditation Master",
        "Finished the 3-minute timer 50 times.",
        Metric::TimerCompletions,
        50,
    ),
    def(
        "CONSISTENCY_KING",
        "Consistency King",
        "Completed 30 daily checklists in total.",
        Metric::TotalDaysCompleted,
        30,
    ),
    def(
        "WINTER_WARRIOR",
        "Winter Warrior",
        "Completed 84 daily checklists in total, twelve full weeks.",
        Metric::TotalDaysCompleted,
        84,
    ),
];

pub fn find(code: &str) -> Option<&'static AchievementDefinition> {
    CATALOG.iter().find(|d| d.code == code)
}

/// Catalog entries whose predicate now holds and that are not unlocked yet,
/// in catalog order.
pub fn newly_qualified<'a>(
    progress: &ProgressAggregate,
    catalog: &'a [AchievementDefinition],
    unlocked: &BTreeSet<String>,
) -> Vec<&'a AchievementDefinition> {
    catalog
        .iter()
        .filter(|d| !unlocked.contains(d.code))
        .filter(|d| d.is_met(progress))
        .collect()
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AchievementProgress {
    pub code: String,
    pub name: String,
    pub description: String,
    pub unlocked: bool,
    pub current: u32,
    pub target: u32,
    pub percentage: u32,
}

pub fn progress_report(
    progress: Option<&ProgressAggregate>,
    catalog: &[AchievementDefinition],
    unlocked: &BTreeSet<String>,
) -> Vec<AchievementProgress> {
    catalog
        .iter()
        .map(|d| {
            let raw = progress.map(|p| d.metric.read(p)).unwrap_or(0);
            let current = raw.min(d.threshold);
            let percentage = if d.threshold == 0 {
                100
            } else {
                (u64::from(current) * 100 / u64::from(d.threshold)) as u32
            };
            AchievementProgress {
                code: d.code.to_string(),
                name: d.name.to_string(),
                description: d.description.to_string(),
                unlocked: unlocked.contains(d.code),
                current,
                target: d.threshold,
                percentage,
            }
        })
        .collect()
}

fn next_unlock_id(db: &mut Db) -> String {
    let n = db.meta.next_unlock_number;
    db.meta.next_unlock_number = n + 1;
    format!("a{:06}", n)
}

fn user_unlocks<'a>(
    db: &'a Db,
    user_id: &'a str,
    program_id: u32,
) -> impl Iterator<Item = &'a UnlockedAchievement> + 'a {
    db.unlocked_achievements
        .iter()
        .filter(move |u| u.user_id == user_id && u.program_id == program_id)
}

pub fn unlocked_codes(db: &Db, user_id: &str, program_id: u32) -> BTreeSet<String> {
    user_unlocks(db, user_id, program_id)
        .map(|u| u.code.clone())
        .collect()
}

/// Inserts the unlock unless the (user, program, code) triple already exists.
/// Returns whether a row was written.
pub fn insert_unlock(db: &mut Db, user_id: &str, program_id: u32, code: &str, ts: &str) -> bool {
    if user_unlocks(db, user_id, program_id).any(|u| u.code == code) {
        return false;
    }

    let row = UnlockedAchievement {
        id: next_unlock_id(db),
        user_id: user_id.to_string(),
        program_id,
        code: code.to_string(),
        unlocked_ts: ts.to_string(),
    };
    db.unlocked_achievements.push(row);
    true
}

/// The user's unlocks, newest first.
pub fn list_unlocked(db: &Db, user_id: &str, program_id: u32) -> Vec<UnlockedAchievement> {
    let mut out: Vec<UnlockedAchievement> = user_unlocks(db, user_id, program_id).cloned().collect();
    out.sort_by(|a, b| {
        b.unlocked_ts
            .cmp(&a.unlocked_ts)
            .then_with(|| b.id.cmp(&a.id))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_db;

    fn progress(daily: u32, weekly: u32, total_days: u32, timer: u32) -> ProgressAggregate {
        let mut p = ProgressAggregate::new("u1", 1);
        p.current_daily_streak = daily;
        p.current_weekly_streak = weekly;
        p.total_days_completed = total_days;
        p.three_min_timer_completions = timer;
        p
    }

    fn codes(defs: &[&AchievementDefinition]) -> Vec<&'static str> {
        defs.iter().map(|d| d.code).collect()
    }

    #[test]
    fn catalog_codes_are_unique() {
        let set: BTreeSet<&str> = CATALOG.iter().map(|d| d.code).collect();
        assert_eq!(set.len(), CATALOG.len());
        assert_eq!(CATALOG.len(), 10);
    }

    #[test]
    fn thresholds_unlock_in_catalog_order() {
        let p = progress(7, 1, 7, 10);
        let got = newly_qualified(&p, CATALOG, &BTreeSet::new());
        assert_eq!(
            codes(&got),
            vec!["FIRST_DAY", "WEEK_WARRIOR", "PERFECT_WEEK", "SILENCE_SEEKER"]
        );
    }

    #[test]
    fn second_evaluation_with_unlocked_set_is_empty() {
        let p = progress(14, 4, 30, 50);
        let first = newly_qualified(&p, CATALOG, &BTreeSet::new());
        assert!(!first.is_empty());

        let unlocked: BTreeSet<String> = first.iter().map(|d| d.code.to_string()).collect();
        assert!(newly_qualified(&p, CATALOG, &unlocked).is_empty());
    }

    #[test]
    fn zero_progress_unlocks_nothing() {
        let p = progress(0, 0, 0, 0);
        assert!(newly_qualified(&p, CATALOG, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn insert_unlock_is_idempotent() {
        let mut db = default_db();
        assert!(insert_unlock(&mut db, "u1", 1, "FIRST_DAY", "2026-10-16T08:00:00Z"));
        assert!(!insert_unlock(&mut db, "u1", 1, "FIRST_DAY", "2026-10-16T09:00:00Z"));
        assert!(insert_unlock(&mut db, "u1", 2, "FIRST_DAY", "2026-10-16T09:00:00Z"));
        assert_eq!(db.unlocked_achievements.len(), 2);
        assert_eq!(unlocked_codes(&db, "u1", 1).len(), 1);
    }

    #[test]
    fn report_caps_current_at_target() {
        let p = progress(9, 0, 9, 5);
        let mut unlocked = BTreeSet::new();
        unlocked.insert("WEEK_WARRIOR".to_string());

        let report = progress_report(Some(&p), CATALOG, &unlocked);
        let week = report.iter().find(|r| r.code == "WEEK_WARRIOR").unwrap();
        assert_eq!((week.current, week.target, week.percentage), (7, 7, 100));
        assert!(week.unlocked);

        let month = report.iter().find(|r| r.code == "MONTH_MASTER").unwrap();
        assert_eq!((month.current, month.percentage), (9, 30));

        let seeker = report.iter().find(|r| r.code == "SILENCE_SEEKER").unwrap();
        assert_eq!(seeker.percentage, 50);
    }

    #[test]
    fn report_without_progress_is_zeroed() {
        let report = progress_report(None, CATALOG, &BTreeSet::new());
        assert!(report.iter().all(|r| r.current == 0 && r.percentage == 0 && !r.unlocked));
    }
}
