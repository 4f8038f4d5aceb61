use crate::model::ProgressAggregate;

pub const DAILY_STREAK_POINTS: u64 = 10;
pub const WEEKLY_STREAK_POINTS: u64 = 50;
pub const DAY_COMPLETED_POINTS: u64 = 5;
pub const WEEK_COMPLETED_POINTS: u64 = 25;
pub const ACHIEVEMENT_POINTS: u64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreInputs {
    pub current_daily_streak: u32,
    pub current_weekly_streak: u32,
    pub total_days_completed: u32,
    pub total_weeks_completed: u32,
    pub achievement_count: u32,
}

impl ScoreInputs {
    pub fn from_progress(p: &ProgressAggregate, achievement_count: u32) -> Self {
        Self {
            current_daily_streak: p.current_daily_streak,
            current_weekly_streak: p.current_weekly_streak,
            total_days_completed: p.total_days_completed,
            total_weeks_completed: p.total_weeks_completed,
            achievement_count,
        }
    }
}

/// Always a full recomputation; never patch a stored score incrementally.
pub fn leaderboard_score(i: &ScoreInputs) -> u64 {
    u64::from(i.current_daily_streak) * DAILY_STREAK_POINTS
        + u64::from(i.current_weekly_streak) * WEEKLY_STREAK_POINTS
        + u64::from(i.total_days_completed) * DAY_COMPLETED_POINTS
        + u64::from(i.total_weeks_completed) * WEEK_COMPLETED_POINTS
        + u64::from(i.achievement_count) * ACHIEVEMENT_POINTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_weights_each_counter() {
        let i = ScoreInputs {
            current_daily_streak: 3,
            current_weekly_streak: 1,
            total_days_completed: 12,
            total_weeks_completed: 2,
            achievement_count: 2,
        };
        assert_eq!(leaderboard_score(&i), 30 + 50 + 60 + 50 + 200);
    }

    #[test]
    fn same_inputs_same_score() {
        let mut p = ProgressAggregate::new("u1", 1);
        p.current_daily_streak = 7;
        p.total_weeks_completed = 4;
        p.leaderboard_score = 999_999;

        let a = leaderboard_score(&ScoreInputs::from_progress(&p, 3));
        let b = leaderboard_score(&ScoreInputs::from_progress(&p, 3));
        assert_eq!(a, b);
        assert_eq!(a, 70 + 100 + 300);
    }

    #[test]
    fn empty_progress_scores_zero() {
        assert_eq!(leaderboard_score(&ScoreInputs::default()), 0);
    }
}
