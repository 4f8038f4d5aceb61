use crate::model::{Db, ProgressAggregate};

/// Inclusive, 1-based rank range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RankRange {
    pub start: u32,
    pub end: u32,
}

impl RankRange {
    pub fn new(start: u32, end: u32) -> Option<Self> {
        if start == 0 || start > end {
            None
        } else {
            Some(Self { start, end })
        }
    }

    pub fn contains(&self, rank: u32) -> bool {
        rank >= self.start && rank <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    pub above: Option<RankRange>,
    pub below: Option<RankRange>,
}

/// Ranks to fetch around `rank`: `[max(1, R-C), R-1]` above and `[R+1, R+C]` below.
pub fn context_window(rank: u32, size: u32) -> ContextWindow {
    if rank == 0 {
        return ContextWindow {
            above: None,
            below: None,
        };
    }

    let above_start = rank.saturating_sub(size).max(1);
    ContextWindow {
        above: RankRange::new(above_start, rank - 1),
        below: RankRange::new(rank.saturating_add(1), rank.saturating_add(size)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub leaderboard_score: u64,
    pub current_daily_streak: u32,
    pub current_weekly_streak: u32,
    pub total_days_completed: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct LeaderboardContext {
    pub user_entry: Option<LeaderboardEntry>,
    pub entries_above: Vec<LeaderboardEntry>,
    pub entries_below: Vec<LeaderboardEntry>,
}

/// Opted-in rows of a program, best score first. Ties go to the smaller
/// `user_id` so ranks are stable between calls.
pub fn ranked_view(db: &Db, program_id: u32) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<&ProgressAggregate> = db
        .progress
        .iter()
        .filter(|p| p.program_id == program_id && p.show_on_leaderboard)
        .collect();

    rows.sort_by(|a, b| {
        b.leaderboard_score
            .cmp(&a.leaderboard_score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    rows.into_iter()
        .enumerate()
        .map(|(i, p)| LeaderboardEntry {
            rank: i as u32 + 1,
            user_id: p.user_id.clone(),
            leaderboard_score: p.leaderboard_score,
            current_daily_streak: p.current_daily_streak,
            current_weekly_streak: p.current_weekly_streak,
            total_days_completed: p.total_days_completed,
        })
        .collect()
}

pub fn page(db: &Db, program_id: u32, limit: usize, offset: usize) -> Vec<LeaderboardEntry> {
    ranked_view(db, program_id)
        .into_iter()
        .skip(offset)
        .take(limit)
        .collect()
}
