use crate::error::ArcError;
use crate::model::{BodyMetrics, Db, ProgressAggregate, WeightSnapshot};
use crate::streak::StreakSummary;

/// Partial update of a progress row: `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressPatch {
    pub current_daily_streak: Option<u32>,
    pub longest_daily_streak: Option<u32>,
    pub current_weekly_streak: Option<u32>,
    pub longest_weekly_streak: Option<u32>,
    pub total_days_completed: Option<u32>,
    pub total_weeks_completed: Option<u32>,
    pub three_min_timer_completions: Option<u32>,
    pub total_timer_minutes: Option<u32>,
    pub leaderboard_score: Option<u64>,
    pub show_on_leaderboard: Option<bool>,
    pub body: BodyMetrics,
}

impl ProgressPatch {
    pub fn daily_streak(s: StreakSummary) -> Self {
        Self {
            current_daily_streak: Some(s.current_streak),
            longest_daily_streak: Some(s.longest_streak),
            total_days_completed: Some(s.total_completed),
            ..Self::default()
        }
    }

    pub fn weekly_streak(s: StreakSummary) -> Self {
        Self {
            current_weekly_streak: Some(s.current_streak),
            longest_weekly_streak: Some(s.longest_streak),
            total_weeks_completed: Some(s.total_completed),
            ..Self::default()
        }
    }

    pub fn score(score: u64) -> Self {
        Self {
            leaderboard_score: Some(score),
            ..Self::default()
        }
    }

    pub fn timer(completions: u32, minutes: u32) -> Self {
        Self {
            three_min_timer_completions: Some(completions),
            total_timer_minutes: Some(minutes),
            ..Self::default()
        }
    }
}

/// The fields a user may set directly. Streaks, totals, timer counters and the
/// score are derived and have no setter here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub body: BodyMetrics,
    pub show_on_leaderboard: Option<bool>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ArcError> {
        let positive = [
            ("weight", self.body.current_weight_kg),
            ("height", self.body.height_cm),
        ];
        for (label, v) in positive {
            if let Some(v) = v {
                if !v.is_finite() || v <= 0.0 {
                    return Err(ArcError::usage(format!("Invalid {}: {}", label, v)));
                }
            }
        }

        let non_negative = [
            ("bmr", self.body.bmr),
            ("tdee", self.body.tdee),
            ("target calories", self.body.target_calories),
            ("protein", self.body.protein_g),
            ("carbs", self.body.carbs_g),
            ("fat", self.body.fat_g),
        ];
        for (label, v) in non_negative {
            if let Some(v) = v {
                if !v.is_finite() || v < 0.0 {
                    return Err(ArcError::usage(format!("Invalid {}: {}", label, v)));
                }
            }
        }

        Ok(())
    }

    pub fn into_patch(self) -> ProgressPatch {
        ProgressPatch {
            show_on_leaderboard: self.show_on_leaderboard,
            body: self.body,
            ..ProgressPatch::default()
        }
    }
}

fn overwrite<T: Clone>(dst: &mut T, src: &Option<T>) {
    if let Some(v) = src {
        *dst = v.clone();
    }
}

fn overwrite_opt<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if src.is_some() {
        *dst = src.clone();
    }
}

fn merge_body(dst: &mut BodyMetrics, src: &BodyMetrics) {
    overwrite_opt(&mut dst.mission_statement, &src.mission_statement);
    overwrite_opt(&mut dst.current_weight_kg, &src.current_weight_kg);
    overwrite_opt(&mut dst.height_cm, &src.height_cm);
    overwrite_opt(&mut dst.age, &src.age);
    overwrite_opt(&mut dst.gender, &src.gender);
    overwrite_opt(&mut dst.activity_level, &src.activity_level);
    overwrite_opt(&mut dst.goal, &src.goal);
    overwrite_opt(&mut dst.bmr, &src.bmr);
    overwrite_opt(&mut dst.tdee, &src.tdee);
    overwrite_opt(&mut dst.target_calories, &src.target_calories);
    overwrite_opt(&mut dst.protein_g, &src.protein_g);
    overwrite_opt(&mut dst.carbs_g, &src.carbs_g);
    overwrite_opt(&mut dst.fat_g, &src.fat_g);
}

pub fn apply_patch(p: &mut ProgressAggregate, patch: &ProgressPatch) {
    overwrite(&mut p.current_daily_streak, &patch.current_daily_streak);
    overwrite(&mut p.longest_daily_streak, &patch.longest_daily_streak);
    overwrite(&mut p.current_weekly_streak, &patch.current_weekly_streak);
    overwrite(&mut p.longest_weekly_streak, &patch.longest_weekly_streak);
    overwrite(&mut p.total_days_completed, &patch.total_days_completed);
    overwrite(&mut p.total_weeks_completed, &patch.total_weeks_completed);
    overwrite(&mut p.three_min_timer_completions, &patch.three_min_timer_completions);
    overwrite(&mut p.total_timer_minutes, &patch.total_timer_minutes);
    overwrite(&mut p.leaderboard_score, &patch.leaderboard_score);
    overwrite(&mut p.show_on_leaderboard, &patch.show_on_leaderboard);
    merge_body(&mut p.body, &patch.body);
}

pub fn get_progress(db: &Db, user_id: &str, program_id: u32) -> Option<ProgressAggregate> {
    db.progress
        .iter()
        .find(|p| p.user_id == user_id && p.program_id == program_id)
        .cloned()
}

pub fn upsert_progress(
    db: &mut Db,
    user_id: &str,
    program_id: u32,
    patch: &ProgressPatch,
) -> ProgressAggregate {
    let idx = match db
        .progress
        .iter()
        .position(|p| p.user_id == user_id && p.program_id == program_id)
    {
        Some(i) => i,
        None => {
            db.progress.push(ProgressAggregate::new(user_id, program_id));
            db.progress.len() - 1
        }
    };

    apply_patch(&mut db.progress[idx], patch);
    db.progress[idx].clone()
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WeightSample {
    pub taken_ts: String,
    pub weight_kg: f64,
}

fn next_snapshot_id(db: &mut Db) -> String {
    let n = db.meta.next_snapshot_number;
    db.meta.next_snapshot_number = n + 1;
    format!("w{:06}", n)
}

pub fn record_snapshot(
    db: &mut Db,
    user_id: &str,
    program_id: u32,
    weight_kg: f64,
    notes: Option<&str>,
    ts: &str,
) -> Result<WeightSnapshot, ArcError> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(ArcError::usage(format!("Invalid weight: {}", weight_kg)));
    }

    let snapshot = WeightSnapshot {
        id: next_snapshot_id(db),
        user_id: user_id.to_string(),
        program_id,
        weight_kg,
        notes: notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        taken_ts: ts.to_string(),
    };
    db.snapshots.push(snapshot.clone());
    Ok(snapshot)
}

fn user_snapshots_oldest_first<'a>(db: &'a Db, user_id: &str, program_id: u32) -> Vec<&'a WeightSnapshot> {
    let mut out: Vec<&WeightSnapshot> = db
        .snapshots
        .iter()
        .filter(|s| s.user_id == user_id && s.program_id == program_id)
        .collect();
    out.sort_by(|a, b| a.taken_ts.cmp(&b.taken_ts).then_with(|| a.id.cmp(&b.id)));
    out
}

pub fn list_snapshots(db: &Db, user_id: &str, program_id: u32, limit: usize) -> Vec<WeightSnapshot> {
    user_snapshots_oldest_first(db, user_id, program_id)
        .into_iter()
        .rev()
        .take(limit)
        .cloned()
        .collect()
}

pub fn weight_samples(db: &Db, user_id: &str, program_id: u32) -> Vec<WeightSample> {
    user_snapshots_oldest_first(db, user_id, program_id)
        .into_iter()
        .map(|s| WeightSample {
            taken_ts: s.taken_ts.clone(),
            weight_kg: s.weight_kg,
        })
        .collect()
}
