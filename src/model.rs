use crate::period::PeriodKind;
use std::collections::BTreeMap;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Db {
    pub version: u32,
    pub meta: Meta,
    pub completions: Vec<CompletionRecord>,
    pub progress: Vec<ProgressAggregate>,
    pub unlocked_achievements: Vec<UnlockedAchievement>,
    pub snapshots: Vec<WeightSnapshot>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Meta {
    pub next_unlock_number: u32,
    pub next_snapshot_number: u32,
    pub next_suggestion_number: u32,
}

/// One checklist row per (user, program, kind, period).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompletionRecord {
    pub user_id: String,
    pub program_id: u32,
    pub kind: PeriodKind,
    /// `YYYY-MM-DD` for daily records, `YYYY-Www` for weekly ones.
    pub period: String,
    pub items: BTreeMap<String, bool>,
    pub is_fully_completed: bool,
    pub updated_ts: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BodyMetrics {
    pub mission_statement: Option<String>,
    pub current_weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    pub bmr: Option<f64>,
    pub tdee: Option<f64>,
    pub target_calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProgressAggregate {
    pub user_id: String,
    pub program_id: u32,
    pub current_daily_streak: u32,
    pub longest_daily_streak: u32,
    pub current_weekly_streak: u32,
    pub longest_weekly_streak: u32,
    pub total_days_completed: u32,
    pub total_weeks_completed: u32,
    #[serde(flatten)]
    pub body: BodyMetrics,
    pub three_min_timer_completions: u32,
    pub total_timer_minutes: u32,
    pub leaderboard_score: u64,
    pub show_on_leaderboard: bool,
}

impl ProgressAggregate {
    pub fn new(user_id: &str, program_id: u32) -> Self {
        Self {
            user_id: user_id.to_string(),
            program_id,
            current_daily_streak: 0,
            longest_daily_streak: 0,
            current_weekly_streak: 0,
            longest_weekly_streak: 0,
            total_days_completed: 0,
            total_weeks_completed: 0,
            body: BodyMetrics::default(),
            three_min_timer_completions: 0,
            total_timer_minutes: 0,
            leaderboard_score: 0,
            show_on_leaderboard: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnlockedAchievement {
    pub id: String,
    pub user_id: String,
    pub program_id: u32,
    pub code: String,
    pub unlocked_ts: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WeightSnapshot {
    pub id: String,
    pub user_id: String,
    pub program_id: u32,
    pub weight_kg: f64,
    pub notes: Option<String>,
    pub taken_ts: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub user_id: String,
    pub program_id: u32,
    pub suggestion_type: String,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Value,
    pub triggered_ts: String,
    pub is_dismissed: bool,
    pub is_posted: bool,
}

impl Suggestion {
    pub fn is_active(&self) -> bool {
        !self.is_dismissed && !self.is_posted
    }
}

pub fn default_db() -> Db {
    Db {
        version: 1,
        meta: Meta {
            next_unlock_number: 1,
            next_snapshot_number: 1,
            next_suggestion_number: 1,
        },
        completions: Vec::new(),
        progress: Vec::new(),
        unlocked_achievements: Vec::new(),
        snapshots: Vec::new(),
        suggestions: Vec::new(),
    }
}
