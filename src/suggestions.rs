//! Community post prompts fired on milestone crossings.
//!
//! A suggestion type is blocked only while an active (not dismissed, not
//! posted) suggestion of that type exists for the same user and program.

use crate::error::ArcError;
use crate::model::{Db, ProgressAggregate, Suggestion};
use crate::progress::WeightSample;
use serde_json::json;
use std::collections::BTreeSet;

pub const WEIGHT_MILESTONE_PCT: f64 = 5.0;
pub const WEIGHT_MILESTONE_TYPE: &str = "weight_milestone_5";

struct StreakMilestone {
    streak: u32,
    suggestion_type: &'static str,
    title: &'static str,
    message: &'static str,
}

const DAILY_MILESTONES: [StreakMilestone; 3] = [
    StreakMilestone {
        streak: 7,
        suggestion_type: "streak_7",
        title: "7-Day Streak!",
        message: "You've completed 7 days in a row! Share your progress and inspire others in the community.",
    },
    StreakMilestone {
        streak: 14,
        suggestion_type: "streak_14",
        title: "2-Week Warrior!",
        message: "14 days of consistency! Your discipline is showing. Share what's working for you.",
    },
    StreakMilestone {
        streak: 30,
        suggestion_type: "streak_30",
        title: "30-Day Champion!",
        message: "A full month of dedication! Share your transformation story with the community.",
    },
];

const WEEKLY_MILESTONES: [StreakMilestone; 1] = [StreakMilestone {
    streak: 4,
    suggestion_type: "weekly_streak_4",
    title: "Monthly Momentum!",
    message: "4 perfect weeks! You're in the zone. Share your weekly routine with others.",
}];

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SuggestionDraft {
    pub suggestion_type: String,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightHistory {
    pub first_kg: f64,
    pub current_kg: f64,
}

impl WeightHistory {
    /// `first` is the oldest sample; `current` is the profile weight when set,
    /// otherwise the newest sample.
    pub fn from_samples(samples: &[WeightSample], profile_weight: Option<f64>) -> Option<Self> {
        let first = samples.first()?;
        let current = profile_weight.or_else(|| samples.last().map(|s| s.weight_kg))?;
        Some(Self {
            first_kg: first.weight_kg,
            current_kg: current,
        })
    }

    /// Relative change in percent, sign-agnostic.
    pub fn change_pct(&self) -> Option<f64> {
        if !self.first_kg.is_finite() || self.first_kg <= 0.0 {
            return None;
        }
        Some(((self.current_kg - self.first_kg) / self.first_kg * 100.0).abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentAchievement<'a> {
    pub code: &'a str,
    pub name: &'a str,
}

pub fn achievement_suggestion_type(code: &str) -> String {
    format!("achievement_{}", code)
}

pub struct TriggerInput<'a> {
    pub progress: &'a ProgressAggregate,
    pub weight: Option<WeightHistory>,
    pub latest_achievement: Option<RecentAchievement<'a>>,
    pub active_types: &'a BTreeSet<String>,
    /// Every type ever created for the user, dismissed and posted included.
    pub suggested_types: &'a BTreeSet<String>,
}

fn milestone_draft(m: &StreakMilestone, metadata: serde_json::Value) -> SuggestionDraft {
    SuggestionDraft {
        suggestion_type: m.suggestion_type.to_string(),
        title: m.title.to_string(),
        message: m.message.to_string(),
        metadata,
    }
}

/// Suggestions to create now. Streak milestones match the exact streak value.
/// An achievement is suggested once ever; the weight rule only checks the
/// active set, so a dismissed weight milestone returns while the change holds.
pub fn evaluate_triggers(input: &TriggerInput<'_>) -> Vec<SuggestionDraft> {
    let is_active = |t: &str| input.active_types.contains(t);
    let mut out: Vec<SuggestionDraft> = Vec::new();

    let daily = input.progress.current_daily_streak;
    for m in DAILY_MILESTONES.iter() {
        if daily == m.streak && !is_active(m.suggestion_type) {
            out.push(milestone_draft(m, json!({ "streak_days": m.streak })));
        }
    }

    let weekly = input.progress.current_weekly_streak;
    for m in WEEKLY_MILESTONES.iter() {
        if weekly == m.streak && !is_active(m.suggestion_type) {
            out.push(milestone_draft(m, json!({ "streak_weeks": m.streak })));
        }
    }

    if let Some(history) = input.weight {
        if let Some(pct) = history.change_pct() {
            if pct >= WEIGHT_MILESTONE_PCT && !is_active(WEIGHT_MILESTONE_TYPE) {
                out.push(SuggestionDraft {
                    suggestion_type: WEIGHT_MILESTONE_TYPE.to_string(),
                    title: "Major Progress!".to_string(),
                    message: format!(
                        "You've achieved a {:.1}% change! Share your journey with the community.",
                        pct
                    ),
                    metadata: json!({
                        "weight_change_pct": (pct * 10.0).round() / 10.0,
                        "first_weight": history.first_kg,
                        "current_weight": history.current_kg,
                    }),
                });
            }
        }
    }

    if let Some(a) = input.latest_achievement {
        let suggestion_type = achievement_suggestion_type(a.code);
        if !input.suggested_types.contains(&suggestion_type) {
            out.push(SuggestionDraft {
                suggestion_type,
                title: format!("Achievement Unlocked: {}", a.name),
                message: format!("You just earned {}! Share your accomplishment.", a.name),
                metadata: json!({ "achievement_code": a.code }),
            });
        }
    }

    out
}

fn next_suggestion_id(db: &mut Db) -> String {
    let n = db.meta.next_suggestion_number;
    db.meta.next_suggestion_number = n + 1;
    format!("s{:06}", n)
}

fn is_owned(s: &Suggestion, user_id: &str, program_id: u32) -> bool {
    s.user_id == user_id && s.program_id == program_id
}

pub fn all_types(db: &Db, user_id: &str, program_id: u32) -> BTreeSet<String> {
    db.suggestions
        .iter()
        .filter(|s| is_owned(s, user_id, program_id))
        .map(|s| s.suggestion_type.clone())
        .collect()
}

pub fn active_types(db: &Db, user_id: &str, program_id: u32) -> BTreeSet<String> {
    db.suggestions
        .iter()
        .filter(|s| is_owned(s, user_id, program_id) && s.is_active())
        .map(|s| s.suggestion_type.clone())
        .collect()
}

/// Conditional insert: refuses when an active suggestion of the same type
/// already exists.
pub fn insert_if_inactive(
    db: &mut Db,
    user_id: &str,
    program_id: u32,
    draft: &SuggestionDraft,
    ts: &str,
) -> Option<Suggestion> {
    if active_types(db, user_id, program_id).contains(&draft.suggestion_type) {
        return None;
    }

    let suggestion = Suggestion {
        id: next_suggestion_id(db),
        user_id: user_id.to_string(),
        program_id,
        suggestion_type: draft.suggestion_type.clone(),
        title: draft.title.clone(),
        message: draft.message.clone(),
        metadata: draft.metadata.clone(),
        triggered_ts: ts.to_string(),
        is_dismissed: false,
        is_posted: false,
    };
    db.suggestions.push(suggestion.clone());
    Some(suggestion)
}

pub fn list_active(db: &Db, user_id: &str, program_id: u32) -> Vec<Suggestion> {
    let mut out: Vec<Suggestion> = db
        .suggestions
        .iter()
        .filter(|s| is_owned(s, user_id, program_id) && s.is_active())
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        b.triggered_ts
            .cmp(&a.triggered_ts)
            .then_with(|| b.id.cmp(&a.id))
    });
    out
}

fn find_owned_mut<'a>(
    db: &'a mut Db,
    user_id: &str,
    program_id: u32,
    id: &str,
) -> Result<&'a mut Suggestion, ArcError> {
    db.suggestions
        .iter_mut()
        .find(|s| s.id == id && is_owned(s, user_id, program_id))
        .ok_or_else(|| ArcError::not_found(format!("Suggestion not found: {}", id)))
}

pub fn dismiss(db: &mut Db, user_id: &str, program_id: u32, id: &str) -> Result<Suggestion, ArcError> {
    let s = find_owned_mut(db, user_id, program_id, id.trim())?;
    s.is_dismissed = true;
    Ok(s.clone())
}

pub fn mark_posted(db: &mut Db, user_id: &str, program_id: u32, id: &str) -> Result<Suggestion, ArcError> {
    let s = find_owned_mut(db, user_id, program_id, id.trim())?;
    s.is_posted = true;
    Ok(s.clone())
}
