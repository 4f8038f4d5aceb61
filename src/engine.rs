//! Update flows of the gamification core.
//!
//! Every flow reads authoritative state through `ArcStore`, runs the pure
//! calculators and writes the results back. Writes are idempotent overwrites
//! or insert-if-absent, so repeating a flow converges on the same state.
//! Within one refresh, achievements run before the score because the score
//! counts unlocked achievements.

use crate::achievements::{self, AchievementDefinition, CATALOG};
use crate::error::ArcError;
use crate::leaderboard::{context_window, LeaderboardContext, LeaderboardEntry};
use crate::model::{CompletionRecord, ProgressAggregate, Suggestion};
use crate::period::{IsoWeek, PeriodKind};
use crate::progress::{ProfileUpdate, ProgressPatch};
use crate::score::{leaderboard_score, ScoreInputs};
use crate::store::ArcStore;
use crate::streak::{daily_streak, weekly_streak, StreakSummary};
use crate::suggestions::{evaluate_triggers, RecentAchievement, TriggerInput, WeightHistory};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RefreshOutcome {
    pub newly_unlocked: Vec<String>,
    pub leaderboard_score: Option<u64>,
    pub new_suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChecklistOutcome {
    pub record: CompletionRecord,
    /// Present only when the update changed the record's completion state.
    pub streak: Option<StreakSummary>,
    pub refresh: RefreshOutcome,
}

pub fn recompute_daily_streak<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    today: NaiveDate,
) -> Result<StreakSummary, ArcError> {
    let days = store.list_completed_days(user_id, program_id)?;
    let summary = daily_streak(days, today);
    store.upsert_progress(user_id, program_id, &ProgressPatch::daily_streak(summary))?;
    debug!(user_id, program_id, ?summary, "daily streak recomputed");
    Ok(summary)
}

pub fn recompute_weekly_streak<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    today: NaiveDate,
) -> Result<StreakSummary, ArcError> {
    let weeks = store.list_completed_weeks(user_id, program_id)?;
    let summary = weekly_streak(weeks, today);
    store.upsert_progress(user_id, program_id, &ProgressPatch::weekly_streak(summary))?;
    debug!(user_id, program_id, ?summary, "weekly streak recomputed");
    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
fn update_checklist<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    kind: PeriodKind,
    period: &str,
    updates: &BTreeMap<String, bool>,
    today: NaiveDate,
    ts: &str,
) -> Result<ChecklistOutcome, ArcError> {
    let change = store.upsert_completion(user_id, program_id, kind, period, updates, ts)?;

    let streak = if change.completion_changed() {
        info!(
            user_id,
            program_id,
            kind = kind.as_str(),
            period,
            completed = change.record.is_fully_completed,
            "checklist completion changed"
        );
        let summary = match kind {
            PeriodKind::Daily => recompute_daily_streak(store, user_id, program_id, today)?,
            PeriodKind::Weekly => recompute_weekly_streak(store, user_id, program_id, today)?,
        };
        Some(summary)
    } else {
        None
    };

    let refresh = refresh_after_progress(store, user_id, program_id, ts)?;

    Ok(ChecklistOutcome {
        record: change.record,
        streak,
        refresh,
    })
}

pub fn update_daily_checklist<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    date: NaiveDate,
    updates: &BTreeMap<String, bool>,
    today: NaiveDate,
    ts: &str,
) -> Result<ChecklistOutcome, ArcError> {
    if date > today {
        return Err(ArcError::usage(format!("Cannot update a future date: {}", date)));
    }
    let period = date.to_string();
    update_checklist(store, user_id, program_id, PeriodKind::Daily, &period, updates, today, ts)
}

pub fn update_weekly_checklist<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    week: IsoWeek,
    updates: &BTreeMap<String, bool>,
    today: NaiveDate,
    ts: &str,
) -> Result<ChecklistOutcome, ArcError> {
    if week > IsoWeek::containing(today) {
        return Err(ArcError::usage(format!("Cannot update a future week: {}", week)));
    }
    let period = week.to_string();
    update_checklist(store, user_id, program_id, PeriodKind::Weekly, &period, updates, today, ts)
}

pub fn check_achievements<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    ts: &str,
) -> Result<Vec<&'static AchievementDefinition>, ArcError> {
    let progress = match store.get_progress(user_id, program_id)? {
        Some(p) => p,
        None => return Ok(Vec::new()),
    };
    let unlocked = store.list_unlocked_achievement_codes(user_id, program_id)?;

    let mut out = Vec::new();
    for def in achievements::newly_qualified(&progress, CATALOG, &unlocked) {
        // A concurrent writer may have unlocked it since we read the set.
        if store.unlock_achievement(user_id, program_id, def.code, ts)? {
            info!(user_id, program_id, code = def.code, "achievement unlocked");
            out.push(def);
        }
    }
    Ok(out)
}

/// Recomputes and stores the score. `None` when the user has no progress row.
pub fn refresh_score<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
) -> Result<Option<u64>, ArcError> {
    let progress = match store.get_progress(user_id, program_id)? {
        Some(p) => p,
        None => return Ok(None),
    };
    let count = store.list_unlocked_achievement_codes(user_id, program_id)?.len() as u32;

    let score = leaderboard_score(&ScoreInputs::from_progress(&progress, count));
    store.upsert_progress(user_id, program_id, &ProgressPatch::score(score))?;
    debug!(user_id, program_id, score, "leaderboard score refreshed");
    Ok(Some(score))
}

pub fn check_suggestions<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    ts: &str,
) -> Result<Vec<Suggestion>, ArcError> {
    let progress = match store.get_progress(user_id, program_id)? {
        Some(p) => p,
        None => return Ok(Vec::new()),
    };
    let active = store.list_active_suggestion_types(user_id, program_id)?;
    let suggested = store.list_suggestion_types(user_id, program_id)?;
    let samples = store.get_weight_history(user_id, program_id)?;
    let latest_code = store.latest_unlocked_achievement(user_id, program_id)?;

    let latest = latest_code.as_deref().map(|code| RecentAchievement {
        code,
        name: achievements::find(code).map(|d| d.name).unwrap_or(code),
    });

    let drafts = evaluate_triggers(&TriggerInput {
        progress: &progress,
        weight: WeightHistory::from_samples(&samples, progress.body.current_weight_kg),
        latest_achievement: latest,
        active_types: &active,
        suggested_types: &suggested,
    });

    let mut created = Vec::new();
    for draft in drafts.iter() {
        if let Some(s) = store.create_suggestion(user_id, program_id, draft, ts)? {
            info!(user_id, program_id, suggestion_type = %s.suggestion_type, "suggestion created");
            created.push(s);
        }
    }
    Ok(created)
}

/// Achievements, then score, then suggestions.
pub fn refresh_after_progress<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    ts: &str,
) -> Result<RefreshOutcome, ArcError> {
    let unlocked = check_achievements(store, user_id, program_id, ts)?;
    let score = refresh_score(store, user_id, program_id)?;
    let new_suggestions = check_suggestions(store, user_id, program_id, ts)?;

    Ok(RefreshOutcome {
        newly_unlocked: unlocked.iter().map(|d| d.code.to_string()).collect(),
        leaderboard_score: score,
        new_suggestions,
    })
}

/// Recomputes both streaks for `today`, then runs the regular refresh.
pub fn refresh_progress<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    today: NaiveDate,
    ts: &str,
) -> Result<(ProgressAggregate, RefreshOutcome), ArcError> {
    recompute_daily_streak(store, user_id, program_id, today)?;
    recompute_weekly_streak(store, user_id, program_id, today)?;
    let outcome = refresh_after_progress(store, user_id, program_id, ts)?;
    let progress = store
        .get_progress(user_id, program_id)?
        .unwrap_or_else(|| ProgressAggregate::new(user_id, program_id));
    Ok((progress, outcome))
}

pub fn update_profile<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    update: ProfileUpdate,
    ts: &str,
) -> Result<(ProgressAggregate, RefreshOutcome), ArcError> {
    update.validate()?;
    store.upsert_progress(user_id, program_id, &update.into_patch())?;
    let outcome = refresh_after_progress(store, user_id, program_id, ts)?;
    let progress = store
        .get_progress(user_id, program_id)?
        .unwrap_or_else(|| ProgressAggregate::new(user_id, program_id));
    Ok((progress, outcome))
}

pub fn record_timer<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    minutes: u32,
    ts: &str,
) -> Result<(ProgressAggregate, RefreshOutcome), ArcError> {
    if minutes < 1 {
        return Err(ArcError::usage("Invalid minutes"));
    }

    let current = store
        .get_progress(user_id, program_id)?
        .unwrap_or_else(|| ProgressAggregate::new(user_id, program_id));
    let patch = ProgressPatch::timer(
        current.three_min_timer_completions.saturating_add(1),
        current.total_timer_minutes.saturating_add(minutes),
    );
    store.upsert_progress(user_id, program_id, &patch)?;

    let outcome = refresh_after_progress(store, user_id, program_id, ts)?;
    let progress = store
        .get_progress(user_id, program_id)?
        .unwrap_or_else(|| ProgressAggregate::new(user_id, program_id));
    Ok((progress, outcome))
}

/// The user's entry after refreshing their score.
pub fn leaderboard_position<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
) -> Result<Option<LeaderboardEntry>, ArcError> {
    refresh_score(store, user_id, program_id)?;
    store.get_rank(user_id, program_id)
}

pub fn leaderboard_context<S: ArcStore>(
    store: &mut S,
    user_id: &str,
    program_id: u32,
    size: u32,
) -> Result<LeaderboardContext, ArcError> {
    let entry = match leaderboard_position(store, user_id, program_id)? {
        Some(e) => e,
        None => return Ok(LeaderboardContext::default()),
    };

    let window = context_window(entry.rank, size);
    let entries_above = match window.above {
        Some(r) => store.get_ranked_window(program_id, r)?,
        None => Vec::new(),
    };
    let entries_below = match window.below {
        Some(r) => store.get_ranked_window(program_id, r)?,
        None => Vec::new(),
    };

    Ok(LeaderboardContext {
        user_entry: Some(entry),
        entries_above,
        entries_below,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BatchReport {
    pub program_id: u32,
    pub updated: u32,
    pub failed: u32,
}

/// Sequentially refreshes every score in a program. A failing user is logged
/// and skipped.
pub fn recalculate_program_scores<S: ArcStore>(store: &mut S, program_id: u32) -> Result<BatchReport, ArcError> {
    let mut report = BatchReport {
        program_id,
        updated: 0,
        failed: 0,
    };

    for user_id in store.list_program_users(program_id)? {
        match refresh_score(store, &user_id, program_id) {
            Ok(_) => report.updated += 1,
            Err(e) => {
                warn!(user_id = %user_id, program_id, error = %e, "score recalculation failed");
                report.failed += 1;
            }
        }
    }

    info!(program_id, updated = report.updated, failed = report.failed, "leaderboard scores recalculated");
    Ok(report)
}
