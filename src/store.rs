//! The persistence seam the gamification core reads and writes through.
//!
//! `Db` is the only implementation shipped; it keeps everything in one JSON
//! document and is persisted by `db::update_db`.

use crate::achievements;
use crate::checklist::{self, CompletionChange};
use crate::date::parse_date;
use crate::error::ArcError;
use crate::leaderboard::{self, LeaderboardEntry, RankRange};
use crate::model::{CompletionRecord, Db, ProgressAggregate, Suggestion};
use crate::period::{IsoWeek, PeriodKind};
use crate::progress::{self, ProgressPatch, WeightSample};
use crate::suggestions::{self, SuggestionDraft};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

pub trait ArcStore {
    fn upsert_completion(
        &mut self,
        user_id: &str,
        program_id: u32,
        kind: PeriodKind,
        period: &str,
        updates: &BTreeMap<String, bool>,
        ts: &str,
    ) -> Result<CompletionChange, ArcError>;

    fn get_completion(
        &self,
        user_id: &str,
        program_id: u32,
        kind: PeriodKind,
        period: &str,
    ) -> Result<Option<CompletionRecord>, ArcError>;

    /// Fully completed days. A malformed stored key is `InvalidPeriodKey`.
    fn list_completed_days(&self, user_id: &str, program_id: u32) -> Result<BTreeSet<NaiveDate>, ArcError>;

    /// Fully completed ISO weeks. A malformed stored key is `InvalidPeriodKey`.
    fn list_completed_weeks(&self, user_id: &str, program_id: u32) -> Result<BTreeSet<IsoWeek>, ArcError>;

    fn get_progress(&self, user_id: &str, program_id: u32) -> Result<Option<ProgressAggregate>, ArcError>;

    fn upsert_progress(
        &mut self,
        user_id: &str,
        program_id: u32,
        patch: &ProgressPatch,
    ) -> Result<ProgressAggregate, ArcError>;

    fn list_unlocked_achievement_codes(
        &self,
        user_id: &str,
        program_id: u32,
    ) -> Result<BTreeSet<String>, ArcError>;

    /// Insert-if-absent. Returns `true` only when a new row was written.
    fn unlock_achievement(
        &mut self,
        user_id: &str,
        program_id: u32,
        code: &str,
        ts: &str,
    ) -> Result<bool, ArcError>;

    fn latest_unlocked_achievement(&self, user_id: &str, program_id: u32) -> Result<Option<String>, ArcError>;

    /// Weight samples, oldest first.
    fn get_weight_history(&self, user_id: &str, program_id: u32) -> Result<Vec<WeightSample>, ArcError>;

    fn list_active_suggestion_types(
        &self,
        user_id: &str,
        program_id: u32,
    ) -> Result<BTreeSet<String>, ArcError>;

    /// Types of every suggestion row, dismissed and posted included.
    fn list_suggestion_types(&self, user_id: &str, program_id: u32) -> Result<BTreeSet<String>, ArcError>;

    /// Returns `None` when an active suggestion of the same type already exists.
    fn create_suggestion(
        &mut self,
        user_id: &str,
        program_id: u32,
        draft: &SuggestionDraft,
        ts: &str,
    ) -> Result<Option<Suggestion>, ArcError>;

    /// Leaderboard entry of an opted-in user, `None` otherwise.
    fn get_rank(&self, user_id: &str, program_id: u32) -> Result<Option<LeaderboardEntry>, ArcError>;

    fn get_ranked_window(&self, program_id: u32, range: RankRange) -> Result<Vec<LeaderboardEntry>, ArcError>;

    fn list_program_users(&self, program_id: u32) -> Result<Vec<String>, ArcError>;
}

impl ArcStore for Db {
    fn upsert_completion(
        &mut self,
        user_id: &str,
        program_id: u32,
        kind: PeriodKind,
        period: &str,
        updates: &BTreeMap<String, bool>,
        ts: &str,
    ) -> Result<CompletionChange, ArcError> {
        checklist::upsert_record(self, user_id, program_id, kind, period, updates, ts)
    }

    fn get_completion(
        &self,
        user_id: &str,
        program_id: u32,
        kind: PeriodKind,
        period: &str,
    ) -> Result<Option<CompletionRecord>, ArcError> {
        Ok(checklist::get_record(self, user_id, program_id, kind, period))
    }

    fn list_completed_days(&self, user_id: &str, program_id: u32) -> Result<BTreeSet<NaiveDate>, ArcError> {
        checklist::completed_period_keys(self, user_id, program_id, PeriodKind::Daily)
            .iter()
            .map(|k| parse_date(k, "stored date"))
            .collect()
    }

    fn list_completed_weeks(&self, user_id: &str, program_id: u32) -> Result<BTreeSet<IsoWeek>, ArcError> {
        checklist::completed_period_keys(self, user_id, program_id, PeriodKind::Weekly)
            .iter()
            .map(|k| IsoWeek::parse(k))
            .collect()
    }

    fn get_progress(&self, user_id: &str, program_id: u32) -> Result<Option<ProgressAggregate>, ArcError> {
        Ok(progress::get_progress(self, user_id, program_id))
    }

    fn upsert_progress(
        &mut self,
        user_id: &str,
        program_id: u32,
        patch: &ProgressPatch,
    ) -> Result<ProgressAggregate, ArcError> {
        Ok(progress::upsert_progress(self, user_id, program_id, patch))
    }

    fn list_unlocked_achievement_codes(
        &self,
        user_id: &str,
        program_id: u32,
    ) -> Result<BTreeSet<String>, ArcError> {
        Ok(achievements::unlocked_codes(self, user_id, program_id))
    }

    fn unlock_achievement(
        &mut self,
        user_id: &str,
        program_id: u32,
        code: &str,
        ts: &str,
    ) -> Result<bool, ArcError> {
        Ok(achievements::insert_unlock(self, user_id, program_id, code, ts))
    }

    fn latest_unlocked_achievement(&self, user_id: &str, program_id: u32) -> Result<Option<String>, ArcError> {
        Ok(achievements::list_unlocked(self, user_id, program_id)
            .into_iter()
            .next()
            .map(|u| u.code))
    }

    fn get_weight_history(&self, user_id: &str, program_id: u32) -> Result<Vec<WeightSample>, ArcError> {
        Ok(progress::weight_samples(self, user_id, program_id))
    }

    fn list_active_suggestion_types(
        &self,
        user_id: &str,
        program_id: u32,
    ) -> Result<BTreeSet<String>, ArcError> {
        Ok(suggestions::active_types(self, user_id, program_id))
    }

    fn list_suggestion_types(&self, user_id: &str, program_id: u32) -> Result<BTreeSet<String>, ArcError> {
        Ok(suggestions::all_types(self, user_id, program_id))
    }

    fn create_suggestion(
        &mut self,
        user_id: &str,
        program_id: u32,
        draft: &SuggestionDraft,
        ts: &str,
    ) -> Result<Option<Suggestion>, ArcError> {
        Ok(suggestions::insert_if_inactive(self, user_id, program_id, draft, ts))
    }

    fn get_rank(&self, user_id: &str, program_id: u32) -> Result<Option<LeaderboardEntry>, ArcError> {
        Ok(leaderboard::ranked_view(self, program_id)
            .into_iter()
            .find(|e| e.user_id == user_id))
    }

    fn get_ranked_window(&self, program_id: u32, range: RankRange) -> Result<Vec<LeaderboardEntry>, ArcError> {
        Ok(leaderboard::ranked_view(self, program_id)
            .into_iter()
            .filter(|e| range.contains(e.rank))
            .collect())
    }

    fn list_program_users(&self, program_id: u32) -> Result<Vec<String>, ArcError> {
        let mut users: Vec<String> = self
            .progress
            .iter()
            .filter(|p| p.program_id == program_id)
            .map(|p| p.user_id.clone())
            .collect();
        users.sort();
        users.dedup();
        Ok(users)
    }
}
