use crate::error::ArcError;
use crate::model::{CompletionRecord, Db};
use crate::period::{IsoWeek, PeriodKind};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

pub const DAILY_ITEMS: [&str; 10] = [
    "wake_up_early",
    "ten_min_silence",
    "morning_hydration",
    "workout",
    "clean_eating",
    "review_mission",
    "small_sacrifice",
    "moment_silence",
    "act_of_honor",
    "small_overcoming",
];

pub const WEEKLY_ITEMS: [&str; 8] = [
    "strength_workouts_3_4",
    "cardio_sessions_2_3",
    "meal_prep",
    "progress_review",
    "plan_adjustment",
    "monk_mode_period",
    "reflection_on_principles",
    "planning_next_week",
];

pub fn items_for(kind: PeriodKind) -> &'static [&'static str] {
    match kind {
        PeriodKind::Daily => &DAILY_ITEMS,
        PeriodKind::Weekly => &WEEKLY_ITEMS,
    }
}

fn ensure_known_item(kind: PeriodKind, item: &str) -> Result<(), ArcError> {
    if items_for(kind).contains(&item) {
        Ok(())
    } else {
        Err(ArcError::usage(format!(
            "Unknown {} checklist item: {}",
            kind.as_str(),
            item
        )))
    }
}

/// Builds a partial update from `--check` / `--uncheck` item lists.
pub fn parse_updates(
    kind: PeriodKind,
    check: &[String],
    uncheck: &[String],
) -> Result<BTreeMap<String, bool>, ArcError> {
    let mut updates: BTreeMap<String, bool> = BTreeMap::new();

    for (items, value) in [(check, true), (uncheck, false)] {
        for raw in items.iter() {
            let item = raw.trim();
            ensure_known_item(kind, item)?;
            if let Some(prev) = updates.insert(item.to_string(), value) {
                if prev != value {
                    return Err(ArcError::usage(format!(
                        "Invalid flags: {} is both checked and unchecked",
                        item
                    )));
                }
            }
        }
    }

    Ok(updates)
}

pub fn blank_record(user_id: &str, program_id: u32, kind: PeriodKind, period: &str) -> CompletionRecord {
    CompletionRecord {
        user_id: user_id.to_string(),
        program_id,
        kind,
        period: period.to_string(),
        items: items_for(kind)
            .iter()
            .map(|i| (i.to_string(), false))
            .collect(),
        is_fully_completed: false,
        updated_ts: None,
    }
}

/// Applies the named flags and recomputes `is_fully_completed`; flags not in
/// `updates` keep their prior value.
pub fn apply_updates(
    record: &mut CompletionRecord,
    updates: &BTreeMap<String, bool>,
) -> Result<(), ArcError> {
    for (item, value) in updates.iter() {
        ensure_known_item(record.kind, item)?;
        record.items.insert(item.clone(), *value);
    }

    record.is_fully_completed = items_for(record.kind)
        .iter()
        .all(|i| record.items.get(*i).copied().unwrap_or(false));

    Ok(())
}

#[derive(Debug, Clone)]
pub struct CompletionChange {
    pub record: CompletionRecord,
    pub was_completed: bool,
}

impl CompletionChange {
    pub fn completion_changed(&self) -> bool {
        self.was_completed != self.record.is_fully_completed
    }
}

fn find_record_index(
    db: &Db,
    user_id: &str,
    program_id: u32,
    kind: PeriodKind,
    period: &str,
) -> Option<usize> {
    db.completions.iter().position(|r| {
        r.user_id == user_id && r.program_id == program_id && r.kind == kind && r.period == period
    })
}

pub fn get_record(
    db: &Db,
    user_id: &str,
    program_id: u32,
    kind: PeriodKind,
    period: &str,
) -> Option<CompletionRecord> {
    find_record_index(db, user_id, program_id, kind, period).map(|i| db.completions[i].clone())
}

pub fn upsert_record(
    db: &mut Db,
    user_id: &str,
    program_id: u32,
    kind: PeriodKind,
    period: &str,
    updates: &BTreeMap<String, bool>,
    ts: &str,
) -> Result<CompletionChange, ArcError> {
    let idx = find_record_index(db, user_id, program_id, kind, period);
    let mut record = match idx {
        Some(i) => db.completions[i].clone(),
        None => blank_record(user_id, program_id, kind, period),
    };

    let was_completed = record.is_fully_completed;
    apply_updates(&mut record, updates)?;
    record.updated_ts = Some(ts.to_string());

    match idx {
        Some(i) => db.completions[i] = record.clone(),
        None => db.completions.push(record.clone()),
    }

    Ok(CompletionChange {
        record,
        was_completed,
    })
}

pub fn completed_period_keys(
    db: &Db,
    user_id: &str,
    program_id: u32,
    kind: PeriodKind,
) -> BTreeSet<String> {
    db.completions
        .iter()
        .filter(|r| r.user_id == user_id && r.program_id == program_id && r.kind == kind)
        .filter(|r| r.is_fully_completed)
        .map(|r| r.period.clone())
        .collect()
}

pub fn list_daily_in_range(
    db: &Db,
    user_id: &str,
    program_id: u32,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<CompletionRecord> {
    let from = from.to_string();
    let to = to.to_string();

    let mut out: Vec<CompletionRecord> = db
        .completions
        .iter()
        .filter(|r| r.user_id == user_id && r.program_id == program_id)
        .filter(|r| r.kind == PeriodKind::Daily)
        .filter(|r| r.period >= from && r.period <= to)
        .cloned()
        .collect();

    out.sort_by(|a, b| a.period.cmp(&b.period));
    out
}

/// Weekly records whose Monday falls inside `[from, to]`, oldest first.
pub fn list_weekly_in_range(
    db: &Db,
    user_id: &str,
    program_id: u32,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<CompletionRecord>, ArcError> {
    let mut out: Vec<(IsoWeek, CompletionRecord)> = Vec::new();
    for r in db.completions.iter() {
        if r.user_id != user_id || r.program_id != program_id || r.kind != PeriodKind::Weekly {
            continue;
        }
        let week = IsoWeek::parse(&r.period)?;
        if week.monday() >= from && week.monday() <= to {
            out.push((week, r.clone()));
        }
    }

    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out.into_iter().map(|(_, r)| r).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_db;

    fn all_daily() -> BTreeMap<String, bool> {
        DAILY_ITEMS.iter().map(|i| (i.to_string(), true)).collect()
    }

    #[test]
    fn partial_updates_keep_other_flags() {
        let mut db = default_db();
        let mut first = BTreeMap::new();
        first.insert("workout".to_string(), true);
        upsert_record(&mut db, "u1", 1, PeriodKind::Daily, "2026-10-16", &first, "t1").unwrap();

        let mut second = BTreeMap::new();
        second.insert("clean_eating".to_string(), true);
        let change =
            upsert_record(&mut db, "u1", 1, PeriodKind::Daily, "2026-10-16", &second, "t2").unwrap();

        assert_eq!(change.record.items.get("workout"), Some(&true));
        assert_eq!(change.record.items.get("clean_eating"), Some(&true));
        assert_eq!(change.record.items.get("act_of_honor"), Some(&false));
        assert!(!change.record.is_fully_completed);
        assert_eq!(db.completions.len(), 1);
    }

    #[test]
    fn completion_flag_tracks_all_items() {
        let mut db = default_db();
        let change =
            upsert_record(&mut db, "u1", 1, PeriodKind::Daily, "2026-10-16", &all_daily(), "t").unwrap();
        assert!(change.record.is_fully_completed);
        assert!(change.completion_changed());

        let mut undo = BTreeMap::new();
        undo.insert("workout".to_string(), false);
        let change =
            upsert_record(&mut db, "u1", 1, PeriodKind::Daily, "2026-10-16", &undo, "t").unwrap();
        assert!(!change.record.is_fully_completed);
        assert!(change.was_completed);
        assert!(change.completion_changed());
    }

    #[test]
    fn empty_update_creates_a_blank_record() {
        let mut db = default_db();
        let change = upsert_record(
            &mut db,
            "u1",
            1,
            PeriodKind::Weekly,
            "2026-W42",
            &BTreeMap::new(),
            "t",
        )
        .unwrap();
        assert_eq!(change.record.items.len(), WEEKLY_ITEMS.len());
        assert!(!change.completion_changed());
    }

    #[test]
    fn unknown_items_are_rejected_without_side_effects() {
        let mut db = default_db();
        let mut bad = BTreeMap::new();
        bad.insert("nap".to_string(), true);
        assert!(upsert_record(&mut db, "u1", 1, PeriodKind::Daily, "2026-10-16", &bad, "t").is_err());
        assert!(db.completions.is_empty());

        assert!(parse_updates(PeriodKind::Weekly, &["workout".to_string()], &[]).is_err());
    }

    #[test]
    fn conflicting_check_and_uncheck_is_usage_error() {
        let both = vec!["workout".to_string()];
        assert!(parse_updates(PeriodKind::Daily, &both, &both).is_err());

        let ok = parse_updates(
            PeriodKind::Daily,
            &["workout".to_string()],
            &["clean_eating".to_string()],
        )
        .unwrap();
        assert_eq!(ok.get("workout"), Some(&true));
        assert_eq!(ok.get("clean_eating"), Some(&false));
    }

    #[test]
    fn weekly_range_filters_by_monday() {
        let mut db = default_db();
        for w in ["2026-W40", "2026-W41", "2026-W42"] {
            upsert_record(&mut db, "u1", 1, PeriodKind::Weekly, w, &BTreeMap::new(), "t").unwrap();
        }
        let from = crate::date::parse_date("2026-10-01", "from").unwrap();
        let to = crate::date::parse_date("2026-10-10", "to").unwrap();
        let rows = list_weekly_in_range(&db, "u1", 1, from, to).unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(keys, vec!["2026-W41"]);
    }
}
