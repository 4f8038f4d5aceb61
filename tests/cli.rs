use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;

const DAILY: [&str; 10] = [
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

const WEEKLY: [&str; 8] = [
    "strength_workouts_3_4",
    "cardio_sessions_2_3",
    "meal_prep",
    "progress_review",
    "plan_adjustment",
    "monk_mode_period",
    "reflection_on_principles",
    "planning_next_week",
];

const TODAY: &str = "2026-10-16";

/// `arc` pinned to a DB, a user and a clock.
fn arc(db: &Path, user: &str) -> Command {
    let mut cmd = Command::cargo_bin("arc").expect("binary arc is built");
    cmd.env_remove("ARC_DB_PATH")
        .env_remove("ARC_TODAY")
        .env_remove("ARC_NOW")
        .env_remove("ARC_USER")
        .env_remove("ARC_PROGRAM")
        .env("NO_COLOR", "1")
        .args([
            "--db",
            db.to_str().unwrap(),
            "--today",
            TODAY,
            "--now",
            "2026-10-16T08:00:00Z",
            "--user",
            user,
        ]);
    cmd
}

fn check_args<'a>(items: &[&'a str]) -> Vec<&'a str> {
    items.iter().flat_map(|i| ["--check", *i]).collect()
}

fn run_json(cmd: &mut Command) -> Value {
    let out = cmd
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).expect("valid json")
}

fn complete_day(db: &Path, user: &str, date: &str) -> Value {
    let mut args = vec!["daily", "--date", date];
    args.extend(check_args(&DAILY));
    run_json(arc(db, user).args(&args))
}

fn suggestion_types(v: &Value) -> Vec<String> {
    v["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["suggestion_type"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn full_day_unlocks_first_day_and_scores() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    let v = complete_day(&db, "alice", TODAY);
    assert_eq!(v["record"]["is_fully_completed"], true);
    assert_eq!(v["streak"]["current_streak"], 1);
    assert_eq!(v["refresh"]["newly_unlocked"], serde_json::json!(["FIRST_DAY"]));
    assert_eq!(v["refresh"]["leaderboard_score"], 115);
    assert_eq!(
        v["refresh"]["new_suggestions"][0]["suggestion_type"],
        "achievement_FIRST_DAY"
    );

    let p = run_json(arc(&db, "alice").args(["progress", "show"]));
    assert_eq!(p["progress"]["current_daily_streak"], 1);
    assert_eq!(p["progress"]["total_days_completed"], 1);
}

#[test]
fn partial_day_records_items_without_streak() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    let v = run_json(arc(&db, "alice").args(["daily", "--check", "workout"]));
    assert_eq!(v["record"]["items"]["workout"], true);
    assert_eq!(v["record"]["is_fully_completed"], false);
    assert!(v["streak"].is_null());

    let shown = run_json(arc(&db, "alice").args(["daily"]));
    assert_eq!(shown["record"]["items"]["workout"], true);
}

#[test]
fn seven_day_streak_suggests_once() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    for day in 10..=16 {
        complete_day(&db, "alice", &format!("2026-10-{}", day));
    }

    let p = run_json(arc(&db, "alice").args(["progress", "show"]));
    assert_eq!(p["progress"]["current_daily_streak"], 7);

    let listed = run_json(arc(&db, "alice").args(["suggestions", "list"]));
    let types = suggestion_types(&listed);
    assert_eq!(types.iter().filter(|t| *t == "streak_7").count(), 1);
    assert!(types.contains(&"achievement_WEEK_WARRIOR".to_string()));

    let again = run_json(arc(&db, "alice").args(["suggestions", "check"]));
    assert!(again["suggestions"].as_array().unwrap().is_empty());
}

#[test]
fn dismissed_suggestion_leaves_active_list() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    complete_day(&db, "alice", TODAY);

    let v = run_json(arc(&db, "alice").args(["suggestions", "dismiss", "s000001"]));
    assert_eq!(v["suggestions"][0]["is_dismissed"], true);

    // Idempotent.
    arc(&db, "alice")
        .args(["suggestions", "dismiss", "s000001"])
        .assert()
        .success();

    let listed = run_json(arc(&db, "alice").args(["suggestions", "list"]));
    assert!(listed["suggestions"].as_array().unwrap().is_empty());

    // Not owned by bob.
    arc(&db, "bob")
        .args(["suggestions", "posted", "s000001"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Suggestion not found"));
}

#[test]
fn weekly_checklist_unlocks_perfect_week() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    let mut args = vec!["weekly", "--week", "2026-W42"];
    args.extend(check_args(&WEEKLY));
    let v = run_json(arc(&db, "alice").args(&args));

    assert_eq!(v["record"]["period"], "2026-W42");
    assert_eq!(v["streak"]["current_streak"], 1);
    assert_eq!(v["refresh"]["newly_unlocked"], serde_json::json!(["PERFECT_WEEK"]));

    let history = run_json(arc(&db, "alice").args([
        "history", "weekly", "--from", "2026-10-01", "--to", "2026-10-31",
    ]));
    assert_eq!(history["records"].as_array().unwrap().len(), 1);
}

#[test]
fn leaderboard_context_surrounds_user() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    complete_day(&db, "ann", "2026-10-15");
    complete_day(&db, "ann", TODAY);
    complete_day(&db, "ben", TODAY);
    for user in ["ann", "ben", "cat"] {
        arc(&db, user)
            .args(["progress", "set", "--show-on-leaderboard", "true"])
            .assert()
            .success();
    }

    let ctx = run_json(arc(&db, "ben").args(["leaderboard", "context", "--size", "1"]));
    assert_eq!(ctx["user_entry"]["rank"], 2);
    assert_eq!(ctx["entries_above"][0]["user_id"], "ann");
    assert_eq!(ctx["entries_below"][0]["user_id"], "cat");

    let top = run_json(arc(&db, "ben").args(["leaderboard", "top", "--limit", "2"]));
    let users: Vec<&str> = top["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["user_id"].as_str().unwrap())
        .collect();
    assert_eq!(users, vec!["ann", "ben"]);

    let report = run_json(arc(&db, "ben").args(["leaderboard", "recalc"]));
    assert_eq!(report["updated"], 3);
    assert_eq!(report["failed"], 0);
}

#[test]
fn opted_out_user_is_absent_from_leaderboard() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    complete_day(&db, "alice", TODAY);

    let me = run_json(arc(&db, "alice").args(["leaderboard", "me"]));
    assert!(me["entry"].is_null());
}

#[test]
fn timer_and_snapshot_update_progress() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    let v = run_json(arc(&db, "alice").args(["progress", "timer"]));
    assert_eq!(v["progress"]["three_min_timer_completions"], 1);
    assert_eq!(v["progress"]["total_timer_minutes"], 3);

    arc(&db, "alice")
        .args(["progress", "snapshot", "--weight", "100"])
        .assert()
        .success();
    let v = run_json(arc(&db, "alice").args(["progress", "set", "--weight", "94.5"]));
    let types: Vec<&str> = v["refresh"]["new_suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["suggestion_type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["weight_milestone_5"]);

    let snaps = run_json(arc(&db, "alice").args(["progress", "snapshots"]));
    assert_eq!(snaps["snapshots"][0]["weight_kg"], 100.0);
}

#[test]
fn achievement_progress_covers_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    complete_day(&db, "alice", TODAY);

    let v = run_json(arc(&db, "alice").args(["achievements", "progress"]));
    let list = v["achievements"].as_array().unwrap();
    assert_eq!(list.len(), 10);
    let week = list.iter().find(|a| a["code"] == "WEEK_WARRIOR").unwrap();
    assert_eq!(week["current"], 1);
    assert_eq!(week["percentage"], 14);
    assert_eq!(week["unlocked"], false);
}

#[test]
fn invalid_week_key_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    for week in ["2021-W53", "2026-42", "2026-W00"] {
        arc(&db, "alice")
            .args(["weekly", "--week", week])
            .assert()
            .code(4);
    }
    arc(&db, "alice")
        .args(["daily", "--date", "2026-02-30"])
        .assert()
        .code(4);
}

#[test]
fn unknown_item_is_usage_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    arc(&db, "alice")
        .args(["daily", "--check", "nap"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown daily checklist item"));
    assert!(!db.exists());
}

#[test]
fn future_periods_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    arc(&db, "alice")
        .args(["daily", "--date", "2026-10-17", "--check", "workout"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("future"));
    arc(&db, "alice")
        .args(["weekly", "--week", "2026-W43", "--check", "meal_prep"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("future"));
    assert!(!db.exists());
}

#[test]
fn dismissed_achievement_is_not_suggested_again() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    complete_day(&db, "alice", TODAY);

    arc(&db, "alice")
        .args(["suggestions", "dismiss", "s000001"])
        .assert()
        .success();
    let again = run_json(arc(&db, "alice").args(["suggestions", "check"]));
    assert!(again["suggestions"].as_array().unwrap().is_empty());
}

#[test]
fn per_user_commands_require_a_user() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    Command::cargo_bin("arc")
        .unwrap()
        .env_remove("ARC_USER")
        .args(["--db", db.to_str().unwrap(), "progress", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Missing user"));
}

#[test]
fn table_output_lists_checklist_items() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    arc(&db, "alice")
        .args(["--format", "table", "daily", "--check", "workout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] workout"))
        .stdout(predicate::str::contains("[ ] clean_eating"))
        .stdout(predicate::str::contains("1/10"));
}
