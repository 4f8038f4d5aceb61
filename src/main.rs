mod achievements;
mod checklist;
mod config;
mod date;
mod db;
mod engine;
mod error;
mod leaderboard;
mod logging;
mod model;
mod output;
mod period;
mod progress;
mod score;
mod store;
mod streak;
mod suggestions;
mod ts;

use crate::achievements::CATALOG;
use crate::checklist::{blank_record, items_for, parse_updates};
use crate::config::{Overrides, Settings};
use crate::date::{add_days, check_range, parse_date};
use crate::db::{read_db, resolve_db_path, update_db};
use crate::engine::{ChecklistOutcome, RefreshOutcome};
use crate::error::ArcError;
use crate::leaderboard::LeaderboardEntry;
use crate::model::{BodyMetrics, CompletionRecord, ProgressAggregate, Suggestion};
use crate::output::{opt, render_key_values, render_progress_bar, render_simple_table, Styler};
use crate::period::{IsoWeek, PeriodKind};
use crate::progress::ProfileUpdate;
use crate::store::ArcStore;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::Path;
use tracing::debug;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "arc", version, about = "Winter Arc checklists, streaks, achievements and leaderboard")]
struct Cli {
    /// Overrides the DB path for this invocation.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Logical "today" (YYYY-MM-DD) used for streaks and defaults.
    #[arg(long, global = true)]
    today: Option<String>,

    /// Logical "now" (RFC3339) stamped on written rows.
    #[arg(long, global = true)]
    now: Option<String>,

    #[arg(long, global = true)]
    user: Option<String>,

    #[arg(long, global = true)]
    program: Option<u32>,

    #[arg(long, global = true, value_enum, default_value = "table")]
    format: Format,

    /// Disables ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show or update the daily checklist.
    Daily(DailyArgs),
    /// Show or update the weekly checklist.
    Weekly(WeeklyArgs),
    /// Checklist records in a date range.
    History(HistoryArgs),
    #[command(subcommand)]
    Progress(ProgressCommand),
    #[command(subcommand)]
    Achievements(AchievementsCommand),
    #[command(subcommand)]
    Leaderboard(LeaderboardCommand),
    #[command(subcommand)]
    Suggestions(SuggestionsCommand),
}

#[derive(Args, Debug)]
struct ItemUpdates {
    /// Item to mark done (repeatable)
    #[arg(long = "check")]
    check: Vec<String>,

    /// Item to mark not done (repeatable)
    #[arg(long = "uncheck")]
    uncheck: Vec<String>,
}

impl ItemUpdates {
    fn is_empty(&self) -> bool {
        self.check.is_empty() && self.uncheck.is_empty()
    }
}

#[derive(Args, Debug)]
struct DailyArgs {
    /// Defaults to today
    #[arg(long)]
    date: Option<String>,

    #[command(flatten)]
    items: ItemUpdates,
}

#[derive(Args, Debug)]
struct WeeklyArgs {
    /// ISO week (YYYY-Www), defaults to the week containing today
    #[arg(long)]
    week: Option<String>,

    #[command(flatten)]
    items: ItemUpdates,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum HistoryKind {
    Daily,
    Weekly,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[arg(value_enum)]
    kind: HistoryKind,

    /// Defaults to 27 days before --to
    #[arg(long)]
    from: Option<String>,

    /// Defaults to today
    #[arg(long)]
    to: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ProgressCommand {
    Show,
    /// Update profile fields; omitted fields are left unchanged.
    Set(SetArgs),
    /// Record a completed meditation timer.
    Timer {
        #[arg(long, default_value_t = 3)]
        minutes: u32,
    },
    /// Record a weight snapshot.
    Snapshot {
        #[arg(long)]
        weight: f64,

        #[arg(long)]
        notes: Option<String>,
    },
    Snapshots {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Recompute streaks for today, then achievements, score and suggestions.
    Refresh,
}

#[derive(Args, Debug)]
struct SetArgs {
    #[arg(long)]
    mission: Option<String>,
    #[arg(long)]
    weight: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    activity_level: Option<String>,
    #[arg(long)]
    goal: Option<String>,
    #[arg(long)]
    bmr: Option<f64>,
    #[arg(long)]
    tdee: Option<f64>,
    #[arg(long)]
    target_calories: Option<f64>,
    #[arg(long)]
    protein: Option<f64>,
    #[arg(long)]
    carbs: Option<f64>,
    #[arg(long)]
    fat: Option<f64>,

    /// `--show-on-leaderboard true|false`
    #[arg(long, action = clap::ArgAction::Set)]
    show_on_leaderboard: Option<bool>,
}

impl SetArgs {
    fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            body: BodyMetrics {
                mission_statement: self.mission,
                current_weight_kg: self.weight,
                height_cm: self.height,
                age: self.age,
                gender: self.gender,
                activity_level: self.activity_level,
                goal: self.goal,
                bmr: self.bmr,
                tdee: self.tdee,
                target_calories: self.target_calories,
                protein_g: self.protein,
                carbs_g: self.carbs,
                fat_g: self.fat,
            },
            show_on_leaderboard: self.show_on_leaderboard,
        }
    }
}

#[derive(Subcommand, Debug)]
enum AchievementsCommand {
    /// The full catalog.
    List,
    /// Unlocked achievements, newest first.
    Mine,
    Progress,
    /// Evaluate and unlock, then refresh the score.
    Check,
}

#[derive(Subcommand, Debug)]
enum LeaderboardCommand {
    Top {
        #[arg(long, default_value_t = 100)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    Me,
    Context {
        #[arg(long, default_value_t = 5)]
        size: u32,
    },
    /// Recalculate every score in the program.
    Recalc,
}

#[derive(Subcommand, Debug)]
enum SuggestionsCommand {
    List,
    Check,
    Dismiss { id: String },
    Posted { id: String },
}

fn main() {
    logging::init();

    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 2 } else { 0 });
        }
    };

    let exit = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            debug!(kind = ?e.kind, "command failed");
            eprintln!("{}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

fn print_json<T: serde::Serialize>(obj: &T) -> Result<(), ArcError> {
    let s = serde_json::to_string_pretty(obj).map_err(|e| ArcError::io(format!("JSON output failed: {}", e)))?;
    println!("{}", s);
    Ok(())
}

fn yes_no(b: bool) -> String {
    let s = if b { "yes" } else { "no" };
    s.to_string()
}

fn render_checklist(styler: &Styler, record: &CompletionRecord) -> String {
    let items = items_for(record.kind);
    let done = items
        .iter()
        .filter(|i| record.items.get(**i).copied().unwrap_or(false))
        .count();

    let span = match (record.kind, IsoWeek::parse(&record.period)) {
        (PeriodKind::Weekly, Ok(w)) => format!(" ({}..{})", w.monday(), opt(w.sunday())),
        _ => String::new(),
    };
    let mut lines = vec![styler.bold(&format!(
        "{} {}{}  {}/{}",
        record.kind.as_str(),
        record.period,
        span,
        done,
        items.len()
    ))];
    for item in items.iter() {
        let checked = record.items.get(*item).copied().unwrap_or(false);
        lines.push(format!("{} {}", styler.check(checked), item));
    }
    if record.is_fully_completed {
        lines.push(styler.green("completed"));
    }
    lines.join("\n")
}

fn render_refresh(styler: &Styler, r: &RefreshOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    for code in r.newly_unlocked.iter() {
        let name = achievements::find(code).map(|d| d.name).unwrap_or(code.as_str());
        lines.push(styler.yellow(&format!("Achievement unlocked: {}", name)));
    }
    if let Some(score) = r.leaderboard_score {
        lines.push(format!("score: {}", score));
    }
    for s in r.new_suggestions.iter() {
        lines.push(format!("{} {}", styler.gray(&format!("[{}]", s.id)), s.title));
    }
    lines
}

fn print_checklist_outcome(styler: &Styler, out: &ChecklistOutcome) {
    let mut lines = vec![render_checklist(styler, &out.record)];
    if let Some(s) = out.streak {
        lines.push(format!(
            "streak: {} (longest {}, total {})",
            s.current_streak, s.longest_streak, s.total_completed
        ));
    }
    lines.extend(render_refresh(styler, &out.refresh));
    println!("{}", lines.join("\n"));
}

fn leaderboard_rows(entries: &[LeaderboardEntry], highlight: Option<&str>, styler: &Styler) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|e| {
            let user = if highlight == Some(e.user_id.as_str()) {
                styler.bold(&e.user_id)
            } else {
                e.user_id.clone()
            };
            vec![
                e.rank.to_string(),
                user,
                e.leaderboard_score.to_string(),
                e.current_daily_streak.to_string(),
                e.current_weekly_streak.to_string(),
                e.total_days_completed.to_string(),
            ]
        })
        .collect()
}

const LEADERBOARD_HEADERS: [&str; 6] = ["rank", "user", "score", "daily", "weekly", "days"];

fn render_progress(p: &ProgressAggregate) -> String {
    let b = &p.body;
    render_key_values(&[
        ("user", p.user_id.clone()),
        ("program", p.program_id.to_string()),
        (
            "daily streak",
            format!("{} (longest {})", p.current_daily_streak, p.longest_daily_streak),
        ),
        (
            "weekly streak",
            format!("{} (longest {})", p.current_weekly_streak, p.longest_weekly_streak),
        ),
        ("days completed", p.total_days_completed.to_string()),
        ("weeks completed", p.total_weeks_completed.to_string()),
        (
            "timer",
            format!("{} sessions, {} min", p.three_min_timer_completions, p.total_timer_minutes),
        ),
        ("score", p.leaderboard_score.to_string()),
        ("on leaderboard", yes_no(p.show_on_leaderboard)),
        ("mission", opt(b.mission_statement.as_deref())),
        ("weight kg", opt(b.current_weight_kg)),
        ("height cm", opt(b.height_cm)),
        ("age", opt(b.age)),
        ("gender", opt(b.gender.as_deref())),
        ("activity level", opt(b.activity_level.as_deref())),
        ("goal", opt(b.goal.as_deref())),
        ("bmr", opt(b.bmr)),
        ("tdee", opt(b.tdee)),
        ("target calories", opt(b.target_calories)),
        ("protein g", opt(b.protein_g)),
        ("carbs g", opt(b.carbs_g)),
        ("fat g", opt(b.fat_g)),
    ])
}

fn suggestion_rows(list: &[Suggestion]) -> Vec<Vec<String>> {
    list.iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.suggestion_type.clone(),
                s.title.clone(),
                s.triggered_ts.clone(),
            ]
        })
        .collect()
}

fn run(cli: Cli) -> Result<(), ArcError> {
    let db_path = resolve_db_path(cli.db.as_deref())?;
    let settings = Settings::resolve(&Overrides {
        today: cli.today.as_deref(),
        now: cli.now.as_deref(),
        user: cli.user.as_deref(),
        program: cli.program,
        no_color: cli.no_color,
    })?;
    let styler = Styler::new(settings.color);
    let json = cli.format == Format::Json;
    debug!(db = %db_path.display(), program = settings.program_id, "resolved settings");

    match cli.command {
        Command::Daily(args) => {
            let date = match args.date.as_deref() {
                Some(d) => parse_date(d, "date")?,
                None => settings.today,
            };
            run_checklist(&db_path, &settings, &styler, json, PeriodKind::Daily, &date.to_string(), &args.items)
        }

        Command::Weekly(args) => {
            let week = match args.week.as_deref() {
                Some(w) => IsoWeek::parse(w)?,
                None => IsoWeek::containing(settings.today),
            };
            run_checklist(&db_path, &settings, &styler, json, PeriodKind::Weekly, &week.to_string(), &args.items)
        }

        Command::History(args) => {
            let user = settings.require_user()?;
            let to = match args.to.as_deref() {
                Some(d) => parse_date(d, "to")?,
                None => settings.today,
            };
            let from = match args.from.as_deref() {
                Some(d) => parse_date(d, "from")?,
                None => add_days(to, -27)?,
            };
            check_range(from, to)?;

            let db = read_db(&db_path)?;
            let records = match args.kind {
                HistoryKind::Daily => checklist::list_daily_in_range(&db, user, settings.program_id, from, to),
                HistoryKind::Weekly => checklist::list_weekly_in_range(&db, user, settings.program_id, from, to)?,
            };

            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    from: String,
                    to: String,
                    records: Vec<CompletionRecord>,
                }
                print_json(&Out {
                    from: from.to_string(),
                    to: to.to_string(),
                    records,
                })?;
            } else {
                let rows: Vec<Vec<String>> = records
                    .iter()
                    .map(|r| {
                        let total = items_for(r.kind).len();
                        let done = r.items.values().filter(|v| **v).count();
                        vec![
                            r.period.clone(),
                            format!("{}/{}", done, total),
                            yes_no(r.is_fully_completed),
                        ]
                    })
                    .collect();
                println!("{}", render_simple_table(&["period", "done", "completed"], &rows));
            }
            Ok(())
        }

        Command::Progress(cmd) => run_progress(&db_path, &settings, &styler, json, cmd),
        Command::Achievements(cmd) => run_achievements(&db_path, &settings, &styler, json, cmd),
        Command::Leaderboard(cmd) => run_leaderboard(&db_path, &settings, &styler, json, cmd),
        Command::Suggestions(cmd) => run_suggestions(&db_path, &settings, &styler, json, cmd),
    }
}

fn run_checklist(
    db_path: &Path,
    settings: &Settings,
    styler: &Styler,
    json: bool,
    kind: PeriodKind,
    period: &str,
    items: &ItemUpdates,
) -> Result<(), ArcError> {
    let user = settings.require_user()?;
    let program = settings.program_id;

    if items.is_empty() {
        let db = read_db(db_path)?;
        let record = db
            .get_completion(user, program, kind, period)?
            .unwrap_or_else(|| blank_record(user, program, kind, period));
        if json {
            #[derive(serde::Serialize)]
            struct Out {
                record: CompletionRecord,
            }
            print_json(&Out { record })?;
        } else {
            println!("{}", render_checklist(styler, &record));
        }
        return Ok(());
    }

    let updates = parse_updates(kind, &items.check, &items.uncheck)?;
    let outcome = update_db(db_path, |db| match kind {
        PeriodKind::Daily => {
            let date = parse_date(period, "date")?;
            engine::update_daily_checklist(db, user, program, date, &updates, settings.today, &settings.now)
        }
        PeriodKind::Weekly => {
            let week = IsoWeek::parse(period)?;
            engine::update_weekly_checklist(db, user, program, week, &updates, settings.today, &settings.now)
        }
    })?;

    if json {
        print_json(&outcome)?;
    } else {
        print_checklist_outcome(styler, &outcome);
    }
    Ok(())
}

fn print_progress_outcome(
    styler: &Styler,
    json: bool,
    progress: ProgressAggregate,
    refresh: RefreshOutcome,
) -> Result<(), ArcError> {
    if json {
        #[derive(serde::Serialize)]
        struct Out {
            progress: ProgressAggregate,
            refresh: RefreshOutcome,
        }
        return print_json(&Out { progress, refresh });
    }
    let mut lines = vec![render_progress(&progress)];
    lines.extend(render_refresh(styler, &refresh));
    println!("{}", lines.join("\n"));
    Ok(())
}

fn run_progress(
    db_path: &Path,
    settings: &Settings,
    styler: &Styler,
    json: bool,
    cmd: ProgressCommand,
) -> Result<(), ArcError> {
    let user = settings.require_user()?;
    let program = settings.program_id;
    let now = settings.now.as_str();

    match cmd {
        ProgressCommand::Show => {
            let db = read_db(db_path)?;
            let p = progress::get_progress(&db, user, program).unwrap_or_else(|| ProgressAggregate::new(user, program));
            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    progress: ProgressAggregate,
                }
                print_json(&Out { progress: p })?;
            } else {
                println!("{}", render_progress(&p));
            }
            Ok(())
        }

        ProgressCommand::Set(args) => {
            let update = args.into_update();
            if update == ProfileUpdate::default() {
                return Err(ArcError::usage("Nothing to update"));
            }
            let (p, refresh) = update_db(db_path, |db| engine::update_profile(db, user, program, update, now))?;
            print_progress_outcome(styler, json, p, refresh)
        }

        ProgressCommand::Timer { minutes } => {
            let (p, refresh) = update_db(db_path, |db| engine::record_timer(db, user, program, minutes, now))?;
            print_progress_outcome(styler, json, p, refresh)
        }

        ProgressCommand::Snapshot { weight, notes } => {
            let (snapshot, refresh) = update_db(db_path, |db| {
                let s = progress::record_snapshot(db, user, program, weight, notes.as_deref(), now)?;
                let r = engine::refresh_after_progress(db, user, program, now)?;
                Ok((s, r))
            })?;

            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    snapshot: model::WeightSnapshot,
                    refresh: RefreshOutcome,
                }
                print_json(&Out { snapshot, refresh })?;
            } else {
                let mut lines = vec![format!("{}  {} kg  {}", snapshot.id, snapshot.weight_kg, snapshot.taken_ts)];
                lines.extend(render_refresh(styler, &refresh));
                println!("{}", lines.join("\n"));
            }
            Ok(())
        }

        ProgressCommand::Snapshots { limit } => {
            let db = read_db(db_path)?;
            let snapshots = progress::list_snapshots(&db, user, program, limit);
            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    snapshots: Vec<model::WeightSnapshot>,
                }
                print_json(&Out { snapshots })?;
            } else {
                let rows: Vec<Vec<String>> = snapshots
                    .iter()
                    .map(|s| {
                        vec![
                            s.id.clone(),
                            s.taken_ts.clone(),
                            s.weight_kg.to_string(),
                            opt(s.notes.as_deref()),
                        ]
                    })
                    .collect();
                println!("{}", render_simple_table(&["id", "taken", "weight_kg", "notes"], &rows));
            }
            Ok(())
        }

        ProgressCommand::Refresh => {
            let (p, refresh) = update_db(db_path, |db| {
                engine::refresh_progress(db, user, program, settings.today, now)
            })?;
            print_progress_outcome(styler, json, p, refresh)
        }
    }
}

fn run_achievements(
    db_path: &Path,
    settings: &Settings,
    styler: &Styler,
    json: bool,
    cmd: AchievementsCommand,
) -> Result<(), ArcError> {
    let program = settings.program_id;

    match cmd {
        AchievementsCommand::List => {
            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    achievements: &'static [achievements::AchievementDefinition],
                }
                print_json(&Out { achievements: CATALOG })?;
            } else {
                let rows: Vec<Vec<String>> = CATALOG
                    .iter()
                    .map(|d| {
                        vec![
                            d.code.to_string(),
                            d.name.to_string(),
                            d.threshold.to_string(),
                            d.description.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", render_simple_table(&["code", "name", "target", "description"], &rows));
            }
            Ok(())
        }

        AchievementsCommand::Mine => {
            let user = settings.require_user()?;
            let db = read_db(db_path)?;
            let unlocked = achievements::list_unlocked(&db, user, program);
            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    unlocked: Vec<model::UnlockedAchievement>,
                }
                print_json(&Out { unlocked })?;
            } else {
                let rows: Vec<Vec<String>> = unlocked
                    .iter()
                    .map(|u| {
                        let name = achievements::find(&u.code).map(|d| d.name).unwrap_or(u.code.as_str());
                        vec![u.code.clone(), name.to_string(), u.unlocked_ts.clone()]
                    })
                    .collect();
                println!("{}", render_simple_table(&["code", "name", "unlocked"], &rows));
            }
            Ok(())
        }

        AchievementsCommand::Progress => {
            let user = settings.require_user()?;
            let db = read_db(db_path)?;
            let p = progress::get_progress(&db, user, program);
            let unlocked = achievements::unlocked_codes(&db, user, program);
            let report = achievements::progress_report(p.as_ref(), CATALOG, &unlocked);

            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    achievements: Vec<achievements::AchievementProgress>,
                }
                print_json(&Out { achievements: report })?;
            } else {
                let rows: Vec<Vec<String>> = report
                    .iter()
                    .map(|a| {
                        vec![
                            styler.check(a.unlocked),
                            a.code.clone(),
                            format!("{}/{}", a.current, a.target),
                            render_progress_bar(a.current, a.target, 10),
                            format!("{}%", a.percentage),
                        ]
                    })
                    .collect();
                println!("{}", render_simple_table(&["", "code", "progress", "", "pct"], &rows));
            }
            Ok(())
        }

        AchievementsCommand::Check => {
            let user = settings.require_user()?;
            let (unlocked, score) = update_db(db_path, |db| {
                let unlocked = engine::check_achievements(db, user, program, &settings.now)?;
                let score = engine::refresh_score(db, user, program)?;
                Ok((unlocked, score))
            })?;

            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    newly_unlocked: Vec<&'static achievements::AchievementDefinition>,
                    leaderboard_score: Option<u64>,
                }
                print_json(&Out {
                    newly_unlocked: unlocked,
                    leaderboard_score: score,
                })?;
            } else {
                let outcome = RefreshOutcome {
                    newly_unlocked: unlocked.iter().map(|d| d.code.to_string()).collect(),
                    leaderboard_score: score,
                    new_suggestions: Vec::new(),
                };
                let lines = render_refresh(styler, &outcome);
                if lines.is_empty() {
                    println!("{}", styler.gray("nothing new"));
                } else {
                    println!("{}", lines.join("\n"));
                }
            }
            Ok(())
        }
    }
}

fn run_leaderboard(
    db_path: &Path,
    settings: &Settings,
    styler: &Styler,
    json: bool,
    cmd: LeaderboardCommand,
) -> Result<(), ArcError> {
    let program = settings.program_id;

    match cmd {
        LeaderboardCommand::Top { limit, offset } => {
            let db = read_db(db_path)?;
            let entries = leaderboard::page(&db, program, limit, offset);
            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    entries: Vec<LeaderboardEntry>,
                }
                print_json(&Out { entries })?;
            } else {
                let rows = leaderboard_rows(&entries, settings.user.as_deref(), styler);
                println!("{}", render_simple_table(&LEADERBOARD_HEADERS, &rows));
            }
            Ok(())
        }

        LeaderboardCommand::Me => {
            let user = settings.require_user()?;
            let entry = update_db(db_path, |db| engine::leaderboard_position(db, user, program))?;
            if json {
                #[derive(serde::Serialize)]
                struct Out {
                    entry: Option<LeaderboardEntry>,
                }
                print_json(&Out { entry })?;
            } else {
                match entry {
                    Some(e) => println!(
                        "{}",
                        render_simple_table(&LEADERBOARD_HEADERS, &leaderboard_rows(&[e], None, styler))
                    ),
                    None => println!("{}", styler.gray("not on the leaderboard")),
                }
            }
            Ok(())
        }

        LeaderboardCommand::Context { size } => {
            let user = settings.require_user()?;
            let ctx = update_db(db_path, |db| engine::leaderboard_context(db, user, program, size))?;
            if json {
                print_json(&ctx)?;
            } else {
                match ctx.user_entry.clone() {
                    Some(me) => {
                        let mut entries = ctx.entries_above.clone();
                        entries.push(me);
                        entries.extend(ctx.entries_below.iter().cloned());
                        let rows = leaderboard_rows(&entries, Some(user), styler);
                        println!("{}", render_simple_table(&LEADERBOARD_HEADERS, &rows));
                    }
                    None => println!("{}", styler.gray("not on the leaderboard")),
                }
            }
            Ok(())
        }

        LeaderboardCommand::Recalc => {
            let report = update_db(db_path, |db| engine::recalculate_program_scores(db, program))?;
            if json {
                print_json(&report)?;
            } else {
                println!(
                    "{}",
                    render_key_values(&[
                        ("program", report.program_id.to_string()),
                        ("updated", report.updated.to_string()),
                        ("failed", report.failed.to_string()),
                    ])
                );
            }
            Ok(())
        }
    }
}

fn run_suggestions(
    db_path: &Path,
    settings: &Settings,
    styler: &Styler,
    json: bool,
    cmd: SuggestionsCommand,
) -> Result<(), ArcError> {
    let user = settings.require_user()?;
    let program = settings.program_id;

    let list = match cmd {
        SuggestionsCommand::List => {
            let db = read_db(db_path)?;
            suggestions::list_active(&db, user, program)
        }
        SuggestionsCommand::Check => {
            update_db(db_path, |db| engine::check_suggestions(db, user, program, &settings.now))?
        }
        SuggestionsCommand::Dismiss { id } => {
            vec![update_db(db_path, |db| suggestions::dismiss(db, user, program, &id))?]
        }
        SuggestionsCommand::Posted { id } => {
            vec![update_db(db_path, |db| suggestions::mark_posted(db, user, program, &id))?]
        }
    };

    if json {
        #[derive(serde::Serialize)]
        struct Out {
            suggestions: Vec<Suggestion>,
        }
        print_json(&Out { suggestions: list })?;
    } else if list.is_empty() {
        println!("{}", styler.gray("no suggestions"));
    } else {
        println!("{}", render_simple_table(&["id", "type", "title", "triggered"], &suggestion_rows(&list)));
    }
    Ok(())
}
