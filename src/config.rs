//! Per-invocation settings. A flag wins over its environment variable, which
//! wins over the built-in default.

use crate::date::{parse_date, system_today_utc};
use crate::error::ArcError;
use crate::ts::{normalize_rfc3339, system_now_utc};
use chrono::NaiveDate;

pub const TODAY_ENV: &str = "ARC_TODAY";
pub const NOW_ENV: &str = "ARC_NOW";
pub const USER_ENV: &str = "ARC_USER";
pub const PROGRAM_ENV: &str = "ARC_PROGRAM";
pub const DEFAULT_PROGRAM: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub today: Option<&'a str>,
    pub now: Option<&'a str>,
    pub user: Option<&'a str>,
    pub program: Option<u32>,
    pub no_color: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub today: NaiveDate,
    /// RFC3339 UTC timestamp stamped on every row this invocation writes.
    pub now: String,
    pub user: Option<String>,
    pub program_id: u32,
    pub color: bool,
}

impl Settings {
    pub fn resolve(o: &Overrides<'_>) -> Result<Self, ArcError> {
        Self::resolve_with(o, |k| std::env::var(k).ok())
    }

    fn resolve_with(o: &Overrides<'_>, env: impl Fn(&str) -> Option<String>) -> Result<Self, ArcError> {
        let pick = |flag: Option<&str>, key: &str| -> Option<String> {
            flag.map(str::to_string)
                .or_else(|| env(key))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let today = match pick(o.today, TODAY_ENV) {
            Some(t) => parse_date(&t, "today")?,
            None => system_today_utc(),
        };

        let now = match pick(o.now, NOW_ENV) {
            Some(t) => normalize_rfc3339(&t, "now")?,
            None => system_now_utc(),
        };

        let program_id = match o.program {
            Some(p) => p,
            None => match env(PROGRAM_ENV).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
                Some(raw) => raw
                    .parse::<u32>()
                    .map_err(|_| ArcError::usage(format!("Invalid program: {}", raw)))?,
                None => DEFAULT_PROGRAM,
            },
        };
        if program_id == 0 {
            return Err(ArcError::usage("Invalid program: 0"));
        }

        Ok(Self {
            today,
            now,
            user: pick(o.user, USER_ENV),
            program_id,
            color: !o.no_color && env("NO_COLOR").is_none(),
        })
    }

    pub fn require_user(&self) -> Result<&str, ArcError> {
        self.user
            .as_deref()
            .ok_or_else(|| ArcError::usage("Missing user: pass --user or set ARC_USER"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn flags_beat_environment() {
        let o = Overrides {
            today: Some("2026-10-16"),
            user: Some("alice"),
            ..Overrides::default()
        };
        let s = Settings::resolve_with(
            &o,
            env_of(&[
                (TODAY_ENV, "2020-01-01"),
                (USER_ENV, "bob"),
                (NOW_ENV, "2026-10-16T10:00:00+02:00"),
                (PROGRAM_ENV, "7"),
            ]),
        )
        .unwrap();

        assert_eq!(s.today.to_string(), "2026-10-16");
        assert_eq!(s.user.as_deref(), Some("alice"));
        assert_eq!(s.now, "2026-10-16T08:00:00Z");
        assert_eq!(s.program_id, 7);
        assert!(s.color);
    }

    #[test]
    fn defaults_apply_without_inputs() {
        let s = Settings::resolve_with(&Overrides::default(), env_of(&[("NO_COLOR", "1")])).unwrap();
        assert_eq!(s.program_id, DEFAULT_PROGRAM);
        assert!(s.user.is_none());
        assert!(!s.color);
        assert!(s.require_user().is_err());
    }

    #[test]
    fn bad_values_are_rejected() {
        let bad_today = Overrides {
            today: Some("2026-13-01"),
            ..Overrides::default()
        };
        assert!(Settings::resolve_with(&bad_today, env_of(&[])).is_err());

        assert!(Settings::resolve_with(&Overrides::default(), env_of(&[(PROGRAM_ENV, "x")])).is_err());

        let zero = Overrides {
            program: Some(0),
            ..Overrides::default()
        };
        assert!(Settings::resolve_with(&zero, env_of(&[])).is_err());
    }
}
