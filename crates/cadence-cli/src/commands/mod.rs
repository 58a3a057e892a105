pub mod config;
pub mod habit;
pub mod level;
pub mod reminder;

use std::error::Error;

use cadence_core::calendar::local_today;
use cadence_core::{Config, CoreError, SqliteStore};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Loaded configuration, open database and the owner a command acts on.
pub struct Session {
    pub config: Config,
    pub store: SqliteStore,
    pub owner_id: String,
}

impl Session {
    pub fn open(owner: Option<String>) -> Result<Self, CoreError> {
        let config = Config::load()?;
        let store = SqliteStore::open()?;
        let owner_id = owner.unwrap_or_else(|| config.profile.owner_id.clone());
        Ok(Self {
            config,
            store,
            owner_id,
        })
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a calendar day: `YYYY-MM-DD`, `today` or `yesterday`.
/// Absent means today in local time.
pub fn parse_day(raw: Option<&str>) -> CliResult<NaiveDate> {
    let today = local_today();
    match raw.map(str::trim) {
        None | Some("today") => Ok(today),
        Some("yesterday") => today
            .pred_opt()
            .ok_or_else(|| "date out of range".into()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{s}': {e}").into()),
    }
}

/// Parse an instant: RFC 3339, `YYYY-MM-DD HH:MM` in local time, or `now`.
pub fn parse_instant(raw: &str) -> CliResult<DateTime<Utc>> {
    let raw = raw.trim();
    if raw == "now" {
        return Ok(Utc::now());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .map_err(|e| format!("invalid time '{raw}': {e}"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| format!("time '{raw}' does not exist locally").into())
}
