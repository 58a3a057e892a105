//! Frequency policies for recurring obligations.
//!
//! A [`FrequencyPolicy`] is a closed set of recurrence rules. Raw configuration
//! (including the legacy string form such as `"every_2_days"`) is parsed and
//! validated once, at the boundary, so nothing downstream has to string-match.
//!
//! ## Policies
//!
//! | Policy          | Scheduled on                              | Max gap |
//! |-----------------|-------------------------------------------|---------|
//! | `Daily`         | every day                                 | 1       |
//! | `Weekly`        | every day (coarse weekly cadence)         | 1       |
//! | `SpecificDays`  | listed weekdays, 0 = Sunday .. 6 = Saturday | 1     |
//! | `EveryNDays(n)` | every n-th day counted from the anchor    | n       |

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::days_between;
use crate::error::EngineError;

/// Recurrence rule for a habit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrequencyPolicy {
    #[default]
    Daily,
    /// Any day counts as an occurrence window; no weekday is pinned.
    Weekly,
    SpecificDays {
        /// Weekday numbers, 0 = Sunday.
        days_of_week: BTreeSet<u8>,
    },
    EveryNDays {
        n: u32,
    },
}

impl FrequencyPolicy {
    /// Build an `EveryNDays` policy, rejecting `n < 1`.
    pub fn every_n_days(n: u32) -> Result<Self, EngineError> {
        let policy = FrequencyPolicy::EveryNDays { n };
        policy.validate()?;
        Ok(policy)
    }

    /// Build a `SpecificDays` policy from weekday numbers (0 = Sunday).
    pub fn specific_days<I: IntoIterator<Item = u8>>(days: I) -> Result<Self, EngineError> {
        let policy = FrequencyPolicy::SpecificDays {
            days_of_week: days.into_iter().collect(),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check the structural invariants of the policy.
    ///
    /// # Errors
    /// `InvalidPolicy` if `n < 1`, the weekday set is empty, or a weekday is
    /// outside `0..=6`.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            FrequencyPolicy::Daily | FrequencyPolicy::Weekly => Ok(()),
            FrequencyPolicy::SpecificDays { days_of_week } => {
                if days_of_week.is_empty() {
                    return Err(EngineError::InvalidPolicy(
                        "specific_days needs at least one weekday".into(),
                    ));
                }
                if let Some(bad) = days_of_week.iter().find(|d| **d > 6) {
                    return Err(EngineError::InvalidPolicy(format!(
                        "weekday {bad} is outside 0..=6"
                    )));
                }
                Ok(())
            }
            FrequencyPolicy::EveryNDays { n } => {
                if *n < 1 {
                    Err(EngineError::InvalidPolicy(format!(
                        "every_n_days requires n >= 1, got {n}"
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Maximum day-difference between consecutive completions before a
    /// streak resets.
    pub fn max_gap(&self) -> i64 {
        match self {
            FrequencyPolicy::EveryNDays { n } => i64::from((*n).max(1)),
            _ => 1,
        }
    }

    /// Whether `date` is a scheduled occurrence, counting `EveryNDays` offsets
    /// from `anchor`.
    ///
    /// Dates before the anchor are never scheduled under `EveryNDays`.
    pub fn is_scheduled(&self, date: NaiveDate, anchor: NaiveDate) -> Result<bool, EngineError> {
        self.validate()?;
        let scheduled = match self {
            FrequencyPolicy::Daily | FrequencyPolicy::Weekly => true,
            FrequencyPolicy::SpecificDays { days_of_week } => {
                let weekday = date.weekday().num_days_from_sunday() as u8;
                days_of_week.contains(&weekday)
            }
            FrequencyPolicy::EveryNDays { n } => {
                let offset = days_between(anchor, date);
                offset >= 0 && offset % i64::from(*n) == 0
            }
        };
        Ok(scheduled)
    }

    /// Short human-readable label.
    pub fn describe(&self) -> String {
        match self {
            FrequencyPolicy::Daily => "Every day".to_string(),
            FrequencyPolicy::Weekly => "Weekly".to_string(),
            FrequencyPolicy::SpecificDays { days_of_week } => {
                const NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
                let names: Vec<&str> = days_of_week
                    .iter()
                    .filter_map(|d| NAMES.get(*d as usize).copied())
                    .collect();
                names.join(", ")
            }
            FrequencyPolicy::EveryNDays { n: 1 } => "Every day".to_string(),
            FrequencyPolicy::EveryNDays { n } => format!("Every {n} days"),
        }
    }
}

/// Compact string form: `daily`, `weekly`, `every_3_days`, `specific_days:1,3,5`.
impl fmt::Display for FrequencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencyPolicy::Daily => write!(f, "daily"),
            FrequencyPolicy::Weekly => write!(f, "weekly"),
            FrequencyPolicy::SpecificDays { days_of_week } => {
                let days: Vec<String> = days_of_week.iter().map(|d| d.to_string()).collect();
                write!(f, "specific_days:{}", days.join(","))
            }
            FrequencyPolicy::EveryNDays { n } => write!(f, "every_{n}_days"),
        }
    }
}

impl FromStr for FrequencyPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        let policy = match raw.as_str() {
            "daily" => FrequencyPolicy::Daily,
            "weekly" => FrequencyPolicy::Weekly,
            _ => {
                if let Some(list) = raw.strip_prefix("specific_days:") {
                    let mut days = BTreeSet::new();
                    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                        let day = part.parse::<u8>().map_err(|_| {
                            EngineError::InvalidPolicy(format!("bad weekday '{part}' in '{s}'"))
                        })?;
                        days.insert(day);
                    }
                    FrequencyPolicy::SpecificDays { days_of_week: days }
                } else if let Some(n) = raw
                    .strip_prefix("every_")
                    .and_then(|rest| rest.strip_suffix("_days"))
                {
                    let n = n.parse::<u32>().map_err(|_| {
                        EngineError::InvalidPolicy(format!("bad interval in '{s}'"))
                    })?;
                    FrequencyPolicy::EveryNDays { n }
                } else {
                    return Err(EngineError::InvalidPolicy(format!(
                        "unknown frequency '{s}'"
                    )));
                }
            }
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Parse a raw frequency string, falling back to `Daily` when it is malformed.
///
/// Hosts use this for records written before policies were validated.
pub fn parse_or_daily(raw: &str) -> FrequencyPolicy {
    match raw.parse() {
        Ok(policy) => policy,
        Err(e) => {
            tracing::warn!(raw, error = %e, "unparseable frequency, treating as daily");
            FrequencyPolicy::Daily
        }
    }
}
