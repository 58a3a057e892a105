//! Reminders: one-shot and recurring notifications.
//!
//! ## Lifecycle
//!
//! ```text
//! Scheduled -> Fired -> Deleted              (one-time)
//! Scheduled -> Fired -> Scheduled (advanced) (ongoing)
//! ```
//!
//! An ongoing reminder advances from its previous `remind_at`, never from the
//! moment it actually fired, so late polls do not accumulate drift.

mod dedupe;
mod scheduler;

pub use dedupe::DedupeContext;
pub use scheduler::{Firing, PollOutcome, ReminderScheduler, ReminderTransition};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Unit of an ongoing reminder's interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Hours,
    Days,
    Weeks,
    Months,
}

impl IntervalUnit {
    /// Move `from` forward by `value` units.
    ///
    /// # Errors
    /// `InvalidScheduleSpec` if `value` is zero or the result is out of range.
    pub fn advance(self, from: DateTime<Utc>, value: u32) -> Result<DateTime<Utc>, EngineError> {
        if value == 0 {
            return Err(EngineError::InvalidScheduleSpec(format!(
                "interval of 0 {self} never advances"
            )));
        }
        let n = i64::from(value);
        let next = match self {
            IntervalUnit::Hours => TimeDelta::try_hours(n).and_then(|d| from.checked_add_signed(d)),
            IntervalUnit::Days => TimeDelta::try_days(n).and_then(|d| from.checked_add_signed(d)),
            IntervalUnit::Weeks => TimeDelta::try_weeks(n).and_then(|d| from.checked_add_signed(d)),
            IntervalUnit::Months => from.checked_add_months(Months::new(value)),
        };
        next.ok_or_else(|| {
            EngineError::InvalidScheduleSpec(format!("{value} {self} after {from} is out of range"))
        })
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntervalUnit::Hours => "hours",
            IntervalUnit::Days => "days",
            IntervalUnit::Weeks => "weeks",
            IntervalUnit::Months => "months",
        };
        f.write_str(s)
    }
}

impl FromStr for IntervalUnit {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hours" | "h" => Ok(IntervalUnit::Hours),
            "day" | "days" | "d" => Ok(IntervalUnit::Days),
            "week" | "weeks" | "w" => Ok(IntervalUnit::Weeks),
            "month" | "months" | "m" => Ok(IntervalUnit::Months),
            other => Err(EngineError::InvalidScheduleSpec(format!(
                "unknown interval unit '{other}'"
            ))),
        }
    }
}

/// How a reminder behaves once it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReminderKind {
    OneTime,
    Ongoing {
        interval_unit: IntervalUnit,
        interval_value: u32,
    },
}

impl ReminderKind {
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            ReminderKind::OneTime => Ok(()),
            ReminderKind::Ongoing { interval_value: 0, .. } => Err(
                EngineError::InvalidScheduleSpec("interval value must be at least 1".into()),
            ),
            ReminderKind::Ongoing { .. } => Ok(()),
        }
    }
}

/// Title/body pair handed to the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(flatten)]
    pub kind: ReminderKind,
    pub remind_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Reminder {
    pub fn one_time(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        remind_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: title.into(),
            body: body.into(),
            kind: ReminderKind::OneTime,
            remind_at,
            is_active: true,
        }
    }

    /// # Errors
    /// `InvalidScheduleSpec` if `interval_value` is zero.
    pub fn ongoing(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        remind_at: DateTime<Utc>,
        interval_unit: IntervalUnit,
        interval_value: u32,
    ) -> Result<Self, EngineError> {
        let kind = ReminderKind::Ongoing {
            interval_unit,
            interval_value,
        };
        kind.validate()?;
        Ok(Self {
            kind,
            ..Self::one_time(owner_id, title, body, remind_at)
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now >= self.remind_at
    }

    pub fn notification(&self) -> Notification {
        Notification {
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }

    /// The next `count` firing instants, starting with `remind_at`.
    ///
    /// One-time reminders have exactly one.
    pub fn upcoming(&self, count: usize) -> Result<Vec<DateTime<Utc>>, EngineError> {
        let mut out = Vec::with_capacity(count);
        let mut at = self.remind_at;
        for i in 0..count {
            if i > 0 {
                match self.kind {
                    ReminderKind::OneTime => break,
                    ReminderKind::Ongoing {
                        interval_unit,
                        interval_value,
                    } => at = interval_unit.advance(at, interval_value)?,
                }
            }
            out.push(at);
        }
        Ok(out)
    }
}
