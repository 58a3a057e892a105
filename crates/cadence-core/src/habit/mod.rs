//! Habits: completion history plus the streak/XP snapshot derived from it.
//!
//! The derived fields (`current_streak`, `best_streak`, `xp`) are private and
//! only ever written by [`HabitLedger`], which recomputes all three from the
//! completion set in one step.

mod ledger;
mod streak;

pub use ledger::HabitLedger;
pub use streak::{
    compute_streak, StreakSummary, XpRules, STREAK_BONUS_CAP, STREAK_BONUS_PER_DAY,
    XP_PER_COMPLETION,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::frequency::FrequencyPolicy;

/// A single day's completion. Only its calendar day matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: String,
    pub owner_id: String,
    pub occurred_on: NaiveDate,
}

impl CompletionRecord {
    pub fn new(owner_id: impl Into<String>, occurred_on: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            occurred_on,
        }
    }
}

/// A recurring habit and its derived progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub policy: FrequencyPolicy,
    /// Day `EveryNDays` offsets are counted from (usually the creation day).
    pub anchor: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Sorted by day, at most one record per day.
    #[serde(default)]
    completions: Vec<CompletionRecord>,
    #[serde(default)]
    current_streak: u32,
    #[serde(default)]
    best_streak: u32,
    #[serde(default)]
    xp: u64,
    /// Highest `xp` already credited to the owner's profile. `None` only on
    /// records written before this was tracked.
    #[serde(default)]
    awarded_xp: Option<u64>,
}

impl Habit {
    /// Create a habit with an empty history.
    ///
    /// # Errors
    /// `InvalidPolicy` if the policy fails validation.
    pub fn new(
        owner_id: impl Into<String>,
        name: impl Into<String>,
        policy: FrequencyPolicy,
        anchor: NaiveDate,
    ) -> Result<Self, EngineError> {
        policy.validate()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            name: name.into(),
            policy,
            anchor,
            created_at: Utc::now(),
            completions: Vec::new(),
            current_streak: 0,
            best_streak: 0,
            xp: 0,
            awarded_xp: Some(0),
        })
    }

    pub fn completions(&self) -> &[CompletionRecord] {
        &self.completions
    }

    /// Completion days in ascending order.
    pub fn completion_days(&self) -> Vec<NaiveDate> {
        self.completions.iter().map(|c| c.occurred_on).collect()
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    /// XP this habit has already credited to its owner's profile.
    pub fn awarded_xp(&self) -> u64 {
        self.awarded_xp.unwrap_or(self.xp)
    }

    /// Credit any XP above the previous high-water mark and return it.
    ///
    /// Removing a day and adding it back yields nothing the second time.
    pub fn claim_xp(&mut self) -> u64 {
        let credited = self.awarded_xp();
        self.awarded_xp = Some(credited.max(self.xp));
        self.xp.saturating_sub(credited)
    }

    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.completions
            .binary_search_by_key(&day, |c| c.occurred_on)
            .is_ok()
    }

    /// Whether the habit is scheduled on `day` and not yet completed.
    pub fn is_due(&self, day: NaiveDate) -> Result<bool, EngineError> {
        Ok(self.policy.is_scheduled(day, self.anchor)? && !self.is_completed_on(day))
    }

    pub fn snapshot(&self) -> HabitSnapshot {
        HabitSnapshot {
            habit_id: self.id.clone(),
            name: self.name.clone(),
            frequency: self.policy.describe(),
            completions: self.completions.len(),
            current_streak: self.current_streak,
            best_streak: self.best_streak,
            xp: self.xp,
        }
    }
}

/// Read-only view of a habit's derived state, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitSnapshot {
    pub habit_id: String,
    pub name: String,
    pub frequency: String,
    pub completions: usize,
    pub current_streak: u32,
    pub best_streak: u32,
    pub xp: u64,
}
