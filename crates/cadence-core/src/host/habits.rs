//! Habit operations wired to storage and the XP profile.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frequency::FrequencyPolicy;
use crate::habit::{Habit, HabitLedger, HabitSnapshot, XpRules};
use crate::profile::Profile;
use crate::progression::{LevelInfo, ProgressionRules};
use crate::storage::{Config, EntityStore};

/// Outcome of toggling one day on one habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleReport {
    pub habit: HabitSnapshot,
    pub date: NaiveDate,
    /// Whether the day is completed after the toggle.
    pub completed: bool,
    /// XP added to the owner's profile by this toggle.
    pub xp_awarded: u64,
    pub total_xp: u64,
    pub level: LevelInfo,
    pub levels_gained: u32,
}

pub struct HabitService<'a, S> {
    store: &'a S,
    ledger: HabitLedger,
    progression: ProgressionRules,
}

impl<'a, S: EntityStore> HabitService<'a, S> {
    pub fn new(store: &'a S, xp: XpRules, progression: ProgressionRules) -> Self {
        Self {
            store,
            ledger: HabitLedger::new(xp),
            progression,
        }
    }

    pub fn from_config(store: &'a S, config: &Config) -> Self {
        Self::new(store, config.xp, config.progression)
    }

    /// Validate the policy and store a new habit.
    pub fn create(
        &self,
        owner_id: &str,
        name: &str,
        policy: FrequencyPolicy,
        anchor: NaiveDate,
    ) -> Result<Habit> {
        let habit = Habit::new(owner_id, name, policy, anchor)?;
        self.store.put(&habit)?;
        tracing::info!(habit_id = %habit.id, owner_id, policy = %habit.policy, "habit created");
        Ok(habit)
    }

    pub fn get(&self, habit_id: &str) -> Result<Habit> {
        Ok(self.store.require(habit_id)?)
    }

    pub fn list(&self, owner_id: &str) -> Result<Vec<Habit>> {
        Ok(self.store.list(owner_id)?)
    }

    /// Toggle `date` on a habit, persist the recomputed habit, and award any
    /// XP gained to the owner's profile.
    ///
    /// Un-completing a day lowers the habit's own XP but never takes XP
    /// back from the profile, and re-completing it pays nothing until the
    /// habit's XP passes what it already credited.
    pub fn toggle(&self, habit_id: &str, date: NaiveDate, today: NaiveDate) -> Result<ToggleReport> {
        let habit: Habit = self.store.require(habit_id)?;
        let mut updated = self.ledger.toggle_completion(&habit, date, today)?;
        let xp_awarded = updated.claim_xp();
        self.store.put(&updated)?;

        let mut profile = self.profile(&updated.owner_id)?;
        let levels_gained = if xp_awarded > 0 {
            let gained = profile.award(xp_awarded, &self.progression)?;
            self.store.put(&profile)?;
            gained
        } else {
            0
        };
        if levels_gained > 0 {
            tracing::info!(owner_id = %profile.owner_id, levels_gained, total_xp = profile.total_xp, "level up");
        }

        Ok(ToggleReport {
            habit: updated.snapshot(),
            date,
            completed: updated.is_completed_on(date),
            xp_awarded,
            total_xp: profile.total_xp,
            level: profile.level(&self.progression)?,
            levels_gained,
        })
    }

    /// Habits scheduled on `day` and not yet completed.
    ///
    /// A habit whose stored policy is malformed is logged and left out.
    pub fn due_on(&self, owner_id: &str, day: NaiveDate) -> Result<Vec<Habit>> {
        let mut due = Vec::new();
        for habit in self.list(owner_id)? {
            match habit.is_due(day) {
                Ok(true) => due.push(habit),
                Ok(false) => {}
                Err(e) => tracing::warn!(habit_id = %habit.id, error = %e, "skipping habit"),
            }
        }
        Ok(due)
    }

    /// Re-evaluate every streak as of `today` so lapsed streaks read as 0,
    /// persisting the habits whose derived state changed.
    pub fn refresh(&self, owner_id: &str, today: NaiveDate) -> Result<Vec<HabitSnapshot>> {
        let mut out = Vec::new();
        for habit in self.list(owner_id)? {
            match self.ledger.recompute(&habit, today) {
                Ok(fresh) => {
                    if fresh != habit {
                        self.store.put(&fresh)?;
                    }
                    out.push(fresh.snapshot());
                }
                Err(e) => {
                    tracing::warn!(habit_id = %habit.id, error = %e, "skipping habit");
                }
            }
        }
        Ok(out)
    }

    pub fn remove(&self, habit_id: &str) -> Result<bool> {
        Ok(self.store.delete::<Habit>(habit_id)?)
    }

    /// The owner's profile, or a fresh zero-XP one.
    pub fn profile(&self, owner_id: &str) -> Result<Profile> {
        Ok(self
            .store
            .get::<Profile>(owner_id)?
            .unwrap_or_else(|| Profile::new(owner_id)))
    }

    pub fn level(&self, owner_id: &str) -> Result<LevelInfo> {
        Ok(self.profile(owner_id)?.level(&self.progression)?)
    }
}
