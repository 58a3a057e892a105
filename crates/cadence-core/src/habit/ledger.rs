//! Completion ledger: toggle semantics for a single day.
//!
//! Every mutation of the completion set goes through [`HabitLedger`], which
//! rebuilds the streak and XP fields from scratch before handing the habit
//! back. There is no incremental update path.

use chrono::NaiveDate;

use super::streak::{compute_streak, XpRules};
use super::{CompletionRecord, Habit};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, Default)]
pub struct HabitLedger {
    rules: XpRules,
}

impl HabitLedger {
    pub fn new(rules: XpRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &XpRules {
        &self.rules
    }

    /// Add a completion on `date` if there is none, otherwise remove it.
    ///
    /// Returns the updated habit with streak and XP recomputed as of
    /// `reference`. The input habit is left untouched.
    ///
    /// # Errors
    /// `InvalidPolicy` if the habit's policy fails validation; in that case
    /// no mutation is returned.
    pub fn toggle_completion(
        &self,
        habit: &Habit,
        date: NaiveDate,
        reference: NaiveDate,
    ) -> Result<Habit, EngineError> {
        let mut next = habit.clone();
        normalize(&mut next.completions);
        match next
            .completions
            .binary_search_by_key(&date, |c| c.occurred_on)
        {
            Ok(idx) => {
                next.completions.remove(idx);
            }
            Err(idx) => {
                next.completions
                    .insert(idx, CompletionRecord::new(next.owner_id.clone(), date));
            }
        }
        self.rederive(&mut next, reference)?;

        tracing::debug!(
            habit_id = %next.id,
            %date,
            completed = next.is_completed_on(date),
            current = next.current_streak,
            best = next.best_streak,
            xp = next.xp,
            "toggled completion"
        );
        Ok(next)
    }

    /// Recompute the derived fields as of `reference` without touching the
    /// completion set. Used to age a stored streak into a lapsed one.
    pub fn recompute(&self, habit: &Habit, reference: NaiveDate) -> Result<Habit, EngineError> {
        let mut next = habit.clone();
        normalize(&mut next.completions);
        self.rederive(&mut next, reference)?;
        Ok(next)
    }

    fn rederive(&self, habit: &mut Habit, reference: NaiveDate) -> Result<(), EngineError> {
        let summary = compute_streak(
            habit.completions.iter().map(|c| c.occurred_on),
            &habit.policy,
            reference,
            habit.best_streak,
            &self.rules,
        )?;
        let base = habit.completions.len() as u64 * self.rules.per_completion;

        // Pin the credited total of a legacy record before its xp changes.
        habit.awarded_xp.get_or_insert(habit.xp);

        habit.current_streak = summary.current;
        habit.best_streak = summary.best.max(summary.current);
        habit.xp = base + summary.bonus_xp;
        Ok(())
    }
}

/// Sort by day and drop same-day duplicates, keeping the first record.
fn normalize(completions: &mut Vec<CompletionRecord>) {
    completions.sort_by_key(|c| c.occurred_on);
    completions.dedup_by_key(|c| c.occurred_on);
}
