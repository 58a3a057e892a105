//! Streak calculation over a habit's completion history.
//!
//! A streak is a run of completion days where each day follows the previous
//! one within the policy's gap tolerance ([`FrequencyPolicy::max_gap`]).
//! The calculation is a single left fold over the sorted, de-duplicated days:
//! it yields the historical best run, the run ending at the most recent
//! completion, and the cumulative streak bonus XP earned along the way.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::days_between;
use crate::error::EngineError;
use crate::frequency::FrequencyPolicy;

/// Default XP for a single completion day.
pub const XP_PER_COMPLETION: u64 = 10;
/// Default bonus per day of running streak.
pub const STREAK_BONUS_PER_DAY: u64 = 2;
/// Default ceiling on the bonus a single day can earn.
pub const STREAK_BONUS_CAP: u64 = 20;

/// XP rules applied to a habit's completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpRules {
    pub per_completion: u64,
    pub streak_bonus_per_day: u64,
    pub streak_bonus_cap: u64,
}

impl Default for XpRules {
    fn default() -> Self {
        Self {
            per_completion: XP_PER_COMPLETION,
            streak_bonus_per_day: STREAK_BONUS_PER_DAY,
            streak_bonus_cap: STREAK_BONUS_CAP,
        }
    }
}

impl XpRules {
    /// Bonus earned by the day that brings a run to `run_len`.
    pub fn bonus_for_run(&self, run_len: u32) -> u64 {
        (u64::from(run_len) * self.streak_bonus_per_day).min(self.streak_bonus_cap)
    }
}

/// Result of a streak computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Length of the live run ending at the latest completion, 0 if lapsed.
    pub current: u32,
    /// Longest run ever seen, never lower than the previously recorded best.
    pub best: u32,
    /// Cumulative bonus XP earned by every day that extended a run.
    pub bonus_xp: u64,
}

/// Compute current/best streak and bonus XP.
///
/// `days` may be unsorted and contain duplicates; same-day entries collapse
/// to one. `previous_best` is merged into the result so a historical best
/// never shrinks. `reference` is the day the streak is evaluated on.
///
/// # Errors
/// `InvalidPolicy` if the policy fails validation.
pub fn compute_streak<I>(
    days: I,
    policy: &FrequencyPolicy,
    reference: NaiveDate,
    previous_best: u32,
    rules: &XpRules,
) -> Result<StreakSummary, EngineError>
where
    I: IntoIterator<Item = NaiveDate>,
{
    policy.validate()?;
    let max_gap = policy.max_gap();

    let mut sorted: Vec<NaiveDate> = days.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();

    let Some(&last) = sorted.last() else {
        return Ok(StreakSummary {
            current: 0,
            best: previous_best,
            bonus_xp: 0,
        });
    };

    let mut run: u32 = 0;
    let mut best = previous_best;
    let mut bonus_xp = 0u64;
    let mut prev: Option<NaiveDate> = None;

    for day in sorted.iter().copied() {
        match prev {
            Some(p) if days_between(p, day) <= max_gap => {
                run += 1;
                bonus_xp += rules.bonus_for_run(run);
            }
            _ => run = 1,
        }
        best = best.max(run);
        prev = Some(day);
    }

    // A completion dated after the reference day still counts as live.
    let current = if days_between(last, reference) <= max_gap {
        run
    } else {
        0
    };

    Ok(StreakSummary {
        current,
        best,
        bonus_xp,
    })
}
