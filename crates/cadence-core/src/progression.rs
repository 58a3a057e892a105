//! XP and level progression.
//!
//! Levels are derived on demand from a cumulative XP total and never stored.
//! Each level costs `base + (min(level, cap) - 1) * increment` XP, so the
//! curve grows linearly up to the cap level and is flat after it.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// XP needed to clear level 1.
pub const BASE_XP: u64 = 100;
/// Extra XP each level costs over the previous one.
pub const XP_INCREMENT: u64 = 20;
/// Level after which the per-level cost stops growing.
pub const CAP_LEVEL: u32 = 20;

/// Shape of the level curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionRules {
    pub base_xp: u64,
    pub increment: u64,
    pub cap_level: u32,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            base_xp: BASE_XP,
            increment: XP_INCREMENT,
            cap_level: CAP_LEVEL,
        }
    }
}

/// Derived level state for a given XP total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    /// XP accumulated inside the current level.
    pub current_level_xp: u64,
    /// XP the current level costs in total.
    pub next_level_xp: u64,
    /// 0.0 .. 100.0
    pub progress: f64,
}

impl ProgressionRules {
    /// XP required to clear `level`. Levels below 1 are treated as level 1.
    pub fn required_xp(&self, level: u32) -> u64 {
        let capped = level.clamp(1, self.cap_level.max(1));
        let cost = self.base_xp + u64::from(capped - 1) * self.increment;
        // A zero-cost level would never terminate the walk in `level_info`.
        cost.max(1)
    }

    /// Map a cumulative XP total to its level.
    ///
    /// # Errors
    /// `InvalidXp` if `total_xp` is negative.
    pub fn level_info(&self, total_xp: i64) -> Result<LevelInfo, EngineError> {
        if total_xp < 0 {
            return Err(EngineError::InvalidXp(total_xp));
        }
        let mut remaining = total_xp as u64;
        let mut level: u32 = 1;

        while level < self.cap_level && remaining >= self.required_xp(level) {
            remaining -= self.required_xp(level);
            level += 1;
        }

        // Past the cap every level costs the same; skip ahead arithmetically.
        let required = self.required_xp(level);
        if remaining >= required {
            let skipped = remaining / required;
            remaining %= required;
            level = level.saturating_add(u32::try_from(skipped).unwrap_or(u32::MAX));
        }

        Ok(LevelInfo {
            level,
            current_level_xp: remaining,
            next_level_xp: required,
            progress: remaining as f64 / required as f64 * 100.0,
        })
    }

    /// Total XP at which `level` is first reached.
    pub fn xp_to_reach(&self, level: u32) -> u64 {
        (1..level.max(1)).map(|l| self.required_xp(l)).sum()
    }

    /// Levels crossed when the total moves from `before` to `after`.
    pub fn levels_gained(&self, before: u64, after: u64) -> Result<u32, EngineError> {
        let from = self.level_info(clamp_i64(before))?.level;
        let to = self.level_info(clamp_i64(after))?.level;
        Ok(to.saturating_sub(from))
    }
}

fn clamp_i64(xp: u64) -> i64 {
    i64::try_from(xp).unwrap_or(i64::MAX)
}

/// `level_info` with the default rules.
pub fn level_info(total_xp: i64) -> Result<LevelInfo, EngineError> {
    ProgressionRules::default().level_info(total_xp)
}

/// `required_xp` with the default rules.
pub fn required_xp(level: u32) -> u64 {
    ProgressionRules::default().required_xp(level)
}
