//! Per-owner cumulative XP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::progression::{LevelInfo, ProgressionRules};

/// The persisted XP scalar levels are derived from.
///
/// `total_xp` only ever grows: XP is awarded, never taken back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub owner_id: String,
    #[serde(default)]
    pub total_xp: u64,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            total_xp: 0,
            updated_at: Utc::now(),
        }
    }

    /// Add `xp` to the total and return the number of levels crossed.
    pub fn award(&mut self, xp: u64, rules: &ProgressionRules) -> Result<u32, EngineError> {
        let before = self.total_xp;
        self.total_xp = self.total_xp.saturating_add(xp);
        self.updated_at = Utc::now();
        rules.levels_gained(before, self.total_xp)
    }

    pub fn level(&self, rules: &ProgressionRules) -> Result<LevelInfo, EngineError> {
        rules.level_info(i64::try_from(self.total_xp).unwrap_or(i64::MAX))
    }
}
