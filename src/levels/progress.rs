//! XP to level computation

use serde::{Deserialize, Serialize};

use super::table::{Level, LevelTable};

/// Level standing derived from a raw XP total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub current_level: Level,
    /// None once the last level is reached
    pub next_level: Option<Level>,
    /// Percentage towards the next level, clamped to [0, 100]
    pub progress_to_next_level: f64,
    /// XP earned since the current level's threshold
    pub xp_in_current_level: i64,
    /// Span between current and next threshold, 0 at max level
    pub xp_required_for_next_level: i64,
}

impl LevelInfo {
    /// XP still needed to reach the next level
    pub fn xp_to_next_level(&self) -> i64 {
        (self.xp_required_for_next_level - self.xp_in_current_level).max(0)
    }

    pub fn is_max_level(&self) -> bool {
        self.next_level.is_none()
    }
}

impl LevelTable {
    /// Compute level info for an XP total.
    ///
    /// Never fails: negative or corrupted totals floor to the first
    /// level and the percentage is clamped.
    pub fn level_info(&self, xp: i64) -> LevelInfo {
        let index = self.index_for_xp(xp);
        let levels = self.levels();
        let current = &levels[index];
        let next = levels.get(index + 1);

        let xp_in_current_level = xp.saturating_sub(current.xp_threshold).max(0);

        let (xp_required_for_next_level, progress) = match next {
            Some(next) => {
                let span = next.xp_threshold - current.xp_threshold;
                let progress = 100.0 * xp_in_current_level as f64 / span as f64;
                (span, progress.clamp(0.0, 100.0))
            }
            None => (0, 100.0),
        };

        LevelInfo {
            current_level: current.clone(),
            next_level: next.cloned(),
            progress_to_next_level: progress,
            xp_in_current_level,
            xp_required_for_next_level,
        }
    }
}

/// Compute level info against the standard level table
pub fn compute_level_info(xp: i64) -> LevelInfo {
    LevelTable::standard().level_info(xp)
}
