//! Level table definitions
//!
//! A level table is an ordered list of levels with strictly increasing
//! XP thresholds, starting at 0 so every user begins at level 1.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Standard levels: (ordinal, threshold, name)
const STANDARD_LEVELS: &[(u32, i64, &str)] = &[
    (1, 0, "Rookie"),
    (2, 100, "Active"),
    (3, 250, "Mover"),
    (4, 500, "Athlete"),
    (5, 1_000, "Challenger"),
    (6, 2_000, "Competitor"),
    (7, 3_500, "Champion"),
    (8, 5_000, "Elite"),
    (9, 7_500, "Legend"),
    (10, 10_000, "Olympian"),
];

/// A single named tier unlocked once XP crosses its threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Ordinal, starting at 1
    pub level: u32,
    /// Minimum cumulative XP to attain this level
    pub xp_threshold: i64,
    /// Display label
    pub name: String,
}

impl Level {
    pub fn new(level: u32, xp_threshold: i64, name: impl Into<String>) -> Self {
        Self {
            level,
            xp_threshold,
            name: name.into(),
        }
    }
}

/// Errors raised when building a custom level table
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LevelTableError {
    #[error("Level table must contain at least one level")]
    Empty,

    #[error("First level threshold must be 0, got {0}")]
    NonZeroStart(i64),

    #[error("Level ordinals must start at 1 and increase, got {got} after {previous}")]
    NonIncreasingLevel { previous: u32, got: u32 },

    #[error("XP thresholds must strictly increase, got {got} after {previous} at level {level}")]
    NonIncreasingThreshold { level: u32, previous: i64, got: i64 },

    #[error("Level {0} has an empty name")]
    EmptyName(u32),
}

/// Ordered, immutable table of levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl LevelTable {
    /// Build a table, checking ordering invariants
    pub fn new(levels: Vec<Level>) -> Result<Self, LevelTableError> {
        let first = levels.first().ok_or(LevelTableError::Empty)?;

        if first.xp_threshold != 0 {
            return Err(LevelTableError::NonZeroStart(first.xp_threshold));
        }
        if first.level == 0 {
            return Err(LevelTableError::NonIncreasingLevel {
                previous: 0,
                got: 0,
            });
        }

        for level in &levels {
            if level.name.trim().is_empty() {
                return Err(LevelTableError::EmptyName(level.level));
            }
        }

        for pair in levels.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.level <= prev.level {
                return Err(LevelTableError::NonIncreasingLevel {
                    previous: prev.level,
                    got: next.level,
                });
            }
            if next.xp_threshold <= prev.xp_threshold {
                return Err(LevelTableError::NonIncreasingThreshold {
                    level: next.level,
                    previous: prev.xp_threshold,
                    got: next.xp_threshold,
                });
            }
        }

        Ok(Self { levels })
    }

    /// The table shipped with the application
    pub fn standard() -> &'static LevelTable {
        static TABLE: OnceLock<LevelTable> = OnceLock::new();
        TABLE.get_or_init(|| LevelTable {
            levels: STANDARD_LEVELS
                .iter()
                .map(|(level, threshold, name)| Level::new(*level, *threshold, *name))
                .collect(),
        })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Highest level in the table
    pub fn max_level(&self) -> &Level {
        // Non-empty by construction
        &self.levels[self.levels.len() - 1]
    }

    /// Index of the highest level whose threshold is <= xp.
    ///
    /// Thresholds are inclusive lower bounds. XP below the first
    /// threshold floors to index 0.
    pub fn index_for_xp(&self, xp: i64) -> usize {
        self.levels
            .iter()
            .rposition(|level| xp >= level.xp_threshold)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_valid() {
        let standard = LevelTable::standard();
        let rebuilt = LevelTable::new(standard.levels().to_vec()).unwrap();
        assert_eq!(&rebuilt, standard);
        assert_eq!(standard.levels()[0].name, "Rookie");
        assert_eq!(standard.max_level().level, 10);
    }

    #[test]
    fn test_rejects_empty_table() {
        assert_eq!(LevelTable::new(vec![]), Err(LevelTableError::Empty));
    }

    #[test]
    fn test_rejects_non_zero_start() {
        let err = LevelTable::new(vec![Level::new(1, 10, "Rookie")]).unwrap_err();
        assert_eq!(err, LevelTableError::NonZeroStart(10));
    }

    #[test]
    fn test_rejects_duplicate_threshold() {
        let err = LevelTable::new(vec![
            Level::new(1, 0, "Rookie"),
            Level::new(2, 100, "Active"),
            Level::new(3, 100, "Mover"),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            LevelTableError::NonIncreasingThreshold {
                level: 3,
                previous: 100,
                got: 100
            }
        );
    }

    #[test]
    fn test_rejects_out_of_order_levels() {
        let err = LevelTable::new(vec![
            Level::new(1, 0, "Rookie"),
            Level::new(1, 100, "Active"),
        ])
        .unwrap_err();
        assert!(matches!(err, LevelTableError::NonIncreasingLevel { .. }));
    }

    #[test]
    fn test_rejects_blank_name() {
        let err = LevelTable::new(vec![Level::new(1, 0, "  ")]).unwrap_err();
        assert_eq!(err, LevelTableError::EmptyName(1));
    }

    #[test]
    fn test_index_for_xp_is_inclusive() {
        let table = LevelTable::standard();
        assert_eq!(table.index_for_xp(0), 0);
        assert_eq!(table.index_for_xp(99), 0);
        assert_eq!(table.index_for_xp(100), 1);
        assert_eq!(table.index_for_xp(-50), 0);
        assert_eq!(table.index_for_xp(1_000_000), table.len() - 1);
    }
}
