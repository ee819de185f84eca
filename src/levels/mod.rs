//! Level Progression
//!
//! Maps a cumulative XP total, as reported by the gamification API,
//! to a named level and the progress towards the next one.
//!
//! - [`LevelTable`]: ordered, validated table of level thresholds
//! - [`LevelInfo`]: derived view for a single XP value
//!
//! Nothing here is persisted; level info is recomputed on every query.

mod progress;
mod table;

pub use progress::{compute_level_info, LevelInfo};
pub use table::{Level, LevelTable, LevelTableError};
