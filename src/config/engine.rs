//! Game engine tuning parameters (§6.4, component C1).

use super::defaults::{
    default_grid_size, default_min_reveals_to_pass, default_mines_count, default_score_per_tile,
    default_turn_time_limit_secs,
};
use serde::{Deserialize, Serialize};

/// Immutable per-room engine settings. A room snapshots this at creation
/// time (`Room::settings`); later config reloads do not affect in-flight
/// rooms.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Side length of the square grid.
    #[serde(default = "default_grid_size")]
    pub grid_size: i32,
    /// Number of mines placed per game.
    #[serde(default = "default_mines_count")]
    pub mines_count: i32,
    /// Per-turn countdown, in seconds.
    #[serde(default = "default_turn_time_limit_secs")]
    pub turn_time_limit_secs: i64,
    /// Minimum reveals required in a turn before `pass_turn` is accepted.
    #[serde(default = "default_min_reveals_to_pass")]
    pub min_reveals_to_pass: u32,
    /// Score granted per revealed safe tile, except the match's first click.
    #[serde(default = "default_score_per_tile")]
    pub score_per_tile: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            mines_count: default_mines_count(),
            turn_time_limit_secs: default_turn_time_limit_secs(),
            min_reveals_to_pass: default_min_reveals_to_pass(),
            score_per_tile: default_score_per_tile(),
        }
    }
}

impl EngineConfig {
    /// Reject settings that cannot produce a legal game (e.g. more mines
    /// than tiles, or a mine count that would leave no safe first-click
    /// zone on the smallest grids).
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_size <= 0 {
            return Err(format!("grid_size must be positive, got {}", self.grid_size));
        }
        let area = self.grid_size * self.grid_size;
        if self.mines_count < 0 {
            return Err(format!("mines_count must not be negative, got {}", self.mines_count));
        }
        if self.mines_count >= area {
            return Err(format!(
                "mines_count ({}) must be less than grid area ({area})",
                self.mines_count
            ));
        }
        if self.turn_time_limit_secs <= 0 {
            return Err(format!(
                "turn_time_limit_secs must be positive, got {}",
                self.turn_time_limit_secs
            ));
        }
        Ok(())
    }
}
