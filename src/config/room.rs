//! Room registry configuration (component C4).

use super::defaults::{
    default_idle_sweep_interval_secs, default_max_rooms, default_room_code_length,
    default_room_idle_timeout_ms,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// Number of characters in a generated room code.
    #[serde(default = "default_room_code_length")]
    pub room_code_length: usize,
    /// A `waiting`/`finished` room older than this is swept (milliseconds).
    #[serde(default = "default_room_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Interval between idle sweeps, in seconds.
    #[serde(default = "default_idle_sweep_interval_secs")]
    pub idle_sweep_interval_secs: u64,
    /// Soft cap on concurrently live rooms; `create_room` is refused past it.
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            room_code_length: default_room_code_length(),
            idle_timeout_ms: default_room_idle_timeout_ms(),
            idle_sweep_interval_secs: default_idle_sweep_interval_secs(),
            max_rooms: default_max_rooms(),
        }
    }
}
