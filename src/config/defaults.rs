//! Default value functions for configuration fields.
//!
//! Grouped by sub-config, mirroring the `#[serde(default = ...)]` functions
//! used throughout `crate::config`.

use super::logging::LogFormat;

// =============================================================================
// Server
// =============================================================================

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub const fn default_port() -> u16 {
    3000
}

pub fn default_cors_origins() -> String {
    "*".to_string()
}

// =============================================================================
// Engine (§6.4)
// =============================================================================

pub const fn default_grid_size() -> i32 {
    10
}

pub const fn default_mines_count() -> i32 {
    18
}

pub const fn default_turn_time_limit_secs() -> i64 {
    30
}

pub const fn default_min_reveals_to_pass() -> u32 {
    1
}

pub const fn default_score_per_tile() -> i64 {
    10
}

// =============================================================================
// Room registry
// =============================================================================

pub const fn default_room_code_length() -> usize {
    6
}

pub const fn default_room_idle_timeout_ms() -> u64 {
    30 * 60 * 1000
}

pub const fn default_idle_sweep_interval_secs() -> u64 {
    5 * 60
}

pub const fn default_max_rooms() -> usize {
    10_000
}

// =============================================================================
// Chat
// =============================================================================

pub const fn default_chat_cooldown_ms() -> u64 {
    2000
}

pub const fn default_max_message_len() -> usize {
    50
}

pub const fn default_max_name_len() -> usize {
    10
}

// =============================================================================
// Journal
// =============================================================================

pub fn default_data_dir() -> String {
    "data".to_string()
}

pub fn default_rooms_subdir() -> String {
    "rooms".to_string()
}

pub fn default_archive_subdir() -> String {
    "archive".to_string()
}

// =============================================================================
// Logging
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

// =============================================================================
// Security / admin
// =============================================================================

pub fn default_admin_username() -> String {
    "admin".to_string()
}

pub const fn default_admin_token_ttl_secs() -> i64 {
    24 * 60 * 60
}

pub const fn default_require_admin_auth() -> bool {
    true
}
