//! Root configuration aggregate.

use super::chat::ChatConfig;
use super::engine::EngineConfig;
use super::journal::JournalConfig;
use super::logging::LoggingConfig;
use super::room::RoomConfig;
use super::security::SecurityConfig;
use super::server::ServerConfig;
use serde::{Deserialize, Serialize};

/// Root configuration for the Minesweeper duel server. Each sub-config is
/// independently `#[serde(default)]` so a partial JSON document (or no
/// document at all) still produces a complete, valid `Config`.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub room: RoomConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}
