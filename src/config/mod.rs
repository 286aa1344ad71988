//! Layered configuration for the Minesweeper duel server.
//!
//! A root [`Config`] aggregates per-concern sub-configs, each with its own
//! `#[serde(default)]` leaves and a manual or derived `Default` impl. See
//! [`loader::load`] for the precedence chain (env JSON, stdin, file, CWD
//! `config.json`, executable-relative `config.json`, compiled defaults)
//! and the `MINESWEEPER__`-prefixed environment override convention.

pub mod chat;
pub mod defaults;
pub mod engine;
pub mod journal;
pub mod loader;
pub mod logging;
pub mod room;
pub mod security;
pub mod server;
pub mod types;
pub mod validation;

pub use chat::ChatConfig;
pub use engine::EngineConfig;
pub use journal::JournalConfig;
pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use room::RoomConfig;
pub use security::SecurityConfig;
pub use server::ServerConfig;
pub use types::Config;
pub use validation::{is_production_mode, validate_config_security};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.engine.grid_size, 10);
        assert_eq!(config.engine.mines_count, 18);
        assert_eq!(config.engine.turn_time_limit_secs, 30);
        assert_eq!(config.engine.min_reveals_to_pass, 1);
        assert_eq!(config.room.room_code_length, 6);
        assert_eq!(config.room.idle_timeout_ms, 30 * 60 * 1000);
        assert_eq!(config.chat.chat_cooldown_ms, 2000);
        assert_eq!(config.chat.max_message_len, 50);
        assert_eq!(config.chat.max_name_len, 10);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config.engine.grid_size, deserialized.engine.grid_size);
        assert_eq!(config.room.room_code_length, deserialized.room.room_code_length);
    }

    #[test]
    fn partial_json_document_fills_in_defaults() {
        let partial = serde_json::json!({ "engine": { "grid_size": 16 } });
        let config: Config = serde_json::from_value(partial).unwrap();
        assert_eq!(config.engine.grid_size, 16);
        assert_eq!(config.engine.mines_count, 18);
        assert_eq!(config.room.room_code_length, 6);
    }
}
