//! Chat / name normalisation configuration (§4.3).

use super::defaults::{default_chat_cooldown_ms, default_max_message_len, default_max_name_len};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct ChatConfig {
    /// Minimum interval between accepted chat messages from one connection.
    #[serde(default = "default_chat_cooldown_ms")]
    pub chat_cooldown_ms: u64,
    /// Chat messages are truncated to this many code points.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
    /// Player names / nicknames are truncated to this many code points.
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            chat_cooldown_ms: default_chat_cooldown_ms(),
            max_message_len: default_max_message_len(),
            max_name_len: default_max_name_len(),
        }
    }
}
