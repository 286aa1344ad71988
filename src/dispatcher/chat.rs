//! Name/message normalisation and chat rate limiting (§4.3).

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::protocol::ConnId;

/// Truncates to at most `max_len` Unicode scalar values and trims
/// surrounding whitespace. Returns `None` if nothing is left afterward.
pub fn normalize(raw: &str, max_len: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let truncated: String = trimmed.chars().take(max_len).collect();
    if truncated.is_empty() {
        None
    } else {
        Some(truncated)
    }
}

/// Tracks the last accepted chat send per connection and silently drops
/// messages sent before the configured cooldown elapses (§7 "Rate limit
/// (chat)": silent drop, client self-throttles).
pub struct ChatLimiter {
    cooldown: Duration,
    last_sent: DashMap<ConnId, Instant>,
}

impl ChatLimiter {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown: Duration::from_millis(cooldown_ms),
            last_sent: DashMap::new(),
        }
    }

    /// Returns `true` if a message from `conn_id` right now is within the
    /// cooldown window. Does not itself register the attempt — call
    /// [`ChatLimiter::record`] once the message is actually accepted.
    pub fn is_limited(&self, conn_id: ConnId) -> bool {
        match self.last_sent.get(&conn_id) {
            Some(last) => last.elapsed() < self.cooldown,
            None => false,
        }
    }

    pub fn record(&self, conn_id: ConnId) {
        self.last_sent.insert(conn_id, Instant::now());
    }

    pub fn remove(&self, conn_id: ConnId) {
        self.last_sent.remove(&conn_id);
    }
}
