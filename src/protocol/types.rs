//! Core identifiers and small value types shared across the engine, registry,
//! and dispatcher layers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single transport connection (player, spectator, or admin).
pub type ConnId = Uuid;

/// A player's seat in a room. The host creates the room; the guest joins it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    /// The other seat at the table.
    pub fn opponent(self) -> Role {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Guest => write!(f, "guest"),
        }
    }
}

/// Lifecycle state of a room (and, while a game is active, of its engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

/// The reason a game reached a terminal state.
///
/// `TimeoutHitMine` is unreachable under the auto-pass-then-forfeit timeout
/// design this crate implements; it is kept in the taxonomy so the wire
/// format stays compatible with any consumer that still matches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    HitMine,
    AllSafeRevealed,
    OpponentDisconnected,
    TimeoutNoAction,
    #[allow(dead_code)]
    TimeoutHitMine,
}

/// Per-player score tally, keyed by seat rather than a map so serialization
/// is a flat `{host, guest}` object as the wire protocol expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub host: i64,
    pub guest: i64,
}

impl Scores {
    pub fn zero() -> Self {
        Self { host: 0, guest: 0 }
    }

    pub fn get(&self, role: Role) -> i64 {
        match role {
            Role::Host => self.host,
            Role::Guest => self.guest,
        }
    }

    pub fn add(&mut self, role: Role, amount: i64) {
        match role {
            Role::Host => self.host += amount,
            Role::Guest => self.guest += amount,
        }
    }
}

/// Running win/loss tally for a room, carried across games until the room
/// is destroyed. Only updated on natural game ends (see invariant 8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub games_played: u32,
    pub host_wins: u32,
    pub guest_wins: u32,
}

impl MatchStats {
    pub fn record_win(&mut self, winner: Role) {
        self.games_played += 1;
        match winner {
            Role::Host => self.host_wins += 1,
            Role::Guest => self.guest_wins += 1,
        }
    }
}
