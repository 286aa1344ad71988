//! Room data model and registry (component C4): the in-memory table of
//! rooms keyed by 6-char code, player-role lookup, spectator membership,
//! and idle sweeping.

pub mod registry;

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::engine::GameEngine;
use crate::protocol::{ConnId, DanmakuPayload, GameStatus, MatchStats, Role};

pub use registry::{LeaveOutcome, RoomRegistry};

/// How many recent chat messages a room keeps in memory so a late-joining
/// spectator's `spectate_joined.messageHistory` doesn't require a disk
/// round-trip through the journal's write-only actor (§4.4, §6.2).
pub const CHAT_HISTORY_CAPACITY: usize = 50;

/// A seated player (host or guest).
#[derive(Debug, Clone)]
pub struct Player {
    pub conn_id: ConnId,
    pub name: String,
}

/// A single room: two seats, a spectator set, the active game (if any),
/// and the bookkeeping carried across games (§3 "Room").
#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    pub host: Player,
    pub guest: Option<Player>,
    pub game_state: GameStatus,
    pub game: Option<GameEngine>,
    pub settings: EngineConfig,
    pub match_stats: MatchStats,
    pub next_starting_player: Role,
    pub spectators: HashSet<ConnId>,
    pub created_at: DateTime<Utc>,
    pub game_started_at: Option<DateTime<Utc>>,
    pub recent_chat: std::collections::VecDeque<DanmakuPayload>,
}

impl Room {
    pub fn new(code: String, host: Player, settings: EngineConfig, created_at: DateTime<Utc>) -> Self {
        Self {
            code,
            host,
            guest: None,
            game_state: GameStatus::Waiting,
            game: None,
            settings,
            match_stats: MatchStats::default(),
            next_starting_player: Role::Host,
            spectators: HashSet::new(),
            created_at,
            game_started_at: None,
            recent_chat: std::collections::VecDeque::with_capacity(CHAT_HISTORY_CAPACITY),
        }
    }

    /// The role a given connection holds in this room, if any (host/guest
    /// only; spectators are tracked separately via `spectators`).
    pub fn role_of(&self, conn_id: ConnId) -> Option<Role> {
        if self.host.conn_id == conn_id {
            Some(Role::Host)
        } else if self.guest.as_ref().is_some_and(|g| g.conn_id == conn_id) {
            Some(Role::Guest)
        } else {
            None
        }
    }

    pub fn player(&self, role: Role) -> Option<&Player> {
        match role {
            Role::Host => Some(&self.host),
            Role::Guest => self.guest.as_ref(),
        }
    }

    pub fn opponent_conn(&self, conn_id: ConnId) -> Option<ConnId> {
        match self.role_of(conn_id)? {
            Role::Host => self.guest.as_ref().map(|g| g.conn_id),
            Role::Guest => Some(self.host.conn_id),
        }
    }

    pub fn push_chat(&mut self, payload: DanmakuPayload) {
        if self.recent_chat.len() >= CHAT_HISTORY_CAPACITY {
            self.recent_chat.pop_front();
        }
        self.recent_chat.push_back(payload);
    }

    pub fn play_duration_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.game_started_at.map(|start| (now - start).num_seconds().max(0))
    }
}
