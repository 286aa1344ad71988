//! The on-disk schema for a room journal (§4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::{DanmakuPayload, EngineSettingsPayload, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDocument {
    #[serde(rename = "roomCode")]
    pub room_code: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "hostName")]
    pub host_name: String,
    #[serde(rename = "guestName")]
    pub guest_name: Option<String>,
    pub settings: EngineSettingsPayload,
    pub messages: Vec<ChatEntry>,
    pub games: Vec<GameRecord>,
    pub events: Vec<RoomEvent>,
    #[serde(rename = "closedAt")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl RoomDocument {
    pub fn new(room_code: String) -> Self {
        Self {
            room_code,
            created_at: Utc::now(),
            host_name: String::new(),
            guest_name: None,
            settings: EngineSettingsPayload {
                grid_size: 0,
                mines_count: 0,
                turn_time_limit: 0,
                min_reveals_to_pass: 0,
            },
            messages: Vec::new(),
            games: Vec::new(),
            events: Vec::new(),
            closed_at: None,
        }
    }

    pub fn close(&mut self) {
        self.closed_at = Some(Utc::now());
        self.events.push(RoomEvent::room_closed());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub nickname: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "isPlayer")]
    pub is_player: bool,
}

impl From<DanmakuPayload> for ChatEntry {
    fn from(payload: DanmakuPayload) -> Self {
        Self {
            nickname: payload.nickname,
            message: payload.message,
            timestamp: payload.timestamp,
            is_player: payload.is_player,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveEntry {
    pub player: Role,
    pub x: i32,
    pub z: i32,
    #[serde(rename = "hitMine")]
    pub hit_mine: bool,
    pub timestamp: DateTime<Utc>,
}

impl MoveEntry {
    pub fn new(player: Role, x: i32, z: i32, hit_mine: bool) -> Self {
        Self {
            player,
            x,
            z,
            hit_mine,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "endedAt")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(rename = "startingPlayer")]
    pub starting_player: Role,
    pub settings: EngineSettingsPayload,
    pub moves: Vec<MoveEntry>,
    pub result: Option<GameResult>,
}

impl GameRecord {
    pub fn new(starting_player: Role, settings: EngineSettingsPayload) -> Self {
        Self {
            started_at: Utc::now(),
            ended_at: None,
            starting_player,
            settings,
            moves: Vec::new(),
            result: None,
        }
    }

    pub fn finish(&mut self, winner: Role, reason: String) {
        self.ended_at = Some(Utc::now());
        self.result = Some(GameResult { winner, reason });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Role,
    pub reason: String,
}

/// Lifecycle events that do not fit the chat/move streams: guest joins,
/// player renames, and the final `room_closed` marker (§4.4 archival).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    GuestJoined { timestamp: DateTime<Utc> },
    PlayerRenamed { role: Role, #[serde(rename = "newName")] new_name: String, timestamp: DateTime<Utc> },
    RoomClosed { timestamp: DateTime<Utc> },
}

impl RoomEvent {
    pub fn guest_joined() -> Self {
        RoomEvent::GuestJoined { timestamp: Utc::now() }
    }

    pub fn player_renamed(role: Role, new_name: String) -> Self {
        RoomEvent::PlayerRenamed { role, new_name, timestamp: Utc::now() }
    }

    pub fn room_closed() -> Self {
        RoomEvent::RoomClosed { timestamp: Utc::now() }
    }
}
