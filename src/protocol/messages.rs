//! Wire protocol: tagged JSON enums for client→server intents and
//! server→client events, per §6 of the specification.

use serde::{Deserialize, Serialize};

use super::error_codes::ErrorCode;
use super::grid::{ClientTile, Coord, RevealedTile, SpectatorTile};
use super::types::{GameOverReason, MatchStats, Role, Scores};
use crate::config::EngineConfig;

/// Engine tuning parameters as exposed on the wire (`game_start`,
/// `GET /api/config`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineSettingsPayload {
    #[serde(rename = "gridSize")]
    pub grid_size: i32,
    #[serde(rename = "minesCount")]
    pub mines_count: i32,
    #[serde(rename = "turnTimeLimit")]
    pub turn_time_limit: i64,
    #[serde(rename = "minRevealsToPass")]
    pub min_reveals_to_pass: u32,
}

impl From<&EngineConfig> for EngineSettingsPayload {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            grid_size: cfg.grid_size,
            mines_count: cfg.mines_count,
            turn_time_limit: cfg.turn_time_limit_secs,
            min_reveals_to_pass: cfg.min_reveals_to_pass,
        }
    }
}

/// Either the masked (player) or full "god view" (spectator/admin) grid.
/// Both variants serialize to a JSON array of tile objects, so the wire
/// shape for `game_start` is identical regardless of audience; only the
/// presence of `isMine`/`neighborMines` on hidden tiles differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridSnapshot {
    Masked(Vec<ClientTile>),
    Full(Vec<SpectatorTile>),
}

// ---------------------------------------------------------------------
// Client -> Server (player channel)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(rename = "playerName")]
        player_name: String,
        settings: Option<EngineSettingsPayload>,
    },
    JoinRoom {
        #[serde(rename = "roomCode")]
        room_code: String,
        #[serde(rename = "playerName")]
        player_name: String,
    },
    RevealTile {
        x: i32,
        z: i32,
    },
    PassTurn,
    RequestRestart,
    AcceptRestart,
    PublicSpectate {
        #[serde(rename = "roomCode")]
        room_code: String,
    },
    LeaveSpectate,
    SendDanmaku {
        #[serde(rename = "roomCode")]
        room_code: String,
        message: String,
        nickname: String,
        #[serde(rename = "isPlayer", default)]
        is_player: bool,
    },
    UpdatePlayerName {
        #[serde(rename = "newName")]
        new_name: String,
    },
}

/// Client -> Server (admin channel). The admin channel's bearer credential
/// is validated at the WebSocket handshake (see `auth::admin`); these
/// messages assume that validation already succeeded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AdminMessage {
    SubscribeRoomStats,
    AdminSpectate {
        #[serde(rename = "roomCode")]
        room_code: String,
    },
    AdminLeaveSpectate,
}

// ---------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreatedPayload {
    #[serde(rename = "roomCode")]
    pub room_code: String,
    #[serde(rename = "hostName")]
    pub host_name: String,
    pub settings: EngineSettingsPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomJoinedPayload {
    #[serde(rename = "roomCode")]
    pub room_code: String,
    #[serde(rename = "hostName")]
    pub host_name: String,
    #[serde(rename = "guestName")]
    pub guest_name: String,
    pub settings: EngineSettingsPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStartPayload {
    pub grid: GridSnapshot,
    #[serde(rename = "gridSize")]
    pub grid_size: i32,
    #[serde(rename = "minesCount")]
    pub mines_count: i32,
    #[serde(rename = "currentPlayer")]
    pub current_player: Role,
    #[serde(rename = "turnTimeLimit")]
    pub turn_time_limit: i64,
    #[serde(rename = "timeRemaining")]
    pub time_remaining: Option<i64>,
    #[serde(rename = "isFirstMove")]
    pub is_first_move: bool,
    pub host: String,
    pub guest: String,
    #[serde(rename = "matchStats")]
    pub match_stats: MatchStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileRevealedPayload {
    pub x: i32,
    pub z: i32,
    pub player: Role,
    #[serde(rename = "hitMine")]
    pub hit_mine: bool,
    #[serde(rename = "revealedTiles")]
    pub revealed_tiles: Vec<RevealedTile>,
    #[serde(rename = "canPass")]
    pub can_pass: bool,
    #[serde(rename = "revealsThisTurn")]
    pub reveals_this_turn: u32,
    pub scores: Scores,
    #[serde(rename = "timeRemaining")]
    pub time_remaining: Option<i64>,
    #[serde(rename = "timerStarted", skip_serializing_if = "Option::is_none")]
    pub timer_started: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnChangedPayload {
    #[serde(rename = "currentPlayer")]
    pub current_player: Role,
    #[serde(rename = "previousPlayer")]
    pub previous_player: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Scores>,
    #[serde(rename = "timeRemaining")]
    pub time_remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeoutActionPayload {
    pub player: Role,
    #[serde(rename = "autoPassed")]
    pub auto_passed: bool,
    #[serde(rename = "nextPlayer")]
    pub next_player: Role,
    #[serde(rename = "timeRemaining")]
    pub time_remaining: i64,
    pub scores: Scores,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOverPayload {
    pub winner: Role,
    pub loser: Role,
    pub reason: GameOverReason,
    pub scores: Scores,
    #[serde(rename = "allMines")]
    pub all_mines: Vec<Coord>,
    #[serde(rename = "matchStats")]
    pub match_stats: MatchStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DanmakuPayload {
    pub id: uuid::Uuid,
    pub nickname: String,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "isPlayer")]
    pub is_player: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectateJoinedPayload {
    #[serde(rename = "roomCode")]
    pub room_code: String,
    #[serde(rename = "hostName")]
    pub host_name: String,
    #[serde(rename = "guestName")]
    pub guest_name: Option<String>,
    #[serde(rename = "spectatorCount")]
    pub spectator_count: usize,
    #[serde(rename = "gameState")]
    pub game_state: super::types::GameStatus,
    pub game: Option<GameStartPayload>,
    #[serde(rename = "matchStats")]
    pub match_stats: MatchStats,
    #[serde(rename = "messageHistory")]
    pub message_history: Vec<DanmakuPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRoomSummary {
    pub code: String,
    pub state: super::types::GameStatus,
    #[serde(rename = "hostName")]
    pub host_name: String,
    #[serde(rename = "guestName")]
    pub guest_name: Option<String>,
    pub settings: EngineSettingsPayload,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "gameStartedAt")]
    pub game_started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "playDuration")]
    pub play_duration: Option<i64>,
    #[serde(rename = "spectatorCount")]
    pub spectator_count: usize,
    #[serde(rename = "currentPlayer")]
    pub current_player: Option<Role>,
    #[serde(rename = "timeRemaining")]
    pub time_remaining: Option<i64>,
    pub scores: Option<Scores>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRoomsUpdatePayload {
    #[serde(rename = "totalRooms")]
    pub total_rooms: usize,
    #[serde(rename = "playingCount")]
    pub playing_count: usize,
    #[serde(rename = "waitingCount")]
    pub waiting_count: usize,
    #[serde(rename = "finishedCount")]
    pub finished_count: usize,
    pub rooms: Vec<AdminRoomSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomCreated(RoomCreatedPayload),
    RoomJoined(RoomJoinedPayload),
    JoinError { error: ErrorCode },
    RedirectToSpectate { #[serde(rename = "roomCode")] room_code: String, message: String },
    PlayerJoined { opponent: String },
    GameStart(Box<GameStartPayload>),
    TileRevealed(Box<TileRevealedPayload>),
    TurnChanged(TurnChangedPayload),
    TimerUpdate { #[serde(rename = "timeRemaining")] time_remaining: i64 },
    TimeoutAction(TimeoutActionPayload),
    GameOver(Box<GameOverPayload>),
    RestartRequested { from: Role },
    SpectatorCountUpdate { count: usize },
    Danmaku(DanmakuPayload),
    PlayerNameUpdated { role: Role, #[serde(rename = "newName")] new_name: String },
    Error { error: ErrorCode },

    // Spectator-audience-only events.
    SpectateJoined(Box<SpectateJoinedPayload>),
    SpectateError { error: ErrorCode },
    RoomClosed { reason: String, message: String },

    // Admin-audience-only events.
    AdminRoomsUpdate(Box<AdminRoomsUpdatePayload>),
    AdminError { error: ErrorCode },
}
