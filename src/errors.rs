//! Typed error enums per layer, each mapping onto the wire [`ErrorCode`]
//! taxonomy (§7). Engine and registry errors are recoverable — reported to
//! the caller, engine state unchanged. Journal errors are isolated per room
//! and only logged (§7, "Journal I/O error").

use thiserror::Error;

use crate::protocol::ErrorCode;

/// Rejections raised by [`crate::engine::GameEngine`] (component C3).
/// Ordering of checks in `reveal_tile`/`pass_turn` matches §4.2.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("the room's game is not currently in progress")]
    NotPlaying,
    #[error("it is not the caller's turn")]
    NotYourTurn,
    #[error("tile coordinates are outside the grid")]
    OutOfBounds,
    #[error("the requested tile is already revealed")]
    AlreadyRevealed,
    #[error("not enough reveals this turn to pass")]
    CannotPass,
}

impl EngineError {
    pub fn code(self) -> ErrorCode {
        match self {
            EngineError::NotPlaying => ErrorCode::NotPlaying,
            EngineError::NotYourTurn => ErrorCode::NotYourTurn,
            EngineError::OutOfBounds => ErrorCode::OutOfBounds,
            EngineError::AlreadyRevealed => ErrorCode::AlreadyRevealed,
            EngineError::CannotPass => ErrorCode::CannotPass,
        }
    }
}

/// Rejections raised by [`crate::registry::RoomRegistry`] (component C4).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no room exists with the given code")]
    RoomNotFound,
    #[error("the room already has a guest")]
    RoomFull,
    #[error("the connection is already seated in a room")]
    AlreadyInRoom,
    #[error("the room's game has already started")]
    GameAlreadyStarted,
    #[error("the room's game has already finished")]
    GameFinished,
    #[error("player name is empty or invalid after trimming")]
    InvalidPlayerName,
    #[error("room code is missing or malformed")]
    InvalidRoomCode,
    #[error("the server is hosting its maximum number of rooms")]
    AtCapacity,
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::RoomNotFound => ErrorCode::RoomNotFound,
            RegistryError::RoomFull => ErrorCode::RoomFull,
            RegistryError::AlreadyInRoom => ErrorCode::AlreadyInRoom,
            RegistryError::GameAlreadyStarted => ErrorCode::GameAlreadyStarted,
            RegistryError::GameFinished => ErrorCode::GameFinished,
            RegistryError::InvalidPlayerName => ErrorCode::InvalidPlayerName,
            RegistryError::InvalidRoomCode => ErrorCode::InvalidRoomCode,
            RegistryError::AtCapacity => ErrorCode::ServerAtCapacity,
        }
    }
}

/// Disk I/O and (de)serialization failures from [`crate::journal`]
/// (component C2). Per §7, these are logged and otherwise invisible to
/// gameplay: the queued write task rejects and the next queued task
/// proceeds against whatever the document's last-known-good state was.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error for room {code}: {source}")]
    Io {
        code: String,
        #[source]
        source: std::io::Error,
    },
    #[error("journal (de)serialization error for room {code}: {source}")]
    Serde {
        code: String,
        #[source]
        source: serde_json::Error,
    },
}
