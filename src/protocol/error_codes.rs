//! Machine-readable error codes delivered to clients in `error`,
//! `join_error`, and `spectate_error` payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    InvalidPlayerName,
    InvalidRoomCode,
    OutOfBounds,
    InvalidChatMessage,

    // Engine pre-conditions
    NotPlaying,
    NotYourTurn,
    AlreadyRevealed,
    CannotPass,

    // Registry look-up
    RoomNotFound,
    RoomFull,
    AlreadyInRoom,
    GameAlreadyStarted,
    GameFinished,
    ServerAtCapacity,
    InvalidSettings,

    // Transport / auth
    AuthFailed,

    // Catch-all
    Internal,
}

impl ErrorCode {
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPlayerName => "player name is empty or invalid after trimming",
            ErrorCode::InvalidRoomCode => "room code is missing or malformed",
            ErrorCode::OutOfBounds => "tile coordinates are outside the grid",
            ErrorCode::InvalidChatMessage => "chat message is empty or exceeds the length limit",
            ErrorCode::NotPlaying => "the room's game is not currently in progress",
            ErrorCode::NotYourTurn => "it is not the caller's turn",
            ErrorCode::AlreadyRevealed => "the requested tile is already revealed",
            ErrorCode::CannotPass => "not enough reveals this turn to pass",
            ErrorCode::RoomNotFound => "no room exists with the given code",
            ErrorCode::RoomFull => "the room already has a guest",
            ErrorCode::AlreadyInRoom => "the connection is already seated in a room",
            ErrorCode::GameAlreadyStarted => "the room's game has already started",
            ErrorCode::GameFinished => "the room's game has already finished",
            ErrorCode::ServerAtCapacity => "the server is hosting its maximum number of rooms",
            ErrorCode::InvalidSettings => "requested engine settings are not playable",
            ErrorCode::AuthFailed => "admin credential was missing or invalid",
            ErrorCode::Internal => "an unexpected internal error occurred",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::InvalidPlayerName,
        ErrorCode::InvalidRoomCode,
        ErrorCode::OutOfBounds,
        ErrorCode::InvalidChatMessage,
        ErrorCode::NotPlaying,
        ErrorCode::NotYourTurn,
        ErrorCode::AlreadyRevealed,
        ErrorCode::CannotPass,
        ErrorCode::RoomNotFound,
        ErrorCode::RoomFull,
        ErrorCode::AlreadyInRoom,
        ErrorCode::GameAlreadyStarted,
        ErrorCode::GameFinished,
        ErrorCode::ServerAtCapacity,
        ErrorCode::InvalidSettings,
        ErrorCode::AuthFailed,
        ErrorCode::Internal,
    ];

    #[test]
    fn all_error_codes_have_nonempty_descriptions() {
        for code in ALL {
            assert!(!code.description().is_empty(), "{code:?} has an empty description");
        }
    }

    #[test]
    fn display_uses_description() {
        assert_eq!(ErrorCode::RoomNotFound.to_string(), ErrorCode::RoomNotFound.description());
    }

    #[test]
    fn serialization_is_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::RoomNotFound).unwrap();
        assert_eq!(json, "\"ROOM_NOT_FOUND\"");

        let json = serde_json::to_string(&ErrorCode::AlreadyInRoom).unwrap();
        assert_eq!(json, "\"ALREADY_IN_ROOM\"");
    }
}
