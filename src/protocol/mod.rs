//! Wire-facing types: identifiers, the grid and its masked views, room
//! codes, error codes, and the client/server message envelopes.

pub mod error_codes;
pub mod grid;
pub mod messages;
pub mod room_codes;
pub mod types;

pub use error_codes::ErrorCode;
pub use grid::{ClientTile, Coord, Grid, RevealedTile, SpectatorTile, Tile};
pub use messages::{
    AdminMessage, AdminRoomSummary, AdminRoomsUpdatePayload, ClientMessage, DanmakuPayload,
    EngineSettingsPayload, GameOverPayload, GameStartPayload, GridSnapshot, RoomCreatedPayload,
    RoomJoinedPayload, ServerMessage, SpectateJoinedPayload, TileRevealedPayload,
    TimeoutActionPayload, TurnChangedPayload,
};
pub use room_codes::{generate_room_code, normalize as normalize_room_code};
pub use types::{ConnId, GameOverReason, GameStatus, MatchStats, Role, Scores};
