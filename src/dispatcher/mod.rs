//! The event dispatcher (component C5): the only component that knows
//! about the transport. Translates inbound client/admin intents into
//! engine/registry calls and fans the authoritative results out to the
//! player, public-spectator, and admin-spectator audiences, journaling as
//! it goes (§4.3).
//!
//! The dispatcher and the admin surface share the [`Broadcaster`] as a
//! plain constructor argument rather than a module-level singleton (§9,
//! "Explicit broadcaster value"). The dispatcher keeps a weak self-reference
//! so its per-game ticker task can hold a strong `Arc<Dispatcher>` without
//! the transport layer needing to thread one through every call.

pub mod broadcaster;
pub mod chat;

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::admin::AdminSurface;
use crate::auth::AdminAuth;
use crate::config::{ChatConfig, Config, EngineConfig};
use crate::engine::{GameEngine, Terminal, TickOutcome, TimeoutOutcome};
use crate::errors::RegistryError;
use crate::journal::JournalManager;
use crate::protocol::{
    AdminMessage, ClientMessage, ConnId, DanmakuPayload, EngineSettingsPayload, ErrorCode, GameOverPayload,
    GameOverReason, GameStartPayload, GameStatus, GridSnapshot, RoomCreatedPayload, RoomJoinedPayload, Role,
    Scores, ServerMessage, SpectateJoinedPayload, TileRevealedPayload, TimeoutActionPayload, TurnChangedPayload,
};
use crate::room::{LeaveOutcome, Room, RoomHandle, RoomRegistry};

pub use broadcaster::Broadcaster;
use chat::ChatLimiter;

/// Everything the dispatcher needs to turn a client intent into a
/// broadcast: the registry, the journal, the shared broadcaster, and the
/// admin observer surface it shares events with.
pub struct Dispatcher {
    pub registry: Arc<RoomRegistry>,
    pub journal: Arc<JournalManager>,
    pub broadcaster: Arc<Broadcaster>,
    pub admin: Arc<AdminSurface>,
    pub admin_auth: Arc<AdminAuth>,
    chat_config: ChatConfig,
    chat_limiter: ChatLimiter,
    default_engine_config: EngineConfig,
    self_ref: Weak<Dispatcher>,
}

impl Dispatcher {
    pub fn new(
        config: &Config,
        registry: Arc<RoomRegistry>,
        journal: Arc<JournalManager>,
        broadcaster: Arc<Broadcaster>,
        admin: Arc<AdminSurface>,
        admin_auth: Arc<AdminAuth>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            registry,
            journal,
            broadcaster,
            admin,
            admin_auth,
            chat_config: config.chat,
            chat_limiter: ChatLimiter::new(config.chat.chat_cooldown_ms),
            default_engine_config: config.engine,
            self_ref: self_ref.clone(),
        })
    }

    /// All connections that should see a given room's gameplay and chat
    /// events: seated players, public spectators, and admin spectators.
    async fn room_audience(&self, room: &Room) -> Vec<ConnId> {
        let mut targets = vec![room.host.conn_id];
        if let Some(guest) = &room.guest {
            targets.push(guest.conn_id);
        }
        targets.extend(room.spectators.iter().copied());
        targets.extend(self.admin.spectators_for(&room.code));
        targets
    }

    fn engine_settings_payload(settings: &EngineConfig) -> EngineSettingsPayload {
        EngineSettingsPayload::from(settings)
    }

    /// The full god-view snapshot handed to a newly joined spectator (§4.5,
    /// `spectate_joined.game`). `None` before a game has ever started.
    fn spectator_game_snapshot(room: &Room) -> Option<GameStartPayload> {
        room.game.as_ref().map(|game| GameStartPayload {
            grid: GridSnapshot::Full(game.spectator_grid()),
            grid_size: game.settings.grid_size,
            mines_count: game.settings.mines_count,
            current_player: game.current_player,
            turn_time_limit: game.settings.turn_time_limit_secs,
            time_remaining: game.time_remaining,
            is_first_move: game.is_first_move,
            host: room.host.name.clone(),
            guest: room.guest.as_ref().map(|g| g.name.clone()).unwrap_or_default(),
            match_stats: room.match_stats,
        })
    }

    fn spectate_joined_payload(room: &Room) -> SpectateJoinedPayload {
        SpectateJoinedPayload {
            room_code: room.code.clone(),
            host_name: room.host.name.clone(),
            guest_name: room.guest.as_ref().map(|g| g.name.clone()),
            spectator_count: room.spectators.len(),
            game_state: room.game_state,
            game: Self::spectator_game_snapshot(room).map(Box::new),
            match_stats: room.match_stats,
            message_history: room.recent_chat.iter().cloned().collect(),
        }
    }

    // -----------------------------------------------------------------
    // Player channel
    // -----------------------------------------------------------------

    pub async fn handle_client_message(&self, conn_id: ConnId, message: ClientMessage) {
        match message {
            ClientMessage::CreateRoom { player_name, settings } => {
                self.handle_create_room(conn_id, player_name, settings).await;
            }
            ClientMessage::JoinRoom { room_code, player_name } => {
                self.handle_join_room(conn_id, room_code, player_name).await;
            }
            ClientMessage::RevealTile { x, z } => {
                self.handle_reveal_tile(conn_id, x, z).await;
            }
            ClientMessage::PassTurn => {
                self.handle_pass_turn(conn_id).await;
            }
            ClientMessage::RequestRestart => {
                self.handle_request_restart(conn_id).await;
            }
            ClientMessage::AcceptRestart => {
                self.handle_accept_restart(conn_id).await;
            }
            ClientMessage::PublicSpectate { room_code } => {
                self.handle_public_spectate(conn_id, room_code).await;
            }
            ClientMessage::LeaveSpectate => {
                self.handle_leave_spectate(conn_id).await;
            }
            ClientMessage::SendDanmaku { room_code, message, nickname, is_player } => {
                self.handle_send_danmaku(conn_id, room_code, message, nickname, is_player).await;
            }
            ClientMessage::UpdatePlayerName { new_name } => {
                self.handle_update_player_name(conn_id, new_name).await;
            }
        }
    }

    async fn handle_create_room(&self, conn_id: ConnId, player_name: String, settings: Option<EngineSettingsPayload>) {
        let Some(name) = chat::normalize(&player_name, self.chat_config.max_name_len) else {
            self.broadcaster.send_to(conn_id, ServerMessage::JoinError { error: ErrorCode::InvalidPlayerName });
            return;
        };

        let engine_settings = match settings {
            Some(payload) => {
                let candidate = EngineConfig {
                    grid_size: payload.grid_size,
                    mines_count: payload.mines_count,
                    turn_time_limit_secs: payload.turn_time_limit,
                    min_reveals_to_pass: payload.min_reveals_to_pass,
                    score_per_tile: self.default_engine_config.score_per_tile,
                };
                if candidate.validate().is_err() {
                    self.broadcaster.send_to(conn_id, ServerMessage::JoinError { error: ErrorCode::InvalidSettings });
                    return;
                }
                candidate
            }
            None => self.default_engine_config,
        };

        match self.registry.create_room(conn_id, name.clone(), engine_settings).await {
            Ok((code, _handle)) => {
                info!(room_code = %code, host = %name, "room created");
                self.journal.record_room_created(&code, &name, Self::engine_settings_payload(&engine_settings));
                self.broadcaster.send_to(
                    conn_id,
                    ServerMessage::RoomCreated(RoomCreatedPayload {
                        room_code: code,
                        host_name: name,
                        settings: Self::engine_settings_payload(&engine_settings),
                    }),
                );
            }
            Err(err) => {
                self.broadcaster.send_to(conn_id, ServerMessage::JoinError { error: err.code() });
            }
        }
    }

    async fn handle_join_room(&self, conn_id: ConnId, room_code: String, player_name: String) {
        let Some(name) = chat::normalize(&player_name, self.chat_config.max_name_len) else {
            self.broadcaster.send_to(conn_id, ServerMessage::JoinError { error: ErrorCode::InvalidPlayerName });
            return;
        };

        match self.registry.join_room(&room_code, conn_id, name.clone()).await {
            Ok(handle) => {
                let (code, host_conn, host_name, settings) = {
                    let room = handle.lock().await;
                    (room.code.clone(), room.host.conn_id, room.host.name.clone(), room.settings)
                };
                info!(room_code = %code, guest = %name, "guest joined room");
                self.journal.record_guest_joined(&code, &name);

                self.broadcaster.send_to(
                    conn_id,
                    ServerMessage::RoomJoined(RoomJoinedPayload {
                        room_code: code,
                        host_name,
                        guest_name: name.clone(),
                        settings: Self::engine_settings_payload(&settings),
                    }),
                );
                self.broadcaster.send_to(host_conn, ServerMessage::PlayerJoined { opponent: name });

                self.start_game(handle, Role::Host).await;
            }
            Err(RegistryError::GameAlreadyStarted) | Err(RegistryError::GameFinished) => {
                let normalized = crate::protocol::normalize_room_code(&room_code);
                self.broadcaster.send_to(
                    conn_id,
                    ServerMessage::RedirectToSpectate {
                        room_code: normalized,
                        message: "this room's game is already underway; joining as a spectator".to_string(),
                    },
                );
            }
            Err(err) => {
                self.broadcaster.send_to(conn_id, ServerMessage::JoinError { error: err.code() });
            }
        }
    }

    /// Starts a new game for a room: builds the engine, stamps
    /// `game_started_at`, journals the start, broadcasts `game_start` to
    /// every audience (masked for players, full god-view for spectators),
    /// and spawns the per-game 1 Hz ticker.
    async fn start_game(&self, handle: RoomHandle, starting_player: Role) {
        let mut room = handle.lock().await;
        room.game = Some(GameEngine::new(room.settings, starting_player));
        room.game_state = GameStatus::Playing;
        room.game_started_at = Some(Utc::now());
        let code = room.code.clone();
        let settings = room.settings;

        let Some(game) = room.game.as_ref() else {
            warn!(room_code = %code, "game vanished immediately after creation; aborting game start");
            return;
        };
        let player_payload = GameStartPayload {
            grid: GridSnapshot::Masked(game.client_grid()),
            grid_size: game.settings.grid_size,
            mines_count: game.settings.mines_count,
            current_player: game.current_player,
            turn_time_limit: game.settings.turn_time_limit_secs,
            time_remaining: None,
            is_first_move: true,
            host: room.host.name.clone(),
            guest: room.guest.as_ref().map(|g| g.name.clone()).unwrap_or_default(),
            match_stats: room.match_stats,
        };
        let spectator_payload =
            GameStartPayload { grid: GridSnapshot::Full(game.spectator_grid()), ..player_payload.clone() };

        let player_targets: Vec<ConnId> =
            std::iter::once(room.host.conn_id).chain(room.guest.as_ref().map(|g| g.conn_id)).collect();
        let other_targets: Vec<ConnId> =
            room.spectators.iter().copied().chain(self.admin.spectators_for(&code)).collect();
        drop(room);

        self.journal.record_game_started(&code, starting_player, Self::engine_settings_payload(&settings));
        self.broadcaster.broadcast(player_targets, ServerMessage::GameStart(Box::new(player_payload)));
        self.broadcaster.broadcast(other_targets, ServerMessage::GameStart(Box::new(spectator_payload)));

        self.spawn_ticker(handle, code);
    }

    /// Spawns the 1 Hz countdown task for one game. Holds a strong
    /// `Arc<Dispatcher>` (recovered from the weak self-reference) for the
    /// task's lifetime; the task exits on its own once the engine reports
    /// `TickOutcome::Stale` or the game ends.
    fn spawn_ticker(&self, handle: RoomHandle, code: String) {
        let Some(dispatcher) = self.self_ref.upgrade() else {
            warn!(room_code = %code, "dispatcher already gone; not spawning ticker");
            return;
        };
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                let mut room = handle.lock().await;
                let Some(game) = room.game.as_mut() else { break };
                match game.tick() {
                    TickOutcome::Stale => break,
                    TickOutcome::Ticking(remaining) => {
                        let targets = dispatcher.room_audience(&room).await;
                        drop(room);
                        dispatcher.broadcaster.broadcast(targets, ServerMessage::TimerUpdate { time_remaining: remaining });
                    }
                    TickOutcome::Expired => {
                        let outcome = game.handle_timeout();
                        dispatcher.apply_timeout_outcome(&mut room, &code, outcome).await;
                        let is_playing = room.game_state == GameStatus::Playing;
                        drop(room);
                        if !is_playing {
                            break;
                        }
                    }
                }
            }
        });
    }

    async fn apply_timeout_outcome(&self, room: &mut Room, code: &str, outcome: TimeoutOutcome) {
        match outcome {
            TimeoutOutcome::Stale => {}
            TimeoutOutcome::AutoPassed { player, next_player, scores, time_remaining } => {
                let targets = self.room_audience(room).await;
                self.broadcaster.broadcast(
                    targets,
                    ServerMessage::TimeoutAction(TimeoutActionPayload {
                        player,
                        auto_passed: true,
                        next_player,
                        time_remaining,
                        scores,
                    }),
                );
            }
            TimeoutOutcome::Forfeit(terminal) => {
                self.finish_game(room, code, terminal).await;
            }
        }
    }

    async fn handle_reveal_tile(&self, conn_id: ConnId, x: i32, z: i32) {
        let Some((code, role)) = self.registry.get_by_conn_id(conn_id) else {
            self.broadcaster.send_to(conn_id, ServerMessage::Error { error: ErrorCode::RoomNotFound });
            return;
        };
        let Some(handle) = self.registry.get_by_code(&code) else { return };

        let mut room = handle.lock().await;
        let Some(game) = room.game.as_mut() else {
            drop(room);
            self.broadcaster.send_to(conn_id, ServerMessage::Error { error: ErrorCode::NotPlaying });
            return;
        };

        match game.reveal_tile(x, z, role) {
            Ok(outcome) => {
                self.journal.record_move(&code, role, x, z, outcome.hit_mine);
                let targets = self.room_audience(&room).await;
                self.broadcaster.broadcast(
                    targets,
                    ServerMessage::TileRevealed(Box::new(TileRevealedPayload {
                        x,
                        z,
                        player: role,
                        hit_mine: outcome.hit_mine,
                        revealed_tiles: outcome.revealed_tiles,
                        can_pass: outcome.can_pass,
                        reveals_this_turn: outcome.reveals_this_turn,
                        scores: outcome.scores,
                        time_remaining: outcome.time_remaining,
                        timer_started: outcome.timer_started.then_some(true),
                    })),
                );
                if let Some(terminal) = outcome.terminal {
                    self.finish_game(&mut room, &code, terminal).await;
                }
            }
            Err(err) => {
                drop(room);
                self.broadcaster.send_to(conn_id, ServerMessage::Error { error: err.code() });
            }
        }
    }

    async fn handle_pass_turn(&self, conn_id: ConnId) {
        let Some((code, role)) = self.registry.get_by_conn_id(conn_id) else { return };
        let Some(handle) = self.registry.get_by_code(&code) else { return };

        let mut room = handle.lock().await;
        let Some(game) = room.game.as_mut() else {
            drop(room);
            self.broadcaster.send_to(conn_id, ServerMessage::Error { error: ErrorCode::NotPlaying });
            return;
        };

        match game.pass_turn(role) {
            Ok(outcome) => {
                let targets = self.room_audience(&room).await;
                self.broadcaster.broadcast(
                    targets,
                    ServerMessage::TurnChanged(TurnChangedPayload {
                        current_player: outcome.next_player,
                        previous_player: outcome.previous_player,
                        scores: Some(outcome.scores),
                        time_remaining: outcome.time_remaining,
                        reason: None,
                    }),
                );
            }
            Err(err) => {
                drop(room);
                self.broadcaster.send_to(conn_id, ServerMessage::Error { error: err.code() });
            }
        }
    }

    async fn handle_request_restart(&self, conn_id: ConnId) {
        let Some((_, role)) = self.registry.get_by_conn_id(conn_id) else { return };
        let Some(opponent) = self.registry.get_opponent(conn_id).await else { return };
        self.broadcaster.send_to(opponent, ServerMessage::RestartRequested { from: role });
    }

    async fn handle_accept_restart(&self, conn_id: ConnId) {
        let Some((code, _)) = self.registry.get_by_conn_id(conn_id) else { return };
        let Some(handle) = self.registry.get_by_code(&code) else { return };
        let starting_player = handle.lock().await.next_starting_player;
        self.start_game(handle, starting_player).await;
    }

    async fn handle_public_spectate(&self, conn_id: ConnId, room_code: String) {
        match self.registry.add_spectator(&room_code, conn_id).await {
            Ok(handle) => {
                let room = handle.lock().await;
                let payload = Self::spectate_joined_payload(&room);
                let count = room.spectators.len();
                let audience = self.room_audience(&room).await;
                drop(room);

                self.broadcaster.send_to(conn_id, ServerMessage::SpectateJoined(Box::new(payload)));
                self.broadcaster.broadcast(audience, ServerMessage::SpectatorCountUpdate { count });
            }
            Err(err) => {
                self.broadcaster.send_to(conn_id, ServerMessage::SpectateError { error: err.code() });
            }
        }
    }

    async fn handle_leave_spectate(&self, conn_id: ConnId) {
        if let Some(code) = self.registry.remove_spectator_by_conn(conn_id).await {
            if let Some(handle) = self.registry.get_by_code(&code) {
                let room = handle.lock().await;
                let count = room.spectators.len();
                let audience = self.room_audience(&room).await;
                drop(room);
                self.broadcaster.broadcast(audience, ServerMessage::SpectatorCountUpdate { count });
            }
        }
    }

    async fn handle_send_danmaku(&self, conn_id: ConnId, room_code: String, message: String, nickname: String, is_player: bool) {
        if self.chat_limiter.is_limited(conn_id) {
            return;
        }
        let Some(text) = chat::normalize(&message, self.chat_config.max_message_len) else { return };
        let Some(nick) = chat::normalize(&nickname, self.chat_config.max_name_len) else { return };
        let Some(handle) = self.registry.get_by_code(&room_code) else { return };

        self.chat_limiter.record(conn_id);
        let payload = DanmakuPayload { id: uuid::Uuid::new_v4(), nickname: nick, message: text, timestamp: Utc::now(), is_player };

        let mut room = handle.lock().await;
        room.push_chat(payload.clone());
        let code = room.code.clone();
        let audience = self.room_audience(&room).await;
        drop(room);

        self.journal.record_chat(&code, payload.clone());
        self.broadcaster.broadcast(audience, ServerMessage::Danmaku(payload));
    }

    async fn handle_update_player_name(&self, conn_id: ConnId, new_name: String) {
        let Some(name) = chat::normalize(&new_name, self.chat_config.max_name_len) else { return };
        let Some((code, role)) = self.registry.get_by_conn_id(conn_id) else { return };
        let Some(handle) = self.registry.get_by_code(&code) else { return };

        let mut room = handle.lock().await;
        match role {
            Role::Host => room.host.name = name.clone(),
            Role::Guest => {
                if let Some(guest) = room.guest.as_mut() {
                    guest.name = name.clone();
                }
            }
        }
        let audience = self.room_audience(&room).await;
        drop(room);

        self.journal.record_player_renamed(&code, role, &name);
        self.broadcaster.broadcast(audience, ServerMessage::PlayerNameUpdated { role, new_name: name });
    }

    /// Shared terminal handling for a natural engine terminal (mine hit,
    /// all-safe clear, or no-action timeout): stamps `matchStats` and
    /// `nextStartingPlayer`, tears down the engine, journals, and
    /// broadcasts `game_over`. Disconnect forfeits do not go through here —
    /// invariant 8 says matchStats is untouched by them — they're handled
    /// directly in [`Dispatcher::on_room_left`].
    async fn finish_game(&self, room: &mut Room, code: &str, terminal: Terminal) {
        let scores = room.game.as_ref().map(|g| g.scores).unwrap_or_else(Scores::zero);
        room.match_stats.record_win(terminal.winner);
        room.next_starting_player = terminal.loser;
        room.game_state = GameStatus::Finished;
        room.game = None;

        let audience = self.room_audience(room).await;
        let match_stats = room.match_stats;

        self.journal.record_game_ended(code, terminal.winner, reason_str(terminal.reason));
        self.broadcaster.broadcast(
            audience,
            ServerMessage::GameOver(Box::new(GameOverPayload {
                winner: terminal.winner,
                loser: terminal.loser,
                reason: terminal.reason,
                scores,
                all_mines: terminal.all_mines,
                match_stats,
            })),
        );
    }

    // -----------------------------------------------------------------
    // Admin channel
    // -----------------------------------------------------------------

    pub async fn handle_admin_message(&self, conn_id: ConnId, message: AdminMessage) {
        match message {
            AdminMessage::SubscribeRoomStats => {
                self.admin.subscribe(conn_id);
                self.admin.push_stats(&self.registry, &self.broadcaster).await;
            }
            AdminMessage::AdminSpectate { room_code } => {
                self.handle_admin_spectate(conn_id, room_code).await;
            }
            AdminMessage::AdminLeaveSpectate => {
                self.admin.leave_spectate(conn_id);
            }
        }
    }

    async fn handle_admin_spectate(&self, conn_id: ConnId, room_code: String) {
        let Some(handle) = self.registry.get_by_code(&room_code) else {
            self.broadcaster.send_to(conn_id, ServerMessage::AdminError { error: ErrorCode::RoomNotFound });
            return;
        };
        let payload = {
            let room = handle.lock().await;
            Self::spectate_joined_payload(&room)
        };

        self.admin.spectate(conn_id, room_code);
        self.broadcaster.send_to(conn_id, ServerMessage::SpectateJoined(Box::new(payload)));
    }

    // -----------------------------------------------------------------
    // Disconnect handling (shared by both channels)
    // -----------------------------------------------------------------

    pub async fn handle_disconnect(&self, conn_id: ConnId) {
        self.broadcaster.unregister(conn_id);
        self.chat_limiter.remove(conn_id);
        self.admin.disconnect(conn_id);

        let Some(outcome) = self.registry.leave_room(conn_id).await else {
            return;
        };
        self.on_room_left(outcome).await;
    }

    async fn on_room_left(&self, outcome: LeaveOutcome) {
        let LeaveOutcome { code, role, room, was_mid_game, opponent, scores, all_mines } = outcome;

        match role {
            Role::Host => {
                let (match_stats, spectator_targets) = {
                    let room = room.lock().await;
                    let targets: Vec<ConnId> =
                        room.spectators.iter().copied().chain(self.admin.spectators_for(&code)).collect();
                    (room.match_stats, targets)
                };
                if was_mid_game {
                    if let Some((guest_conn, _)) = opponent {
                        self.broadcaster.send_to(
                            guest_conn,
                            ServerMessage::GameOver(Box::new(GameOverPayload {
                                winner: Role::Guest,
                                loser: Role::Host,
                                reason: GameOverReason::OpponentDisconnected,
                                scores,
                                all_mines,
                                match_stats,
                            })),
                        );
                    }
                }
                self.broadcaster.broadcast(
                    spectator_targets,
                    ServerMessage::RoomClosed {
                        reason: "host_disconnected".to_string(),
                        message: "the host has left the room".to_string(),
                    },
                );
                self.journal.close_room(&code).await;
                warn!(room_code = %code, "host disconnected; room destroyed");
            }
            Role::Guest => {
                if was_mid_game {
                    let Some((host_conn, _)) = opponent else {
                        warn!(room_code = %code, "guest disconnected mid-game with no host on record");
                        return;
                    };
                    let (match_stats, mut audience) = {
                        let room = room.lock().await;
                        (
                            room.match_stats,
                            room.spectators.iter().copied().chain(self.admin.spectators_for(&code)).collect::<Vec<_>>(),
                        )
                    };
                    audience.push(host_conn);
                    self.broadcaster.broadcast(
                        audience,
                        ServerMessage::GameOver(Box::new(GameOverPayload {
                            winner: Role::Host,
                            loser: Role::Guest,
                            reason: GameOverReason::OpponentDisconnected,
                            scores,
                            all_mines,
                            match_stats,
                        })),
                    );
                }
                info!(room_code = %code, "guest disconnected; room reverted to waiting");
            }
        }
    }
}

fn reason_str(reason: GameOverReason) -> &'static str {
    match reason {
        GameOverReason::HitMine => "hit_mine",
        GameOverReason::AllSafeRevealed => "all_safe_revealed",
        GameOverReason::OpponentDisconnected => "opponent_disconnected",
        GameOverReason::TimeoutNoAction => "timeout_no_action",
        GameOverReason::TimeoutHitMine => "timeout_hit_mine",
    }
}
