//! The room registry (component C4).
//!
//! Each room's mutable state lives behind its own `tokio::sync::Mutex`,
//! matching §5's "simplest correct design": a per-room lock protects
//! `game`, `spectators`, `matchStats`, and `nextStartingPlayer", while the
//! registry's own index maps (`rooms`, `conn_index`) are `DashMap`s that
//! give the coarse "lock held across each invocation" guarantee §5 asks
//! for without serialising unrelated rooms behind one global mutex.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{broadcast, Mutex};

use crate::config::{EngineConfig, RoomConfig};
use crate::errors::RegistryError;
use crate::protocol::{generate_room_code, normalize_room_code, AdminRoomSummary, ConnId, EngineSettingsPayload, GameStatus, Role, Scores};

use super::{Player, Room};

pub type RoomHandle = Arc<Mutex<Room>>;

const CREATE_ROOM_RETRIES: usize = 20;

#[derive(Debug, Clone)]
enum Membership {
    Host(String),
    Guest(String),
    Spectator(String),
}

/// Outcome of a `leave_room` call (§4.1, §5 disconnect handling). Carries
/// enough of a snapshot that the caller never needs to look anything up
/// again even when the room itself was deleted from the registry.
pub struct LeaveOutcome {
    pub code: String,
    pub role: Role,
    pub room: RoomHandle,
    pub was_mid_game: bool,
    pub opponent: Option<(ConnId, String)>,
    pub scores: Scores,
    pub all_mines: Vec<crate::protocol::Coord>,
}

pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
    conn_index: DashMap<ConnId, Membership>,
    config: RoomConfig,
    changed_tx: broadcast::Sender<()>,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        let (changed_tx, _) = broadcast::channel(64);
        Self {
            rooms: DashMap::new(),
            conn_index: DashMap::new(),
            config,
            changed_tx,
        }
    }

    /// Subscribe to the "rooms changed" signal consumed by the admin
    /// observer surface (C6) to know when to re-push room stats.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.changed_tx.subscribe()
    }

    fn notify_changed(&self) {
        let _ = self.changed_tx.send(());
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Snapshot of every currently-tracked room code, used by the journal's
    /// orphan sweep to archive active-directory files the registry no
    /// longer knows about (§4.4).
    pub fn live_codes(&self) -> HashSet<String> {
        self.rooms.iter().map(|e| e.key().clone()).collect()
    }

    /// `createRoom(connId, name, options)`.
    pub async fn create_room(
        &self,
        conn_id: ConnId,
        name: String,
        settings: EngineConfig,
    ) -> Result<(String, RoomHandle), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidPlayerName);
        }
        if self.conn_index.contains_key(&conn_id) {
            return Err(RegistryError::AlreadyInRoom);
        }
        if self.rooms.len() >= self.config.max_rooms {
            return Err(RegistryError::AtCapacity);
        }

        let code = self.allocate_code()?;
        let host = Player { conn_id, name };
        let room = Room::new(code.clone(), host, settings, Utc::now());
        let handle: RoomHandle = Arc::new(Mutex::new(room));

        self.rooms.insert(code.clone(), handle.clone());
        self.conn_index.insert(conn_id, Membership::Host(code.clone()));
        self.notify_changed();

        Ok((code, handle))
    }

    fn allocate_code(&self) -> Result<String, RegistryError> {
        for _ in 0..CREATE_ROOM_RETRIES {
            let candidate = generate_room_code(self.config.room_code_length);
            if !self.rooms.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(RegistryError::AtCapacity)
    }

    /// `joinRoom(code, connId, name)`.
    pub async fn join_room(
        &self,
        code: &str,
        conn_id: ConnId,
        name: String,
    ) -> Result<RoomHandle, RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidPlayerName);
        }
        if self.conn_index.contains_key(&conn_id) {
            return Err(RegistryError::AlreadyInRoom);
        }

        let normalized = normalize_room_code(code);
        let handle = self.rooms.get(&normalized).map(|e| e.clone()).ok_or(RegistryError::RoomNotFound)?;

        {
            let mut room = handle.lock().await;
            if room.game_state != GameStatus::Waiting {
                return Err(match room.game_state {
                    GameStatus::Playing => RegistryError::GameAlreadyStarted,
                    _ => RegistryError::GameFinished,
                });
            }
            if room.guest.is_some() {
                return Err(RegistryError::RoomFull);
            }
            room.guest = Some(Player { conn_id, name });
        }

        self.conn_index.insert(conn_id, Membership::Guest(normalized));
        self.notify_changed();
        Ok(handle)
    }

    /// `leaveRoom(connId)` — also the entry point for disconnect handling
    /// (§5 "Cancellation / disconnect").
    pub async fn leave_room(&self, conn_id: ConnId) -> Option<LeaveOutcome> {
        let membership = self.conn_index.get(&conn_id).map(|e| e.value().clone())?;

        match membership {
            Membership::Host(code) => {
                let handle = self.rooms.get(&code)?.clone();
                self.rooms.remove(&code);
                self.conn_index.remove(&conn_id);

                let (was_mid_game, opponent, scores, all_mines) = {
                    let room = handle.lock().await;
                    let was_mid_game = room.game_state == GameStatus::Playing;
                    let opponent = room.guest.as_ref().map(|g| (g.conn_id, g.name.clone()));
                    let scores = room.game.as_ref().map(|g| g.scores).unwrap_or_else(Scores::zero);
                    let all_mines = room.game.as_ref().map(GameEngine::all_mines).unwrap_or_default();
                    (was_mid_game, opponent, scores, all_mines)
                };

                if let Some((opp_id, _)) = &opponent {
                    self.conn_index.remove(opp_id);
                }
                {
                    let room = handle.lock().await;
                    for spectator in &room.spectators {
                        self.conn_index.remove(spectator);
                    }
                }

                self.notify_changed();
                Some(LeaveOutcome {
                    code,
                    role: Role::Host,
                    room: handle,
                    was_mid_game,
                    opponent,
                    scores,
                    all_mines,
                })
            }
            Membership::Guest(code) => {
                let handle = self.rooms.get(&code)?.clone();
                self.conn_index.remove(&conn_id);

                let (was_mid_game, host_info, scores, all_mines) = {
                    let mut room = handle.lock().await;
                    let was_mid_game = room.game_state == GameStatus::Playing;
                    let scores = room.game.as_ref().map(|g| g.scores).unwrap_or_else(Scores::zero);
                    let all_mines = room.game.as_ref().map(GameEngine::all_mines).unwrap_or_default();
                    room.guest = None;
                    room.game = None;
                    room.game_state = if was_mid_game { GameStatus::Finished } else { GameStatus::Waiting };
                    let host_info = (room.host.conn_id, room.host.name.clone());
                    (was_mid_game, host_info, scores, all_mines)
                };

                self.notify_changed();
                Some(LeaveOutcome {
                    code,
                    role: Role::Guest,
                    room: handle,
                    was_mid_game,
                    opponent: Some(host_info),
                    scores,
                    all_mines,
                })
            }
            Membership::Spectator(code) => {
                self.remove_spectator(&code, conn_id).await;
                None
            }
        }
    }

    pub fn get_by_code(&self, code: &str) -> Option<RoomHandle> {
        let normalized = normalize_room_code(code);
        self.rooms.get(&normalized).map(|e| e.clone())
    }

    pub fn get_by_conn_id(&self, conn_id: ConnId) -> Option<(String, Role)> {
        match self.conn_index.get(&conn_id)?.value().clone() {
            Membership::Host(code) => Some((code, Role::Host)),
            Membership::Guest(code) => Some((code, Role::Guest)),
            Membership::Spectator(_) => None,
        }
    }

    pub fn get_player_role(&self, conn_id: ConnId) -> Option<Role> {
        self.get_by_conn_id(conn_id).map(|(_, role)| role)
    }

    pub async fn get_opponent(&self, conn_id: ConnId) -> Option<ConnId> {
        let (code, _) = self.get_by_conn_id(conn_id)?;
        let handle = self.get_by_code(&code)?;
        let room = handle.lock().await;
        room.opponent_conn(conn_id)
    }

    /// `addSpectator`. Rejects a connection that already holds a seat or
    /// spectator slot anywhere (invariant 1).
    pub async fn add_spectator(&self, code: &str, conn_id: ConnId) -> Result<RoomHandle, RegistryError> {
        if self.conn_index.contains_key(&conn_id) {
            return Err(RegistryError::AlreadyInRoom);
        }
        let handle = self.get_by_code(code).ok_or(RegistryError::RoomNotFound)?;
        let normalized = normalize_room_code(code);
        {
            let mut room = handle.lock().await;
            room.spectators.insert(conn_id);
        }
        self.conn_index.insert(conn_id, Membership::Spectator(normalized));
        self.notify_changed();
        Ok(handle)
    }

    pub async fn remove_spectator(&self, code: &str, conn_id: ConnId) {
        if let Some(handle) = self.get_by_code(code) {
            let mut room = handle.lock().await;
            room.spectators.remove(&conn_id);
        }
        self.conn_index.remove(&conn_id);
        self.notify_changed();
    }

    /// `removeSpectatorByConnId` — returns the affected code, if any.
    pub async fn remove_spectator_by_conn(&self, conn_id: ConnId) -> Option<String> {
        let code = match self.conn_index.get(&conn_id)?.value().clone() {
            Membership::Spectator(code) => code,
            _ => return None,
        };
        self.remove_spectator(&code, conn_id).await;
        Some(code)
    }

    pub async fn get_spectator_count(&self, code: &str) -> usize {
        match self.get_by_code(code) {
            Some(handle) => handle.lock().await.spectators.len(),
            None => 0,
        }
    }

    pub async fn get_spectators(&self, code: &str) -> Vec<ConnId> {
        match self.get_by_code(code) {
            Some(handle) => handle.lock().await.spectators.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    /// `getAllRoomsStats()`.
    pub async fn get_all_rooms_stats(&self) -> Vec<AdminRoomSummary> {
        let now = Utc::now();
        let handles: Vec<RoomHandle> = self.rooms.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            let room = handle.lock().await;
            out.push(AdminRoomSummary {
                code: room.code.clone(),
                state: room.game_state,
                host_name: room.host.name.clone(),
                guest_name: room.guest.as_ref().map(|g| g.name.clone()),
                settings: EngineSettingsPayload::from(&room.settings),
                created_at: room.created_at,
                game_started_at: room.game_started_at,
                play_duration: room.play_duration_secs(now),
                spectator_count: room.spectators.len(),
                current_player: room.game.as_ref().map(|g| g.current_player),
                time_remaining: room.game.as_ref().and_then(|g| g.time_remaining),
                scores: room.game.as_ref().map(|g| g.scores),
            });
        }
        out
    }

    /// `cleanupIdleRooms()`: evicts `waiting`/`finished` rooms older than
    /// the configured idle TTL. Returns the codes removed so the caller can
    /// archive their journals and scrub admin-spectator bookkeeping.
    pub async fn cleanup_idle_rooms(&self) -> Vec<String> {
        let ttl = Duration::from_millis(self.config.idle_timeout_ms);
        let now = Utc::now();
        let mut removed = Vec::new();

        let codes: Vec<String> = self.rooms.iter().map(|e| e.key().clone()).collect();
        for code in codes {
            let Some(handle) = self.rooms.get(&code).map(|e| e.clone()) else {
                continue;
            };
            let should_remove = {
                let room = handle.lock().await;
                if room.game_state == GameStatus::Playing {
                    false
                } else {
                    let age = now - room.created_at;
                    age.to_std().map(|age| age > ttl).unwrap_or(false)
                }
            };
            if should_remove {
                self.rooms.remove(&code);
                let conn_ids: Vec<ConnId> = {
                    let room = handle.lock().await;
                    let mut ids: Vec<ConnId> = vec![room.host.conn_id];
                    if let Some(guest) = &room.guest {
                        ids.push(guest.conn_id);
                    }
                    ids.extend(room.spectators.iter().copied());
                    ids
                };
                for conn_id in conn_ids {
                    self.conn_index.remove(&conn_id);
                }
                removed.push(code);
            }
        }

        if !removed.is_empty() {
            self.notify_changed();
        }
        removed
    }
}

use crate::engine::GameEngine;
