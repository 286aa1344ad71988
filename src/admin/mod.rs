//! Administrative observer surface (component C6): room-stats subscribers
//! and admin-spectator memberships, plus the background pump that pushes
//! `admin_rooms_update` whenever the registry signals a change.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::dispatcher::Broadcaster;
use crate::protocol::{AdminRoomsUpdatePayload, ConnId, GameStatus, ServerMessage};
use crate::room::RoomRegistry;

/// Tracks which admin connections are subscribed to room-stats pushes and
/// which room (if any) each admin connection is spectating.
#[derive(Default)]
pub struct AdminSurface {
    subscribers: DashMap<ConnId, ()>,
    spectating: DashMap<ConnId, String>,
    room_spectators: DashMap<String, HashSet<ConnId>>,
}

impl AdminSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, conn_id: ConnId) {
        self.subscribers.insert(conn_id, ());
    }

    pub fn unsubscribe(&self, conn_id: ConnId) {
        self.subscribers.remove(&conn_id);
    }

    /// Join an admin connection onto a room's god-view spectate set.
    /// Replaces any prior spectate membership for that connection.
    pub fn spectate(&self, conn_id: ConnId, code: String) {
        self.leave_spectate(conn_id);
        self.room_spectators.entry(code.clone()).or_default().insert(conn_id);
        self.spectating.insert(conn_id, code);
    }

    pub fn leave_spectate(&self, conn_id: ConnId) {
        if let Some((_, code)) = self.spectating.remove(&conn_id) {
            if let Some(mut set) = self.room_spectators.get_mut(&code) {
                set.remove(&conn_id);
            }
        }
    }

    pub fn spectated_room(&self, conn_id: ConnId) -> Option<String> {
        self.spectating.get(&conn_id).map(|e| e.value().clone())
    }

    /// Admin-spectator connections currently watching `code`, for fan-out
    /// alongside the player and public-spectator audiences.
    pub fn spectators_for(&self, code: &str) -> Vec<ConnId> {
        self.room_spectators.get(code).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }

    pub fn disconnect(&self, conn_id: ConnId) {
        self.unsubscribe(conn_id);
        self.leave_spectate(conn_id);
    }

    /// Push `admin_rooms_update` to every subscriber. Called immediately on
    /// subscription and whenever the registry's "rooms changed" signal
    /// fires (§4.5).
    pub async fn push_stats(&self, registry: &RoomRegistry, broadcaster: &Broadcaster) {
        let rooms = registry.get_all_rooms_stats().await;
        let playing_count = rooms.iter().filter(|r| r.state == GameStatus::Playing).count();
        let waiting_count = rooms.iter().filter(|r| r.state == GameStatus::Waiting).count();
        let finished_count = rooms.iter().filter(|r| r.state == GameStatus::Finished).count();
        let payload = AdminRoomsUpdatePayload {
            total_rooms: rooms.len(),
            playing_count,
            waiting_count,
            finished_count,
            rooms,
        };
        let message = ServerMessage::AdminRoomsUpdate(Box::new(payload));
        let targets: Vec<ConnId> = self.subscribers.iter().map(|e| *e.key()).collect();
        debug!(subscriber_count = targets.len(), "pushing admin rooms update");
        broadcaster.broadcast(targets, message);
    }

    /// Background task: re-push stats every time the registry fires its
    /// "changed" signal. Runs for the lifetime of the process.
    pub fn spawn_stats_pump(self: Arc<Self>, registry: Arc<RoomRegistry>, broadcaster: Arc<Broadcaster>) {
        let mut changed = registry.subscribe_changes();
        tokio::spawn(async move {
            loop {
                match changed.recv().await {
                    Ok(()) => self.push_stats(&registry, &broadcaster).await,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                        self.push_stats(&registry, &broadcaster).await;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
