//! Per-room append-only persistence (component C2).
//!
//! Each room gets its own write-actor: an unbounded channel feeding a single
//! spawned task that owns the room's `RoomDocument` on disk. Writes enqueued
//! from different connections serialise in arrival order (invariant 11)
//! without a room-wide lock blocking gameplay on disk I/O. The actor exits
//! once its queue drains after the room closes; no separate bookkeeping is
//! needed to reclaim it (§9).

mod document;

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::fs;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::config::JournalConfig;
use crate::protocol::{ConnId, DanmakuPayload, EngineSettingsPayload, Role};

pub use document::{ChatEntry, GameRecord, MoveEntry, RoomDocument, RoomEvent};

/// A single queued mutation against a room's document. Each variant maps to
/// one read-modify-write cycle against the room's JSON file.
enum JournalTask {
    RoomCreated {
        host_name: String,
        settings: EngineSettingsPayload,
    },
    GuestJoined {
        guest_name: String,
    },
    GameStarted {
        starting_player: Role,
        settings: EngineSettingsPayload,
    },
    Move {
        player: Role,
        x: i32,
        z: i32,
        hit_mine: bool,
    },
    GameEnded {
        winner: Role,
        reason: String,
    },
    Chat(DanmakuPayload),
    PlayerRenamed {
        role: Role,
        new_name: String,
    },
    Close {
        ack: oneshot::Sender<()>,
    },
}

/// Handle the dispatcher and room registry use to record room history. Owns
/// one write-actor per currently-tracked room.
pub struct JournalManager {
    config: JournalConfig,
    actors: DashMap<String, mpsc::UnboundedSender<JournalTask>>,
}

impl JournalManager {
    pub fn new(config: JournalConfig) -> Self {
        Self {
            config,
            actors: DashMap::new(),
        }
    }

    /// Ensure both the active-room and archive directories exist. Called
    /// once at startup.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(self.config.rooms_dir()).await?;
        fs::create_dir_all(self.config.archive_dir()).await?;
        Ok(())
    }

    fn actor_for(&self, code: &str) -> mpsc::UnboundedSender<JournalTask> {
        if let Some(tx) = self.actors.get(code) {
            return tx.clone();
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.actors.insert(code.to_string(), tx.clone());
        tokio::spawn(run_actor(code.to_string(), self.config.clone(), rx));
        tx
    }

    fn send(&self, code: &str, task: JournalTask) {
        let tx = self.actor_for(code);
        if tx.send(task).is_err() {
            warn!(room_code = code, "journal actor is gone; dropping task");
        }
    }

    pub fn record_room_created(&self, code: &str, host_name: &str, settings: EngineSettingsPayload) {
        self.send(
            code,
            JournalTask::RoomCreated {
                host_name: host_name.to_string(),
                settings,
            },
        );
    }

    pub fn record_guest_joined(&self, code: &str, guest_name: &str) {
        self.send(
            code,
            JournalTask::GuestJoined {
                guest_name: guest_name.to_string(),
            },
        );
    }

    pub fn record_game_started(&self, code: &str, starting_player: Role, settings: EngineSettingsPayload) {
        self.send(code, JournalTask::GameStarted { starting_player, settings });
    }

    pub fn record_move(&self, code: &str, player: Role, x: i32, z: i32, hit_mine: bool) {
        self.send(code, JournalTask::Move { player, x, z, hit_mine });
    }

    pub fn record_game_ended(&self, code: &str, winner: Role, reason: &str) {
        self.send(
            code,
            JournalTask::GameEnded {
                winner,
                reason: reason.to_string(),
            },
        );
    }

    pub fn record_chat(&self, code: &str, message: DanmakuPayload) {
        self.send(code, JournalTask::Chat(message));
    }

    pub fn record_player_renamed(&self, code: &str, role: Role, new_name: &str) {
        self.send(
            code,
            JournalTask::PlayerRenamed {
                role,
                new_name: new_name.to_string(),
            },
        );
    }

    /// Archive a room's journal: stamp `closedAt`, append a `room_closed`
    /// event, move the file to the archive directory, and let the actor
    /// exit once the task drains.
    pub async fn close_room(&self, code: &str) {
        let Some((_, tx)) = self.actors.remove(code) else {
            return;
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if tx.send(JournalTask::Close { ack: ack_tx }).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    /// Orphan sweep (§4.4): archive any file under the active directory
    /// whose room code is no longer tracked by the registry.
    pub async fn sweep_orphans(&self, live_codes: &HashSet<String>) {
        let rooms_dir = self.config.rooms_dir();
        let mut entries = match fs::read_dir(&rooms_dir).await {
            Ok(entries) => entries,
            Err(err) => {
                error!(error = %err, dir = %rooms_dir.display(), "failed to read rooms dir during orphan sweep");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if live_codes.contains(stem) || self.actors.contains_key(stem) {
                continue;
            }
            debug!(room_code = stem, "archiving orphaned journal file");
            archive_file(&self.config, stem).await;
        }
    }
}

async fn run_actor(code: String, config: JournalConfig, mut rx: mpsc::UnboundedReceiver<JournalTask>) {
    let path = config.room_path(&code);
    let mut doc = load_or_create(&path, &code).await;

    while let Some(task) = rx.recv().await {
        let is_close = matches!(task, JournalTask::Close { .. });
        apply(&mut doc, task);
        if let Err(err) = write_document(&path, &doc).await {
            error!(room_code = %code, error = %err, "journal write failed");
        }
        if is_close {
            archive_file(&config, &code).await;
            break;
        }
    }
}

async fn load_or_create(path: &std::path::Path, code: &str) -> RoomDocument {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(room_code = code, error = %err, "journal file unreadable, starting fresh");
                RoomDocument::new(code.to_string())
            }
        },
        Err(_) => RoomDocument::new(code.to_string()),
    }
}

async fn write_document(path: &std::path::Path, doc: &RoomDocument) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(doc).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, bytes).await?;
    fs::rename(&tmp_path, path).await
}

fn apply(doc: &mut RoomDocument, task: JournalTask) {
    match task {
        JournalTask::RoomCreated { host_name, settings } => {
            doc.host_name = host_name;
            doc.settings = settings;
        }
        JournalTask::GuestJoined { guest_name } => {
            doc.guest_name = Some(guest_name);
            doc.events.push(RoomEvent::guest_joined());
        }
        JournalTask::GameStarted { starting_player, settings } => {
            doc.games.push(GameRecord::new(starting_player, settings));
        }
        JournalTask::Move { player, x, z, hit_mine } => {
            if let Some(game) = doc.games.last_mut() {
                game.moves.push(MoveEntry::new(player, x, z, hit_mine));
            }
        }
        JournalTask::GameEnded { winner, reason } => {
            if let Some(game) = doc.games.last_mut() {
                game.finish(winner, reason);
            }
        }
        JournalTask::Chat(message) => {
            doc.messages.push(ChatEntry::from(message));
        }
        JournalTask::PlayerRenamed { role, new_name } => {
            doc.events.push(RoomEvent::player_renamed(role, new_name));
        }
        JournalTask::Close { ack } => {
            doc.close();
            let _ = ack.send(());
        }
    }
}

async fn archive_file(config: &JournalConfig, code: &str) {
    let src = config.room_path(code);
    if fs::metadata(&src).await.is_err() {
        return;
    }
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let dest = config.archive_dir().join(format!("{code}_{stamp}.json"));
    if let Some(parent) = dest.parent() {
        if let Err(err) = fs::create_dir_all(parent).await {
            error!(room_code = code, error = %err, "failed to create archive dir");
            return;
        }
    }
    if let Err(err) = fs::rename(&src, &dest).await {
        error!(room_code = code, error = %err, "failed to archive journal file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn cfg(root: &std::path::Path) -> JournalConfig {
        JournalConfig {
            data_dir: root.to_string_lossy().into_owned(),
            rooms_subdir: "rooms".to_string(),
            archive_subdir: "archive".to_string(),
        }
    }

    fn settings() -> EngineSettingsPayload {
        EngineSettingsPayload {
            grid_size: 10,
            mines_count: 18,
            turn_time_limit: 30,
            min_reveals_to_pass: 1,
        }
    }

    #[tokio::test]
    async fn create_then_move_then_close_archives_the_file() {
        let dir = tempdir().unwrap();
        let manager = JournalManager::new(cfg(dir.path()));
        manager.ensure_dirs().await.unwrap();

        manager.record_room_created("ABCD12", "Alice", settings());
        manager.record_guest_joined("ABCD12", "Bob");
        manager.record_game_started("ABCD12", Role::Host, settings());
        manager.record_move("ABCD12", Role::Host, 2, 2, false);
        manager.record_game_ended("ABCD12", Role::Host, "all_safe_revealed");
        manager.close_room("ABCD12").await;

        let active_path = manager.config.room_path("ABCD12");
        assert!(!active_path.exists());

        let mut archived = fs::read_dir(manager.config.archive_dir()).await.unwrap();
        let entry = archived.next_entry().await.unwrap().expect("one archived file");
        let bytes = fs::read(entry.path()).await.unwrap();
        let doc: RoomDocument = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(doc.host_name, "Alice");
        assert_eq!(doc.guest_name.as_deref(), Some("Bob"));
        assert_eq!(doc.games.len(), 1);
        assert_eq!(doc.games[0].moves.len(), 1);
        assert!(doc.closed_at.is_some());
    }

    #[tokio::test]
    async fn concurrent_writes_to_one_room_are_not_lost() {
        let dir = tempdir().unwrap();
        let manager = JournalManager::new(cfg(dir.path()));
        manager.ensure_dirs().await.unwrap();

        manager.record_room_created("ZZZZ99", "Alice", settings());
        manager.record_game_started("ZZZZ99", Role::Host, settings());
        for i in 0..50 {
            manager.record_move("ZZZZ99", Role::Host, i, 0, false);
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        manager.send("ZZZZ99", JournalTask::Close { ack: ack_tx });
        ack_rx.await.unwrap();

        let mut archived = fs::read_dir(manager.config.archive_dir()).await.unwrap();
        let entry = archived.next_entry().await.unwrap().unwrap();
        let bytes = fs::read(entry.path()).await.unwrap();
        let doc: RoomDocument = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc.games[0].moves.len(), 50);
        for (i, mv) in doc.games[0].moves.iter().enumerate() {
            assert_eq!(mv.x, i as i32, "moves must stay in submission order");
        }
    }

    #[tokio::test]
    async fn orphan_sweep_archives_untracked_files() {
        let dir = tempdir().unwrap();
        let manager = JournalManager::new(cfg(dir.path()));
        manager.ensure_dirs().await.unwrap();

        let orphan_path = manager.config.room_path("ORPHAN");
        let doc = RoomDocument::new("ORPHAN".to_string());
        write_document(&orphan_path, &doc).await.unwrap();

        manager.sweep_orphans(&HashSet::new()).await;

        assert!(!orphan_path.exists());
        let mut archived = fs::read_dir(manager.config.archive_dir()).await.unwrap();
        assert!(archived.next_entry().await.unwrap().is_some());
    }

    #[test]
    fn conn_id_type_is_the_shared_uuid_alias() {
        let _id: ConnId = Uuid::new_v4();
    }
}
