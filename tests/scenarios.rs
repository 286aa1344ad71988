//! End-to-end scenarios driven straight through the [`Dispatcher`], the
//! seam the transport adapter itself calls into. No real socket is opened;
//! each "connection" is a plain `mpsc` channel registered with the shared
//! [`Broadcaster`], which is exactly what `transport::player::handle_socket`
//! does per connection.

use std::collections::HashSet;
use std::sync::Arc;

use minesweeper_duel_server::admin::AdminSurface;
use minesweeper_duel_server::auth::AdminAuth;
use minesweeper_duel_server::config::Config;
use minesweeper_duel_server::dispatcher::{Broadcaster, Dispatcher};
use minesweeper_duel_server::journal::JournalManager;
use minesweeper_duel_server::protocol::{
    ClientMessage, EngineSettingsPayload, GameOverReason, GridSnapshot, Role, ServerMessage,
};
use minesweeper_duel_server::room::RoomRegistry;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

struct Harness {
    dispatcher: Arc<Dispatcher>,
    _tempdir: tempfile::TempDir,
}

impl Harness {
    async fn new() -> Self {
        let tempdir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.journal.data_dir = tempdir.path().to_string_lossy().into_owned();
        config.security.require_admin_auth = false;

        let registry = Arc::new(RoomRegistry::new(config.room));
        let journal = Arc::new(JournalManager::new(config.journal.clone()));
        journal.ensure_dirs().await.unwrap();
        let broadcaster = Arc::new(Broadcaster::new());
        let admin = Arc::new(AdminSurface::new());
        let admin_auth = Arc::new(AdminAuth::new(&config.security));

        let dispatcher = Dispatcher::new(&config, registry, journal, broadcaster, admin, admin_auth);

        Self { dispatcher, _tempdir: tempdir }
    }

    fn connect(&self) -> (Uuid, UnboundedReceiver<Arc<ServerMessage>>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        self.dispatcher.broadcaster.register(conn_id, tx);
        (conn_id, rx)
    }

    async fn send(&self, conn_id: Uuid, message: ClientMessage) {
        self.dispatcher.handle_client_message(conn_id, message).await;
    }

    fn drain(rx: &mut UnboundedReceiver<Arc<ServerMessage>>) -> Vec<Arc<ServerMessage>> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

fn find<'a>(
    messages: &'a [Arc<ServerMessage>],
    pred: impl Fn(&ServerMessage) -> bool,
) -> Option<&'a ServerMessage> {
    messages.iter().map(|m| m.as_ref()).find(|m| pred(m))
}

async fn create_and_join(
    harness: &Harness,
    settings: Option<EngineSettingsPayload>,
) -> (Uuid, Uuid, UnboundedReceiver<Arc<ServerMessage>>, UnboundedReceiver<Arc<ServerMessage>>, String) {
    let (host, mut host_rx) = harness.connect();
    harness.send(host, ClientMessage::CreateRoom { player_name: "Alice".to_string(), settings }).await;
    let host_msgs = Harness::drain(&mut host_rx);
    let code = match find(&host_msgs, |m| matches!(m, ServerMessage::RoomCreated(_))) {
        Some(ServerMessage::RoomCreated(payload)) => payload.room_code.clone(),
        _ => panic!("expected room_created, got {host_msgs:?}"),
    };

    let (guest, mut guest_rx) = harness.connect();
    harness.send(guest, ClientMessage::JoinRoom { room_code: code.clone(), player_name: "Bob".to_string() }).await;

    // game_start lands on both sides as a side effect of the join.
    let _ = Harness::drain(&mut guest_rx);
    let _ = Harness::drain(&mut host_rx);

    (host, guest, host_rx, guest_rx, code)
}

/// S1 — the first reveal of a game expands, grants zero score, and starts
/// the 30s countdown.
#[tokio::test]
async fn first_click_expands_and_grants_zero_score() {
    let harness = Harness::new().await;
    let settings = EngineSettingsPayload { grid_size: 10, mines_count: 10, turn_time_limit: 30, min_reveals_to_pass: 1 };
    let (host, _guest, mut host_rx, _guest_rx, _code) = create_and_join(&harness, Some(settings)).await;

    harness.send(host, ClientMessage::RevealTile { x: 5, z: 5 }).await;
    let msgs = Harness::drain(&mut host_rx);
    let ServerMessage::TileRevealed(payload) = find(&msgs, |m| matches!(m, ServerMessage::TileRevealed(_))).unwrap()
    else {
        unreachable!()
    };

    assert!(!payload.revealed_tiles.is_empty());
    assert_eq!(payload.scores.host, 0, "first click of the match is exempt from scoring");
    assert_eq!(payload.time_remaining, Some(30));
    assert_eq!(payload.timer_started, Some(true));
}

/// S2 — passing requires at least `min_reveals_to_pass` reveals, then
/// hands the turn to the other seat and resets the countdown.
#[tokio::test]
async fn pass_requires_a_reveal_and_swaps_turn() {
    let harness = Harness::new().await;
    let settings = EngineSettingsPayload { grid_size: 10, mines_count: 10, turn_time_limit: 30, min_reveals_to_pass: 1 };
    let (host, _guest, mut host_rx, _guest_rx, _code) = create_and_join(&harness, Some(settings)).await;

    // Passing before any reveal is rejected.
    harness.send(host, ClientMessage::PassTurn).await;
    let msgs = Harness::drain(&mut host_rx);
    assert!(find(&msgs, |m| matches!(m, ServerMessage::Error { .. })).is_some());

    harness.send(host, ClientMessage::RevealTile { x: 5, z: 5 }).await;
    let _ = Harness::drain(&mut host_rx);

    harness.send(host, ClientMessage::PassTurn).await;
    let msgs = Harness::drain(&mut host_rx);
    let ServerMessage::TurnChanged(payload) = find(&msgs, |m| matches!(m, ServerMessage::TurnChanged(_))).unwrap()
    else {
        unreachable!()
    };
    assert_eq!(payload.current_player, Role::Guest);
    assert_eq!(payload.time_remaining, 30);
}

/// S3 — a mine hit ends the game immediately, crediting the opponent and
/// stamping `matchStats`. Mine density is pushed to the point where every
/// candidate position outside the safe zone is guaranteed a mine, making
/// the second player's reveal deterministic.
#[tokio::test]
async fn mine_hit_ends_the_game_and_updates_match_stats() {
    let harness = Harness::new().await;
    // 5x5 grid, center click gives the full 9-tile safe zone; the
    // remaining 16 tiles all become mines since candidates == mines_count.
    let settings = EngineSettingsPayload { grid_size: 5, mines_count: 16, turn_time_limit: 30, min_reveals_to_pass: 1 };
    let (host, guest, mut host_rx, mut guest_rx, _code) = create_and_join(&harness, Some(settings)).await;

    harness.send(host, ClientMessage::RevealTile { x: 2, z: 2 }).await;
    let _ = Harness::drain(&mut host_rx);
    harness.send(host, ClientMessage::PassTurn).await;
    let _ = Harness::drain(&mut host_rx);
    let _ = Harness::drain(&mut guest_rx);

    // (0, 0) is outside the 3x3 safe zone around (2, 2): guaranteed mine.
    harness.send(guest, ClientMessage::RevealTile { x: 0, z: 0 }).await;
    let msgs = Harness::drain(&mut guest_rx);

    let ServerMessage::TileRevealed(tile) = find(&msgs, |m| matches!(m, ServerMessage::TileRevealed(_))).unwrap()
    else {
        unreachable!()
    };
    assert!(tile.hit_mine);

    let ServerMessage::GameOver(over) = find(&msgs, |m| matches!(m, ServerMessage::GameOver(_))).unwrap() else {
        unreachable!()
    };
    assert_eq!(over.winner, Role::Host);
    assert_eq!(over.loser, Role::Guest);
    assert_eq!(over.reason, GameOverReason::HitMine);
    assert_eq!(over.match_stats.host_wins, 1);
    assert_eq!(over.match_stats.games_played, 1);
}

/// S4 — an all-safe clear ends the game in the current player's favor when
/// no pass has occurred yet.
#[tokio::test]
async fn clearing_every_safe_tile_wins_for_the_current_player() {
    let harness = Harness::new().await;
    let settings = EngineSettingsPayload { grid_size: 3, mines_count: 1, turn_time_limit: 30, min_reveals_to_pass: 1 };
    let (host, _guest, mut host_rx, _guest_rx, _code) = create_and_join(&harness, Some(settings)).await;

    harness.send(host, ClientMessage::RevealTile { x: 2, z: 2 }).await;
    let msgs = Harness::drain(&mut host_rx);

    let ServerMessage::GameOver(over) = find(&msgs, |m| matches!(m, ServerMessage::GameOver(_))).unwrap() else {
        panic!("expected the 3x3 single-mine board to clear in one flood reveal, got {msgs:?}");
    };
    assert_eq!(over.reason, GameOverReason::AllSafeRevealed);
    assert_eq!(over.winner, Role::Host);
}

/// S7 — a mid-game disconnect forfeits to the opponent without touching
/// `matchStats` (invariant 8).
#[tokio::test]
async fn guest_disconnect_mid_game_forfeits_to_host() {
    let harness = Harness::new().await;
    let settings = EngineSettingsPayload { grid_size: 10, mines_count: 5, turn_time_limit: 30, min_reveals_to_pass: 1 };
    let (host, guest, mut host_rx, _guest_rx, _code) = create_and_join(&harness, Some(settings)).await;

    harness.send(host, ClientMessage::RevealTile { x: 0, z: 0 }).await;
    let _ = Harness::drain(&mut host_rx);

    harness.dispatcher.handle_disconnect(guest).await;
    let msgs = Harness::drain(&mut host_rx);

    let ServerMessage::GameOver(over) = find(&msgs, |m| matches!(m, ServerMessage::GameOver(_))).unwrap() else {
        panic!("expected a forfeit game_over, got {msgs:?}");
    };
    assert_eq!(over.winner, Role::Host);
    assert_eq!(over.reason, GameOverReason::OpponentDisconnected);
    assert_eq!(over.match_stats.games_played, 0, "disconnect forfeits must not touch matchStats");
}

/// S8 — chat messages within the cooldown window are silently dropped; the
/// next message outside the window is delivered.
#[tokio::test(start_paused = true)]
async fn chat_rate_limit_drops_within_cooldown_and_allows_after() {
    let harness = Harness::new().await;
    let (host, guest, mut host_rx, mut guest_rx, code) = create_and_join(&harness, None).await;

    harness
        .send(host, ClientMessage::SendDanmaku { room_code: code.clone(), message: "hi".to_string(), nickname: "Alice".to_string(), is_player: true })
        .await;
    let first = Harness::drain(&mut host_rx);
    assert!(find(&first, |m| matches!(m, ServerMessage::Danmaku(_))).is_some());
    let _ = Harness::drain(&mut guest_rx);

    tokio::time::advance(std::time::Duration::from_millis(500)).await;
    harness
        .send(host, ClientMessage::SendDanmaku { room_code: code.clone(), message: "dropped".to_string(), nickname: "Alice".to_string(), is_player: true })
        .await;
    let second = Harness::drain(&mut guest_rx);
    assert!(find(&second, |m| matches!(m, ServerMessage::Danmaku(_))).is_none(), "message inside the cooldown must be dropped silently");

    tokio::time::advance(std::time::Duration::from_millis(2100)).await;
    harness
        .send(host, ClientMessage::SendDanmaku { room_code: code, message: "delivered".to_string(), nickname: "Alice".to_string(), is_player: true })
        .await;
    let third = Harness::drain(&mut guest_rx);
    assert!(find(&third, |m| matches!(m, ServerMessage::Danmaku(_))).is_some(), "message after the cooldown must be delivered");
}

/// S9 — a spectator joining after moves have happened sees a full-grid
/// snapshot reflecting those moves, and the snapshot is the god view
/// regardless of how much of the grid players themselves can see.
#[tokio::test]
async fn late_spectator_sees_full_grid_snapshot_and_is_counted() {
    let harness = Harness::new().await;
    let settings = EngineSettingsPayload { grid_size: 10, mines_count: 5, turn_time_limit: 30, min_reveals_to_pass: 1 };
    let (host, _guest, mut host_rx, _guest_rx, code) = create_and_join(&harness, Some(settings)).await;

    harness.send(host, ClientMessage::RevealTile { x: 5, z: 5 }).await;
    let _ = Harness::drain(&mut host_rx);

    let (spectator, mut spectator_rx) = harness.connect();
    harness.send(spectator, ClientMessage::PublicSpectate { room_code: code }).await;
    let msgs = Harness::drain(&mut spectator_rx);

    let ServerMessage::SpectateJoined(joined) = find(&msgs, |m| matches!(m, ServerMessage::SpectateJoined(_))).unwrap()
    else {
        unreachable!()
    };
    assert_eq!(joined.spectator_count, 1);
    let game = joined.game.as_ref().expect("game already started before spectator joined");
    match &game.grid {
        GridSnapshot::Full(tiles) => {
            assert!(tiles.iter().any(|t| t.is_revealed), "spectator snapshot must reflect prior reveals");
        }
        GridSnapshot::Masked(_) => panic!("spectator audience must always receive the god view"),
    }

    // The room's spectator-count update reaches the host too.
    let host_msgs = Harness::drain(&mut host_rx);
    assert!(find(&host_msgs, |m| matches!(m, ServerMessage::SpectatorCountUpdate { count: 1 })).is_some());

    // Subsequent reveals continue to reach the spectator in order.
    harness.send(host, ClientMessage::RevealTile { x: 0, z: 9 }).await;
    let follow_up = Harness::drain(&mut spectator_rx);
    assert!(find(&follow_up, |m| matches!(m, ServerMessage::TileRevealed(_))).is_some());
}

/// Invariant 4 — only the current player may reveal or pass; a non-current
/// attempt is rejected with no state change and no broadcast.
#[tokio::test]
async fn non_current_player_reveal_is_rejected_without_broadcast() {
    let harness = Harness::new().await;
    let settings = EngineSettingsPayload { grid_size: 10, mines_count: 5, turn_time_limit: 30, min_reveals_to_pass: 1 };
    let (_host, guest, _host_rx, mut guest_rx, _code) = create_and_join(&harness, Some(settings)).await;

    // Host starts first game 1; the guest attempting a reveal must be
    // rejected outright.
    harness.send(guest, ClientMessage::RevealTile { x: 1, z: 1 }).await;
    let msgs = Harness::drain(&mut guest_rx);
    assert!(find(&msgs, |m| matches!(m, ServerMessage::Error { .. })).is_some());
    assert!(find(&msgs, |m| matches!(m, ServerMessage::TileRevealed(_))).is_none());
}

/// Room codes avoid the ambiguous characters even when a full 6-char
/// alphabet draw is exercised end to end via `create_room`.
#[tokio::test]
async fn created_room_code_avoids_ambiguous_characters() {
    let harness = Harness::new().await;
    let (_host, code) = {
        let (host, mut host_rx) = harness.connect();
        harness.send(host, ClientMessage::CreateRoom { player_name: "Alice".to_string(), settings: None }).await;
        let msgs = Harness::drain(&mut host_rx);
        match find(&msgs, |m| matches!(m, ServerMessage::RoomCreated(_))) {
            Some(ServerMessage::RoomCreated(payload)) => (host, payload.room_code.clone()),
            _ => panic!("expected room_created"),
        }
    };

    assert_eq!(code.len(), 6);
    let ambiguous: HashSet<char> = ['0', '1', 'I', 'O'].into_iter().collect();
    assert!(code.chars().all(|c| !ambiguous.contains(&c)));
}
