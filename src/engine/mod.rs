//! The per-room game engine (component C3): grid generation with
//! first-click safety, flood-reveal, turn transfer, scoring, and win/loss
//! resolution. Pure logic — this module never touches a socket, a lock, or
//! the clock directly; the 1 Hz countdown is driven externally (by
//! [`crate::dispatcher`]) calling [`GameEngine::tick`] once a second while
//! holding the room lock. That keeps the engine testable without a runtime
//! and matches §9's "the engine never references the dispatcher directly".

pub mod mines;

use crate::config::EngineConfig;
use crate::protocol::{Coord, GameOverReason, GameStatus, Grid, RevealedTile, Role, Scores};

use self::mines::{flood_reveal, place_mines};

/// Rejections raised while handling `reveal_tile`/`pass_turn`. Mirrors
/// [`crate::errors::EngineError`] one-to-one; kept as a local alias so the
/// engine module has no dependency on the errors module's wire mapping.
pub use crate::errors::EngineError;

/// Terminal information produced by a natural game end (mine hit, full
/// clear, or no-action timeout). Disconnect forfeits are handled entirely
/// by the dispatcher/registry and never flow through this type.
#[derive(Debug, Clone)]
pub struct Terminal {
    pub reason: GameOverReason,
    pub winner: Role,
    pub loser: Role,
    pub all_mines: Vec<Coord>,
}

/// Result of an accepted `reveal_tile` call.
#[derive(Debug, Clone)]
pub struct RevealOutcome {
    pub revealed_tiles: Vec<RevealedTile>,
    pub hit_mine: bool,
    pub reveals_this_turn: u32,
    pub can_pass: bool,
    pub scores: Scores,
    pub time_remaining: Option<i64>,
    pub timer_started: bool,
    pub terminal: Option<Terminal>,
}

/// Result of an accepted `pass_turn` call.
#[derive(Debug, Clone, Copy)]
pub struct PassOutcome {
    pub next_player: Role,
    pub previous_player: Role,
    pub scores: Scores,
    pub time_remaining: i64,
}

/// Result of a 1 Hz countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The game is no longer playing; the caller should stop ticking.
    Stale,
    /// Countdown continues; `time_remaining` has already been decremented.
    Ticking(i64),
    /// `time_remaining` reached zero this tick; the caller must invoke
    /// [`GameEngine::handle_timeout`] next.
    Expired,
}

/// Result of `handle_timeout`.
#[derive(Debug, Clone)]
pub enum TimeoutOutcome {
    /// A late timer fire on a game that already ended; no-op.
    Stale,
    /// The current player took no action this turn: forfeit.
    Forfeit(Terminal),
    /// The current player had revealed at least once: auto-pass.
    AutoPassed {
        player: Role,
        next_player: Role,
        scores: Scores,
        time_remaining: i64,
    },
}

/// Per-room, per-game mutable state (§3 "GameEngine").
#[derive(Debug, Clone)]
pub struct GameEngine {
    pub settings: EngineConfig,
    pub grid: Grid,
    pub current_player: Role,
    pub starting_player: Role,
    pub reveals_this_turn: u32,
    pub total_revealed: i32,
    pub scores: Scores,
    pub status: GameStatus,
    pub winner: Option<Role>,
    pub last_passed_by: Option<Role>,
    pub is_first_move: bool,
    pub mines_placed: bool,
    pub time_remaining: Option<i64>,
}

impl GameEngine {
    /// `generateGrid()`: allocate an empty grid, defer mine placement, and
    /// seat `starting_player` to move first.
    pub fn new(settings: EngineConfig, starting_player: Role) -> Self {
        Self {
            grid: Grid::new(settings.grid_size),
            current_player: starting_player,
            starting_player,
            reveals_this_turn: 0,
            total_revealed: 0,
            scores: Scores::zero(),
            status: GameStatus::Playing,
            winner: None,
            last_passed_by: None,
            is_first_move: true,
            mines_placed: false,
            time_remaining: None,
            settings,
        }
    }

    /// `revealTile(x, z, player)`. Rejection order matches §4.2 exactly:
    /// status, turn ownership, bounds, already-revealed.
    pub fn reveal_tile(&mut self, x: i32, z: i32, player: Role) -> Result<RevealOutcome, EngineError> {
        if self.status != GameStatus::Playing {
            return Err(EngineError::NotPlaying);
        }
        if player != self.current_player {
            return Err(EngineError::NotYourTurn);
        }
        if !self.grid.in_bounds(x, z) {
            return Err(EngineError::OutOfBounds);
        }
        if self.grid.tile(x, z).is_revealed {
            return Err(EngineError::AlreadyRevealed);
        }

        let was_first_move = self.is_first_move;
        if !self.mines_placed {
            place_mines(&mut self.grid, x, z, self.settings.mines_count);
            self.mines_placed = true;
        }

        let revealed = flood_reveal(&mut self.grid, x, z);
        let count = revealed.len() as i32;
        self.reveals_this_turn += count as u32;
        self.total_revealed += count;

        if !was_first_move {
            self.scores.add(player, i64::from(count) * self.settings.score_per_tile);
        }

        let mut timer_started = false;
        if was_first_move {
            self.is_first_move = false;
            self.time_remaining = Some(self.settings.turn_time_limit_secs);
            timer_started = true;
        }

        // The click site is always `revealed[0]`; a mine click never
        // cascades, so this is the only tile in `revealed` when it fires.
        let hit_mine = revealed.first().is_some_and(|t| t.is_mine);

        if hit_mine {
            let winner = player.opponent();
            self.status = GameStatus::Finished;
            self.winner = Some(winner);
            self.time_remaining = None;
            return Ok(RevealOutcome {
                revealed_tiles: revealed,
                hit_mine: true,
                reveals_this_turn: self.reveals_this_turn,
                can_pass: false,
                scores: self.scores,
                time_remaining: None,
                timer_started,
                terminal: Some(Terminal {
                    reason: GameOverReason::HitMine,
                    winner,
                    loser: player,
                    all_mines: self.grid.all_mines(),
                }),
            });
        }

        let safe_tiles = self.grid.area() - self.settings.mines_count;
        if self.total_revealed >= safe_tiles {
            let winner = self.last_passed_by.unwrap_or(player);
            self.status = GameStatus::Finished;
            self.winner = Some(winner);
            self.time_remaining = None;
            return Ok(RevealOutcome {
                revealed_tiles: revealed,
                hit_mine: false,
                reveals_this_turn: self.reveals_this_turn,
                can_pass: false,
                scores: self.scores,
                time_remaining: None,
                timer_started,
                terminal: Some(Terminal {
                    reason: GameOverReason::AllSafeRevealed,
                    winner,
                    loser: winner.opponent(),
                    all_mines: self.grid.all_mines(),
                }),
            });
        }

        Ok(RevealOutcome {
            revealed_tiles: revealed,
            hit_mine: false,
            can_pass: self.reveals_this_turn >= self.settings.min_reveals_to_pass,
            reveals_this_turn: self.reveals_this_turn,
            scores: self.scores,
            time_remaining: self.time_remaining,
            timer_started,
            terminal: None,
        })
    }

    /// `passTurn(player)`.
    pub fn pass_turn(&mut self, player: Role) -> Result<PassOutcome, EngineError> {
        if self.status != GameStatus::Playing {
            return Err(EngineError::NotPlaying);
        }
        if player != self.current_player {
            return Err(EngineError::NotYourTurn);
        }
        if self.reveals_this_turn < self.settings.min_reveals_to_pass {
            return Err(EngineError::CannotPass);
        }

        self.last_passed_by = Some(player);
        self.current_player = player.opponent();
        self.reveals_this_turn = 0;
        self.time_remaining = Some(self.settings.turn_time_limit_secs);

        Ok(PassOutcome {
            next_player: self.current_player,
            previous_player: player,
            scores: self.scores,
            time_remaining: self.settings.turn_time_limit_secs,
        })
    }

    /// Advance the countdown by one second. The caller (dispatcher) holds
    /// the room lock across this call and the tick is idempotent-safe: a
    /// late fire against a no-longer-playing game just returns `Stale`.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != GameStatus::Playing {
            return TickOutcome::Stale;
        }
        let remaining = self.time_remaining.unwrap_or(0) - 1;
        self.time_remaining = Some(remaining);
        if remaining <= 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Ticking(remaining)
        }
    }

    /// `handleTimeout()`: forfeit if the current player took no action this
    /// turn, otherwise auto-pass.
    pub fn handle_timeout(&mut self) -> TimeoutOutcome {
        if self.status != GameStatus::Playing {
            return TimeoutOutcome::Stale;
        }

        if self.reveals_this_turn == 0 {
            let loser = self.current_player;
            let winner = loser.opponent();
            self.status = GameStatus::Finished;
            self.winner = Some(winner);
            self.time_remaining = None;
            return TimeoutOutcome::Forfeit(Terminal {
                reason: GameOverReason::TimeoutNoAction,
                winner,
                loser,
                all_mines: self.grid.all_mines(),
            });
        }

        let player = self.current_player;
        self.last_passed_by = Some(player);
        self.current_player = player.opponent();
        self.reveals_this_turn = 0;
        self.time_remaining = Some(self.settings.turn_time_limit_secs);

        TimeoutOutcome::AutoPassed {
            player,
            next_player: self.current_player,
            scores: self.scores,
            time_remaining: self.settings.turn_time_limit_secs,
        }
    }

    /// `getClientGrid()`: masked view for the player audience.
    pub fn client_grid(&self) -> Vec<crate::protocol::ClientTile> {
        self.grid.client_view()
    }

    /// `getFullGridForSpectator()`: god view for spectators/admins.
    pub fn spectator_grid(&self) -> Vec<crate::protocol::SpectatorTile> {
        self.grid.spectator_view()
    }

    /// `getAllMines()`.
    pub fn all_mines(&self) -> Vec<Coord> {
        self.grid.all_mines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EngineConfig {
        EngineConfig {
            grid_size: 5,
            mines_count: 1,
            turn_time_limit_secs: 30,
            min_reveals_to_pass: 1,
            score_per_tile: 10,
        }
    }

    #[test]
    fn first_reveal_grants_zero_score_and_starts_timer() {
        let mut engine = GameEngine::new(settings(), Role::Host);
        let outcome = engine.reveal_tile(0, 0, Role::Host).unwrap();
        assert_eq!(engine.scores.host, 0);
        assert!(outcome.timer_started);
        assert_eq!(engine.time_remaining, Some(30));
    }

    #[test]
    fn non_current_player_is_rejected_without_state_change() {
        let mut engine = GameEngine::new(settings(), Role::Host);
        let before = engine.total_revealed;
        let err = engine.reveal_tile(1, 1, Role::Guest).unwrap_err();
        assert_eq!(err, EngineError::NotYourTurn);
        assert_eq!(engine.total_revealed, before);
    }

    #[test]
    fn pass_requires_minimum_reveals() {
        let mut engine = GameEngine::new(settings(), Role::Host);
        let err = engine.pass_turn(Role::Host).unwrap_err();
        assert_eq!(err, EngineError::CannotPass);

        engine.reveal_tile(4, 4, Role::Host).unwrap();
        let outcome = engine.pass_turn(Role::Host).unwrap();
        assert_eq!(outcome.next_player, Role::Guest);
        assert_eq!(engine.reveals_this_turn, 0);
        assert_eq!(engine.time_remaining, Some(30));
    }

    #[test]
    fn second_reveal_scores_ten_per_tile() {
        let mut engine = GameEngine::new(settings(), Role::Host);
        engine.reveal_tile(4, 4, Role::Host).unwrap();
        engine.pass_turn(Role::Host).unwrap();
        let before = engine.scores.guest;
        let outcome = engine.reveal_tile(0, 4, Role::Guest).unwrap();
        if !outcome.hit_mine {
            let expected = before + outcome.revealed_tiles.len() as i64 * 10;
            assert_eq!(engine.scores.guest, expected);
        }
    }

    #[test]
    fn win_by_reveal_fires_exactly_when_all_safe_tiles_are_revealed() {
        // 3x3 grid, single mine: clearing the other 8 tiles must end the game.
        let settings = EngineConfig {
            grid_size: 3,
            mines_count: 1,
            turn_time_limit_secs: 30,
            min_reveals_to_pass: 1,
            score_per_tile: 10,
        };
        let mut engine = GameEngine::new(settings, Role::Host);
        // Clicking a corner leaves 5 candidate cells outside the safe zone
        // for the single mine, so placement always succeeds (cf. spec S4).
        let outcome = engine.reveal_tile(2, 2, Role::Host).unwrap();
        assert!(outcome.terminal.is_some());
        let terminal = outcome.terminal.unwrap();
        assert_eq!(terminal.reason, GameOverReason::AllSafeRevealed);
        assert_eq!(engine.total_revealed, 8);
    }

    #[test]
    fn timeout_without_action_forfeits() {
        let mut engine = GameEngine::new(settings(), Role::Host);
        engine.reveal_tile(4, 4, Role::Host).unwrap();
        engine.pass_turn(Role::Host).unwrap();
        // guest takes no action; drive the countdown to expiry directly
        // rather than ticking 30 times.
        engine.time_remaining = Some(1);
        assert_eq!(engine.tick(), TickOutcome::Expired);
        match engine.handle_timeout() {
            TimeoutOutcome::Forfeit(t) => {
                assert_eq!(t.reason, GameOverReason::TimeoutNoAction);
                assert_eq!(t.winner, Role::Host);
                assert_eq!(t.loser, Role::Guest);
            }
            other => panic!("expected forfeit, got {other:?}"),
        }
    }

    #[test]
    fn timeout_after_action_auto_passes() {
        let mut engine = GameEngine::new(settings(), Role::Host);
        engine.reveal_tile(4, 4, Role::Host).unwrap();
        // host revealed, now times out before passing
        engine.time_remaining = Some(1);
        assert_eq!(engine.tick(), TickOutcome::Expired);
        match engine.handle_timeout() {
            TimeoutOutcome::AutoPassed { next_player, .. } => {
                assert_eq!(next_player, Role::Guest);
                assert_eq!(engine.status, GameStatus::Playing);
            }
            other => panic!("expected auto-pass, got {other:?}"),
        }
    }

    #[test]
    fn stale_timeout_on_finished_game_is_a_no_op() {
        let mut engine = GameEngine::new(settings(), Role::Host);
        engine.status = GameStatus::Finished;
        assert_eq!(engine.tick(), TickOutcome::Stale);
        assert!(matches!(engine.handle_timeout(), TimeoutOutcome::Stale));
    }
}
