use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::constants::{
    GHOST_SCORE, PELLET_SCORE, POWER_DURATION_MS, POWER_PELLET_SCORE, RETURN_DURATION_MS, TICK_MS,
};
use crate::rng::{RandomSource, Rng};
use crate::types::{
    Direction, GameConfig, GhostRole, GhostView, Phase, PlayerView, RuntimeEvent, SessionStats,
    SessionSummary, Snapshot, Vec2, WorldInit,
};
use crate::world::{Maze, MazeError, MazeLayout};

mod encounter;
pub mod ghost_ai;
pub mod movement;
mod player;
mod utils;

use self::utils::{default_seed, remaining_ms};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid maze: {0}")]
    Maze(#[from] MazeError),
    #[error("tick period must be greater than zero")]
    ZeroTick,
}

/// Host-supplied overrides; anything left `None` falls back to the constants.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    pub tick_ms: Option<u64>,
    pub power_duration_ms: Option<u64>,
    pub return_duration_ms: Option<u64>,
    pub seed: Option<u32>,
}

#[derive(Clone, Debug)]
struct PlayerInternal {
    pos: Vec2,
    facing: Direction,
    queued: Option<Direction>,
}

impl PlayerInternal {
    fn at_spawn(spawn: Vec2) -> Self {
        Self {
            pos: spawn,
            facing: Direction::Right,
            queued: None,
        }
    }
}

#[derive(Clone, Debug)]
struct GhostInternal {
    role: GhostRole,
    pos: Vec2,
    home: Vec2,
    returning_until: Option<u64>,
}

/// State changes reported by the movers and encounter checks. Only
/// [`GameEngine::apply_effect`] turns them into score, timer and phase updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionEffect {
    PelletEaten(Vec2),
    PowerPelletEaten(Vec2),
    GhostCaptured(usize),
    PlayerCaught(usize),
}

#[derive(Clone, Debug)]
pub struct GameEngine<R = Rng> {
    pub config: GameConfig,

    maze: Maze,
    rng: R,
    player: PlayerInternal,
    ghosts: Vec<GhostInternal>,
    phase: Phase,
    score: u32,
    power_until: Option<u64>,
    events: Vec<RuntimeEvent>,
    stats: SessionStats,

    elapsed_ms: u64,
    session_started_ms: u64,
    tick_counter: u64,
}

impl GameEngine<Rng> {
    pub fn new(layout: &MazeLayout, mut options: EngineOptions) -> Result<Self, EngineError> {
        let seed = *options.seed.get_or_insert_with(default_seed);
        Self::with_rng(layout, options, Rng::new(seed))
    }

    pub fn classic(options: EngineOptions) -> Result<Self, EngineError> {
        Self::new(&MazeLayout::classic(), options)
    }
}

impl<R: RandomSource> GameEngine<R> {
    pub fn with_rng(layout: &MazeLayout, options: EngineOptions, rng: R) -> Result<Self, EngineError> {
        let maze = Maze::new(layout)?;
        let tick_ms = options.tick_ms.unwrap_or(TICK_MS);
        if tick_ms == 0 {
            return Err(EngineError::ZeroTick);
        }
        let config = GameConfig {
            tick_ms,
            power_duration_ms: options.power_duration_ms.unwrap_or(POWER_DURATION_MS),
            return_duration_ms: options.return_duration_ms.unwrap_or(RETURN_DURATION_MS),
            seed: options.seed,
        };

        let player = PlayerInternal::at_spawn(maze.player_spawn());
        let ghosts = spawn_ghosts(&maze);
        Ok(Self {
            config,
            maze,
            rng,
            player,
            ghosts,
            phase: Phase::Ready,
            score: 0,
            power_until: None,
            events: Vec::new(),
            stats: SessionStats::default(),
            elapsed_ms: 0,
            session_started_ms: 0,
            tick_counter: 0,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn now_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn power_active(&self) -> bool {
        self.power_until.is_some()
    }

    pub fn player_view(&self) -> PlayerView {
        PlayerView {
            x: self.player.pos.x,
            y: self.player.pos.y,
            dir: self.player.facing,
            queued: self.player.queued,
        }
    }

    pub fn ghost_views(&self) -> Vec<GhostView> {
        let power = self.power_active();
        self.ghosts
            .iter()
            .map(|ghost| GhostView {
                role: ghost.role,
                x: ghost.pos.x,
                y: ghost.pos.y,
                home: ghost.home,
                returning: ghost.returning_until.is_some(),
                vulnerable: power && ghost.returning_until.is_none(),
            })
            .collect()
    }

    pub fn world_init(&self) -> WorldInit {
        WorldInit {
            width: self.maze.width(),
            height: self.maze.height(),
            tiles: self.maze.tiles(),
            player_spawn: self.maze.player_spawn(),
            ghost_homes: GhostRole::ALL
                .iter()
                .map(|role| (*role, self.maze.ghost_home(*role)))
                .collect(),
            config: self.config.clone(),
        }
    }

    /// `Ready`, `Won` or `Lost` into a fresh `Playing` session. Ignored mid-game.
    pub fn start(&mut self) {
        if self.phase == Phase::Playing {
            return;
        }
        self.reset_session();
    }

    /// Resets from any phase, including an active game.
    pub fn restart(&mut self) {
        self.reset_session();
    }

    /// Overwrites the single-slot turn buffer. Ignored outside `Playing`.
    pub fn submit_direction_intent(&mut self, dir: Direction) {
        if self.phase != Phase::Playing {
            return;
        }
        self.player.queued = Some(dir);
    }

    pub fn tick(&mut self) {
        self.step(self.config.tick_ms);
    }

    /// Advances the simulation clock by `dt_ms` and runs one full update.
    pub fn step(&mut self, dt_ms: u64) {
        if self.phase != Phase::Playing {
            return;
        }
        self.tick_counter += 1;
        self.stats.ticks += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.elapsed_ms;

        self.expire_timers(now_ms);

        if let Some(effects) = self.update_player() {
            for effect in effects {
                self.apply_effect(effect, now_ms);
            }
            for effect in self.resolve_captures() {
                self.apply_effect(effect, now_ms);
            }
        }
        if let Some(effect) = self.resolve_loss() {
            self.apply_effect(effect, now_ms);
            return;
        }

        self.update_ghosts();
        if let Some(effect) = self.resolve_loss() {
            self.apply_effect(effect, now_ms);
            return;
        }

        if !self.maze.has_remaining_collectibles() {
            self.phase = Phase::Won;
            self.events.push(RuntimeEvent::SessionWon { score: self.score });
            info!("session won with score {}", self.score);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.compose_snapshot(Vec::new())
    }

    /// Like [`GameEngine::snapshot`], optionally draining pending events into it.
    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let events = if include_events {
            std::mem::take(&mut self.events)
        } else {
            Vec::new()
        };
        self.compose_snapshot(events)
    }

    pub fn build_summary(&self) -> SessionSummary {
        SessionSummary {
            outcome: self.phase,
            score: self.score,
            duration_ms: self.elapsed_ms.saturating_sub(self.session_started_ms),
            stats: self.stats.clone(),
        }
    }

    fn compose_snapshot(&self, events: Vec<RuntimeEvent>) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            now_ms: self.elapsed_ms,
            phase: self.phase,
            score: self.score,
            power_mode: self.power_active(),
            power_until_ms: self.power_until,
            power_remaining_ms: self
                .power_until
                .map(|until| remaining_ms(until, self.elapsed_ms))
                .unwrap_or(0),
            remaining_collectibles: self.maze.remaining_collectibles(),
            player: self.player_view(),
            ghosts: self.ghost_views(),
            tiles: self.maze.tiles(),
            events,
        }
    }

    fn reset_session(&mut self) {
        // Dropping the expiry timestamps is what cancels pending timers.
        self.power_until = None;
        self.maze.reset();
        self.player = PlayerInternal::at_spawn(self.maze.player_spawn());
        self.ghosts = spawn_ghosts(&self.maze);
        self.score = 0;
        self.stats = SessionStats::default();
        self.events.clear();
        self.tick_counter = 0;
        self.session_started_ms = self.elapsed_ms;
        self.phase = Phase::Playing;
        self.events.push(RuntimeEvent::SessionStarted);
        info!(
            "session started with {} collectibles",
            self.maze.remaining_collectibles()
        );
    }

    fn expire_timers(&mut self, now_ms: u64) {
        if self.power_until.is_some_and(|until| now_ms >= until) {
            self.power_until = None;
            self.events.push(RuntimeEvent::PowerModeEnded);
            debug!("power mode ended at {now_ms}ms");
        }
        for ghost in &mut self.ghosts {
            if ghost.returning_until.is_some_and(|until| now_ms >= until) {
                ghost.returning_until = None;
                self.events.push(RuntimeEvent::GhostRecovered { role: ghost.role });
                debug!("{} ghost back in play", ghost.role.color());
            }
        }
    }

    fn apply_effect(&mut self, effect: SessionEffect, now_ms: u64) {
        match effect {
            SessionEffect::PelletEaten(pos) => {
                self.score += PELLET_SCORE;
                self.stats.pellets += 1;
                self.events
                    .push(RuntimeEvent::PelletEaten { x: pos.x, y: pos.y });
            }
            SessionEffect::PowerPelletEaten(pos) => {
                self.score += POWER_PELLET_SCORE;
                self.stats.power_pellets += 1;
                self.events
                    .push(RuntimeEvent::PowerPelletEaten { x: pos.x, y: pos.y });
                // A second pellet restarts the window rather than extending it.
                let until = now_ms + self.config.power_duration_ms;
                self.power_until = Some(until);
                self.events
                    .push(RuntimeEvent::PowerModeStarted { until_ms: until });
                debug!("power mode until {until}ms");
            }
            SessionEffect::GhostCaptured(idx) => {
                let return_duration_ms = self.config.return_duration_ms;
                let Some(ghost) = self.ghosts.get_mut(idx) else {
                    return;
                };
                ghost.pos = ghost.home;
                ghost.returning_until = Some(now_ms + return_duration_ms);
                let role = ghost.role;
                self.score += GHOST_SCORE;
                self.stats.ghosts_captured += 1;
                self.events.push(RuntimeEvent::GhostCaptured {
                    role,
                    points: GHOST_SCORE,
                });
                debug!("{} ghost captured", role.color());
            }
            SessionEffect::PlayerCaught(idx) => {
                let role = self
                    .ghosts
                    .get(idx)
                    .map(|ghost| ghost.role)
                    .unwrap_or(GhostRole::Aggressive);
                self.phase = Phase::Lost;
                self.events.push(RuntimeEvent::PlayerCaught { role });
                info!(
                    "player caught by {} ghost, final score {}",
                    role.color(),
                    self.score
                );
            }
        }
    }
}

fn spawn_ghosts(maze: &Maze) -> Vec<GhostInternal> {
    GhostRole::ALL
        .iter()
        .map(|role| {
            let home = maze.ghost_home(*role);
            GhostInternal {
                role: *role,
                pos: home,
                home,
                returning_until: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::constants::{GHOST_SCORE, POWER_DURATION_MS, RETURN_DURATION_MS, TICK_MS};
    use crate::engine::{EngineError, EngineOptions, GameEngine};
    use crate::types::{Direction, GhostRole, Phase, RuntimeEvent, Vec2};
    use crate::world::tests::layout;

    fn make_engine(rows: &[&str], player: Vec2, homes: [Vec2; 4]) -> GameEngine {
        let mut engine = GameEngine::new(
            &layout(rows, player, homes),
            EngineOptions {
                seed: Some(1),
                ..EngineOptions::default()
            },
        )
        .expect("test maze should build");
        engine.start();
        engine
    }

    /// Corridor on row 1; three pursuers locked in wall pockets on row 3.
    fn corridor_engine(row: &str, red_home: Vec2) -> GameEngine {
        make_engine(
            &["###########", row, "###########", "# # # #####", "###########"],
            Vec2::new(1, 1),
            [red_home, Vec2::new(1, 3), Vec2::new(3, 3), Vec2::new(5, 3)],
        )
    }

    fn ghost_idx(engine: &GameEngine, role: GhostRole) -> usize {
        engine
            .ghosts
            .iter()
            .position(|ghost| ghost.role == role)
            .expect("every role is spawned")
    }

    #[test]
    fn engine_waits_in_ready_until_started() {
        let mut engine = GameEngine::classic(EngineOptions {
            seed: Some(3),
            ..EngineOptions::default()
        })
        .expect("classic engine");
        assert_eq!(engine.phase(), Phase::Ready);
        engine.submit_direction_intent(Direction::Up);
        engine.tick();
        assert_eq!(engine.player.queued, None);
        assert_eq!(engine.now_ms(), 0);

        engine.start();
        assert_eq!(engine.phase(), Phase::Playing);
        assert_eq!(engine.player.pos, Vec2::new(9, 16));
        assert_eq!(engine.player.facing, Direction::Right);
    }

    #[test]
    fn zero_tick_period_is_rejected() {
        let err = GameEngine::classic(EngineOptions {
            tick_ms: Some(0),
            ..EngineOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::ZeroTick));
    }

    #[test]
    fn single_pellet_next_to_spawn_wins_in_one_tick() {
        let mut engine = make_engine(
            &[
                "###########",
                "# .       #",
                "# ####### #",
                "#         #",
                "###########",
            ],
            Vec2::new(1, 1),
            [
                Vec2::new(9, 3),
                Vec2::new(8, 3),
                Vec2::new(7, 3),
                Vec2::new(6, 3),
            ],
        );
        engine.submit_direction_intent(Direction::Right);
        engine.tick();
        assert_eq!(engine.score(), 10);
        assert_eq!(engine.phase(), Phase::Won);
    }

    #[test]
    fn walking_into_the_aggressive_pursuer_loses() {
        let mut engine = corridor_engine("#        .#", Vec2::new(7, 1));
        engine.submit_direction_intent(Direction::Right);
        for _ in 0..10 {
            engine.tick();
            if engine.phase() != Phase::Playing {
                break;
            }
        }
        assert_eq!(engine.phase(), Phase::Lost);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn power_pellet_then_capture_sends_ghost_home() {
        let mut engine = corridor_engine("# o      .#", Vec2::new(6, 1));
        engine.submit_direction_intent(Direction::Right);
        engine.tick();
        assert_eq!(engine.score(), 50);
        assert!(engine.power_active());

        let red = ghost_idx(&engine, GhostRole::Aggressive);
        for _ in 0..20 {
            engine.tick();
            if engine.ghosts[red].returning_until.is_some() {
                break;
            }
        }
        assert!(engine.ghosts[red].returning_until.is_some());
        assert_eq!(engine.ghosts[red].pos, Vec2::new(6, 1));
        assert_eq!(engine.score(), 50 + GHOST_SCORE);
        assert_eq!(engine.phase(), Phase::Playing);
        assert!(engine.now_ms() < POWER_DURATION_MS);
    }

    #[test]
    fn queued_turn_is_taken_as_soon_as_it_is_legal() {
        let mut engine = make_engine(
            &[
                "#######", "### ###", "#     #", "#######", "#.# # #", "#######",
            ],
            Vec2::new(1, 2),
            [
                Vec2::new(3, 4),
                Vec2::new(5, 4),
                Vec2::new(3, 4),
                Vec2::new(5, 4),
            ],
        );
        engine.submit_direction_intent(Direction::Up);
        engine.tick();
        // Up is blocked at x=1, so the player keeps moving right.
        assert_eq!(engine.player.pos, Vec2::new(2, 2));
        assert_eq!(engine.player.facing, Direction::Right);
        engine.tick();
        assert_eq!(engine.player.pos, Vec2::new(3, 2));
        engine.tick();
        assert_eq!(engine.player.pos, Vec2::new(3, 1));
        assert_eq!(engine.player.facing, Direction::Up);
    }

    #[test]
    fn coincident_ghost_is_harmless_during_power_mode() {
        let mut engine = corridor_engine("#        .#", Vec2::new(7, 1));
        let red = ghost_idx(&engine, GhostRole::Aggressive);
        engine.power_until = Some(POWER_DURATION_MS);
        engine.player.pos = Vec2::new(3, 1);
        engine.ghosts[red].pos = Vec2::new(3, 1);
        // Blocked player: nothing is captured, nothing is lost.
        engine.player.facing = Direction::Up;
        engine.tick();
        assert_eq!(engine.phase(), Phase::Playing);

        engine.power_until = None;
        engine.ghosts[red].pos = engine.player.pos;
        engine.ghosts[red].returning_until = Some(engine.now_ms() + RETURN_DURATION_MS);
        engine.tick();
        assert_eq!(engine.phase(), Phase::Playing);

        engine.ghosts[red].returning_until = None;
        engine.ghosts[red].pos = engine.player.pos;
        engine.tick();
        assert_eq!(engine.phase(), Phase::Lost);
    }

    #[test]
    fn every_ghost_on_the_destination_is_captured() {
        let mut engine = corridor_engine("#        .#", Vec2::new(7, 1));
        engine.power_until = Some(POWER_DURATION_MS);
        for idx in 0..3 {
            engine.ghosts[idx].pos = Vec2::new(2, 1);
        }
        engine.tick();
        let captured = engine.ghosts.iter().filter(|g| g.returning_until.is_some()).count();
        assert_eq!(captured, 3);
        assert_eq!(engine.score(), 3 * GHOST_SCORE);
        for ghost in &engine.ghosts {
            assert_eq!(ghost.pos, ghost.home);
        }
        assert_eq!(engine.phase(), Phase::Playing);
    }

    #[test]
    fn returning_ghost_recovers_after_its_timer() {
        let mut engine = corridor_engine("#        .#", Vec2::new(7, 1));
        let red = ghost_idx(&engine, GhostRole::Aggressive);
        engine.player.facing = Direction::Up;
        engine.ghosts[red].returning_until = Some(RETURN_DURATION_MS);
        let ticks = RETURN_DURATION_MS.div_ceil(TICK_MS);
        for _ in 0..ticks - 1 {
            engine.tick();
            assert_eq!(engine.ghosts[red].pos, Vec2::new(7, 1));
        }
        engine.tick();
        assert!(engine.ghosts[red].returning_until.is_none());
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot
            .events
            .contains(&RuntimeEvent::GhostRecovered {
                role: GhostRole::Aggressive
            }));
    }

    #[test]
    fn second_power_pellet_restarts_the_timer() {
        let mut engine = corridor_engine("# oo     .#", Vec2::new(9, 1));
        engine.submit_direction_intent(Direction::Right);
        engine.tick();
        let first = engine.power_until.expect("power after first pellet");
        engine.tick();
        let second = engine.power_until.expect("power after second pellet");
        assert_eq!(second, first + TICK_MS);
        assert_eq!(second, engine.now_ms() + POWER_DURATION_MS);
    }

    #[test]
    fn power_mode_expires_after_its_duration() {
        let mut engine = corridor_engine("#        .#", Vec2::new(9, 1));
        engine.player.facing = Direction::Up;
        engine.power_until = Some(engine.now_ms() + 1_000);
        for _ in 0..8 {
            engine.tick();
        }
        assert!(engine.power_active());
        engine.tick();
        assert!(!engine.power_active());
    }

    #[test]
    fn restart_cancels_timers_and_restores_the_maze() {
        let mut engine = corridor_engine("# o      .#", Vec2::new(9, 1));
        engine.submit_direction_intent(Direction::Right);
        engine.tick();
        assert!(engine.power_active());
        engine.ghosts[1].returning_until = Some(engine.now_ms() + 10);

        engine.restart();
        assert_eq!(engine.phase(), Phase::Playing);
        assert_eq!(engine.score(), 0);
        assert!(!engine.power_active());
        assert!(engine.ghosts.iter().all(|g| g.returning_until.is_none()));
        assert_eq!(engine.maze.remaining_collectibles(), 2);
        assert_eq!(engine.player.pos, Vec2::new(1, 1));

        engine.player.facing = Direction::Up;
        engine.build_snapshot(true);
        for _ in 0..100 {
            engine.tick();
        }
        let snapshot = engine.build_snapshot(true);
        assert!(!snapshot.events.contains(&RuntimeEvent::PowerModeEnded));
    }

    #[test]
    fn start_is_ignored_mid_game_but_restart_is_not() {
        let mut engine = corridor_engine("#.       .#", Vec2::new(9, 1));
        engine.submit_direction_intent(Direction::Left);
        engine.player.pos = Vec2::new(2, 1);
        engine.tick();
        assert_eq!(engine.score(), 10);
        engine.start();
        assert_eq!(engine.score(), 10);
        engine.restart();
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn terminal_phases_ignore_ticks_and_intents() {
        let mut engine = corridor_engine("#        .#", Vec2::new(7, 1));
        engine.phase = Phase::Lost;
        let before = engine.snapshot();
        engine.submit_direction_intent(Direction::Down);
        engine.tick();
        let after = engine.snapshot();
        assert_eq!(before.tick, after.tick);
        assert_eq!(before.now_ms, after.now_ms);
        assert_eq!(after.player.queued, None);
    }

    #[test]
    fn snapshot_marks_vulnerable_ghosts() {
        let mut engine = corridor_engine("#        .#", Vec2::new(7, 1));
        engine.power_until = Some(POWER_DURATION_MS);
        engine.ghosts[2].returning_until = Some(RETURN_DURATION_MS);
        let snapshot = engine.snapshot();
        assert!(snapshot.power_mode);
        let vulnerable: Vec<bool> = snapshot.ghosts.iter().map(|g| g.vulnerable).collect();
        assert_eq!(vulnerable, vec![true, true, false, true]);
        assert_eq!(snapshot.tiles[1], "#        .#");
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = corridor_engine("#        .#", Vec2::new(7, 1));
        let first = engine.build_snapshot(false);
        assert!(first.events.is_empty());
        let second = engine.build_snapshot(true);
        assert_eq!(second.events, vec![RuntimeEvent::SessionStarted]);
        let third = engine.build_snapshot(true);
        assert!(third.events.is_empty());
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let options = EngineOptions {
            seed: Some(424_242),
            ..EngineOptions::default()
        };
        let mut a = GameEngine::classic(options.clone()).expect("engine a");
        let mut b = GameEngine::classic(options).expect("engine b");
        a.start();
        b.start();
        let turns = [
            Direction::Up,
            Direction::Left,
            Direction::Down,
            Direction::Right,
        ];
        for step in 0..400 {
            if step % 7 == 0 {
                let dir = turns[(step / 7) % turns.len()];
                a.submit_direction_intent(dir);
                b.submit_direction_intent(dir);
            }
            a.tick();
            b.tick();
            let sa = serde_json::to_string(&a.build_snapshot(true)).expect("snapshot a");
            let sb = serde_json::to_string(&b.build_snapshot(true)).expect("snapshot b");
            assert_eq!(sa, sb);
            if a.phase().is_terminal() {
                break;
            }
        }
    }

    #[test]
    fn summary_reports_session_counters() {
        let mut engine = corridor_engine("# o.     .#", Vec2::new(9, 1));
        engine.submit_direction_intent(Direction::Right);
        engine.tick();
        engine.tick();
        let summary = engine.build_summary();
        assert_eq!(summary.score, 60);
        assert_eq!(summary.stats.pellets, 1);
        assert_eq!(summary.stats.power_pellets, 1);
        assert_eq!(summary.stats.ticks, 2);
        assert_eq!(summary.duration_ms, 2 * TICK_MS);
        assert_eq!(summary.outcome, Phase::Playing);
    }
}
