use log::trace;

use crate::rng::RandomSource;
use crate::types::CellKind;

use super::movement::resolve_player_step;
use super::{GameEngine, SessionEffect};

impl<R: RandomSource> GameEngine<R> {
    /// Moves the player one cell and consumes whatever it lands on.
    ///
    /// Returns `None` when both the queued and current directions are blocked;
    /// a player that did not move collects nothing and captures nothing.
    pub(super) fn update_player(&mut self) -> Option<Vec<SessionEffect>> {
        let step = resolve_player_step(
            &self.maze,
            self.player.pos,
            self.player.facing,
            self.player.queued,
        )?;
        self.player.pos = step.to;
        self.player.facing = step.facing;
        trace!("player -> ({},{})", step.to.x, step.to.y);

        let mut effects = Vec::new();
        match self.maze.consume(step.to) {
            Some(CellKind::Pellet) => effects.push(SessionEffect::PelletEaten(step.to)),
            Some(CellKind::PowerPellet) => effects.push(SessionEffect::PowerPelletEaten(step.to)),
            _ => {}
        }
        Some(effects)
    }
}
