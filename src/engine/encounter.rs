use crate::rng::RandomSource;

use super::{GameEngine, SessionEffect};

impl<R: RandomSource> GameEngine<R> {
    /// Non-returning pursuers on the player's cell, in role order.
    fn ghosts_on_player(&self) -> impl Iterator<Item = usize> + '_ {
        let pos = self.player.pos;
        self.ghosts
            .iter()
            .enumerate()
            .filter(move |(_, ghost)| ghost.returning_until.is_none() && ghost.pos == pos)
            .map(|(idx, _)| idx)
    }

    /// Every eligible pursuer sharing the cell is captured, not just the first.
    pub(super) fn resolve_captures(&self) -> Vec<SessionEffect> {
        if !self.power_active() {
            return Vec::new();
        }
        self.ghosts_on_player()
            .map(SessionEffect::GhostCaptured)
            .collect()
    }

    pub(super) fn resolve_loss(&self) -> Option<SessionEffect> {
        if self.power_active() {
            return None;
        }
        self.ghosts_on_player().next().map(SessionEffect::PlayerCaught)
    }
}
