use log::trace;

use crate::constants::{AMBUSH_LOOKAHEAD, OPPORTUNIST_CHASE_DISTANCE, PATROL_CHASE_PROBABILITY};
use crate::rng::RandomSource;
use crate::types::{Direction, GhostRole, Vec2};
use crate::world::Maze;

use super::movement::legal_moves;
use super::GameEngine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Aggressive,
    Ambusher,
    Patroller,
    Opportunist,
    Evading,
}

impl Strategy {
    pub fn select(role: GhostRole, power_mode: bool) -> Self {
        if power_mode {
            return Strategy::Evading;
        }
        match role {
            GhostRole::Aggressive => Strategy::Aggressive,
            GhostRole::Ambusher => Strategy::Ambusher,
            GhostRole::Patroller => Strategy::Patroller,
            GhostRole::Opportunist => Strategy::Opportunist,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PursuitContext {
    pub pursuer: Vec2,
    pub player: Vec2,
    pub player_facing: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rank {
    Nearest,
    Farthest,
}

/// Picks the next cell for one pursuer, or `None` when it has no legal move.
pub fn choose_move<R: RandomSource + ?Sized>(
    strategy: Strategy,
    maze: &Maze,
    ctx: &PursuitContext,
    rng: &mut R,
) -> Option<Vec2> {
    let moves = legal_moves(maze, ctx.pursuer);
    if moves.is_empty() {
        return None;
    }

    let picked = match strategy {
        Strategy::Evading => ranked(&moves, ctx.player, Rank::Farthest),
        Strategy::Aggressive => ranked(&moves, ctx.player, Rank::Nearest),
        Strategy::Ambusher => {
            let target = ctx.player.step(ctx.player_facing, AMBUSH_LOOKAHEAD);
            ranked(&moves, target, Rank::Nearest)
        }
        Strategy::Patroller => {
            if rng.bool(PATROL_CHASE_PROBABILITY) {
                ranked(&moves, ctx.player, Rank::Nearest)
            } else {
                moves[rng.pick_index(moves.len())]
            }
        }
        Strategy::Opportunist => {
            if ctx.pursuer.manhattan(ctx.player) > OPPORTUNIST_CHASE_DISTANCE {
                ranked(&moves, ctx.player, Rank::Nearest)
            } else {
                ranked(&moves, ctx.player, Rank::Farthest)
            }
        }
    };
    Some(picked.1)
}

/// Stable pick: on equal distance the earlier move in enumeration order wins.
fn ranked(moves: &[(Direction, Vec2)], target: Vec2, rank: Rank) -> (Direction, Vec2) {
    let mut best = moves[0];
    let mut best_dist = best.1.manhattan(target);
    for candidate in &moves[1..] {
        let dist = candidate.1.manhattan(target);
        let better = match rank {
            Rank::Nearest => dist < best_dist,
            Rank::Farthest => dist > best_dist,
        };
        if better {
            best = *candidate;
            best_dist = dist;
        }
    }
    best
}

impl<R: RandomSource> GameEngine<R> {
    pub(super) fn update_ghosts(&mut self) {
        let power_mode = self.power_active();
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].returning_until.is_some() {
                continue;
            }
            let role = self.ghosts[idx].role;
            let ctx = PursuitContext {
                pursuer: self.ghosts[idx].pos,
                player: self.player.pos,
                player_facing: self.player.facing,
            };
            let strategy = Strategy::select(role, power_mode);
            if let Some(next) = choose_move(strategy, &self.maze, &ctx, &mut self.rng) {
                trace!("{} {:?} -> ({},{})", role.color(), strategy, next.x, next.y);
                self.ghosts[idx].pos = next;
            }
        }
    }
}
