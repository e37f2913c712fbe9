use std::collections::{HashSet, VecDeque};

use crate::engine::movement::legal_moves;
use crate::engine::GameEngine;
use crate::rng::RandomSource;
use crate::types::{Direction, GhostView, Vec2};
use crate::world::Maze;

/// Threats closer than this switch the autopilot into escape mode.
const DANGER_RADIUS: i32 = 2;

/// Intent for the player's current situation, read straight off the engine.
pub fn next_intent<R: RandomSource>(engine: &GameEngine<R>) -> Option<Direction> {
    let player = engine.player_view();
    choose_direction(
        engine.maze(),
        Vec2::new(player.x, player.y),
        &engine.ghost_views(),
        engine.power_active(),
    )
}

/// Greedy intent source: run from nearby threats, hunt vulnerable pursuers
/// during power mode, otherwise walk the shortest safe path to a collectible.
///
/// Returns `None` only when the player has no legal move at all.
pub fn choose_direction(
    maze: &Maze,
    player: Vec2,
    ghosts: &[GhostView],
    power_mode: bool,
) -> Option<Direction> {
    let threats: Vec<Vec2> = ghosts
        .iter()
        .filter(|ghost| !ghost.returning && !ghost.vulnerable)
        .map(|ghost| Vec2::new(ghost.x, ghost.y))
        .collect();

    if nearest_distance(player, &threats).is_some_and(|dist| dist <= DANGER_RADIUS) {
        return escape_direction(maze, player, &threats);
    }

    if power_mode {
        let prey: Vec<Vec2> = ghosts
            .iter()
            .filter(|ghost| ghost.vulnerable)
            .map(|ghost| Vec2::new(ghost.x, ghost.y))
            .collect();
        if let Some(dir) = first_step_toward(maze, player, &threats, |cell| prey.contains(&cell)) {
            return Some(dir);
        }
    }

    first_step_toward(maze, player, &threats, |cell| {
        maze.cell(cell).is_collectible()
    })
    .or_else(|| escape_direction(maze, player, &threats))
}

fn nearest_distance(from: Vec2, cells: &[Vec2]) -> Option<i32> {
    cells.iter().map(|cell| from.manhattan(*cell)).min()
}

/// Legal move that keeps the most distance from the closest threat.
fn escape_direction(maze: &Maze, from: Vec2, threats: &[Vec2]) -> Option<Direction> {
    let mut best = None;
    let mut best_dist = i32::MIN;
    for (dir, to) in legal_moves(maze, from) {
        let dist = nearest_distance(to, threats).unwrap_or(i32::MAX);
        if dist > best_dist {
            best_dist = dist;
            best = Some(dir);
        }
    }
    best
}

/// Breadth-first search over walkable cells that are not next to a threat.
/// Returns the first step of the shortest path to a goal cell.
fn first_step_toward(
    maze: &Maze,
    from: Vec2,
    threats: &[Vec2],
    is_goal: impl Fn(Vec2) -> bool,
) -> Option<Direction> {
    let unsafe_cell = |cell: Vec2| threats.iter().any(|threat| threat.manhattan(cell) <= 1);

    let mut seen = HashSet::from([from]);
    let mut queue = VecDeque::new();
    for (dir, to) in legal_moves(maze, from) {
        if unsafe_cell(to) || !seen.insert(to) {
            continue;
        }
        queue.push_back((to, dir));
    }

    while let Some((cell, first)) = queue.pop_front() {
        if is_goal(cell) {
            return Some(first);
        }
        for (_, next) in legal_moves(maze, cell) {
            if unsafe_cell(next) || !seen.insert(next) {
                continue;
            }
            queue.push_back((next, first));
        }
    }
    None
}
