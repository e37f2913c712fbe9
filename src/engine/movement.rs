use crate::types::{Direction, Vec2};
use crate::world::Maze;

/// One step along `dir`. Walkability is judged on the raw target (wrapped x,
/// unwrapped y); the returned position is already wrapped.
pub fn try_move(maze: &Maze, from: Vec2, dir: Direction) -> Option<Vec2> {
    let raw = from.step(dir, 1);
    if !maze.is_walkable(raw) {
        return None;
    }
    Some(maze.wrap(raw))
}

/// Legal single steps from `from`, in `Direction::ALL` order.
pub fn legal_moves(maze: &Maze, from: Vec2) -> Vec<(Direction, Vec2)> {
    Direction::ALL
        .iter()
        .filter_map(|dir| try_move(maze, from, *dir).map(|to| (*dir, to)))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerStep {
    pub to: Vec2,
    pub facing: Direction,
}

/// Buffered turn: the queued direction wins whenever it is legal, otherwise the
/// player keeps going the way it faces. `None` means the player is blocked.
pub fn resolve_player_step(
    maze: &Maze,
    from: Vec2,
    facing: Direction,
    queued: Option<Direction>,
) -> Option<PlayerStep> {
    if let Some(queued) = queued {
        if let Some(to) = try_move(maze, from, queued) {
            return Some(PlayerStep { to, facing: queued });
        }
    }
    try_move(maze, from, facing).map(|to| PlayerStep { to, facing })
}
