use thiserror::Error;

use crate::constants::{CLASSIC_GHOST_HOMES, CLASSIC_MAZE, CLASSIC_PLAYER_SPAWN};
use crate::types::{CellKind, GhostRole, Vec2};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("maze layout has no rows")]
    Empty,
    #[error("maze row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown cell {ch:?} at row {row}, column {col}")]
    UnknownCell { row: usize, col: usize, ch: char },
    #[error("maze row {row} must be entirely wall")]
    OpenBorder { row: usize },
    #[error("{who} spawn ({x},{y}) is not a walkable cell")]
    SpawnNotWalkable { who: String, x: i32, y: i32 },
}

/// Static description of a maze: the cell matrix plus the fixed spawn cells.
#[derive(Clone, Debug)]
pub struct MazeLayout {
    pub rows: Vec<String>,
    pub player_spawn: Vec2,
    /// Indexed in `GhostRole::ALL` order.
    pub ghost_homes: [Vec2; 4],
}

impl MazeLayout {
    pub fn classic() -> Self {
        Self {
            rows: CLASSIC_MAZE.iter().map(|row| row.to_string()).collect(),
            player_spawn: CLASSIC_PLAYER_SPAWN,
            ghost_homes: CLASSIC_GHOST_HOMES,
        }
    }
}

/// Maze topology plus the live collectible map.
///
/// `layout` never changes after construction; `cells` starts as a copy and only
/// ever loses collectibles until [`Maze::reset`] restores it.
#[derive(Clone, Debug)]
pub struct Maze {
    width: i32,
    height: i32,
    layout: Vec<CellKind>,
    cells: Vec<CellKind>,
    remaining: usize,
    player_spawn: Vec2,
    ghost_homes: [Vec2; 4],
}

impl Maze {
    pub fn new(layout: &MazeLayout) -> Result<Self, MazeError> {
        let Some(first) = layout.rows.first() else {
            return Err(MazeError::Empty);
        };
        let expected = first.chars().count();
        if expected == 0 {
            return Err(MazeError::Empty);
        }

        let mut cells = Vec::with_capacity(expected * layout.rows.len());
        for (row, line) in layout.rows.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(MazeError::Ragged {
                    row,
                    expected,
                    found,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let kind = CellKind::from_char(ch).ok_or(MazeError::UnknownCell { row, col, ch })?;
                cells.push(kind);
            }
        }

        let width = expected as i32;
        let height = layout.rows.len() as i32;
        let last_row = layout.rows.len() - 1;
        for row in [0, last_row] {
            let start = row * expected;
            if cells[start..start + expected]
                .iter()
                .any(|cell| *cell != CellKind::Wall)
            {
                return Err(MazeError::OpenBorder { row });
            }
        }

        let remaining = cells.iter().filter(|cell| cell.is_collectible()).count();
        let maze = Self {
            width,
            height,
            layout: cells.clone(),
            cells,
            remaining,
            player_spawn: layout.player_spawn,
            ghost_homes: layout.ghost_homes,
        };

        maze.ensure_spawn("player", layout.player_spawn)?;
        for (role, home) in GhostRole::ALL.iter().zip(layout.ghost_homes) {
            maze.ensure_spawn(role.color(), home)?;
        }
        Ok(maze)
    }

    fn ensure_spawn(&self, who: &str, pos: Vec2) -> Result<(), MazeError> {
        let in_range = pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height;
        if in_range && self.is_walkable(pos) {
            return Ok(());
        }
        Err(MazeError::SpawnNotWalkable {
            who: who.to_string(),
            x: pos.x,
            y: pos.y,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn player_spawn(&self) -> Vec2 {
        self.player_spawn
    }

    pub fn ghost_home(&self, role: GhostRole) -> Vec2 {
        let idx = GhostRole::ALL
            .iter()
            .position(|candidate| *candidate == role)
            .unwrap_or(0);
        self.ghost_homes[idx]
    }

    /// Horizontal torus; y passes through untouched.
    pub fn wrap(&self, pos: Vec2) -> Vec2 {
        Vec2 {
            x: pos.x.rem_euclid(self.width),
            y: pos.y,
        }
    }

    pub fn is_walkable(&self, pos: Vec2) -> bool {
        self.cell(pos) != CellKind::Wall
    }

    /// Live cell kind at the wrapped position. Rows outside the maze read as wall.
    pub fn cell(&self, pos: Vec2) -> CellKind {
        self.index_of(pos)
            .map(|idx| self.cells[idx])
            .unwrap_or(CellKind::Wall)
    }

    /// Clears a collectible and returns what was there. `None` for path and wall.
    pub fn consume(&mut self, pos: Vec2) -> Option<CellKind> {
        let idx = self.index_of(pos)?;
        let kind = self.cells[idx];
        if !kind.is_collectible() {
            return None;
        }
        self.cells[idx] = CellKind::Path;
        self.remaining -= 1;
        Some(kind)
    }

    pub fn has_remaining_collectibles(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.remaining
    }

    pub fn reset(&mut self) {
        self.cells.clone_from(&self.layout);
        self.remaining = self.cells.iter().filter(|cell| cell.is_collectible()).count();
    }

    pub fn tiles(&self) -> Vec<String> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|cell| cell.as_char()).collect())
            .collect()
    }

    fn index_of(&self, pos: Vec2) -> Option<usize> {
        if pos.y < 0 || pos.y >= self.height {
            return None;
        }
        let x = pos.x.rem_euclid(self.width);
        Some((pos.y * self.width + x) as usize)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;

    use super::*;

    pub(crate) fn layout(rows: &[&str], player: Vec2, homes: [Vec2; 4]) -> MazeLayout {
        MazeLayout {
            rows: rows.iter().map(|row| row.to_string()).collect(),
            player_spawn: player,
            ghost_homes: homes,
        }
    }

    fn tunnel_maze() -> Maze {
        let homes = [Vec2::new(3, 2); 4];
        Maze::new(&layout(
            &["#######", "#.. o #", " ..   .", "#######"],
            Vec2::new(1, 2),
            homes,
        ))
        .expect("tunnel maze should parse")
    }

    #[test]
    fn classic_layout_is_valid() {
        let maze = Maze::new(&MazeLayout::classic()).expect("classic maze should parse");
        assert_eq!(maze.width(), 19);
        assert_eq!(maze.height(), 22);
        assert_eq!(maze.remaining_collectibles(), 156);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Maze::new(&layout(
            &["####", "#.#", "####"],
            Vec2::new(1, 1),
            [Vec2::new(1, 1); 4],
        ))
        .unwrap_err();
        assert_eq!(
            err,
            MazeError::Ragged {
                row: 1,
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn open_top_or_bottom_row_is_rejected() {
        let err = Maze::new(&layout(
            &["### ", "#. #", "####"],
            Vec2::new(1, 1),
            [Vec2::new(2, 1); 4],
        ))
        .unwrap_err();
        assert_eq!(err, MazeError::OpenBorder { row: 0 });
    }

    #[test]
    fn spawn_inside_wall_is_rejected() {
        let err = Maze::new(&layout(
            &["####", "#. #", "####"],
            Vec2::new(0, 1),
            [Vec2::new(2, 1); 4],
        ))
        .unwrap_err();
        assert!(matches!(err, MazeError::SpawnNotWalkable { ref who, .. } if who == "player"));
    }

    #[test]
    fn unknown_characters_are_rejected() {
        let err = Maze::new(&layout(
            &["####", "#.x#", "####"],
            Vec2::new(1, 1),
            [Vec2::new(1, 1); 4],
        ))
        .unwrap_err();
        assert_eq!(
            err,
            MazeError::UnknownCell {
                row: 1,
                col: 2,
                ch: 'x'
            }
        );
    }

    #[test]
    fn consume_is_idempotent() {
        let mut maze = tunnel_maze();
        let before = maze.remaining_collectibles();
        assert_eq!(maze.consume(Vec2::new(1, 1)), Some(CellKind::Pellet));
        assert_eq!(maze.consume(Vec2::new(1, 1)), None);
        assert_eq!(maze.cell(Vec2::new(1, 1)), CellKind::Path);
        assert_eq!(maze.remaining_collectibles(), before - 1);
        assert_eq!(maze.consume(Vec2::new(0, 0)), None);
        assert_eq!(maze.cell(Vec2::new(0, 0)), CellKind::Wall);
    }

    #[test]
    fn reset_restores_collectibles() {
        let mut maze = tunnel_maze();
        let before = maze.tiles();
        maze.consume(Vec2::new(4, 1));
        maze.consume(Vec2::new(6, 2));
        assert_ne!(maze.tiles(), before);
        maze.reset();
        assert_eq!(maze.tiles(), before);
        assert!(maze.has_remaining_collectibles());
    }

    #[test]
    fn remaining_reaches_zero_after_last_collectible() {
        let mut maze = tunnel_maze();
        for y in 0..maze.height() {
            for x in 0..maze.width() {
                maze.consume(Vec2::new(x, y));
            }
        }
        assert!(!maze.has_remaining_collectibles());
    }

    #[test]
    fn tunnel_cells_are_reachable_across_the_edge() {
        let maze = tunnel_maze();
        assert!(maze.is_walkable(Vec2::new(-1, 2)));
        assert_eq!(maze.wrap(Vec2::new(-1, 2)), Vec2::new(6, 2));
        assert_eq!(maze.wrap(Vec2::new(7, 2)), Vec2::new(0, 2));
        assert_eq!(maze.cell(Vec2::new(-1, 2)), CellKind::Pellet);
    }

    proptest! {
        #[test]
        fn wrap_always_lands_in_range(x in -1_000i32..1_000, y in -5i32..10) {
            let maze = tunnel_maze();
            let wrapped = maze.wrap(Vec2::new(x, y));
            prop_assert!(wrapped.x >= 0 && wrapped.x < maze.width());
            prop_assert_eq!(wrapped.y, y);
        }

        #[test]
        fn rows_outside_the_maze_are_never_walkable(x in -1_000i32..1_000, dy in 0i32..100) {
            let maze = tunnel_maze();
            prop_assert!(!maze.is_walkable(Vec2::new(x, -1 - dy)));
            prop_assert!(!maze.is_walkable(Vec2::new(x, maze.height() + dy)));
        }
    }
}
