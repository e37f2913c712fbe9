use crate::types::Vec2;

pub const TICK_MS: u64 = 120;

pub const POWER_DURATION_MS: u64 = 10_000;
pub const RETURN_DURATION_MS: u64 = 3_000;

pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const GHOST_SCORE: u32 = 200;

pub const AMBUSH_LOOKAHEAD: i32 = 4;
pub const OPPORTUNIST_CHASE_DISTANCE: i32 = 8;
pub const PATROL_CHASE_PROBABILITY: f32 = 0.7;

/// `#` wall, `.` pellet, `o` power pellet, space open path.
/// Row 10 is open at both ends and forms the wrap tunnel.
pub const CLASSIC_MAZE: [&str; 22] = [
    "###################",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#o##.###.#.###.##o#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.### # ###.####",
    "#  #.#       #.#  #",
    "####.# ## ## #.####",
    "    .  #   #  .    ",
    "####.# ##### #.####",
    "#  #.#       #.#  #",
    "####.# ##### #.####",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#o.#..... .....#.o#",
    "##.#.#.#####.#.#.##",
    "#....#...#...#....#",
    "#.######.#.######.#",
    "#.................#",
    "###################",
];

pub const CLASSIC_PLAYER_SPAWN: Vec2 = Vec2::new(9, 16);

/// Home cells in `GhostRole::ALL` order.
pub const CLASSIC_GHOST_HOMES: [Vec2; 4] = [
    Vec2::new(9, 8),
    Vec2::new(8, 10),
    Vec2::new(10, 10),
    Vec2::new(9, 10),
];
