use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Enumeration order used for every tie-break in pursuer decisions.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn parse_move(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Raw neighbour, no wrapping applied.
    pub fn step(self, dir: Direction, cells: i32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx * cells,
            y: self.y + dy * cells,
        }
    }

    pub fn manhattan(self, other: Vec2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Wall,
    Path,
    Pellet,
    PowerPellet,
}

impl CellKind {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '#' => Some(Self::Wall),
            ' ' => Some(Self::Path),
            '.' => Some(Self::Pellet),
            'o' => Some(Self::PowerPellet),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Path => ' ',
            Self::Pellet => '.',
            Self::PowerPellet => 'o',
        }
    }

    pub fn is_collectible(self) -> bool {
        matches!(self, Self::Pellet | Self::PowerPellet)
    }
}

/// The four pursuer identities. Serialized by their classic colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhostRole {
    #[serde(rename = "red")]
    Aggressive,
    #[serde(rename = "pink")]
    Ambusher,
    #[serde(rename = "cyan")]
    Patroller,
    #[serde(rename = "orange")]
    Opportunist,
}

impl GhostRole {
    pub const ALL: [GhostRole; 4] = [
        GhostRole::Aggressive,
        GhostRole::Ambusher,
        GhostRole::Patroller,
        GhostRole::Opportunist,
    ];

    pub fn color(self) -> &'static str {
        match self {
            GhostRole::Aggressive => "red",
            GhostRole::Ambusher => "pink",
            GhostRole::Patroller => "cyan",
            GhostRole::Opportunist => "orange",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Ready,
    Playing,
    Won,
    Lost,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tickMs")]
    pub tick_ms: u64,
    #[serde(rename = "powerDurationMs")]
    pub power_duration_ms: u64,
    #[serde(rename = "returnDurationMs")]
    pub return_duration_ms: u64,
    /// `None` when the engine was handed an external random source.
    pub seed: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    #[serde(rename = "playerSpawn")]
    pub player_spawn: Vec2,
    #[serde(rename = "ghostHomes")]
    pub ghost_homes: Vec<(GhostRole, Vec2)>,
    pub config: GameConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub queued: Option<Direction>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub role: GhostRole,
    pub x: i32,
    pub y: i32,
    pub home: Vec2,
    pub returning: bool,
    pub vulnerable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    SessionStarted,
    PelletEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    PowerModeStarted {
        #[serde(rename = "untilMs")]
        until_ms: u64,
    },
    PowerModeEnded,
    GhostCaptured {
        role: GhostRole,
        points: u32,
    },
    GhostRecovered {
        role: GhostRole,
    },
    PlayerCaught {
        role: GhostRole,
    },
    SessionWon {
        score: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub phase: Phase,
    pub score: u32,
    #[serde(rename = "powerMode")]
    pub power_mode: bool,
    #[serde(rename = "powerUntilMs")]
    pub power_until_ms: Option<u64>,
    #[serde(rename = "powerRemainingMs")]
    pub power_remaining_ms: u64,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: usize,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub tiles: Vec<String>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub pellets: u32,
    #[serde(rename = "powerPellets")]
    pub power_pellets: u32,
    #[serde(rename = "ghostsCaptured")]
    pub ghosts_captured: u32,
    pub ticks: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub outcome: Phase,
    pub score: u32,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub stats: SessionStats,
}
