use serde_json::{json, Value};

use crate::types::{Direction, Snapshot, WorldInit};

/// Host input, applied by the tick driver between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Intent(Direction),
    Start,
    Restart,
    Shutdown,
}

/// Parses one input line.
///
/// JSON objects are the primary form (`{"type":"input","dir":"up"}`,
/// `{"type":"start"}`, `{"type":"restart"}`, `{"type":"quit"}`). Bare words
/// such as `left` or `restart` are accepted too so the console is usable by hand.
pub fn parse_command(raw: &str) -> Option<Command> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed.starts_with('{') {
        return parse_bare_word(trimmed);
    }

    let value: Value = serde_json::from_str(trimmed).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(Command::Intent(dir))
        }
        "start" => Some(Command::Start),
        "restart" => Some(Command::Restart),
        "quit" => Some(Command::Shutdown),
        _ => None,
    }
}

fn parse_bare_word(word: &str) -> Option<Command> {
    if let Some(dir) = Direction::parse_move(word) {
        return Some(Command::Intent(dir));
    }
    match word.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "restart" => Some(Command::Restart),
        "quit" | "exit" => Some(Command::Shutdown),
        _ => None,
    }
}

pub fn welcome_message(world: &WorldInit) -> Value {
    json!({
        "type": "welcome",
        "world": world,
    })
}

pub fn state_message(snapshot: &Snapshot) -> Value {
    json!({
        "type": "state",
        "snapshot": snapshot,
    })
}

pub fn game_over_message(snapshot: &Snapshot) -> Value {
    json!({
        "type": "game_over",
        "outcome": snapshot.phase,
        "score": snapshot.score,
        "tick": snapshot.tick,
    })
}
