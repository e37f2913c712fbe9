use std::time::{SystemTime, UNIX_EPOCH};

pub(super) fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

/// Wall-clock seed for engines created without one.
pub(super) fn default_seed() -> u32 {
    let now = now_ms();
    (now ^ (now >> 32)) as u32
}

pub(super) fn remaining_ms(until_ms: u64, now_ms: u64) -> u64 {
    until_ms.saturating_sub(now_ms)
}
