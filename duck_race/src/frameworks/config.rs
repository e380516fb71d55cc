use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("RACE_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3003)
}

/// Fixed seed for every race that does not request its own; unset means a fresh random seed per race.
pub fn race_seed() -> Option<u64> {
    env::var("RACE_SEED").ok().and_then(|v| v.trim().parse().ok())
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const FRAME_BROADCAST_CAPACITY: usize = 16;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);
// Finished races stay joinable briefly so late viewers still see the result.
pub const FINISHED_RACE_LINGER: Duration = Duration::from_secs(5);
