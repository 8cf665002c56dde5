//! Injectable time source
//!
//! All TTL, staleness, and rate-limit arithmetic runs on unix milliseconds
//! from a `Clock` so tests can drive time explicitly.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" as unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock default.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
