//! The host tick counter.

use core::time::Duration;
use std::time::Instant;

use spin::Once;

/// Host timer frequency, in ticks per second.
pub const HZ: u64 = 250;

static BOOT: Once<Instant> = Once::new();

fn boot() -> Instant {
    *BOOT.call_once(Instant::now)
}

/// Time elapsed since the simulated host booted (first use of the clock).
pub fn uptime() -> Duration {
    boot().elapsed()
}

/// Ticks elapsed since boot.
///
/// This is a live snapshot of the host clock, never a cached value: two
/// calls separated by real time observe the counter advance. Drivers only
/// ever read it.
pub fn jiffies() -> u64 {
    let up = uptime();
    up.as_secs() * HZ + u64::from(up.subsec_nanos()) / (1_000_000_000 / HZ)
}
