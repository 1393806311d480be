//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for the relay runtime.
//!
//! ## Field semantics
//! - `poll_interval`: delay between poll cycles; a tuning constant, small
//!   enough that successive tasks are not starved.
//! - `grace`: maximum wait for outstanding timers to retire on shutdown.
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus).
//! - `read_slot` / `write_slot`: the fixed store keys used for reading
//!   pending tasks and writing completed ones. There is no per-task
//!   namespace; both default to the same slot.

use std::time::Duration;

/// Global configuration for the relay runtime.
///
/// All fields are public for flexibility. Prefer the helper accessors where
/// they exist to avoid sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Delay between poll cycles against the read slot.
    ///
    /// Rearm is unconditional: the next cycle is scheduled after this
    /// interval regardless of whether the previous cycle yielded a payload,
    /// an empty reply, or a decode failure.
    pub poll_interval: Duration,

    /// Maximum time to wait for outstanding timers to retire on shutdown.
    ///
    /// When shutdown begins, every in-flight timer is cancelled via its
    /// `CancellationToken`; the relay then waits up to `grace` for the timer
    /// futures to exit before reporting `GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// skip the missed items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Store key polled for pending task payloads.
    pub read_slot: String,

    /// Store key the echo payload is written back to when a timer fires.
    pub write_slot: String,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    ///
    /// The `Bus` should use this value to avoid constructing an invalid
    /// channel.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `poll_interval = 1ms` (tight loop; tasks are picked up promptly)
    /// - `grace = 5s` (timers retire quickly once cancelled)
    /// - `bus_capacity = 1024`
    /// - `read_slot = write_slot = "XXXX"` (the single fixed task slot)
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            read_slot: "XXXX".to_string(),
            write_slot: "XXXX".to_string(),
        }
    }
}
