//! Runtime core: the relay pipeline and its lifecycle.
//!
//! The entry point is [`Relay`], which owns the event bus, the timer
//! registry and the poll loop, and drives graceful shutdown. The
//! [`TimerRegistry`] and [`Dispatcher`] are exposed for embedders that want
//! to arm deferred write-backs without the poll loop.
//!
//! Internal modules:
//! - [`poller`]: the self-perpetuating read loop against the task slot;
//! - [`timers`]: arena of one-shot timer handles with exactly-once retirement;
//! - [`dispatch`]: the fire-and-forget write-back issued when a timer fires;
//! - [`relay`]: wires the pipeline together and handles shutdown;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod dispatch;
mod poller;
mod relay;
mod shutdown;
mod timers;

pub use dispatch::Dispatcher;
pub use relay::Relay;
pub use timers::{TimerId, TimerRegistry};
