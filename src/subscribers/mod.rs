//! # Event subscribers for the relay runtime.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used to deliver runtime events broadcast through the
//! [`Bus`](crate::events::Bus), plus the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Poller/Timers/Dispatcher ── publish(Event) ──► Bus
//!                                                   │
//!                                        Relay listener ──► SubscriberSet
//!                                                   ┌─────────┼─────────┐
//!                                                   ▼         ▼         ▼
//!                                               LogWriter  Metrics   Custom
//! ```
//!
//! Subscribers observe the pipeline without participating in it: a slow or
//! panicking subscriber never delays a poll cycle or a timer fire.

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
