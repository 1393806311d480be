//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the relay, the poller,
//! the timer registry and the dispatcher.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Relay`, `Poller`, `TimerRegistry`, `Dispatcher`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: `Relay::subscriber_listener()`, which fans events out to
//!   the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
