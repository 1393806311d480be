//! # taskrelay
//!
//! **taskrelay** is a delayed-task relay over a remote key-value store.
//!
//! It polls a fixed store slot for pending task descriptions, extracts the
//! requested delay from each one, arms an independent one-shot timer, and —
//! when the timer fires — echoes the task payload verbatim back to the
//! store's write slot.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!             ┌──────────────────────────────────────────────────────┐
//!             │  Relay (runtime orchestrator)                        │
//!             │  - Bus (broadcast events)                            │
//!             │  - SubscriberSet (fans out to user subscribers)      │
//!             │  - TimerRegistry (arena of in-flight timers)         │
//!             └──────┬──────────────────────────────┬────────────────┘
//!                    ▼                              │
//!             ┌──────────────┐                      │
//!             │    Poller    │── read_task ──► Store│(TCP)
//!             │ (poll cycle) │◄── payload ─────     │
//!             └──────┬───────┘                      │
//!                    │ decode(payload)              │
//!                    ▼                              │
//!             ┌──────────────┐   delay elapses      │
//!             │ TimerRegistry│──────────┐           │
//!             │  arm(delay)  │          ▼           │
//!             └──────────────┘   ┌──────────────┐   │
//!                                │  Dispatcher  │── write_task ──► Store
//!                                │ (write-back) │   (fire-and-forget)
//!                                └──────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! TcpStore::connect ──► authenticate ──► Relay::new ──► Relay::run()
//!
//! loop {
//!   ├─► poll read_task every poll_interval
//!   ├─► payload? decode : continue
//!   ├─► decode ok? arm one-shot timer : publish DecodeFailed, continue
//!   └─► timer fires ──► write_task(echo), release timer
//! }
//!
//! exit conditions:
//!   - termination signal  → cancel timers, drain with grace, Ok  (exit 0)
//!   - store error / auth  → cancel timers, drain, Err            (exit 1)
//! ```
//!
//! ## Semantics
//! - **One timer per decode**: every successfully decoded payload arms its
//!   own independent timer. Overlapping timers for the same slot are
//!   deliberate (at-least-once relay); nothing deduplicates or supersedes
//!   earlier timers.
//! - **Exactly-once release**: a timer terminates by exactly one of
//!   {fire, cancel}; its payload is consumed on fire or dropped on cancel.
//! - **Fire-and-forget write-back**: a failed write is published as an event
//!   and dropped, never retried.
//! - **Fail-fast**: connection or authentication failure terminates the
//!   process; there is no useful work without a live, authenticated store.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use taskrelay::{Config, LogWriter, Relay, Subscribe, TcpStore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = TcpStore::connect("192.168.2.171:6379").await?;
//!     store.authenticate("123456").await?;
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
//!     let relay = Relay::new(Config::default(), Arc::new(store), subs);
//!     relay.run().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod payload;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{Dispatcher, Relay, TimerId, TimerRegistry};
pub use error::{DecodeError, RelayError, StoreError};
pub use events::{Bus, Event, EventKind};
pub use payload::{Decoded, TaskPayload, decode};
pub use store::{Store, TcpStore};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
