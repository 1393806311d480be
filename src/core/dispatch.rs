//! # Dispatcher: the write-back issued when a timer fires.
//!
//! The dispatcher runs on the fire path of a timer future, after the handle
//! has already retired from the arena. It issues one `write_task` command
//! carrying the echo payload and publishes the outcome.
//!
//! ## Fire-and-forget contract
//! The write's own completion is deliberately not load-bearing: a failed
//! write is published as `WriteFailed` and dropped — no retry, no
//! propagation, no effect on any other in-flight timer. Payload and handle
//! release never depend on the write succeeding.

use std::sync::Arc;

use crate::events::{Bus, Event, EventKind};
use crate::payload::TaskPayload;
use crate::store::Store;

/// Issues the write-back for fired timers.
///
/// Cheap to clone; every armed timer captures its own copy.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn Store>,
    write_slot: Arc<str>,
    bus: Bus,
}

impl Dispatcher {
    /// Creates a dispatcher writing to `write_slot`.
    pub fn new(store: Arc<dyn Store>, write_slot: &str, bus: Bus) -> Self {
        Self {
            store,
            write_slot: Arc::from(write_slot),
            bus,
        }
    }

    /// Issues the write-back for a fired timer, consuming its payload.
    ///
    /// Runs exactly once per timer, on the fire path only.
    pub async fn dispatch(&self, timer: u64, payload: TaskPayload) {
        match self.store.write_task(&self.write_slot, &payload).await {
            Ok(()) => {
                self.bus.publish(
                    Event::now(EventKind::WriteIssued)
                        .with_slot(Arc::clone(&self.write_slot))
                        .with_timer(timer),
                );
            }
            Err(err) => {
                self.bus.publish(
                    Event::now(EventKind::WriteFailed)
                        .with_slot(Arc::clone(&self.write_slot))
                        .with_timer(timer)
                        .with_reason(err.to_string()),
                );
            }
        }
        // payload consumed: the echo's single ownership ends here
    }
}
