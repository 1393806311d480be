//! # Poller: the self-perpetuating read loop.
//!
//! One cycle = sleep `poll_interval`, issue one `read_task`, handle the
//! reply:
//!
//! ```text
//! loop {
//!   ├─► sleep(poll_interval)        (cancellable; shutdown exits here)
//!   ├─► store.read_task(read_slot)
//!   │     ├─ Ok(None)      → nothing this cycle
//!   │     ├─ Ok(Some(p))   → decode(p)
//!   │     │     ├─ Ok  → registry.arm(delay, echo)   (one timer per decode)
//!   │     │     └─ Err → publish DecodeFailed, drop payload
//!   │     └─ Err(e)        → return Err(e)           (store loss is fatal)
//!   └─► continue                     (rearm is the loop itself)
//! }
//! ```
//!
//! ## Rules
//! - Rearm is unconditional: decode failures and empty replies never stall
//!   polling. Only cancellation or a store error ends the loop.
//! - Decode failures are not retried; the malformed payload is dropped.
//! - Arming never waits on previously armed timers.

use std::sync::Arc;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::dispatch::Dispatcher;
use crate::core::timers::TimerRegistry;
use crate::error::StoreError;
use crate::events::{Bus, Event, EventKind};
use crate::payload::decode;
use crate::store::Store;

/// The recurring read cycle against the task slot.
pub struct Poller {
    store: Arc<dyn Store>,
    registry: Arc<TimerRegistry>,
    dispatcher: Dispatcher,
    bus: Bus,
    cfg: Config,
    read_slot: Arc<str>,
}

impl Poller {
    /// Creates a poller over the given store and registry.
    pub fn new(
        store: Arc<dyn Store>,
        registry: Arc<TimerRegistry>,
        dispatcher: Dispatcher,
        bus: Bus,
        cfg: Config,
    ) -> Self {
        let read_slot = Arc::from(cfg.read_slot.as_str());
        Self {
            store,
            registry,
            dispatcher,
            bus,
            cfg,
            read_slot,
        }
    }

    /// Runs poll cycles until cancelled or the store fails.
    ///
    /// Returns `Ok(())` only on cancellation; a store error is returned to
    /// the relay, which treats it as fatal.
    pub async fn run(self, token: CancellationToken) -> Result<(), StoreError> {
        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                _ = time::sleep(self.cfg.poll_interval) => {}
            }

            let payload = match self.store.read_task(&self.read_slot).await {
                Ok(Some(payload)) => payload,
                Ok(None) => continue,
                Err(err) => return Err(err),
            };

            self.bus.publish(
                Event::now(EventKind::TaskReceived)
                    .with_slot(Arc::clone(&self.read_slot))
                    .with_bytes(payload.len()),
            );

            match decode(payload) {
                Ok(decoded) => {
                    Arc::clone(&self.registry)
                        .arm(decoded.delay, decoded.echo, self.dispatcher.clone(), &token)
                        .await;
                }
                Err(err) => {
                    self.bus.publish(
                        Event::now(EventKind::DecodeFailed)
                            .with_slot(Arc::clone(&self.read_slot))
                            .with_reason(err.to_string()),
                    );
                }
            }
        }
    }
}
