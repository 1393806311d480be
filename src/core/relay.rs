//! # Relay: owns the pipeline and drives it to completion.
//!
//! The [`Relay`] is the single owned orchestrator — bus, subscriber fan-out,
//! timer registry and poll loop are constructed once and passed explicitly;
//! nothing lives in process-wide state.
//!
//! ## High-level architecture
//! ```text
//! Relay::run()
//!   ├─► subscriber_listener(): Bus ─► SubscriberSet::emit(&Event)   (fire-and-forget)
//!   ├─► spawn Poller::run(child token)
//!   │        │  read_task ──► Store
//!   │        ▼  decode
//!   │   TimerRegistry::arm ──► timer future ── fire ──► Dispatcher ── write_task ──► Store
//!   │
//!   └─► wait for: OS signal | token cancelled | poller exit
//!         │
//!         ├─ signal/cancel → publish ShutdownRequested
//!         ├─ poller Err    → fatal store error (kept for the caller)
//!         │
//!         └─► cancel token → drain timers with grace:
//!                ├─ all retired  → publish AllStoppedWithin, Ok
//!                └─ grace passed → publish GraceExceeded, Err
//! ```
//!
//! ## Rules
//! - Only fatal errors leave `run()`; the binary maps them to exit status 1.
//! - The cancellation sweep runs on **every** exit path, so no timer future
//!   or payload outlives the relay.
//! - A store failure inside the poll loop is fatal by policy: the relay has
//!   no useful work without a live store, so it shuts down rather than retry.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::dispatch::Dispatcher;
use crate::core::poller::Poller;
use crate::core::shutdown;
use crate::core::timers::TimerRegistry;
use crate::error::RelayError;
use crate::events::{Bus, Event, EventKind};
use crate::store::Store;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Coordinates the poll loop, timer registry, event delivery and graceful
/// shutdown.
pub struct Relay {
    /// Global runtime configuration.
    pub cfg: Config,
    /// Event bus shared with every pipeline stage.
    pub bus: Bus,
    subs: Arc<SubscriberSet>,
    store: Arc<dyn Store>,
    registry: Arc<TimerRegistry>,
    token: CancellationToken,
}

impl Relay {
    /// Creates a relay over a connected, authenticated store.
    ///
    /// The store handed in must already be live; connecting and
    /// authenticating are fail-fast steps that belong to the caller.
    pub fn new(cfg: Config, store: Arc<dyn Store>, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(subscribers));
        let registry = TimerRegistry::new(bus.clone());
        Self {
            cfg,
            bus,
            subs,
            store,
            registry,
            token: CancellationToken::new(),
        }
    }

    /// Returns a handle that requests shutdown when cancelled, equivalent to
    /// the process receiving a termination signal.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs the relay until a shutdown signal arrives or the store fails.
    ///
    /// On either path, all outstanding timers are cancelled and drained
    /// within [`Config::grace`] before this returns.
    pub async fn run(&self) -> Result<(), RelayError> {
        self.subscriber_listener();
        self.bus.publish(Event::now(EventKind::StoreConnected));

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.store),
            &self.cfg.write_slot,
            self.bus.clone(),
        );
        let poller = Poller::new(
            Arc::clone(&self.store),
            Arc::clone(&self.registry),
            dispatcher,
            self.bus.clone(),
            self.cfg.clone(),
        );
        let mut poll = tokio::spawn(poller.run(self.token.child_token()));

        let poll_exit = tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => None,
            _ = self.token.cancelled() => None,
            res = &mut poll => Some(res),
        };

        if poll_exit.is_none() {
            self.bus.publish(Event::now(EventKind::ShutdownRequested));
        }
        self.token.cancel();

        let result = match poll_exit {
            // Shutdown requested: the poller observes the token and exits.
            None => {
                let _ = poll.await;
                Ok(())
            }
            // The poller only returns Ok once cancelled, so reaching here
            // without a shutdown request means the store failed.
            Some(Ok(Ok(()))) => Ok(()),
            Some(Ok(Err(store_err))) => Err(RelayError::Store(store_err)),
            Some(Err(_join)) => Err(RelayError::PollerPanicked),
        };

        let drained = self.drain_timers().await;
        result.and(drained)
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget).
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(_)) => continue,
                }
            }
        });
    }

    /// Cancels all outstanding timers and waits up to [`Config::grace`] for
    /// their futures to retire.
    async fn drain_timers(&self) -> Result<(), RelayError> {
        let pending = self.registry.pending().await;
        match time::timeout(self.cfg.grace, self.registry.cancel_all()).await {
            Ok(()) => {
                self.bus.publish(Event::now(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                self.bus.publish(Event::now(EventKind::GraceExceeded));
                Err(RelayError::GraceExceeded {
                    grace: self.cfg.grace,
                    pending,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::payload::TaskPayload;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    /// Store stub with scripted read replies and recorded writes.
    struct MemoryStore {
        reads: Mutex<VecDeque<Option<String>>>,
        fail_when_drained: bool,
        writes: Mutex<Vec<(String, String, Instant)>>,
    }

    impl MemoryStore {
        fn scripted(reads: Vec<Option<&str>>) -> Arc<Self> {
            Arc::new(Self {
                reads: Mutex::new(reads.into_iter().map(|r| r.map(String::from)).collect()),
                fail_when_drained: false,
                writes: Mutex::new(Vec::new()),
            })
        }

        /// Like `scripted`, but reads fail once the script is exhausted.
        fn failing(reads: Vec<Option<&str>>) -> Arc<Self> {
            Arc::new(Self {
                reads: Mutex::new(reads.into_iter().map(|r| r.map(String::from)).collect()),
                fail_when_drained: true,
                writes: Mutex::new(Vec::new()),
            })
        }

        async fn wait_for_writes(&self, n: usize) -> Vec<(String, String, Instant)> {
            for _ in 0..10_000 {
                {
                    let writes = self.writes.lock().await;
                    if writes.len() >= n {
                        return writes.clone();
                    }
                }
                time::sleep(Duration::from_millis(10)).await;
            }
            panic!("store never observed {n} writes");
        }
    }

    #[async_trait]
    impl Store for MemoryStore {
        async fn read_task(&self, _slot: &str) -> Result<Option<TaskPayload>, StoreError> {
            let mut reads = self.reads.lock().await;
            match reads.pop_front() {
                Some(reply) => Ok(reply.map(TaskPayload::new)),
                None if self.fail_when_drained => Err(StoreError::ConnectionClosed),
                None => Ok(None),
            }
        }

        async fn write_task(&self, slot: &str, payload: &TaskPayload) -> Result<(), StoreError> {
            self.writes.lock().await.push((
                slot.to_string(),
                payload.as_str().to_string(),
                Instant::now(),
            ));
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_back_echoes_payload_after_requested_delay() {
        let raw = r#"{"time": 2, "id": "abc"}"#;
        let store = MemoryStore::scripted(vec![Some(raw)]);
        let relay = Relay::new(Config::default(), store.clone(), Vec::new());
        let token = relay.shutdown_token();

        let started = Instant::now();
        let run = tokio::spawn(async move { relay.run().await });

        let writes = store.wait_for_writes(1).await;
        assert_eq!(writes[0].0, "XXXX");
        assert_eq!(writes[0].1, raw);
        assert!(writes[0].2.duration_since(started) >= Duration::from_secs(2));

        token.cancel();
        assert!(run.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_payloads_never_stall_polling() {
        let good = r#"{"time": 0, "id": "ok"}"#;
        let store = MemoryStore::scripted(vec![
            Some("not-json"),
            None,
            Some(r#"{"id": "abc"}"#),
            None,
            Some(good),
        ]);
        let relay = Relay::new(Config::default(), store.clone(), Vec::new());
        let mut events = relay.bus.subscribe();
        let token = relay.shutdown_token();

        let run = tokio::spawn(async move { relay.run().await });

        let writes = store.wait_for_writes(1).await;
        assert_eq!(writes[0].1, good);

        token.cancel();
        assert!(run.await.unwrap().is_ok());

        let mut decode_failures = 0;
        let mut armed = 0;
        while let Ok(ev) = events.try_recv() {
            match ev.kind {
                EventKind::DecodeFailed => decode_failures += 1,
                EventKind::TimerArmed => armed += 1,
                _ => {}
            }
        }
        assert_eq!(decode_failures, 2);
        assert_eq!(armed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_is_fatal_and_stops_the_relay() {
        let store = MemoryStore::failing(vec![None]);
        let relay = Relay::new(Config::default(), store, Vec::new());

        let err = relay.run().await.unwrap_err();
        assert!(matches!(
            err,
            RelayError::Store(StoreError::ConnectionClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_timers_without_write_back() {
        let store = MemoryStore::scripted(vec![Some(r#"{"time": 3600, "id": "later"}"#)]);
        let relay = Relay::new(Config::default(), store.clone(), Vec::new());
        let mut events = relay.bus.subscribe();
        let token = relay.shutdown_token();

        let run = tokio::spawn(async move { relay.run().await });

        // Wait until the timer is armed before requesting shutdown.
        loop {
            let ev = time::timeout(Duration::from_secs(60), events.recv())
                .await
                .expect("timer was never armed")
                .unwrap();
            if ev.kind == EventKind::TimerArmed {
                break;
            }
        }

        token.cancel();
        assert!(run.await.unwrap().is_ok());
        assert!(store.writes.lock().await.is_empty());

        let mut cancelled = 0;
        let mut drained = false;
        while let Ok(ev) = events.try_recv() {
            match ev.kind {
                EventKind::TimerCancelled => cancelled += 1,
                EventKind::AllStoppedWithin => drained = true,
                _ => {}
            }
        }
        assert_eq!(cancelled, 1);
        assert!(drained);
    }
}
