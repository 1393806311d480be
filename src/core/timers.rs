//! # Timer registry: arena of in-flight one-shot timers.
//!
//! Each successful decode arms exactly one timer. A timer owns its payload
//! for its whole life and terminates by exactly one of {fire, cancel}:
//!
//! ```text
//! arm(delay, payload) ──► SlotMap entry + spawned timer future
//!                              │
//!              ┌───────────────┴───────────────┐
//!           sleep elapses                 token cancelled
//!              │                               │
//!        retire from arena               retire from arena
//!        publish TimerFired              publish TimerCancelled
//!        dispatch write-back             payload dropped here
//!        (payload consumed)
//! ```
//!
//! ## Rules
//! - A handle self-removes from the arena the instant it fires or is
//!   cancelled; no handle can fire twice (the future runs exactly one of
//!   its two select arms).
//! - Handles are independent: arming a new timer never affects existing
//!   ones. Several timers for the same slot may be in flight at once.
//! - The payload moves into the timer future at arm time and is consumed
//!   exactly once, on whichever exit path runs.
//! - `cancel_all` drains the arena, cancels every token and joins the timer
//!   futures; it is the shutdown sweep.

use std::sync::Arc;
use std::time::Duration;

use slotmap::{Key, SlotMap};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::dispatch::Dispatcher;
use crate::events::{Bus, Event, EventKind};
use crate::payload::TaskPayload;

slotmap::new_key_type! {
    /// Generational id of an in-flight timer.
    pub struct TimerId;
}

/// Stable integer form of a [`TimerId`] for events and logs.
fn timer_label(id: TimerId) -> u64 {
    id.data().as_ffi()
}

/// Handle to one in-flight timer.
///
/// The payload itself lives inside the spawned future; the handle only
/// carries what the registry needs to cancel and join it.
struct TimerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Arena of in-flight timers.
pub struct TimerRegistry {
    timers: RwLock<SlotMap<TimerId, TimerHandle>>,
    bus: Bus,
}

impl TimerRegistry {
    /// Creates an empty registry publishing to `bus`.
    pub fn new(bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            timers: RwLock::new(SlotMap::with_key()),
            bus,
        })
    }

    /// Arms a one-shot timer: after `delay`, `dispatcher` issues the
    /// write-back carrying `payload`.
    ///
    /// The timer's token is derived from `parent`, so cancelling the parent
    /// (shutdown) cancels the timer too.
    pub async fn arm(
        self: Arc<Self>,
        delay: Duration,
        payload: TaskPayload,
        dispatcher: Dispatcher,
        parent: &CancellationToken,
    ) -> TimerId {
        let token = parent.child_token();

        let mut timers = self.timers.write().await;
        let id = timers.insert_with_key(|id| {
            let join = tokio::spawn(Self::run_timer(
                Arc::clone(&self),
                id,
                token.clone(),
                delay,
                payload,
                dispatcher,
            ));
            TimerHandle {
                cancel: token.clone(),
                join,
            }
        });
        drop(timers);

        self.bus.publish(
            Event::now(EventKind::TimerArmed)
                .with_timer(timer_label(id))
                .with_delay(delay),
        );
        id
    }

    /// Cancels one timer if it is still in flight.
    ///
    /// The timer future observes the token, retires the handle and releases
    /// the payload without invoking the write-back. Returns `false` when the
    /// id is unknown (already fired, cancelled, or never existed).
    pub async fn cancel(&self, id: TimerId) -> bool {
        let timers = self.timers.read().await;
        match timers.get(id) {
            Some(handle) => {
                handle.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of timers currently in flight.
    pub async fn pending(&self) -> usize {
        self.timers.read().await.len()
    }

    /// Cancels every in-flight timer and joins its future: the shutdown
    /// sweep. Payloads are released on the cancel path; nothing fires after
    /// this returns.
    pub async fn cancel_all(&self) {
        let handles: Vec<(TimerId, TimerHandle)> = {
            let mut timers = self.timers.write().await;
            timers.drain().collect()
        };

        for (_, handle) in &handles {
            handle.cancel.cancel();
        }

        for (id, handle) in handles {
            if handle.join.await.is_err() {
                self.bus.publish(
                    Event::now(EventKind::TimerCancelled)
                        .with_timer(timer_label(id))
                        .with_reason("timer_task_panicked"),
                );
            }
        }
    }

    /// Removes a handle from the arena; idempotent (the shutdown sweep may
    /// have drained it already).
    async fn retire(&self, id: TimerId) {
        let mut timers = self.timers.write().await;
        timers.remove(id);
    }

    /// The timer future: one cancellable sleep, then exactly one exit path.
    async fn run_timer(
        registry: Arc<Self>,
        id: TimerId,
        token: CancellationToken,
        delay: Duration,
        payload: TaskPayload,
        dispatcher: Dispatcher,
    ) {
        let fired = tokio::select! {
            _ = token.cancelled() => false,
            _ = time::sleep(delay) => true,
        };

        registry.retire(id).await;

        if fired {
            registry
                .bus
                .publish(Event::now(EventKind::TimerFired).with_timer(timer_label(id)));
            dispatcher.dispatch(timer_label(id), payload).await;
        } else {
            registry
                .bus
                .publish(Event::now(EventKind::TimerCancelled).with_timer(timer_label(id)));
            // payload dropped here: released without a write-back
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::Store;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// Store stub that records write-backs.
    struct RecordingStore {
        writes: Mutex<Vec<(String, String)>>,
    }

    impl RecordingStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                writes: Mutex::new(Vec::new()),
            })
        }

        async fn written(&self) -> Vec<(String, String)> {
            self.writes.lock().await.clone()
        }
    }

    #[async_trait]
    impl Store for RecordingStore {
        async fn read_task(&self, _slot: &str) -> Result<Option<TaskPayload>, StoreError> {
            Ok(None)
        }

        async fn write_task(&self, slot: &str, payload: &TaskPayload) -> Result<(), StoreError> {
            self.writes
                .lock()
                .await
                .push((slot.to_string(), payload.as_str().to_string()));
            Ok(())
        }
    }

    fn fixture() -> (Arc<RecordingStore>, Arc<TimerRegistry>, Dispatcher, Bus) {
        let bus = Bus::new(64);
        let store = RecordingStore::new();
        let registry = TimerRegistry::new(bus.clone());
        let dispatcher = Dispatcher::new(store.clone(), "XXXX", bus.clone());
        (store, registry, dispatcher, bus)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once_and_retires() {
        let (store, registry, dispatcher, _bus) = fixture();
        let root = CancellationToken::new();

        Arc::clone(&registry)
            .arm(
                Duration::from_secs(2),
                TaskPayload::new(r#"{"time": 2}"#),
                dispatcher,
                &root,
            )
            .await;
        assert_eq!(registry.pending().await, 1);

        time::sleep(Duration::from_secs(3)).await;

        let writes = store.written().await;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0], ("XXXX".to_string(), r#"{"time": 2}"#.to_string()));
        assert_eq!(registry.pending().await, 0);

        // Nothing fires again later.
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.written().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire_and_releases_payload() {
        let (store, registry, dispatcher, bus) = fixture();
        let root = CancellationToken::new();
        let mut events = bus.subscribe();

        let id = Arc::clone(&registry)
            .arm(
                Duration::from_secs(60),
                TaskPayload::new(r#"{"time": 60}"#),
                dispatcher,
                &root,
            )
            .await;

        assert!(registry.cancel(id).await);
        time::sleep(Duration::from_secs(120)).await;

        assert!(store.written().await.is_empty());
        assert_eq!(registry.pending().await, 0);
        assert!(!registry.cancel(id).await);

        let mut cancelled = 0;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::TimerCancelled {
                cancelled += 1;
            }
        }
        assert_eq!(cancelled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_timers_are_independent() {
        let (store, registry, dispatcher, _bus) = fixture();
        let root = CancellationToken::new();

        Arc::clone(&registry)
            .arm(
                Duration::from_secs(5),
                TaskPayload::new(r#"{"time": 5, "id": "slow"}"#),
                dispatcher.clone(),
                &root,
            )
            .await;
        Arc::clone(&registry)
            .arm(
                Duration::from_secs(1),
                TaskPayload::new(r#"{"time": 1, "id": "fast"}"#),
                dispatcher,
                &root,
            )
            .await;
        assert_eq!(registry.pending().await, 2);

        time::sleep(Duration::from_secs(2)).await;
        let writes = store.written().await;
        assert_eq!(writes.len(), 1);
        assert!(writes[0].1.contains("fast"));
        assert_eq!(registry.pending().await, 1);

        time::sleep(Duration::from_secs(4)).await;
        let writes = store.written().await;
        assert_eq!(writes.len(), 2);
        assert!(writes[1].1.contains("slow"));
        assert_eq!(registry.pending().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_drains_every_pending_timer() {
        let (store, registry, dispatcher, _bus) = fixture();
        let root = CancellationToken::new();

        for i in 0..4 {
            Arc::clone(&registry)
                .arm(
                    Duration::from_secs(30 + i),
                    TaskPayload::new(format!(r#"{{"time": {}}}"#, 30 + i)),
                    dispatcher.clone(),
                    &root,
                )
                .await;
        }
        assert_eq!(registry.pending().await, 4);

        registry.cancel_all().await;
        assert_eq!(registry.pending().await, 0);

        time::sleep(Duration::from_secs(120)).await;
        assert!(store.written().await.is_empty());
    }
}
