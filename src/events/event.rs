//! # Runtime events emitted by the relay pipeline.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Connection events**: store connection milestones
//! - **Pipeline events**: poll replies, decode outcomes, timer lifecycle,
//!   write-back outcomes
//! - **Shutdown events**: signal observed, timers drained (or not) in time
//! - **Subscriber events**: fan-out overflow and panic isolation
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! slot involved, the timer id, delays, and failure reasons.
//!
//! ## Ordering
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore exact order when events are consumed
//! from independent subscriber queues.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Connection events ===
    /// The store connection is live and authenticated; polling begins.
    StoreConnected,

    // === Pipeline events ===
    /// A poll cycle returned a non-empty payload.
    ///
    /// Sets: `slot`, `bytes`.
    TaskReceived,

    /// A payload failed to decode and was dropped; no timer was armed.
    ///
    /// Sets: `slot`, `reason`.
    DecodeFailed,

    /// A timer was armed for a decoded payload.
    ///
    /// Sets: `timer`, `delay_ms`.
    TimerArmed,

    /// A timer's delay elapsed; its write-back is about to be issued.
    ///
    /// Sets: `timer`.
    TimerFired,

    /// A timer was cancelled before firing; its payload was released without
    /// a write-back.
    ///
    /// Sets: `timer` (and `reason` if the timer task itself failed).
    TimerCancelled,

    /// The write-back command was issued and acknowledged.
    ///
    /// Sets: `timer`, `slot`.
    WriteIssued,

    /// The write-back command failed. Fire-and-forget: reported here, never
    /// retried, no effect on other timers.
    ///
    /// Sets: `timer`, `slot`, `reason`.
    WriteFailed,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed or token cancelled).
    ShutdownRequested,

    /// All outstanding timers retired within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some timers did not retire in time.
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason`.
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Store slot involved, if applicable.
    pub slot: Option<Arc<str>>,
    /// Timer id, if applicable (stable for the timer's whole lifecycle).
    pub timer: Option<u64>,
    /// Timer delay in milliseconds (compact).
    pub delay_ms: Option<u64>,
    /// Payload size in bytes, if applicable.
    pub bytes: Option<usize>,
    /// Human-readable reason (decode/write failures, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            slot: None,
            timer: None,
            delay_ms: None,
            bytes: None,
            reason: None,
        }
    }

    /// Attaches a store slot name.
    #[inline]
    pub fn with_slot(mut self, slot: impl Into<Arc<str>>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    /// Attaches a timer id.
    #[inline]
    pub fn with_timer(mut self, timer: u64) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Attaches a timer delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u64::MAX)) as u64;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a payload size in bytes.
    #[inline]
    pub fn with_bytes(mut self, bytes: usize) -> Self {
        self.bytes = Some(bytes);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, detail: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={detail}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}
