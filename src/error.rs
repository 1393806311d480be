//! Error types used by the relay runtime and the store client.
//!
//! This module defines three error enums:
//!
//! - [`RelayError`] — errors that terminate the relay runtime itself.
//! - [`StoreError`] — errors raised by the store connection; every variant is
//!   fatal to the relay, since the process has no useful work without a live,
//!   authenticated store.
//! - [`DecodeError`] — per-payload decode failures; these never cross the
//!   cycle that produced them and only abandon that one payload.
//!
//! All types provide `as_label` for stable snake_case identifiers in
//! logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors that terminate the relay runtime.
///
/// Only these errors cross the runtime boundary: the binary maps any of them
/// to a non-zero exit status after the cancellation sweep has run.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RelayError {
    /// The store connection failed or was rejected; no recovery is attempted.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The poll loop terminated abnormally (panicked) instead of returning.
    #[error("poll loop terminated abnormally")]
    PollerPanicked,

    /// Shutdown grace period was exceeded; some timers did not retire in time.
    #[error("shutdown grace {grace:?} exceeded; {pending} timers still pending")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of timers that were still in flight when shutdown began.
        pending: usize,
    },
}

impl RelayError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RelayError::Store(e) => e.as_label(),
            RelayError::PollerPanicked => "relay_poller_panicked",
            RelayError::GraceExceeded { .. } => "relay_grace_exceeded",
        }
    }
}

/// # Errors raised by the store connection.
///
/// The relay treats every store error as fatal: connection and authentication
/// failures abort startup, and an I/O failure mid-run stops the poll loop.
/// A failed write-back surfaces as one of these variants too, but the
/// dispatcher downgrades it to an event and drops it.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// TCP connect to the store failed.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        /// The `ip:port` pair the connect was issued against.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// The store's reply to `Auth` did not begin with `OK`.
    #[error("store rejected authentication: {reply:?}")]
    AuthRejected {
        /// The verbatim reply line.
        reply: String,
    },

    /// The store closed the connection while a reply was expected.
    #[error("store connection closed")]
    ConnectionClosed,

    /// Any other socket-level failure on an established connection.
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Connect { .. } => "store_connect_failed",
            StoreError::AuthRejected { .. } => "store_auth_rejected",
            StoreError::ConnectionClosed => "store_connection_closed",
            StoreError::Io(_) => "store_io_failed",
        }
    }
}

/// # Per-payload decode failures.
///
/// Produced by [`decode`](crate::decode). All variants are transient: the
/// payload is dropped, a `DecodeFailed` event is published, and polling
/// continues unaffected.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The payload is not well-formed JSON.
    #[error("payload is not valid json: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload carries no `time` field.
    #[error("payload has no \"time\" field")]
    MissingTime,

    /// The `time` field is present but not an integer.
    #[error("\"time\" field is not an integer")]
    InvalidTime,

    /// The `time` field is an integer but negative. Rejected rather than
    /// clamped: a negative delay has no meaningful schedule.
    #[error("\"time\" field is negative ({seconds})")]
    NegativeTime {
        /// The rejected value.
        seconds: i64,
    },
}

impl DecodeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskrelay::DecodeError;
    ///
    /// assert_eq!(DecodeError::MissingTime.as_label(), "decode_missing_time");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::Parse(_) => "decode_parse_failed",
            DecodeError::MissingTime => "decode_missing_time",
            DecodeError::InvalidTime => "decode_invalid_time",
            DecodeError::NegativeTime { .. } => "decode_negative_time",
        }
    }
}
