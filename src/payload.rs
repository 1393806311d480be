//! # Task payload capture and decoding.
//!
//! A [`TaskPayload`] is the raw text blob exactly as received from the
//! store's read reply. It is captured once, never mutated, and consumed
//! exactly once: either by the dispatcher when its timer fires, or dropped
//! when the timer is cancelled. Move semantics enforce this — the payload
//! value travels poller → timer future → dispatcher and has no second owner.
//!
//! [`decode`] is a pure function: it extracts the requested delay from the
//! payload's `time` field and hands the *verbatim* original text back as the
//! echo. The write-back echoes the whole task description, never a
//! re-serialized subset.

use std::fmt;
use std::time::Duration;

use crate::error::DecodeError;

/// Raw task payload text, exactly as the store delivered it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskPayload(String);

impl TaskPayload {
    /// Captures a payload from a store read reply.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrows the payload text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the payload text is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the payload, yielding the raw text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful decode: the requested delay plus the verbatim
/// payload to echo back on fire.
#[derive(Debug)]
pub struct Decoded {
    /// Seconds requested by the payload's `time` field.
    pub delay: Duration,
    /// The original payload, unchanged, owned by the timer until it fires.
    pub echo: TaskPayload,
}

/// Decodes a task payload into a delay and an echo payload.
///
/// Parses the payload as JSON and reads the integer `time` field as a number
/// of seconds. The echo is the whole original payload moved through
/// unchanged, so additional fields are preserved byte for byte.
///
/// Pure and idempotent: the same payload always yields the same delay and
/// echo, and decoding has no side effects.
///
/// # Errors
/// - [`DecodeError::Parse`] — payload is not well-formed JSON.
/// - [`DecodeError::MissingTime`] — no `time` field (also the case for JSON
///   scalars and arrays, which cannot carry fields).
/// - [`DecodeError::InvalidTime`] — `time` is present but not an integer.
/// - [`DecodeError::NegativeTime`] — `time` is a negative integer.
pub fn decode(payload: TaskPayload) -> Result<Decoded, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(payload.as_str())?;

    let seconds = match value.get("time") {
        None => return Err(DecodeError::MissingTime),
        Some(t) => t.as_i64().ok_or(DecodeError::InvalidTime)?,
    };
    if seconds < 0 {
        return Err(DecodeError::NegativeTime { seconds });
    }

    Ok(Decoded {
        delay: Duration::from_secs(seconds as u64),
        echo: payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(raw: &str) -> TaskPayload {
        TaskPayload::new(raw)
    }

    #[test]
    fn test_well_formed_payload_yields_delay_and_verbatim_echo() {
        let raw = r#"{"time": 2, "id": "abc"}"#;
        let decoded = decode(payload(raw)).unwrap();
        assert_eq!(decoded.delay, Duration::from_secs(2));
        assert_eq!(decoded.echo.as_str(), raw);
    }

    #[test]
    fn test_zero_delay_is_valid() {
        let decoded = decode(payload(r#"{"time": 0}"#)).unwrap();
        assert_eq!(decoded.delay, Duration::ZERO);
    }

    #[test]
    fn test_extra_fields_and_whitespace_preserved_in_echo() {
        let raw = "{ \"time\": 1,\t\"nested\": {\"k\": [1, 2, 3]} }";
        let decoded = decode(payload(raw)).unwrap();
        assert_eq!(decoded.echo.as_str(), raw);
    }

    #[test]
    fn test_not_json_is_parse_error() {
        let err = decode(payload("not-json")).unwrap_err();
        assert!(matches!(err, DecodeError::Parse(_)));
    }

    #[test]
    fn test_missing_time_field() {
        let err = decode(payload(r#"{"id": "abc"}"#)).unwrap_err();
        assert!(matches!(err, DecodeError::MissingTime));
    }

    #[test]
    fn test_scalar_json_has_no_time_field() {
        let err = decode(payload("5")).unwrap_err();
        assert!(matches!(err, DecodeError::MissingTime));
    }

    #[test]
    fn test_non_integer_time_is_invalid() {
        let err = decode(payload(r#"{"time": "soon"}"#)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTime));

        let err = decode(payload(r#"{"time": 1.5}"#)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTime));
    }

    #[test]
    fn test_negative_time_is_rejected() {
        let err = decode(payload(r#"{"time": -3}"#)).unwrap_err();
        assert!(matches!(err, DecodeError::NegativeTime { seconds: -3 }));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let raw = r#"{"time": 7, "id": "same"}"#;
        let a = decode(payload(raw)).unwrap();
        let b = decode(payload(raw)).unwrap();
        assert_eq!(a.delay, b.delay);
        assert_eq!(a.echo, b.echo);
    }
}
