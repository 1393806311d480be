//! # Simple logging subscriber.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [connected]
//! [received] slot=XXXX bytes=24
//! [decode-failed] slot=XXXX err="payload has no \"time\" field"
//! [armed] timer=4294967297 delay=2s
//! [fired] timer=4294967297
//! [write] slot=XXXX timer=4294967297
//! [write-failed] slot=XXXX timer=4294967297 err="store i/o failed: ..."
//! [cancelled] timer=4294967297
//! [shutdown-requested]
//! [all-stopped-within-grace]
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Covers the same ground as a structured logger for a process this small;
/// implement a custom [`Subscribe`] for metrics collection or shipping
/// events elsewhere.
#[derive(Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::StoreConnected => {
                println!("[connected]");
            }
            EventKind::TaskReceived => {
                if let (Some(slot), Some(bytes)) = (&e.slot, e.bytes) {
                    println!("[received] slot={slot} bytes={bytes}");
                }
            }
            EventKind::DecodeFailed => {
                println!("[decode-failed] slot={:?} err={:?}", e.slot, e.reason);
            }
            EventKind::TimerArmed => {
                let delay = e.delay_ms.map(Duration::from_millis);
                println!("[armed] timer={:?} delay={:?}", e.timer, delay);
            }
            EventKind::TimerFired => {
                println!("[fired] timer={:?}", e.timer);
            }
            EventKind::TimerCancelled => match &e.reason {
                Some(reason) => println!("[cancelled] timer={:?} err={reason:?}", e.timer),
                None => println!("[cancelled] timer={:?}", e.timer),
            },
            EventKind::WriteIssued => {
                println!("[write] slot={:?} timer={:?}", e.slot, e.timer);
            }
            EventKind::WriteFailed => {
                println!(
                    "[write-failed] slot={:?} timer={:?} err={:?}",
                    e.slot, e.timer, e.reason
                );
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                println!("[subscriber] {:?}", e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
