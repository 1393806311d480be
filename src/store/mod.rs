//! Store client: the asynchronous command seam the relay core consumes.
//!
//! The core never talks to a socket directly. It issues reads and writes
//! through the [`Store`] trait and treats any error as fatal; the concrete
//! [`TcpStore`] speaks the line-framed text protocol over TCP.
//!
//! ## Wire commands
//! ```text
//! Auth <password>              -> reply must begin with "OK"
//! read_task <slot>             -> payload line, or an empty line if no task
//! write_task <slot> <payload>  -> acknowledgement line
//! ```

mod tcp;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::payload::TaskPayload;

pub use tcp::TcpStore;

/// Asynchronous command interface against the remote key-value store.
///
/// One request is in flight at a time per connection; a non-responding store
/// stalls only the command's future, never the runtime. No timeout is
/// imposed here.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Reads the pending task payload from `slot`.
    ///
    /// Returns `Ok(None)` when the slot is empty. Errors indicate a lost or
    /// broken connection and are fatal to the relay.
    async fn read_task(&self, slot: &str) -> Result<Option<TaskPayload>, StoreError>;

    /// Writes `payload` to `slot`.
    ///
    /// The relay's dispatcher calls this fire-and-forget: an error is
    /// reported as an event and otherwise dropped.
    async fn write_task(&self, slot: &str, payload: &TaskPayload) -> Result<(), StoreError>;
}
