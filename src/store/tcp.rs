//! # TCP store client.
//!
//! [`TcpStore`] speaks the store's line-framed text protocol: one request
//! line out, one reply line back. Commands are serialized under a mutex so
//! exactly one request is in flight per connection — replies can never be
//! attributed to the wrong command.
//!
//! Construction is fail-fast: [`TcpStore::connect`] and
//! [`TcpStore::authenticate`] must both succeed before the relay starts;
//! either failure is fatal at the binary level.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::payload::TaskPayload;
use crate::store::Store;

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// Store client over a single TCP connection.
pub struct TcpStore {
    conn: Mutex<Connection>,
}

impl TcpStore {
    /// Connects to the store at `addr` (an `ip:port` pair).
    ///
    /// # Errors
    /// [`StoreError::Connect`] if the TCP connect fails.
    pub async fn connect(addr: &str) -> Result<Self, StoreError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| StoreError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            conn: Mutex::new(Connection {
                reader: BufReader::new(read_half),
                writer: write_half,
            }),
        })
    }

    /// Sends `Auth <password>` and validates the reply.
    ///
    /// Any reply not beginning with `OK` is [`StoreError::AuthRejected`].
    /// Returns the verbatim reply line on success.
    pub async fn authenticate(&self, password: &str) -> Result<String, StoreError> {
        let reply = self.command(&format!("Auth {password}")).await?;
        if reply.starts_with("OK") {
            Ok(reply)
        } else {
            Err(StoreError::AuthRejected { reply })
        }
    }

    /// Sends one request line and reads one reply line.
    async fn command(&self, line: &str) -> Result<String, StoreError> {
        let mut conn = self.conn.lock().await;

        conn.writer.write_all(line.as_bytes()).await?;
        conn.writer.write_all(b"\n").await?;

        let mut reply = String::new();
        let n = conn.reader.read_line(&mut reply).await?;
        if n == 0 {
            return Err(StoreError::ConnectionClosed);
        }
        while reply.ends_with('\n') || reply.ends_with('\r') {
            reply.pop();
        }
        Ok(reply)
    }
}

#[async_trait]
impl Store for TcpStore {
    async fn read_task(&self, slot: &str) -> Result<Option<TaskPayload>, StoreError> {
        let reply = self.command(&format!("read_task {slot}")).await?;
        if reply.is_empty() {
            Ok(None)
        } else {
            Ok(Some(TaskPayload::new(reply)))
        }
    }

    async fn write_task(&self, slot: &str, payload: &TaskPayload) -> Result<(), StoreError> {
        // The acknowledgement line is consumed to keep the request/reply
        // framing aligned; its content is ignored.
        self.command(&format!("write_task {slot} {payload}")).await?;
        Ok(())
    }
}
