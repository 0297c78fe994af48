//! Consumer client with per-group checkpointing.
//!
//! The consumer walks the log by offset arithmetic: after processing a
//! record of `len` bytes read at `offset`, the next record starts at
//! `offset + 4 + len`. Committing acknowledges that next offset under the
//! consumer's group *before* advancing, which yields at-least-once
//! delivery: a crash between `poll` and `commit` replays the record on
//! the next run.

use crate::{ClientError, Connection, Result};
use bytes::Bytes;
use tokio::net::ToSocketAddrs;
use tracing::debug;

/// Bytes occupied by a record's length prefix on the broker's disk.
const LEN_PREFIX_SIZE: u64 = 4;

/// A consumer checkpointing under one group identifier.
pub struct Consumer {
    connection: Connection,
    group: String,
    position: u64,
    pending: Option<u64>,
}

impl Consumer {
    /// Connect a consumer for `group`, positioned at offset 0.
    ///
    /// Call [`resume`](Self::resume) to continue from the group's last
    /// committed checkpoint instead.
    pub async fn connect<A: ToSocketAddrs + std::fmt::Debug>(addr: A, group: &str) -> Result<Self> {
        Ok(Self {
            connection: Connection::connect(addr).await?,
            group: group.to_string(),
            position: 0,
            pending: None,
        })
    }

    /// Fetch the group's checkpoint from the broker and position there.
    pub async fn resume(&mut self) -> Result<u64> {
        self.position = self.connection.fetch_offset(&self.group).await?;
        self.pending = None;
        debug!(group = %self.group, position = self.position, "resuming");
        Ok(self.position)
    }

    /// Read the record at the current position.
    ///
    /// Returns `Ok(None)` when the broker reports a read failure — the end
    /// of the log, or a checkpoint pointing into a segment reclaimed by
    /// retention. Callers typically sleep briefly and poll again.
    pub async fn poll(&mut self) -> Result<Option<Bytes>> {
        match self.connection.read(self.position).await {
            Ok(payload) => {
                self.pending = Some(self.position + LEN_PREFIX_SIZE + payload.len() as u64);
                Ok(Some(payload))
            }
            Err(ClientError::Broker { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Acknowledge the record returned by the last [`poll`](Self::poll)
    /// and advance past it. A no-op if there is nothing to acknowledge.
    pub async fn commit(&mut self) -> Result<()> {
        if let Some(next) = self.pending.take() {
            self.connection.ack(&self.group, next).await?;
            self.position = next;
        }
        Ok(())
    }

    /// The offset the next [`poll`](Self::poll) will read.
    pub fn position(&self) -> u64 {
        self.position
    }
}
