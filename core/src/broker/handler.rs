//! Dispatches parsed commands to the storage engines.
//!
//! Engine errors never cross to the client raw: write-path failures become
//! `ERR: Disk write failed`, read-path failures (unknown offset, truncated
//! record, I/O) become `ERR: Disk read failed`. Details go to the log.

use crate::protocol::Reply;
use crate::storage::{OffsetManager, Wal};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct MessageHandler {
    wal: Arc<Wal>,
    offsets: Arc<OffsetManager>,
}

impl MessageHandler {
    pub fn new(wal: Arc<Wal>, offsets: Arc<OffsetManager>) -> Self {
        Self { wal, offsets }
    }

    /// Append a payload; replies `OK <offset>` once it is synced.
    pub fn handle_publish(&self, payload: &[u8]) -> Reply {
        match self.wal.append(payload) {
            Ok(offset) => {
                debug!(offset, len = payload.len(), "stored record");
                Reply::Stored(offset)
            }
            Err(e) => {
                warn!("append failed: {}", e);
                Reply::Error("Disk write failed".to_string())
            }
        }
    }

    /// Read the record at `offset`; replies `MSG <payload>`.
    pub fn handle_read(&self, offset: u64) -> Reply {
        match self.wal.read(offset) {
            Ok(payload) => Reply::Record(payload),
            Err(e) => {
                debug!(offset, "read failed: {}", e);
                Reply::Error("Disk read failed".to_string())
            }
        }
    }

    /// Checkpoint `group` at `offset`; replies `OK`.
    pub fn handle_ack(&self, group: &str, offset: u64) -> Reply {
        match self.offsets.save_offset(group, offset) {
            Ok(()) => Reply::Acked,
            Err(e) => {
                warn!(group, offset, "checkpoint failed: {}", e);
                Reply::Error("Disk write failed".to_string())
            }
        }
    }

    /// Fetch the checkpoint of `group`; replies the bare offset.
    pub fn handle_offset(&self, group: &str) -> Reply {
        Reply::Committed(self.offsets.get_offset(group))
    }
}
