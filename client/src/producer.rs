//! Producer client for appending payloads to a topic.

use crate::{Connection, Result};
use tokio::net::ToSocketAddrs;
use tracing::debug;

/// A producer bound to one topic.
pub struct Producer {
    connection: Connection,
    topic: String,
}

impl Producer {
    /// Connect a producer for `topic`.
    pub async fn connect<A: ToSocketAddrs + std::fmt::Debug>(addr: A, topic: &str) -> Result<Self> {
        Ok(Self {
            connection: Connection::connect(addr).await?,
            topic: topic.to_string(),
        })
    }

    /// Append a payload; returns the global offset of its record.
    ///
    /// The broker syncs the record to disk before replying, so a returned
    /// offset is durable.
    pub async fn send(&mut self, payload: &[u8]) -> Result<u64> {
        let offset = self.connection.publish(&self.topic, payload).await?;
        debug!(offset, len = payload.len(), "published");
        Ok(offset)
    }
}
