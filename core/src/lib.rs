//! # silomq Core Library
//!
//! silomq is a single-node, append-only message broker with durable segment
//! storage. Producers append opaque payloads to a topic and receive a byte
//! offset; consumers poll by offset, acknowledge progress under a consumer
//! group, and resume from their last checkpoint after a restart.
//!
//! ## Architecture Overview
//!
//! - [`broker`] - TCP server and request handling
//! - [`storage`] - segmented write-ahead log, retention, and consumer-group
//!   offset checkpoints
//! - [`protocol`] - the line-oriented wire protocol (`PUB`, `READ`, `ACK`,
//!   `OFFSET`)
//! - [`config`] - JSON configuration loading
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use silomq::{BrokerConfig, BrokerServer};
//!
//! #[tokio::main]
//! async fn main() -> silomq::Result<()> {
//!     let config = BrokerConfig::default();
//!     let server = BrokerServer::new(config)?;
//!     server.run().await
//! }
//! ```
//!
//! ## Delivery semantics
//!
//! Appends are totally ordered and synced to disk before `PUB` is
//! acknowledged. Consumers that `ACK` only after processing get
//! at-least-once delivery: a crash between `READ` and `ACK` replays the
//! record on the next run.

pub mod broker;
pub mod config;
pub mod protocol;
pub mod storage;

pub use broker::{BrokerServer, MessageHandler};
pub use config::{BrokerConfig, ServerConfig, StorageConfig};
pub use protocol::{Command, CommandError, Reply};
pub use storage::{OffsetManager, Wal, WalConfig};

use thiserror::Error;

/// silomq error types
///
/// Covers every failure the broker surfaces: filesystem and socket errors,
/// configuration problems, unreadable offsets, and protocol violations.
#[derive(Debug, Error)]
pub enum SilomqError {
    /// Storage subsystem errors including file I/O and sync failures
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// JSON parsing and serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration validation and parsing errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No segment covers the requested offset (before the first segment,
    /// or the containing segment was reclaimed by retention)
    #[error("Offset {0} not found in any segment")]
    OffsetNotFound(u64),

    /// The segment ended before a full record could be read
    #[error("Record at offset {0} is truncated")]
    Truncated(u64),

    /// Malformed command line on the wire
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),
}

/// Result type alias for silomq operations
pub type Result<T> = std::result::Result<T, SilomqError>;
