//! # Storage Module
//!
//! The storage layer for silomq: a segmented, append-only write-ahead log
//! plus per-consumer-group offset checkpoints.
//!
//! ## Layout
//!
//! One topic directory holds the log as a series of segment files named by
//! the global offset of their first byte (`0.log`, `1024.log`, ...). A
//! record on disk is a 4-byte little-endian length followed by the payload;
//! records never span segments. The `offsets.json` sidecar at the data-dir
//! root maps consumer group names to committed offsets.
//!
//! ## Modules
//!
//! - [`segment`] - segment file enumeration and offset lookup
//! - [`wal`] - the append/read/rotate/retention engine
//! - [`offsets`] - consumer-group offset checkpoints

pub mod offsets;
pub mod segment;
pub mod wal;

pub use offsets::OffsetManager;
pub use segment::SegmentFile;
pub use wal::{Wal, WalConfig};
