//! # silomq Client Library
//!
//! An async Rust client for the silomq message broker's line protocol.
//!
//! ## Producer Example
//!
//! ```rust,no_run
//! use silomq_client::Producer;
//!
//! #[tokio::main]
//! async fn main() -> silomq_client::Result<()> {
//!     let mut producer = Producer::connect("127.0.0.1:9000", "orders").await?;
//!     let offset = producer.send(b"hello").await?;
//!     println!("stored at offset {}", offset);
//!     Ok(())
//! }
//! ```
//!
//! ## Consumer Example
//!
//! ```rust,no_run
//! use silomq_client::Consumer;
//!
//! #[tokio::main]
//! async fn main() -> silomq_client::Result<()> {
//!     let mut consumer = Consumer::connect("127.0.0.1:9000", "worker1").await?;
//!     consumer.resume().await?;
//!     while let Some(payload) = consumer.poll().await? {
//!         println!("processed: {}", String::from_utf8_lossy(&payload));
//!         consumer.commit().await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod consumer;
pub mod error;
pub mod producer;

pub use connection::Connection;
pub use consumer::Consumer;
pub use error::ClientError;
pub use producer::Producer;

/// Client library result type
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
