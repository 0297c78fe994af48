//! TCP server and request handling.

pub mod handler;
pub mod server;

pub use handler::MessageHandler;
pub use server::BrokerServer;
