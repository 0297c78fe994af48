//! Error types for the silomq client library

/// Main error type for silomq client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection-related errors
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Unexpected or unparsable reply from the broker
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// An `ERR` reply from the broker
    #[error("Broker error: {message}")]
    Broker { message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a new broker error
    pub fn broker<S: Into<String>>(message: S) -> Self {
        Self::Broker {
            message: message.into(),
        }
    }
}
