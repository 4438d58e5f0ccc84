//! Server error types.

use std::io;
use thiserror::Error;

use rpicamera_core::DeviceError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (recording directory, parameter file).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// ZeroMQ socket error.
    #[error("ZMQ error: {0}")]
    Zmq(#[from] zmq::Error),

    /// Endpoint could not be bound.
    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: zmq::Error,
    },

    /// Camera error.
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Parameter file could not be serialized.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a bind error.
    pub fn bind(endpoint: impl Into<String>, source: zmq::Error) -> Self {
        Self::Bind {
            endpoint: endpoint.into(),
            source,
        }
    }
}
