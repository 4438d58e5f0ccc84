//! Client error types.

use std::fmt;

use rpicamera_server::ServerError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// IO error.
    Io(std::io::Error),
    /// Connection to server failed.
    Connection(String),
    /// Request timed out.
    Timeout(String),
    /// The server answered with an error reply.
    Rejected(String),
    /// The command server failed.
    Server(ServerError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Connection(msg) => write!(f, "connection error: {}", msg),
            Self::Timeout(msg) => write!(f, "timeout: {}", msg),
            Self::Rejected(msg) => write!(f, "server rejected command: {}", msg),
            Self::Server(err) => write!(f, "server error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Server(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ServerError> for ClientError {
    fn from(err: ServerError) -> Self {
        Self::Server(err)
    }
}

impl From<zmq::Error> for ClientError {
    fn from(err: zmq::Error) -> Self {
        Self::Connection(err.to_string())
    }
}
