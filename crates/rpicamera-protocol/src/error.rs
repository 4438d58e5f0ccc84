//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while parsing a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The request contained no tokens.
    #[error("empty request")]
    EmptyRequest,

    /// The request bytes were not UTF-8.
    #[error("request is not valid UTF-8")]
    InvalidEncoding,

    /// Wrong number of positional arguments.
    #[error("{verb} expects {expected} argument(s), got {found}")]
    Arity {
        verb: String,
        expected: usize,
        found: usize,
    },

    /// A token could not be read as the required number.
    #[error("{verb}: invalid {kind} '{token}'")]
    InvalidNumber {
        verb: String,
        kind: &'static str,
        token: String,
    },

    /// A `Start` option was not of the form `key=value`.
    #[error("{verb}: expected key=value, got '{token}'")]
    MalformedOption { verb: String, token: String },
}

impl ProtocolError {
    pub(crate) fn arity(verb: &str, expected: usize, found: usize) -> Self {
        Self::Arity {
            verb: verb.to_string(),
            expected,
            found,
        }
    }

    pub(crate) fn invalid_number(verb: &str, kind: &'static str, token: &str) -> Self {
        Self::InvalidNumber {
            verb: verb.to_string(),
            kind,
            token: token.to_string(),
        }
    }
}
