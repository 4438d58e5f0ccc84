//! Reply texts.

use std::fmt;
use std::path::PathBuf;

use rpicamera_core::AwbGains;

/// Prefix of every error reply.
const ERROR_PREFIX: &str = "Error: ";

/// A reply to exactly one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Recording directory, or `None` if recording did not start.
    Started(Option<PathBuf>),
    Stopped,
    Closing,
    Done,
    /// Sent before the gain reset runs; the client has to wait.
    GainsReset,
    Gains(AwbGains),
    NotHandled,
    Error(String),
}

impl Reply {
    /// Creates an error reply.
    pub fn error(message: impl fmt::Display) -> Self {
        Self::Error(message.to_string())
    }

    /// Error reply for requests that need the camera when there is none.
    pub fn unavailable() -> Self {
        Self::error("device unavailable")
    }

    /// Returns the message of an error reply received as text.
    pub fn error_message(text: &str) -> Option<&str> {
        text.strip_prefix(ERROR_PREFIX)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started(Some(path)) => write!(f, "{}", path.display()),
            Self::Started(None) => Ok(()),
            Self::Stopped => f.write_str("Stopped"),
            Self::Closing => f.write_str("Closing"),
            Self::Done => f.write_str("Done"),
            Self::GainsReset => f.write_str("Done (but wait at least 2 seconds)"),
            Self::Gains(gains) => write!(f, "{gains}"),
            Self::NotHandled => f.write_str("Not handled"),
            Self::Error(message) => write!(f, "{ERROR_PREFIX}{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn fixed_replies() {
        assert_snapshot!(Reply::Stopped, @"Stopped");
        assert_snapshot!(Reply::Closing, @"Closing");
        assert_snapshot!(Reply::Done, @"Done");
        assert_snapshot!(Reply::GainsReset, @"Done (but wait at least 2 seconds)");
        assert_snapshot!(Reply::NotHandled, @"Not handled");
    }

    #[test]
    fn started_reply_is_path_or_empty() {
        let started = Reply::Started(Some(PathBuf::from("/rec/x_experiment_1_recording_2")));
        assert_snapshot!(started, @"/rec/x_experiment_1_recording_2");
        assert_eq!(Reply::Started(None).to_string(), "");
    }

    #[test]
    fn gains_reply_has_six_decimals() {
        assert_snapshot!(Reply::Gains(AwbGains::new(1.0, 2.123_456_789)), @"1.000000 2.123457");
    }

    #[test]
    fn error_replies_are_prefixed() {
        let reply = Reply::error("Zoom expects 4 argument(s), got 3");
        assert_snapshot!(reply, @"Error: Zoom expects 4 argument(s), got 3");
        assert_eq!(
            Reply::error_message(&reply.to_string()),
            Some("Zoom expects 4 argument(s), got 3")
        );
        assert_eq!(Reply::error_message(&Reply::Stopped.to_string()), None);
        assert_snapshot!(Reply::unavailable(), @"Error: device unavailable");
    }
}
