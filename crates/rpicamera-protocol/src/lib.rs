//! Text command protocol for the rpicamera control socket.
//!
//! The acquisition software talks to the camera over a ZeroMQ REQ/REP pair.
//! Each request is one line of text and each request gets exactly one text
//! reply:
//!
//! ```text
//! Start Experiment=1 Recording=2 Path=/data/2024-01-01_12-00-00
//! Resolution 640 480
//! SetGains 1.5 1.2
//! ```
//!
//! # Example
//!
//! ```rust
//! use rpicamera_protocol::{Command, Reply};
//!
//! let cmd: Command = "Framerate 30".parse().unwrap();
//! assert_eq!(cmd, Command::Framerate(30.0));
//! assert_eq!(Reply::Done.to_string(), "Done");
//! ```

mod command;
mod error;
mod reply;

pub use command::{Command, DEFAULT_EXPERIMENT, DEFAULT_RECORDING, StartArgs};
pub use error::{ProtocolError, ProtocolResult};
pub use reply::Reply;

/// Endpoint the server binds by default.
pub const DEFAULT_BIND_ENDPOINT: &str = "tcp://*:5555";

/// Endpoint clients connect to by default.
pub const DEFAULT_CONNECT_ENDPOINT: &str = "tcp://localhost:5555";
