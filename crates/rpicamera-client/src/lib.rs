//! CLI, command sender, configuration
//!
//! This crate provides the `rpicamera` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod socket;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use socket::ZmqClient;
