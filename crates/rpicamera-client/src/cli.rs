//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rpicamera_core::TracingOutputFormat;

use crate::config::DeviceKind;

/// rpicamera - Remote-controlled camera recording
#[derive(Debug, Parser)]
#[command(name = "rpicamera")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "RPICAMERA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<TracingOutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the camera command server in the foreground
    Serve(ServeArgs),

    /// Send one command to a running server and print the reply
    Send(SendArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options of `rpicamera serve`. Unset options fall back to the config file.
#[derive(Debug, Default, clap::Args)]
pub struct ServeArgs {
    /// Endpoint to bind, e.g. tcp://*:5555
    #[arg(long, env = "RPICAMERA_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Directory recordings are written to
    #[arg(long, env = "RPICAMERA_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Camera backend
    #[arg(long, value_enum)]
    pub device: Option<DeviceKind>,

    /// Do not start the preview at startup
    #[arg(long)]
    pub no_preview: bool,
}

/// Options of `rpicamera send`.
#[derive(Debug, clap::Args)]
pub struct SendArgs {
    /// Endpoint to connect to, e.g. tcp://raspberrypi:5555
    #[arg(long, env = "RPICAMERA_CONNECT")]
    pub endpoint: Option<String>,

    /// Reply timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Command words, e.g. `Start Experiment=1 Recording=2`
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Show configuration file path
    Path,
}
