//! rpicamera CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use rpicamera_client::cli::{Cli, Command, ConfigAction};
use rpicamera_client::commands;
use rpicamera_client::config::ClientConfig;
use rpicamera_client::error::{ClientError, ClientResult};
use rpicamera_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path).map_err(ClientError::Config)?,
        None => ClientConfig::load().map_err(ClientError::Config)?,
    };

    let mut tracing_config = match cli.command {
        Command::Serve(_) => TracingConfig::serve(),
        _ => TracingConfig::command(),
    };
    if cli.debug || config.debug {
        tracing_config = tracing_config.debug();
    }
    if let Some(format) = cli.log_format.or(config.log_format) {
        tracing_config = tracing_config.with_format(format);
    }
    init_tracing(tracing_config).map_err(|e| ClientError::Config(e.to_string()))?;

    match cli.command {
        Command::Serve(ref args) => commands::serve::run(args, &config).await,
        Command::Send(ref args) => commands::send::run(args, &config).await,
        Command::Config { ref action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, cli.config.as_deref()),
            ConfigAction::Path => commands::config::path(cli.config.as_deref()),
        },
    }
}
