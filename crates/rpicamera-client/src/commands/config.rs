//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, source: Option<&Path>) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    let default_path = ClientConfig::default_path();
    println!("# config.toml ({})", source.unwrap_or(default_path.as_path()).display());
    println!("{}", toml_str);
    Ok(())
}

/// Show the configuration file path.
pub fn path(source: Option<&Path>) -> ClientResult<()> {
    match source {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: {}", ClientConfig::default_path().display()),
    }
    Ok(())
}
