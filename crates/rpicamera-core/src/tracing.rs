//! Log output for the camera daemon and the one-shot CLI commands.
//!
//! `rpicamera serve` runs unattended, so it logs at `info` with timestamps
//! and closes every request span with its duration. `send` and `config`
//! only print warnings unless `--debug` is given.
//!
//! ```ignore
//! use rpicamera_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::serve().debug())?;
//! ```
//!
//! `RUST_LOG` overrides the level chosen here.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Filter target shared by every rpicamera crate.
const LOG_TARGET: &str = "rpicamera";

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracingOutputFormat {
    /// Multi-line, for a terminal
    Pretty,
    /// Single line per event
    Compact,
    /// One JSON object per event, for journald or a log shipper
    Json,
}

impl FromStr for TracingOutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format: {other} (expected pretty, compact or json)"
            )),
        }
    }
}

/// How log output is set up for one run of the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level for rpicamera targets when `RUST_LOG` is unset
    pub level: Level,
    pub format: TracingOutputFormat,
    /// Prefix events with the wall clock time
    pub timestamps: bool,
    /// Show the module path, file and line of each event
    pub location: bool,
    /// Emit an event when a request span closes, with its busy time
    pub span_close: bool,
}

impl TracingConfig {
    /// Settings for the long-running command server.
    #[must_use]
    pub fn serve() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::Compact,
            timestamps: true,
            location: false,
            span_close: true,
        }
    }

    /// Settings for `send` and `config`: warnings only, no timestamps.
    #[must_use]
    pub fn command() -> Self {
        Self {
            level: Level::WARN,
            format: TracingOutputFormat::Compact,
            timestamps: false,
            location: false,
            span_close: false,
        }
    }

    /// Raises the level to `debug` and shows event locations.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.level = Level::DEBUG;
        self.location = true;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn default_directive(&self) -> String {
        format!("{LOG_TARGET}={}", self.level.to_string().to_ascii_lowercase())
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_close {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_target(self.location)
            .with_file(self.location)
            .with_line_number(self.location)
            .with_span_events(span_events);

        match (self.format, self.timestamps) {
            (TracingOutputFormat::Pretty, true) => layer.pretty().boxed(),
            (TracingOutputFormat::Pretty, false) => layer.pretty().without_time().boxed(),
            (TracingOutputFormat::Compact, true) => layer.compact().boxed(),
            (TracingOutputFormat::Compact, false) => layer.compact().without_time().boxed(),
            (TracingOutputFormat::Json, true) => layer.json().boxed(),
            (TracingOutputFormat::Json, false) => layer.json().without_time().boxed(),
        }
    }
}

/// Installs the global subscriber. Call once, before anything logs.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let subscriber = tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter());
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_logs_info_with_timestamps_and_request_durations() {
        let config = TracingConfig::serve();
        assert_eq!(config.level, Level::INFO);
        assert!(config.timestamps);
        assert!(config.span_close);
        assert_eq!(config.default_directive(), "rpicamera=info");
    }

    #[test]
    fn command_logs_warnings_only() {
        let config = TracingConfig::command();
        assert_eq!(config.default_directive(), "rpicamera=warn");
        assert!(!config.timestamps);
        assert!(!config.span_close);
    }

    #[test]
    fn debug_keeps_mode_and_adds_location() {
        let config = TracingConfig::serve().debug();
        assert_eq!(config.default_directive(), "rpicamera=debug");
        assert!(config.location);
        assert!(config.timestamps);
        assert!(config.span_close);
    }

    #[test]
    fn format_override() {
        let config = TracingConfig::command().with_format(TracingOutputFormat::Json);
        assert_eq!(config.format, TracingOutputFormat::Json);
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("JSON".parse(), Ok(TracingOutputFormat::Json));
        assert_eq!("compact".parse(), Ok(TracingOutputFormat::Compact));
        assert!("xml".parse::<TracingOutputFormat>().is_err());
    }
}
