//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/rpicamera/config.toml` by default. Every section is optional;
//! command-line flags override file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use rpicamera_core::{
    AwbGains, PreviewOptions, Resolution, SimulatedConfig, TracingOutputFormat, TriggerConfig,
    VideoFormat,
};
use rpicamera_protocol::{DEFAULT_BIND_ENDPOINT, DEFAULT_CONNECT_ENDPOINT};
use rpicamera_server::{PreviewSettings, RecordingSettings, ServerConfig, default_data_path};

/// Configuration for the rpicamera binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Log output format.
    pub log_format: Option<TracingOutputFormat>,

    /// Server/connection settings.
    pub server: ServerSettings,

    /// Camera settings.
    pub camera: CameraSettings,

    /// Startup preview settings.
    pub preview: PreviewSection,

    /// External trigger settings.
    pub trigger: TriggerSection,
}

/// Server/connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Endpoint `serve` binds.
    pub endpoint: String,

    /// Endpoint `send` connects to.
    pub connect: String,

    /// Directory recordings are written to.
    pub data_path: Option<PathBuf>,

    /// Reply timeout for `send`, in seconds.
    pub timeout: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_BIND_ENDPOINT.to_string(),
            connect: DEFAULT_CONNECT_ENDPOINT.to_string(),
            data_path: None,
            timeout: 5,
        }
    }
}

/// Camera backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// In-memory camera.
    #[default]
    Simulated,
    /// No camera; the server answers but changes nothing.
    None,
}

/// Camera settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub device: DeviceKind,
    pub resolution: Resolution,
    pub framerate: f64,
    pub vflip: bool,
    pub hflip: bool,
    /// Base name of the video and parameter files.
    pub filename: String,
    pub format: VideoFormat,
    /// Encoder quality (lower is better).
    pub quality: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        let recording = RecordingSettings::default();
        Self {
            device: DeviceKind::default(),
            resolution: Resolution::default(),
            framerate: 30.0,
            vflip: false,
            hflip: false,
            filename: recording.filename,
            format: recording.format,
            quality: recording.quality,
        }
    }
}

impl CameraSettings {
    /// Settings for the simulated backend.
    pub fn simulated(&self) -> SimulatedConfig {
        SimulatedConfig {
            resolution: self.resolution,
            framerate: self.framerate,
            vflip: self.vflip,
            hflip: self.hflip,
            ..Default::default()
        }
    }

    /// Recording output settings.
    pub fn recording(&self) -> RecordingSettings {
        RecordingSettings {
            filename: self.filename.clone(),
            format: self.format,
            quality: self.quality,
        }
    }
}

/// Startup preview settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSection {
    /// Start the preview when the server starts.
    pub enabled: bool,
    /// Warm-up time in seconds.
    pub warmup: f64,
    /// Fixed white balance gains as `[red, blue]`.
    pub awb_gains: Option<AwbGains>,
    pub fix_awb_gains: bool,
    pub fix_exposure_speed: bool,
    pub fullscreen: bool,
    pub alpha: Option<u8>,
}

impl Default for PreviewSection {
    fn default() -> Self {
        let preview = PreviewSettings::default();
        Self {
            enabled: true,
            warmup: preview.warmup.as_secs_f64(),
            awb_gains: preview.awb_gains,
            fix_awb_gains: preview.fix_awb_gains,
            fix_exposure_speed: preview.fix_exposure_speed,
            fullscreen: preview.options.fullscreen,
            alpha: preview.options.alpha,
        }
    }
}

impl PreviewSection {
    /// Converts to server preview settings.
    pub fn to_settings(&self) -> Result<PreviewSettings, String> {
        let warmup = Duration::try_from_secs_f64(self.warmup)
            .map_err(|e| format!("invalid preview warmup {}: {}", self.warmup, e))?;
        Ok(PreviewSettings {
            warmup,
            awb_gains: self.awb_gains,
            fix_awb_gains: self.fix_awb_gains,
            fix_exposure_speed: self.fix_exposure_speed,
            options: PreviewOptions {
                fullscreen: self.fullscreen,
                alpha: self.alpha,
            },
        })
    }
}

/// External trigger settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSection {
    /// Wrap the camera with a GPIO trigger.
    pub enabled: bool,
    #[serde(flatten)]
    pub config: TriggerConfig,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rpicamera")
    }

    /// Builds the server configuration from the file settings.
    pub fn server_config(&self) -> Result<ServerConfig, String> {
        let data_path = self
            .server
            .data_path
            .clone()
            .unwrap_or_else(default_data_path);
        Ok(ServerConfig::new(data_path)
            .with_endpoint(&self.server.endpoint)
            .with_recording(self.camera.recording())
            .with_preview(self.preview.to_settings()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpicamera_core::SyncMode;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.endpoint, "tcp://*:5555");
        assert_eq!(config.server.connect, "tcp://localhost:5555");
        assert_eq!(config.camera.device, DeviceKind::Simulated);
        assert_eq!(config.camera.quality, 25);
        assert!(config.preview.enabled);
        assert!(!config.trigger.enabled);
    }

    #[test]
    fn full_file() {
        let toml_content = r#"
debug = true
log_format = "json"

[server]
endpoint = "tcp://*:6000"
data_path = "/srv/video"

[camera]
device = "none"
resolution = { width = 1280, height = 720 }
framerate = 25.0
filename = "cam0"

[preview]
warmup = 0.5
awb_gains = [1.5, 2.0]

[trigger]
enabled = true
pin = 7
sync_mode = "reset_frames"
wait_for_trigger = true
trigger_timeout = 3.0
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert!(config.debug);
        assert_eq!(config.log_format, Some(TracingOutputFormat::Json));
        assert_eq!(config.camera.device, DeviceKind::None);
        assert_eq!(config.camera.resolution, Resolution::new(1280, 720));
        assert_eq!(config.trigger.config.pin, 7);
        assert_eq!(config.trigger.config.settings.sync_mode, SyncMode::ResetFrames);
        assert!(config.trigger.config.settings.wait_for_trigger);

        let server = config.server_config().unwrap();
        assert_eq!(server.endpoint, "tcp://*:6000");
        assert_eq!(server.data_path, PathBuf::from("/srv/video"));
        assert_eq!(server.recording.filename, "cam0");
        assert_eq!(server.preview.warmup, Duration::from_millis(500));
        assert_eq!(server.preview.awb_gains, Some(AwbGains::new(1.5, 2.0)));
    }

    #[test]
    fn negative_warmup_is_rejected() {
        let config: ClientConfig = toml::from_str("[preview]\nwarmup = -1.0\n").unwrap();
        assert!(config.server_config().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\ntimeout = 9\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.server.timeout, 9);

        std::fs::write(&path, "[server\n").unwrap();
        assert!(ClientConfig::load_from(&path).is_err());
    }

    #[test]
    fn dump_round_trips() {
        let config = ClientConfig::default();
        let dumped = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&dumped).unwrap();
        assert_eq!(parsed.server.endpoint, config.server.endpoint);
        assert_eq!(parsed.preview.warmup, 2.0);
    }

    #[test]
    fn default_path_is_under_rpicamera() {
        assert!(ClientConfig::default_path().ends_with("rpicamera/config.toml"));
    }
}
