//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use rpicamera_core::{AwbGains, PreviewOptions, VideoFormat};
use rpicamera_protocol::DEFAULT_BIND_ENDPOINT;

use crate::error::{ServerError, ServerResult};

/// Parameters of a preview start, remembered for gain resets.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSettings {
    /// How long auto exposure and white balance get to settle.
    pub warmup: Duration,
    /// Fixed white balance gains. `None` lets auto white balance run.
    pub awb_gains: Option<AwbGains>,
    /// Lock the gains auto white balance settled on after warm-up.
    pub fix_awb_gains: bool,
    /// Lock the shutter speed auto exposure settled on after warm-up.
    pub fix_exposure_speed: bool,
    /// Options passed through to the device.
    pub options: PreviewOptions,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(2),
            awb_gains: None,
            fix_awb_gains: true,
            fix_exposure_speed: true,
            options: PreviewOptions::default(),
        }
    }
}

/// Output file settings for recordings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSettings {
    /// Base name of the video and parameter files.
    pub filename: String,
    /// Container format.
    pub format: VideoFormat,
    /// Encoder quality (lower is better, 0 lets the encoder decide).
    pub quality: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            filename: "rpicamera_video".to_string(),
            format: VideoFormat::H264,
            quality: 25,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// ZeroMQ endpoint to bind.
    pub endpoint: String,

    /// Directory recording directories are created in.
    pub data_path: PathBuf,

    /// Recording output settings.
    pub recording: RecordingSettings,

    /// Preview settings used at startup and after gain resets.
    pub preview: PreviewSettings,

    /// Pause between stopping and restarting the preview on a gain reset.
    pub reset_settle: Duration,

    /// How often the receive loop checks for a stop request.
    pub poll_interval: Duration,

    /// How long pending replies may linger when the socket closes.
    pub linger: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_BIND_ENDPOINT.to_string(),
            data_path: default_data_path(),
            recording: RecordingSettings::default(),
            preview: PreviewSettings::default(),
            reset_settle: Duration::from_millis(100),
            poll_interval: Duration::from_millis(250),
            linger: Duration::from_secs(1),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration recording into `data_path`.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            ..Default::default()
        }
    }

    /// Builder: set the bind endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builder: set recording output settings.
    pub fn with_recording(mut self, recording: RecordingSettings) -> Self {
        self.recording = recording;
        self
    }

    /// Builder: set preview settings.
    pub fn with_preview(mut self, preview: PreviewSettings) -> Self {
        self.preview = preview;
        self
    }

    /// Builder: set the gain reset settle delay.
    pub fn with_reset_settle(mut self, settle: Duration) -> Self {
        self.reset_settle = settle;
        self
    }

    /// Builder: set the stop-check poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Checks the settings that cannot be fixed up at runtime.
    pub fn validate(&self) -> ServerResult<()> {
        if self.endpoint.is_empty() {
            return Err(ServerError::config("endpoint must not be empty"));
        }
        let filename = &self.recording.filename;
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(ServerError::config(format!(
                "invalid video file name {filename:?}"
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(ServerError::config("poll interval must not be zero"));
        }
        Ok(())
    }
}

/// Returns the default data directory.
///
/// Uses `$HOME/rpicamera` if `HOME` is set, otherwise `./rpicamera`.
pub fn default_data_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rpicamera")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.endpoint, "tcp://*:5555");
        assert!(config.data_path.ends_with("rpicamera"));
        assert_eq!(config.recording.filename, "rpicamera_video");
        assert_eq!(config.recording.quality, 25);
        assert_eq!(config.preview.warmup, Duration::from_secs(2));
        assert!(config.preview.fix_awb_gains);
        assert!(config.preview.fix_exposure_speed);
        assert_eq!(config.reset_settle, Duration::from_millis(100));
    }

    #[test]
    fn custom_config() {
        let config = ServerConfig::new("/srv/video")
            .with_endpoint("tcp://127.0.0.1:6000")
            .with_reset_settle(Duration::ZERO)
            .with_poll_interval(Duration::from_millis(10))
            .with_preview(PreviewSettings {
                warmup: Duration::ZERO,
                ..Default::default()
            });

        assert_eq!(config.data_path, PathBuf::from("/srv/video"));
        assert_eq!(config.endpoint, "tcp://127.0.0.1:6000");
        assert_eq!(config.reset_settle, Duration::ZERO);
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.preview.warmup, Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let nested = ServerConfig::new("/srv").with_recording(RecordingSettings {
            filename: "sub/video".into(),
            ..Default::default()
        });
        assert!(matches!(nested.validate(), Err(ServerError::Config { .. })));

        let no_poll = ServerConfig::new("/srv").with_poll_interval(Duration::ZERO);
        assert!(no_poll.validate().is_err());

        let no_endpoint = ServerConfig::new("/srv").with_endpoint("");
        assert!(no_endpoint.validate().is_err());
    }
}
