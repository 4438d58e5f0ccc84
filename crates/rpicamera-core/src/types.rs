//! Camera setting value types.
//!
//! These mirror the state a [`Device`](crate::Device) exposes. They carry
//! no validation of their own; range policy lives in the controller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sensor output resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a new resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Automatic white balance mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwbMode {
    /// Gains are chosen by the camera.
    #[default]
    Auto,
    /// Gains are fixed to the values last set.
    Off,
}

/// Exposure mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureMode {
    /// Shutter speed is chosen by the camera.
    #[default]
    Auto,
    /// Shutter speed is fixed.
    Off,
}

/// White balance gains as a (red, blue) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct AwbGains {
    /// Red channel gain.
    pub red: f64,
    /// Blue channel gain.
    pub blue: f64,
}

impl AwbGains {
    /// Creates a new gains pair.
    pub const fn new(red: f64, blue: f64) -> Self {
        Self { red, blue }
    }
}

impl Default for AwbGains {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl From<[f64; 2]> for AwbGains {
    fn from([red, blue]: [f64; 2]) -> Self {
        Self { red, blue }
    }
}

impl From<AwbGains> for [f64; 2] {
    fn from(gains: AwbGains) -> Self {
        [gains.red, gains.blue]
    }
}

impl fmt::Display for AwbGains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} {:.6}", self.red, self.blue)
    }
}

/// Zoom (region of interest) rectangle in normalized sensor coordinates.
///
/// No ordering between the two corners is implied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct ZoomRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl ZoomRect {
    /// The full sensor area.
    pub const FULL: Self = Self {
        x0: 0.0,
        y0: 0.0,
        x1: 1.0,
        y1: 1.0,
    };

    /// Builds a rectangle from a coordinate slice.
    ///
    /// Returns `None` unless exactly four values are given.
    pub fn from_slice(coords: &[f64]) -> Option<Self> {
        match *coords {
            [x0, y0, x1, y1] => Some(Self { x0, y0, x1, y1 }),
            _ => None,
        }
    }

    /// Returns true if every coordinate lies in `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        <[f64; 4]>::from(*self)
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }
}

impl Default for ZoomRect {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<[f64; 4]> for ZoomRect {
    fn from([x0, y0, x1, y1]: [f64; 4]) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

impl From<ZoomRect> for [f64; 4] {
    fn from(z: ZoomRect) -> Self {
        [z.x0, z.y0, z.x1, z.y1]
    }
}

/// Container format handed to the device when recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFormat {
    /// Raw H.264 elementary stream.
    #[default]
    H264,
    /// Motion JPEG.
    Mjpeg,
}

impl VideoFormat {
    /// File extension (without dot) for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Mjpeg => "mjpeg",
        }
    }
}

/// How frames are synchronized with an external trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// No synchronization.
    #[default]
    None,
    /// Frame counter is reset on the trigger edge.
    ResetFrames,
    /// Each trigger pulse is recorded alongside its frame index.
    RecordFrames,
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "reset_frames" => Ok(Self::ResetFrames),
            "record_frames" => Ok(Self::RecordFrames),
            other => Err(format!("unknown sync mode: {other}")),
        }
    }
}

/// External trigger settings reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSettings {
    /// Frame synchronization mode.
    pub sync_mode: SyncMode,
    /// Whether recording waits for a trigger edge before capturing.
    pub wait_for_trigger: bool,
    /// Seconds to wait for the trigger edge.
    pub trigger_timeout: f64,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::None,
            wait_for_trigger: false,
            trigger_timeout: 0.0,
        }
    }
}

/// Options passed to [`Device::start_preview`](crate::Device::start_preview).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Render the preview fullscreen.
    pub fullscreen: bool,
    /// Preview window alpha (0 transparent, 255 opaque).
    pub alpha: Option<u8>,
}
