//! In-memory camera.
//!
//! Behaves like a well-mannered camera driver without touching any hardware.
//! Every mutating call is appended to a shared [`Journal`], which lets tests
//! observe device effects after the camera has been handed to a controller.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::device::{Device, DeviceError, DeviceResult};
use crate::types::{
    AwbGains, AwbMode, ExposureMode, PreviewOptions, Resolution, VideoFormat, ZoomRect,
};

/// Shared record of the mutating calls made on a [`SimulatedCamera`].
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl Journal {
    fn push(&self, call: &'static str) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Returns the recorded calls in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets all recorded calls.
    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Initial settings for a [`SimulatedCamera`].
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    pub resolution: Resolution,
    pub framerate: f64,
    pub vflip: bool,
    pub hflip: bool,
    pub brightness: u32,
    /// Gains the simulated auto white balance settles on.
    pub auto_gains: AwbGains,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            framerate: 30.0,
            vflip: false,
            hflip: false,
            brightness: 50,
            auto_gains: AwbGains::new(1.5, 1.2),
        }
    }
}

/// A camera that keeps its state in memory.
#[derive(Debug)]
pub struct SimulatedCamera {
    resolution: Resolution,
    framerate: f64,
    vflip: bool,
    hflip: bool,
    zoom: ZoomRect,
    awb_mode: AwbMode,
    awb_gains: AwbGains,
    auto_gains: AwbGains,
    exposure_mode: ExposureMode,
    shutter_speed: u32,
    brightness: u32,
    previewing: bool,
    recording: Option<PathBuf>,
    closed: bool,
    journal: Journal,
}

impl SimulatedCamera {
    /// Opens a simulated camera with the given settings.
    pub fn open(config: SimulatedConfig) -> DeviceResult<Self> {
        if config.framerate <= 0.0 {
            return Err(DeviceError::invalid_value(
                "framerate",
                format!("{} is not positive", config.framerate),
            ));
        }
        debug!(
            resolution = %config.resolution,
            framerate = config.framerate,
            "Opened simulated camera"
        );
        Ok(Self {
            resolution: config.resolution,
            framerate: config.framerate,
            vflip: config.vflip,
            hflip: config.hflip,
            zoom: ZoomRect::FULL,
            awb_mode: AwbMode::Auto,
            awb_gains: config.auto_gains,
            auto_gains: config.auto_gains,
            exposure_mode: ExposureMode::Auto,
            shutter_speed: 0,
            brightness: config.brightness,
            previewing: false,
            recording: None,
            closed: false,
            journal: Journal::default(),
        })
    }

    /// Returns a handle to the call journal.
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Path of the file currently being recorded, if any.
    pub fn recording_path(&self) -> Option<&Path> {
        self.recording.as_deref()
    }

    fn ensure_open(&self) -> DeviceResult<()> {
        if self.closed {
            Err(DeviceError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Device for SimulatedCamera {
    fn framerate(&self) -> f64 {
        self.framerate
    }

    fn set_framerate(&mut self, fps: f64) -> DeviceResult<()> {
        self.ensure_open()?;
        if fps <= 0.0 {
            return Err(DeviceError::invalid_value(
                "framerate",
                format!("{fps} is not positive"),
            ));
        }
        self.journal.push("set_framerate");
        self.framerate = fps;
        Ok(())
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn set_resolution(&mut self, resolution: Resolution) -> DeviceResult<()> {
        self.ensure_open()?;
        if resolution.width == 0 || resolution.height == 0 {
            return Err(DeviceError::invalid_value(
                "resolution",
                format!("{resolution} has a zero dimension"),
            ));
        }
        self.journal.push("set_resolution");
        self.resolution = resolution;
        Ok(())
    }

    fn vflip(&self) -> bool {
        self.vflip
    }

    fn set_vflip(&mut self, on: bool) -> DeviceResult<()> {
        self.ensure_open()?;
        self.journal.push("set_vflip");
        self.vflip = on;
        Ok(())
    }

    fn hflip(&self) -> bool {
        self.hflip
    }

    fn set_hflip(&mut self, on: bool) -> DeviceResult<()> {
        self.ensure_open()?;
        self.journal.push("set_hflip");
        self.hflip = on;
        Ok(())
    }

    fn zoom(&self) -> ZoomRect {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: ZoomRect) -> DeviceResult<()> {
        self.ensure_open()?;
        self.journal.push("set_zoom");
        self.zoom = zoom;
        Ok(())
    }

    fn awb_mode(&self) -> AwbMode {
        self.awb_mode
    }

    fn set_awb_mode(&mut self, mode: AwbMode) -> DeviceResult<()> {
        self.ensure_open()?;
        self.journal.push("set_awb_mode");
        if mode == AwbMode::Auto {
            self.awb_gains = self.auto_gains;
        }
        self.awb_mode = mode;
        Ok(())
    }

    fn awb_gains(&self) -> AwbGains {
        self.awb_gains
    }

    fn set_awb_gains(&mut self, gains: AwbGains) -> DeviceResult<()> {
        self.ensure_open()?;
        if gains.red <= 0.0 || gains.blue <= 0.0 {
            return Err(DeviceError::invalid_value(
                "awb_gains",
                format!("({}, {}) must be positive", gains.red, gains.blue),
            ));
        }
        self.journal.push("set_awb_gains");
        self.awb_gains = gains;
        Ok(())
    }

    fn exposure_mode(&self) -> ExposureMode {
        self.exposure_mode
    }

    fn set_exposure_mode(&mut self, mode: ExposureMode) -> DeviceResult<()> {
        self.ensure_open()?;
        self.journal.push("set_exposure_mode");
        self.exposure_mode = mode;
        Ok(())
    }

    fn shutter_speed(&self) -> u32 {
        self.shutter_speed
    }

    fn set_shutter_speed(&mut self, micros: u32) -> DeviceResult<()> {
        self.ensure_open()?;
        self.journal.push("set_shutter_speed");
        self.shutter_speed = micros;
        Ok(())
    }

    fn exposure_speed(&self) -> u32 {
        match self.exposure_mode {
            ExposureMode::Off if self.shutter_speed > 0 => self.shutter_speed,
            _ => (1_000_000.0 / self.framerate).round() as u32,
        }
    }

    fn brightness(&self) -> u32 {
        self.brightness
    }

    fn start_preview(&mut self, _options: &PreviewOptions) -> DeviceResult<()> {
        self.ensure_open()?;
        self.journal.push("start_preview");
        self.previewing = true;
        Ok(())
    }

    fn stop_preview(&mut self) -> DeviceResult<()> {
        self.ensure_open()?;
        self.journal.push("stop_preview");
        self.previewing = false;
        Ok(())
    }

    fn start_recording(
        &mut self,
        path: &Path,
        format: VideoFormat,
        quality: u32,
    ) -> DeviceResult<()> {
        self.ensure_open()?;
        if self.recording.is_some() {
            return Err(DeviceError::hardware("recording is already in progress"));
        }
        debug!(path = %path.display(), ?format, quality, "Simulated recording started");
        self.journal.push("start_recording");
        self.recording = Some(path.to_path_buf());
        Ok(())
    }

    fn stop_recording(&mut self) -> DeviceResult<()> {
        self.ensure_open()?;
        if self.recording.take().is_none() {
            return Err(DeviceError::hardware("no recording is in progress"));
        }
        self.journal.push("stop_recording");
        Ok(())
    }

    fn close(&mut self) -> DeviceResult<()> {
        self.ensure_open()?;
        self.journal.push("close");
        self.previewing = false;
        self.recording = None;
        self.closed = true;
        Ok(())
    }

    fn is_previewing(&self) -> bool {
        self.previewing
    }

    fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> SimulatedCamera {
        SimulatedCamera::open(SimulatedConfig::default()).unwrap()
    }

    #[test]
    fn open_rejects_non_positive_framerate() {
        let config = SimulatedConfig {
            framerate: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            SimulatedCamera::open(config),
            Err(DeviceError::InvalidValue { .. })
        ));
    }

    #[test]
    fn journal_records_mutations_only() {
        let mut cam = camera();
        let journal = cam.journal();

        let _ = cam.framerate();
        let _ = cam.awb_gains();
        cam.set_vflip(true).unwrap();
        cam.start_preview(&PreviewOptions::default()).unwrap();

        assert_eq!(journal.calls(), vec!["set_vflip", "start_preview"]);
        journal.clear();
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn recording_transitions() {
        let mut cam = camera();
        assert!(cam.stop_recording().is_err());

        cam.start_recording(Path::new("/tmp/a.h264"), VideoFormat::H264, 25)
            .unwrap();
        assert!(cam.is_recording());
        assert_eq!(cam.recording_path(), Some(Path::new("/tmp/a.h264")));
        assert!(
            cam.start_recording(Path::new("/tmp/b.h264"), VideoFormat::H264, 25)
                .is_err()
        );

        cam.stop_recording().unwrap();
        assert!(!cam.is_recording());
    }

    #[test]
    fn auto_awb_restores_auto_gains() {
        let mut cam = camera();
        cam.set_awb_mode(AwbMode::Off).unwrap();
        cam.set_awb_gains(AwbGains::new(2.0, 2.0)).unwrap();
        cam.set_awb_mode(AwbMode::Auto).unwrap();
        assert_eq!(cam.awb_gains(), SimulatedConfig::default().auto_gains);
    }

    #[test]
    fn exposure_speed_follows_framerate_until_fixed() {
        let mut cam = camera();
        assert_eq!(cam.exposure_speed(), 33_333);

        cam.set_shutter_speed(10_000).unwrap();
        cam.set_exposure_mode(ExposureMode::Off).unwrap();
        assert_eq!(cam.exposure_speed(), 10_000);
    }

    #[test]
    fn closed_camera_rejects_mutation() {
        let mut cam = camera();
        cam.close().unwrap();
        assert!(cam.is_closed());
        assert!(matches!(cam.set_hflip(true), Err(DeviceError::Closed)));
        assert!(matches!(cam.close(), Err(DeviceError::Closed)));
    }
}
