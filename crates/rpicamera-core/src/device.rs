//! Device capability interface.
//!
//! A [`Device`] is the camera hardware as seen by the controller: a bag of
//! readable/writable settings plus preview and recording transitions. The
//! controller never talks to a driver directly.

use std::path::Path;

use thiserror::Error;

use crate::types::{
    AwbGains, AwbMode, ExposureMode, PreviewOptions, Resolution, TriggerSettings, VideoFormat,
    ZoomRect,
};

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors reported by a device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device could not be opened.
    #[error("device unavailable: {0}")]
    Unavailable(String),

    /// The device has already been closed.
    #[error("device is closed")]
    Closed,

    /// A setting was rejected by the driver.
    #[error("invalid value for {setting}: {message}")]
    InvalidValue { setting: String, message: String },

    /// Driver or hardware failure.
    #[error("hardware error: {0}")]
    Hardware(String),
}

impl DeviceError {
    /// Creates an invalid value error.
    pub fn invalid_value(setting: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            setting: setting.into(),
            message: message.into(),
        }
    }

    /// Creates a hardware error.
    pub fn hardware(message: impl Into<String>) -> Self {
        Self::Hardware(message.into())
    }
}

/// Camera capabilities consumed by the controller.
///
/// Getters are infallible and report the last value the device accepted.
/// Setters and transitions may fail; the caller decides whether a failure
/// matters.
pub trait Device: Send {
    fn framerate(&self) -> f64;
    fn set_framerate(&mut self, fps: f64) -> DeviceResult<()>;

    fn resolution(&self) -> Resolution;
    fn set_resolution(&mut self, resolution: Resolution) -> DeviceResult<()>;

    fn vflip(&self) -> bool;
    fn set_vflip(&mut self, on: bool) -> DeviceResult<()>;

    fn hflip(&self) -> bool;
    fn set_hflip(&mut self, on: bool) -> DeviceResult<()>;

    fn zoom(&self) -> ZoomRect;
    fn set_zoom(&mut self, zoom: ZoomRect) -> DeviceResult<()>;

    fn awb_mode(&self) -> AwbMode;
    fn set_awb_mode(&mut self, mode: AwbMode) -> DeviceResult<()>;

    fn awb_gains(&self) -> AwbGains;
    fn set_awb_gains(&mut self, gains: AwbGains) -> DeviceResult<()>;

    fn exposure_mode(&self) -> ExposureMode;
    fn set_exposure_mode(&mut self, mode: ExposureMode) -> DeviceResult<()>;

    /// Fixed shutter speed in microseconds (0 while exposure is automatic).
    fn shutter_speed(&self) -> u32;
    fn set_shutter_speed(&mut self, micros: u32) -> DeviceResult<()>;

    /// Shutter speed currently chosen by auto exposure, in microseconds.
    fn exposure_speed(&self) -> u32;

    /// Brightness in percent.
    fn brightness(&self) -> u32;

    /// External trigger configuration. Untriggered devices report the default.
    fn trigger_settings(&self) -> TriggerSettings {
        TriggerSettings::default()
    }

    fn start_preview(&mut self, options: &PreviewOptions) -> DeviceResult<()>;
    fn stop_preview(&mut self) -> DeviceResult<()>;

    fn start_recording(
        &mut self,
        path: &Path,
        format: VideoFormat,
        quality: u32,
    ) -> DeviceResult<()>;
    fn stop_recording(&mut self) -> DeviceResult<()>;

    fn close(&mut self) -> DeviceResult<()>;

    fn is_previewing(&self) -> bool;
    fn is_recording(&self) -> bool;
    fn is_closed(&self) -> bool;
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn framerate(&self) -> f64 {
        (**self).framerate()
    }
    fn set_framerate(&mut self, fps: f64) -> DeviceResult<()> {
        (**self).set_framerate(fps)
    }
    fn resolution(&self) -> Resolution {
        (**self).resolution()
    }
    fn set_resolution(&mut self, resolution: Resolution) -> DeviceResult<()> {
        (**self).set_resolution(resolution)
    }
    fn vflip(&self) -> bool {
        (**self).vflip()
    }
    fn set_vflip(&mut self, on: bool) -> DeviceResult<()> {
        (**self).set_vflip(on)
    }
    fn hflip(&self) -> bool {
        (**self).hflip()
    }
    fn set_hflip(&mut self, on: bool) -> DeviceResult<()> {
        (**self).set_hflip(on)
    }
    fn zoom(&self) -> ZoomRect {
        (**self).zoom()
    }
    fn set_zoom(&mut self, zoom: ZoomRect) -> DeviceResult<()> {
        (**self).set_zoom(zoom)
    }
    fn awb_mode(&self) -> AwbMode {
        (**self).awb_mode()
    }
    fn set_awb_mode(&mut self, mode: AwbMode) -> DeviceResult<()> {
        (**self).set_awb_mode(mode)
    }
    fn awb_gains(&self) -> AwbGains {
        (**self).awb_gains()
    }
    fn set_awb_gains(&mut self, gains: AwbGains) -> DeviceResult<()> {
        (**self).set_awb_gains(gains)
    }
    fn exposure_mode(&self) -> ExposureMode {
        (**self).exposure_mode()
    }
    fn set_exposure_mode(&mut self, mode: ExposureMode) -> DeviceResult<()> {
        (**self).set_exposure_mode(mode)
    }
    fn shutter_speed(&self) -> u32 {
        (**self).shutter_speed()
    }
    fn set_shutter_speed(&mut self, micros: u32) -> DeviceResult<()> {
        (**self).set_shutter_speed(micros)
    }
    fn exposure_speed(&self) -> u32 {
        (**self).exposure_speed()
    }
    fn brightness(&self) -> u32 {
        (**self).brightness()
    }
    fn trigger_settings(&self) -> TriggerSettings {
        (**self).trigger_settings()
    }
    fn start_preview(&mut self, options: &PreviewOptions) -> DeviceResult<()> {
        (**self).start_preview(options)
    }
    fn stop_preview(&mut self) -> DeviceResult<()> {
        (**self).stop_preview()
    }
    fn start_recording(
        &mut self,
        path: &Path,
        format: VideoFormat,
        quality: u32,
    ) -> DeviceResult<()> {
        (**self).start_recording(path, format, quality)
    }
    fn stop_recording(&mut self) -> DeviceResult<()> {
        (**self).stop_recording()
    }
    fn close(&mut self) -> DeviceResult<()> {
        (**self).close()
    }
    fn is_previewing(&self) -> bool {
        (**self).is_previewing()
    }
    fn is_recording(&self) -> bool {
        (**self).is_recording()
    }
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
