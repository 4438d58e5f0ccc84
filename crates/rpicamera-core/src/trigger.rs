//! GPIO trigger composed onto a plain camera.
//!
//! [`TriggeredDevice`] wraps any [`Device`] with a [`GpioTrigger`]. The
//! wrapper is itself a `Device`, so the controller only ever sees one
//! interface. The trigger is armed right before recording starts and
//! disarmed once it stops.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::device::{Device, DeviceResult};
use crate::types::{
    AwbGains, AwbMode, ExposureMode, PreviewOptions, Resolution, SyncMode, TriggerSettings,
    VideoFormat, ZoomRect,
};

/// Configuration of the trigger input line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Input pin, in physical board numbering.
    pub pin: u8,
    #[serde(flatten)]
    pub settings: TriggerSettings,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            pin: 11,
            settings: TriggerSettings::default(),
        }
    }
}

/// Trigger capability: owns the input line configuration and arm state.
#[derive(Debug)]
pub struct GpioTrigger {
    config: TriggerConfig,
    armed: bool,
}

impl GpioTrigger {
    /// Creates a disarmed trigger.
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            armed: false,
        }
    }

    /// Returns the trigger settings.
    pub fn settings(&self) -> TriggerSettings {
        self.config.settings
    }

    /// Returns true while a recording is waiting on or following the trigger.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    fn arm(&mut self) {
        let settings = self.config.settings;
        if settings.sync_mode == SyncMode::None && !settings.wait_for_trigger {
            return;
        }
        info!(
            pin = self.config.pin,
            sync_mode = ?settings.sync_mode,
            wait_for_trigger = settings.wait_for_trigger,
            timeout_s = settings.trigger_timeout,
            "Arming trigger"
        );
        self.armed = true;
    }

    fn disarm(&mut self) {
        if self.armed {
            debug!(pin = self.config.pin, "Disarming trigger");
            self.armed = false;
        }
    }
}

/// A camera with a GPIO trigger attached.
#[derive(Debug)]
pub struct TriggeredDevice<D> {
    inner: D,
    trigger: GpioTrigger,
}

impl<D: Device> TriggeredDevice<D> {
    /// Attaches `trigger` to `inner`.
    pub fn new(inner: D, trigger: GpioTrigger) -> Self {
        Self { inner, trigger }
    }

    /// Returns the trigger.
    pub fn trigger(&self) -> &GpioTrigger {
        &self.trigger
    }

    /// Returns the wrapped camera.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: Device> Device for TriggeredDevice<D> {
    fn framerate(&self) -> f64 {
        self.inner.framerate()
    }

    fn set_framerate(&mut self, fps: f64) -> DeviceResult<()> {
        self.inner.set_framerate(fps)
    }

    fn resolution(&self) -> Resolution {
        self.inner.resolution()
    }

    fn set_resolution(&mut self, resolution: Resolution) -> DeviceResult<()> {
        self.inner.set_resolution(resolution)
    }

    fn vflip(&self) -> bool {
        self.inner.vflip()
    }

    fn set_vflip(&mut self, on: bool) -> DeviceResult<()> {
        self.inner.set_vflip(on)
    }

    fn hflip(&self) -> bool {
        self.inner.hflip()
    }

    fn set_hflip(&mut self, on: bool) -> DeviceResult<()> {
        self.inner.set_hflip(on)
    }

    fn zoom(&self) -> ZoomRect {
        self.inner.zoom()
    }

    fn set_zoom(&mut self, zoom: ZoomRect) -> DeviceResult<()> {
        self.inner.set_zoom(zoom)
    }

    fn awb_mode(&self) -> AwbMode {
        self.inner.awb_mode()
    }

    fn set_awb_mode(&mut self, mode: AwbMode) -> DeviceResult<()> {
        self.inner.set_awb_mode(mode)
    }

    fn awb_gains(&self) -> AwbGains {
        self.inner.awb_gains()
    }

    fn set_awb_gains(&mut self, gains: AwbGains) -> DeviceResult<()> {
        self.inner.set_awb_gains(gains)
    }

    fn exposure_mode(&self) -> ExposureMode {
        self.inner.exposure_mode()
    }

    fn set_exposure_mode(&mut self, mode: ExposureMode) -> DeviceResult<()> {
        self.inner.set_exposure_mode(mode)
    }

    fn shutter_speed(&self) -> u32 {
        self.inner.shutter_speed()
    }

    fn set_shutter_speed(&mut self, micros: u32) -> DeviceResult<()> {
        self.inner.set_shutter_speed(micros)
    }

    fn exposure_speed(&self) -> u32 {
        self.inner.exposure_speed()
    }

    fn brightness(&self) -> u32 {
        self.inner.brightness()
    }

    fn trigger_settings(&self) -> TriggerSettings {
        self.trigger.settings()
    }

    fn start_preview(&mut self, options: &PreviewOptions) -> DeviceResult<()> {
        self.inner.start_preview(options)
    }

    fn stop_preview(&mut self) -> DeviceResult<()> {
        self.inner.stop_preview()
    }

    fn start_recording(
        &mut self,
        path: &Path,
        format: VideoFormat,
        quality: u32,
    ) -> DeviceResult<()> {
        self.trigger.arm();
        let result = self.inner.start_recording(path, format, quality);
        if result.is_err() {
            self.trigger.disarm();
        }
        result
    }

    fn stop_recording(&mut self) -> DeviceResult<()> {
        let result = self.inner.stop_recording();
        self.trigger.disarm();
        result
    }

    fn close(&mut self) -> DeviceResult<()> {
        self.trigger.disarm();
        self.inner.close()
    }

    fn is_previewing(&self) -> bool {
        self.inner.is_previewing()
    }

    fn is_recording(&self) -> bool {
        self.inner.is_recording()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{SimulatedCamera, SimulatedConfig};

    fn triggered(settings: TriggerSettings) -> TriggeredDevice<SimulatedCamera> {
        let camera = SimulatedCamera::open(SimulatedConfig::default()).unwrap();
        TriggeredDevice::new(
            camera,
            GpioTrigger::new(TriggerConfig {
                pin: 7,
                settings,
            }),
        )
    }

    #[test]
    fn reports_trigger_settings() {
        let settings = TriggerSettings {
            sync_mode: SyncMode::ResetFrames,
            wait_for_trigger: true,
            trigger_timeout: 3.0,
        };
        let device = triggered(settings);
        assert_eq!(device.trigger_settings(), settings);
        assert_eq!(device.inner().trigger_settings(), TriggerSettings::default());
    }

    #[test]
    fn arms_around_recording() {
        let mut device = triggered(TriggerSettings {
            sync_mode: SyncMode::RecordFrames,
            ..Default::default()
        });
        assert!(!device.trigger().is_armed());

        device
            .start_recording(Path::new("/tmp/v.h264"), VideoFormat::H264, 25)
            .unwrap();
        assert!(device.trigger().is_armed());
        assert!(device.is_recording());

        device.stop_recording().unwrap();
        assert!(!device.trigger().is_armed());
    }

    #[test]
    fn untriggered_settings_never_arm() {
        let mut device = triggered(TriggerSettings::default());
        device
            .start_recording(Path::new("/tmp/v.h264"), VideoFormat::H264, 25)
            .unwrap();
        assert!(!device.trigger().is_armed());
    }

    #[test]
    fn failed_start_disarms() {
        let mut device = triggered(TriggerSettings {
            wait_for_trigger: true,
            ..Default::default()
        });
        device.close().unwrap();
        assert!(
            device
                .start_recording(Path::new("/tmp/v.h264"), VideoFormat::H264, 25)
                .is_err()
        );
        assert!(!device.trigger().is_armed());
    }
}
