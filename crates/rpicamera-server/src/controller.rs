//! Camera controller state machine.
//!
//! The [`Controller`] owns the (optional) camera and the session manager and
//! exposes one operation per remote command. If the camera could not be
//! opened every operation is a no-op and every getter returns `None`.
//!
//! Policy:
//! - framerate, resolution and flips are left alone while recording;
//! - zoom is only applied when all four coordinates lie in `[0, 1]`;
//! - setting gains always switches white balance to manual first;
//! - `Start` while recording is ignored.
//!
//! [`ControllerHandle`] puts the controller behind a mutex and runs the
//! operations that wait (preview warm-up, gain reset) without holding the
//! lock across the wait.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use rpicamera_core::{
    AwbGains, AwbMode, Device, DeviceResult, ExposureMode, Resolution, ZoomRect,
};
use rpicamera_protocol::StartArgs;

use crate::config::{PreviewSettings, RecordingSettings, ServerConfig};
use crate::error::ServerResult;
use crate::session::{Session, SessionManager};
use crate::snapshot::ParameterSnapshot;

/// The camera state machine.
pub struct Controller {
    device: Option<Box<dyn Device>>,
    sessions: SessionManager,
    recording: RecordingSettings,
    preview: Option<PreviewSettings>,
    closed: bool,
}

impl Controller {
    /// Opens the camera with `open_device` and builds a controller around it.
    ///
    /// A failing `open_device` is logged; the controller then runs without a
    /// camera.
    pub fn open<D, F>(config: &ServerConfig, open_device: F) -> Self
    where
        D: Device + 'static,
        F: FnOnce() -> DeviceResult<D>,
    {
        let device = match open_device() {
            Ok(device) => {
                info!("Camera opened");
                Some(Box::new(device) as Box<dyn Device>)
            }
            Err(e) => {
                error!(error = %e, "Failed to open camera, continuing without one");
                None
            }
        };

        Self {
            device,
            sessions: SessionManager::new(&config.data_path),
            recording: config.recording.clone(),
            preview: None,
            closed: false,
        }
    }

    fn with_device<T>(&self, f: impl FnOnce(&dyn Device) -> T) -> Option<T> {
        self.device.as_ref().map(|device| f(device.as_ref()))
    }

    fn with_device_mut<T>(&mut self, f: impl FnOnce(&mut dyn Device) -> T) -> Option<T> {
        self.device.as_mut().map(|device| f(device.as_mut()))
    }

    /// Runs a device write, logging rejections. Returns true if applied.
    fn apply(
        &mut self,
        setting: &'static str,
        write: impl FnOnce(&mut dyn Device) -> DeviceResult<()>,
    ) -> bool {
        match self.with_device_mut(write) {
            Some(Ok(())) => {
                debug!(setting, "Setting applied");
                true
            }
            Some(Err(e)) => {
                warn!(setting, error = %e, "Camera rejected setting");
                false
            }
            None => {
                debug!(setting, "No camera, ignoring setting");
                false
            }
        }
    }

    /// Like [`apply`](Self::apply) but ignored while recording.
    fn apply_unless_recording(
        &mut self,
        setting: &'static str,
        write: impl FnOnce(&mut dyn Device) -> DeviceResult<()>,
    ) -> bool {
        if self.is_recording() {
            debug!(setting, "Recording in progress, ignoring setting");
            return false;
        }
        self.apply(setting, write)
    }

    /// Returns true if a camera is attached.
    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    /// Returns true once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_recording(&self) -> bool {
        self.with_device(|d| d.is_recording()).unwrap_or(false)
    }

    pub fn is_previewing(&self) -> bool {
        self.with_device(|d| d.is_previewing()).unwrap_or(false)
    }

    /// Returns the active recording session.
    pub fn session(&self) -> Option<&Session> {
        self.sessions.active()
    }

    pub fn framerate(&self) -> Option<f64> {
        self.with_device(|d| d.framerate())
    }

    pub fn set_framerate(&mut self, fps: f64) -> bool {
        self.apply_unless_recording("framerate", |d| d.set_framerate(fps))
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.with_device(|d| d.resolution())
    }

    pub fn set_resolution(&mut self, resolution: Resolution) -> bool {
        self.apply_unless_recording("resolution", |d| d.set_resolution(resolution))
    }

    pub fn vflip(&self) -> Option<bool> {
        self.with_device(|d| d.vflip())
    }

    pub fn set_vflip(&mut self, on: bool) -> bool {
        self.apply_unless_recording("vflip", |d| d.set_vflip(on))
    }

    pub fn hflip(&self) -> Option<bool> {
        self.with_device(|d| d.hflip())
    }

    pub fn set_hflip(&mut self, on: bool) -> bool {
        self.apply_unless_recording("hflip", |d| d.set_hflip(on))
    }

    pub fn zoom(&self) -> Option<ZoomRect> {
        self.with_device(|d| d.zoom())
    }

    /// Sets the zoom rectangle from four coordinates in `[0, 1]`.
    ///
    /// Anything else leaves the zoom unchanged. Allowed while recording.
    pub fn set_zoom(&mut self, coords: &[f64]) -> bool {
        match ZoomRect::from_slice(coords) {
            Some(zoom) if zoom.is_normalized() => self.apply("zoom", |d| d.set_zoom(zoom)),
            _ => {
                debug!(?coords, "Zoom outside [0, 1], ignoring");
                false
            }
        }
    }

    pub fn gains(&self) -> Option<AwbGains> {
        self.with_device(|d| d.awb_gains())
    }

    /// Switches white balance to manual and applies `gains`.
    pub fn set_gains(&mut self, gains: AwbGains) -> bool {
        self.apply("awb_gains", |d| {
            d.set_awb_mode(AwbMode::Off)?;
            d.set_awb_gains(gains)
        })
    }

    /// First half of a preview start: configures white balance and exposure
    /// and starts the preview. The caller waits `settings.warmup` and then
    /// calls [`finish_preview`](Self::finish_preview).
    ///
    /// Returns false if there is no camera or the preview failed to start.
    pub fn begin_preview(&mut self, settings: &PreviewSettings) -> bool {
        self.preview = Some(settings.clone());
        let Some(device) = self.device.as_deref_mut() else {
            return false;
        };

        let result = (|| -> DeviceResult<()> {
            match settings.awb_gains {
                Some(gains) => {
                    info!(
                        red = gains.red,
                        blue = gains.blue,
                        "Using user-defined white balance gains"
                    );
                    device.set_awb_mode(AwbMode::Off)?;
                    device.set_awb_gains(gains)?;
                }
                None => device.set_awb_mode(AwbMode::Auto)?,
            }
            device.set_exposure_mode(ExposureMode::Auto)?;
            device.start_preview(&settings.options)
        })();

        match result {
            Ok(()) => {
                info!(warmup_ms = settings.warmup.as_millis() as u64, "Preview started");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to start preview");
                false
            }
        }
    }

    /// Second half of a preview start: locks white balance and/or exposure
    /// at the values the camera settled on.
    pub fn finish_preview(&mut self, settings: &PreviewSettings) {
        let Some(device) = self.device.as_deref_mut() else {
            return;
        };

        if settings.awb_gains.is_none() && settings.fix_awb_gains {
            let gains = device.awb_gains();
            info!(
                red = gains.red,
                blue = gains.blue,
                "Fixing automatic white balance gains"
            );
            if let Err(e) = device
                .set_awb_mode(AwbMode::Off)
                .and_then(|()| device.set_awb_gains(gains))
            {
                warn!(error = %e, "Failed to fix white balance gains");
            }
        }

        if settings.fix_exposure_speed {
            let speed = device.exposure_speed();
            info!(shutter_us = speed, "Fixing exposure speed");
            if let Err(e) = device
                .set_shutter_speed(speed)
                .and_then(|()| device.set_exposure_mode(ExposureMode::Off))
            {
                warn!(error = %e, "Failed to fix exposure speed");
            }
        }
    }

    /// Stops recording and preview ahead of a gain reset.
    ///
    /// Returns the settings to restart the preview with if it was running.
    pub fn suspend_for_reset(&mut self) -> Option<PreviewSettings> {
        if !self.has_device() {
            return None;
        }
        self.stop_recording();

        let was_previewing = self.is_previewing();
        if was_previewing {
            info!("Stopping preview for gain reset");
            if let Some(Err(e)) = self.with_device_mut(|d| d.stop_preview()) {
                warn!(error = %e, "Failed to stop preview");
            }
            return Some(self.preview.clone().unwrap_or_default());
        }
        None
    }

    /// Starts recording for `args`.
    ///
    /// Returns the recording directory, or `None` if there is no camera or a
    /// recording is already running. Filesystem and camera failures are
    /// returned as errors and leave no session behind.
    pub fn start_recording(&mut self, args: &StartArgs) -> ServerResult<Option<PathBuf>> {
        let Some(device) = self.device.as_deref_mut() else {
            debug!("No camera, ignoring start");
            return Ok(None);
        };
        if device.is_recording() {
            info!("Already recording, ignoring start");
            return Ok(None);
        }

        let session = self.sessions.prepare(args, &self.recording)?;
        ParameterSnapshot::capture(device, &session).write(&session.params_path)?;

        info!(path = %session.video_path.display(), "Starting recording to video file");
        device.start_recording(
            &session.video_path,
            self.recording.format,
            self.recording.quality,
        )?;

        Ok(Some(self.sessions.activate(session).rec_path.clone()))
    }

    /// Stops the running recording. Returns false if nothing was recording.
    pub fn stop_recording(&mut self) -> bool {
        if !self.is_recording() {
            return false;
        }
        info!("Stopping recording");
        if let Some(Err(e)) = self.with_device_mut(|d| d.stop_recording()) {
            warn!(error = %e, "Failed to stop recording");
        }
        self.sessions.discard();
        true
    }

    /// Stops everything and releases the camera. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut device) = self.device.take() {
            if device.is_recording() {
                info!("Stopping recording");
                if let Err(e) = device.stop_recording() {
                    warn!(error = %e, "Failed to stop recording");
                }
            }
            self.sessions.discard();

            if device.is_previewing() {
                info!("Stopping preview");
                if let Err(e) = device.stop_preview() {
                    warn!(error = %e, "Failed to stop preview");
                }
            }

            if !device.is_closed() {
                info!("Closing camera");
                if let Err(e) = device.close() {
                    warn!(error = %e, "Failed to close camera");
                }
            }
        }
        self.closed = true;
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.close();
    }
}

/// Shared, lockable controller.
///
/// Cloning is cheap; every clone refers to the same controller.
#[derive(Clone)]
pub struct ControllerHandle {
    inner: Arc<Mutex<Controller>>,
    reset_settle: Duration,
}

impl ControllerHandle {
    /// Wraps `controller`.
    pub fn new(controller: Controller, reset_settle: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
            reset_settle,
        }
    }

    /// Locks the controller.
    pub fn lock(&self) -> MutexGuard<'_, Controller> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the preview, waits for the warm-up and locks gains/exposure.
    ///
    /// The lock is released during the warm-up.
    pub fn start_preview(&self, settings: &PreviewSettings) {
        if !self.lock().begin_preview(settings) {
            return;
        }
        std::thread::sleep(settings.warmup);
        self.lock().finish_preview(settings);
    }

    /// Stops recording and preview, then restarts the preview if it was
    /// running so auto white balance settles again.
    pub fn reset_gains(&self) {
        let Some(settings) = self.lock().suspend_for_reset() else {
            return;
        };
        std::thread::sleep(self.reset_settle);
        self.start_preview(&settings);
    }
}
