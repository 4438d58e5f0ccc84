//! Serve command: runs the camera command server in the foreground.
//!
//! Startup order:
//! - open the camera (a failure leaves the server running without one)
//! - start the preview and wait for it to settle
//! - bind the command socket
//! - serve on a blocking thread until `Close`, SIGTERM or SIGINT

use tracing::{info, warn};

use rpicamera_core::{
    Device, DeviceError, DeviceResult, GpioTrigger, SimulatedCamera, TriggeredDevice,
};
use rpicamera_server::{Controller, ControllerHandle, ProtocolServer, SignalHandler};

use crate::cli::ServeArgs;
use crate::config::{ClientConfig, DeviceKind};
use crate::error::{ClientError, ClientResult};

/// Runs the command server until it is closed or a shutdown signal arrives.
pub async fn run(args: &ServeArgs, config: &ClientConfig) -> ClientResult<()> {
    let mut server_config = config.server_config().map_err(ClientError::Config)?;
    if let Some(ref endpoint) = args.endpoint {
        server_config.endpoint = endpoint.clone();
    }
    if let Some(ref data_path) = args.data_path {
        server_config.data_path = data_path.clone();
    }
    let device_kind = args.device.unwrap_or(config.camera.device);

    info!(
        endpoint = %server_config.endpoint,
        data_path = %server_config.data_path.display(),
        device = ?device_kind,
        "Starting camera server"
    );

    let camera = config.clone();
    let controller = Controller::open(&server_config, move || open_device(device_kind, &camera));
    let handle = ControllerHandle::new(controller, server_config.reset_settle);

    if args.no_preview || !config.preview.enabled {
        info!("Preview disabled");
    } else {
        let preview_handle = handle.clone();
        let preview = server_config.preview.clone();
        tokio::task::spawn_blocking(move || preview_handle.start_preview(&preview))
            .await
            .map_err(|e| ClientError::Config(format!("preview task failed: {}", e)))?;
    }

    let server = ProtocolServer::bind(&server_config, handle)?;

    let signal_handler = SignalHandler::new();
    signal_handler.spawn_listener()?;
    let forward = signal_handler.forward_to(server.shutdown_handle());

    let result = tokio::task::spawn_blocking(move || server.run())
        .await
        .map_err(|e| ClientError::Config(format!("server task failed: {}", e)))?;
    forward.abort();

    result?;
    info!(signaled = signal_handler.is_shutdown(), "Server stopped");
    Ok(())
}

/// Opens the configured camera backend.
fn open_device(kind: DeviceKind, config: &ClientConfig) -> DeviceResult<Box<dyn Device>> {
    let camera: Box<dyn Device> = match kind {
        DeviceKind::Simulated => Box::new(SimulatedCamera::open(config.camera.simulated())?),
        DeviceKind::None => {
            return Err(DeviceError::Unavailable(
                "no camera backend configured".into(),
            ));
        }
    };

    if config.trigger.enabled {
        let trigger = GpioTrigger::new(config.trigger.config);
        info!(pin = config.trigger.config.pin, "Using external trigger");
        return Ok(Box::new(TriggeredDevice::new(camera, trigger)));
    }
    if config.trigger.config.settings.wait_for_trigger {
        warn!("wait_for_trigger is set but the trigger is disabled");
    }
    Ok(camera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpicamera_core::SyncMode;

    #[test]
    fn simulated_device_opens() {
        let device = open_device(DeviceKind::Simulated, &ClientConfig::default()).unwrap();
        assert_eq!(device.framerate(), 30.0);
        assert_eq!(device.trigger_settings().sync_mode, SyncMode::None);
    }

    #[test]
    fn none_device_is_unavailable() {
        let result = open_device(DeviceKind::None, &ClientConfig::default());
        assert!(matches!(result, Err(DeviceError::Unavailable(_))));
    }

    #[test]
    fn trigger_wraps_device() {
        let mut config = ClientConfig::default();
        config.trigger.enabled = true;
        config.trigger.config.settings.sync_mode = SyncMode::RecordFrames;

        let device = open_device(DeviceKind::Simulated, &config).unwrap();
        assert_eq!(device.trigger_settings().sync_mode, SyncMode::RecordFrames);
    }
}
