//! Request dispatch.
//!
//! Maps each parsed [`Command`] onto the controller and produces the one
//! [`Reply`] the socket loop sends back. Work that has to happen after the
//! reply is on the wire is described by [`AfterReply`].

use tracing::{Span, debug, error, info, warn};

use rpicamera_protocol::{Command, Reply};

use crate::controller::ControllerHandle;

/// What the socket loop does once the reply has been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterReply {
    /// Wait for the next request.
    Continue,
    /// Run the gain reset, then wait for the next request.
    ResetGains,
    /// Close the controller and leave the loop.
    Shutdown,
}

/// A reply and the follow-up action.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub reply: Reply,
    pub then: AfterReply,
}

impl Dispatch {
    fn reply(reply: Reply) -> Self {
        Self {
            reply,
            then: AfterReply::Continue,
        }
    }

    fn then(reply: Reply, then: AfterReply) -> Self {
        Self { reply, then }
    }
}

/// Routes requests to the controller.
#[derive(Clone)]
pub struct RequestHandler {
    controller: ControllerHandle,
}

impl RequestHandler {
    /// Creates a handler driving `controller`.
    pub fn new(controller: ControllerHandle) -> Self {
        Self { controller }
    }

    /// Returns the controller handle.
    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    /// Parses and handles a raw request. Parse failures become error replies.
    pub fn handle_raw(&self, request: &[u8]) -> Dispatch {
        match Command::from_bytes(request) {
            Ok(command) => self.handle(&command),
            Err(e) => {
                warn!(error = %e, "Malformed request");
                Dispatch::reply(Reply::error(e))
            }
        }
    }

    /// Handles a single command and returns the reply.
    #[tracing::instrument(skip(self, command), fields(verb = command.verb(), duration_ms))]
    pub fn handle(&self, command: &Command) -> Dispatch {
        let start = std::time::Instant::now();

        let dispatch = match command {
            Command::Start(args) => {
                debug!(?args, "Handling Start request");
                match self.controller.lock().start_recording(args) {
                    Ok(path) => Dispatch::reply(Reply::Started(path)),
                    Err(e) => {
                        error!(error = %e, "Failed to start recording");
                        Dispatch::reply(Reply::Started(None))
                    }
                }
            }
            Command::Stop => {
                self.controller.lock().stop_recording();
                Dispatch::reply(Reply::Stopped)
            }
            Command::Close => {
                info!("Handling Close request");
                Dispatch::then(Reply::Closing, AfterReply::Shutdown)
            }
            Command::Resolution(resolution) => {
                self.controller.lock().set_resolution(*resolution);
                Dispatch::reply(Reply::Done)
            }
            Command::Framerate(fps) => {
                self.controller.lock().set_framerate(*fps);
                Dispatch::reply(Reply::Done)
            }
            Command::ResetGains => Dispatch::then(Reply::GainsReset, AfterReply::ResetGains),
            Command::GetGains => match self.controller.lock().gains() {
                Some(gains) => Dispatch::reply(Reply::Gains(gains)),
                None => Dispatch::reply(Reply::unavailable()),
            },
            Command::SetGains(gains) => {
                self.controller.lock().set_gains(*gains);
                Dispatch::reply(Reply::Done)
            }
            Command::VFlip(on) => {
                self.controller.lock().set_vflip(*on);
                Dispatch::reply(Reply::Done)
            }
            Command::HFlip(on) => {
                self.controller.lock().set_hflip(*on);
                Dispatch::reply(Reply::Done)
            }
            Command::Zoom(zoom) => {
                self.controller.lock().set_zoom(&<[f64; 4]>::from(*zoom));
                Dispatch::reply(Reply::Done)
            }
            Command::Unknown(verb) => {
                debug!(verb = %verb, "Unknown command");
                Dispatch::reply(Reply::NotHandled)
            }
        };

        let duration = start.elapsed();
        if tracing::enabled!(tracing::Level::DEBUG) {
            Span::current().record("duration_ms", duration.as_millis());
            debug!(duration_ms = duration.as_millis(), "Request handled");
        }

        dispatch
    }

    /// Runs the deferred work of a `ResetGains` request.
    pub fn reset_gains(&self) {
        info!("Resetting white balance gains");
        self.controller.reset_gains();
    }

    /// Closes the controller.
    pub fn close(&self) {
        self.controller.lock().close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rpicamera_core::{AwbGains, DeviceError, Journal, SimulatedCamera, SimulatedConfig};
    use rpicamera_protocol::StartArgs;
    use tempfile::{TempDir, tempdir};

    use crate::config::{PreviewSettings, ServerConfig};
    use crate::controller::Controller;

    fn handler() -> (RequestHandler, Journal, TempDir) {
        let dir = tempdir().unwrap();
        let camera = SimulatedCamera::open(SimulatedConfig::default()).unwrap();
        let journal = camera.journal();
        let controller = Controller::open(&ServerConfig::new(dir.path()), || Ok(camera));
        let handle = ControllerHandle::new(controller, Duration::ZERO);
        (RequestHandler::new(handle), journal, dir)
    }

    fn reply(handler: &RequestHandler, request: &str) -> String {
        handler.handle_raw(request.as_bytes()).reply.to_string()
    }

    #[test]
    fn start_then_stop() {
        let (handler, _journal, dir) = handler();
        let path = reply(&handler, "Start Experiment=2 Recording=3 Path=/data/20240101_1200");
        assert_eq!(
            path,
            dir.path()
                .join("20240101_1200_experiment_2_recording_3")
                .display()
                .to_string()
        );
        assert_eq!(reply(&handler, "Start Experiment=2 Recording=4"), "");
        assert_eq!(reply(&handler, "Stop"), "Stopped");
        assert!(!handler.controller().lock().is_recording());
    }

    #[test]
    fn start_failure_replies_empty() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let controller = Controller::open(&ServerConfig::new(&blocker), || {
            SimulatedCamera::open(SimulatedConfig::default())
        });
        let handler = RequestHandler::new(ControllerHandle::new(controller, Duration::ZERO));

        let dispatch = handler.handle(&Command::Start(StartArgs::default()));
        assert_eq!(dispatch.reply, Reply::Started(None));
        assert_eq!(dispatch.then, AfterReply::Continue);
    }

    #[test]
    fn setters_reply_done() {
        let (handler, _journal, _dir) = handler();
        for request in [
            "Resolution 640 480",
            "Framerate 25",
            "SetGains 1.25 2.5",
            "VFlip 1",
            "HFlip 0",
            "Zoom 0 0 1 1",
            "Zoom 0 0 2 2",
        ] {
            assert_eq!(reply(&handler, request), "Done", "{request}");
        }
        assert_eq!(reply(&handler, "GetGains"), "1.250000 2.500000");
    }

    #[test]
    fn reset_gains_is_deferred() {
        let (handler, journal, _dir) = handler();
        handler.controller().start_preview(&PreviewSettings {
            warmup: Duration::ZERO,
            ..Default::default()
        });
        journal.clear();

        let dispatch = handler.handle(&Command::ResetGains);
        assert_eq!(dispatch.reply.to_string(), "Done (but wait at least 2 seconds)");
        assert_eq!(dispatch.then, AfterReply::ResetGains);
        assert!(journal.calls().is_empty());

        handler.reset_gains();
        assert!(journal.calls().contains(&"stop_preview"));
        assert!(handler.controller().lock().is_previewing());
    }

    #[test]
    fn close_requests_shutdown() {
        let (handler, journal, _dir) = handler();
        let dispatch = handler.handle(&Command::Close);
        assert_eq!(dispatch.reply, Reply::Closing);
        assert_eq!(dispatch.then, AfterReply::Shutdown);
        assert!(journal.calls().is_empty());

        handler.close();
        assert!(handler.controller().lock().is_closed());
        assert_eq!(journal.calls(), vec!["close"]);
    }

    #[test]
    fn unknown_and_malformed() {
        let (handler, journal, _dir) = handler();
        assert_eq!(reply(&handler, "Snapshot"), "Not handled");
        assert_eq!(reply(&handler, ""), "Error: empty request");
        assert_eq!(
            reply(&handler, "Resolution 640"),
            "Error: Resolution expects 2 argument(s), got 1"
        );
        assert_eq!(
            handler.handle_raw(&[0xff]).reply.to_string(),
            "Error: request is not valid UTF-8"
        );
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn unavailable_device() {
        let controller = Controller::open(&ServerConfig::new("/nonexistent"), || {
            Err::<SimulatedCamera, _>(DeviceError::Unavailable("no camera".into()))
        });
        let handler = RequestHandler::new(ControllerHandle::new(controller, Duration::ZERO));

        assert_eq!(reply(&handler, "GetGains"), "Error: device unavailable");
        assert_eq!(reply(&handler, "Start"), "");
        assert_eq!(reply(&handler, "Stop"), "Stopped");
        assert_eq!(reply(&handler, "SetGains 1 1"), "Done");
        assert_eq!(
            handler.handle(&Command::SetGains(AwbGains::new(1.0, 1.0))).reply,
            Reply::Done
        );
    }
}
