//! End-to-end tests: a REQ socket talking to a running command server.

use std::path::Path;
use std::thread::JoinHandle;
use std::time::Duration;

use rpicamera_core::{DeviceError, Journal, SimulatedCamera, SimulatedConfig};
use rpicamera_server::{
    Controller, ControllerHandle, PreviewSettings, ProtocolServer, ServerConfig, ServerResult,
    ShutdownHandle,
};
use tempfile::{TempDir, tempdir};

struct Harness {
    client: zmq::Socket,
    _context: zmq::Context,
    server: Option<JoinHandle<ServerResult<()>>>,
    shutdown: ShutdownHandle,
    journal: Option<Journal>,
    dir: TempDir,
}

impl Harness {
    fn start() -> Self {
        Self::with_device(true)
    }

    fn with_device(available: bool) -> Self {
        let dir = tempdir().unwrap();
        let config = ServerConfig::new(dir.path())
            .with_endpoint("tcp://127.0.0.1:*")
            .with_poll_interval(Duration::from_millis(10))
            .with_reset_settle(Duration::ZERO)
            .with_preview(PreviewSettings {
                warmup: Duration::ZERO,
                ..Default::default()
            });

        let camera = SimulatedCamera::open(SimulatedConfig::default()).unwrap();
        let journal = available.then(|| camera.journal());
        let controller = Controller::open(&config, move || {
            if available {
                Ok(camera)
            } else {
                Err(DeviceError::Unavailable("no camera attached".into()))
            }
        });
        let handle = ControllerHandle::new(controller, config.reset_settle);
        handle.start_preview(&config.preview);

        let server = ProtocolServer::bind(&config, handle).unwrap();
        let endpoint = server.endpoint().to_string();
        let shutdown = server.shutdown_handle();
        let thread = std::thread::spawn(move || server.run());

        let context = zmq::Context::new();
        let client = context.socket(zmq::REQ).unwrap();
        client.set_linger(0).unwrap();
        client.set_rcvtimeo(5_000).unwrap();
        client.connect(&endpoint).unwrap();

        Self {
            client,
            _context: context,
            server: Some(thread),
            shutdown,
            journal,
            dir,
        }
    }

    fn send(&self, request: impl AsRef<[u8]>) -> String {
        self.client.send(request.as_ref(), 0).unwrap();
        let reply = self.client.recv_bytes(0).unwrap();
        String::from_utf8(reply).unwrap()
    }

    fn journal(&self) -> &Journal {
        self.journal.as_ref().unwrap()
    }

    fn data_path(&self) -> &Path {
        self.dir.path()
    }

    fn join(&mut self) -> ServerResult<()> {
        self.server.take().unwrap().join().unwrap()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Some(thread) = self.server.take() {
            let _ = thread.join();
        }
    }
}

#[test]
fn one_reply_per_request_even_when_malformed() {
    let harness = Harness::start();
    assert_eq!(harness.send("Resolution 640"), "Error: Resolution expects 2 argument(s), got 1");
    assert!(harness.send("Framerate fast").starts_with("Error: "));
    assert!(harness.send("Start Experiment").starts_with("Error: "));
    assert_eq!(harness.send(""), "Error: empty request");
    assert_eq!(harness.send([0xffu8, 0xfe]), "Error: request is not valid UTF-8");
    assert_eq!(harness.send("Snapshot"), "Not handled");
    assert_eq!(harness.send("Stop"), "Stopped");
}

#[test]
fn start_twice_then_stop() {
    let harness = Harness::start();
    let rec_path = harness.send("Start Experiment=2 Recording=3 Path=/data/20240101_1200");
    let expected = harness
        .data_path()
        .join("20240101_1200_experiment_2_recording_3");
    assert_eq!(rec_path, expected.display().to_string());
    assert!(expected.join("rpicamera_video_params.json").is_file());

    assert_eq!(harness.send("Start Experiment=2 Recording=4"), "");
    assert_eq!(harness.send("Stop"), "Stopped");
    assert_eq!(harness.send("Stop"), "Stopped");

    let calls = harness.journal().calls();
    assert_eq!(calls.iter().filter(|c| **c == "start_recording").count(), 1);
    assert_eq!(calls.iter().filter(|c| **c == "stop_recording").count(), 1);
}

#[test]
fn idle_stop_has_no_device_effect() {
    let harness = Harness::start();
    harness.journal().clear();
    assert_eq!(harness.send("Stop"), "Stopped");
    assert!(harness.journal().calls().is_empty());
}

#[test]
fn gains_round_trip() {
    let harness = Harness::start();
    assert_eq!(harness.send("SetGains 1.25 2.5"), "Done");
    assert_eq!(harness.send("GetGains"), "1.250000 2.500000");
}

#[test]
fn zoom_outside_unit_square_is_ignored() {
    let harness = Harness::start();
    harness.journal().clear();
    assert_eq!(harness.send("Zoom 0 0 1 1.5"), "Done");
    assert!(harness.journal().calls().is_empty());

    assert_eq!(harness.send("Zoom 0.25 0.25 0.75 0.75"), "Done");
    assert_eq!(harness.journal().calls(), vec!["set_zoom"]);
}

#[test]
fn geometry_is_ignored_while_recording() {
    let harness = Harness::start();
    harness.send("Start Path=x");
    harness.journal().clear();

    assert_eq!(harness.send("VFlip 1"), "Done");
    assert_eq!(harness.send("HFlip 1"), "Done");
    assert_eq!(harness.send("Framerate 60"), "Done");
    assert_eq!(harness.send("Resolution 1920 1080"), "Done");
    assert!(harness.journal().calls().is_empty());

    harness.send("Stop");
    harness.journal().clear();
    assert_eq!(harness.send("VFlip 1"), "Done");
    assert_eq!(harness.journal().calls(), vec!["set_vflip"]);
}

#[test]
fn reset_gains_replies_before_work() {
    let harness = Harness::start();
    harness.send("Start Path=x");
    assert_eq!(harness.send("ResetGains"), "Done (but wait at least 2 seconds)");

    // The next request queues behind the reset.
    assert_eq!(harness.send("GetGains"), "1.500000 1.200000");
    let calls = harness.journal().calls();
    assert!(calls.contains(&"stop_recording"));
    assert!(calls.contains(&"stop_preview"));
    assert_eq!(calls.last(), Some(&"set_exposure_mode"));
}

#[test]
fn close_terminates_loop() {
    let mut harness = Harness::start();
    harness.send("Start Path=x");
    assert_eq!(harness.send("Close"), "Closing");
    harness.join().unwrap();

    let calls = harness.journal().calls();
    assert_eq!(
        &calls[calls.len() - 3..],
        &["stop_recording", "stop_preview", "close"]
    );
}

#[test]
fn unavailable_device_keeps_serving() {
    let mut harness = Harness::with_device(false);
    assert_eq!(harness.send("GetGains"), "Error: device unavailable");
    assert_eq!(harness.send("Start Experiment=1"), "");
    assert_eq!(harness.send("SetGains 1 1"), "Done");
    assert_eq!(harness.send("ResetGains"), "Done (but wait at least 2 seconds)");
    assert_eq!(harness.send("Close"), "Closing");
    harness.join().unwrap();
}
