//! Camera controller and ZeroMQ command server.
//!
//! This crate provides the server side of rpicamera:
//! - the [`Controller`] state machine around a camera [`Device`](rpicamera_core::Device)
//! - recording sessions and their parameter files
//! - a ZeroMQ REP loop answering one text request at a time
//! - SIGTERM/SIGINT handling for graceful shutdown
//!
//! # Example
//!
//! ```rust,no_run
//! use rpicamera_core::{SimulatedCamera, SimulatedConfig};
//! use rpicamera_server::{Controller, ControllerHandle, ProtocolServer, ServerConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("/srv/rpicamera");
//!     let controller = Controller::open(&config, || {
//!         SimulatedCamera::open(SimulatedConfig::default())
//!     });
//!     let handle = ControllerHandle::new(controller, config.reset_settle);
//!     handle.start_preview(&config.preview);
//!
//!     let server = ProtocolServer::bind(&config, handle)?;
//!     server.run()?;
//!     Ok(())
//! }
//! ```

mod config;
mod controller;
mod error;
mod handler;
mod session;
mod signals;
mod snapshot;
mod socket;

pub use config::{PreviewSettings, RecordingSettings, ServerConfig, default_data_path};
pub use controller::{Controller, ControllerHandle};
pub use error::{ServerError, ServerResult};
pub use handler::{AfterReply, Dispatch, RequestHandler};
pub use session::{
    PARAMS_SUFFIX, Session, SessionManager, TIMESTAMP_FORMAT, last_path_component,
    session_dir_name,
};
pub use signals::{ShutdownSignal, SignalHandler};
pub use snapshot::ParameterSnapshot;
pub use socket::{ProtocolServer, ServerState, ShutdownHandle};
