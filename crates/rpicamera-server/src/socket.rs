//! ZeroMQ REP server loop.
//!
//! One request at a time, one reply per request. The loop runs on the
//! calling thread until a `Close` request arrives or a [`ShutdownHandle`]
//! asks it to stop; either way the controller is closed on exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::controller::ControllerHandle;
use crate::error::{ServerError, ServerResult};
use crate::handler::{AfterReply, RequestHandler};

/// Lifecycle of the serving loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    /// Bound but not serving yet.
    Idle = 0,
    /// Inside [`ProtocolServer::run`].
    Serving = 1,
    /// Asked to stop, or stopped.
    Stopping = 2,
}

impl ServerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Serving,
            _ => Self::Stopping,
        }
    }
}

#[derive(Debug)]
struct AtomicState(AtomicU8);

impl AtomicState {
    fn new(state: ServerState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn load(&self) -> ServerState {
        ServerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: ServerState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Moves `from` to `to`; returns false if the state was something else.
    fn transition(&self, from: ServerState, to: ServerState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Stops a running [`ProtocolServer`] from another thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    state: Arc<AtomicState>,
}

impl ShutdownHandle {
    /// Asks the loop to stop. It notices within one poll interval.
    pub fn trigger(&self) {
        self.state.store(ServerState::Stopping);
    }

    /// Returns true once a stop was requested.
    pub fn is_shutdown(&self) -> bool {
        self.state.load() == ServerState::Stopping
    }
}

/// ZeroMQ REP server driving a controller.
pub struct ProtocolServer {
    // The socket must be dropped before its context.
    socket: zmq::Socket,
    _context: zmq::Context,
    endpoint: String,
    handler: RequestHandler,
    state: Arc<AtomicState>,
    poll_timeout_ms: i64,
}

impl ProtocolServer {
    /// Binds a REP socket to `config.endpoint`.
    pub fn bind(config: &ServerConfig, controller: ControllerHandle) -> ServerResult<Self> {
        config.validate()?;
        let context = zmq::Context::new();
        let socket = context.socket(zmq::REP)?;
        socket.set_linger(config.linger.as_millis().min(i32::MAX as u128) as i32)?;
        socket
            .bind(&config.endpoint)
            .map_err(|e| ServerError::bind(&config.endpoint, e))?;

        let endpoint = match socket.get_last_endpoint()? {
            Ok(endpoint) => endpoint,
            Err(_) => config.endpoint.clone(),
        };
        info!(endpoint = %endpoint, "Command server listening");

        Ok(Self {
            socket,
            _context: context,
            endpoint,
            handler: RequestHandler::new(controller),
            state: Arc::new(AtomicState::new(ServerState::Idle)),
            poll_timeout_ms: config.poll_interval.as_millis().clamp(1, i64::MAX as u128) as i64,
        })
    }

    /// Returns the bound endpoint with wildcards resolved.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the current loop state.
    pub fn state(&self) -> ServerState {
        self.state.load()
    }

    /// Returns a handle that stops the loop.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            state: self.state.clone(),
        }
    }

    /// Serves requests until `Close` or a shutdown request.
    ///
    /// Returns an error only if the socket itself fails. The controller is
    /// closed in every case.
    pub fn run(&self) -> ServerResult<()> {
        if !self.state.transition(ServerState::Idle, ServerState::Serving) {
            info!("Shutdown requested before serving");
            self.handler.close();
            return Ok(());
        }

        let result = self.serve();
        self.state.store(ServerState::Stopping);
        self.handler.close();
        info!("Command server stopped");
        result
    }

    fn serve(&self) -> ServerResult<()> {
        while self.state.load() == ServerState::Serving {
            let request = match self.receive() {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => {
                    error!(error = %e, "Receive failed");
                    return Err(e.into());
                }
            };

            let dispatch = self.handler.handle_raw(&request);
            let reply = dispatch.reply.to_string();
            debug!(reply = %reply, "Sending reply");
            if let Err(e) = self.socket.send(reply.as_bytes(), 0) {
                warn!(error = %e, "Failed to send reply");
            }

            match dispatch.then {
                AfterReply::Continue => {}
                AfterReply::ResetGains => self.handler.reset_gains(),
                AfterReply::Shutdown => {
                    info!("Close requested, leaving command loop");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Waits up to one poll interval for a request.
    fn receive(&self) -> Result<Option<Vec<u8>>, zmq::Error> {
        match self.socket.poll(zmq::POLLIN, self.poll_timeout_ms) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(zmq::Error::EINTR) => return Ok(None),
            Err(e) => return Err(e),
        }
        match self.socket.recv_bytes(zmq::DONTWAIT) {
            Ok(request) => Ok(Some(request)),
            Err(zmq::Error::EAGAIN | zmq::Error::EINTR) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
