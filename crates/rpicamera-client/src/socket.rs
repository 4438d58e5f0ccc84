//! ZeroMQ REQ client for talking to a running command server.

use std::time::Duration;

use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Sends single requests to a command server.
///
/// Each [`send`](Self::send) opens a fresh REQ socket, so a timed-out
/// request never leaves the client stuck in the REQ state machine.
pub struct ZmqClient {
    context: zmq::Context,
    endpoint: String,
    timeout: Duration,
}

impl ZmqClient {
    /// Creates a new client.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            context: zmq::Context::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Sends `request` and waits for the reply.
    pub fn send(&self, request: &str) -> ClientResult<String> {
        let timeout_ms = self.timeout.as_millis().min(i32::MAX as u128) as i32;

        let socket = self.context.socket(zmq::REQ)?;
        socket.set_linger(0)?;
        socket.set_sndtimeo(timeout_ms)?;
        socket.set_rcvtimeo(timeout_ms)?;
        socket.connect(&self.endpoint).map_err(|e| {
            ClientError::Connection(format!("failed to connect to {}: {}", self.endpoint, e))
        })?;

        debug!(endpoint = %self.endpoint, request, "sending request");
        socket.send(request, 0).map_err(|e| match e {
            zmq::Error::EAGAIN => ClientError::Timeout("sending request".into()),
            other => other.into(),
        })?;

        let reply = socket.recv_bytes(0).map_err(|e| match e {
            zmq::Error::EAGAIN => ClientError::Timeout(format!(
                "no reply from {} after {}s",
                self.endpoint,
                self.timeout.as_secs_f64()
            )),
            other => other.into(),
        })?;

        let reply = String::from_utf8_lossy(&reply).into_owned();
        debug!(reply = %reply, "reply received");
        Ok(reply)
    }
}
