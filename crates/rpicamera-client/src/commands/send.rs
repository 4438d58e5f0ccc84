//! Send command: one request, one printed reply.

use std::time::Duration;

use tracing::warn;

use rpicamera_protocol::{Command, Reply};

use crate::cli::SendArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::socket::ZmqClient;

/// Sends the command words to the server and prints the reply.
///
/// Error replies are returned as [`ClientError::Rejected`].
pub async fn run(args: &SendArgs, config: &ClientConfig) -> ClientResult<()> {
    let request = args.words.join(" ");
    if let Err(e) = request.parse::<Command>() {
        warn!(error = %e, "request looks malformed, sending anyway");
    }

    let endpoint = args
        .endpoint
        .clone()
        .unwrap_or_else(|| config.server.connect.clone());
    let timeout = Duration::from_secs(args.timeout.unwrap_or(config.server.timeout));

    let client = ZmqClient::new(endpoint, timeout);
    let reply = tokio::task::spawn_blocking(move || client.send(&request))
        .await
        .map_err(|e| ClientError::Connection(format!("request task failed: {}", e)))??;

    match Reply::error_message(&reply) {
        Some(message) => Err(ClientError::Rejected(message.to_string())),
        None => {
            println!("{}", reply);
            Ok(())
        }
    }
}
