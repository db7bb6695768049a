//! Geminal SSH gateway.
//!
//! Production glue that runs [`geminal_app`] sessions over SSH. Each accepted
//! TCP connection gets a russh handshake and a [`ConnectionHandler`]; each
//! session channel on it gets its own [`geminal_app::Runtime`] driven by an
//! [`SshDriver`].
//!
//! # Components
//!
//! - [`Server`]: TCP accept loop and SSH configuration
//! - [`ConnectionHandler`]: russh callbacks for one connection
//! - [`ChannelTable`]: per-connection channel bookkeeping
//! - [`SshDriver`]: [`geminal_app::Driver`] over one SSH channel
//! - [`ServerRuntimeConfig`]: immutable startup configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod channels;
mod config;
mod error;
mod handler;
mod host_key;
mod terminal;

use std::{net::SocketAddr, sync::Arc, time::Duration};

pub use channels::{ChannelTable, SessionStart};
pub use config::{
    DEFAULT_BIND_ADDRESS, DEFAULT_HOST_KEY_PATH, DEFAULT_INACTIVITY_TIMEOUT, ServerRuntimeConfig,
    require_api_key,
};
pub use error::ServerError;
use geminal_app::Inference;
pub use handler::ConnectionHandler;
pub use host_key::load_host_key;
pub use terminal::{LineWriter, SshDriver, TerminalError, frame_full_screen};
use tokio::net::{TcpListener, TcpStream};

/// Delay before answering a rejected authentication attempt.
const AUTH_REJECTION_TIME: Duration = Duration::from_secs(1);

/// Production Geminal server.
///
/// Owns the listening socket, the SSH configuration, and the inference
/// backend shared by every session.
pub struct Server<I> {
    listener: TcpListener,
    ssh_config: Arc<russh::server::Config>,
    inference: Arc<I>,
}

impl<I: Inference> Server<I> {
    /// Load the host key and bind the listening socket.
    ///
    /// # Errors
    ///
    /// Fails if the bind address is invalid, the host key cannot be loaded,
    /// or the socket cannot be bound. All are fatal at startup.
    pub async fn bind(config: &ServerRuntimeConfig, inference: I) -> Result<Self, ServerError> {
        let addr = config.socket_addr()?;
        let host_key = load_host_key(&config.host_key_path)?;

        let ssh_config = russh::server::Config {
            keys: vec![host_key],
            inactivity_timeout: config.inactivity_timeout,
            auth_rejection_time: AUTH_REJECTION_TIME,
            auth_rejection_time_initial: Some(Duration::ZERO),
            ..Default::default()
        };

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Transport(format!("failed to bind {addr}: {e}")))?;

        Ok(Self { listener, ssh_config: Arc::new(ssh_config), inference: Arc::new(inference) })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the server, accepting connections until the process exits.
    ///
    /// A failing connection never stops the loop.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server starting on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let config = Arc::clone(&self.ssh_config);
                    let inference = Arc::clone(&self.inference);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, config, inference).await {
                            tracing::warn!(%peer, "Connection error: {}", e);
                        }
                    });
                },
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                },
            }
        }
    }
}

/// Run the SSH protocol on one accepted TCP connection.
async fn handle_connection<I: Inference>(
    stream: TcpStream,
    peer: SocketAddr,
    config: Arc<russh::server::Config>,
    inference: Arc<I>,
) -> Result<(), ServerError> {
    let connection_id = {
        let mut buf = [0u8; 8];
        getrandom::fill(&mut buf)
            .map_err(|e| ServerError::Internal(format!("failed to generate connection id: {e}")))?;
        u64::from_le_bytes(buf)
    };

    tracing::info!(connection_id, %peer, "New connection");

    let handler = ConnectionHandler::new(connection_id, Some(peer), inference);
    russh::server::run_stream(config, stream, handler).await?.await?;

    tracing::info!(connection_id, "Connection closed");
    Ok(())
}
