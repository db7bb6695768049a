//! Server error types.

use std::path::PathBuf;

use geminal_app::InferenceError;
use thiserror::Error;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error (invalid bind address, missing API key, etc.).
    ///
    /// These are fatal errors that prevent server startup. Fix configuration
    /// and restart.
    #[error("configuration error: {0}")]
    Config(String),

    /// Host key missing or unreadable.
    ///
    /// Fatal at startup: the server cannot identify itself without it.
    #[error("host key '{}': {reason}", path.display())]
    HostKey {
        /// Path the key was loaded from.
        path: PathBuf,
        /// Why loading failed.
        reason: String,
    },

    /// Transport/network error (bind failure, accept failure, I/O error).
    ///
    /// Fatal when binding; scoped to one connection otherwise.
    #[error("transport error: {0}")]
    Transport(String),

    /// SSH protocol error on one connection (handshake, channel failure).
    ///
    /// Scoped to that connection. Other sessions are unaffected.
    #[error("ssh error: {0}")]
    Ssh(#[from] russh::Error),

    /// Inference client could not be constructed.
    #[error("inference client error: {0}")]
    Inference(#[from] InferenceError),

    /// Internal error (unexpected state, OS failure).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
