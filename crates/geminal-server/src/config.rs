//! Server configuration.
//!
//! Built once at startup from CLI arguments and the environment, then passed
//! by value into [`crate::Server::bind`]. Nothing below this point reads the
//! environment.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use geminal_inference::{API_KEY_ENV, InferenceConfig};

use crate::ServerError;

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:2222";

/// Default host key location.
pub const DEFAULT_HOST_KEY_PATH: &str = "id_rsa";

/// Default idle time before a connection is dropped.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(3600);

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:2222")
    pub bind_address: String,
    /// Path to the OpenSSH host private key
    pub host_key_path: PathBuf,
    /// Idle connections are dropped after this long. `None` disables.
    pub inactivity_timeout: Option<Duration>,
    /// Inference client configuration
    pub inference: InferenceConfig,
}

impl ServerRuntimeConfig {
    /// Configuration with default address, key path, and timeout.
    pub fn new(inference: InferenceConfig) -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            host_key_path: PathBuf::from(DEFAULT_HOST_KEY_PATH),
            inactivity_timeout: Some(DEFAULT_INACTIVITY_TIMEOUT),
            inference,
        }
    }

    /// Parsed bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        self.bind_address.parse().map_err(|e| {
            ServerError::Config(format!("invalid bind address '{}': {e}", self.bind_address))
        })
    }
}

/// Validate the API key supplied at startup.
///
/// A missing or blank key is fatal: the server refuses to start rather than
/// failing every request.
pub fn require_api_key(api_key: Option<String>) -> Result<String, ServerError> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ServerError::Config(format!("{API_KEY_ENV} is not set"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_fatal() {
        assert!(matches!(require_api_key(None), Err(ServerError::Config(_))));
        assert!(matches!(require_api_key(Some("  ".into())), Err(ServerError::Config(_))));
    }

    #[test]
    fn api_key_is_trimmed() {
        assert_eq!(require_api_key(Some(" abc\n".into())).unwrap(), "abc");
    }

    #[test]
    fn defaults() {
        let config = ServerRuntimeConfig::new(InferenceConfig::new("k"));
        assert_eq!(config.socket_addr().unwrap().port(), 2222);
        assert_eq!(config.host_key_path, PathBuf::from("id_rsa"));
        assert_eq!(config.inactivity_timeout, Some(DEFAULT_INACTIVITY_TIMEOUT));
    }

    #[test]
    fn invalid_bind_address() {
        let mut config = ServerRuntimeConfig::new(InferenceConfig::new("k"));
        config.bind_address = "invalid:address:format".to_string();
        assert!(matches!(config.socket_addr(), Err(ServerError::Config(_))));
    }
}
