//! Host key loading.

use std::path::Path;

use russh::keys::PrivateKey;

use crate::ServerError;

/// Load the server's OpenSSH private key.
///
/// Called once at startup. A missing or unparsable key is fatal.
pub fn load_host_key(path: &Path) -> Result<PrivateKey, ServerError> {
    if !path.exists() {
        return Err(ServerError::HostKey {
            path: path.to_path_buf(),
            reason: format!(
                "not found (generate one with: ssh-keygen -t ed25519 -N '' -f {})",
                path.display()
            ),
        });
    }

    let key = russh::keys::load_secret_key(path, None)
        .map_err(|e| ServerError::HostKey { path: path.to_path_buf(), reason: e.to_string() })?;

    tracing::info!(path = %path.display(), "Loaded host key");
    Ok(key)
}
