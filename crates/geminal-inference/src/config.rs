//! Inference client configuration.

use std::fmt;

/// Default text-generation endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Immutable configuration for [`crate::GeminiClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Full `generateContent` URL.
    pub endpoint: String,
    /// API key sent with every request.
    pub api_key: String,
}

impl InferenceConfig {
    /// Configuration for the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { endpoint: DEFAULT_ENDPOINT.to_string(), api_key: api_key.into() }
    }

    /// Override the endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let config = InferenceConfig::new("secret-key");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains(DEFAULT_ENDPOINT));
    }

    #[test]
    fn endpoint_override() {
        let config = InferenceConfig::new("k").with_endpoint("http://127.0.0.1:9/generate");
        assert_eq!(config.endpoint, "http://127.0.0.1:9/generate");
        assert_eq!(config.api_key, "k");
    }
}
