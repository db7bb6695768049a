//! Inference seam.
//!
//! The session engine only knows that a [`Prompt`] goes out and exactly one
//! [`InferenceResult`] comes back. Concrete clients (the Gemini HTTP client,
//! simulation mocks) implement [`Inference`].

use std::future::Future;

use thiserror::Error;

use crate::Prompt;

/// Failure of a single inference call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// Remote service answered with a non-success status.
    #[error("HTTP {code}: {body}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Request could not be delivered or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Outcome of one inference call: generated text or the failure.
pub type InferenceResult = Result<String, InferenceError>;

/// Single-turn text generation.
///
/// Implementations perform one outbound call per invocation, with no retries
/// and no caching. The runtime shares the client behind an `Arc` and polls
/// each call on its own task.
pub trait Inference: Send + Sync + 'static {
    /// Generate a response for `prompt`.
    fn query(&self, prompt: Prompt) -> impl Future<Output = InferenceResult> + Send;
}
