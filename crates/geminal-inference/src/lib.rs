//! Gemini inference client.
//!
//! Implements [`geminal_app::Inference`] on top of the Gemini
//! `generateContent` REST endpoint. Each call is a single-turn conversation:
//! exactly one `user` message carrying the prompt, no history.
//!
//! # Components
//!
//! - [`InferenceConfig`]: endpoint and API key, built once at startup
//! - [`GeminiClient`]: reqwest-based client, one POST per prompt
//! - [`interpret_response`]: pure mapping from HTTP status and body to an
//!   [`geminal_app::InferenceResult`]

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod gemini;

pub use config::{API_KEY_ENV, DEFAULT_ENDPOINT, InferenceConfig};
pub use gemini::{API_KEY_HEADER, GeminiClient, NO_RESPONSE, interpret_response};
