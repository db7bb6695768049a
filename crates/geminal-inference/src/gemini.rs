//! Gemini `generateContent` client.
//!
//! One POST per prompt. No retries, no caching, and no client-side timeout:
//! callers that need resilience wrap the client.

use geminal_app::{Inference, InferenceError, InferenceResult, Prompt};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::InferenceConfig;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Text returned for a well-formed response without candidates.
pub const NO_RESPONSE: &str = "(no response)";

const USER_ROLE: &str = "user";

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    /// Single-turn conversation: one user message, no history.
    fn single_turn(prompt: &'a str) -> Self {
        Self { contents: [Content { role: USER_ROLE, parts: [Part { text: prompt }] }] }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Map an HTTP status and body to the inference outcome.
///
/// Any status other than 200 is [`InferenceError::Status`] carrying the body
/// verbatim. A 200 body that is not a `generateContent` response is
/// [`InferenceError::Decode`]. A well-formed response without candidates (or
/// without parts) is the text [`NO_RESPONSE`], not an error.
pub fn interpret_response(status: u16, body: &str) -> InferenceResult {
    if status != 200 {
        return Err(InferenceError::Status { code: status, body: body.to_string() });
    }

    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::Decode(e.to_string()))?;

    Ok(response.into_first_text().unwrap_or_else(|| NO_RESPONSE.to_string()))
}

/// Gemini client.
///
/// Cheap to share: wrap in an `Arc` and hand to every session.
pub struct GeminiClient {
    http: reqwest::Client,
    config: InferenceConfig,
}

impl GeminiClient {
    /// Create a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::Transport`] if the HTTP client cannot be
    /// initialized (e.g. TLS backend failure).
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| InferenceError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn generate(&self, prompt: &str) -> InferenceResult {
        let body = serde_json::to_vec(&GenerateContentRequest::single_turn(prompt))
            .map_err(|e| InferenceError::Decode(format!("failed to encode request: {e}")))?;

        let response = self
            .http
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.config.api_key)
            .body(body)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| InferenceError::Transport(e.to_string()))?;

        tracing::debug!(status, body_len = text.len(), "generateContent response");
        interpret_response(status, &text)
    }
}

impl Inference for GeminiClient {
    async fn query(&self, prompt: Prompt) -> InferenceResult {
        let result = self.generate(prompt.as_str()).await;
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "inference call failed");
        }
        result
    }
}
