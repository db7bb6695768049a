//! Generic runtime for session orchestration.
//!
//! The Runtime drives one session's event loop, coordinating between:
//! - [`Session`]: the pure state machine
//! - [`Driver`]: transport-specific I/O
//! - [`Inference`]: the text-generation backend
//!
//! Terminal input and the outstanding inference call are multiplexed with
//! `tokio::select!` into one serialized stream of [`SessionEvent`]s, so the
//! state machine is never touched concurrently.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    Driver, Inference, InferenceError, InferenceResult, Prompt, Session, SessionAction,
    SessionEvent,
};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The session closed itself and reported an exit status.
    Closed {
        /// Exit status sent to the client.
        exit_status: u32,
    },
    /// The client went away. Nothing was reported.
    Disconnected,
}

/// Generic runtime that orchestrates Session, Driver, and Inference.
///
/// # Type Parameters
///
/// - `D`: transport-specific I/O driver
/// - `I`: inference backend
///
/// Inference calls run on their own task. If the runtime finishes while a
/// call is outstanding, only the join handle is dropped: the call runs to
/// completion and its result is discarded without touching the driver.
pub struct Runtime<D, I>
where
    D: Driver,
    I: Inference,
{
    driver: D,
    inference: Arc<I>,
    session: Session,
    in_flight: Option<JoinHandle<InferenceResult>>,
}

impl<D, I> Runtime<D, I>
where
    D: Driver,
    I: Inference,
{
    /// Create a runtime for a fresh session.
    pub fn new(driver: D, inference: Arc<I>) -> Self {
        Self { driver, inference, session: Session::new(), in_flight: None }
    }

    /// Run the session until it closes or the client disconnects.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to write to the client.
    pub async fn run(mut self) -> Result<SessionOutcome, D::Error> {
        self.driver.render(&self.session).await?;

        loop {
            let event = tokio::select! {
                maybe_event = self.driver.poll_event() => {
                    maybe_event.unwrap_or(SessionEvent::Disconnected)
                }
                result = wait_for_reply(&mut self.in_flight) => {
                    SessionEvent::InferenceCompleted(result)
                }
            };

            let actions = self.session.handle(event);
            if let Some(outcome) = self.process_actions(actions).await? {
                return Ok(outcome);
            }

            if self.session.is_closed() {
                tracing::debug!("session closed without exit status");
                return Ok(SessionOutcome::Disconnected);
            }
        }
    }

    /// Execute actions returned by the Session.
    ///
    /// Returns the outcome if the session asked to close.
    async fn process_actions(
        &mut self,
        actions: Vec<SessionAction>,
    ) -> Result<Option<SessionOutcome>, D::Error> {
        for action in actions {
            match action {
                SessionAction::Render => self.driver.render(&self.session).await?,
                SessionAction::Submit { prompt } => self.submit(prompt),
                SessionAction::Close { exit_status } => {
                    self.driver.close(exit_status).await?;
                    return Ok(Some(SessionOutcome::Closed { exit_status }));
                },
            }
        }
        Ok(None)
    }

    /// Spawn the inference call for `prompt`.
    fn submit(&mut self, prompt: Prompt) {
        tracing::debug!(prompt_chars = prompt.as_str().chars().count(), "submitting prompt");

        let inference = Arc::clone(&self.inference);
        self.in_flight = Some(tokio::spawn(async move { inference.query(prompt).await }));
    }

    /// Get a reference to the Session
    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// Wait for the outstanding call, or forever if there is none.
///
/// Cancel-safe: the join handle stays in place until the result is taken.
async fn wait_for_reply(in_flight: &mut Option<JoinHandle<InferenceResult>>) -> InferenceResult {
    let Some(handle) = in_flight.as_mut() else {
        return std::future::pending().await;
    };

    let result = handle.await.unwrap_or_else(|e| {
        tracing::warn!("inference task failed: {e}");
        Err(InferenceError::Transport(format!("inference task failed: {e}")))
    });
    *in_flight = None;
    result
}
