//! Scripted inference backend.
//!
//! Replies are consumed in call order. A reply is either ready immediately or
//! held back until the test releases it through its [`ReplyGate`], which is
//! how tests hold a session in the pending phase.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use geminal_app::{Inference, InferenceError, InferenceResult, Prompt};
use tokio::sync::{Notify, oneshot};

enum Reply {
    Ready(InferenceResult),
    Gated(oneshot::Receiver<InferenceResult>),
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<Reply>,
    calls: Vec<String>,
    in_flight: usize,
    max_in_flight: usize,
    completed: usize,
}

/// Releases one held-back reply.
pub struct ReplyGate(oneshot::Sender<InferenceResult>);

impl ReplyGate {
    /// Complete the gated call with `result`.
    ///
    /// Returns `false` if the call was never made and the mock is gone.
    pub fn release(self, result: InferenceResult) -> bool {
        self.0.send(result).is_ok()
    }
}

/// Inference backend with scripted replies.
///
/// A call with no scripted reply left fails with a transport error.
#[derive(Default)]
pub struct MockInference {
    state: Mutex<MockState>,
    changed: Notify,
}

impl MockInference {
    /// Create a mock with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply delivered as soon as it is requested.
    #[must_use]
    pub fn reply(self, result: InferenceResult) -> Self {
        self.lock().replies.push_back(Reply::Ready(result));
        self
    }

    /// Queue a reply held back until the returned gate is released.
    pub fn reply_later(&self) -> ReplyGate {
        let (tx, rx) = oneshot::channel();
        self.lock().replies.push_back(Reply::Gated(rx));
        ReplyGate(tx)
    }

    /// Prompts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Highest number of calls ever outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    /// Calls that have returned.
    pub fn completed(&self) -> usize {
        self.lock().completed
    }

    /// Wait until at least `n` calls have been made.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.changed.notified();
            let made = self.lock().calls.len();
            if made >= n {
                return;
            }
            notified.await;
        }
    }

    /// Wait until at least `n` calls have returned.
    pub async fn wait_for_completed(&self, n: usize) {
        loop {
            let notified = self.changed.notified();
            let completed = self.lock().completed;
            if completed >= n {
                return;
            }
            notified.await;
        }
    }
}

impl Inference for MockInference {
    async fn query(&self, prompt: Prompt) -> InferenceResult {
        tracing::debug!(prompt = prompt.as_str(), "mock inference call");

        let reply = {
            let mut state = self.lock();
            state.calls.push(prompt.into_string());
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.replies.pop_front()
        };
        self.changed.notify_waiters();

        let result = match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => rx.await.unwrap_or_else(|_| {
                Err(InferenceError::Transport("gated reply dropped".to_string()))
            }),
            None => Err(InferenceError::Transport("no scripted reply".to_string())),
        };

        {
            let mut state = self.lock();
            state.in_flight -= 1;
            state.completed += 1;
        }
        self.changed.notify_waiters();

        result
    }
}
