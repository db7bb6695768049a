//! Session state machine.
//!
//! This module defines the [`Session`] state machine, which manages one
//! interactive prompt session completely decoupled from I/O and from the
//! inference backend.
//!
//! This is a pure state machine: it consumes [`crate::SessionEvent`] inputs
//! and produces [`crate::SessionAction`] instructions for the runtime to
//! execute.
//!
//! # Responsibilities
//!
//! - Owns the live input buffer and the last generated output.
//! - Enforces a single outstanding request: input is frozen while pending.
//! - Decides when the session ends and with which exit status.

use crate::{
    InferenceError, InferenceResult, KeyInput, Phase, Prompt, SessionAction, SessionEvent,
    action::{EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_OK},
};

/// Session state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Live input buffer.
    buffer: String,
    /// Text of the last successful reply.
    last_output: Option<String>,
    /// Outstanding prompt. `Some` exactly while a request is in flight.
    pending: Option<Prompt>,
    /// Failure that closed the session.
    terminal_error: Option<InferenceError>,
    /// No further transitions once set.
    closed: bool,
    /// Input side ended while a request was in flight.
    close_after_reply: bool,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        if self.closed {
            tracing::trace!(?event, "session closed, ignoring event");
            return vec![];
        }

        match event {
            SessionEvent::Key(key) => self.handle_key(key),
            SessionEvent::InputClosed => self.input_closed(),
            SessionEvent::InferenceCompleted(result) => self.complete(result),
            SessionEvent::Disconnected => {
                self.closed = true;
                vec![]
            },
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<SessionAction> {
        match key {
            KeyInput::Interrupt => {
                self.closed = true;
                vec![SessionAction::Render, SessionAction::Close { exit_status: EXIT_INTERRUPTED }]
            },
            KeyInput::EndOfInput => self.input_closed(),

            // Input is frozen while a request is outstanding
            KeyInput::Char(_) | KeyInput::Backspace | KeyInput::Enter if self.pending.is_some() => {
                vec![]
            },

            KeyInput::Char(c) => {
                self.buffer.push(c);
                vec![SessionAction::Render]
            },
            KeyInput::Backspace => match self.buffer.pop() {
                Some(_) => vec![SessionAction::Render],
                None => vec![],
            },
            KeyInput::Enter => self.submit(),
        }
    }

    fn submit(&mut self) -> Vec<SessionAction> {
        let Some(prompt) = Prompt::new(&self.buffer) else {
            return vec![];
        };

        self.buffer.clear();
        self.pending = Some(prompt.clone());
        vec![SessionAction::Submit { prompt }, SessionAction::Render]
    }

    fn input_closed(&mut self) -> Vec<SessionAction> {
        if self.pending.is_some() {
            self.close_after_reply = true;
            return vec![];
        }

        self.closed = true;
        vec![SessionAction::Render, SessionAction::Close { exit_status: EXIT_OK }]
    }

    fn complete(&mut self, result: InferenceResult) -> Vec<SessionAction> {
        if self.pending.take().is_none() {
            tracing::trace!("inference completion with no request outstanding");
            return vec![];
        }

        match result {
            Ok(text) => {
                self.last_output = Some(text);
                if self.close_after_reply {
                    self.closed = true;
                    vec![SessionAction::Render, SessionAction::Close { exit_status: EXIT_OK }]
                } else {
                    vec![SessionAction::Render]
                }
            },
            Err(err) => {
                tracing::debug!(error = %err, "inference failed, closing session");
                self.terminal_error = Some(err);
                self.closed = true;
                vec![SessionAction::Render, SessionAction::Close { exit_status: EXIT_FAILURE }]
            },
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        if self.closed {
            Phase::Closed
        } else if self.pending.is_some() {
            Phase::Pending
        } else if self.buffer.is_empty() {
            Phase::Idle
        } else {
            Phase::Editing
        }
    }

    /// Live input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Text of the last successful reply. `None` before the first reply.
    pub fn last_output(&self) -> Option<&str> {
        self.last_output.as_deref()
    }

    /// Prompt of the outstanding request. `None` if nothing is in flight.
    pub fn pending_prompt(&self) -> Option<&Prompt> {
        self.pending.as_ref()
    }

    /// Failure that closed the session. `None` if no request failed.
    pub fn terminal_error(&self) -> Option<&InferenceError> {
        self.terminal_error.as_ref()
    }

    /// Whether the session accepts no further transitions.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the session will close once the outstanding reply lands.
    pub fn closes_after_reply(&self) -> bool {
        self.close_after_reply
    }
}
