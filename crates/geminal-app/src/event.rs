//! Session input events.
//!
//! This module defines [`SessionEvent`], the complete set of inputs that drive
//! the [`crate::Session`] state machine.
//!
//! Events originate from three distinct sources:
//! - Terminal input decoded from the channel.
//! - Completion of the outstanding inference call.
//! - The transport going away.

use crate::{InferenceResult, KeyInput};

/// Events processed by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// The client will send no more input (SSH EOF).
    ///
    /// Output may still be delivered, so an outstanding request is allowed
    /// to finish before the session closes.
    InputClosed,

    /// The outstanding inference call finished.
    InferenceCompleted(InferenceResult),

    /// Channel closed or connection dropped. Nothing can be written anymore.
    Disconnected,
}
