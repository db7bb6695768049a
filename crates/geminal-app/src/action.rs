//! Session side-effects.
//!
//! This module defines the [`SessionAction`] enum, which represents
//! instructions produced by the [`crate::Session`] state machine for the
//! runtime to execute.

use crate::Prompt;

/// Exit status reported when the session ends normally.
pub const EXIT_OK: u32 = 0;

/// Exit status reported when the inference call failed.
pub const EXIT_FAILURE: u32 = 1;

/// Exit status reported when the user interrupted the session (128 + SIGINT).
pub const EXIT_INTERRUPTED: u32 = 130;

/// Actions produced by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Re-render the session view.
    Render,

    /// Start an inference call for this prompt.
    Submit {
        /// Validated prompt text.
        prompt: Prompt,
    },

    /// Report the exit status and close the channel.
    Close {
        /// Exit status sent to the client.
        exit_status: u32,
    },
}
