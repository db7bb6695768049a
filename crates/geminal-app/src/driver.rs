//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the session runtime from specific I/O
//! implementations. Each transport implements the trait to provide its own
//! input and output, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use crate::{Session, SessionEvent};

/// Abstracts terminal I/O for one session.
///
/// Implementations provide transport-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs over SSH and in simulation.
///
/// # Implementations
///
/// - **SSH**: input forwarded from the connection handler, output written to
///   the channel through a russh handle
/// - **Simulation**: scripted input, recorded output
pub trait Driver: Send {
    /// Transport-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input event.
    ///
    /// Returns `None` once the input side is gone for good (channel closed,
    /// connection dropped). Must be cancel-safe: the runtime polls it inside
    /// `tokio::select!` alongside the inference call.
    fn poll_event(&mut self) -> impl Future<Output = Option<SessionEvent>> + Send;

    /// Render the session state.
    ///
    /// # Errors
    ///
    /// Returns an error if the output side is closed or the write fails.
    fn render(&mut self, session: &Session) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Report the exit status and close the output side.
    ///
    /// # Errors
    ///
    /// Returns an error if the output side is already closed.
    fn close(&mut self, exit_status: u32) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
