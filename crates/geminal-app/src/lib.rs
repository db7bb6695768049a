//! Session engine for Geminal
//!
//! Pure state machine and generic runtime for one interactive prompt session,
//! enabling deterministic simulation testing with the same code that runs
//! behind the SSH server.
//!
//! # Components
//!
//! - [`Session`]: state machine (input buffer, outstanding request, reply)
//! - [`render`]: pure projection of a Session onto screen text, with
//!   [`render_reply`] and [`render_closing`] for line-oriented clients
//! - [`InputDecoder`]: raw terminal bytes to [`KeyInput`]
//! - [`Inference`]: seam for the text-generation backend
//! - [`Driver`]: trait for transport-specific I/O
//! - [`Runtime`]: generic event loop using Driver and Inference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod driver;
mod event;
mod inference;
mod input;
mod render;
mod runtime;
mod session;
mod state;

pub use action::{EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_OK, SessionAction};
pub use driver::Driver;
pub use event::SessionEvent;
pub use inference::{Inference, InferenceError, InferenceResult};
pub use input::{InputDecoder, KeyInput};
pub use render::{BANNER, PROMPT_MARKER, render, render_closing, render_reply};
pub use runtime::{Runtime, SessionOutcome};
pub use session::Session;
pub use state::{Phase, Prompt};
