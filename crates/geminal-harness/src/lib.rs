//! Simulation harness for Geminal session testing.
//!
//! Runs the production [`geminal_app::Runtime`] against in-memory I/O:
//!
//! - [`SimDriver`] / [`SimHandle`]: scripted terminal input, recorded frames
//! - [`MockInference`]: scripted replies, optionally held back until the test
//!   releases them through a [`ReplyGate`]
//!
//! Both sides also record the facts session invariants are stated over:
//! writes after close, and the number of concurrently outstanding calls.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod mock_inference;
pub mod sim_driver;

pub use mock_inference::{MockInference, ReplyGate};
pub use sim_driver::{SimDriver, SimDriverError, SimHandle, sim_session};
