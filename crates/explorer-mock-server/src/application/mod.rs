//! Application layer for explorer-mock-server.
//!
//! - **`responder`** – decides what (if anything) to answer for one inbound
//!   text frame.  Pure function; the server adds the delay and the I/O.

pub mod responder;

pub use responder::{respond, ServerError};
