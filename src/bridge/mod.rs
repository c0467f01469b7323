//! Session bridge between a terminal surface and an exec transport.
//!
//! This module provides:
//! - `SessionBridge` - the per-session state machine
//! - `LineBuffer` - local line editing with continuation
//! - `SessionState` - connection lifecycle states

pub mod line_buffer;
pub mod session;
pub mod state;

pub use line_buffer::{LineBuffer, ReturnOutcome};
pub use session::{SessionBridge, CONTINUATION_PROMPT, ERASE_SEQUENCE};
pub use state::SessionState;
