//! Exec endpoint access: wire protocol and WebSocket transport.
//!
//! The backend owns the container PTY. This side only frames commands,
//! decodes output, and keeps one socket alive per session.

pub mod protocol;
pub mod transport;

pub use protocol::{decode_output, websocket_base, ExecTarget, InboundFrame, OutboundCommand};
pub use transport::{Transport, WebSocketTransport};
