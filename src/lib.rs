//! cyclops-shell library crate.
//!
//! This library provides the pieces behind the `cyclops-shell` binary:
//! - The session bridge between a terminal and a pod exec endpoint
//! - The exec wire protocol and WebSocket transport
//! - Terminal surfaces (local terminal and headless vt100 screen)
//! - Configuration and recent target persistence

pub mod bridge;
pub mod config;
pub mod event;
pub mod event_loop;
pub mod exec;
pub mod input;
pub mod logging;
pub mod recent;
pub mod surface;
