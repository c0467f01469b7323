//! Terminal surfaces the session bridge renders into.
//!
//! The bridge only needs three capabilities from a surface:
//! - `write` text (remote output, local echo, banners)
//! - `fit` itself to the space it is shown in
//! - `dispose` of whatever it holds
//!
//! Keystrokes travel the other way as [`crate::event::BridgeEvent::Key`]
//! events, so surfaces never call into the bridge.

pub mod local;
pub mod virtual_screen;

pub use local::CrosstermSurface;
pub use virtual_screen::VirtualSurface;

use anyhow::Result;

/// Output side of a terminal the bridge owns.
pub trait TerminalSurface {
    /// Render text verbatim.
    fn write(&mut self, data: &str) -> Result<()>;

    /// Fit to the available space. Returns `(cols, rows)`.
    fn fit(&mut self) -> Result<(u16, u16)>;

    /// Release the surface. Must tolerate being called more than once.
    fn dispose(&mut self);
}
