//! Headless surface backed by a vt100 screen.

use anyhow::Result;

use super::TerminalSurface;

/// A terminal surface with no TTY behind it.
///
/// Writes are parsed into a [`vt100::Parser`] so callers can inspect the
/// rendered screen, and are also kept verbatim in write order.
pub struct VirtualSurface {
    parser: vt100::Parser,
    writes: Vec<String>,
    fits: usize,
    disposed: bool,
}

impl VirtualSurface {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            parser: vt100::Parser::new(rows, cols, 0),
            writes: Vec::new(),
            fits: 0,
            disposed: false,
        }
    }

    /// Every write, in order.
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    /// All writes joined together.
    pub fn output(&self) -> String {
        self.writes.concat()
    }

    /// Text currently visible on the screen.
    pub fn contents(&self) -> String {
        self.parser.screen().contents()
    }

    pub fn fit_count(&self) -> usize {
        self.fits
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for VirtualSurface {
    fn default() -> Self {
        Self::new(24, 80)
    }
}

impl TerminalSurface for VirtualSurface {
    fn write(&mut self, data: &str) -> Result<()> {
        self.parser.process(data.as_bytes());
        self.writes.push(data.to_string());
        Ok(())
    }

    fn fit(&mut self) -> Result<(u16, u16)> {
        self.fits += 1;
        let (rows, cols) = self.parser.screen().size();
        Ok((cols, rows))
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
