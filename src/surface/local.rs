//! Surface backed by the local terminal.

use std::io::{self, Stdout, Write};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode},
};

use super::TerminalSurface;

/// The user's terminal in raw mode.
///
/// Raw mode and bracketed paste are switched on in [`CrosstermSurface::new`]
/// and restored by `dispose`, which also runs on drop.
pub struct CrosstermSurface {
    stdout: Stdout,
    disposed: bool,
}

impl CrosstermSurface {
    pub fn new() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode - are you in a terminal?")?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnableBracketedPaste) {
            let _ = disable_raw_mode();
            return Err(e).context("Failed to setup terminal");
        }
        Ok(Self {
            stdout,
            disposed: false,
        })
    }
}

impl TerminalSurface for CrosstermSurface {
    fn write(&mut self, data: &str) -> Result<()> {
        self.stdout
            .write_all(data.as_bytes())
            .context("Failed to write to terminal")?;
        self.stdout.flush().context("Failed to flush terminal")?;
        Ok(())
    }

    fn fit(&mut self) -> Result<(u16, u16)> {
        terminal::size().context("Failed to get terminal size")
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        // Always try to restore, even if one step fails
        if let Err(e) = execute!(self.stdout, DisableBracketedPaste) {
            tracing::warn!("Failed to disable bracketed paste: {}", e);
        }
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("Failed to disable raw mode: {}", e);
        }
        let _ = self.stdout.write_all(b"\r\n");
        let _ = self.stdout.flush();
    }
}

impl Drop for CrosstermSurface {
    fn drop(&mut self) {
        self.dispose();
    }
}
