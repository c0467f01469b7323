//! The session bridge: one terminal surface attached to one exec transport.
//!
//! All state changes happen in [`SessionBridge::handle`], one event at a time.
//! Keystrokes are edited locally and submitted per line; backend output is
//! written to the surface in arrival order. Teardown runs exactly once and
//! after it every event is ignored.

use anyhow::Result;
use tracing::{debug, info, warn};
use url::Url;

use super::line_buffer::{LineBuffer, ReturnOutcome};
use super::state::SessionState;
use crate::config::Banners;
use crate::event::BridgeEvent;
use crate::exec::protocol::{decode_output, ExecTarget, InboundFrame, OutboundCommand};
use crate::exec::transport::Transport;
use crate::input::{ArrowKey, KeyInput};
use crate::surface::TerminalSurface;

/// Echoed when a line ends with a continuation backslash
pub const CONTINUATION_PROMPT: &str = "\r\n> ";

/// Echoed to visually erase the last character
pub const ERASE_SEQUENCE: &str = "\x08 \x08";

/// Owns one exec attachment from mount to teardown.
pub struct SessionBridge<T: Transport, S: TerminalSurface> {
    target: ExecTarget,
    endpoint: Url,
    transport: T,
    surface: S,
    banners: Banners,
    state: SessionState,
    buffer: LineBuffer,
    torn_down: bool,
}

impl<T: Transport, S: TerminalSurface> SessionBridge<T, S> {
    pub fn new(target: ExecTarget, endpoint: Url, transport: T, surface: S, banners: Banners) -> Self {
        Self {
            target,
            endpoint,
            transport,
            surface,
            banners,
            state: SessionState::Idle,
            buffer: LineBuffer::new(),
            torn_down: false,
        }
    }

    pub fn target(&self) -> &ExecTarget {
        &self.target
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Input typed since the last submitted line
    pub fn buffer(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Start connecting. Only the first call on an idle session has an effect.
    pub fn mount(&mut self) -> Result<()> {
        if self.torn_down || self.state != SessionState::Idle {
            return Ok(());
        }

        info!(exec = %self.target, endpoint = %self.endpoint, "opening exec session");
        self.state = SessionState::Connecting;

        if let Err(e) = self.transport.open(&self.endpoint) {
            warn!("failed to open exec transport: {:#}", e);
            return self.on_error(&format!("{:#}", e));
        }
        Ok(())
    }

    /// Apply one event. Errors are surface write failures only.
    pub fn handle(&mut self, event: BridgeEvent) -> Result<()> {
        if self.torn_down {
            debug!(?event, "ignoring event after teardown");
            return Ok(());
        }

        match event {
            BridgeEvent::Key(KeyInput::Arrow(arrow)) => self.on_arrow(arrow),
            BridgeEvent::Key(KeyInput::Data(data)) => self.on_data(&data),
            BridgeEvent::TransportOpen => self.on_open(),
            BridgeEvent::TransportMessage(frame) => self.on_message(&frame),
            BridgeEvent::TransportError(detail) => self.on_error(&detail),
            BridgeEvent::TransportClose => self.on_close(),
            BridgeEvent::Teardown => {
                self.teardown();
                Ok(())
            }
        }
    }

    /// Close the transport and release the surface. Runs at most once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        info!(exec = %self.target, state = self.state.display_name(), "tearing down exec session");
        self.state = SessionState::Closed;
        self.transport.close();
        self.surface.dispose();
    }

    fn on_arrow(&mut self, arrow: ArrowKey) -> Result<()> {
        let sequence = arrow.escape_sequence();
        self.surface.write(sequence)?;
        self.buffer.push_str(sequence);
        Ok(())
    }

    fn on_data(&mut self, data: &str) -> Result<()> {
        match data {
            "" => Ok(()),
            "\r" => self.on_return(),
            "\x7f" | "\x08" => self.on_backspace(),
            _ => {
                if let Some(control) = single_control_char(data) {
                    return self.send_command(OutboundCommand::new(control));
                }
                // Editing keys and Alt chords are for the remote line editor
                if is_escape_sequence(data) {
                    return self.send_command(OutboundCommand::new(data));
                }
                self.buffer.push_str(data);
                self.surface.write(data)
            }
        }
    }

    fn on_return(&mut self) -> Result<()> {
        match self.buffer.take_return() {
            ReturnOutcome::Continue => self.surface.write(CONTINUATION_PROMPT),
            ReturnOutcome::Submit(line) => {
                self.surface.write("\r\n")?;
                self.send_command(OutboundCommand::new(line))
            }
        }
    }

    fn on_backspace(&mut self) -> Result<()> {
        if self.buffer.pop().is_some() {
            self.surface.write(ERASE_SEQUENCE)?;
        }
        Ok(())
    }

    /// Send if the session is live and the transport open; otherwise report
    /// and drop the command.
    fn send_command(&mut self, command: OutboundCommand) -> Result<()> {
        if self.state.is_closed() || !self.transport.is_open() {
            debug!(command = ?command.command, "dropping command while disconnected");
            let banner = self.banners.not_connected.clone();
            return self.banner(&banner);
        }

        if let Err(e) = self.transport.send(command) {
            warn!("failed to queue exec command: {:#}", e);
            let banner = format!("{}: {:#}", self.banners.error, e);
            return self.banner(&banner);
        }
        Ok(())
    }

    fn on_open(&mut self) -> Result<()> {
        self.state = SessionState::Connected { degraded: false };

        match self.surface.fit() {
            Ok((cols, rows)) => debug!(cols, rows, "fit terminal surface"),
            Err(e) => warn!("failed to fit terminal surface: {:#}", e),
        }

        info!(exec = %self.target, "exec session connected");
        let banner = self.banners.connected.clone();
        self.banner(&banner)
    }

    fn on_message(&mut self, frame: &InboundFrame) -> Result<()> {
        if self.state.is_closed() {
            debug!("dropping message received after close");
            return Ok(());
        }

        match decode_output(frame) {
            Ok(output) => self.surface.write(&output),
            Err(e) => {
                warn!("dropping undecodable exec message: {:#}", e);
                Ok(())
            }
        }
    }

    fn on_error(&mut self, detail: &str) -> Result<()> {
        warn!(exec = %self.target, "exec transport error: {}", detail);
        if self.state.is_closed() {
            return Ok(());
        }
        self.state = self.state.after_error();
        let banner = format!("{}: {}", self.banners.error, detail);
        self.banner(&banner)
    }

    fn on_close(&mut self) -> Result<()> {
        if self.state.is_closed() {
            return Ok(());
        }
        info!(exec = %self.target, "exec session closed by backend");
        self.state = SessionState::Closed;
        let banner = self.banners.disconnected.clone();
        self.banner(&banner)
    }

    fn banner(&mut self, text: &str) -> Result<()> {
        self.surface.write(&format!("\r\n{}\r\n", text))
    }
}

impl<T: Transport, S: TerminalSurface> Drop for SessionBridge<T, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Multi-character data led by ESC, such as `\x1b[3~` or an Alt chord.
fn is_escape_sequence(data: &str) -> bool {
    data.len() > 1 && data.starts_with('\x1b')
}

/// The character, if `data` is exactly one character below code point 32.
fn single_control_char(data: &str) -> Option<char> {
    let mut chars = data.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if (c as u32) < 32 => Some(c),
        _ => None,
    }
}
