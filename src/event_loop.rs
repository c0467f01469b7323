use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{poll, read, Event};
use tracing::{debug, warn};
use url::Url;

use crate::bridge::SessionBridge;
use crate::config::Config;
use crate::event::BridgeEvent;
use crate::exec::{ExecTarget, Transport, WebSocketTransport};
use crate::input::{is_detach_key, key_event_to_input, KeyInput};
use crate::surface::{CrosstermSurface, TerminalSurface};

/// How long the keyboard thread waits for input before checking for shutdown
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why the session loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// User pressed the detach key
    Detached,
    /// Backend closed the session
    RemoteClosed,
    /// Every event producer went away
    ChannelClosed,
}

/// Attach the local terminal to `target` until the user detaches or the
/// backend closes the session.
pub fn run_session(config: &Config, target: ExecTarget, endpoint: Url) -> Result<SessionExit> {
    let (events_tx, events_rx) = mpsc::channel();

    let transport = WebSocketTransport::new(events_tx.clone(), config.connect_timeout());
    let surface = CrosstermSurface::new()?;
    let mut bridge = SessionBridge::new(target, endpoint, transport, surface, config.banners.clone());

    let stop = Arc::new(AtomicBool::new(false));
    let keyboard = spawn_keyboard_thread(events_tx, config.detach_key, Arc::clone(&stop))?;

    let result = bridge
        .mount()
        .and_then(|()| drive(&mut bridge, &events_rx, config.exit_on_close));

    // Teardown runs on every exit path, including errors from drive
    bridge.teardown();
    stop.store(true, Ordering::SeqCst);
    if keyboard.join().is_err() {
        warn!("keyboard thread panicked");
    }

    result
}

/// Feed events to the bridge one at a time until the session should end.
pub fn drive<T: Transport, S: TerminalSurface>(
    bridge: &mut SessionBridge<T, S>,
    events: &Receiver<BridgeEvent>,
    exit_on_close: bool,
) -> Result<SessionExit> {
    for event in events.iter() {
        let detach = event == BridgeEvent::Teardown;
        bridge.handle(event)?;

        if detach {
            return Ok(SessionExit::Detached);
        }
        if exit_on_close && bridge.state().is_closed() {
            return Ok(SessionExit::RemoteClosed);
        }
    }
    Ok(SessionExit::ChannelClosed)
}

fn spawn_keyboard_thread(
    events: Sender<BridgeEvent>,
    detach_key: char,
    stop: Arc<AtomicBool>,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("keyboard".to_string())
        .spawn(move || {
            if let Err(e) = pump_keyboard(&events, detach_key, &stop) {
                warn!("keyboard input stopped: {:#}", e);
                let _ = events.send(BridgeEvent::Teardown);
            }
        })
        .context("Failed to spawn keyboard thread")
}

fn pump_keyboard(events: &Sender<BridgeEvent>, detach_key: char, stop: &AtomicBool) -> Result<()> {
    while !stop.load(Ordering::SeqCst) {
        if !poll(KEY_POLL_INTERVAL)? {
            continue;
        }

        let event = match read()? {
            Event::Key(key) if is_detach_key(key, detach_key) => BridgeEvent::Teardown,
            Event::Key(key) => match key_event_to_input(key) {
                Some(input) => BridgeEvent::Key(input),
                None => continue,
            },
            Event::Paste(text) => BridgeEvent::Key(KeyInput::Data(text)),
            Event::Resize(cols, rows) => {
                debug!(cols, rows, "terminal resized");
                continue;
            }
            _ => continue,
        };

        if events.send(event).is_err() {
            break; // Session loop is gone
        }
    }
    Ok(())
}
