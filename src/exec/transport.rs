//! Transport to the backend exec endpoint.
//!
//! The WebSocket lives on its own I/O thread. The thread connects, reads
//! frames into the bridge's event channel, and drains an outbound queue of
//! commands. The bridge never blocks on the network: `open` returns as soon
//! as the thread is spawned and `send` only enqueues.

use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info, warn};
use tungstenite::{Error as WsError, Message, WebSocket};
use url::Url;

use super::protocol::{InboundFrame, OutboundCommand};
use crate::event::BridgeEvent;

/// How long a read waits before the I/O thread checks its outbound queue.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Reads spent finishing a close handshake, one `POLL_INTERVAL` each.
const CLOSE_DRAIN_READS: usize = 50;

/// A message-oriented channel to an exec endpoint.
///
/// Lifecycle events (open, message, error, close) are delivered
/// asynchronously as [`BridgeEvent`]s, not returned from these calls.
pub trait Transport {
    /// Start connecting. Completion is reported as an event.
    fn open(&mut self, endpoint: &Url) -> Result<()>;

    /// Whether the channel is currently open for sending.
    fn is_open(&self) -> bool;

    /// Queue a command. Does not wait for delivery.
    fn send(&mut self, command: OutboundCommand) -> Result<()>;

    /// Close the channel. Safe to call more than once.
    fn close(&mut self);
}

/// Requests from the transport handle to its I/O thread.
enum Outgoing {
    Command(OutboundCommand),
    Close,
}

/// WebSocket transport with a dedicated I/O thread.
pub struct WebSocketTransport {
    events: Sender<BridgeEvent>,
    connect_timeout: Duration,
    outbound: Option<Sender<Outgoing>>,
    /// Set by the I/O thread once the handshake completes, cleared on close
    open: Arc<AtomicBool>,
    _io_thread: Option<thread::JoinHandle<()>>,
}

impl WebSocketTransport {
    pub fn new(events: Sender<BridgeEvent>, connect_timeout: Duration) -> Self {
        Self {
            events,
            connect_timeout,
            outbound: None,
            open: Arc::new(AtomicBool::new(false)),
            _io_thread: None,
        }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, endpoint: &Url) -> Result<()> {
        if self.outbound.is_some() {
            bail!("Transport already opened");
        }

        let (outbound_tx, outbound_rx) = mpsc::channel();
        let events = self.events.clone();
        let open = Arc::clone(&self.open);
        let endpoint = endpoint.clone();
        let connect_timeout = self.connect_timeout;

        let handle = thread::Builder::new()
            .name("exec-transport".to_string())
            .spawn(move || run_io_thread(&endpoint, connect_timeout, &outbound_rx, &events, &open))
            .context("Failed to spawn transport thread")?;

        self.outbound = Some(outbound_tx);
        self._io_thread = Some(handle);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&mut self, command: OutboundCommand) -> Result<()> {
        let outbound = self
            .outbound
            .as_ref()
            .context("Transport was never opened")?;
        outbound
            .send(Outgoing::Command(command))
            .map_err(|_| anyhow!("Transport thread has stopped"))
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        if let Some(outbound) = self.outbound.take() {
            // The thread may already be gone if the remote closed first
            let _ = outbound.send(Outgoing::Close);
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_io_thread(
    endpoint: &Url,
    connect_timeout: Duration,
    outbound: &Receiver<Outgoing>,
    events: &Sender<BridgeEvent>,
    open: &AtomicBool,
) {
    let (mut socket, control) = match connect(endpoint, connect_timeout) {
        Ok(connected) => connected,
        Err(e) => {
            warn!(%endpoint, "exec connection failed: {:#}", e);
            let _ = events.send(BridgeEvent::TransportError(format!("{:#}", e)));
            let _ = events.send(BridgeEvent::TransportClose);
            return;
        }
    };

    info!(%endpoint, "exec transport open");
    open.store(true, Ordering::SeqCst);
    if events.send(BridgeEvent::TransportOpen).is_err() {
        let _ = socket.close(None);
        return;
    }

    let remote_closed = pump(&mut socket, outbound, events);

    open.store(false, Ordering::SeqCst);
    let _ = control.shutdown(Shutdown::Both);
    if remote_closed {
        let _ = events.send(BridgeEvent::TransportClose);
    }
    debug!(%endpoint, "exec transport thread finished");
}

type ExecSocket = WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>>;

/// Resolve, connect with a timeout, and run the WebSocket handshake.
///
/// Also returns a clone of the TCP stream so the caller can adjust timeouts
/// and shut the socket down regardless of TLS wrapping.
fn connect(endpoint: &Url, timeout: Duration) -> Result<(ExecSocket, TcpStream)> {
    let addrs = endpoint
        .socket_addrs(|| None)
        .with_context(|| format!("Failed to resolve {}", endpoint))?;

    let mut last_err = None;
    let mut stream = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(e) => last_err = Some(e),
        }
    }
    let stream = match (stream, last_err) {
        (Some(stream), _) => stream,
        (None, Some(e)) => {
            return Err(e).with_context(|| format!("Failed to connect to {}", endpoint))
        }
        (None, None) => bail!("No addresses found for {}", endpoint),
    };

    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    let control = stream.try_clone().context("Failed to clone TCP stream")?;

    let (socket, response) = tungstenite::client_tls(endpoint.as_str(), stream)
        .map_err(|e| anyhow!("WebSocket handshake failed: {}", e))?;
    debug!(status = %response.status(), "exec handshake complete");

    // Short read timeout from here on so the loop can service outbound sends
    control.set_read_timeout(Some(POLL_INTERVAL))?;

    Ok((socket, control))
}

/// Shuttle frames until either side closes.
///
/// Returns true if the remote end (or a failure) ended the session, false if
/// the local side asked to close.
fn pump(socket: &mut ExecSocket, outbound: &Receiver<Outgoing>, events: &Sender<BridgeEvent>) -> bool {
    loop {
        // Drain queued commands first so typing isn't delayed by reads
        loop {
            match outbound.try_recv() {
                Ok(Outgoing::Command(command)) => {
                    if let Err(e) = send_command(socket, &command) {
                        warn!("exec send failed: {:#}", e);
                        let _ = events.send(BridgeEvent::TransportError(format!("{:#}", e)));
                        return true;
                    }
                }
                Ok(Outgoing::Close) | Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    finish_close(socket);
                    return false;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                let frame = InboundFrame::Text(text.to_string());
                if events.send(BridgeEvent::TransportMessage(frame)).is_err() {
                    return false;
                }
            }
            Ok(Message::Binary(bytes)) => {
                let frame = InboundFrame::Binary(bytes.to_vec());
                if events.send(BridgeEvent::TransportMessage(frame)).is_err() {
                    return false;
                }
            }
            Ok(Message::Close(frame)) => {
                debug!(?frame, "exec endpoint sent close");
                finish_close(socket);
                return true;
            }
            // Pongs are queued by tungstenite and flushed on the next write
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
            Err(WsError::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                if let Err(e) = socket.flush() {
                    if !matches!(e, WsError::Io(ref err) if err.kind() == io::ErrorKind::WouldBlock) {
                        let _ = events.send(BridgeEvent::TransportError(e.to_string()));
                        return true;
                    }
                }
            }
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return true,
            Err(e) => {
                warn!("exec read failed: {}", e);
                let _ = events.send(BridgeEvent::TransportError(e.to_string()));
                return true;
            }
        }
    }
}

/// Drive a started close handshake to the end.
///
/// tungstenite queues the close reply (or waits for the peer's) and only
/// moves it on later reads, so keep reading until the connection reports
/// closed or the drain budget runs out.
fn finish_close(socket: &mut ExecSocket) {
    for _ in 0..CLOSE_DRAIN_READS {
        match socket.read() {
            Ok(_) => {}
            Err(WsError::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                let _ = socket.flush();
            }
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return,
            Err(e) => {
                debug!("close handshake ended early: {}", e);
                return;
            }
        }
    }
    debug!("close handshake did not finish in time");
}

fn send_command(socket: &mut ExecSocket, command: &OutboundCommand) -> Result<()> {
    let json = command.to_json()?;
    socket
        .send(Message::text(json))
        .context("Failed to send exec command")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_before_open_fails() {
        let (tx, _rx) = mpsc::channel();
        let mut transport = WebSocketTransport::new(tx, Duration::from_secs(1));
        assert!(!transport.is_open());
        assert!(transport.send(OutboundCommand::new("ls")).is_err());
    }

    #[test]
    fn close_is_idempotent_and_clears_open_flag() {
        let (tx, _rx) = mpsc::channel();
        let mut transport = WebSocketTransport::new(tx, Duration::from_secs(1));
        transport.close();
        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn unreachable_endpoint_reports_error_then_close() {
        // Bind then drop a listener to get a port nothing is listening on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = Url::parse(&format!("ws://127.0.0.1:{}/exec/ns/pod/c", port)).unwrap();

        let (tx, rx) = mpsc::channel();
        let mut transport = WebSocketTransport::new(tx, Duration::from_secs(2));
        transport.open(&endpoint).unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, BridgeEvent::TransportError(_)));
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second, BridgeEvent::TransportClose);
        assert!(!transport.is_open());
    }

    #[test]
    fn opening_twice_is_rejected() {
        let (tx, _rx) = mpsc::channel();
        let mut transport = WebSocketTransport::new(tx, Duration::from_millis(100));
        let endpoint = Url::parse("ws://127.0.0.1:9/exec/ns/pod/c").unwrap();
        transport.open(&endpoint).unwrap();
        assert!(transport.open(&endpoint).is_err());
    }
}
