use crate::exec::protocol::InboundFrame;
use crate::input::KeyInput;

/// Everything a session bridge reacts to.
///
/// Keyboard and transport threads both feed the same channel, so the bridge
/// sees one event at a time in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Keystroke or pasted text from the terminal surface
    Key(KeyInput),
    /// Transport finished connecting
    TransportOpen,
    /// Frame received from the backend
    TransportMessage(InboundFrame),
    /// Transport reported an error; a close may or may not follow
    TransportError(String),
    /// Transport closed by the remote end or after a failure
    TransportClose,
    /// User asked to detach
    Teardown,
}
