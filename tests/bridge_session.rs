mod common;

use common::{connected, mounted, type_keys};
use cyclops_shell::bridge::{SessionState, CONTINUATION_PROMPT, ERASE_SEQUENCE};
use cyclops_shell::config::Banners;
use cyclops_shell::event::BridgeEvent;
use cyclops_shell::exec::{InboundFrame, OutboundCommand};
use cyclops_shell::input::{ArrowKey, KeyInput};

fn message(text: &str) -> BridgeEvent {
    BridgeEvent::TransportMessage(InboundFrame::Text(text.to_string()))
}

#[test]
fn typed_line_is_submitted_trimmed_and_buffer_cleared() {
    let (mut bridge, log) = connected();

    type_keys(&mut bridge, "kubectl get pods   \r");

    assert_eq!(
        log.borrow().sent,
        vec![OutboundCommand::new("kubectl get pods")]
    );
    assert_eq!(bridge.buffer(), "");
}

#[test]
fn printable_keys_are_not_sent_before_return() {
    let (mut bridge, log) = connected();

    type_keys(&mut bridge, "echo hi");

    assert!(log.borrow().sent.is_empty());
    assert_eq!(bridge.buffer(), "echo hi");
    assert!(bridge.surface().contents().contains("echo hi"));
}

#[test]
fn trailing_backslash_continues_instead_of_submitting() {
    let (mut bridge, log) = connected();

    type_keys(&mut bridge, "foo\\\r");

    assert!(log.borrow().sent.is_empty());
    assert_eq!(bridge.buffer(), "foo ");
    assert!(bridge.surface().output().ends_with(CONTINUATION_PROMPT));
    assert!(bridge.surface().contents().contains("\n>"));
}

#[test]
fn continued_lines_submit_as_one_command() {
    let (mut bridge, log) = connected();

    type_keys(&mut bridge, "ls \\\r-la\r");

    assert_eq!(log.borrow().sent, vec![OutboundCommand::new("ls -la")]);
}

#[test]
fn backspace_removes_last_character_and_erases_once() {
    let (mut bridge, _log) = connected();
    type_keys(&mut bridge, "abc");
    let writes_before = bridge.surface().writes().len();

    bridge.handle(BridgeEvent::Key(KeyInput::data("\x7f"))).unwrap();

    assert_eq!(bridge.buffer(), "ab");
    let new_writes = &bridge.surface().writes()[writes_before..];
    assert_eq!(new_writes, [ERASE_SEQUENCE.to_string()]);
}

#[test]
fn submitting_while_disconnected_sends_nothing_and_shows_one_banner() {
    let (mut bridge, log) = mounted();

    type_keys(&mut bridge, "whoami\r");

    assert!(log.borrow().sent.is_empty());
    assert_eq!(bridge.buffer(), "");
    let banner = Banners::default().not_connected;
    assert_eq!(bridge.surface().output().matches(banner.as_str()).count(), 1);
}

#[test]
fn arrow_is_echoed_and_buffered_once() {
    let (mut bridge, log) = connected();
    let writes_before = bridge.surface().writes().len();

    bridge
        .handle(BridgeEvent::Key(KeyInput::Arrow(ArrowKey::Up)))
        .unwrap();

    assert_eq!(bridge.buffer(), "\x1b[A");
    assert_eq!(
        &bridge.surface().writes()[writes_before..],
        ["\x1b[A".to_string()]
    );
    assert!(log.borrow().sent.is_empty());
}

#[test]
fn control_characters_bypass_the_buffer() {
    let (mut bridge, log) = connected();
    type_keys(&mut bridge, "sleep 100");

    bridge.handle(BridgeEvent::Key(KeyInput::data("\x03"))).unwrap();

    assert_eq!(log.borrow().sent, vec![OutboundCommand::new("\x03")]);
    assert_eq!(bridge.buffer(), "sleep 100");
}

#[test]
fn pasted_text_is_buffered_as_a_whole() {
    let (mut bridge, log) = connected();

    bridge
        .handle(BridgeEvent::Key(KeyInput::data("cat /etc/hosts")))
        .unwrap();
    type_keys(&mut bridge, "\r");

    assert_eq!(log.borrow().sent, vec![OutboundCommand::new("cat /etc/hosts")]);
}

#[test]
fn json_output_is_written_verbatim() {
    let (mut bridge, _log) = connected();
    let writes_before = bridge.surface().writes().len();

    bridge.handle(message(r#"{"output":"hello"}"#)).unwrap();

    assert_eq!(
        &bridge.surface().writes()[writes_before..],
        ["hello".to_string()]
    );
}

#[test]
fn raw_text_output_is_written_and_order_is_kept() {
    let (mut bridge, _log) = connected();

    bridge.handle(message("first ")).unwrap();
    bridge.handle(message(r#"{"output":"second"}"#)).unwrap();
    bridge
        .handle(BridgeEvent::TransportMessage(InboundFrame::Binary(b" third".to_vec())))
        .unwrap();

    assert!(bridge.surface().output().ends_with("first second third"));
}

#[test]
fn undecodable_message_is_dropped_without_closing() {
    let (mut bridge, _log) = connected();
    let writes_before = bridge.surface().writes().len();

    bridge.handle(message(r#"{"error":"nope"}"#)).unwrap();

    assert_eq!(bridge.surface().writes().len(), writes_before);
    assert_eq!(bridge.state(), SessionState::Connected { degraded: false });
}

#[test]
fn connect_failure_reports_then_closes_on_transport_close() {
    let (mut bridge, log) = mounted();

    bridge
        .handle(BridgeEvent::TransportError("connection refused".to_string()))
        .unwrap();
    assert_eq!(bridge.state(), SessionState::Connected { degraded: true });

    bridge.handle(BridgeEvent::TransportClose).unwrap();
    assert_eq!(bridge.state(), SessionState::Closed);

    let output = bridge.surface().output();
    assert!(output.contains("Connection error: connection refused"));
    assert!(output.contains(&Banners::default().disconnected));
    assert_eq!(log.borrow().closes, 0);
}

#[test]
fn session_stays_interactive_after_remote_close() {
    let (mut bridge, log) = connected();
    log.borrow_mut().open = false;
    bridge.handle(BridgeEvent::TransportClose).unwrap();

    type_keys(&mut bridge, "ls\r");

    assert!(log.borrow().sent.is_empty());
    assert!(bridge.surface().output().contains(&Banners::default().not_connected));
}

#[test]
fn closed_session_sends_nothing_while_transport_still_reports_open() {
    let (mut bridge, log) = connected();
    bridge.handle(BridgeEvent::TransportClose).unwrap();
    assert_eq!(bridge.state(), SessionState::Closed);
    assert!(log.borrow().open);

    type_keys(&mut bridge, "ls\r");
    bridge.handle(BridgeEvent::Key(KeyInput::data("\x03"))).unwrap();

    assert!(log.borrow().sent.is_empty());
    assert_eq!(bridge.buffer(), "");
}

#[test]
fn editing_keys_go_to_the_backend_instead_of_the_line() {
    let (mut bridge, log) = connected();
    type_keys(&mut bridge, "vi");
    let writes_before = bridge.surface().writes().len();

    // Home, Delete, Alt+b
    for sequence in ["\x1b[H", "\x1b[3~", "\x1bb"] {
        bridge.handle(BridgeEvent::Key(KeyInput::data(sequence))).unwrap();
    }

    assert_eq!(
        log.borrow().sent,
        vec![
            OutboundCommand::new("\x1b[H"),
            OutboundCommand::new("\x1b[3~"),
            OutboundCommand::new("\x1bb"),
        ]
    );
    assert_eq!(bridge.buffer(), "vi");
    assert_eq!(bridge.surface().writes().len(), writes_before);
}

#[test]
fn teardown_closes_transport_once_and_ignores_late_messages() {
    let (mut bridge, log) = connected();

    bridge.handle(BridgeEvent::Teardown).unwrap();
    let writes_after_teardown = bridge.surface().writes().len();

    // A message racing the teardown
    bridge.handle(message(r#"{"output":"too late"}"#)).unwrap();
    type_keys(&mut bridge, "x\r");
    bridge.teardown();

    assert_eq!(log.borrow().closes, 1);
    assert!(bridge.surface().is_disposed());
    assert_eq!(bridge.surface().writes().len(), writes_after_teardown);
    assert!(log.borrow().sent.is_empty());

    drop(bridge);
    assert_eq!(log.borrow().closes, 1);
}

#[test]
fn dropping_an_unconnected_session_still_closes_transport() {
    let (bridge, log) = mounted();
    assert_eq!(log.borrow().opened.len(), 1);

    drop(bridge);

    assert_eq!(log.borrow().closes, 1);
}
