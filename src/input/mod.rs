//! Keyboard input translation for exec sessions.
//!
//! Raw crossterm key events are split into two paths:
//! - **Arrow keys** are intercepted before the default handler and become
//!   [`KeyInput::Arrow`], so the bridge can echo and buffer their escape
//!   sequences without the surface processing them a second time.
//! - **Everything else** becomes [`KeyInput::Data`], the same text a
//!   terminal would emit for the key.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Cursor keys intercepted ahead of the data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Up,
    Down,
    Right,
    Left,
}

impl ArrowKey {
    /// ANSI cursor-movement sequence for this key
    pub fn escape_sequence(self) -> &'static str {
        match self {
            ArrowKey::Up => "\x1b[A",
            ArrowKey::Down => "\x1b[B",
            ArrowKey::Right => "\x1b[C",
            ArrowKey::Left => "\x1b[D",
        }
    }
}

/// Input delivered from the terminal surface to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// Arrow key, consumed before the data path
    Arrow(ArrowKey),
    /// Text for a single key press or a whole paste
    Data(String),
}

impl KeyInput {
    pub fn data(text: impl Into<String>) -> Self {
        KeyInput::Data(text.into())
    }
}

/// Control byte produced by a Ctrl chord, if any.
///
/// crossterm reports `Ctrl+\`..`Ctrl+_` (0x1c-0x1f) as `Ctrl+4`..`Ctrl+7`,
/// so both spellings are accepted.
pub fn control_code(key: KeyEvent) -> Option<u8> {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    let KeyCode::Char(c) = key.code else {
        return None;
    };
    control_byte(c)
}

/// Control byte for a character typed with Ctrl held.
pub fn control_byte(c: char) -> Option<u8> {
    match c {
        'a'..='z' => Some(c as u8 - b'a' + 1),
        'A'..='Z' => Some(c as u8 - b'A' + 1),
        '4'..='7' => Some(c as u8 - b'4' + 0x1c),
        ' ' | '2' | '@' => Some(0),
        '[' | '\\' | ']' | '^' | '_' => Some(c as u8 & 0x1f),
        _ => None,
    }
}

/// Returns true if the key is the Ctrl chord configured to detach.
pub fn is_detach_key(key: KeyEvent, detach: char) -> bool {
    key.kind == KeyEventKind::Press
        && control_byte(detach).is_some()
        && control_code(key) == control_byte(detach)
}

/// Translate a key event into bridge input.
///
/// Returns None for releases and keys we don't forward (e.g. function keys).
pub fn key_event_to_input(key: KeyEvent) -> Option<KeyInput> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let data = match key.code {
        KeyCode::Up => return Some(KeyInput::Arrow(ArrowKey::Up)),
        KeyCode::Down => return Some(KeyInput::Arrow(ArrowKey::Down)),
        KeyCode::Right => return Some(KeyInput::Arrow(ArrowKey::Right)),
        KeyCode::Left => return Some(KeyInput::Arrow(ArrowKey::Left)),
        KeyCode::Char(c) => {
            let mut text = match control_code(key) {
                Some(code) => char::from(code).to_string(),
                None => c.to_string(),
            };
            if key.modifiers.contains(KeyModifiers::ALT) {
                text.insert(0, '\x1b');
            }
            text
        }
        KeyCode::Enter => "\r".to_string(),
        KeyCode::Backspace => "\x7f".to_string(),
        KeyCode::Tab => "\t".to_string(),
        KeyCode::BackTab => "\x1b[Z".to_string(),
        KeyCode::Esc => "\x1b".to_string(),
        KeyCode::Home => "\x1b[H".to_string(),
        KeyCode::End => "\x1b[F".to_string(),
        KeyCode::PageUp => "\x1b[5~".to_string(),
        KeyCode::PageDown => "\x1b[6~".to_string(),
        KeyCode::Delete => "\x1b[3~".to_string(),
        _ => return None,
    };

    Some(KeyInput::Data(data))
}
