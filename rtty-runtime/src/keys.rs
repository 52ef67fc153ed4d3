//! Key-to-bytes translation.
//!
//! Follows the xterm conventions: cursor keys switch between `CSI A`-style
//! and `SS3 A`-style sequences under cursor-keys application mode, modified
//! keys use the `CSI 1 ; m F` parameter form, Ctrl+letter collapses to the
//! C0 range and Alt prefixes ESC.

use bitflags::bitflags;
use rtty_term::TerminalModes;

bitflags! {
    /// Keyboard modifier state. The bit order matches the xterm modifier
    /// parameter (`1 + mask`).
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT = 2;
        const CTRL = 4;
        const META = 8;
    }
}

/// A key the host can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowRight,
    ArrowLeft,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// The xterm modifier parameter: one plus the modifier mask.
fn modifier_param(modifiers: Modifiers) -> u8 {
    1 + modifiers.bits()
}

/// A cursor-key style sequence: `SS3 F` in application mode, `CSI F`
/// otherwise, `CSI 1 ; m F` when modified.
fn cursor_key(final_byte: u8, modifiers: Modifiers, application: bool) -> Vec<u8> {
    if modifiers.is_empty() {
        if application {
            vec![0x1b, b'O', final_byte]
        } else {
            vec![0x1b, b'[', final_byte]
        }
    } else {
        format!("\x1b[1;{}{}", modifier_param(modifiers), final_byte as char)
            .into_bytes()
    }
}

/// A tilde-terminated editing-key sequence: `CSI n ~` or `CSI n ; m ~`.
fn tilde_key(number: u8, modifiers: Modifiers) -> Vec<u8> {
    if modifiers.is_empty() {
        format!("\x1b[{number}~").into_bytes()
    } else {
        format!("\x1b[{number};{}~", modifier_param(modifiers)).into_bytes()
    }
}

fn function_key(number: u8, modifiers: Modifiers) -> Vec<u8> {
    match number {
        1..=4 => {
            let final_byte = b'P' + (number - 1);
            if modifiers.is_empty() {
                vec![0x1b, b'O', final_byte]
            } else {
                format!(
                    "\x1b[1;{}{}",
                    modifier_param(modifiers),
                    final_byte as char
                )
                .into_bytes()
            }
        },
        5..=12 => {
            // The historical numbering has gaps.
            let number = match number {
                5 => 15,
                6 => 17,
                7 => 18,
                8 => 19,
                9 => 20,
                10 => 21,
                11 => 23,
                _ => 24,
            };
            tilde_key(number, modifiers)
        },
        _ => Vec::new(),
    }
}

fn char_key(c: char, modifiers: Modifiers) -> Vec<u8> {
    let mut bytes = Vec::new();

    if modifiers.contains(Modifiers::ALT) {
        bytes.push(0x1b);
    }

    if modifiers.contains(Modifiers::CTRL) {
        let upper = c.to_ascii_uppercase();
        match upper {
            'A'..='Z' => bytes.push(upper as u8 - 0x40),
            ' ' | '@' => bytes.push(0x00),
            '[' => bytes.push(0x1b),
            '\\' => bytes.push(0x1c),
            ']' => bytes.push(0x1d),
            _ => {
                let mut buffer = [0u8; 4];
                bytes.extend_from_slice(
                    c.encode_utf8(&mut buffer).as_bytes(),
                );
            },
        }
    } else {
        let mut buffer = [0u8; 4];
        bytes.extend_from_slice(c.encode_utf8(&mut buffer).as_bytes());
    }

    bytes
}

/// Translate a key event under the current terminal modes.
pub(crate) fn encode(event: &KeyEvent, modes: &TerminalModes) -> Vec<u8> {
    let modifiers = event.modifiers;
    let cursor_application = modes.cursor_keys_application;

    match event.key {
        Key::Char(c) => char_key(c, modifiers),
        Key::Enter => {
            if modifiers.contains(Modifiers::ALT) {
                vec![0x1b, b'\r']
            } else {
                vec![b'\r']
            }
        },
        Key::Tab => {
            if modifiers.contains(Modifiers::SHIFT) {
                b"\x1b[Z".to_vec()
            } else {
                vec![b'\t']
            }
        },
        Key::Backspace => {
            if modifiers.contains(Modifiers::ALT) {
                vec![0x1b, 0x7f]
            } else {
                vec![0x7f]
            }
        },
        Key::Escape => vec![0x1b],
        Key::ArrowUp => cursor_key(b'A', modifiers, cursor_application),
        Key::ArrowDown => cursor_key(b'B', modifiers, cursor_application),
        Key::ArrowRight => cursor_key(b'C', modifiers, cursor_application),
        Key::ArrowLeft => cursor_key(b'D', modifiers, cursor_application),
        Key::Home => cursor_key(b'H', modifiers, cursor_application),
        Key::End => cursor_key(b'F', modifiers, cursor_application),
        Key::PageUp => tilde_key(5, modifiers),
        Key::PageDown => tilde_key(6, modifiers),
        Key::Insert => tilde_key(2, modifiers),
        Key::Delete => tilde_key(3, modifiers),
        Key::F(number) => function_key(number, modifiers),
    }
}
