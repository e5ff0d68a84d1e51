//! Key mapping for terminal input
//!
//! Converts key and paste events into the byte sequences a session's shell
//! expects on its input stream.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::term::TerminalModes;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        result.set(Modifiers::SHIFT, mods.contains(KeyModifiers::SHIFT));
        result.set(Modifiers::CTRL, mods.contains(KeyModifiers::CONTROL));
        result.set(Modifiers::ALT, mods.contains(KeyModifiers::ALT));
        result
    }
}

pub struct KeyMapper;

impl KeyMapper {
    /// Encode a key press. Releases and keys without a VT encoding give `None`.
    pub fn map(event: &KeyEvent, modes: &TerminalModes) -> Option<Vec<u8>> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Some(Self::map_char(ch, mods)),
            KeyCode::Enter => {
                if modes.linefeed_newline {
                    Some(b"\r\n".to_vec())
                } else {
                    Some(b"\r".to_vec())
                }
            }
            KeyCode::Backspace => {
                if mods.contains(Modifiers::ALT) {
                    Some(vec![0x1B, 0x7F])
                } else {
                    Some(vec![0x7F])
                }
            }
            KeyCode::Tab => Some(vec![0x09]),
            KeyCode::BackTab => Some(b"\x1b[Z".to_vec()),
            KeyCode::Esc => Some(vec![0x1B]),
            KeyCode::Up => Some(Self::cursor_key(b'A', mods, modes)),
            KeyCode::Down => Some(Self::cursor_key(b'B', mods, modes)),
            KeyCode::Right => Some(Self::cursor_key(b'C', mods, modes)),
            KeyCode::Left => Some(Self::cursor_key(b'D', mods, modes)),
            KeyCode::Home => Some(Self::cursor_key(b'H', mods, modes)),
            KeyCode::End => Some(Self::cursor_key(b'F', mods, modes)),
            KeyCode::PageUp => Some(Self::tilde_key(5, mods)),
            KeyCode::PageDown => Some(Self::tilde_key(6, mods)),
            KeyCode::Insert => Some(Self::tilde_key(2, mods)),
            KeyCode::Delete => Some(Self::tilde_key(3, mods)),
            KeyCode::F(n) => Self::function_key(n, mods),
            _ => None,
        }
    }

    /// Encode pasted text, wrapping it in bracketed-paste markers when the
    /// remote application asked for them. Newlines become carriage returns.
    pub fn paste(text: &str, modes: &TerminalModes) -> Vec<u8> {
        let normalized = text.replace("\r\n", "\r").replace('\n', "\r");
        if modes.bracketed_paste {
            let mut bytes = b"\x1b[200~".to_vec();
            bytes.extend_from_slice(normalized.as_bytes());
            bytes.extend_from_slice(b"\x1b[201~");
            bytes
        } else {
            normalized.into_bytes()
        }
    }

    fn map_char(ch: char, mods: Modifiers) -> Vec<u8> {
        let ctrl = mods.contains(Modifiers::CTRL);
        let alt = mods.contains(Modifiers::ALT);

        if ctrl {
            let code = match ch {
                'a'..='z' => Some(ch as u8 - b'a' + 1),
                'A'..='Z' => Some(ch as u8 - b'A' + 1),
                '@' | '`' | ' ' | '2' => Some(0x00),
                '[' | '3' => Some(0x1B),
                '\\' | '4' => Some(0x1C),
                ']' | '5' => Some(0x1D),
                '^' | '~' | '6' => Some(0x1E),
                '_' | '?' | '7' => Some(0x1F),
                _ => None,
            };
            if let Some(code) = code {
                return if alt { vec![0x1B, code] } else { vec![code] };
            }
        }

        let mut bytes = Vec::with_capacity(5);
        if alt {
            bytes.push(0x1B);
        }
        let mut buf = [0u8; 4];
        bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        bytes
    }

    /// Arrows plus Home/End: CSI form, SS3 in application cursor mode,
    /// `CSI 1 ; mod X` when modified.
    fn cursor_key(key: u8, mods: Modifiers, modes: &TerminalModes) -> Vec<u8> {
        if !mods.is_empty() {
            format!("\x1b[1;{}{}", Self::modifier_code(mods), key as char).into_bytes()
        } else if modes.application_cursor {
            vec![0x1B, b'O', key]
        } else {
            vec![0x1B, b'[', key]
        }
    }

    fn tilde_key(code: u8, mods: Modifiers) -> Vec<u8> {
        if mods.is_empty() {
            format!("\x1b[{}~", code).into_bytes()
        } else {
            format!("\x1b[{};{}~", code, Self::modifier_code(mods)).into_bytes()
        }
    }

    fn function_key(n: u8, mods: Modifiers) -> Option<Vec<u8>> {
        let bytes = match n {
            1..=4 => {
                let key = b"PQRS"[(n - 1) as usize] as char;
                if mods.is_empty() {
                    format!("\x1bO{}", key)
                } else {
                    format!("\x1b[1;{}{}", Self::modifier_code(mods), key)
                }
            }
            5..=12 => {
                let code = [15, 17, 18, 19, 20, 21, 23, 24][(n - 5) as usize];
                if mods.is_empty() {
                    format!("\x1b[{}~", code)
                } else {
                    format!("\x1b[{};{}~", code, Self::modifier_code(mods))
                }
            }
            _ => return None,
        };
        Some(bytes.into_bytes())
    }

    /// xterm modifier parameter
    fn modifier_code(mods: Modifiers) -> u8 {
        1 + u8::from(mods.contains(Modifiers::SHIFT))
            + 2 * u8::from(mods.contains(Modifiers::ALT))
            + 4 * u8::from(mods.contains(Modifiers::CTRL))
    }
}
