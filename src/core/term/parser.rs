//! VT sequence parser
//!
//! Decodes a raw output stream (UTF-8 text interleaved with ANSI/VT control
//! sequences) and applies it to a [`TerminalState`].

use super::state::{AttrFlags, Color, TerminalState};

/// Reply the emulator owes the remote side, sent back as session input
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Cursor position report: ESC [ row ; col R
    CursorPosition(u16, u16),
    /// Operating status report: ESC [ 0 n
    StatusOk,
    DeviceAttributes,
    SecondaryDeviceAttributes,
}

impl Response {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::CursorPosition(row, col) => format!("\x1b[{};{}R", row, col).into_bytes(),
            Response::StatusOk => b"\x1b[0n".to_vec(),
            // VT220
            Response::DeviceAttributes => b"\x1b[?62;c".to_vec(),
            Response::SecondaryDeviceAttributes => b"\x1b[>1;10;0c".to_vec(),
        }
    }
}

pub struct VtParser {
    state: ParserState,
    params: Vec<u16>,
    intermediates: Vec<u8>,
    current_param: Option<u16>,
    osc_string: String,
    /// Bytes of a UTF-8 sequence split across two writes
    utf8_pending: Vec<u8>,
}

#[derive(Clone, Copy, Default, PartialEq, Debug)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    OscString,
    /// ESC seen inside an OSC string, waiting for `\`
    EscapeInOsc,
}

impl Default for VtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VtParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Ground,
            params: Vec::with_capacity(16),
            intermediates: Vec::with_capacity(4),
            current_param: None,
            osc_string: String::new(),
            utf8_pending: Vec::with_capacity(4),
        }
    }

    /// Feed a chunk of output, collecting any replies the sequences asked for.
    pub fn advance(&mut self, bytes: &[u8], state: &mut TerminalState) -> Vec<Response> {
        let mut responses = Vec::new();
        for &byte in bytes {
            if !self.utf8_pending.is_empty() {
                if byte & 0xC0 == 0x80 {
                    self.utf8_pending.push(byte);
                    if self.utf8_pending.len() == utf8_len(self.utf8_pending[0]) {
                        let pending = std::mem::take(&mut self.utf8_pending);
                        match std::str::from_utf8(&pending) {
                            Ok(s) => s.chars().for_each(|ch| self.print(ch, state)),
                            Err(_) => self.print(char::REPLACEMENT_CHARACTER, state),
                        }
                    }
                    continue;
                }
                // Truncated sequence
                self.utf8_pending.clear();
                self.print(char::REPLACEMENT_CHARACTER, state);
            }

            if byte >= 0xC0 && matches!(self.state, ParserState::Ground | ParserState::OscString) {
                if utf8_len(byte) > 1 {
                    self.utf8_pending.push(byte);
                } else {
                    self.print(char::REPLACEMENT_CHARACTER, state);
                }
                continue;
            }

            if let Some(response) = self.feed(byte, state) {
                responses.push(response);
            }
        }
        responses
    }

    fn print(&mut self, ch: char, state: &mut TerminalState) {
        if self.state == ParserState::OscString {
            self.osc_string.push(ch);
        } else {
            state.put_char(ch);
        }
    }

    /// Feed a single byte
    pub fn feed(&mut self, byte: u8, state: &mut TerminalState) -> Option<Response> {
        let in_osc = matches!(self.state, ParserState::OscString | ParserState::EscapeInOsc);
        if byte < 0x20 && !in_osc {
            match byte {
                0x1B => self.enter_escape(),
                0x08 => state.backspace(),
                0x09 => state.horizontal_tab(),
                0x0A..=0x0C => state.linefeed(),
                0x0D => state.carriage_return(),
                // BEL and the rest of C0
                _ => {}
            }
            return None;
        }

        match self.state {
            ParserState::Ground => {
                if (0x20..0x7F).contains(&byte) {
                    state.put_char(byte as char);
                } else if byte >= 0x80 {
                    // Stray continuation byte
                    state.put_char(char::REPLACEMENT_CHARACTER);
                }
                None
            }
            ParserState::Escape => {
                self.escape(byte, state);
                None
            }
            ParserState::EscapeIntermediate => {
                match byte {
                    0x20..=0x2F => self.intermediates.push(byte),
                    // Charset designations land here and are ignored
                    _ => self.state = ParserState::Ground,
                }
                None
            }
            ParserState::CsiEntry | ParserState::CsiParam => self.csi_param(byte, state),
            ParserState::CsiIntermediate => match byte {
                0x20..=0x2F => {
                    self.intermediates.push(byte);
                    None
                }
                0x40..=0x7E => self.execute_csi(byte, state),
                _ => {
                    self.state = ParserState::Ground;
                    None
                }
            },
            ParserState::OscString => {
                match byte {
                    0x07 | 0x9C => {
                        self.execute_osc(state);
                        self.state = ParserState::Ground;
                    }
                    0x1B => self.state = ParserState::EscapeInOsc,
                    _ if byte >= 0x20 => self.osc_string.push(byte as char),
                    _ => {}
                }
                None
            }
            ParserState::EscapeInOsc => {
                self.execute_osc(state);
                if byte == b'\\' {
                    self.state = ParserState::Ground;
                } else {
                    self.enter_escape();
                    self.escape(byte, state);
                }
                None
            }
        }
    }

    fn enter_escape(&mut self) {
        self.state = ParserState::Escape;
        self.params.clear();
        self.intermediates.clear();
        self.current_param = None;
    }

    fn escape(&mut self, byte: u8, state: &mut TerminalState) {
        self.state = ParserState::Ground;
        match byte {
            b'[' => self.state = ParserState::CsiEntry,
            b']' => {
                self.osc_string.clear();
                self.state = ParserState::OscString;
            }
            b'7' => state.save_cursor(),
            b'8' => state.restore_cursor(),
            b'D' => state.linefeed(),
            b'E' => {
                state.carriage_return();
                state.linefeed();
            }
            b'M' => state.reverse_index(),
            b'c' => state.reset(),
            0x20..=0x2F => {
                self.intermediates.push(byte);
                self.state = ParserState::EscapeIntermediate;
            }
            _ => {}
        }
    }

    fn csi_param(&mut self, byte: u8, state: &mut TerminalState) -> Option<Response> {
        match byte {
            b'0'..=b'9' => {
                let digit = (byte - b'0') as u16;
                self.current_param =
                    Some(self.current_param.unwrap_or(0).saturating_mul(10).saturating_add(digit));
                self.state = ParserState::CsiParam;
            }
            // ':' sub-parameters are flattened into the parameter list
            b';' | b':' => {
                self.params.push(self.current_param.take().unwrap_or(0));
                self.state = ParserState::CsiParam;
            }
            b'?' | b'>' | b'!' | b'=' if self.state == ParserState::CsiEntry => {
                self.intermediates.push(byte);
            }
            0x20..=0x2F => {
                if let Some(p) = self.current_param.take() {
                    self.params.push(p);
                }
                self.intermediates.push(byte);
                self.state = ParserState::CsiIntermediate;
            }
            0x40..=0x7E => {
                if let Some(p) = self.current_param.take() {
                    self.params.push(p);
                }
                return self.execute_csi(byte, state);
            }
            _ => self.state = ParserState::Ground,
        }
        None
    }

    fn param(&self, index: usize, default: u16) -> u16 {
        match self.params.get(index) {
            Some(&0) | None => default,
            Some(&p) => p,
        }
    }

    fn execute_csi(&mut self, final_byte: u8, state: &mut TerminalState) -> Option<Response> {
        self.state = ParserState::Ground;
        let private = self.intermediates.contains(&b'?');
        let secondary = self.intermediates.contains(&b'>');

        match (private, secondary, final_byte) {
            (false, false, b'A') => state.cursor_up(self.param(0, 1)),
            (false, false, b'B') => state.cursor_down(self.param(0, 1)),
            (false, false, b'C') => state.cursor_forward(self.param(0, 1)),
            (false, false, b'D') => state.cursor_backward(self.param(0, 1)),
            (false, false, b'E') => {
                state.cursor_down(self.param(0, 1));
                state.carriage_return();
            }
            (false, false, b'F') => {
                state.cursor_up(self.param(0, 1));
                state.carriage_return();
            }
            (false, false, b'G') | (false, false, b'`') => state.set_cursor_col(self.param(0, 1)),
            (false, false, b'H') | (false, false, b'f') => {
                state.cursor_position(self.param(0, 1), self.param(1, 1))
            }
            (false, false, b'd') => state.set_cursor_row(self.param(0, 1)),
            (false, false, b'J') => state.erase_in_display(self.params.first().copied().unwrap_or(0)),
            (false, false, b'K') => state.erase_in_line(self.params.first().copied().unwrap_or(0)),
            (false, false, b'L') => state.insert_lines(self.param(0, 1)),
            (false, false, b'M') => state.delete_lines(self.param(0, 1)),
            (false, false, b'@') => state.insert_chars(self.param(0, 1)),
            (false, false, b'P') => state.delete_chars(self.param(0, 1)),
            (false, false, b'X') => state.erase_chars(self.param(0, 1)),
            (false, false, b'S') => state.scroll_up(self.param(0, 1)),
            (false, false, b'T') => state.scroll_down(self.param(0, 1)),
            (false, false, b'r') => {
                let rows = state.rows;
                state.set_scroll_region(self.param(0, 1), self.param(1, rows));
                state.cursor_position(1, 1);
            }
            (false, false, b'm') => self.execute_sgr(state),
            (false, false, b's') => state.save_cursor(),
            (false, false, b'u') => state.restore_cursor(),
            (false, false, b'n') => {
                return match self.params.first() {
                    Some(5) => Some(Response::StatusOk),
                    Some(6) => {
                        let cursor = state.active_cursor();
                        Some(Response::CursorPosition(cursor.row + 1, cursor.col + 1))
                    }
                    _ => None,
                };
            }
            (false, false, b'c') => return Some(Response::DeviceAttributes),
            (false, true, b'c') => return Some(Response::SecondaryDeviceAttributes),
            (true, false, b'h') | (true, false, b'l') => {
                let enable = final_byte == b'h';
                for &p in &self.params {
                    state.set_private_mode(p, enable);
                }
            }
            (false, false, b'h') | (false, false, b'l') => {
                let enable = final_byte == b'h';
                for &p in &self.params {
                    match p {
                        4 => state.modes.insert_mode = enable,
                        20 => state.modes.linefeed_newline = enable,
                        _ => {}
                    }
                }
            }
            _ => {
                tracing::debug!(
                    "Unhandled CSI: intermediates={:?}, params={:?}, final={:?}",
                    self.intermediates,
                    self.params,
                    final_byte as char
                );
            }
        }
        None
    }

    fn execute_sgr(&self, state: &mut TerminalState) {
        if self.params.is_empty() {
            state.current_attrs.reset();
            return;
        }

        let attrs = &mut state.current_attrs;
        let mut iter = self.params.iter().copied();
        while let Some(param) = iter.next() {
            match param {
                0 => attrs.reset(),
                1 => attrs.flags |= AttrFlags::BOLD,
                2 => attrs.flags |= AttrFlags::DIM,
                3 => attrs.flags |= AttrFlags::ITALIC,
                4 => attrs.flags |= AttrFlags::UNDERLINE,
                5 => attrs.flags |= AttrFlags::BLINK,
                7 => attrs.flags |= AttrFlags::INVERSE,
                8 => attrs.flags |= AttrFlags::HIDDEN,
                9 => attrs.flags |= AttrFlags::STRIKETHROUGH,
                22 => attrs.flags &= !(AttrFlags::BOLD | AttrFlags::DIM),
                23 => attrs.flags &= !AttrFlags::ITALIC,
                24 => attrs.flags &= !AttrFlags::UNDERLINE,
                25 => attrs.flags &= !AttrFlags::BLINK,
                27 => attrs.flags &= !AttrFlags::INVERSE,
                28 => attrs.flags &= !AttrFlags::HIDDEN,
                29 => attrs.flags &= !AttrFlags::STRIKETHROUGH,
                30..=37 => attrs.fg = Color::Indexed((param - 30) as u8),
                38 => {
                    if let Some(color) = extended_color(&mut iter) {
                        attrs.fg = color;
                    }
                }
                39 => attrs.fg = Color::Default,
                40..=47 => attrs.bg = Color::Indexed((param - 40) as u8),
                48 => {
                    if let Some(color) = extended_color(&mut iter) {
                        attrs.bg = color;
                    }
                }
                49 => attrs.bg = Color::Default,
                90..=97 => attrs.fg = Color::Indexed((param - 90 + 8) as u8),
                100..=107 => attrs.bg = Color::Indexed((param - 100 + 8) as u8),
                _ => {}
            }
        }
    }

    fn execute_osc(&mut self, state: &mut TerminalState) {
        if let Some((code, text)) = self.osc_string.split_once(';') {
            if matches!(code, "0" | "2") {
                state.title = text.to_string();
            }
        }
        self.osc_string.clear();
    }
}

/// `38;5;n` / `38;2;r;g;b` (and the 48 background forms)
fn extended_color(iter: &mut impl Iterator<Item = u16>) -> Option<Color> {
    match iter.next()? {
        5 => iter.next().map(|n| Color::Indexed(n as u8)),
        2 => {
            let r = iter.next().unwrap_or(0) as u8;
            let g = iter.next().unwrap_or(0) as u8;
            let b = iter.next().unwrap_or(0) as u8;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

fn utf8_len(lead: u8) -> usize {
    if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}
