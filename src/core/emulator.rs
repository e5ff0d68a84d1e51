//! Terminal emulator seam.
//!
//! The controller only talks to an [`Emulator`] through this trait, so the
//! rendering engine can be swapped (or recorded in tests). [`VtEmulator`] is
//! the built-in implementation on top of the VT screen model.

use crossterm::event::{KeyEvent, KeyEventKind};

use super::addons::{ContainerSize, FitAddon, Link, LinkifyAddon};
use super::term::{Row, TerminalState, VtParser};
use crate::config::{Palette, TerminalConfig};
use crate::ui::keymapper::KeyMapper;

/// Grid size before the first fit
pub const DEFAULT_COLS: u16 = 80;
pub const DEFAULT_ROWS: u16 = 24;

/// Presentation options every emulator instance is created with
#[derive(Debug, Clone, PartialEq)]
pub struct EmulatorOptions {
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
    pub scrollback: usize,
    pub cursor_blink: bool,
    pub palette: Palette,
}

impl EmulatorOptions {
    pub fn from_config(config: &TerminalConfig) -> Self {
        Self {
            font_family: config.font_family.clone(),
            font_size: config.font_size,
            line_height: config.line_height,
            scrollback: config.scrollback,
            cursor_blink: config.cursor_blink,
            palette: Palette::by_name(&config.theme),
        }
    }
}

impl Default for EmulatorOptions {
    fn default() -> Self {
        Self::from_config(&TerminalConfig::default())
    }
}

/// Something the emulator wants to tell its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatorEvent {
    /// Bytes the user (or a device report) produced for the remote side
    Data(String),
    /// The grid changed size
    Resize { cols: u16, rows: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type EventListener = Box<dyn FnMut(&EmulatorEvent)>;

/// Runs before default key handling; returning `false` swallows the key
pub type KeyHandler = Box<dyn FnMut(&KeyEvent) -> bool>;

pub enum Addon {
    Fit(FitAddon),
    Linkify(LinkifyAddon),
}

/// Copy of what is currently on screen
#[derive(Clone)]
pub struct ScreenSnapshot {
    pub cols: u16,
    pub rows: u16,
    pub lines: Vec<Row>,
    pub cursor: (u16, u16),
    pub cursor_visible: bool,
    pub title: String,
    /// Lines scrolled back from the live view
    pub scroll_offset: usize,
}

impl ScreenSnapshot {
    pub fn text(&self) -> Vec<String> {
        self.lines.iter().map(Row::text).collect()
    }

    /// Visible text with trailing empty rows dropped
    pub fn trimmed_text(&self) -> Vec<String> {
        let mut text = self.text();
        while text.last().is_some_and(|line| line.is_empty()) {
            text.pop();
        }
        text
    }
}

pub trait Emulator {
    /// Attach to a container. Output written before `open` is still kept.
    fn open(&mut self, container: ContainerSize);

    fn load_addon(&mut self, addon: Addon);

    /// Resize to fill `container` using the fit add-on. Returns the grid
    /// size, or `None` when no fit add-on is loaded or the container
    /// cannot be measured.
    fn fit(&mut self, container: ContainerSize) -> Option<(u16, u16)>;

    /// Emits [`EmulatorEvent::Resize`] when the size actually changes
    fn resize(&mut self, cols: u16, rows: u16);

    fn dimensions(&self) -> (u16, u16);

    fn write(&mut self, data: &[u8]);

    /// Drop everything but the cursor line, including scrollback
    fn clear(&mut self);

    fn scroll_to_bottom(&mut self);

    /// Move the viewport through scrollback; negative scrolls up
    fn scroll_lines(&mut self, delta: i32);

    fn focus(&mut self);
    fn blur(&mut self);
    fn has_focus(&self) -> bool;

    fn attach_custom_key_handler(&mut self, handler: KeyHandler);

    /// Keyboard input; ignored while unfocused
    fn key(&mut self, event: &KeyEvent);

    fn paste(&mut self, text: &str);

    fn on_event(&mut self, listener: EventListener) -> ListenerId;

    fn off(&mut self, id: ListenerId);

    fn links(&self) -> Vec<Link>;

    fn snapshot(&self) -> ScreenSnapshot;

    /// Release everything; later calls become no-ops
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

pub trait EmulatorFactory {
    fn create(&self, options: &EmulatorOptions) -> Box<dyn Emulator>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VtEmulatorFactory;

impl EmulatorFactory for VtEmulatorFactory {
    fn create(&self, options: &EmulatorOptions) -> Box<dyn Emulator> {
        Box::new(VtEmulator::new(options.clone()))
    }
}

/// VT100/VT220 emulator backed by [`TerminalState`]
pub struct VtEmulator {
    options: EmulatorOptions,
    state: TerminalState,
    parser: VtParser,
    fit: Option<FitAddon>,
    linkify: Option<LinkifyAddon>,
    listeners: Vec<(ListenerId, EventListener)>,
    next_listener: u64,
    key_handler: Option<KeyHandler>,
    container: Option<ContainerSize>,
    focused: bool,
    disposed: bool,
}

impl VtEmulator {
    pub fn new(options: EmulatorOptions) -> Self {
        let state = TerminalState::new(DEFAULT_COLS, DEFAULT_ROWS, options.scrollback);
        Self {
            options,
            state,
            parser: VtParser::new(),
            fit: None,
            linkify: None,
            listeners: Vec::new(),
            next_listener: 0,
            key_handler: None,
            container: None,
            focused: false,
            disposed: false,
        }
    }

    pub fn options(&self) -> &EmulatorOptions {
        &self.options
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.container.is_some()
    }

    fn emit(&mut self, event: EmulatorEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn emit_data(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let data = String::from_utf8_lossy(bytes).into_owned();
        self.emit(EmulatorEvent::Data(data));
    }
}

impl Emulator for VtEmulator {
    fn open(&mut self, container: ContainerSize) {
        if self.disposed {
            return;
        }
        self.container = Some(container);
    }

    fn load_addon(&mut self, addon: Addon) {
        if self.disposed {
            return;
        }
        match addon {
            Addon::Fit(fit) => self.fit = Some(fit),
            Addon::Linkify(linkify) => self.linkify = Some(linkify),
        }
    }

    fn fit(&mut self, container: ContainerSize) -> Option<(u16, u16)> {
        if self.disposed {
            return None;
        }
        let (cols, rows) = self.fit.as_ref()?.propose_dimensions(container)?;
        self.container = Some(container);
        self.resize(cols, rows);
        Some((cols, rows))
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        if self.disposed || (cols, rows) == (self.state.cols, self.state.rows) {
            return;
        }
        let (cols, rows) = (cols.max(1), rows.max(1));
        self.state.resize(cols, rows);
        tracing::trace!("Emulator resized to {}x{}", cols, rows);
        self.emit(EmulatorEvent::Resize { cols, rows });
    }

    fn dimensions(&self) -> (u16, u16) {
        (self.state.cols, self.state.rows)
    }

    fn write(&mut self, data: &[u8]) {
        if self.disposed {
            return;
        }
        let responses = self.parser.advance(data, &mut self.state);
        for response in responses {
            self.emit_data(&response.to_bytes());
        }
    }

    fn clear(&mut self) {
        if self.disposed {
            return;
        }
        self.state.clear();
    }

    fn scroll_to_bottom(&mut self) {
        if self.disposed {
            return;
        }
        self.state.active_screen_mut().scroll_to_bottom();
    }

    fn scroll_lines(&mut self, delta: i32) {
        if self.disposed {
            return;
        }
        let screen = self.state.active_screen_mut();
        let n = delta.unsigned_abs() as usize;
        if delta < 0 {
            screen.scroll_view_up(n);
        } else {
            screen.scroll_view_down(n);
        }
    }

    fn focus(&mut self) {
        if !self.disposed {
            self.focused = true;
        }
    }

    fn blur(&mut self) {
        self.focused = false;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn attach_custom_key_handler(&mut self, handler: KeyHandler) {
        if !self.disposed {
            self.key_handler = Some(handler);
        }
    }

    fn key(&mut self, event: &KeyEvent) {
        if self.disposed || !self.focused {
            return;
        }
        if let Some(handler) = self.key_handler.as_mut() {
            if !handler(event) {
                return;
            }
        }
        if event.kind == KeyEventKind::Release {
            return;
        }
        if let Some(bytes) = KeyMapper::map(event, &self.state.modes) {
            self.state.active_screen_mut().scroll_to_bottom();
            self.emit_data(&bytes);
        }
    }

    fn paste(&mut self, text: &str) {
        if self.disposed || !self.focused || text.is_empty() {
            return;
        }
        let bytes = KeyMapper::paste(text, &self.state.modes);
        self.emit_data(&bytes);
    }

    fn on_event(&mut self, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        if !self.disposed {
            self.listeners.push((id, listener));
        }
        id
    }

    fn off(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    fn links(&self) -> Vec<Link> {
        match &self.linkify {
            Some(linkify) if !self.disposed => linkify.scan(&self.state),
            _ => Vec::new(),
        }
    }

    fn snapshot(&self) -> ScreenSnapshot {
        let screen = self.state.active_screen();
        let cursor = self.state.active_cursor();
        let lines = (0..self.state.rows as usize)
            .filter_map(|row| screen.get_row_at(row).cloned())
            .collect();
        ScreenSnapshot {
            cols: self.state.cols,
            rows: self.state.rows,
            lines,
            cursor: (cursor.col, cursor.row),
            cursor_visible: cursor.visible,
            title: self.state.title.clone(),
            scroll_offset: screen.scroll_offset,
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.focused = false;
        self.listeners.clear();
        self.key_handler = None;
        self.fit = None;
        self.linkify = None;
        self.container = None;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    fn recorder(emulator: &mut VtEmulator) -> Rc<RefCell<Vec<EmulatorEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        emulator.on_event(Box::new(move |event| sink.borrow_mut().push(event.clone())));
        events
    }

    fn opened() -> VtEmulator {
        let mut emulator = VtEmulator::new(EmulatorOptions::default());
        emulator.load_addon(Addon::Fit(FitAddon::with_cell_size(10.0, 20.0)));
        emulator.open(ContainerSize::new(1000.0, 500.0));
        emulator
    }

    #[test]
    fn test_fit_emits_resize_only_on_change() {
        let mut emulator = opened();
        let events = recorder(&mut emulator);

        assert_eq!(emulator.fit(ContainerSize::new(1000.0, 500.0)), Some((100, 25)));
        assert_eq!(emulator.fit(ContainerSize::new(1000.0, 500.0)), Some((100, 25)));
        assert_eq!(
            *events.borrow(),
            vec![EmulatorEvent::Resize { cols: 100, rows: 25 }]
        );
    }

    #[test]
    fn test_fit_without_addon() {
        let mut emulator = VtEmulator::new(EmulatorOptions::default());
        assert_eq!(emulator.fit(ContainerSize::new(1000.0, 500.0)), None);
        assert_eq!(emulator.dimensions(), (DEFAULT_COLS, DEFAULT_ROWS));
    }

    #[test]
    fn test_keys_need_focus() {
        let mut emulator = opened();
        let events = recorder(&mut emulator);
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);

        emulator.key(&key);
        assert!(events.borrow().is_empty());

        emulator.focus();
        emulator.key(&key);
        assert_eq!(*events.borrow(), vec![EmulatorEvent::Data("a".to_string())]);
    }

    #[test]
    fn test_custom_key_handler_can_swallow() {
        let mut emulator = opened();
        emulator.focus();
        let events = recorder(&mut emulator);
        emulator.attach_custom_key_handler(Box::new(|event| event.code != KeyCode::Esc));

        emulator.key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        emulator.key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(*events.borrow(), vec![EmulatorEvent::Data("\r".to_string())]);
    }

    #[test]
    fn test_device_report_is_emitted_as_data() {
        let mut emulator = opened();
        let events = recorder(&mut emulator);
        emulator.write(b"ab\x1b[6n");
        assert_eq!(*events.borrow(), vec![EmulatorEvent::Data("\x1b[1;3R".to_string())]);
    }

    #[test]
    fn test_off_and_dispose() {
        let mut emulator = opened();
        emulator.focus();
        let events = Rc::new(RefCell::new(0));
        let sink = events.clone();
        let id = emulator.on_event(Box::new(move |_| *sink.borrow_mut() += 1));

        emulator.paste("x");
        emulator.off(id);
        emulator.paste("y");
        assert_eq!(*events.borrow(), 1);

        emulator.write(b"hello");
        emulator.dispose();
        emulator.write(b" world");
        assert!(emulator.is_disposed());
        assert!(!emulator.has_focus());
        assert_eq!(emulator.snapshot().trimmed_text(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_insert_char_after_full_line() {
        let mut emulator = opened();
        emulator.resize(5, 3);
        emulator.write(b"abcde\x1b[@");
        assert_eq!(emulator.snapshot().text()[0], "abcd");
    }

    #[test]
    fn test_restored_cursor_fits_shrunk_grid() {
        let mut emulator = opened();
        emulator.resize(80, 24);
        emulator.write(b"\x1b[20;1H\x1b7");
        emulator.resize(80, 10);
        emulator.write(b"\x1b8x");
        let snapshot = emulator.snapshot();
        assert_eq!(snapshot.cursor, (1, 9));
        assert_eq!(snapshot.text()[9], "x");
    }

    #[test]
    fn test_scroll_through_history() {
        let mut emulator = opened();
        emulator.resize(20, 3);
        emulator.write(b"one\r\ntwo\r\nthree\r\nfour\r\nfive");
        assert_eq!(emulator.snapshot().text(), vec!["three", "four", "five"]);

        emulator.scroll_lines(-2);
        let snapshot = emulator.snapshot();
        assert_eq!(snapshot.text(), vec!["one", "two", "three"]);
        assert_eq!(snapshot.scroll_offset, 2);

        emulator.scroll_lines(-10);
        assert_eq!(emulator.snapshot().scroll_offset, 2);
        emulator.scroll_to_bottom();
        assert_eq!(emulator.snapshot().text(), vec!["three", "four", "five"]);
    }

    #[test]
    fn test_links_need_addon() {
        let mut emulator = opened();
        emulator.write(b"open https://example.com now");
        assert!(emulator.links().is_empty());
        emulator.load_addon(Addon::Linkify(LinkifyAddon::new()));
        assert_eq!(emulator.links()[0].url, "https://example.com");
    }
}
