//! Controller behaviour against an in-process transport and an emulator
//! factory that records every call the controller makes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

use bmad_terminal::core::emulator::{
    Addon, Emulator, EmulatorFactory, EmulatorOptions, EventListener, KeyHandler, ListenerId,
    ScreenSnapshot, VtEmulator,
};
use bmad_terminal::core::{
    ContainerSize, ControllerOptions, Link, PropsChange, SessionId, SessionProps, SessionStatus,
    TerminalSessionController,
};
use bmad_terminal::transport::{ClientMessage, EventKind, LocalTransport, ServerEvent, Transport};
use bmad_terminal::ui::SessionView;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create(usize),
    Write(usize, String),
    Clear(usize),
    Fit(usize),
    ScrollToBottom(usize),
    Dispose(usize),
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Rc<RefCell<Vec<Call>>>,
    created: Rc<Cell<usize>>,
}

impl Recorder {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| matches(call)).count()
    }

    fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

struct RecordingFactory(Recorder);

impl EmulatorFactory for RecordingFactory {
    fn create(&self, options: &EmulatorOptions) -> Box<dyn Emulator> {
        let id = self.0.created.get();
        self.0.created.set(id + 1);
        self.0.calls.borrow_mut().push(Call::Create(id));
        Box::new(RecordingEmulator {
            id,
            inner: VtEmulator::new(options.clone()),
            calls: self.0.calls.clone(),
        })
    }
}

struct RecordingEmulator {
    id: usize,
    inner: VtEmulator,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl RecordingEmulator {
    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Emulator for RecordingEmulator {
    fn open(&mut self, container: ContainerSize) {
        self.inner.open(container)
    }

    fn load_addon(&mut self, addon: Addon) {
        self.inner.load_addon(addon)
    }

    fn fit(&mut self, container: ContainerSize) -> Option<(u16, u16)> {
        self.record(Call::Fit(self.id));
        self.inner.fit(container)
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.inner.resize(cols, rows)
    }

    fn dimensions(&self) -> (u16, u16) {
        self.inner.dimensions()
    }

    fn write(&mut self, data: &[u8]) {
        self.record(Call::Write(self.id, String::from_utf8_lossy(data).into_owned()));
        self.inner.write(data)
    }

    fn clear(&mut self) {
        self.record(Call::Clear(self.id));
        self.inner.clear()
    }

    fn scroll_to_bottom(&mut self) {
        self.record(Call::ScrollToBottom(self.id));
        self.inner.scroll_to_bottom()
    }

    fn scroll_lines(&mut self, delta: i32) {
        self.inner.scroll_lines(delta)
    }

    fn focus(&mut self) {
        self.inner.focus()
    }

    fn blur(&mut self) {
        self.inner.blur()
    }

    fn has_focus(&self) -> bool {
        self.inner.has_focus()
    }

    fn attach_custom_key_handler(&mut self, handler: KeyHandler) {
        self.inner.attach_custom_key_handler(handler)
    }

    fn key(&mut self, event: &KeyEvent) {
        self.inner.key(event)
    }

    fn paste(&mut self, text: &str) {
        self.inner.paste(text)
    }

    fn on_event(&mut self, listener: EventListener) -> ListenerId {
        self.inner.on_event(listener)
    }

    fn off(&mut self, id: ListenerId) {
        self.inner.off(id)
    }

    fn links(&self) -> Vec<Link> {
        self.inner.links()
    }

    fn snapshot(&self) -> ScreenSnapshot {
        self.inner.snapshot()
    }

    fn dispose(&mut self) {
        self.record(Call::Dispose(self.id));
        self.inner.dispose()
    }

    fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}

const CONTAINER: ContainerSize = ContainerSize::new(800.0, 400.0);

fn mount(transport: &LocalTransport, id: &str) -> (TerminalSessionController, Recorder) {
    mount_with(transport, id, SessionStatus::Active)
}

fn mount_with(
    transport: &LocalTransport,
    id: &str,
    status: SessionStatus,
) -> (TerminalSessionController, Recorder) {
    let recorder = Recorder::default();
    let controller = TerminalSessionController::new(
        Rc::new(transport.clone()) as Rc<dyn Transport>,
        Box::new(RecordingFactory(recorder.clone())),
        ControllerOptions::default(),
        SessionProps::new(id, status),
        CONTAINER,
    );
    (controller, recorder)
}

fn sid(id: &str) -> SessionId {
    SessionId::from(id)
}

fn output(id: &str, data: &str) -> ServerEvent {
    ServerEvent::Output {
        session_id: sid(id),
        data: data.to_string(),
    }
}

fn status(id: &str, status: SessionStatus) -> ServerEvent {
    ServerEvent::Status {
        session_id: sid(id),
        status,
    }
}

fn exit(id: &str) -> ServerEvent {
    ServerEvent::Exit {
        session_id: sid(id),
        exit_code: Some(137),
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[test]
fn test_events_for_other_sessions_do_not_change_status() {
    let transport = LocalTransport::new();
    let (controller, recorder) = mount(&transport, "s-1");

    transport.deliver(&status("s-2", SessionStatus::Idle));
    transport.deliver(&exit("s-2"));
    transport.deliver(&output("s-2", "not mine"));
    transport.deliver(&ServerEvent::Attached { session_id: sid("s-2") });

    assert_eq!(controller.status(), SessionStatus::Active);
    assert_eq!(recorder.count(|c| matches!(c, Call::Write(..) | Call::Clear(..))), 0);
}

#[test]
fn test_exit_forces_error_from_any_status() {
    for initial in [
        SessionStatus::Active,
        SessionStatus::Waiting,
        SessionStatus::Idle,
        SessionStatus::Error,
        SessionStatus::Stopped,
    ] {
        let transport = LocalTransport::new();
        let (controller, _) = mount_with(&transport, "s-1", initial);
        transport.deliver(&exit("s-1"));
        assert_eq!(controller.status(), SessionStatus::Error);
        assert_eq!(controller.view(), SessionView::Crashed { restart_enabled: true });
    }
}

#[test]
fn test_status_event_moves_to_idle_and_back() {
    let transport = LocalTransport::new();
    let (controller, _) = mount(&transport, "s-1");

    transport
        .deliver_line(r#"{"type":"session.status","sessionId":"s-1","status":"idle"}"#)
        .unwrap();
    assert_eq!(controller.status(), SessionStatus::Idle);
    assert_eq!(controller.view(), SessionView::Idle { resume_enabled: true });

    // Unknown statuses never reach the handlers
    assert!(transport
        .deliver_line(r#"{"type":"session.status","sessionId":"s-1","status":"zombie"}"#)
        .is_err());
    assert_eq!(controller.status(), SessionStatus::Idle);

    transport.deliver(&status("s-1", SessionStatus::Active));
    assert!(controller.view().shows_terminal());
}

#[test]
fn test_session_change_disposes_old_emulator_first() {
    let transport = LocalTransport::new();
    let (mut controller, recorder) = mount(&transport, "s-1");
    transport.take_sent();

    let change = controller.set_props(SessionProps::new("s-2", SessionStatus::Waiting));
    assert_eq!(change, PropsChange::SessionChanged);
    transport.deliver(&output("s-1", "stale"));
    transport.deliver(&output("s-2", "fresh"));

    let calls: Vec<Call> = recorder
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, Call::Fit(_)))
        .collect();
    assert_eq!(
        calls,
        vec![
            Call::Create(0),
            Call::Dispose(0),
            Call::Create(1),
            Call::Write(1, "fresh".to_string()),
        ]
    );
    assert_eq!(controller.status(), SessionStatus::Waiting);
    assert_eq!(transport.handler_count(), 4);

    let sent = transport.sent();
    assert_eq!(sent[0], ClientMessage::Detach { session_id: sid("s-1") });
    assert!(matches!(&sent[1], ClientMessage::Resize { session_id, .. } if *session_id == sid("s-2")));
    assert_eq!(sent[2], ClientMessage::Attach { session_id: sid("s-2") });
}

#[test]
fn test_disconnected_controller_never_sends() {
    let transport = LocalTransport::new();
    transport.set_connected(false);
    let (mut controller, _) = mount(&transport, "s-1");

    controller.handle_key(&key(KeyCode::Char('x')));
    controller.handle_key(&key(KeyCode::Esc));
    controller.handle_paste("pasted");
    transport.deliver(&output("s-1", "\x1b[6n"));
    controller.on_container_resize(ContainerSize::new(1200.0, 900.0));
    assert!(controller.on_animation_frame());
    assert!(!controller.resume());
    controller.set_props(SessionProps::new("s-2", SessionStatus::Active));
    drop(controller);

    assert_eq!(transport.send_calls(), 0);
}

#[test]
fn test_resume_only_while_connected() {
    let transport = LocalTransport::new();
    let (controller, _) = mount_with(&transport, "s-1", SessionStatus::Idle);
    transport.take_sent();

    assert!(controller.resume());
    assert_eq!(transport.take_sent(), vec![ClientMessage::Resume { session_id: sid("s-1") }]);

    transport.set_connected(false);
    assert_eq!(controller.view(), SessionView::Idle { resume_enabled: false });
    assert!(!controller.resume());
    assert_eq!(transport.send_calls(), 3);
}

#[test]
fn test_attached_clears_once_before_later_output() {
    let transport = LocalTransport::new();
    let (controller, recorder) = mount(&transport, "s-1");

    transport.deliver(&output("s-1", "old output\r\n"));
    transport.deliver(&ServerEvent::Attached { session_id: sid("s-1") });
    transport.deliver(&output("s-1", "new prompt"));

    let calls: Vec<Call> = recorder
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Write(..) | Call::Clear(..)))
        .collect();
    assert_eq!(
        calls,
        vec![
            Call::Write(0, "old output\r\n".to_string()),
            Call::Clear(0),
            Call::Write(0, "new prompt".to_string()),
        ]
    );
    let text = controller.snapshot().unwrap().trimmed_text();
    assert_eq!(text, vec!["new prompt".to_string()]);
}

#[test]
fn test_attached_keeps_the_cursor_line() {
    let transport = LocalTransport::new();
    let (controller, _) = mount(&transport, "s-1");

    transport.deliver(&output("s-1", "line 1\r\nline 2\r\n$ "));
    transport.deliver(&ServerEvent::Attached { session_id: sid("s-1") });
    transport.deliver(&output("s-1", "ls"));

    assert_eq!(
        controller.snapshot().unwrap().trimmed_text(),
        vec!["$ ls".to_string()]
    );
}

#[test]
fn test_escape_interrupts_and_other_keys_type() {
    let transport = LocalTransport::new();
    let (mut controller, _) = mount(&transport, "s-1");
    assert!(controller.has_focus());
    transport.take_sent();

    controller.handle_key(&key(KeyCode::Esc));
    controller.handle_key(&KeyEvent {
        code: KeyCode::Esc,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Release,
        state: KeyEventState::NONE,
    });
    assert_eq!(
        transport.take_sent(),
        vec![ClientMessage::Interrupt { session_id: sid("s-1") }]
    );

    controller.handle_key(&key(KeyCode::Char('q')));
    assert_eq!(
        transport.take_sent(),
        vec![ClientMessage::Input {
            session_id: sid("s-1"),
            data: "q".to_string()
        }]
    );

    controller.blur();
    controller.handle_key(&key(KeyCode::Esc));
    controller.handle_key(&key(KeyCode::Char('q')));
    assert!(transport.take_sent().is_empty());
}

#[test]
fn test_interrupt_follows_session_change() {
    let transport = LocalTransport::new();
    let (mut controller, _) = mount(&transport, "s-1");
    controller.set_props(SessionProps::new("s-2", SessionStatus::Active));
    transport.take_sent();

    controller.handle_key(&key(KeyCode::Esc));
    assert_eq!(
        transport.take_sent(),
        vec![ClientMessage::Interrupt { session_id: sid("s-2") }]
    );
}

#[test]
fn test_equal_props_do_nothing() {
    let transport = LocalTransport::new();
    let (mut controller, recorder) = mount(&transport, "s-1");
    transport.take_sent();
    recorder.clear();

    let change = controller.set_props(SessionProps::new("s-1", SessionStatus::Active));
    assert_eq!(change, PropsChange::Unchanged);
    assert!(recorder.calls().is_empty());
    assert!(transport.sent().is_empty());
    assert_eq!(transport.handler_count(), 4);
    for kind in [
        EventKind::SessionStatus,
        EventKind::SessionAttached,
        EventKind::TerminalOutput,
        EventKind::TerminalExit,
    ] {
        assert_eq!(transport.handler_count_for(kind), 1);
    }
}

#[test]
fn test_container_resize_fits_on_next_frame() {
    let transport = LocalTransport::new();
    let (mut controller, recorder) = mount(&transport, "s-1");
    let before = controller.dimensions().unwrap();
    transport.take_sent();
    recorder.clear();

    controller.on_container_resize(ContainerSize::new(400.0, 200.0));
    controller.on_container_resize(ContainerSize::new(1200.0, 600.0));
    assert!(recorder.calls().is_empty());
    assert!(transport.sent().is_empty());

    assert!(controller.on_animation_frame());
    assert!(!controller.on_animation_frame());

    let after = controller.dimensions().unwrap();
    assert_ne!(before, after);
    assert_eq!(recorder.calls(), vec![Call::Fit(0), Call::ScrollToBottom(0)]);
    assert_eq!(
        transport.sent(),
        vec![ClientMessage::Resize {
            session_id: sid("s-1"),
            cols: after.0,
            rows: after.1
        }]
    );
}

#[test]
fn test_cursor_report_goes_out_as_input() {
    let transport = LocalTransport::new();
    let (_controller, _) = mount(&transport, "s-1");
    transport.take_sent();

    transport.deliver(&output("s-1", "\x1b[3;5H\x1b[6n"));
    assert_eq!(
        transport.sent(),
        vec![ClientMessage::Input {
            session_id: sid("s-1"),
            data: "\x1b[3;5R".to_string()
        }]
    );
}

#[test]
fn test_links_in_output() {
    let transport = LocalTransport::new();
    let (controller, _) = mount(&transport, "s-1");
    transport.deliver(&output("s-1", "PR opened: https://github.com/org/repo/pull/7\r\n"));

    let links = controller.links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].url, "https://github.com/org/repo/pull/7");
    assert_eq!(links[0].row, 0);
}

#[test]
fn test_unmount_releases_everything() {
    let transport = LocalTransport::new();
    let (controller, recorder) = mount(&transport, "s-1");
    transport.take_sent();

    controller.unmount();
    assert_eq!(transport.handler_count(), 0);
    assert_eq!(recorder.count(|c| matches!(c, Call::Dispose(_))), 1);
    assert_eq!(
        transport.sent(),
        vec![ClientMessage::Detach { session_id: sid("s-1") }]
    );

    // Late events after teardown are ignored
    transport.deliver(&output("s-1", "late"));
    assert_eq!(recorder.count(|c| matches!(c, Call::Write(..))), 0);
}
