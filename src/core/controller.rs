//! Terminal session controller
//!
//! Owns one emulator for one session id at a time and wires it to the shared
//! transport: emulator data and resizes go out as session commands, and
//! inbound status, attach, output and exit events come back in.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use tracing::{debug, info};

use super::addons::{ContainerSize, FitAddon, Link, LinkifyAddon};
use super::emulator::{
    Addon, Emulator, EmulatorEvent, EmulatorFactory, EmulatorOptions, ListenerId, ScreenSnapshot,
};
use super::observer::ContainerObserver;
use super::session::{SessionCommand, SessionId, SessionLink};
use super::status::{SessionStatus, StatusModel, StatusTrigger};
use crate::config::Config;
use crate::transport::{EventKind, ServerEvent, Subscription, Transport};
use crate::ui::view::SessionView;

type SharedEmulator = Rc<RefCell<Box<dyn Emulator>>>;

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOptions {
    pub emulator: EmulatorOptions,
    /// Send attach (and the current size) again when the transport reconnects
    pub reattach_on_reconnect: bool,
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            emulator: EmulatorOptions::from_config(&config.terminal),
            reattach_on_reconnect: config.session.reattach_on_reconnect,
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Inputs supplied by the owning parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProps {
    pub session_id: SessionId,
    pub session_status: SessionStatus,
}

impl SessionProps {
    pub fn new(session_id: impl Into<SessionId>, session_status: SessionStatus) -> Self {
        Self {
            session_id: session_id.into(),
            session_status,
        }
    }
}

/// What [`TerminalSessionController::set_props`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropsChange {
    Unchanged,
    StatusChanged,
    SessionChanged,
}

/// Inbound work for the emulator
enum Pending {
    Write(String),
    Clear,
}

/// Inbound events queue here and are applied in arrival order. When the
/// emulator is already borrowed further up the stack (a transport that
/// answers synchronously from inside `send`), the work waits until that
/// caller lets go and drains.
#[derive(Clone)]
struct Inbox {
    emulator: Weak<RefCell<Box<dyn Emulator>>>,
    queue: Rc<RefCell<VecDeque<Pending>>>,
}

impl Inbox {
    fn new(emulator: &SharedEmulator) -> Self {
        Self {
            emulator: Rc::downgrade(emulator),
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    fn push(&self, pending: Pending) {
        if self.emulator.strong_count() == 0 {
            debug!("Dropping event for a torn-down emulator");
            return;
        }
        self.queue.borrow_mut().push_back(pending);
        self.drain();
    }

    fn drain(&self) {
        let Some(shared) = self.emulator.upgrade() else {
            self.queue.borrow_mut().clear();
            return;
        };
        loop {
            let Ok(mut emulator) = shared.try_borrow_mut() else {
                return;
            };
            let Some(pending) = self.queue.borrow_mut().pop_front() else {
                return;
            };
            match pending {
                Pending::Write(data) => emulator.write(data.as_bytes()),
                Pending::Clear => emulator.clear(),
            }
        }
    }
}

/// Everything that lives exactly as long as one session id is mounted
struct MountedSession {
    session_id: SessionId,
    emulator: SharedEmulator,
    inbox: Inbox,
    observer: ContainerObserver,
    listeners: Vec<ListenerId>,
    subscriptions: Vec<Subscription>,
}

pub struct TerminalSessionController {
    factory: Box<dyn EmulatorFactory>,
    options: ControllerOptions,
    props: SessionProps,
    status: StatusModel,
    link: Rc<RefCell<SessionLink>>,
    container: ContainerSize,
    mounted: Option<MountedSession>,
    was_connected: bool,
}

impl TerminalSessionController {
    /// Create the controller and mount its first session
    pub fn new(
        transport: Rc<dyn Transport>,
        factory: Box<dyn EmulatorFactory>,
        options: ControllerOptions,
        props: SessionProps,
        container: ContainerSize,
    ) -> Self {
        let was_connected = transport.is_connected();
        let link = SessionLink::new(transport, props.session_id.clone());
        let mut controller = Self {
            factory,
            options,
            status: StatusModel::new(props.session_status),
            props,
            link: Rc::new(RefCell::new(link)),
            container,
            mounted: None,
            was_connected,
        };
        controller.mount();
        controller
    }

    fn mount(&mut self) {
        let session_id = self.props.session_id.clone();
        self.link.borrow_mut().set_session_id(session_id.clone());

        let mut emulator = self.factory.create(&self.options.emulator);
        emulator.load_addon(Addon::Fit(FitAddon::new(
            self.options.emulator.font_size,
            self.options.emulator.line_height,
        )));
        emulator.load_addon(Addon::Linkify(LinkifyAddon::new()));

        let link = self.link.clone();
        emulator.attach_custom_key_handler(Box::new(move |event: &KeyEvent| {
            if event.code != KeyCode::Esc {
                return true;
            }
            if event.kind != KeyEventKind::Release {
                link.borrow().send(SessionCommand::Interrupt);
            }
            false
        }));

        emulator.open(self.container);
        emulator.focus();
        emulator.fit(self.container);
        let (cols, rows) = emulator.dimensions();
        self.link.borrow().send(SessionCommand::Resize { cols, rows });

        // Registered after the initial fit so that size goes out only once
        let link = self.link.clone();
        let listener = emulator.on_event(Box::new(move |event: &EmulatorEvent| {
            let link = link.borrow();
            match event {
                EmulatorEvent::Data(data) => link.send(SessionCommand::Input(data.clone())),
                EmulatorEvent::Resize { cols, rows } => link.send(SessionCommand::Resize {
                    cols: *cols,
                    rows: *rows,
                }),
            };
        }));

        let emulator: SharedEmulator = Rc::new(RefCell::new(emulator));
        let inbox = Inbox::new(&emulator);
        let subscriptions = self.subscribe(&session_id, &inbox);

        let observer = ContainerObserver::new();
        observer.observe();

        if self.link.borrow().send(SessionCommand::Attach) {
            info!("Attached to session {} ({}x{})", session_id, cols, rows);
        } else {
            info!("Mounted session {} while disconnected", session_id);
        }

        self.mounted = Some(MountedSession {
            session_id,
            emulator,
            inbox,
            observer,
            listeners: vec![listener],
            subscriptions,
        });
    }

    fn subscribe(&self, session_id: &SessionId, inbox: &Inbox) -> Vec<Subscription> {
        let transport = self.link.borrow().transport().clone();
        let mut subscriptions = Vec::with_capacity(4);

        let id = session_id.clone();
        let status = self.status.clone();
        subscriptions.push(transport.on(
            EventKind::SessionStatus,
            Box::new(move |event| match event {
                ServerEvent::Status {
                    session_id,
                    status: next,
                } if *session_id == id => {
                    status.apply(StatusTrigger::StatusEvent(*next));
                }
                _ => debug!("Ignoring {} for {}", event.kind().name(), event.session_id()),
            }),
        ));

        let id = session_id.clone();
        let attached = inbox.clone();
        subscriptions.push(transport.on(
            EventKind::SessionAttached,
            Box::new(move |event| {
                if event.is_for(&id) {
                    attached.push(Pending::Clear);
                }
            }),
        ));

        let id = session_id.clone();
        let output = inbox.clone();
        subscriptions.push(transport.on(
            EventKind::TerminalOutput,
            Box::new(move |event| {
                if let ServerEvent::Output { session_id, data } = event {
                    if *session_id == id {
                        output.push(Pending::Write(data.clone()));
                    }
                }
            }),
        ));

        let id = session_id.clone();
        let status = self.status.clone();
        subscriptions.push(transport.on(
            EventKind::TerminalExit,
            Box::new(move |event| {
                if let ServerEvent::Exit {
                    session_id,
                    exit_code,
                } = event
                {
                    if *session_id == id {
                        info!("Session {} exited (code {:?})", session_id, exit_code);
                        status.apply(StatusTrigger::Exit);
                    }
                }
            }),
        ));

        subscriptions
    }

    /// Release everything the mounted session holds. Sends detach first
    /// while the link still carries the outgoing session id.
    fn teardown(&mut self) {
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        self.link.borrow().send(SessionCommand::Detach);

        mounted.observer.disconnect();
        // Emulator borrows never outlive a controller call, so nothing holds one here
        mounted.inbox.drain();
        {
            let mut emulator = mounted.emulator.borrow_mut();
            for id in mounted.listeners {
                emulator.off(id);
            }
        }
        drop(mounted.subscriptions);
        mounted.emulator.borrow_mut().dispose();
        info!("Unmounted session {}", mounted.session_id);
    }

    /// Apply new parent props. Equal props are a no-op; a new session id
    /// tears the old session down before the new one is built.
    pub fn set_props(&mut self, props: SessionProps) -> PropsChange {
        if props == self.props {
            return PropsChange::Unchanged;
        }
        if props.session_id != self.props.session_id {
            self.teardown();
            self.status.apply(StatusTrigger::Prop(props.session_status));
            self.props = props;
            self.mount();
            return PropsChange::SessionChanged;
        }
        self.status.apply(StatusTrigger::Prop(props.session_status));
        self.props = props;
        PropsChange::StatusChanged
    }

    pub fn props(&self) -> &SessionProps {
        &self.props
    }

    pub fn session_id(&self) -> &SessionId {
        &self.props.session_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status.get()
    }

    pub fn is_connected(&self) -> bool {
        self.link.borrow().is_connected()
    }

    pub fn view(&self) -> SessionView {
        SessionView::for_status(self.status(), self.is_connected())
    }

    /// Container size changed; the fit itself waits for the next frame
    pub fn on_container_resize(&mut self, size: ContainerSize) {
        self.container = size;
        if let Some(mounted) = &self.mounted {
            mounted.observer.notify(size);
        }
    }

    /// Run a pending fit. Returns whether one ran.
    pub fn on_animation_frame(&mut self) -> bool {
        let Some(mounted) = &self.mounted else {
            return false;
        };
        let Some(size) = mounted.observer.take_pending() else {
            return false;
        };
        self.update(|emulator| {
            emulator.fit(size);
            emulator.scroll_to_bottom();
        });
        true
    }

    pub fn on_connection_change(&mut self, connected: bool) {
        let was_connected = std::mem::replace(&mut self.was_connected, connected);
        if connected == was_connected {
            return;
        }
        info!(
            "Transport {} for session {}",
            if connected { "connected" } else { "disconnected" },
            self.props.session_id
        );
        if !connected || !self.options.reattach_on_reconnect {
            return;
        }
        let Some((cols, rows)) = self.dimensions() else {
            return;
        };
        let link = self.link.borrow();
        link.send(SessionCommand::Attach);
        link.send(SessionCommand::Resize { cols, rows });
    }

    /// Ask the server to restart the session's process. Only possible
    /// while connected; returns whether the request went out.
    pub fn resume(&self) -> bool {
        let sent = self.link.borrow().send(SessionCommand::Resume);
        if sent {
            info!("Resume requested for session {}", self.props.session_id);
        }
        sent
    }

    pub fn handle_key(&mut self, event: &KeyEvent) {
        self.update(|emulator| emulator.key(event));
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.update(|emulator| emulator.paste(text));
    }

    pub fn scroll_lines(&mut self, delta: i32) {
        self.update(|emulator| emulator.scroll_lines(delta));
    }

    pub fn focus(&mut self) {
        self.update(|emulator| emulator.focus());
    }

    pub fn blur(&mut self) {
        self.update(|emulator| emulator.blur());
    }

    pub fn has_focus(&self) -> bool {
        self.with_emulator(|emulator| emulator.has_focus())
            .unwrap_or(false)
    }

    pub fn dimensions(&self) -> Option<(u16, u16)> {
        self.with_emulator(|emulator| emulator.dimensions())
    }

    pub fn snapshot(&self) -> Option<ScreenSnapshot> {
        self.with_emulator(|emulator| emulator.snapshot())
    }

    pub fn links(&self) -> Vec<Link> {
        self.with_emulator(|emulator| emulator.links())
            .unwrap_or_default()
    }

    /// Run `f` on the mounted emulator, then apply whatever arrived while it ran
    fn update<R>(&self, f: impl FnOnce(&mut dyn Emulator) -> R) -> Option<R> {
        let mounted = self.mounted.as_ref()?;
        let result = f(&mut **mounted.emulator.borrow_mut());
        mounted.inbox.drain();
        Some(result)
    }

    pub fn with_emulator<R>(&self, f: impl FnOnce(&dyn Emulator) -> R) -> Option<R> {
        let mounted = self.mounted.as_ref()?;
        let emulator = mounted.emulator.try_borrow().ok()?;
        Some(f(&**emulator))
    }

    /// Tear down for good
    pub fn unmount(mut self) {
        self.teardown();
    }
}

impl Drop for TerminalSessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}
