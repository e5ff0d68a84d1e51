//! In-process transport.
//!
//! Inbound events are handed in by the host (`deliver`, `deliver_line`) and
//! dispatched synchronously in arrival order. Outbound messages are either
//! recorded or streamed as JSON lines to a writer.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::protocol::{ClientMessage, EventKind, ServerEvent};
use super::{EventHandler, Subscription, Transport};
use crate::error::ProtocolError;

type SharedHandler = Rc<dyn Fn(&ServerEvent)>;

struct HandlerEntry {
    id: u64,
    kind: EventKind,
    handler: SharedHandler,
}

enum Outbox {
    Record(Vec<ClientMessage>),
    Stream(Box<dyn Write>),
}

struct Inner {
    connected: Cell<bool>,
    handlers: RefCell<Vec<HandlerEntry>>,
    next_id: Cell<u64>,
    outbox: RefCell<Outbox>,
    send_calls: Cell<usize>,
}

/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct LocalTransport {
    inner: Rc<Inner>,
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTransport {
    /// Connected transport that records outbound messages
    pub fn new() -> Self {
        Self::with_outbox(Outbox::Record(Vec::new()))
    }

    /// Connected transport that writes each outbound message as a JSON line
    pub fn with_writer(writer: impl Write + 'static) -> Self {
        Self::with_outbox(Outbox::Stream(Box::new(writer)))
    }

    fn with_outbox(outbox: Outbox) -> Self {
        Self {
            inner: Rc::new(Inner {
                connected: Cell::new(true),
                handlers: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                outbox: RefCell::new(outbox),
                send_calls: Cell::new(0),
            }),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.set(connected);
    }

    /// Dispatch an event to every handler subscribed to its kind
    pub fn deliver(&self, event: &ServerEvent) {
        let kind = event.kind();
        // Snapshot first so handlers may subscribe or unsubscribe re-entrantly
        let handlers: Vec<SharedHandler> = self
            .inner
            .handlers
            .borrow()
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| Rc::clone(&entry.handler))
            .collect();
        if handlers.is_empty() {
            debug!("No handler for {}", kind.name());
        }
        for handler in handlers {
            handler(event);
        }
    }

    /// Parse one JSON line and dispatch it. Malformed lines are reported, not delivered.
    pub fn deliver_line(&self, line: &str) -> Result<(), ProtocolError> {
        let event = ServerEvent::parse(line)?;
        self.deliver(&event);
        Ok(())
    }

    /// Messages recorded so far (empty when streaming)
    pub fn sent(&self) -> Vec<ClientMessage> {
        match &*self.inner.outbox.borrow() {
            Outbox::Record(messages) => messages.clone(),
            Outbox::Stream(_) => Vec::new(),
        }
    }

    /// Drain recorded messages
    pub fn take_sent(&self) -> Vec<ClientMessage> {
        match &mut *self.inner.outbox.borrow_mut() {
            Outbox::Record(messages) => std::mem::take(messages),
            Outbox::Stream(_) => Vec::new(),
        }
    }

    /// How many times `send` was called, connected or not
    pub fn send_calls(&self) -> usize {
        self.inner.send_calls.get()
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    pub fn handler_count_for(&self, kind: EventKind) -> usize {
        self.inner
            .handlers
            .borrow()
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    pub fn flush(&self) -> Result<(), ProtocolError> {
        if let Outbox::Stream(writer) = &mut *self.inner.outbox.borrow_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn remove_handler(inner: &Weak<Inner>, id: u64) {
        if let Some(inner) = inner.upgrade() {
            inner.handlers.borrow_mut().retain(|entry| entry.id != id);
        }
    }
}

impl Transport for LocalTransport {
    fn send(&self, message: ClientMessage) {
        self.inner.send_calls.set(self.inner.send_calls.get() + 1);
        if !self.inner.connected.get() {
            debug!("Dropping {:?} while disconnected", message);
            return;
        }
        match &mut *self.inner.outbox.borrow_mut() {
            Outbox::Record(messages) => messages.push(message),
            Outbox::Stream(writer) => {
                let written = message
                    .to_json()
                    .and_then(|line| writeln!(writer, "{}", line).map_err(ProtocolError::from));
                if let Err(e) = written {
                    tracing::error!("Failed to write outbound message: {}", e);
                }
            }
        }
    }

    fn on(&self, kind: EventKind, handler: EventHandler) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.handlers.borrow_mut().push(HandlerEntry {
            id,
            kind,
            handler: Rc::from(handler),
        });
        let inner = Rc::downgrade(&self.inner);
        Subscription::new(move || LocalTransport::remove_handler(&inner, id))
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.get()
    }
}
