//! Transport seam between session controllers and the session server.
//!
//! The transport is shared by every mounted controller and by the action
//! dispatcher; none of them owns it. Everything runs on one thread, so
//! handlers are plain `Fn` closures behind `Rc`.

mod local;
pub mod protocol;

pub use local::LocalTransport;
pub use protocol::{ClientMessage, EventKind, ServerEvent};

/// Callback for one kind of inbound event
pub type EventHandler = Box<dyn Fn(&ServerEvent)>;

pub trait Transport {
    /// Fire-and-forget submission
    fn send(&self, message: ClientMessage);

    /// Subscribe to one event kind; dropping the returned guard unsubscribes.
    fn on(&self, kind: EventKind, handler: EventHandler) -> Subscription;

    /// Current link state. Read at call time, never cached.
    fn is_connected(&self) -> bool;
}

/// Unsubscribes on drop
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A guard with nothing to release
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
