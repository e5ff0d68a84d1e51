//! Container size observer.
//!
//! Resize notifications only mark a refit as pending; the controller does
//! the actual fit on the next animation frame so bursts of notifications
//! collapse into one fit against the latest size.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::addons::ContainerSize;

#[derive(Debug, Clone, Default)]
pub struct ContainerObserver {
    inner: Rc<ObserverInner>,
}

#[derive(Debug, Default)]
struct ObserverInner {
    observing: Cell<bool>,
    pending: RefCell<Option<ContainerSize>>,
}

impl ContainerObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self) {
        self.inner.observing.set(true);
    }

    pub fn is_observing(&self) -> bool {
        self.inner.observing.get()
    }

    /// Returns false when the notification was ignored
    pub fn notify(&self, size: ContainerSize) -> bool {
        if !self.inner.observing.get() {
            return false;
        }
        *self.inner.pending.borrow_mut() = Some(size);
        true
    }

    pub fn has_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    pub fn take_pending(&self) -> Option<ContainerSize> {
        self.inner.pending.borrow_mut().take()
    }

    /// Stop observing and drop any pending refit
    pub fn disconnect(&self) {
        self.inner.observing.set(false);
        self.inner.pending.borrow_mut().take();
    }
}
