//! Payload-free change notifications with scoped subscriptions.
//!
//! Subscribing returns a [`Subscription`]; dropping it unwires the
//! listener, so there is no separate unsubscribe call to forget.
//! Everything here runs on the interaction thread, hence `Rc`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener = Box<dyn FnMut()>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
    /// Nesting depth of `emit` calls in progress.
    depth: u32,
    dropped: Vec<u64>,
}

/// A notification with no payload ("something changed").
#[derive(Default)]
pub struct Event {
    inner: Rc<RefCell<Listeners>>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire `listener`; it stays wired while the returned guard lives.
    #[must_use = "dropping the subscription unwires the listener"]
    pub fn subscribe(&self, listener: impl FnMut() + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push((id, Box::new(listener)));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.inner),
        }
    }

    /// Call every listener once.
    ///
    /// Listeners may subscribe or drop subscriptions while being called.
    pub fn emit(&self) {
        let mut entries = {
            let mut inner = self.inner.borrow_mut();
            inner.depth += 1;
            std::mem::take(&mut inner.entries)
        };
        for (_, listener) in entries.iter_mut() {
            listener();
        }
        let mut inner = self.inner.borrow_mut();
        let added = std::mem::replace(&mut inner.entries, entries);
        inner.entries.extend(added);
        let dropped = std::mem::take(&mut inner.dropped);
        inner.entries.retain(|(id, _)| !dropped.contains(id));
        inner.depth -= 1;
        // An outer emit still holds entries taken before these drops.
        if inner.depth > 0 {
            inner.dropped = dropped;
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Guard returned by [`Event::subscribe`]. Unwires on drop.
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        let mut inner = listeners.borrow_mut();
        if inner.depth > 0 {
            inner.dropped.push(self.id);
        }
        inner.entries.retain(|(id, _)| *id != self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
