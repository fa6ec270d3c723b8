// Single-threaded publish/subscribe.
//
// A Subscribers<E> list hands out Subscription handles. Dropping a handle
// removes its callback; `detach` leaves the callback installed for as long
// as the list lives. Callbacks run in subscription order and may subscribe
// or unsubscribe while a publish is in progress.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

type Callback<E> = Box<dyn FnMut(&E)>;

struct Registry<E> {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback<E>>,
    publishing: bool,
    // removals requested while callbacks were checked out
    removed: Vec<u64>,
}

trait Unsubscribe {
    fn unsubscribe(&self, id: u64);
}

impl<E> Unsubscribe for RefCell<Registry<E>> {
    fn unsubscribe(&self, id: u64) {
        let mut reg = self.borrow_mut();
        if reg.callbacks.remove(&id).is_none() && reg.publishing {
            reg.removed.push(id);
        }
    }
}

pub struct Subscribers<E> {
    inner: Rc<RefCell<Registry<E>>>,
}

impl<E: 'static> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                callbacks: BTreeMap::new(),
                publishing: false,
                removed: Vec::new(),
            })),
        }
    }

    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&E) + 'static,
    {
        let id = {
            let mut reg = self.inner.borrow_mut();
            let id = reg.next_id;
            reg.next_id += 1;
            reg.callbacks.insert(id, Box::new(callback));
            id
        };
        let weak: Weak<RefCell<Registry<E>>> = Rc::downgrade(&self.inner);
        let registry: Weak<dyn Unsubscribe> = weak;
        Subscription {
            registry: Some(registry),
            id,
        }
    }

    /// Deliver `event` to every live callback.
    pub fn publish(&self, event: &E) {
        let mut active = {
            let mut reg = self.inner.borrow_mut();
            if reg.publishing {
                // nested publish from inside a callback: callbacks are
                // checked out, so there is nobody to deliver to
                return;
            }
            reg.publishing = true;
            core::mem::take(&mut reg.callbacks)
        };

        for (id, cb) in active.iter_mut() {
            if self.inner.borrow().removed.contains(id) {
                continue;
            }
            cb(event);
        }

        let mut reg = self.inner.borrow_mut();
        let removed = core::mem::take(&mut reg.removed);
        active.retain(|id, _| !removed.contains(id));
        // subscriptions made during the publish keep their later ids
        active.append(&mut reg.callbacks);
        reg.callbacks = active;
        reg.publishing = false;
    }

    pub fn len(&self) -> usize {
        let reg = self.inner.borrow();
        reg.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `Subscribers::subscribe`.
pub struct Subscription {
    registry: Option<Weak<dyn Unsubscribe>>,
    id: u64,
}

impl Subscription {
    /// Keep the callback installed without holding the handle.
    pub fn detach(mut self) {
        self.registry = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reg) = self.registry.take().and_then(|w| w.upgrade()) {
            reg.unsubscribe(self.id);
        }
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.registry.is_some())
            .finish()
    }
}
