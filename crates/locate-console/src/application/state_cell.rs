//! Subscribable copy-on-write state shared by every store.
//!
//! A [`StateCell`] holds its snapshot as an `Rc<T>`.  Writers build a new
//! value and swap it in; readers and listeners keep whatever `Rc` they were
//! handed, which never changes underneath them.  Two snapshots are the same
//! state exactly when `Rc::ptr_eq` says so, so a listener can skip work for
//! unchanged data with a pointer compare.
//!
//! # Listener rules
//!
//! - `subscribe` calls the new listener once, synchronously, with the current
//!   snapshot before it returns.
//! - Every successful replace calls every listener once, in subscription
//!   order, with the new snapshot.
//! - Listeners may read the cell, subscribe, or drop subscriptions while being
//!   notified.  They must not write to the same cell.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&Rc<T>)>;
type ListenerList<T> = RefCell<Vec<(u64, Listener<T>)>>;

/// A single subscribable value.
pub struct StateCell<T> {
    state: RefCell<Rc<T>>,
    listeners: Rc<ListenerList<T>>,
    next_id: Cell<u64>,
}

impl<T: 'static> StateCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: RefCell::new(Rc::new(initial)),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Returns the current snapshot.
    pub fn get(&self) -> Rc<T> {
        Rc::clone(&self.state.borrow())
    }

    /// Registers `listener` and immediately replays the current snapshot to it.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe(&self, listener: impl Fn(&Rc<T>) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let listener: Listener<T> = Rc::new(listener);
        self.listeners.borrow_mut().push((id, Rc::clone(&listener)));

        let snapshot = self.get();
        listener(&snapshot);

        let weak: Weak<ListenerList<T>> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(list) = weak.upgrade() {
                list.borrow_mut().retain(|(i, _)| *i != id);
            }
        })
    }

    /// Swaps in `next` and notifies listeners.
    ///
    /// Returns `false` (and notifies nobody) when `next` is the snapshot
    /// already held.
    pub fn set(&self, next: Rc<T>) -> bool {
        {
            let mut current = self.state.borrow_mut();
            if Rc::ptr_eq(&current, &next) {
                return false;
            }
            *current = Rc::clone(&next);
        }
        self.notify(&next);
        true
    }

    /// Wraps `next` in a fresh `Rc` and swaps it in.
    pub fn replace(&self, next: T) {
        self.set(Rc::new(next));
    }

    /// Copy-on-write update.
    ///
    /// `f` sees the current snapshot and returns `Some(new)` to replace it or
    /// `None` to leave it untouched.  Returns whether a replace happened.
    pub fn update(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        let current = self.get();
        match f(&current) {
            Some(next) => self.set(Rc::new(next)),
            None => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&self, snapshot: &Rc<T>) {
        // Clone the list so listeners can (un)subscribe while we iterate.
        let listeners: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl<T: Default + 'static> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Handle returned by [`StateCell::subscribe`].  Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Removes the listener now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
