// SPDX-License-Identifier: MIT OR Apache-2.0
//! Broadcast event channels.
//!
//! An [`EventChannel`] is an ordered set of callbacks. Listeners are added
//! and removed by [`ListenerId`] and fired in registration order. Callbacks
//! may add or remove listeners, or fire other channels, while a fire is in
//! progress; the set of callbacks invoked by one `fire` is the set that was
//! registered when it started, minus any removed before their turn.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Unique identifier for a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    /// Create a new random listener ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

type Callback<T> = Rc<RefCell<dyn FnMut(T)>>;

/// An observer list carrying values of type `T`
pub struct EventChannel<T> {
    listeners: RefCell<IndexMap<ListenerId, Callback<T>>>,
}

impl<T: Clone + 'static> EventChannel<T> {
    /// Create an empty channel
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(IndexMap::new()),
        }
    }

    /// Register a callback
    pub fn add_listener(&self, callback: impl FnMut(T) + 'static) -> ListenerId {
        let id = ListenerId::new();
        let callback: Callback<T> = Rc::new(RefCell::new(callback));
        self.listeners.borrow_mut().insert(id, callback);
        id
    }

    /// Unregister a callback; returns false if it was not registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().shift_remove(&id).is_some()
    }

    /// Whether a listener is registered
    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.borrow().contains_key(&id)
    }

    /// Get listener count
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Remove every listener
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    /// Invoke every listener with `value`
    pub fn fire(&self, value: T) {
        let snapshot: Vec<(ListenerId, Callback<T>)> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();

        for (id, callback) in snapshot {
            if !self.contains(id) {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut callback) => (*callback)(value.clone()),
                Err(_) => {
                    tracing::warn!("Skipping recursive dispatch to listener {:?}", id.0);
                }
            }
        }
    }
}

impl<T: Clone + 'static> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
