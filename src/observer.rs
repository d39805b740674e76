//! State observer.
//!
//! An [`Observer`] holds the current state of a binding and notifies subscribers of every state
//! transition. New subscribers immediately receive the current state once.
use crate::AsyncValue;
use slab::Slab;
use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

type Listener<T> = Rc<dyn Fn(&AsyncValue<T>)>;

struct Inner<T> {
    state: AsyncValue<T>,
    listeners: Slab<Listener<T>>,
}

/// Current state plus the list of its subscribers.
pub struct Observer<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observer")
            .field("state", &inner.state)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl<T: Clone + 'static> Observer<T> {
    pub fn new(state: AsyncValue<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state,
                listeners: Slab::new(),
            })),
        }
    }

    /// Clone of the current state.
    pub fn get(&self) -> AsyncValue<T> {
        self.inner.borrow().state.clone()
    }

    /// Run a closure with a reference to the current state.
    pub fn with<R>(&self, f: impl FnOnce(&AsyncValue<T>) -> R) -> R {
        f(&self.inner.borrow().state)
    }

    /// Replace the current state and broadcast it to all subscribers.
    ///
    /// Listeners are called synchronously, in subscription order. A listener subscribed while
    /// being called only receives later transitions. A listener unsubscribed while being called
    /// receives nothing more, not even the current transition.
    pub fn set(&self, state: AsyncValue<T>) {
        let listeners: Vec<(usize, Listener<T>)> = {
            let mut inner = self.inner.borrow_mut();
            inner.state = state.clone();
            inner
                .listeners
                .iter()
                .map(|(id, l)| (id, l.clone()))
                .collect()
        };
        for (id, listener) in listeners {
            let subscribed = self
                .inner
                .borrow()
                .listeners
                .get(id)
                .is_some_and(|current| Rc::ptr_eq(current, &listener));
            if subscribed {
                listener(&state);
            }
        }
    }

    /// Subscribe for updates.
    ///
    /// The listener is called once with the current state before this returns, and then with
    /// every subsequent state until the returned [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe(&self, listener: impl Fn(&AsyncValue<T>) + 'static) -> Subscription {
        let listener: Listener<T> = Rc::new(listener);
        let (id, current) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.listeners.insert(listener.clone());
            (id, inner.state.clone())
        };
        listener(&current);

        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().listeners.try_remove(id);
                }
            })),
        }
    }

    /// Number of active subscribers.
    pub fn subscribers(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Handle to a subscription. Unsubscribes when dropped.
#[must_use = "dropping a subscription unsubscribes it"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Stop receiving updates.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
