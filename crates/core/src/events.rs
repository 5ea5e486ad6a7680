//! Change listeners for the client-side stores.
//!
//! Each store owns a [`Listeners`] registry. Subscribing returns a
//! [`Subscription`] guard; the listener stays registered until the guard is
//! dropped or [`Subscription::unsubscribe`] is called. Use
//! [`Subscription::detach`] to keep a listener for the life of the store.
//!
//! Listeners run synchronously on the writing thread, in subscription order,
//! after the write has been attempted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener<E>)>>,
}

/// A registry of listeners for events of type `E`.
pub struct Listeners<E> {
    registry: Arc<Registry<E>>,
}

impl<E: 'static> Listeners<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(0),
                entries: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register `listener`.
    #[must_use = "dropping the subscription unsubscribes the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut entries) = self.registry.entries.lock() {
            entries.push((id, Arc::new(listener)));
        }

        let registry: Weak<Registry<E>> = Arc::downgrade(&self.registry);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade()
                    && let Ok(mut entries) = registry.entries.lock()
                {
                    entries.retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Call every registered listener with `event`.
    pub fn emit(&self, event: &E) {
        // Clone out so a listener may subscribe or unsubscribe without deadlocking.
        let listeners: Vec<Listener<E>> = match self.registry.entries.lock() {
            Ok(entries) => entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };

        for listener in listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.registry.entries.lock().map_or(0, |entries| entries.len());
        f.debug_struct("Listeners").field("count", &count).finish()
    }
}

/// Handle returned by [`Listeners::subscribe`].
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the listener registered for as long as the registry lives.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_emit_in_subscription_order() {
        let listeners = Listeners::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let seen = Arc::clone(&seen);
            listeners.subscribe(move |n| seen.lock().unwrap().push(("first", *n)))
        };
        let second = {
            let seen = Arc::clone(&seen);
            listeners.subscribe(move |n| seen.lock().unwrap().push(("second", *n)))
        };

        listeners.emit(&7);
        assert_eq!(*seen.lock().unwrap(), vec![("first", 7), ("second", 7)]);

        drop(first);
        drop(second);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let listeners = Listeners::<()>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let sub = {
            let calls = Arc::clone(&calls);
            listeners.subscribe(move |()| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        listeners.emit(&());
        sub.unsubscribe();
        listeners.emit(&());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_drop_unsubscribes_and_detach_keeps() {
        let listeners = Listeners::<()>::new();

        drop(listeners.subscribe(|()| {}));
        assert_eq!(listeners.len(), 0);

        listeners.subscribe(|()| {}).detach();
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_subscription_outlives_registry() {
        let listeners = Listeners::<()>::new();
        let sub = listeners.subscribe(|()| {});
        drop(listeners);
        sub.unsubscribe();
    }
}
