//! Subscriber registry for newly observed notifications.
//!
//! Every listener call is guarded on its own: an error return is logged, and
//! a panic is caught and logged, so delivery always continues to the
//! remaining listeners.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{error, warn};

use assoc_core::{NotificationEntry, Result};

/// Callback receiving the entries newly observed by one poll cycle.
pub type Listener = Arc<dyn Fn(&[NotificationEntry]) -> Result<()> + Send + Sync>;

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Observer list with per-listener isolation.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Inner>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Dropping the returned handle keeps it registered.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[NotificationEntry]) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Deliver `entries` to every listener, in registration order.
    ///
    /// Returns the number of listeners that completed without error.
    pub fn notify(&self, entries: &[NotificationEntry]) -> usize {
        // Snapshot so listeners may (un)subscribe while being called.
        let snapshot: Vec<(u64, Listener)> = self.inner.lock().clone();
        let mut delivered = 0;

        for (listener_id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(entries))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(listener_id, error = %e, "Notification listener failed");
                }
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!(listener_id, reason = %reason, "Notification listener panicked");
                }
            }
        }
        delivered
    }
}

/// Handle returned by [`ListenerRegistry::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Inner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener. No-op if the registry was already cleared.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assoc_core::{Error, NotificationType};
    use std::sync::atomic::AtomicUsize;

    fn entries() -> Vec<NotificationEntry> {
        vec![NotificationEntry::new(1, NotificationType::System, "hello")]
    }

    fn counter(registry: &ListenerRegistry) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let sub = registry.subscribe(move |batch| {
            c.fetch_add(batch.len(), Ordering::SeqCst);
            Ok(())
        });
        (count, sub)
    }

    #[test]
    fn test_notify_reaches_every_listener() {
        let registry = ListenerRegistry::new();
        let (a, _sa) = counter(&registry);
        let (b, _sb) = counter(&registry);

        assert_eq!(registry.notify(&entries()), 2);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let registry = ListenerRegistry::new();
        let (a, sub) = counter(&registry);
        sub.unsubscribe();

        assert!(registry.is_empty());
        assert_eq!(registry.notify(&entries()), 0);
        assert_eq!(a.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failing_listener_does_not_block_others() {
        let registry = ListenerRegistry::new();
        let _bad = registry.subscribe(|_| Err(Error::Internal("listener bug".into())));
        let _panics = registry.subscribe(|_| panic!("listener exploded"));
        let (good, _sg) = counter(&registry);

        assert_eq!(registry.notify(&entries()), 1);
        assert_eq!(good.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unsubscribe_after_clear_is_noop() {
        let registry = ListenerRegistry::new();
        let (_a, sub) = counter(&registry);
        registry.clear();
        sub.unsubscribe();
        assert!(registry.is_empty());
    }
}
