use parking_lot::Mutex;
use propyard_common::PlacedObject;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// One delivery of stored state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Backend revision the payload reflects. Comparable with the value
    /// returned by [`Persistence::save`]; 0 means nothing was ever saved.
    pub revision: u64,
    /// Untrusted JSON: remote backends may deliver anything, so consumers
    /// validate it themselves.
    pub payload: serde_json::Value,
}

/// Receives the persisted object list.
pub type LoadCallback = Arc<dyn Fn(Snapshot) + Send + Sync>;

/// A backend that stores the placed-object list.
///
/// Saves are fire-and-forget: they never block and never report failure to
/// the caller. Backends log their own errors.
pub trait Persistence: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Store `objects` and return the revision assigned to this save.
    /// Revisions increase with every save and every change from elsewhere.
    fn save(&self, objects: Vec<PlacedObject>) -> u64;

    /// Register a load callback. It fires at least once with the current
    /// state, possibly from another thread, and again whenever the stored
    /// state changes. Dropping the returned [`Subscription`] unsubscribes.
    fn subscribe(&self, callback: LoadCallback) -> Subscription;
}

#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    callbacks: BTreeMap<u64, LoadCallback>,
}

pub(crate) type SharedSubscribers = Arc<Mutex<Subscribers>>;

impl Subscribers {
    pub(crate) fn add(shared: &SharedSubscribers, callback: LoadCallback) -> Subscription {
        let mut subs = shared.lock();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.callbacks.insert(id, callback);
        Subscription {
            id,
            registry: Arc::downgrade(shared),
        }
    }

    pub(crate) fn get(shared: &SharedSubscribers, id: u64) -> Option<LoadCallback> {
        shared.lock().callbacks.get(&id).cloned()
    }

    /// Call every live callback. The lock is released before any callback
    /// runs, so callbacks may subscribe or unsubscribe.
    pub(crate) fn notify(shared: &SharedSubscribers, snapshot: &Snapshot) {
        let callbacks: Vec<LoadCallback> = shared.lock().callbacks.values().cloned().collect();
        for callback in callbacks {
            callback(snapshot.clone());
        }
    }

    pub(crate) fn len(shared: &SharedSubscribers) -> usize {
        shared.lock().callbacks.len()
    }
}

/// Handle for a live subscription. Unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    /// Same as dropping the handle.
    pub fn unsubscribe(self) {}

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|r| r.lock().callbacks.contains_key(&self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().callbacks.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Serialize a list for delivery to subscribers.
pub(crate) fn to_payload(objects: &[PlacedObject]) -> serde_json::Value {
    match serde_json::to_value(objects) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode placed objects");
            serde_json::Value::Array(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, LoadCallback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (hits, Arc::new(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let shared = SharedSubscribers::default();
        let (hits, cb) = counter();
        let sub = Subscribers::add(&shared, cb);
        let empty = Snapshot {
            revision: 0,
            payload: serde_json::json!([]),
        };
        Subscribers::notify(&shared, &empty);
        assert!(sub.is_active());
        drop(sub);
        Subscribers::notify(&shared, &empty);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(Subscribers::len(&shared), 0);
    }

    #[test]
    fn subscription_outliving_backend_is_inert() {
        let shared = SharedSubscribers::default();
        let (_, cb) = counter();
        let sub = Subscribers::add(&shared, cb);
        drop(shared);
        assert!(!sub.is_active());
        sub.unsubscribe();
    }
}
