use crate::collaborator::{to_payload, LoadCallback, Persistence, SharedSubscribers, Snapshot, Subscribers, Subscription};
use parking_lot::Mutex;
use propyard_common::PlacedObject;
use std::sync::Arc;

#[derive(Default)]
struct Stored {
    objects: Vec<PlacedObject>,
    revision: u64,
}

/// In-process backend with immediate echo.
///
/// `save` replaces the stored list and notifies every subscriber before
/// returning; `subscribe` fires once with the current list right away.
#[derive(Default)]
pub struct MemoryStore {
    stored: Mutex<Stored>,
    saves: Mutex<u64>,
    subscribers: SharedSubscribers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-populated list at revision 1.
    pub fn with_objects(objects: Vec<PlacedObject>) -> Self {
        Self {
            stored: Mutex::new(Stored {
                objects,
                revision: 1,
            }),
            ..Self::default()
        }
    }

    pub fn objects(&self) -> Vec<PlacedObject> {
        self.stored.lock().objects.clone()
    }

    pub fn revision(&self) -> u64 {
        self.stored.lock().revision
    }

    /// Number of `save` calls received.
    pub fn save_count(&self) -> u64 {
        *self.saves.lock()
    }

    pub fn subscriber_count(&self) -> usize {
        Subscribers::len(&self.subscribers)
    }

    /// Simulate a change made elsewhere (another tab, a remote edit).
    pub fn replace_external(&self, objects: Vec<PlacedObject>) {
        let snapshot = self.store(objects);
        Subscribers::notify(&self.subscribers, &snapshot);
    }

    fn store(&self, objects: Vec<PlacedObject>) -> Snapshot {
        let payload = to_payload(&objects);
        let mut stored = self.stored.lock();
        stored.objects = objects;
        stored.revision += 1;
        Snapshot {
            revision: stored.revision,
            payload,
        }
    }
}

impl Persistence for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn save(&self, objects: Vec<PlacedObject>) -> u64 {
        let snapshot = self.store(objects);
        *self.saves.lock() += 1;
        tracing::debug!(
            revision = snapshot.revision,
            count = snapshot.payload.as_array().map_or(0, Vec::len),
            "memory save"
        );
        Subscribers::notify(&self.subscribers, &snapshot);
        snapshot.revision
    }

    fn subscribe(&self, callback: LoadCallback) -> Subscription {
        let snapshot = {
            let stored = self.stored.lock();
            Snapshot {
                revision: stored.revision,
                payload: to_payload(&stored.objects),
            }
        };
        let subscription = Subscribers::add(&self.subscribers, Arc::clone(&callback));
        callback(snapshot);
        subscription
    }
}
