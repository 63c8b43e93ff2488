use propyard_common::{ObjectId, PlacedObject};
use propyard_kernel::BodyHandle;
use propyard_scene::MeshId;
use std::collections::BTreeMap;

/// One placed object and the render/physics pair it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub object: PlacedObject,
    pub mesh: MeshId,
    pub body: BodyHandle,
    /// Insertion order, used to serialize in placement order.
    seq: u64,
}

/// Authoritative map from object id to its (mesh, body) pair.
///
/// Entries always hold both handles; there is no half-registered state.
#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    entries: BTreeMap<ObjectId, RegistryEntry>,
    next_seq: u64,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. Returns the replaced entry, whose
    /// resources the caller must release.
    pub(crate) fn insert(
        &mut self,
        object: PlacedObject,
        mesh: MeshId,
        body: BodyHandle,
    ) -> Option<RegistryEntry> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            object.id.clone(),
            RegistryEntry {
                object,
                mesh,
                body,
                seq,
            },
        )
    }

    pub(crate) fn remove(&mut self, id: &ObjectId) -> Option<RegistryEntry> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &ObjectId) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// Find the entry whose mesh is `mesh`.
    pub fn by_mesh(&self, mesh: MeshId) -> Option<&RegistryEntry> {
        self.entries.values().find(|e| e.mesh == mesh)
    }

    /// The persisted form, in placement order.
    pub fn to_serialized(&self) -> Vec<PlacedObject> {
        let mut entries: Vec<&RegistryEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.object.clone()).collect()
    }
}
