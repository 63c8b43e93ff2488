use crate::mesh::{Geometry, Material, MeshId, VisualMesh};
use glam::Vec3;
use propyard_common::Ray;
use propyard_kernel::{BodyHandle, PhysicsWorld};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Events produced by scene mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    MeshAdded { mesh: MeshId },
    MeshRemoved { mesh: MeshId },
    Bound { mesh: MeshId, body: BodyHandle },
    Unbound { mesh: MeshId, body: BodyHandle },
    /// GPU-side geometry/material for the mesh were released.
    ResourcesReleased { mesh: MeshId, geometry: Geometry, material: Material },
}

/// Nearest mesh hit by a scene ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    pub mesh: MeshId,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Render-side scene: meshes and their one-way bindings to physics bodies.
///
/// # Invariants
/// - A mesh is bound to at most one body and a body to at most one mesh.
/// - `sync_from_physics` only ever writes mesh transforms, never bodies.
/// - Every removed mesh releases its resources exactly once.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    meshes: BTreeMap<MeshId, VisualMesh>,
    bindings: BTreeMap<MeshId, BodyHandle>,
    next_id: u32,
    released: usize,
    events: Vec<SceneEvent>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: VisualMesh) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        self.meshes.insert(id, mesh);
        self.events.push(SceneEvent::MeshAdded { mesh: id });
        id
    }

    /// Detach a mesh, drop its body binding and release its resources.
    pub fn remove_mesh(&mut self, id: MeshId) -> Option<VisualMesh> {
        let mesh = self.meshes.remove(&id)?;
        if let Some(body) = self.bindings.remove(&id) {
            self.events.push(SceneEvent::Unbound { mesh: id, body });
        }
        self.events.push(SceneEvent::MeshRemoved { mesh: id });
        self.release(id, mesh.geometry, mesh.material);
        Some(mesh)
    }

    /// Swap a mesh's geometry and material, releasing the old ones.
    pub fn replace_appearance(&mut self, id: MeshId, geometry: Geometry, material: Material) -> bool {
        let Some(mesh) = self.meshes.get_mut(&id) else {
            return false;
        };
        let old_geometry = std::mem::replace(&mut mesh.geometry, geometry);
        let old_material = std::mem::replace(&mut mesh.material, material);
        self.release(id, old_geometry, old_material);
        true
    }

    fn release(&mut self, mesh: MeshId, geometry: Geometry, material: Material) {
        tracing::trace!(?mesh, "releasing mesh resources");
        self.released += 1;
        self.events.push(SceneEvent::ResourcesReleased {
            mesh,
            geometry,
            material,
        });
    }

    pub fn get(&self, id: MeshId) -> Option<&VisualMesh> {
        self.meshes.get(&id)
    }

    pub fn get_mut(&mut self, id: MeshId) -> Option<&mut VisualMesh> {
        self.meshes.get_mut(&id)
    }

    pub fn contains(&self, id: MeshId) -> bool {
        self.meshes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &VisualMesh)> {
        self.meshes.iter().map(|(id, m)| (*id, m))
    }

    /// Number of geometry/material sets released so far.
    pub fn released_count(&self) -> usize {
        self.released
    }

    /// Pair a mesh with the body that drives it. Any earlier pairing of
    /// either side is dropped first.
    pub fn bind(&mut self, mesh: MeshId, body: BodyHandle) -> bool {
        if !self.meshes.contains_key(&mesh) {
            return false;
        }
        let stale: Vec<MeshId> = self
            .bindings
            .iter()
            .filter(|(m, b)| **b == body && **m != mesh)
            .map(|(m, _)| *m)
            .collect();
        for m in stale {
            self.unbind(m);
        }
        if let Some(previous) = self.bindings.insert(mesh, body) {
            if previous != body {
                self.events.push(SceneEvent::Unbound {
                    mesh,
                    body: previous,
                });
            }
        }
        self.events.push(SceneEvent::Bound { mesh, body });
        true
    }

    pub fn unbind(&mut self, mesh: MeshId) -> Option<BodyHandle> {
        let body = self.bindings.remove(&mesh)?;
        self.events.push(SceneEvent::Unbound { mesh, body });
        Some(body)
    }

    pub fn binding(&self, mesh: MeshId) -> Option<BodyHandle> {
        self.bindings.get(&mesh).copied()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Copy each bound body's position and orientation into its mesh verbatim.
    ///
    /// Scale and visibility are untouched. Pairs whose body no longer exists
    /// are skipped. Returns the number of meshes written.
    pub fn sync_from_physics(&mut self, world: &PhysicsWorld) -> usize {
        let mut written = 0;
        for (mesh_id, body_handle) in &self.bindings {
            let (Some(mesh), Some(body)) = (self.meshes.get_mut(mesh_id), world.get(*body_handle))
            else {
                continue;
            };
            mesh.transform.position = body.position;
            mesh.transform.rotation = body.orientation;
            written += 1;
        }
        written
    }

    /// Nearest hit among `candidates` within `max_distance`. Unknown ids are ignored.
    pub fn raycast<I>(&self, ray: &Ray, candidates: I, max_distance: f32) -> Option<MeshHit>
    where
        I: IntoIterator<Item = MeshId>,
    {
        let mut best: Option<MeshHit> = None;
        for id in candidates {
            let Some(mesh) = self.meshes.get(&id) else {
                continue;
            };
            let Some(hit) = mesh.intersect(ray) else {
                continue;
            };
            if hit.distance > max_distance {
                continue;
            }
            if best.is_none_or(|b| hit.distance < b.distance) {
                best = Some(MeshHit {
                    mesh: id,
                    point: hit.point,
                    normal: hit.normal,
                    distance: hit.distance,
                });
            }
        }
        best
    }

    /// Drain and return all pending scene events.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }
}
