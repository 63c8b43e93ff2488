//! Placement tool: ghost preview, grid snapping and the commit/remove/reload lifecycle.

use crate::decode::{self, DecodeError, SkippedEntry};
use crate::ghost::GhostPreview;
use crate::registry::ObjectRegistry;
use glam::Vec3;
use propyard_assets::{AssetCatalog, AssetDescriptor, AssetError};
use propyard_common::{ObjectId, PlacedObject, Ray};
use propyard_kernel::{PhysicsWorld, RigidBody, Shape};
use propyard_persist::Persistence;
use propyard_scene::{Geometry, Material, MeshId, SceneGraph, VisualMesh};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Placement tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Grid spacing on x and z, in meters.
    pub grid_step: f32,
    /// One ghost rotation step, in degrees.
    pub rotation_step_deg: f32,
    pub ghost_opacity: f32,
    /// Farthest surface the placement ray may snap to.
    pub max_distance: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            grid_step: 5.0,
            rotation_step_deg: 90.0,
            ghost_opacity: 0.5,
            max_distance: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementState {
    /// Previewing; the ghost follows the aim.
    Idle,
    /// A commit is building its mesh and body.
    Committing,
}

/// Whether a removal should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Save,
    /// Used for bulk operations that save (or deliberately don't) once at the end.
    Suppress,
}

/// Outcome of a reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReloadReport {
    pub loaded: usize,
    pub removed: usize,
    pub skipped: Vec<SkippedEntry>,
}

/// Snap a surface hit to the placement grid so that an object of the given
/// half height rests on it.
pub fn snap_to_grid(hit: Vec3, grid_step: f32, half_height: f32) -> Vec3 {
    let snap = |v: f32| {
        if grid_step > 0.0 {
            (v / grid_step).round() * grid_step
        } else {
            v
        }
    };
    Vec3::new(snap(hit.x), hit.y + half_height, snap(hit.z))
}

/// Owns the ghost, the object registry and the placeable-surface set.
///
/// Every registry mutation goes through `commit`, `remove` or `reload`.
pub struct PlacementTool {
    config: PlacementConfig,
    catalog: Arc<AssetCatalog>,
    persistence: Arc<dyn Persistence>,
    registry: ObjectRegistry,
    ghost: GhostPreview,
    floor: MeshId,
    surfaces: BTreeSet<MeshId>,
    selected: usize,
    state: PlacementState,
    saved_revision: u64,
}

impl PlacementTool {
    /// Create the tool and its ghost. `floor` is the base placeable surface.
    pub fn new(
        config: PlacementConfig,
        catalog: Arc<AssetCatalog>,
        persistence: Arc<dyn Persistence>,
        floor: MeshId,
        scene: &mut SceneGraph,
    ) -> Self {
        let ghost = GhostPreview::spawn(scene, config.ghost_opacity);
        let mut tool = Self {
            config,
            catalog,
            persistence,
            registry: ObjectRegistry::new(),
            ghost,
            floor,
            surfaces: BTreeSet::from([floor]),
            selected: 0,
            state: PlacementState::Idle,
            saved_revision: 0,
        };
        tool.refresh_ghost(scene);
        tool
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn ghost(&self) -> &GhostPreview {
        &self.ghost
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Backend revision of the latest local save; 0 before the first one.
    /// Persisted state older than this predates a local edit.
    pub fn saved_revision(&self) -> u64 {
        self.saved_revision
    }

    pub fn selected_asset(&self) -> Result<&AssetDescriptor, AssetError> {
        self.catalog.decoration(self.selected)
    }

    pub fn placeable_surfaces(&self) -> &BTreeSet<MeshId> {
        &self.surfaces
    }

    pub fn to_serialized(&self) -> Vec<PlacedObject> {
        self.registry.to_serialized()
    }

    /// Select a palette entry by index. Out-of-range indices are ignored.
    pub fn select_asset(&mut self, scene: &mut SceneGraph, index: usize) -> bool {
        if index >= self.catalog.decoration_count() {
            tracing::debug!(index, "palette index out of range");
            return false;
        }
        if index != self.selected {
            self.selected = index;
            self.refresh_ghost(scene);
        }
        true
    }

    /// Step the selection by `delta`, wrapping around the palette.
    pub fn cycle_asset(&mut self, scene: &mut SceneGraph, delta: i32) {
        let count = self.catalog.decoration_count();
        if count == 0 {
            return;
        }
        let next = (self.selected as i64 + i64::from(delta)).rem_euclid(count as i64);
        self.select_asset(scene, next as usize);
    }

    fn refresh_ghost(&mut self, scene: &mut SceneGraph) {
        let key = self.catalog.decoration_key(self.selected).map(str::to_owned);
        match key {
            Some(key) => {
                if let Err(e) = self.update_ghost_visuals(scene, &key) {
                    tracing::warn!(error = %e, "ghost keeps its previous look");
                }
            }
            None => tracing::warn!(index = self.selected, "no palette entry for ghost"),
        }
    }

    /// Match the ghost's geometry, size and color to `asset_key`. The yaw offset survives.
    pub fn update_ghost_visuals(
        &mut self,
        scene: &mut SceneGraph,
        asset_key: &str,
    ) -> Result<(), AssetError> {
        let asset = self.catalog.get(asset_key)?;
        self.ghost.apply_asset(scene, asset);
        Ok(())
    }

    /// Aim the ghost along `ray`. Shows it snapped on the first placeable
    /// surface hit, or hides it when nothing placeable is in reach.
    pub fn update_ghost_position(&mut self, scene: &mut SceneGraph, ray: Option<&Ray>) -> Option<Vec3> {
        let ghost_mesh = self.ghost.mesh();
        let hit = ray.and_then(|ray| {
            let candidates = self.surfaces.iter().copied().filter(|m| *m != ghost_mesh);
            scene.raycast(ray, candidates, self.config.max_distance)
        });
        match hit {
            Some(hit) => {
                let position = snap_to_grid(hit.point, self.config.grid_step, self.ghost.half_height());
                self.ghost.show_at(scene, position);
                Some(position)
            }
            None => {
                self.ghost.hide(scene);
                None
            }
        }
    }

    pub fn rotate_ghost(&mut self, scene: &mut SceneGraph, delta_radians: f32) {
        self.ghost.rotate(scene, delta_radians);
    }

    /// Rotate by the configured step.
    pub fn rotate_ghost_step(&mut self, scene: &mut SceneGraph) {
        let step = self.config.rotation_step_deg.to_radians();
        self.rotate_ghost(scene, step);
    }

    /// Turn the ghost into a placed object.
    ///
    /// Rejected silently (returns `None`) unless the pointer is locked, the
    /// ghost is visible and the selected asset exists.
    pub fn commit(
        &mut self,
        scene: &mut SceneGraph,
        world: &mut PhysicsWorld,
        pointer_locked: bool,
    ) -> Option<ObjectId> {
        if self.state != PlacementState::Idle || !pointer_locked || !self.ghost.is_visible(scene) {
            return None;
        }
        let asset = match self.catalog.decoration(self.selected) {
            Ok(asset) => asset.clone(),
            Err(e) => {
                tracing::warn!(index = self.selected, error = %e, "commit ignored");
                return None;
            }
        };
        let position = self.ghost.position(scene)?;

        self.state = PlacementState::Committing;
        let object = PlacedObject {
            id: ObjectId::generate(),
            asset_id: asset.id.clone(),
            position: position.to_array(),
            rotation: [0.0, self.ghost.yaw(), 0.0],
        };
        let id = object.id.clone();
        self.spawn(scene, world, object, &asset);
        self.state = PlacementState::Idle;

        tracing::info!(id = %id.short(), asset = %asset.id, ?position, "placed object");
        self.save();
        Some(id)
    }

    /// Remove a placed object. Unknown ids are a no-op.
    pub fn remove(
        &mut self,
        scene: &mut SceneGraph,
        world: &mut PhysicsWorld,
        id: &ObjectId,
        mode: SaveMode,
    ) -> bool {
        let Some(entry) = self.registry.remove(id) else {
            return false;
        };
        scene.remove_mesh(entry.mesh);
        world.remove_body(entry.body);
        self.refresh_surfaces();
        tracing::debug!(id = %id.short(), "removed object");
        if mode == SaveMode::Save {
            self.save();
        }
        true
    }

    /// Remove every placed object.
    pub fn clear(&mut self, scene: &mut SceneGraph, world: &mut PhysicsWorld, mode: SaveMode) -> usize {
        let ids: Vec<ObjectId> = self.registry.ids().cloned().collect();
        for id in &ids {
            self.remove(scene, world, id, SaveMode::Suppress);
        }
        if mode == SaveMode::Save && !ids.is_empty() {
            self.save();
        }
        ids.len()
    }

    /// Replace the registry with a persisted list.
    ///
    /// A payload that is not a list changes nothing. Otherwise every current
    /// object is removed first, then valid entries are placed in order and
    /// bad ones skipped. Nothing is saved.
    pub fn reload(
        &mut self,
        scene: &mut SceneGraph,
        world: &mut PhysicsWorld,
        payload: &serde_json::Value,
    ) -> Result<ReloadReport, DecodeError> {
        let (objects, skipped) = decode::decode_list(payload, &self.catalog).inspect_err(|e| {
            tracing::warn!(error = %e, "reload ignored");
        })?;
        for entry in &skipped {
            tracing::warn!(index = entry.index, error = %entry.error, "skipping persisted entry");
        }

        let removed = self.clear(scene, world, SaveMode::Suppress);
        let mut loaded = 0;
        for object in objects {
            let Ok(asset) = self.catalog.get(&object.asset_id).cloned() else {
                continue;
            };
            self.spawn(scene, world, object, &asset);
            loaded += 1;
        }
        tracing::info!(loaded, removed, skipped = skipped.len(), "reloaded placed objects");
        Ok(ReloadReport {
            loaded,
            removed,
            skipped,
        })
    }

    /// Build the mesh and static body for `object` and register them together.
    fn spawn(
        &mut self,
        scene: &mut SceneGraph,
        world: &mut PhysicsWorld,
        object: PlacedObject,
        asset: &AssetDescriptor,
    ) {
        let size = Vec3::from_array(asset.bounding_size);
        let transform = object.transform();
        let color = Material::color_from_hex(&asset.color).unwrap_or([0.8, 0.8, 0.8]);

        let body = world.add_body(
            RigidBody::fixed(Shape::Box { half_extents: size * 0.5 }, transform.position)
                .with_orientation(transform.rotation),
        );
        let mesh = scene.add_mesh(
            VisualMesh::new(object.id.as_str(), Geometry::Box { size }, Material::opaque(color))
                .with_transform(transform),
        );
        scene.bind(mesh, body);
        self.surfaces.insert(mesh);

        if let Some(old) = self.registry.insert(object, mesh, body) {
            scene.remove_mesh(old.mesh);
            world.remove_body(old.body);
            self.surfaces.remove(&old.mesh);
        }
    }

    fn refresh_surfaces(&mut self) {
        self.surfaces = std::iter::once(self.floor)
            .chain(self.registry.entries().map(|e| e.mesh))
            .collect();
    }

    fn save(&mut self) {
        self.saved_revision = self.persistence.save(self.registry.to_serialized());
    }
}
