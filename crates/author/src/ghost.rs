use glam::{Quat, Vec3};
use propyard_assets::AssetDescriptor;
use propyard_common::Transform;
use propyard_scene::{Geometry, Material, MeshId, SceneGraph, VisualMesh};
use std::f32::consts::TAU;

/// The single translucent placement preview.
///
/// It lives in the scene graph like any mesh but never gets a physics body,
/// and its mesh transform is the authoritative pose.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostPreview {
    mesh: MeshId,
    asset_id: Option<String>,
    /// Yaw offset in radians, kept in `[0, 2π)`.
    yaw: f32,
    size: Vec3,
    opacity: f32,
}

impl GhostPreview {
    /// Create the ghost mesh, hidden until it is first aimed at a surface.
    pub fn spawn(scene: &mut SceneGraph, opacity: f32) -> Self {
        let size = Vec3::ONE;
        let mut mesh = VisualMesh::new(
            "ghost",
            Geometry::Box { size },
            Material::translucent([1.0, 1.0, 1.0], opacity),
        );
        mesh.visible = false;
        Self {
            mesh: scene.add_mesh(mesh),
            asset_id: None,
            yaw: 0.0,
            size,
            opacity,
        }
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn asset_id(&self) -> Option<&str> {
        self.asset_id.as_deref()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn half_height(&self) -> f32 {
        self.size.y * 0.5
    }

    /// Take on an asset's size and color. The yaw offset is kept.
    pub fn apply_asset(&mut self, scene: &mut SceneGraph, asset: &AssetDescriptor) {
        let color = Material::color_from_hex(&asset.color).unwrap_or_else(|| {
            tracing::warn!(asset = %asset.id, color = %asset.color, "bad asset color");
            [1.0, 1.0, 1.0]
        });
        self.size = Vec3::from_array(asset.bounding_size);
        self.asset_id = Some(asset.id.clone());
        scene.replace_appearance(
            self.mesh,
            Geometry::Box { size: self.size },
            Material::translucent(color, self.opacity),
        );
    }

    /// Add to the yaw offset and re-orient the mesh.
    pub fn rotate(&mut self, scene: &mut SceneGraph, delta: f32) {
        self.yaw = (self.yaw + delta).rem_euclid(TAU);
        if let Some(mesh) = scene.get_mut(self.mesh) {
            mesh.transform.rotation = self.orientation();
        }
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Move the ghost and show it.
    pub fn show_at(&self, scene: &mut SceneGraph, position: Vec3) {
        if let Some(mesh) = scene.get_mut(self.mesh) {
            mesh.transform = Transform {
                position,
                rotation: self.orientation(),
                scale: mesh.transform.scale,
            };
            mesh.visible = true;
        }
    }

    pub fn hide(&self, scene: &mut SceneGraph) {
        if let Some(mesh) = scene.get_mut(self.mesh) {
            mesh.visible = false;
        }
    }

    pub fn is_visible(&self, scene: &SceneGraph) -> bool {
        scene.get(self.mesh).is_some_and(|m| m.visible)
    }

    pub fn position(&self, scene: &SceneGraph) -> Option<Vec3> {
        scene.get(self.mesh).map(|m| m.transform.position)
    }
}
