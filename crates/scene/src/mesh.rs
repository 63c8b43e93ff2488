use glam::Vec3;
use propyard_common::ray::{self, Ray, SurfaceHit};
use propyard_common::Transform;
use serde::{Deserialize, Serialize};

/// Handle to a mesh owned by a [`crate::SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u32);

/// Mesh geometry, in the mesh's local frame (before scale).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Axis-aligned box centered on the origin with full edge lengths `size`.
    Box { size: Vec3 },
    Sphere { radius: f32 },
}

impl Geometry {
    pub fn cube(size: [f32; 3]) -> Self {
        Self::Box {
            size: Vec3::from_array(size),
        }
    }

    /// Half of the vertical extent.
    pub fn half_height(&self) -> f32 {
        match self {
            Geometry::Box { size } => size.y * 0.5,
            Geometry::Sphere { radius } => *radius,
        }
    }
}

/// Surface appearance. Colors are linear RGB in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: [f32; 3],
    pub opacity: f32,
    pub transparent: bool,
}

impl Material {
    pub fn opaque(color: [f32; 3]) -> Self {
        Self {
            color,
            opacity: 1.0,
            transparent: false,
        }
    }

    pub fn translucent(color: [f32; 3], opacity: f32) -> Self {
        Self {
            color,
            opacity: opacity.clamp(0.0, 1.0),
            transparent: true,
        }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn color_from_hex(hex: &str) -> Option<[f32; 3]> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        Some([channel(0)?, channel(2)?, channel(4)?])
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::opaque([0.8, 0.8, 0.8])
    }
}

/// Renderable geometry + material + transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualMesh {
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
    pub visible: bool,
    /// Free-form label shown by debug renderers.
    pub label: String,
}

impl VisualMesh {
    pub fn new(label: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            transform: Transform::default(),
            visible: true,
            label: label.into(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Ray query against the transformed geometry.
    pub fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let t = &self.transform;
        match self.geometry {
            Geometry::Box { size } => {
                ray::intersect_box(ray, t.position, t.rotation, size * 0.5 * t.scale)
            }
            Geometry::Sphere { radius } => {
                ray::intersect_sphere(ray, t.position, radius * t.scale.max_element())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse() {
        assert_eq!(Material::color_from_hex("#ff0000"), Some([1.0, 0.0, 0.0]));
        assert_eq!(Material::color_from_hex("00ff00"), Some([0.0, 1.0, 0.0]));
        assert_eq!(Material::color_from_hex("#fff"), None);
        assert_eq!(Material::color_from_hex("#gg0000"), None);
    }

    #[test]
    fn scaled_box_is_hit_on_its_scaled_face() {
        let mesh = VisualMesh::new("crate", Geometry::cube([1.0, 1.0, 1.0]), Material::default())
            .with_transform(Transform {
                scale: Vec3::splat(2.0),
                ..Transform::default()
            });
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y).unwrap();
        let hit = mesh.intersect(&ray).unwrap();
        assert!((hit.point.y - 1.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Y).length() < 1e-5);
    }
}
