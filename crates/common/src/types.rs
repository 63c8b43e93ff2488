use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable, opaque identifier for a placed object.
///
/// Persisted as a plain string so ids written by other backends round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Allocate a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Self::default()
        }
    }
}

/// A committed, persistent object in the scene.
///
/// `rotation` holds XYZ Euler angles in radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedObject {
    pub id: ObjectId,
    pub asset_id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

impl PlacedObject {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn orientation(&self) -> Quat {
        let [x, y, z] = self.rotation;
        Quat::from_euler(EulerRot::XYZ, x, y, z)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position_rotation(self.position(), self.orientation())
    }
}

/// Held movement directions, as sampled from input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFlags {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementFlags {
    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_uniqueness() {
        let a = ObjectId::generate();
        let b = ObjectId::generate();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn short_id_tolerates_short_strings() {
        let id = ObjectId::from("abc");
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn placed_object_wire_form_uses_camel_case() {
        let obj = PlacedObject {
            id: ObjectId::from("obj-1"),
            asset_id: "crate".into(),
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 0.5, 0.0],
        };
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["id"], "obj-1");
        assert_eq!(json["assetId"], "crate");
        assert_eq!(json["position"][2], 3.0);
    }

    #[test]
    fn placed_object_orientation_from_yaw() {
        let obj = PlacedObject {
            id: ObjectId::generate(),
            asset_id: "crate".into(),
            position: [0.0; 3],
            rotation: [0.0, std::f32::consts::FRAC_PI_2, 0.0],
        };
        let rotated = obj.orientation() * Vec3::X;
        assert!((rotated - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn movement_flags_clear() {
        let mut flags = MovementFlags {
            forward: true,
            right: true,
            ..Default::default()
        };
        assert!(flags.any());
        flags.clear();
        assert!(!flags.any());
    }
}
