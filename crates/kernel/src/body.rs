use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque handle to a body owned by a [`crate::PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Primitive shape usable inside a compound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PartShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
}

/// A primitive placed at an offset in the owning body's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompoundPart {
    pub offset: Vec3,
    pub shape: PartShape,
}

/// Collision shape of a rigid body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    Compound(Vec<CompoundPart>),
}

impl Shape {
    /// Distance from the body origin to the lowest point of the shape, ignoring rotation.
    pub fn support_below(&self) -> f32 {
        match self {
            Shape::Sphere { radius } => *radius,
            Shape::Box { half_extents } => half_extents.y,
            Shape::Compound(parts) => parts
                .iter()
                .map(|p| {
                    let extent = match p.shape {
                        PartShape::Sphere { radius } => radius,
                        PartShape::Box { half_extents } => half_extents.y,
                    };
                    extent - p.offset.y
                })
                .fold(0.0, f32::max),
        }
    }

    fn parts(&self) -> Vec<CompoundPart> {
        match self {
            Shape::Sphere { radius } => vec![CompoundPart {
                offset: Vec3::ZERO,
                shape: PartShape::Sphere { radius: *radius },
            }],
            Shape::Box { half_extents } => vec![CompoundPart {
                offset: Vec3::ZERO,
                shape: PartShape::Box {
                    half_extents: *half_extents,
                },
            }],
            Shape::Compound(parts) => parts.clone(),
        }
    }
}

/// When a resting dynamic body may stop being integrated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepPolicy {
    pub allow: bool,
    /// Speed (m/s) under which the body counts as resting.
    pub speed_limit: f32,
    /// Seconds of rest before the body falls asleep.
    pub time_limit: f32,
}

impl SleepPolicy {
    pub fn never() -> Self {
        Self {
            allow: false,
            ..Self::default()
        }
    }
}

impl Default for SleepPolicy {
    fn default() -> Self {
        Self {
            allow: true,
            speed_limit: 0.1,
            time_limit: 1.0,
        }
    }
}

/// A world-space collision primitive derived from a body and one of its parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Collider {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    Cuboid {
        center: Vec3,
        rotation: Quat,
        half_extents: Vec3,
    },
}

/// A physics-simulated entity.
///
/// `mass == 0` marks a static body: it collides but is never integrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub mass: f32,
    pub linear_damping: f32,
    pub shape: Shape,
    pub sleep: SleepPolicy,
    pub(crate) is_player: bool,
    pub(crate) sleeping: bool,
    pub(crate) rest_time: f32,
}

impl RigidBody {
    /// A dynamic body with the given mass (clamped to be positive).
    pub fn dynamic(shape: Shape, mass: f32, position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            mass: mass.max(f32::EPSILON),
            linear_damping: 0.01,
            shape,
            sleep: SleepPolicy::default(),
            is_player: false,
            sleeping: false,
            rest_time: 0.0,
        }
    }

    /// A static, immovable body.
    pub fn fixed(shape: Shape, position: Vec3) -> Self {
        Self {
            mass: 0.0,
            linear_damping: 0.0,
            sleep: SleepPolicy::never(),
            ..Self::dynamic(shape, 1.0, position)
        }
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping.clamp(0.0, 1.0);
        self
    }

    pub fn with_sleep_policy(mut self, sleep: SleepPolicy) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    pub fn is_player(&self) -> bool {
        self.is_player
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    pub(crate) fn inverse_mass(&self) -> f32 {
        if self.is_static() { 0.0 } else { 1.0 / self.mass }
    }

    pub(crate) fn wake(&mut self) {
        self.sleeping = false;
        self.rest_time = 0.0;
    }

    /// World-space primitives for collision and ray queries.
    pub(crate) fn colliders(&self) -> Vec<Collider> {
        self.shape
            .parts()
            .into_iter()
            .map(|part| {
                let center = self.position + self.orientation * part.offset;
                match part.shape {
                    PartShape::Sphere { radius } => Collider::Sphere { center, radius },
                    PartShape::Box { half_extents } => Collider::Cuboid {
                        center,
                        rotation: self.orientation,
                        half_extents,
                    },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_body_is_static() {
        let body = RigidBody::fixed(Shape::Sphere { radius: 1.0 }, Vec3::ZERO);
        assert!(body.is_static());
        assert_eq!(body.inverse_mass(), 0.0);
        assert!(!body.sleep.allow);
    }

    #[test]
    fn dynamic_mass_is_never_zero() {
        let body = RigidBody::dynamic(Shape::Sphere { radius: 1.0 }, 0.0, Vec3::ZERO);
        assert!(!body.is_static());
    }

    #[test]
    fn support_below_for_compound_uses_lowest_part() {
        let shape = Shape::Compound(vec![
            CompoundPart {
                offset: Vec3::new(0.0, 1.0, 0.0),
                shape: PartShape::Sphere { radius: 0.5 },
            },
            CompoundPart {
                offset: Vec3::new(0.0, -1.0, 0.0),
                shape: PartShape::Box {
                    half_extents: Vec3::splat(0.25),
                },
            },
        ]);
        assert!((shape.support_below() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn colliders_follow_orientation() {
        let shape = Shape::Compound(vec![CompoundPart {
            offset: Vec3::X,
            shape: PartShape::Sphere { radius: 0.5 },
        }]);
        let body = RigidBody::dynamic(shape, 1.0, Vec3::ZERO)
            .with_orientation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        match body.colliders()[0] {
            Collider::Sphere { center, .. } => assert!((center - Vec3::NEG_Z).length() < 1e-5),
            other => panic!("unexpected collider {other:?}"),
        }
    }
}
