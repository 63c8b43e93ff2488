//! Contact generation between world-space primitives, and the events it produces.

use crate::body::{BodyHandle, Collider};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A resolved contact between two bodies during one sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    /// Unit normal pointing from `body_b` toward `body_a`.
    pub normal: Vec3,
    /// Penetration depth before correction.
    pub depth: f32,
}

impl ContactEvent {
    pub fn involves(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// The contact normal as seen from `body`: pointing from the other body toward it.
    pub fn normal_toward(&self, body: BodyHandle) -> Option<Vec3> {
        if self.body_a == body {
            Some(self.normal)
        } else if self.body_b == body {
            Some(-self.normal)
        } else {
            None
        }
    }
}

/// Receives contact events synchronously after each physics sub-step resolves.
pub trait ContactListener {
    fn on_contact(&mut self, contact: &ContactEvent);
}

impl ContactListener for () {
    fn on_contact(&mut self, _contact: &ContactEvent) {}
}

impl ContactListener for Vec<ContactEvent> {
    fn on_contact(&mut self, contact: &ContactEvent) {
        self.push(*contact);
    }
}

/// Contact normal (from `b` toward `a`) and depth, if the primitives overlap.
pub(crate) fn collide(a: &Collider, b: &Collider) -> Option<(Vec3, f32)> {
    match (a, b) {
        (
            Collider::Sphere { center: ca, radius: ra },
            Collider::Sphere { center: cb, radius: rb },
        ) => sphere_sphere(*ca, *ra, *cb, *rb),
        (
            Collider::Sphere { center, radius },
            Collider::Cuboid { center: bc, rotation, half_extents },
        ) => sphere_cuboid(*center, *radius, *bc, *rotation, *half_extents),
        (
            Collider::Cuboid { center: bc, rotation, half_extents },
            Collider::Sphere { center, radius },
        ) => sphere_cuboid(*center, *radius, *bc, *rotation, *half_extents)
            .map(|(n, d)| (-n, d)),
        (
            Collider::Cuboid { center: ca, rotation: qa, half_extents: ha },
            Collider::Cuboid { center: cb, rotation: qb, half_extents: hb },
        ) => aabb_aabb(*ca, world_half_extents(*qa, *ha), *cb, world_half_extents(*qb, *hb)),
    }
}

fn sphere_sphere(ca: Vec3, ra: f32, cb: Vec3, rb: f32) -> Option<(Vec3, f32)> {
    let delta = ca - cb;
    let dist = delta.length();
    let depth = ra + rb - dist;
    if depth <= 0.0 {
        return None;
    }
    let normal = delta.try_normalize().unwrap_or(Vec3::Y);
    Some((normal, depth))
}

/// Normal points from the box toward the sphere.
fn sphere_cuboid(
    sphere: Vec3,
    radius: f32,
    center: Vec3,
    rotation: Quat,
    half: Vec3,
) -> Option<(Vec3, f32)> {
    let local = rotation.inverse() * (sphere - center);
    let closest = local.clamp(-half, half);
    let offset = local - closest;
    let dist_sq = offset.length_squared();

    if dist_sq > 0.0 {
        let dist = dist_sq.sqrt();
        if dist >= radius {
            return None;
        }
        return Some((rotation * (offset / dist), radius - dist));
    }

    // Center inside the box: push out through the nearest face.
    let gaps = half - local.abs();
    let axis = if gaps.x <= gaps.y && gaps.x <= gaps.z {
        0
    } else if gaps.y <= gaps.z {
        1
    } else {
        2
    };
    let mut normal = Vec3::ZERO;
    normal[axis] = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
    Some((rotation * normal, gaps[axis] + radius))
}

fn world_half_extents(rotation: Quat, half: Vec3) -> Vec3 {
    let m = glam::Mat3::from_quat(rotation);
    Vec3::new(
        m.x_axis.x.abs() * half.x + m.y_axis.x.abs() * half.y + m.z_axis.x.abs() * half.z,
        m.x_axis.y.abs() * half.x + m.y_axis.y.abs() * half.y + m.z_axis.y.abs() * half.z,
        m.x_axis.z.abs() * half.x + m.y_axis.z.abs() * half.y + m.z_axis.z.abs() * half.z,
    )
}

fn aabb_aabb(ca: Vec3, ha: Vec3, cb: Vec3, hb: Vec3) -> Option<(Vec3, f32)> {
    let delta = ca - cb;
    let overlap = ha + hb - delta.abs();
    if overlap.min_element() <= 0.0 {
        return None;
    }
    let axis = if overlap.x <= overlap.y && overlap.x <= overlap.z {
        0
    } else if overlap.y <= overlap.z {
        1
    } else {
        2
    };
    let mut normal = Vec3::ZERO;
    normal[axis] = if delta[axis] >= 0.0 { 1.0 } else { -1.0 };
    Some((normal, overlap[axis]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(center: Vec3, radius: f32) -> Collider {
        Collider::Sphere { center, radius }
    }

    fn cuboid(center: Vec3, half_extents: Vec3) -> Collider {
        Collider::Cuboid {
            center,
            rotation: Quat::IDENTITY,
            half_extents,
        }
    }

    #[test]
    fn separated_spheres_do_not_collide() {
        assert!(collide(&sphere(Vec3::ZERO, 1.0), &sphere(Vec3::new(3.0, 0.0, 0.0), 1.0)).is_none());
    }

    #[test]
    fn overlapping_spheres_push_apart() {
        let (normal, depth) =
            collide(&sphere(Vec3::new(1.5, 0.0, 0.0), 1.0), &sphere(Vec3::ZERO, 1.0)).unwrap();
        assert!((normal - Vec3::X).length() < 1e-6);
        assert!((depth - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sphere_resting_into_floor_gets_upward_normal() {
        let floor = cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0));
        let (normal, depth) = collide(&sphere(Vec3::new(0.0, 0.4, 0.0), 0.5), &floor).unwrap();
        assert!((normal - Vec3::Y).length() < 1e-6);
        assert!((depth - 0.1).abs() < 1e-5);
    }

    #[test]
    fn cuboid_first_flips_normal() {
        let floor = cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0));
        let (normal, _) = collide(&floor, &sphere(Vec3::new(0.0, 0.4, 0.0), 0.5)).unwrap();
        assert!((normal - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn sphere_center_inside_box_exits_nearest_face() {
        let block = cuboid(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0));
        let (normal, depth) = collide(&sphere(Vec3::new(0.0, 0.0, 0.9), 0.5), &block).unwrap();
        assert!((normal - Vec3::Z).length() < 1e-6);
        assert!((depth - 0.6).abs() < 1e-5);
    }

    #[test]
    fn stacked_boxes_separate_vertically() {
        let lower = cuboid(Vec3::ZERO, Vec3::splat(1.0));
        let upper = cuboid(Vec3::new(0.2, 1.9, 0.0), Vec3::splat(1.0));
        let (normal, depth) = collide(&upper, &lower).unwrap();
        assert!((normal - Vec3::Y).length() < 1e-6);
        assert!((depth - 0.1).abs() < 1e-5);
    }

    #[test]
    fn normal_toward_flips_for_second_body() {
        let event = ContactEvent {
            body_a: BodyHandle(1),
            body_b: BodyHandle(2),
            normal: Vec3::Y,
            depth: 0.1,
        };
        assert_eq!(event.normal_toward(BodyHandle(1)), Some(Vec3::Y));
        assert_eq!(event.normal_toward(BodyHandle(2)), Some(Vec3::NEG_Y));
        assert_eq!(event.normal_toward(BodyHandle(3)), None);
    }
}
