//! Ray queries against the primitive shapes shared by physics and the scene graph.

use glam::{Quat, Vec3};

const PARALLEL_EPSILON: f32 = 1e-8;

/// A half-line with a unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray, normalizing `direction`. Returns `None` for a zero direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Where a ray met a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub distance: f32,
    pub point: Vec3,
    /// Outward normal of the face that was hit.
    pub normal: Vec3,
}

/// Intersect a ray with a sphere. Rays starting inside the sphere do not hit.
pub fn intersect_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<SurfaceHit> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    if c < 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t < 0.0 {
        return None;
    }
    let point = ray.at(t);
    Some(SurfaceHit {
        distance: t,
        point,
        normal: (point - center).normalize_or_zero(),
    })
}

/// Intersect a ray with an oriented box (slab test in the box's local frame).
///
/// Only front faces count: a ray starting inside the box does not hit it.
pub fn intersect_box(
    ray: &Ray,
    center: Vec3,
    rotation: Quat,
    half_extents: Vec3,
) -> Option<SurfaceHit> {
    let inv = rotation.inverse();
    let origin = inv * (ray.origin - center);
    let dir = inv * ray.direction;

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    let mut entry_normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let h = half_extents[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let t_near_face = (-h - o) / d;
        let t_far_face = (h - o) / d;
        let (t0, t1, sign) = if t_near_face < t_far_face {
            (t_near_face, t_far_face, -1.0)
        } else {
            (t_far_face, t_near_face, 1.0)
        };
        if t0 > t_min {
            t_min = t0;
            entry_normal = Vec3::ZERO;
            entry_normal[axis] = sign;
        }
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    if t_min < 0.0 {
        return None;
    }
    Some(SurfaceHit {
        distance: t_min,
        point: ray.at(t_min),
        normal: rotation * entry_normal,
    })
}
