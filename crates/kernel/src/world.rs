use crate::body::{BodyHandle, Collider, RigidBody};
use crate::contact::{self, ContactEvent, ContactListener};
use glam::Vec3;
use propyard_common::ray::{self, Ray};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed-step integration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Length of one sub-step in seconds.
    pub fixed_dt: f32,
    /// Upper bound on sub-steps per `step` call.
    pub max_substeps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            fixed_dt: 1.0 / 60.0,
            max_substeps: 3,
        }
    }
}

/// Errors from physics world operations.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("body {0:?} not found")]
    BodyNotFound(BodyHandle),
    #[error("body {0:?} is static and cannot be the player")]
    StaticPlayer(BodyHandle),
}

/// What one `step` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    pub substeps: u32,
    pub contacts: usize,
    /// Wall-clock seconds discarded because the sub-step cap was reached.
    pub dropped_time: f32,
}

/// Nearest body hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: BodyHandle,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// The physics world: owns every rigid body and advances them in fixed sub-steps.
///
/// Uses BTreeMap so integration, contact generation and hashing visit bodies in
/// handle order on every platform.
#[derive(Debug, Clone, Default)]
pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: BTreeMap<BodyHandle, RigidBody>,
    /// Bodies added since the last `step`; they join at the start of the next one.
    pending: BTreeMap<BodyHandle, RigidBody>,
    next_handle: u32,
    player: Option<BodyHandle>,
    accumulator: f64,
    tick: u64,
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Number of sub-steps executed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of bodies, including ones waiting for the next step.
    pub fn body_count(&self) -> usize {
        self.bodies.len() + self.pending.len()
    }

    /// Bodies currently taking part in simulation, in handle order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter().map(|(h, b)| (*h, b))
    }

    /// Queue a body. It is simulated from the next `step` call on.
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(handle, body);
        handle
    }

    /// Remove a body, wherever it is. Clears the player flag if it was the player.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let removed = self
            .bodies
            .remove(&handle)
            .or_else(|| self.pending.remove(&handle));
        if removed.is_some() && self.player == Some(handle) {
            self.player = None;
        }
        removed
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies
            .get(&handle)
            .or_else(|| self.pending.get(&handle))
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        match self.bodies.get_mut(&handle) {
            Some(body) => Some(body),
            None => self.pending.get_mut(&handle),
        }
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.get(handle).map(|b| b.linear_velocity)
    }

    /// Overwrite a dynamic body's velocity. Returns false for static or unknown bodies.
    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> bool {
        match self.get_mut(handle) {
            Some(body) if !body.is_static() => {
                if body.linear_velocity != velocity {
                    body.wake();
                }
                body.linear_velocity = velocity;
                true
            }
            Some(_) => {
                tracing::trace!(?handle, "ignoring velocity write to static body");
                false
            }
            None => false,
        }
    }

    /// Teleport a body. Velocity is left alone.
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec3) -> bool {
        match self.get_mut(handle) {
            Some(body) => {
                body.position = position;
                body.wake();
                true
            }
            None => false,
        }
    }

    /// Flag `handle` as the player, clearing the flag from any previous player body.
    pub fn set_player(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let body = self.get(handle).ok_or(PhysicsError::BodyNotFound(handle))?;
        if body.is_static() {
            return Err(PhysicsError::StaticPlayer(handle));
        }
        if let Some(previous) = self.player.take() {
            if let Some(prev) = self.get_mut(previous) {
                prev.is_player = false;
            }
        }
        if let Some(body) = self.get_mut(handle) {
            body.is_player = true;
        }
        self.player = Some(handle);
        Ok(())
    }

    pub fn player(&self) -> Option<BodyHandle> {
        self.player
    }

    /// Advance simulated time by `wall_dt` seconds of wall-clock time.
    ///
    /// Runs whole fixed sub-steps only, at most `max_substeps` of them. Time
    /// beyond that cap is dropped so a frame hitch cannot cascade into more work.
    pub fn step(&mut self, wall_dt: f32, listener: &mut dyn ContactListener) -> StepReport {
        self.bodies.append(&mut self.pending);

        let fixed = f64::from(self.config.fixed_dt);
        let max_substeps = self.config.max_substeps.max(1);
        let mut report = StepReport::default();
        if fixed <= 0.0 {
            return report;
        }

        self.accumulator += f64::from(wall_dt.max(0.0));
        while self.accumulator >= fixed && report.substeps < max_substeps {
            self.accumulator -= fixed;
            let contacts = self.substep(self.config.fixed_dt);
            for event in &contacts {
                listener.on_contact(event);
            }
            report.substeps += 1;
            report.contacts += contacts.len();
        }

        if self.accumulator >= fixed {
            let remainder = self.accumulator % fixed;
            report.dropped_time = (self.accumulator - remainder) as f32;
            self.accumulator = remainder;
            tracing::debug!(dropped = report.dropped_time, "physics fell behind wall clock");
        }
        report
    }

    fn substep(&mut self, h: f32) -> Vec<ContactEvent> {
        self.tick += 1;
        let gravity = self.config.gravity;

        for body in self.bodies.values_mut() {
            if body.is_static() || body.sleeping {
                continue;
            }
            body.linear_velocity += gravity * h;
            body.linear_velocity *= (1.0 - body.linear_damping).powf(h);
            body.position += body.linear_velocity * h;
        }

        let contacts = self.resolve_contacts();
        self.update_sleep(h);
        contacts
    }

    fn resolve_contacts(&mut self) -> Vec<ContactEvent> {
        let handles: Vec<BodyHandle> = self.bodies.keys().copied().collect();
        let mut events = Vec::new();

        for (i, &ha) in handles.iter().enumerate() {
            for &hb in &handles[i + 1..] {
                let (Some(a), Some(b)) = (self.bodies.get(&ha), self.bodies.get(&hb)) else {
                    continue;
                };
                let a_idle = a.is_static() || a.sleeping;
                let b_idle = b.is_static() || b.sleeping;
                if a_idle && b_idle {
                    continue;
                }
                let (wa, wb) = (a.inverse_mass(), b.inverse_mass());
                let total = wa + wb;
                if total <= 0.0 {
                    continue;
                }

                let found: Vec<(Vec3, f32)> = a
                    .colliders()
                    .iter()
                    .flat_map(|ca| {
                        b.colliders()
                            .into_iter()
                            .filter_map(move |cb| contact::collide(ca, &cb))
                    })
                    .collect();

                for (normal, depth) in found {
                    self.apply_contact(ha, hb, normal, depth, wa / total, wb / total);
                    events.push(ContactEvent {
                        body_a: ha,
                        body_b: hb,
                        normal,
                        depth,
                    });
                }
            }
        }
        events
    }

    fn apply_contact(
        &mut self,
        ha: BodyHandle,
        hb: BodyHandle,
        normal: Vec3,
        depth: f32,
        share_a: f32,
        share_b: f32,
    ) {
        let va = self.bodies.get(&ha).map_or(Vec3::ZERO, |b| b.linear_velocity);
        let vb = self.bodies.get(&hb).map_or(Vec3::ZERO, |b| b.linear_velocity);
        let approach = (va - vb).dot(normal);

        if let Some(a) = self.bodies.get_mut(&ha) {
            if !a.is_static() {
                a.position += normal * depth * share_a;
                if approach < 0.0 {
                    a.linear_velocity -= normal * approach * share_a;
                }
                if a.sleeping && vb.length() > a.sleep.speed_limit {
                    a.wake();
                }
            }
        }
        if let Some(b) = self.bodies.get_mut(&hb) {
            if !b.is_static() {
                b.position -= normal * depth * share_b;
                if approach < 0.0 {
                    b.linear_velocity += normal * approach * share_b;
                }
                if b.sleeping && va.length() > b.sleep.speed_limit {
                    b.wake();
                }
            }
        }
    }

    fn update_sleep(&mut self, h: f32) {
        for body in self.bodies.values_mut() {
            if body.is_static() || body.sleeping || !body.sleep.allow {
                continue;
            }
            if body.linear_velocity.length() < body.sleep.speed_limit {
                body.rest_time += h;
                if body.rest_time >= body.sleep.time_limit {
                    body.sleeping = true;
                    body.linear_velocity = Vec3::ZERO;
                }
            } else {
                body.rest_time = 0.0;
            }
        }
    }

    /// Nearest hit within `max_distance` among simulated bodies accepted by `filter`.
    pub fn cast_ray(
        &self,
        ray: &Ray,
        max_distance: f32,
        filter: impl Fn(BodyHandle, &RigidBody) -> bool,
    ) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for (handle, body) in &self.bodies {
            if !filter(*handle, body) {
                continue;
            }
            for collider in body.colliders() {
                let hit = match collider {
                    Collider::Sphere { center, radius } => ray::intersect_sphere(ray, center, radius),
                    Collider::Cuboid {
                        center,
                        rotation,
                        half_extents,
                    } => ray::intersect_box(ray, center, rotation, half_extents),
                };
                let Some(hit) = hit else { continue };
                if hit.distance > max_distance {
                    continue;
                }
                if best.is_none_or(|b| hit.distance < b.distance) {
                    best = Some(RayHit {
                        body: *handle,
                        point: hit.point,
                        normal: hit.normal,
                        distance: hit.distance,
                    });
                }
            }
        }
        best
    }

    /// Deterministic hash over all body states, in handle order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for (handle, body) in self.bodies.iter().chain(self.pending.iter()) {
            mix(&mut h, &handle.0.to_le_bytes());
            for v in body.position.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
            for v in body.linear_velocity.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
            for v in body.orientation.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Shape, SleepPolicy};

    const DT: f32 = 1.0 / 60.0;

    fn floor() -> RigidBody {
        RigidBody::fixed(
            Shape::Box {
                half_extents: Vec3::new(50.0, 0.5, 50.0),
            },
            Vec3::new(0.0, -0.5, 0.0),
        )
    }

    fn ball(y: f32) -> RigidBody {
        RigidBody::dynamic(Shape::Sphere { radius: 0.5 }, 1.0, Vec3::new(0.0, y, 0.0))
            .with_sleep_policy(SleepPolicy::never())
    }

    #[test]
    fn world_starts_empty() {
        let w = PhysicsWorld::default();
        assert_eq!(w.tick(), 0);
        assert_eq!(w.body_count(), 0);
    }

    #[test]
    fn one_frame_of_wall_time_runs_one_substep() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        let report = w.step(DT, &mut ());
        assert_eq!(report.substeps, 1);
        assert_eq!(w.tick(), 1);
    }

    #[test]
    fn short_frames_accumulate() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        assert_eq!(w.step(DT * 0.5, &mut ()).substeps, 0);
        assert_eq!(w.step(DT * 0.6, &mut ()).substeps, 1);
    }

    #[test]
    fn substeps_are_capped_and_excess_time_dropped() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        let report = w.step(1.0, &mut ());
        assert_eq!(report.substeps, 3);
        assert!(report.dropped_time > 0.9);
        // The backlog does not carry into the next frame.
        assert_eq!(w.step(0.0, &mut ()).substeps, 0);
    }

    #[test]
    fn added_body_waits_for_next_step() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        let h = w.add_body(ball(5.0));
        assert_eq!(w.bodies().count(), 0);
        assert!(w.get(h).is_some());
        w.step(DT, &mut ());
        assert_eq!(w.bodies().count(), 1);
        assert!(w.get(h).unwrap().position.y < 5.0);
    }

    #[test]
    fn static_bodies_do_not_move_or_take_velocity() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        let h = w.add_body(floor());
        assert!(!w.set_velocity(h, Vec3::X));
        for _ in 0..30 {
            w.step(DT, &mut ());
        }
        let body = w.get(h).unwrap();
        assert_eq!(body.position, Vec3::new(0.0, -0.5, 0.0));
        assert_eq!(body.linear_velocity, Vec3::ZERO);
    }

    #[test]
    fn ball_comes_to_rest_on_floor_and_reports_contacts() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        let floor_h = w.add_body(floor());
        let ball_h = w.add_body(ball(2.0));
        let mut contacts: Vec<ContactEvent> = Vec::new();
        for _ in 0..180 {
            w.step(DT, &mut contacts);
        }
        let body = w.get(ball_h).unwrap();
        assert!((body.position.y - 0.5).abs() < 0.05, "y = {}", body.position.y);
        assert!(body.linear_velocity.y.abs() < 0.5);
        let last = contacts.last().unwrap();
        assert!(last.involves(floor_h) && last.involves(ball_h));
        assert!(last.normal_toward(ball_h).unwrap().y > 0.9);
    }

    #[test]
    fn resting_body_falls_asleep_and_wakes_on_velocity() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        w.add_body(floor());
        let h = w.add_body(
            RigidBody::dynamic(Shape::Sphere { radius: 0.5 }, 1.0, Vec3::new(0.0, 0.5, 0.0))
                .with_sleep_policy(SleepPolicy {
                    allow: true,
                    speed_limit: 0.5,
                    time_limit: 0.2,
                }),
        );
        for _ in 0..60 {
            w.step(DT, &mut ());
        }
        assert!(w.get(h).unwrap().is_sleeping());
        w.set_velocity(h, Vec3::new(0.0, 3.0, 0.0));
        assert!(!w.get(h).unwrap().is_sleeping());
    }

    #[test]
    fn only_one_player_flag() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        let a = w.add_body(ball(1.0));
        let b = w.add_body(ball(3.0));
        w.set_player(a).unwrap();
        w.set_player(b).unwrap();
        assert!(!w.get(a).unwrap().is_player());
        assert!(w.get(b).unwrap().is_player());
        assert_eq!(w.player(), Some(b));
    }

    #[test]
    fn static_body_cannot_be_player() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        let h = w.add_body(floor());
        assert!(matches!(w.set_player(h), Err(PhysicsError::StaticPlayer(_))));
        assert!(matches!(
            w.set_player(BodyHandle(99)),
            Err(PhysicsError::BodyNotFound(_))
        ));
    }

    #[test]
    fn removing_player_clears_flag() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        let h = w.add_body(ball(1.0));
        w.set_player(h).unwrap();
        assert!(w.remove_body(h).is_some());
        assert_eq!(w.player(), None);
        assert!(w.remove_body(h).is_none());
    }

    #[test]
    fn cast_ray_finds_nearest_and_honors_filter() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        let floor_h = w.add_body(floor());
        let ball_h = w.add_body(ball(3.0));
        w.step(0.0, &mut ());

        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y).unwrap();
        let hit = w.cast_ray(&ray, 100.0, |_, _| true).unwrap();
        assert_eq!(hit.body, ball_h);

        let hit = w.cast_ray(&ray, 100.0, |h, _| h != ball_h).unwrap();
        assert_eq!(hit.body, floor_h);
        assert!((hit.point.y).abs() < 1e-5);

        assert!(w.cast_ray(&ray, 5.0, |h, _| h != ball_h).is_none());
    }

    #[test]
    fn identical_worlds_hash_identically() {
        let build = || {
            let mut w = PhysicsWorld::new(PhysicsConfig::default());
            w.add_body(floor());
            w.add_body(ball(4.0));
            for _ in 0..90 {
                w.step(DT, &mut ());
            }
            w
        };
        assert_eq!(build().state_hash(), build().state_hash());
    }
}
