//! Grounding: whether the player body is supported by a surface.
//!
//! The resolver only reports; it never applies forces. Jump gating is its one consumer.

use crate::body::BodyHandle;
use crate::contact::{ContactEvent, ContactListener};
use crate::world::{PhysicsWorld, StepReport};
use glam::Vec3;
use propyard_common::Ray;
use serde::{Deserialize, Serialize};

/// How support is detected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroundingStrategy {
    /// Cast a ray straight down from the body center, `support + epsilon` long.
    Raycast { epsilon: f32 },
    /// Accept contacts whose normal (toward the player) has at least this upward component.
    Contact { min_normal_y: f32 },
}

impl Default for GroundingStrategy {
    fn default() -> Self {
        Self::Raycast { epsilon: 0.1 }
    }
}

/// Sole owner of the player's grounded flag.
#[derive(Debug, Clone)]
pub struct GroundingResolver {
    strategy: GroundingStrategy,
    player: BodyHandle,
    grounded: bool,
    supported_this_step: bool,
}

impl GroundingResolver {
    pub fn new(player: BodyHandle, strategy: GroundingStrategy) -> Self {
        Self {
            strategy,
            player,
            grounded: false,
            supported_this_step: false,
        }
    }

    pub fn strategy(&self) -> GroundingStrategy {
        self.strategy
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Spend the grounded state on a jump. Returns whether the player was grounded.
    ///
    /// Clearing here keeps a contact from the same step re-granting the jump.
    pub fn consume_jump(&mut self) -> bool {
        std::mem::replace(&mut self.grounded, false)
    }

    /// Forget any support, e.g. after a teleport.
    pub fn reset(&mut self) {
        self.grounded = false;
        self.supported_this_step = false;
    }

    /// Recompute the grounded flag after a physics step.
    pub fn update(&mut self, world: &PhysicsWorld, report: &StepReport) {
        match self.strategy {
            GroundingStrategy::Raycast { epsilon } => {
                self.grounded = self.ray_hits_below(world, epsilon);
            }
            GroundingStrategy::Contact { .. } => {
                // A frame without sub-steps saw no contacts; keep the last answer.
                if report.substeps > 0 {
                    self.grounded = self.supported_this_step;
                }
            }
        }
        self.supported_this_step = false;
    }

    fn ray_hits_below(&self, world: &PhysicsWorld, epsilon: f32) -> bool {
        let Some(body) = world.get(self.player) else {
            return false;
        };
        let Some(ray) = Ray::new(body.position, Vec3::NEG_Y) else {
            return false;
        };
        let reach = body.shape.support_below() + epsilon;
        let player = self.player;
        world.cast_ray(&ray, reach, |h, _| h != player).is_some()
    }
}

impl ContactListener for GroundingResolver {
    fn on_contact(&mut self, contact: &ContactEvent) {
        let GroundingStrategy::Contact { min_normal_y } = self.strategy else {
            return;
        };
        if let Some(normal) = contact.normal_toward(self.player) {
            if normal.y >= min_normal_y {
                self.supported_this_step = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{RigidBody, Shape, SleepPolicy};
    use crate::world::PhysicsConfig;

    const DT: f32 = 1.0 / 60.0;

    fn world_with_player(y: f32) -> (PhysicsWorld, BodyHandle) {
        let mut w = PhysicsWorld::new(PhysicsConfig::default());
        w.add_body(RigidBody::fixed(
            Shape::Box {
                half_extents: Vec3::new(50.0, 0.5, 50.0),
            },
            Vec3::new(0.0, -0.5, 0.0),
        ));
        let player = w.add_body(
            RigidBody::dynamic(Shape::Sphere { radius: 0.5 }, 1.0, Vec3::new(0.0, y, 0.0))
                .with_sleep_policy(SleepPolicy::never()),
        );
        w.set_player(player).unwrap();
        (w, player)
    }

    fn wall(w: &mut PhysicsWorld) {
        w.add_body(RigidBody::fixed(
            Shape::Box {
                half_extents: Vec3::new(0.5, 5.0, 5.0),
            },
            Vec3::new(1.0, 20.0, 0.0),
        ));
    }

    #[test]
    fn raycast_grounds_player_on_floor() {
        let (mut w, player) = world_with_player(0.5);
        let mut resolver = GroundingResolver::new(player, GroundingStrategy::default());
        let report = w.step(DT, &mut resolver);
        resolver.update(&w, &report);
        assert!(resolver.is_grounded());
    }

    #[test]
    fn raycast_airborne_player_is_not_grounded() {
        let (mut w, player) = world_with_player(5.0);
        let mut resolver = GroundingResolver::new(player, GroundingStrategy::default());
        let report = w.step(DT, &mut resolver);
        resolver.update(&w, &report);
        assert!(!resolver.is_grounded());
    }

    #[test]
    fn raycast_ignores_side_contact() {
        let (mut w, player) = world_with_player(20.0);
        wall(&mut w);
        // Press the player into the wall's side while high above the floor.
        w.set_position(player, Vec3::new(0.2, 20.0, 0.0));
        let mut resolver = GroundingResolver::new(player, GroundingStrategy::default());
        let report = w.step(DT, &mut resolver);
        assert!(report.contacts > 0);
        resolver.update(&w, &report);
        assert!(!resolver.is_grounded());
    }

    #[test]
    fn contact_strategy_rejects_wall_normals() {
        let (mut w, player) = world_with_player(20.0);
        wall(&mut w);
        w.set_position(player, Vec3::new(0.2, 20.0, 0.0));
        let mut resolver =
            GroundingResolver::new(player, GroundingStrategy::Contact { min_normal_y: 0.5 });
        let report = w.step(DT, &mut resolver);
        assert!(report.contacts > 0);
        resolver.update(&w, &report);
        assert!(!resolver.is_grounded());
    }

    #[test]
    fn contact_strategy_accepts_floor() {
        let (mut w, player) = world_with_player(0.5);
        let mut resolver =
            GroundingResolver::new(player, GroundingStrategy::Contact { min_normal_y: 0.5 });
        let report = w.step(DT, &mut resolver);
        resolver.update(&w, &report);
        assert!(resolver.is_grounded());

        // No sub-step ran: the previous answer stands.
        let report = w.step(0.0, &mut resolver);
        resolver.update(&w, &report);
        assert!(resolver.is_grounded());
    }

    #[test]
    fn consume_jump_clears_flag_once() {
        let (mut w, player) = world_with_player(0.5);
        let mut resolver = GroundingResolver::new(player, GroundingStrategy::default());
        let report = w.step(DT, &mut resolver);
        resolver.update(&w, &report);
        assert!(resolver.consume_jump());
        assert!(!resolver.is_grounded());
        assert!(!resolver.consume_jump());
    }
}
