//! Player movement controller.
//!
//! Horizontal motion is a velocity target, not an acceleration: the x/z
//! components are overwritten every frame. Vertical velocity is left to
//! gravity and jump impulses.

use crate::body::BodyHandle;
use crate::grounding::GroundingResolver;
use crate::world::PhysicsWorld;
use glam::Vec3;
use propyard_common::MovementFlags;
use serde::{Deserialize, Serialize};

/// Movement tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Horizontal speed in meters per second.
    pub speed: f32,
    /// Vertical speed set by a jump, in meters per second.
    pub jump_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            jump_speed: 6.0,
        }
    }
}

/// One frame of movement intent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementCommand {
    pub flags: MovementFlags,
    /// Jump pressed this frame (edge, not level).
    pub jump: bool,
    /// Camera yaw in radians; 0 faces -Z.
    pub yaw: f32,
}

/// Result of applying one command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementOutcome {
    pub velocity: Vec3,
    pub jumped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MovementController {
    config: MovementConfig,
}

impl MovementController {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Horizontal forward unit vector for a camera yaw. Pitch never matters.
    pub fn forward(yaw: f32) -> Vec3 {
        Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
    }

    /// Forward rotated -90 degrees about world up.
    pub fn right(yaw: f32) -> Vec3 {
        let f = Self::forward(yaw);
        Vec3::new(-f.z, 0.0, f.x)
    }

    /// Target horizontal velocity for the held directions. Diagonals are normalized.
    pub fn horizontal_velocity(&self, yaw: f32, flags: MovementFlags) -> Vec3 {
        let forward = Self::forward(yaw);
        let right = Self::right(yaw);
        let mut dir = Vec3::ZERO;
        if flags.forward {
            dir += forward;
        }
        if flags.back {
            dir -= forward;
        }
        if flags.right {
            dir += right;
        }
        if flags.left {
            dir -= right;
        }
        dir.normalize_or_zero() * self.config.speed
    }

    /// Apply one frame of intent to the player body.
    ///
    /// With movement disabled the flags are ignored, horizontal velocity is
    /// zeroed and jumps are refused.
    pub fn apply(
        &self,
        command: &MovementCommand,
        movement_enabled: bool,
        grounding: &mut GroundingResolver,
        world: &mut PhysicsWorld,
        body: BodyHandle,
    ) -> MovementOutcome {
        let Some(current) = world.velocity(body) else {
            return MovementOutcome::default();
        };

        let flags = if movement_enabled {
            command.flags
        } else {
            MovementFlags::default()
        };
        let horizontal = self.horizontal_velocity(command.yaw, flags);
        let mut velocity = Vec3::new(horizontal.x, current.y, horizontal.z);

        let mut jumped = false;
        if command.jump && movement_enabled && grounding.is_grounded() {
            grounding.consume_jump();
            velocity.y = self.config.jump_speed;
            jumped = true;
            tracing::debug!("jump");
        }

        world.set_velocity(body, velocity);
        MovementOutcome { velocity, jumped }
    }
}
