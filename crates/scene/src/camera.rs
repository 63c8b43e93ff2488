use glam::{Mat4, Vec2, Vec3};
use propyard_common::Ray;
use serde::{Deserialize, Serialize};

/// Look and projection settings for the first-person camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Radians per pixel of mouse movement.
    pub sensitivity: f32,
    /// Maximum look angle above or below the horizon, in degrees.
    pub pitch_limit_deg: f32,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.002,
            pitch_limit_deg: 89.0,
            fov_deg: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// First-person yaw/pitch rig. Yaw 0, pitch 0 looks down -Z.
///
/// The rig is positioned by following the player body; it never moves on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub aspect: f32,
    config: CameraConfig,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl CameraRig {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            aspect: 16.0 / 9.0,
            config,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            -self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        )
    }

    /// Apply a mouse delta in pixels. Moving right turns right, moving down looks down.
    pub fn rotate(&mut self, delta: Vec2) {
        let limit = self.config.pitch_limit_deg.to_radians();
        self.yaw -= delta.x * self.config.sensitivity;
        self.pitch = (self.pitch - delta.y * self.config.sensitivity).clamp(-limit, limit);
    }

    /// Place the eye `eye_height` above the body center.
    pub fn follow(&mut self, body_position: Vec3, eye_height: f32) {
        self.position = body_position + Vec3::Y * eye_height;
    }

    /// Ray from the eye through the screen center.
    pub fn ray(&self) -> Option<Ray> {
        Ray::new(self.position, self.forward())
    }

    /// Turn the rig so it looks at `target`. No-op when `target` is the eye position.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(dir) = (target - self.position).try_normalize() else {
            return;
        };
        let limit = self.config.pitch_limit_deg.to_radians();
        self.yaw = (-dir.x).atan2(-dir.z);
        self.pitch = dir.y.clamp(-1.0, 1.0).asin().clamp(-limit, limit);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_deg.to_radians(),
            self.aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
