use glam::Vec3;
use propyard_author::PlacementConfig;
use propyard_kernel::{GroundingStrategy, MovementConfig, PhysicsConfig};
use propyard_scene::CameraConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The player's physics body and viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub radius: f32,
    pub mass: f32,
    pub damping: f32,
    pub spawn: Vec3,
    /// Eye offset above the body center.
    pub eye_height: f32,
    /// Falling below this height respawns the player.
    pub kill_plane_y: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            mass: 5.0,
            damping: 0.01,
            spawn: Vec3::new(0.0, 5.0, 10.0),
            eye_height: 0.6,
            kill_plane_y: -50.0,
        }
    }
}

/// Everything a session needs, loadable from one YAML document.
///
/// Missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub physics: PhysicsConfig,
    pub grounding: GroundingStrategy,
    pub movement: MovementConfig,
    pub player: PlayerConfig,
    pub placement: PlacementConfig,
    pub camera: CameraConfig,
}

impl SessionConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = SessionConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "
movement:
  speed: 8.0
placement:
  grid_step: 2.0
grounding:
  kind: contact
  min_normal_y: 0.7
";
        let config = SessionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.movement.speed, 8.0);
        assert_eq!(config.movement.jump_speed, MovementConfig::default().jump_speed);
        assert_eq!(config.placement.grid_step, 2.0);
        assert_eq!(config.placement.rotation_step_deg, 90.0);
        assert_eq!(
            config.grounding,
            GroundingStrategy::Contact { min_normal_y: 0.7 }
        );
        assert_eq!(config.physics.max_substeps, 3);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yaml");
        let mut config = SessionConfig::default();
        config.player.eye_height = 1.2;
        std::fs::write(&path, config.to_yaml_string().unwrap()).unwrap();
        assert_eq!(SessionConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let err = SessionConfig::from_yaml_str("movement: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
