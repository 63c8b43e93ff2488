//! Render-side scene: visual meshes, one-way physics-to-mesh sync and the camera rig.
//!
//! Meshes are stored in BTreeMap so sync and ray queries visit them in id order.

pub mod camera;
pub mod graph;
pub mod mesh;

pub use camera::{CameraConfig, CameraRig};
pub use graph::{MeshHit, SceneEvent, SceneGraph};
pub use mesh::{Geometry, Material, MeshId, VisualMesh};
