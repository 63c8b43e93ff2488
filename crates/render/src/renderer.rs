use glam::{Mat4, Vec3};
use propyard_scene::{CameraRig, Geometry, SceneGraph};
use std::fmt::Write;

/// Camera state captured for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub eye: Vec3,
    pub forward: Vec3,
    pub fov_degrees: f32,
    pub view_projection: Mat4,
}

impl RenderView {
    pub fn from_camera(camera: &CameraRig) -> Self {
        Self {
            eye: camera.position,
            forward: camera.forward(),
            fov_degrees: camera.config().fov_deg,
            view_projection: camera.view_projection(),
        }
    }
}

impl Default for RenderView {
    fn default() -> Self {
        Self::from_camera(&CameraRig::default())
    }
}

/// What a renderer reports after drawing a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub drawn: usize,
    pub hidden: usize,
    pub translucent: usize,
}

/// Renderer-agnostic interface.
///
/// Takes the scene graph by shared reference: drawing can never change
/// what the simulation owns.
pub trait Renderer {
    fn render(&mut self, scene: &SceneGraph, view: &RenderView) -> FrameStats;
}

/// Text renderer for headless runs and tests. Keeps the last frame's text.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
    last: String,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> &str {
        &self.last
    }
}

impl Renderer for DebugTextRenderer {
    fn render(&mut self, scene: &SceneGraph, view: &RenderView) -> FrameStats {
        self.frames += 1;
        let mut stats = FrameStats {
            frame: self.frames,
            ..FrameStats::default()
        };
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame {} ===", self.frames);
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) dir=({:.2}, {:.2}, {:.2}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.forward.x, view.forward.y, view.forward.z,
            view.fov_degrees
        );

        let mut lines = Vec::new();
        for (id, mesh) in scene.meshes() {
            if !mesh.visible {
                stats.hidden += 1;
                continue;
            }
            stats.drawn += 1;
            if mesh.material.transparent {
                stats.translucent += 1;
            }
            let p = mesh.transform.position;
            let shape = match mesh.geometry {
                Geometry::Box { size } => format!("box {:.1}x{:.1}x{:.1}", size.x, size.y, size.z),
                Geometry::Sphere { radius } => format!("sphere r={radius:.2}"),
            };
            let label: String = mesh.label.chars().take(8).collect();
            lines.push(format!(
                "  #{:<3} {:<8} {} pos=({:.2}, {:.2}, {:.2})",
                id.0, label, shape, p.x, p.y, p.z
            ));
        }
        let _ = writeln!(out, "Meshes: {} drawn, {} hidden", stats.drawn, stats.hidden);
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }

        tracing::trace!(frame = self.frames, drawn = stats.drawn, "rendered");
        self.last = out;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propyard_common::Transform;
    use propyard_scene::{Material, VisualMesh};

    #[test]
    fn empty_scene() {
        let mut renderer = DebugTextRenderer::new();
        let stats = renderer.render(&SceneGraph::new(), &RenderView::default());
        assert_eq!(stats.frame, 1);
        assert_eq!(stats.drawn, 0);
        assert!(renderer.last_frame().contains("Meshes: 0 drawn"));
    }

    #[test]
    fn hidden_meshes_are_counted_not_drawn() {
        let mut scene = SceneGraph::new();
        scene.add_mesh(
            VisualMesh::new("crate", Geometry::cube([2.0, 2.0, 2.0]), Material::default())
                .with_transform(Transform::from_position_rotation(
                    Vec3::new(1.0, 2.0, 3.0),
                    glam::Quat::IDENTITY,
                )),
        );
        let mut ghost = VisualMesh::new(
            "ghost",
            Geometry::cube([1.0, 1.0, 1.0]),
            Material::translucent([1.0; 3], 0.5),
        );
        ghost.visible = false;
        scene.add_mesh(ghost);

        let mut renderer = DebugTextRenderer::new();
        let stats = renderer.render(&scene, &RenderView::default());
        assert_eq!((stats.drawn, stats.hidden, stats.translucent), (1, 1, 0));
        assert!(renderer.last_frame().contains("pos=(1.00, 2.00, 3.00)"));
        assert!(!renderer.last_frame().contains("ghost"));
    }

    #[test]
    fn view_follows_camera() {
        let mut camera = CameraRig::default();
        camera.position = Vec3::new(0.0, 1.6, 0.0);
        let view = RenderView::from_camera(&camera);
        assert_eq!(view.eye, camera.position);
        assert!((view.forward - Vec3::NEG_Z).length() < 1e-6);
        assert_eq!(view.fov_degrees, 75.0);
    }
}
