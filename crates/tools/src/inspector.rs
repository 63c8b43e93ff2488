use glam::Vec3;
use propyard_common::ObjectId;
use propyard_render::Renderer;
use propyard_session::Session;

/// Read-only queries against a running session, for debugging and dev UI.
pub struct SessionInspector;

impl SessionInspector {
    pub fn summary<R: Renderer>(session: &Session<R>) -> SessionSummary {
        let placement = session.placement();
        let ghost = placement.ghost();
        SessionSummary {
            frames: session.frames(),
            ticks: session.world().tick(),
            bodies: session.world().body_count(),
            meshes: session.scene().len(),
            objects: placement.registry().len(),
            player_position: session.player_position().unwrap_or(Vec3::ZERO),
            player_velocity: session.player_velocity().unwrap_or(Vec3::ZERO),
            grounded: session.is_grounded(),
            movement_enabled: session.movement_enabled(),
            pointer_locked: session.pointer_locked(),
            selected_asset: ghost.asset_id().map(str::to_owned),
            ghost_visible: ghost.is_visible(session.scene()),
            ghost_yaw_deg: ghost.yaw().to_degrees(),
        }
    }

    pub fn inspect_object<R: Renderer>(session: &Session<R>, id: &ObjectId) -> Option<ObjectInfo> {
        let entry = session.placement().registry().get(id)?;
        Some(ObjectInfo {
            id: id.clone(),
            asset_id: entry.object.asset_id.clone(),
            position: entry.object.position,
            rotation: entry.object.rotation,
            has_body: session.world().get(entry.body).is_some(),
        })
    }

    /// Placed object ids in placement order.
    pub fn list_objects<R: Renderer>(session: &Session<R>) -> Vec<ObjectId> {
        session
            .placement()
            .to_serialized()
            .into_iter()
            .map(|o| o.id)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub frames: u64,
    pub ticks: u64,
    pub bodies: usize,
    pub meshes: usize,
    pub objects: usize,
    pub player_position: Vec3,
    pub player_velocity: Vec3,
    pub grounded: bool,
    pub movement_enabled: bool,
    pub pointer_locked: bool,
    pub selected_asset: Option<String>,
    pub ghost_visible: bool,
    pub ghost_yaw_deg: f32,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.player_position;
        write!(
            f,
            "Session: frame={} tick={} bodies={} meshes={} objects={} player=({:.2}, {:.2}, {:.2}) grounded={} ghost={}@{:.0}deg",
            self.frames,
            self.ticks,
            self.bodies,
            self.meshes,
            self.objects,
            p.x,
            p.y,
            p.z,
            self.grounded,
            self.selected_asset.as_deref().unwrap_or("-"),
            self.ghost_yaw_deg,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub asset_id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub has_body: bool,
}

impl std::fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Object [{}] {} pos=({:.2}, {:.2}, {:.2}) yaw={:.0}deg",
            self.id.short(),
            self.asset_id,
            self.position[0],
            self.position[1],
            self.position[2],
            self.rotation[1].to_degrees(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propyard_input::{Action, InputIntent};
    use propyard_render::DebugTextRenderer;
    use propyard_session::{SessionBuilder, SessionConfig};

    fn session() -> Session<DebugTextRenderer> {
        SessionBuilder::new(SessionConfig::default())
            .with_defaults()
            .renderer(DebugTextRenderer::new())
            .build()
            .unwrap()
    }

    fn locked(actions: Vec<Action>) -> InputIntent {
        InputIntent {
            pointer_locked: true,
            actions,
            ..InputIntent::default()
        }
    }

    #[test]
    fn summary_of_fresh_session() {
        let s = session();
        let summary = SessionInspector::summary(&s);
        assert_eq!(summary.frames, 0);
        // Floor and player.
        assert_eq!(summary.bodies, 2);
        assert_eq!(summary.objects, 0);
        assert!(!summary.ghost_visible);
        assert_eq!(summary.selected_asset.as_deref(), Some("block"));
        assert!(format!("{summary}").contains("frame=0"));
    }

    #[test]
    fn placed_objects_are_listed_and_inspectable() {
        let mut s = session();
        for _ in 0..120 {
            s.frame(1.0 / 60.0, InputIntent::default());
        }
        s.camera_mut().pitch = -0.5;
        s.frame(1.0 / 60.0, locked(vec![]));
        s.frame(1.0 / 60.0, locked(vec![Action::Place]));

        let ids = SessionInspector::list_objects(&s);
        assert_eq!(ids.len(), 1);
        let info = SessionInspector::inspect_object(&s, &ids[0]).unwrap();
        assert_eq!(info.asset_id, "block");
        assert!(info.has_body);
        assert!(format!("{info}").contains("block"));

        let summary = SessionInspector::summary(&s);
        assert_eq!(summary.objects, 1);
        assert_eq!(summary.bodies, 3);
    }

    #[test]
    fn unknown_object_is_none() {
        let s = session();
        assert!(SessionInspector::inspect_object(&s, &ObjectId::from("nope")).is_none());
    }
}
