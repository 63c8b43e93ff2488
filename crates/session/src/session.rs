use crate::config::SessionConfig;
use glam::Vec3;
use parking_lot::Mutex;
use propyard_assets::{AssetCatalog, AssetError};
use propyard_author::{PlacementTool, SaveMode};
use propyard_common::{ObjectId, Transform};
use propyard_input::{GameActions, InputIntent};
use propyard_kernel::{
    BodyHandle, GroundingResolver, MovementCommand, MovementController, PhysicsError,
    PhysicsWorld, RigidBody, Shape, SleepPolicy, StepReport,
};
use propyard_persist::{LoadCallback, MemoryStore, Persistence, Snapshot, Subscription};
use propyard_render::{FrameStats, RenderView, Renderer};
use propyard_scene::{CameraRig, Geometry, Material, MeshId, SceneGraph, VisualMesh};
use std::sync::Arc;

/// Why a session could not start. No frame runs after any of these.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("missing runtime dependency: {0}")]
    MissingDependency(&'static str),
    #[error("asset catalog: {0}")]
    Asset(#[from] AssetError),
    #[error("physics: {0}")]
    Physics(#[from] PhysicsError),
}

/// Newest state delivered by the persistence backend, not yet applied.
type ReloadSlot = Arc<Mutex<Option<Snapshot>>>;

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub step: StepReport,
    pub jumped: bool,
    pub grounded: bool,
    pub reloaded: bool,
    /// Snapped ghost position, if the ghost is on a surface.
    pub ghost: Option<Vec3>,
    pub render: FrameStats,
    /// Scene events produced this frame. They are drained after rendering.
    pub scene_events: usize,
}

/// Collects the pieces a session needs and checks they are all present.
pub struct SessionBuilder<R> {
    config: SessionConfig,
    world: Option<PhysicsWorld>,
    camera: Option<CameraRig>,
    renderer: Option<R>,
    catalog: Option<Arc<AssetCatalog>>,
    persistence: Option<Arc<dyn Persistence>>,
}

impl<R: Renderer> SessionBuilder<R> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            world: None,
            camera: None,
            renderer: None,
            catalog: None,
            persistence: None,
        }
    }

    /// Use a fresh world and camera built from the config.
    pub fn with_defaults(self) -> Self {
        let world = PhysicsWorld::new(self.config.physics);
        let camera = CameraRig::new(self.config.camera);
        self.world(world).camera(camera)
    }

    pub fn world(mut self, world: PhysicsWorld) -> Self {
        self.world = Some(world);
        self
    }

    pub fn camera(mut self, camera: CameraRig) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn renderer(mut self, renderer: R) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Defaults to the built-in catalog.
    pub fn catalog(mut self, catalog: Arc<AssetCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Defaults to an in-memory store.
    pub fn persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn build(self) -> Result<Session<R>, StartupError> {
        let mut world = self
            .world
            .ok_or(StartupError::MissingDependency("physics world"))?;
        let mut camera = self
            .camera
            .ok_or(StartupError::MissingDependency("camera"))?;
        let renderer = self
            .renderer
            .ok_or(StartupError::MissingDependency("renderer"))?;
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Arc::new(AssetCatalog::builtin()),
        };
        catalog.validate()?;
        let persistence: Arc<dyn Persistence> = match self.persistence {
            Some(persistence) => persistence,
            None => Arc::new(MemoryStore::new()),
        };
        let config = self.config;
        let mut scene = SceneGraph::new();

        let floor_asset = catalog.floor()?;
        let floor_size = Vec3::from_array(floor_asset.bounding_size);
        let floor_pos = Vec3::new(0.0, -floor_size.y * 0.5, 0.0);
        let floor_body = world.add_body(RigidBody::fixed(
            Shape::Box {
                half_extents: floor_size * 0.5,
            },
            floor_pos,
        ));
        let floor_color = Material::color_from_hex(&floor_asset.color).unwrap_or([0.3, 0.4, 0.2]);
        let floor_mesh = scene.add_mesh(
            VisualMesh::new(
                floor_asset.id.as_str(),
                Geometry::Box { size: floor_size },
                Material::opaque(floor_color),
            )
            .with_transform(Transform::from_position_rotation(floor_pos, glam::Quat::IDENTITY)),
        );
        scene.bind(floor_mesh, floor_body);

        let player = &config.player;
        let player_body = world.add_body(
            RigidBody::dynamic(Shape::Sphere { radius: player.radius }, player.mass, player.spawn)
                .with_damping(player.damping)
                .with_sleep_policy(SleepPolicy::never()),
        );
        world.set_player(player_body)?;
        let mut player_mesh = VisualMesh::new(
            "player",
            Geometry::Sphere {
                radius: player.radius,
            },
            Material::default(),
        );
        player_mesh.visible = false;
        let player_mesh = scene.add_mesh(player_mesh);
        scene.bind(player_mesh, player_body);
        camera.follow(player.spawn, player.eye_height);

        let placement = PlacementTool::new(
            config.placement,
            Arc::clone(&catalog),
            Arc::clone(&persistence),
            floor_mesh,
            &mut scene,
        );

        let pending: ReloadSlot = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&pending);
        let callback: LoadCallback = Arc::new(move |snapshot: Snapshot| {
            let mut slot = slot.lock();
            if slot.as_ref().is_none_or(|held| held.revision <= snapshot.revision) {
                *slot = Some(snapshot);
            }
        });
        let subscription = persistence.subscribe(callback);

        tracing::info!(
            backend = persistence.name(),
            assets = catalog.len(),
            "session started"
        );

        Ok(Session {
            movement: MovementController::new(config.movement),
            grounding: GroundingResolver::new(player_body, config.grounding),
            config,
            world,
            scene,
            camera,
            renderer,
            placement,
            player_body,
            player_mesh,
            movement_enabled: true,
            pointer_locked: false,
            jump_requested: false,
            pending,
            _subscription: subscription,
            frames: 0,
        })
    }
}

/// One running sandbox: the world, its scene and the tools acting on them.
///
/// All mutation happens inside [`Session::frame`] or the explicit editing
/// calls on the same thread. Persistence callbacks only fill the reload slot.
pub struct Session<R> {
    config: SessionConfig,
    world: PhysicsWorld,
    scene: SceneGraph,
    camera: CameraRig,
    renderer: R,
    movement: MovementController,
    grounding: GroundingResolver,
    placement: PlacementTool,
    player_body: BodyHandle,
    player_mesh: MeshId,
    movement_enabled: bool,
    pointer_locked: bool,
    jump_requested: bool,
    pending: ReloadSlot,
    _subscription: Subscription,
    frames: u64,
}

impl<R: Renderer> Session<R> {
    /// Run one frame.
    ///
    /// Order: pending reload, look, actions, movement, physics step,
    /// grounding, kill plane, scene sync, camera, ghost, render, scene event drain.
    pub fn frame(&mut self, dt: f32, intent: InputIntent) -> FrameReport {
        self.frames += 1;
        let span = tracing::info_span!("frame", n = self.frames);
        let _guard = span.enter();

        let reloaded = self.apply_pending_reload();

        self.pointer_locked = intent.pointer_locked;
        if self.pointer_locked {
            self.camera.rotate(intent.look_delta);
        }

        self.jump_requested = false;
        for action in intent.actions {
            action.dispatch(self);
        }

        let command = MovementCommand {
            flags: intent.movement,
            jump: self.jump_requested,
            yaw: self.camera.yaw,
        };
        let outcome = self.movement.apply(
            &command,
            self.movement_enabled,
            &mut self.grounding,
            &mut self.world,
            self.player_body,
        );

        let step = self.world.step(dt, &mut self.grounding);
        self.grounding.update(&self.world, &step);
        self.enforce_kill_plane();

        self.scene.sync_from_physics(&self.world);
        if let Some(position) = self.player_position() {
            self.camera.follow(position, self.config.player.eye_height);
        }
        let ray = self.camera.ray();
        let ghost = self
            .placement
            .update_ghost_position(&mut self.scene, ray.as_ref());

        let view = RenderView::from_camera(&self.camera);
        let render = self.renderer.render(&self.scene, &view);
        let scene_events = self.scene.drain_events().len();
        if scene_events > 0 {
            tracing::trace!(scene_events, "drained scene events");
        }

        FrameReport {
            frame: self.frames,
            step,
            jumped: outcome.jumped,
            grounded: self.grounding.is_grounded(),
            reloaded,
            ghost,
            render,
            scene_events,
        }
    }

    /// Apply the latest persisted state, if one arrived since the last frame.
    ///
    /// State older than the last local save was captured before a commit or
    /// removal and would undo it, so it is dropped.
    fn apply_pending_reload(&mut self) -> bool {
        let Some(Snapshot { revision, payload }) = self.pending.lock().take() else {
            return false;
        };
        let saved = self.placement.saved_revision();
        if revision < saved {
            tracing::debug!(revision, saved, "dropping persisted state older than local save");
            return false;
        }
        // Immediate-echo backends hand back what we just saved.
        if let Ok(current) = serde_json::to_value(self.placement.to_serialized()) {
            if current == payload {
                tracing::trace!("persisted state matches registry");
                return false;
            }
        }
        match self
            .placement
            .reload(&mut self.scene, &mut self.world, &payload)
        {
            Ok(report) => {
                tracing::debug!(loaded = report.loaded, "applied persisted state");
                true
            }
            Err(_) => false,
        }
    }

    fn enforce_kill_plane(&mut self) {
        let Some(position) = self.player_position() else {
            return;
        };
        if position.y < self.config.player.kill_plane_y {
            tracing::info!(y = position.y, "player fell out of the world");
            self.respawn();
        }
    }

    fn respawn(&mut self) {
        self.world
            .set_position(self.player_body, self.config.player.spawn);
        self.world.set_velocity(self.player_body, Vec3::ZERO);
        self.grounding.reset();
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn placement(&self) -> &PlacementTool {
        &self.placement
    }

    pub fn player_body(&self) -> BodyHandle {
        self.player_body
    }

    pub fn player_mesh(&self) -> MeshId {
        self.player_mesh
    }

    pub fn player_position(&self) -> Option<Vec3> {
        self.world.get(self.player_body).map(|b| b.position)
    }

    pub fn player_velocity(&self) -> Option<Vec3> {
        self.world.velocity(self.player_body)
    }

    pub fn is_grounded(&self) -> bool {
        self.grounding.is_grounded()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    pub fn movement_enabled(&self) -> bool {
        self.movement_enabled
    }

    /// Freeze or unfreeze player control. Gravity still applies.
    pub fn set_movement_enabled(&mut self, enabled: bool) {
        if self.movement_enabled != enabled {
            tracing::info!(enabled, "movement toggled");
        }
        self.movement_enabled = enabled;
    }

    /// Remove a placed object and persist the result.
    pub fn remove_object(&mut self, id: &ObjectId) -> bool {
        self.placement
            .remove(&mut self.scene, &mut self.world, id, SaveMode::Save)
    }
}

impl<R: Renderer> GameActions for Session<R> {
    fn jump(&mut self) {
        self.jump_requested = true;
    }

    fn place(&mut self) {
        self.placement
            .commit(&mut self.scene, &mut self.world, self.pointer_locked);
    }

    fn rotate_ghost(&mut self) {
        if self.pointer_locked {
            self.placement.rotate_ghost_step(&mut self.scene);
        }
    }

    fn cycle_asset(&mut self, delta: i32) {
        self.placement.cycle_asset(&mut self.scene, delta);
    }

    fn select_asset(&mut self, index: usize) {
        self.placement.select_asset(&mut self.scene, index);
    }

    fn release_pointer(&mut self) {
        self.pointer_locked = false;
    }

    fn restart(&mut self) {
        if self.movement_enabled {
            tracing::debug!("restart ignored while playing");
            return;
        }
        tracing::info!("restart");
        self.respawn();
        self.movement_enabled = true;
    }
}
