//! The coordination core: one owner for the live model, the visual-mode
//! controllers, the lighting rig, the camera, and the per-frame tick that
//! keeps them consistent.

mod clock;
mod environment;
mod intent;
mod lifecycle;
mod material_mode;
mod motion;
mod settings;

pub use clock::{FrameClock, SimClock};
pub use environment::{
    fetch_hdri, BackgroundSource, EnvironmentController, HdriError, HdriSource, HttpHdriSource,
    LightingSource, DEFAULT_SOLID_COLOR, HDRI_URL,
};
pub use intent::{LightIntent, ViewerIntent};
pub use lifecycle::{LiveModel, ModelHelpers, ModelLifecycle, FIT_TARGET_SIZE};
pub use material_mode::{MaterialMode, MaterialModeController, CLAY_COLOR, HOLOGRAM_COLOR};
pub use motion::{CircularPlane, MotionController, MotionState, MotionType};
pub use settings::{
    BackgroundSection, CameraSection, LightExport, LightingSection, MetaSection, ModelSection,
    MotionSection, PointLightExport, SettingsError, SettingsSnapshot, SimulationSection,
    SpotLightExport, VisualizationSection, APP_NAME, SETTINGS_VERSION,
};

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;

use crate::assets::ImporterSet;
use crate::planet::PlanetChannel;
use crate::render::{Frame, OrbitCamera, RenderBackend};
use crate::scene::lighting::LightRig;
use crate::scene::{NodeId, SceneGraph};

/// Textual status side-channel: always the latest event, never a modal.
#[derive(Debug, Default)]
pub struct StatusFeed {
    line: String,
}

impl StatusFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, message: &str) {
        log::debug!("status: {message}");
        self.line = message.to_string();
    }

    pub fn clear(&mut self) {
        self.line.clear();
    }

    pub fn current(&self) -> &str {
        &self.line
    }
}

/// Frame deltas above this are clamped so a stalled tab cannot integrate
/// a huge motion step.
const DELTA_CAP: f32 = 0.05;

/// The viewer engine. The embedder pumps [`ViewerIntent`]s in from its
/// panel and calls [`tick`] once per display refresh with its backend.
///
/// [`tick`]: Viewer::tick
pub struct Viewer {
    scene: SceneGraph,
    camera: OrbitCamera,
    lights: LightRig,
    materials: MaterialModeController,
    environment: EnvironmentController,
    motion: MotionController,
    lifecycle: ModelLifecycle,
    sim: SimClock,
    status: StatusFeed,
    grid: NodeId,
    origin_axes: NodeId,
    elapsed: f32,
    env_dirty: bool,
}

impl Viewer {
    pub fn new(importers: ImporterSet) -> Self {
        Self::with_hdri_source(importers, Box::new(HttpHdriSource))
    }

    pub fn with_hdri_source(importers: ImporterSet, hdri: Box<dyn HdriSource>) -> Self {
        let mut scene = SceneGraph::new();
        let materials = MaterialModeController::new(&mut scene.materials);
        let grid = scene.add_grid_helper(10.0, 20, true);
        let origin_axes = scene.add_axes_helper(None, "OriginAxes", 5.0, true);
        Self {
            scene,
            camera: OrbitCamera::new(),
            lights: LightRig::default(),
            materials,
            environment: EnvironmentController::new(hdri),
            motion: MotionController::new(),
            lifecycle: ModelLifecycle::new(importers),
            sim: SimClock::default(),
            status: StatusFeed::new(),
            grid,
            origin_axes,
            elapsed: 0.0,
            env_dirty: true,
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn status(&self) -> &str {
        self.status.current()
    }

    pub fn model(&self) -> Option<&LiveModel> {
        self.lifecycle.current()
    }

    pub fn is_loading(&self) -> bool {
        self.lifecycle.is_loading()
    }

    pub fn simulation(&self) -> &SimClock {
        &self.sim
    }

    pub fn motion_state(&self) -> &MotionState {
        &self.motion.state
    }

    /// Current process-wide material mode, for panels that mirror it.
    pub fn material_mode(&self) -> MaterialMode {
        self.materials.mode()
    }

    pub fn environment(&self) -> &EnvironmentController {
        &self.environment
    }

    pub fn attach_planet_channel(&mut self, channel: Box<dyn PlanetChannel>) {
        self.environment.planet_mut().attach(channel);
    }

    pub fn resize(&mut self, width: u32, height: u32, backend: &mut dyn RenderBackend) {
        self.camera.set_aspect(width, height);
        backend.resize(width, height);
    }

    /// Dispatch one panel command to its controller.
    pub fn apply(&mut self, intent: ViewerIntent) {
        match intent {
            ViewerIntent::LoadModel { url, name } => {
                self.lifecycle.load(&url, &name, &mut self.status);
            }

            ViewerIntent::SetMaterialMode(mode) => {
                let meshes = self
                    .lifecycle
                    .current()
                    .map(|model| model.meshes.clone())
                    .unwrap_or_default();
                self.materials.set_mode(mode, &mut self.scene, &meshes);
            }
            ViewerIntent::SetHologramColor(color) => {
                self.materials
                    .set_hologram_color(&mut self.scene.materials, color);
            }
            ViewerIntent::SetAberrationStrength(strength) => {
                self.materials
                    .set_aberration_strength(&mut self.scene.materials, strength);
            }

            ViewerIntent::ShowGrid(visible) => self.scene.set_visible(self.grid, visible),
            ViewerIntent::ShowOriginAxes(visible) => {
                self.scene.set_visible(self.origin_axes, visible);
            }
            ViewerIntent::ShowBoundingBox(visible) => {
                if let Some(model) = self.lifecycle.current() {
                    self.scene.set_visible(model.helpers.bounding_box, visible);
                }
            }
            ViewerIntent::ShowBoundingSphere(visible) => {
                if let Some(model) = self.lifecycle.current() {
                    self.scene
                        .set_visible(model.helpers.bounding_sphere, visible);
                }
            }
            ViewerIntent::ShowLocalAxes(visible) => {
                if let Some(model) = self.lifecycle.current() {
                    self.scene.set_visible(model.helpers.local_axes, visible);
                }
            }
            ViewerIntent::ShowVelocityArrow(visible) => {
                if let Some(model) = self.lifecycle.current() {
                    self.scene.set_visible(model.helpers.velocity_arrow, visible);
                }
            }

            ViewerIntent::Light(light) => self.apply_light(light),

            ViewerIntent::SetBackgroundSource(source) => {
                self.environment.set_background_source(source, &mut self.status);
                self.env_dirty = true;
            }
            ViewerIntent::SetSolidColor(color) => {
                self.environment.set_solid_color(color);
                self.env_dirty = true;
            }
            ViewerIntent::SetHdriLighting(enabled) => {
                let lighting = if enabled {
                    LightingSource::Hdri
                } else {
                    LightingSource::None
                };
                self.environment.set_lighting_source(lighting, &mut self.status);
                self.env_dirty = true;
            }

            ViewerIntent::SetMotionEnabled(enabled) => self.motion.state.enabled = enabled,
            ViewerIntent::SetMotionType(motion_type) => {
                self.motion.state.motion_type = motion_type;
            }
            ViewerIntent::SetAngularVelocity(velocity) => {
                self.motion.state.angular_velocity = velocity;
            }
            ViewerIntent::SetLinearVelocity(velocity) => {
                self.motion.state.linear_velocity = velocity;
            }
            ViewerIntent::SetCircularRadius(radius) => {
                self.motion.state.circular_radius = radius;
            }
            ViewerIntent::SetCircularSpeed(speed) => self.motion.state.circular_speed = speed,
            ViewerIntent::SetCircularPlane(plane) => self.motion.state.circular_plane = plane,
            ViewerIntent::ShowTrajectory(show) => self.motion.state.show_trajectory = show,
            ViewerIntent::SetTrajectoryLength(length) => {
                self.motion.state.trajectory_length = length;
            }
            ViewerIntent::ClearTrajectory => self.motion.clear(&mut self.scene),

            ViewerIntent::CameraPreset(preset) => self.camera.apply_preset(preset),
            ViewerIntent::SetFov(fov) => self.camera.set_fov(fov),
            ViewerIntent::SetAutoRotate(enabled) => self.camera.auto_rotate = enabled,
            ViewerIntent::SetAutoRotateSpeed(speed) => self.camera.auto_rotate_speed = speed,

            ViewerIntent::SetSimulationRunning(running) => self.sim.running = running,
            ViewerIntent::SetTimeScale(scale) => self.sim.time_scale = scale,
            ViewerIntent::ResetSimulation => self.reset_simulation(),

            ViewerIntent::Planet(message) => self.environment.planet_mut().send(&message),
        }
    }

    fn apply_light(&mut self, intent: LightIntent) {
        let rig = &mut self.lights;
        match intent {
            LightIntent::AmbientIntensity(value) => rig.ambient.intensity = value,

            LightIntent::KeyEnabled(on) => rig.key.enabled = on,
            LightIntent::KeyColor(color) => rig.key.color = color,
            LightIntent::KeyIntensity(value) => rig.key.intensity = value,

            LightIntent::FillEnabled(on) => rig.fill.enabled = on,
            LightIntent::FillColor(color) => rig.fill.color = color,
            LightIntent::FillIntensity(value) => rig.fill.intensity = value,

            LightIntent::RimEnabled(on) => rig.rim.enabled = on,
            LightIntent::RimColor(color) => rig.rim.color = color,
            LightIntent::RimIntensity(value) => rig.rim.intensity = value,

            LightIntent::PointEnabled(on) => rig.point.enabled = on,
            LightIntent::PointColor(color) => rig.point.color = color,
            LightIntent::PointIntensity(value) => rig.point.intensity = value,
            LightIntent::PointPosition(position) => rig.point.position = position,

            LightIntent::SpotEnabled(on) => rig.spot.enabled = on,
            LightIntent::SpotIntensity(value) => rig.spot.intensity = value,
            LightIntent::SpotAngle(value) => rig.spot.angle = value,
            LightIntent::SpotPenumbra(value) => rig.spot.penumbra = value,
        }
    }

    /// Zero the simulation readout, restore the model's rest pose, and
    /// clear the trail.
    fn reset_simulation(&mut self) {
        self.sim.reset();
        if let Some(root) = self.lifecycle.model_root() {
            if let Some(node) = self.scene.node_mut(root) {
                node.transform.position = Vec3::ZERO;
                node.transform.rotation = Vec3::ZERO;
            }
        }
        self.motion.clear(&mut self.scene);
    }

    /// One frame: drain async work, advance the clocks and controllers in
    /// the fixed order, draw. Never fails: load and fetch errors surface
    /// through the status line instead.
    pub fn tick(&mut self, delta: f32, backend: &mut dyn RenderBackend) {
        let delta = delta.clamp(0.0, DELTA_CAP);
        self.elapsed += delta;
        self.sim.advance(delta);

        self.lifecycle.poll(
            &mut self.scene,
            &mut self.materials,
            &mut self.motion,
            &mut self.camera,
            &mut self.status,
        );

        let hdri_changed = self.environment.poll(&mut self.status);
        if self.env_dirty || hdri_changed {
            self.environment.apply(backend);
            self.env_dirty = false;
        }

        self.materials.tick(&mut self.scene.materials, self.elapsed);
        self.motion.tick(
            &mut self.scene,
            self.lifecycle.model_root(),
            self.elapsed,
            delta,
        );
        self.lifecycle.refresh_bounding_box(&mut self.scene);
        self.camera.update(delta);

        backend.draw(Frame {
            scene: &self.scene,
            camera: &self.camera,
            lights: &self.lights,
        });
    }

    pub fn export_settings(&self) -> SettingsSnapshot {
        let holo = self.materials.hologram_params(&self.scene.materials);
        let visible = |id: NodeId| self.scene.node(id).map(|node| node.visible).unwrap_or(false);
        let helper_visible = |pick: fn(&ModelHelpers) -> NodeId| {
            self.lifecycle
                .current()
                .map(|model| visible(pick(&model.helpers)))
                .unwrap_or(false)
        };
        let motion = &self.motion.state;
        let rig = &self.lights;

        SettingsSnapshot {
            meta: MetaSection {
                app: APP_NAME.to_string(),
                version: SETTINGS_VERSION.to_string(),
                exported_at: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_secs())
                    .unwrap_or(0),
            },
            model: ModelSection {
                name: self
                    .lifecycle
                    .current()
                    .map(|model| model.name.clone())
                    .unwrap_or_else(|| "none".to_string()),
            },
            visualization: VisualizationSection {
                material_mode: self.materials.mode(),
                holo_color: holo.color,
                aberration: holo.aberration_strength,
                grid: visible(self.grid),
                origin_axes: visible(self.origin_axes),
                bounding_box: helper_visible(|helpers| helpers.bounding_box),
                local_axes: helper_visible(|helpers| helpers.local_axes),
            },
            lighting: LightingSection {
                ambient_intensity: rig.ambient.intensity,
                key: LightExport {
                    on: rig.key.enabled,
                    color: rig.key.color,
                    intensity: rig.key.intensity,
                },
                fill: LightExport {
                    on: rig.fill.enabled,
                    color: rig.fill.color,
                    intensity: rig.fill.intensity,
                },
                rim: LightExport {
                    on: rig.rim.enabled,
                    color: rig.rim.color,
                    intensity: rig.rim.intensity,
                },
                point: PointLightExport {
                    on: rig.point.enabled,
                    color: rig.point.color,
                    intensity: rig.point.intensity,
                    x: rig.point.position.x,
                    y: rig.point.position.y,
                    z: rig.point.position.z,
                },
                spot: SpotLightExport {
                    on: rig.spot.enabled,
                    intensity: rig.spot.intensity,
                    angle: rig.spot.angle,
                    penumbra: rig.spot.penumbra,
                },
            },
            background: BackgroundSection {
                source: self.environment.background(),
                solid_color: self.environment.solid_color(),
                hdri_lighting: self.environment.lighting() == LightingSource::Hdri,
            },
            motion: MotionSection {
                enabled: motion.enabled,
                motion_type: motion.motion_type,
                wx: motion.angular_velocity.x,
                wy: motion.angular_velocity.y,
                wz: motion.angular_velocity.z,
                vx: motion.linear_velocity.x,
                vy: motion.linear_velocity.y,
                vz: motion.linear_velocity.z,
                circular_radius: motion.circular_radius,
                circular_speed: motion.circular_speed,
                circular_axis: motion.circular_plane,
                show_trajectory: motion.show_trajectory,
                trajectory_length: motion.trajectory_length,
            },
            camera: CameraSection {
                fov: self.camera.fov_deg,
                auto_rotate: self.camera.auto_rotate,
                auto_rotate_speed: self.camera.auto_rotate_speed,
                position: self.camera.position.to_array(),
                target: self.camera.target.to_array(),
            },
            simulation: SimulationSection {
                running: self.sim.running,
                time_scale: self.sim.time_scale,
                current_time: self.sim.current_time,
            },
        }
    }

    pub fn save_settings(&self, path: &Path) -> Result<(), SettingsError> {
        self.export_settings().write_to_file(path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::Sender;
    use std::sync::{Arc, Mutex};

    use glam::Vec3;

    use crate::assets::{
        AssetImporter, Delivery, ImporterSet, ModelPrefab, PrefabMesh, PrefabNode,
    };
    use crate::planet::{PlanetChannel, PlanetMessage};
    use crate::render::{HdriTexture, HeadlessBackend};
    use crate::scene::materials::PbrParams;
    use crate::scene::Geometry;

    use super::*;

    /// Importer that completes immediately with a unit cube.
    struct InstantImporter;

    impl AssetImporter for InstantImporter {
        fn begin(&self, url: &str, delivery: Delivery) {
            delivery.progress(10, 100);
            delivery.finish(Ok(ModelPrefab {
                name: url.to_string(),
                root: PrefabNode {
                    name: "Cube".to_string(),
                    transform: Default::default(),
                    mesh: Some(PrefabMesh {
                        geometry: Geometry::from_positions(vec![
                            Vec3::splat(-0.5),
                            Vec3::splat(0.5),
                        ]),
                        material: PbrParams::default(),
                    }),
                    children: Vec::new(),
                },
            }));
        }
    }

    struct SilentHdri;

    impl HdriSource for SilentHdri {
        fn begin(&self, _url: &str, _results: Sender<Result<HdriTexture, HdriError>>) {}
    }

    fn test_viewer() -> Viewer {
        let mut importers = ImporterSet::new();
        importers.register(&["glb", "gltf", "stl", "obj", "fbx", "3ds"], Arc::new(InstantImporter));
        Viewer::with_hdri_source(importers, Box::new(SilentHdri))
    }

    #[test]
    fn load_intent_installs_a_model_on_the_next_tick() {
        let mut viewer = test_viewer();
        let mut backend = HeadlessBackend::new();
        viewer.apply(ViewerIntent::LoadModel {
            url: "https://x/cube.glb".to_string(),
            name: "Cube".to_string(),
        });
        assert!(viewer.model().is_none());
        viewer.tick(0.016, &mut backend);
        assert!(viewer.model().is_some());
        assert_eq!(viewer.status(), "");
        assert_eq!(backend.frames_drawn, 1);
    }

    #[test]
    fn helper_toggles_only_touch_the_live_model() {
        let mut viewer = test_viewer();
        let mut backend = HeadlessBackend::new();
        // No model yet: toggles are harmless.
        viewer.apply(ViewerIntent::ShowBoundingBox(true));

        viewer.apply(ViewerIntent::LoadModel {
            url: "https://x/cube.glb".to_string(),
            name: "Cube".to_string(),
        });
        viewer.tick(0.016, &mut backend);

        let bbox = viewer.model().unwrap().helpers.bounding_box;
        assert!(!viewer.scene().node(bbox).unwrap().visible);
        viewer.apply(ViewerIntent::ShowBoundingBox(true));
        assert!(viewer.scene().node(bbox).unwrap().visible);
    }

    #[test]
    fn grid_and_axes_start_visible_and_toggle() {
        let mut viewer = test_viewer();
        let grid = viewer.grid;
        assert!(viewer.scene().node(grid).unwrap().visible);
        viewer.apply(ViewerIntent::ShowGrid(false));
        assert!(!viewer.scene().node(grid).unwrap().visible);
    }

    #[test]
    fn reset_simulation_restores_the_rest_pose() {
        let mut viewer = test_viewer();
        let mut backend = HeadlessBackend::new();
        viewer.apply(ViewerIntent::LoadModel {
            url: "https://x/cube.glb".to_string(),
            name: "Cube".to_string(),
        });
        viewer.tick(0.016, &mut backend);

        viewer.apply(ViewerIntent::SetMotionEnabled(true));
        viewer.apply(ViewerIntent::SetMotionType(MotionType::Linear));
        viewer.apply(ViewerIntent::SetLinearVelocity(Vec3::new(1.0, 0.0, 0.0)));
        for _ in 0..20 {
            viewer.tick(0.05, &mut backend);
        }
        let root = viewer.model().unwrap().root;
        assert!(viewer.scene().node(root).unwrap().transform.position.x > 0.0);

        viewer.apply(ViewerIntent::ResetSimulation);
        assert_eq!(viewer.scene().node(root).unwrap().transform.position, Vec3::ZERO);
        assert_eq!(viewer.simulation().current_time, 0.0);
    }

    #[test]
    fn export_reflects_panel_state() {
        let mut viewer = test_viewer();
        viewer.apply(ViewerIntent::SetMaterialMode(MaterialMode::Clay));
        viewer.apply(ViewerIntent::SetFov(60.0));
        viewer.apply(ViewerIntent::Light(LightIntent::KeyIntensity(2.5)));
        viewer.apply(ViewerIntent::SetTimeScale(4.0));

        let snapshot = viewer.export_settings();
        assert_eq!(snapshot.model.name, "none");
        assert_eq!(snapshot.visualization.material_mode, MaterialMode::Clay);
        assert_eq!(snapshot.camera.fov, 60.0);
        assert_eq!(snapshot.lighting.key.intensity, 2.5);
        assert_eq!(snapshot.simulation.time_scale, 4.0);
        assert!(snapshot.to_json_pretty().unwrap().contains("materialMode"));
    }

    #[test]
    fn planet_intents_forward_to_the_channel() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        struct Recorder(Arc<Mutex<Vec<PlanetMessage>>>);
        impl PlanetChannel for Recorder {
            fn send(&mut self, message: &PlanetMessage) {
                self.0.lock().unwrap().push(message.clone());
            }
        }

        let mut viewer = test_viewer();
        viewer.attach_planet_channel(Box::new(Recorder(sent.clone())));
        viewer.apply(ViewerIntent::Planet(PlanetMessage::Zoom { d_zoom: -0.2 }));
        assert_eq!(
            sent.lock().unwrap().as_slice(),
            &[PlanetMessage::Zoom { d_zoom: -0.2 }]
        );
    }

    #[test]
    fn delta_is_clamped_before_integration() {
        let mut viewer = test_viewer();
        let mut backend = HeadlessBackend::new();
        viewer.apply(ViewerIntent::LoadModel {
            url: "https://x/cube.glb".to_string(),
            name: "Cube".to_string(),
        });
        viewer.tick(0.016, &mut backend);
        viewer.apply(ViewerIntent::SetMotionEnabled(true));
        viewer.apply(ViewerIntent::SetMotionType(MotionType::Linear));
        viewer.apply(ViewerIntent::SetLinearVelocity(Vec3::new(1.0, 0.0, 0.0)));

        // A ten-second stall integrates as at most 50 ms.
        viewer.tick(10.0, &mut backend);
        let root = viewer.model().unwrap().root;
        let x = viewer.scene().node(root).unwrap().transform.position.x;
        assert!(x <= 0.05 + 1e-6);
    }
}
