use glam::Vec3;

use crate::planet::PlanetMessage;
use crate::render::CameraPreset;
use crate::scene::materials::Color;
use crate::viewer::environment::BackgroundSource;
use crate::viewer::material_mode::MaterialMode;
use crate::viewer::motion::{CircularPlane, MotionType};

/// One variant per control-panel action, consumed by exactly one
/// controller method. The panel frontend only ever talks to the engine in
/// these terms.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerIntent {
    LoadModel { url: String, name: String },

    SetMaterialMode(MaterialMode),
    SetHologramColor(Color),
    SetAberrationStrength(f32),

    ShowGrid(bool),
    ShowOriginAxes(bool),
    ShowBoundingBox(bool),
    ShowBoundingSphere(bool),
    ShowLocalAxes(bool),
    ShowVelocityArrow(bool),

    Light(LightIntent),

    SetBackgroundSource(BackgroundSource),
    SetSolidColor(Color),
    SetHdriLighting(bool),

    SetMotionEnabled(bool),
    SetMotionType(MotionType),
    SetAngularVelocity(Vec3),
    SetLinearVelocity(Vec3),
    SetCircularRadius(f32),
    SetCircularSpeed(f32),
    SetCircularPlane(CircularPlane),
    ShowTrajectory(bool),
    SetTrajectoryLength(usize),
    ClearTrajectory,

    CameraPreset(CameraPreset),
    SetFov(f32),
    SetAutoRotate(bool),
    SetAutoRotateSpeed(f32),

    SetSimulationRunning(bool),
    SetTimeScale(f32),
    ResetSimulation,

    Planet(PlanetMessage),
}

/// Per-light panel controls for the studio rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightIntent {
    AmbientIntensity(f32),

    KeyEnabled(bool),
    KeyColor(Color),
    KeyIntensity(f32),

    FillEnabled(bool),
    FillColor(Color),
    FillIntensity(f32),

    RimEnabled(bool),
    RimColor(Color),
    RimIntensity(f32),

    PointEnabled(bool),
    PointColor(Color),
    PointIntensity(f32),
    PointPosition(Vec3),

    SpotEnabled(bool),
    SpotIntensity(f32),
    SpotAngle(f32),
    SpotPenumbra(f32),
}
