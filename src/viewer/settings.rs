use std::path::Path;

use serde::Serialize;

use crate::scene::materials::Color;
use crate::viewer::environment::BackgroundSource;
use crate::viewer::material_mode::MaterialMode;
use crate::viewer::motion::{CircularPlane, MotionType};

pub const APP_NAME: &str = "Orbview Model Viewer";
pub const SETTINGS_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Point-in-time dump of everything the control panel can touch.
/// Export-only; nothing in the application reads it back.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub meta: MetaSection,
    pub model: ModelSection,
    pub visualization: VisualizationSection,
    pub lighting: LightingSection,
    pub background: BackgroundSection,
    pub motion: MotionSection,
    pub camera: CameraSection,
    pub simulation: SimulationSection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSection {
    pub app: String,
    pub version: String,
    /// Unix seconds at export time.
    pub exported_at: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSection {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationSection {
    pub material_mode: MaterialMode,
    pub holo_color: Color,
    pub aberration: f32,
    pub grid: bool,
    pub origin_axes: bool,
    pub bounding_box: bool,
    pub local_axes: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightExport {
    pub on: bool,
    pub color: Color,
    pub intensity: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointLightExport {
    pub on: bool,
    pub color: Color,
    pub intensity: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotLightExport {
    pub on: bool,
    pub intensity: f32,
    pub angle: f32,
    pub penumbra: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightingSection {
    pub ambient_intensity: f32,
    pub key: LightExport,
    pub fill: LightExport,
    pub rim: LightExport,
    pub point: PointLightExport,
    pub spot: SpotLightExport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSection {
    pub source: BackgroundSource,
    pub solid_color: Color,
    pub hdri_lighting: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSection {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub motion_type: MotionType,
    pub wx: f32,
    pub wy: f32,
    pub wz: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub circular_radius: f32,
    pub circular_speed: f32,
    pub circular_axis: CircularPlane,
    pub show_trajectory: bool,
    pub trajectory_length: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSection {
    pub fov: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSection {
    pub running: bool,
    pub time_scale: f32,
    pub current_time: f32,
}

impl SettingsSnapshot {
    pub fn to_json_pretty(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}
