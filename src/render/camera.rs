use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPreset {
    Top,
    Front,
    Side,
    Iso,
}

const DEFAULT_POSITION: Vec3 = Vec3::new(5.0, 3.0, 5.0);
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 100.0;
// Just shy of the pole so the view basis never degenerates.
const MAX_PITCH: f32 = 1.553;

/// Target-relative orbit camera.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            position: DEFAULT_POSITION,
            target: Vec3::ZERO,
            fov_deg: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 1000.0,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
        }
    }

    /// Default framing: the isometric-ish home position looking at origin.
    pub fn reset(&mut self) {
        self.position = DEFAULT_POSITION;
        self.target = Vec3::ZERO;
    }

    pub fn apply_preset(&mut self, preset: CameraPreset) {
        self.position = match preset {
            CameraPreset::Top => Vec3::new(0.0, 15.0, 0.0),
            CameraPreset::Front => Vec3::new(0.0, 0.0, 15.0),
            CameraPreset::Side => Vec3::new(15.0, 0.0, 0.0),
            CameraPreset::Iso => DEFAULT_POSITION,
        };
        self.target = Vec3::ZERO;
    }

    pub fn set_fov(&mut self, fov_deg: f32) {
        self.fov_deg = fov_deg.clamp(1.0, 179.0);
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    /// Rotate around the target. Pitch is clamped short of the poles.
    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) {
        let offset = self.position - self.target;
        let radius = offset.length().max(MIN_DISTANCE);
        let mut yaw = offset.z.atan2(offset.x);
        let mut pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
        yaw += yaw_delta;
        pitch = (pitch + pitch_delta).clamp(-MAX_PITCH, MAX_PITCH);
        let cos_pitch = pitch.cos();
        self.position = self.target
            + Vec3::new(
                radius * cos_pitch * yaw.cos(),
                radius * pitch.sin(),
                radius * cos_pitch * yaw.sin(),
            );
    }

    /// Move along the view direction, clamped to the working distance range.
    pub fn zoom(&mut self, delta: f32) {
        let offset = self.position - self.target;
        let distance = (offset.length() + delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.position = self.target + offset.normalize_or_zero() * distance;
    }

    /// Per-frame update: advances the auto-rotation when enabled. A speed
    /// of 2.0 completes one revolution every 30 seconds.
    pub fn update(&mut self, delta: f32) {
        if self.auto_rotate {
            let angle = std::f32::consts::TAU / 60.0 * self.auto_rotate_speed * delta;
            self.orbit(angle, 0.0);
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}
