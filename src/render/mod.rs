mod camera;

pub use camera::{CameraPreset, OrbitCamera};

use std::sync::Arc;

use crate::scene::lighting::LightRig;
use crate::scene::materials::Color;
use crate::scene::SceneGraph;

/// Decoded equirectangular panorama, RGB 32-bit float, row-major.
#[derive(Debug, Clone)]
pub struct HdriTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<f32>,
}

/// Everything a backend needs to draw one frame.
pub struct Frame<'a> {
    pub scene: &'a SceneGraph,
    pub camera: &'a OrbitCamera,
    pub lights: &'a LightRig,
}

/// The GPU-facing seam. The engine never creates one of these itself; the
/// embedder supplies an implementation wrapping its rendering library.
/// Calls are infallible by contract: a backend must swallow its own
/// failures rather than take the render loop down.
pub trait RenderBackend {
    fn resize(&mut self, width: u32, height: u32);
    fn set_clear_color(&mut self, color: Color, alpha: f32);
    fn set_background(&mut self, texture: Option<Arc<HdriTexture>>);
    fn set_environment(&mut self, texture: Option<Arc<HdriTexture>>);
    fn draw(&mut self, frame: Frame<'_>);
}

/// Backend that records what it is told and draws nothing. Used by tests
/// and by embedders that run the engine without a window.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    pub viewport: (u32, u32),
    pub clear_color: Color,
    pub clear_alpha: f32,
    pub background: Option<Arc<HdriTexture>>,
    pub environment: Option<Arc<HdriTexture>>,
    pub frames_drawn: u64,
    pub last_node_count: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for HeadlessBackend {
    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn set_clear_color(&mut self, color: Color, alpha: f32) {
        self.clear_color = color;
        self.clear_alpha = alpha;
    }

    fn set_background(&mut self, texture: Option<Arc<HdriTexture>>) {
        self.background = texture;
    }

    fn set_environment(&mut self, texture: Option<Arc<HdriTexture>>) {
        self.environment = texture;
    }

    fn draw(&mut self, frame: Frame<'_>) {
        self.frames_drawn += 1;
        self.last_node_count = frame.scene.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_backend_records_state() {
        let mut backend = HeadlessBackend::new();
        backend.resize(640, 480);
        backend.set_clear_color(Color::from_hex(0x0a0e1a), 1.0);
        let scene = SceneGraph::new();
        let camera = OrbitCamera::new();
        let lights = LightRig::default();
        backend.draw(Frame {
            scene: &scene,
            camera: &camera,
            lights: &lights,
        });
        assert_eq!(backend.viewport, (640, 480));
        assert_eq!(backend.clear_color, Color::from_hex(0x0a0e1a));
        assert_eq!(backend.frames_drawn, 1);
    }
}
