//! Orbview: model lifecycle and visual-state engine for a NASA 3D model
//! viewer.
//!
//! The crate owns the coordination problem of a single-model viewer: one
//! live model replaced across an unbounded sequence of asynchronous loads,
//! with material, environment, motion, lighting, and camera state kept
//! consistent with whatever is currently on screen. Three seams stay with
//! the embedder:
//!
//! - [`assets::AssetImporter`]: format parsers producing a scene-graph
//!   prefab from a URL
//! - [`render::RenderBackend`]: the GPU library wrapping draw, clear
//!   color, background, and environment map
//! - [`viewer::ViewerIntent`]: the typed command surface a control panel
//!   feeds into [`viewer::Viewer::apply`]
//!
//! The host render loop calls [`viewer::Viewer::tick`] once per display
//! refresh; everything asynchronous (model imports, the HDRI fetch)
//! reports back through channels drained at the top of that tick.

pub mod assets;
pub mod catalog;
pub mod planet;
pub mod render;
pub mod scene;
pub mod viewer;

pub use viewer::{Viewer, ViewerIntent};
