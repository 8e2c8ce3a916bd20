use std::io::Read;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::planet::PlanetLink;
use crate::render::{HdriTexture, RenderBackend};
use crate::scene::materials::Color;
use crate::viewer::StatusFeed;

/// What fills the background. Fully independent of the lighting source;
/// every combination of the two axes is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackgroundSource {
    Solid,
    Hdri,
    ImageLayer,
    ProceduralPanel,
}

/// What drives image-based lighting and reflections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LightingSource {
    None,
    Hdri,
}

pub const DEFAULT_SOLID_COLOR: Color = Color::rgb(0.039, 0.055, 0.102); // #0a0e1a
pub const HDRI_URL: &str =
    "https://dl.polyhaven.org/file/ph-assets/HDRIs/hdr/2k/golden_gate_hills_2k.hdr";

#[derive(Debug, thiserror::Error)]
pub enum HdriError {
    #[error("transfer failed: {0}")]
    Transport(String),
    #[error("failed to decode HDR image: {0}")]
    Decode(String),
}

/// Starts one HDRI fetch and reports the outcome on `results`.
pub trait HdriSource: Send {
    fn begin(&self, url: &str, results: Sender<Result<HdriTexture, HdriError>>);
}

/// Fetches and decodes the panorama on a detached worker thread.
pub struct HttpHdriSource;

impl HdriSource for HttpHdriSource {
    fn begin(&self, url: &str, results: Sender<Result<HdriTexture, HdriError>>) {
        let url = url.to_string();
        thread::spawn(move || {
            let _ = results.send(fetch_hdri(&url));
        });
    }
}

/// Blocking download + Radiance decode.
pub fn fetch_hdri(url: &str) -> Result<HdriTexture, HdriError> {
    let response = ureq::get(url)
        .call()
        .map_err(|err| HdriError::Transport(err.to_string()))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|err| HdriError::Transport(err.to_string()))?;
    let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Hdr)
        .map_err(|err| HdriError::Decode(err.to_string()))?;
    let rgb = decoded.into_rgb32f();
    Ok(HdriTexture {
        width: rgb.width(),
        height: rgb.height(),
        pixels: rgb.into_raw(),
    })
}

#[derive(Debug)]
enum HdriSlot {
    Idle,
    Loading,
    Ready(Arc<HdriTexture>),
    Failed,
}

/// Reconciles background and lighting state onto the backend. The two
/// axes are stored independently and only meet inside [`apply`].
///
/// [`apply`]: EnvironmentController::apply
pub struct EnvironmentController {
    background: BackgroundSource,
    lighting: LightingSource,
    solid_color: Color,
    hdri: HdriSlot,
    results: Receiver<Result<HdriTexture, HdriError>>,
    results_tx: Sender<Result<HdriTexture, HdriError>>,
    source: Box<dyn HdriSource>,
    image_layer_opacity: f32,
    panel_visible: bool,
    planet: PlanetLink,
}

impl EnvironmentController {
    pub fn new(source: Box<dyn HdriSource>) -> Self {
        let (results_tx, results) = channel();
        Self {
            background: BackgroundSource::Solid,
            lighting: LightingSource::None,
            solid_color: DEFAULT_SOLID_COLOR,
            hdri: HdriSlot::Idle,
            results,
            results_tx,
            source,
            image_layer_opacity: 0.0,
            panel_visible: false,
            planet: PlanetLink::new(),
        }
    }

    pub fn background(&self) -> BackgroundSource {
        self.background
    }

    pub fn lighting(&self) -> LightingSource {
        self.lighting
    }

    pub fn solid_color(&self) -> Color {
        self.solid_color
    }

    pub fn image_layer_opacity(&self) -> f32 {
        self.image_layer_opacity
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    pub fn hdri_ready(&self) -> bool {
        matches!(self.hdri, HdriSlot::Ready(_))
    }

    pub fn hdri_texture(&self) -> Option<Arc<HdriTexture>> {
        match &self.hdri {
            HdriSlot::Ready(texture) => Some(texture.clone()),
            _ => None,
        }
    }

    pub fn planet_mut(&mut self) -> &mut PlanetLink {
        &mut self.planet
    }

    pub fn set_background_source(&mut self, source: BackgroundSource, status: &mut StatusFeed) {
        self.background = source;
        if source == BackgroundSource::Hdri {
            self.ensure_hdri(status);
        }
    }

    pub fn set_lighting_source(&mut self, lighting: LightingSource, status: &mut StatusFeed) {
        self.lighting = lighting;
        if lighting == LightingSource::Hdri {
            self.ensure_hdri(status);
        }
    }

    pub fn set_solid_color(&mut self, color: Color) {
        self.solid_color = color;
    }

    /// Lazy and memoized: the first caller starts the fetch, everyone else
    /// shares the one in flight. A failed fetch is retried by the next
    /// request.
    pub fn ensure_hdri(&mut self, status: &mut StatusFeed) {
        if matches!(self.hdri, HdriSlot::Idle | HdriSlot::Failed) {
            status.set("Loading HDRI…");
            log::info!("fetching HDRI from {HDRI_URL}");
            self.source.begin(HDRI_URL, self.results_tx.clone());
            self.hdri = HdriSlot::Loading;
        }
    }

    /// Drain fetch outcomes. Returns true when the HDRI slot changed.
    pub fn poll(&mut self, status: &mut StatusFeed) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.results.try_recv() {
            match outcome {
                Ok(texture) => {
                    log::info!("HDRI ready ({}x{})", texture.width, texture.height);
                    self.hdri = HdriSlot::Ready(Arc::new(texture));
                    status.clear();
                }
                Err(err) => {
                    log::warn!("HDRI failed: {err}");
                    self.hdri = HdriSlot::Failed;
                    status.set("HDRI unavailable");
                }
            }
            changed = true;
        }
        changed
    }

    /// The single reconciliation entry point; idempotent. Decides the
    /// environment map purely from the lighting axis, resets every
    /// background producer, then switches exactly one on, falling back
    /// to the solid color when the selected source's asset is missing.
    pub fn apply(&mut self, backend: &mut dyn RenderBackend) {
        let hdri = self.hdri_texture();

        backend.set_environment(match self.lighting {
            LightingSource::Hdri => hdri.clone(),
            LightingSource::None => None,
        });

        self.image_layer_opacity = 0.0;
        self.panel_visible = false;
        backend.set_background(None);

        match self.background {
            BackgroundSource::Solid => {
                backend.set_clear_color(self.solid_color, 1.0);
                self.planet.pause();
            }
            BackgroundSource::Hdri => {
                match hdri {
                    Some(texture) => {
                        backend.set_background(Some(texture));
                        backend.set_clear_color(Color::BLACK, 0.0);
                    }
                    None => backend.set_clear_color(self.solid_color, 1.0),
                }
                self.planet.pause();
            }
            BackgroundSource::ImageLayer => {
                backend.set_clear_color(Color::BLACK, 0.0);
                self.image_layer_opacity = 1.0;
                self.planet.pause();
            }
            BackgroundSource::ProceduralPanel => {
                backend.set_clear_color(Color::BLACK, 0.0);
                self.planet.ensure_started();
                self.planet.resume();
                self.panel_visible = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::planet::{PlanetChannel, PlanetMessage};
    use crate::render::HeadlessBackend;

    use super::*;

    struct SharedSource(Arc<SourceState>);

    #[derive(Default)]
    struct SourceState {
        begins: AtomicUsize,
        senders: Mutex<Vec<Sender<Result<HdriTexture, HdriError>>>>,
    }

    impl HdriSource for SharedSource {
        fn begin(&self, _url: &str, results: Sender<Result<HdriTexture, HdriError>>) {
            self.0.begins.fetch_add(1, Ordering::SeqCst);
            self.0.senders.lock().unwrap().push(results);
        }
    }

    fn manual_controller() -> (EnvironmentController, Arc<SourceState>) {
        let state = Arc::new(SourceState::default());
        let controller = EnvironmentController::new(Box::new(SharedSource(state.clone())));
        (controller, state)
    }

    fn tiny_texture() -> HdriTexture {
        HdriTexture {
            width: 1,
            height: 1,
            pixels: vec![0.5, 0.5, 0.5],
        }
    }

    fn resolve(state: &SourceState, outcome: Result<HdriTexture, HdriError>) {
        let senders = state.senders.lock().unwrap();
        senders[0].send(outcome).unwrap();
    }

    #[test]
    fn concurrent_hdri_requests_share_one_load() {
        let (mut env, state) = manual_controller();
        let mut status = StatusFeed::new();
        env.set_lighting_source(LightingSource::Hdri, &mut status);
        env.set_background_source(BackgroundSource::Hdri, &mut status);
        assert_eq!(state.begins.load(Ordering::SeqCst), 1);

        resolve(&state, Ok(tiny_texture()));
        assert!(env.poll(&mut status));
        assert!(env.hdri_ready());

        // One resolution satisfies both requesters.
        let mut backend = HeadlessBackend::new();
        env.apply(&mut backend);
        assert!(backend.environment.is_some());
        assert!(backend.background.is_some());
    }

    #[test]
    fn lighting_and_background_axes_are_independent() {
        let (mut env, state) = manual_controller();
        let mut status = StatusFeed::new();
        env.set_lighting_source(LightingSource::Hdri, &mut status);
        resolve(&state, Ok(tiny_texture()));
        env.poll(&mut status);

        let mut backend = HeadlessBackend::new();
        env.set_background_source(BackgroundSource::Solid, &mut status);
        env.apply(&mut backend);

        // Reflections on, solid clear color still visible.
        assert!(backend.environment.is_some());
        assert!(backend.background.is_none());
        assert_eq!(backend.clear_color, DEFAULT_SOLID_COLOR);
        assert_eq!(backend.clear_alpha, 1.0);
    }

    #[test]
    fn every_combination_applies_cleanly() {
        let (mut env, state) = manual_controller();
        let mut status = StatusFeed::new();
        let mut backend = HeadlessBackend::new();
        env.set_lighting_source(LightingSource::Hdri, &mut status);
        resolve(&state, Ok(tiny_texture()));
        env.poll(&mut status);

        for lighting in [LightingSource::None, LightingSource::Hdri] {
            for background in [
                BackgroundSource::Solid,
                BackgroundSource::Hdri,
                BackgroundSource::ImageLayer,
                BackgroundSource::ProceduralPanel,
            ] {
                env.set_lighting_source(lighting, &mut status);
                env.set_background_source(background, &mut status);
                env.apply(&mut backend);
                assert_eq!(backend.environment.is_some(), lighting == LightingSource::Hdri);
                assert_eq!(
                    backend.background.is_some(),
                    background == BackgroundSource::Hdri
                );
                assert_eq!(
                    env.image_layer_opacity(),
                    if background == BackgroundSource::ImageLayer {
                        1.0
                    } else {
                        0.0
                    }
                );
            }
        }
    }

    #[test]
    fn switching_away_from_the_image_layer_hides_it() {
        let (mut env, _state) = manual_controller();
        let mut status = StatusFeed::new();
        let mut backend = HeadlessBackend::new();
        env.set_background_source(BackgroundSource::ImageLayer, &mut status);
        env.apply(&mut backend);
        assert_eq!(env.image_layer_opacity(), 1.0);

        env.set_background_source(BackgroundSource::Solid, &mut status);
        env.apply(&mut backend);
        assert_eq!(env.image_layer_opacity(), 0.0);
        assert_eq!(backend.clear_color, DEFAULT_SOLID_COLOR);
    }

    #[test]
    fn failed_hdri_falls_back_to_solid() {
        let (mut env, state) = manual_controller();
        let mut status = StatusFeed::new();
        env.set_background_source(BackgroundSource::Hdri, &mut status);
        resolve(&state, Err(HdriError::Transport("timeout".to_string())));
        env.poll(&mut status);
        assert_eq!(status.current(), "HDRI unavailable");

        let mut backend = HeadlessBackend::new();
        env.apply(&mut backend);
        assert!(backend.background.is_none());
        assert_eq!(backend.clear_color, DEFAULT_SOLID_COLOR);
    }

    struct Recorder(Arc<Mutex<Vec<PlanetMessage>>>);

    impl PlanetChannel for Recorder {
        fn send(&mut self, message: &PlanetMessage) {
            self.0.lock().unwrap().push(message.clone());
        }
    }

    #[test]
    fn panel_background_starts_and_pauses_the_sub_scene() {
        let (mut env, _state) = manual_controller();
        let mut status = StatusFeed::new();
        let mut backend = HeadlessBackend::new();
        let sent = Arc::new(Mutex::new(Vec::new()));
        env.planet_mut().attach(Box::new(Recorder(sent.clone())));

        env.set_background_source(BackgroundSource::ProceduralPanel, &mut status);
        env.apply(&mut backend);
        assert!(env.panel_visible());
        assert_eq!(
            sent.lock().unwrap().last(),
            Some(&PlanetMessage::SetPaused(false))
        );

        env.set_background_source(BackgroundSource::Solid, &mut status);
        env.apply(&mut backend);
        assert!(!env.panel_visible());
        assert_eq!(
            sent.lock().unwrap().last(),
            Some(&PlanetMessage::SetPaused(true))
        );
    }
}
