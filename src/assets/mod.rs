use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::scene::materials::PbrParams;
use crate::scene::{Geometry, Transform};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unsupported format: .{extension}")]
    UnsupportedFormat { extension: String },
    #[error("transfer failed for {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// A parsed model, detached from any scene. The lifecycle manager inserts
/// it into the graph and assigns node and material identities.
#[derive(Debug)]
pub struct ModelPrefab {
    pub name: String,
    pub root: PrefabNode,
}

#[derive(Debug, Default)]
pub struct PrefabNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<PrefabMesh>,
    pub children: Vec<PrefabNode>,
}

#[derive(Debug)]
pub struct PrefabMesh {
    pub geometry: Geometry,
    pub material: PbrParams,
}

#[derive(Debug)]
pub enum ImportUpdate {
    Progress { loaded: u64, total: u64 },
    Done(Result<ModelPrefab, ImportError>),
}

#[derive(Debug)]
pub struct ImportEvent {
    pub generation: u64,
    pub update: ImportUpdate,
}

/// Completion handle for one load request. Progress may be reported any
/// number of times; `finish` consumes the handle, so every request
/// completes exactly once and only after its progress reports.
pub struct Delivery {
    generation: u64,
    events: Sender<ImportEvent>,
}

impl Delivery {
    pub(crate) fn new(generation: u64, events: Sender<ImportEvent>) -> Self {
        Self { generation, events }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn progress(&self, loaded: u64, total: u64) {
        // The receiver may be gone during teardown; dropped events are fine.
        let _ = self.events.send(ImportEvent {
            generation: self.generation,
            update: ImportUpdate::Progress { loaded, total },
        });
    }

    pub fn finish(self, result: Result<ModelPrefab, ImportError>) {
        let _ = self.events.send(ImportEvent {
            generation: self.generation,
            update: ImportUpdate::Done(result),
        });
    }
}

/// Format-specific model source. Implementations download and parse off
/// the caller's thread and report through the [`Delivery`].
pub trait AssetImporter: Send + Sync {
    fn begin(&self, url: &str, delivery: Delivery);
}

/// Extension-keyed importer registry.
#[derive(Default)]
pub struct ImporterSet {
    by_extension: HashMap<String, Arc<dyn AssetImporter>>,
}

impl ImporterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extensions: &[&str], importer: Arc<dyn AssetImporter>) {
        for extension in extensions {
            self.by_extension
                .insert(extension.to_ascii_lowercase(), importer.clone());
        }
    }

    /// Lookup by already-lowercased extension.
    pub fn importer_for(&self, extension: &str) -> Option<&Arc<dyn AssetImporter>> {
        self.by_extension.get(extension)
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.by_extension.contains_key(extension)
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

/// File extension of a model URL: query string stripped first, then the
/// text after the last dot, lowercased. A URL without a dot yields its
/// whole tail, which no importer will claim.
pub fn url_extension(url: &str) -> String {
    let base = url.split('?').next().unwrap_or(url);
    let tail = base.rsplit('.').next().unwrap_or(base);
    tail.to_ascii_lowercase()
}
