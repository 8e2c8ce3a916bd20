use std::sync::mpsc::{channel, Receiver, Sender};

use glam::Vec3;

use crate::assets::{
    url_extension, Delivery, ImportError, ImportEvent, ImportUpdate, ImporterSet, ModelPrefab,
    PrefabNode,
};
use crate::render::OrbitCamera;
use crate::scene::geometry::{self, Aabb};
use crate::scene::materials::{Color, Material};
use crate::scene::{LineNode, LineStyle, MeshNode, NodeId, NodeKind, SceneGraph, SceneNode};
use crate::viewer::material_mode::MaterialModeController;
use crate::viewer::motion::MotionController;
use crate::viewer::StatusFeed;

/// Uniform apparent size every model is scaled to fill.
pub const FIT_TARGET_SIZE: f32 = 3.0;
const FIT_EPSILON: f32 = 1e-6;

const BOX_HELPER_COLOR: Color = Color::rgb(0.0, 1.0, 0.0);
const SPHERE_HELPER_COLOR: Color = Color::rgb(0.0, 1.0, 1.0);
const ARROW_COLOR: Color = Color::rgb(1.0, 0.0, 0.0);

/// Per-model helper visuals, created hidden on install and torn down with
/// the model.
#[derive(Debug, Clone, Copy)]
pub struct ModelHelpers {
    pub bounding_box: NodeId,
    pub bounding_sphere: NodeId,
    pub local_axes: NodeId,
    pub velocity_arrow: NodeId,
}

#[derive(Debug)]
pub struct LiveModel {
    pub name: String,
    pub root: NodeId,
    pub meshes: Vec<NodeId>,
    pub helpers: ModelHelpers,
}

struct PendingLoad {
    url: String,
    name: String,
}

/// Owns the single live-model slot and mediates load → replace → dispose.
/// Loads are asynchronous; a monotonic generation counter makes sure only
/// the most recently issued request can install its result.
pub struct ModelLifecycle {
    importers: ImporterSet,
    events: Receiver<ImportEvent>,
    events_tx: Sender<ImportEvent>,
    generation: u64,
    pending: Option<PendingLoad>,
    current: Option<LiveModel>,
}

impl ModelLifecycle {
    pub fn new(importers: ImporterSet) -> Self {
        let (events_tx, events) = channel();
        Self {
            importers,
            events,
            events_tx,
            generation: 0,
            pending: None,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&LiveModel> {
        self.current.as_ref()
    }

    pub fn model_root(&self) -> Option<NodeId> {
        self.current.as_ref().map(|model| model.root)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Kick off an asynchronous load. Unsupported extensions fail right
    /// here, before any transfer, and leave the current model (and any
    /// in-flight load) untouched.
    pub fn load(&mut self, url: &str, name: &str, status: &mut StatusFeed) {
        status.set("Loading…");
        let extension = url_extension(url);
        let Some(importer) = self.importers.importer_for(&extension).cloned() else {
            log::warn!("unsupported model format .{extension} for {url}");
            status.set(&format!("Unsupported format: .{extension}"));
            return;
        };
        if let Some(previous) = &self.pending {
            log::debug!(
                "superseding in-flight load '{}' ({})",
                previous.name,
                previous.url
            );
        }
        self.generation += 1;
        log::info!(
            "loading model '{name}' from {url} (generation {})",
            self.generation
        );
        self.pending = Some(PendingLoad {
            url: url.to_string(),
            name: name.to_string(),
        });
        importer.begin(url, Delivery::new(self.generation, self.events_tx.clone()));
    }

    /// Drain importer events. Completions from superseded requests are
    /// discarded; failures leave the current model live. Returns true when
    /// the model slot changed.
    pub fn poll(
        &mut self,
        scene: &mut SceneGraph,
        materials: &mut MaterialModeController,
        motion: &mut MotionController,
        camera: &mut OrbitCamera,
        status: &mut StatusFeed,
    ) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            if event.generation != self.generation {
                if let ImportUpdate::Done(result) = event.update {
                    log::debug!(
                        "discarding stale completion: generation {} superseded by {} (ok={})",
                        event.generation,
                        self.generation,
                        result.is_ok()
                    );
                }
                continue;
            }
            match event.update {
                ImportUpdate::Progress { loaded, total } => {
                    if total > 0 {
                        let pct = (loaded as f64 / total as f64 * 100.0).round() as u32;
                        status.set(&format!("Loading… {pct}%"));
                    }
                }
                ImportUpdate::Done(Ok(prefab)) => {
                    self.pending = None;
                    self.install(prefab, scene, materials, motion, camera, status);
                    changed = true;
                }
                ImportUpdate::Done(Err(err)) => {
                    let url = self.pending.take().map(|pending| pending.url);
                    log::warn!("model load failed ({}): {err}", url.as_deref().unwrap_or("?"));
                    status.set(&failure_status(&err));
                }
            }
        }
        changed
    }

    /// Full replacement: old bookkeeping is cleared first, then the new
    /// tree goes in, gets its original-material snapshot, shadow flags,
    /// fit-to-view transform, the current material mode, fresh hidden
    /// helpers, and a reset camera.
    fn install(
        &mut self,
        prefab: ModelPrefab,
        scene: &mut SceneGraph,
        materials: &mut MaterialModeController,
        motion: &mut MotionController,
        camera: &mut OrbitCamera,
        status: &mut StatusFeed,
    ) {
        self.dispose(scene, materials, motion);

        let ModelPrefab { name, root } = prefab;
        let root_id = insert_prefab(scene, root);
        let meshes = scene.collect_meshes(root_id);

        materials.snapshot_originals(scene, &meshes);
        for &mesh in &meshes {
            if let Some(node) = scene.node_mut(mesh) {
                if let NodeKind::Mesh(data) = &mut node.kind {
                    data.cast_shadow = true;
                    data.receive_shadow = true;
                }
            }
        }

        let bounds = fit_to_view(scene, root_id, FIT_TARGET_SIZE);
        materials.apply(scene, &meshes);
        let helpers = create_helpers(scene, root_id, &bounds);
        camera.reset();

        log::info!(
            "model '{name}' installed: {} meshes, extent {:?}",
            meshes.len(),
            bounds.size()
        );
        self.current = Some(LiveModel {
            name,
            root: root_id,
            meshes,
            helpers,
        });
        status.clear();
    }

    /// Remove the live model and everything attached to it: helper nodes,
    /// the model subtree (geometry disposed), the trajectory, and the
    /// original-material snapshot. Safe to call with nothing loaded.
    pub fn dispose(
        &mut self,
        scene: &mut SceneGraph,
        materials: &mut MaterialModeController,
        motion: &mut MotionController,
    ) {
        let Some(model) = self.current.take() else {
            return;
        };
        log::info!("disposing model '{}'", model.name);
        scene.remove_subtree(model.helpers.bounding_box);
        scene.remove_subtree(model.helpers.bounding_sphere);
        // Local axes and the velocity arrow ride the model subtree.
        scene.remove_subtree(model.root);
        motion.clear(scene);
        materials.clear_snapshot(&mut scene.materials);
    }

    /// Keep the bounding-box helper glued to the (possibly moving) model.
    pub fn refresh_bounding_box(&self, scene: &mut SceneGraph) {
        let Some(model) = &self.current else {
            return;
        };
        let visible = scene
            .node(model.helpers.bounding_box)
            .map(|node| node.visible)
            .unwrap_or(false);
        if !visible {
            return;
        }
        let Some(bounds) = scene.world_aabb(model.root) else {
            return;
        };
        if let Some(node) = scene.node_mut(model.helpers.bounding_box) {
            if let NodeKind::Line(line) = &mut node.kind {
                geometry::box_edges_into(&bounds, &mut line.points);
            }
        }
    }
}

fn failure_status(err: &ImportError) -> String {
    match err {
        ImportError::UnsupportedFormat { extension } => {
            format!("Unsupported format: .{extension}")
        }
        ImportError::Transport { .. } => "Failed to load — network or CORS".to_string(),
        ImportError::Decode { .. } => "Failed to load — malformed file".to_string(),
    }
}

fn insert_prefab(scene: &mut SceneGraph, prefab: PrefabNode) -> NodeId {
    fn insert(scene: &mut SceneGraph, parent: Option<NodeId>, prefab: PrefabNode) -> NodeId {
        let PrefabNode {
            name,
            transform,
            mesh,
            children,
        } = prefab;
        let mut node = match mesh {
            Some(mesh) => {
                let material = scene.materials.insert(Material::Pbr(mesh.material));
                SceneNode::mesh(
                    &name,
                    MeshNode {
                        geometry: mesh.geometry,
                        material,
                        cast_shadow: false,
                        receive_shadow: false,
                    },
                )
            }
            None => SceneNode::group(&name),
        };
        node.transform = transform;
        let id = match parent {
            Some(parent) => scene.insert_child(parent, node),
            None => scene.insert_root(node),
        };
        for child in children {
            insert(scene, Some(id), child);
        }
        id
    }
    insert(scene, None, prefab)
}

/// Uniform scale + recenter so the longest bounding-box dimension spans
/// `target_size` at the origin. Returns the post-fit world bounds.
fn fit_to_view(scene: &mut SceneGraph, root: NodeId, target_size: f32) -> Aabb {
    let zero = Aabb {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };
    let bounds = scene.world_aabb(root).unwrap_or(zero);
    let size = bounds.size();
    let max_dimension = size.x.max(size.y).max(size.z).max(FIT_EPSILON);
    let scale = target_size / max_dimension;
    let center = bounds.center();
    if let Some(node) = scene.node_mut(root) {
        node.transform.scale = Vec3::splat(scale);
        node.transform.position = -center * scale;
    }
    scene.world_aabb(root).unwrap_or(zero)
}

fn create_helpers(scene: &mut SceneGraph, model: NodeId, bounds: &Aabb) -> ModelHelpers {
    // World-space helpers live at the root; the local ones ride the model.
    let mut box_node = SceneNode::line(
        "BoundingBoxHelper",
        LineNode {
            points: geometry::box_edges(bounds),
            color: BOX_HELPER_COLOR,
            opacity: 1.0,
            style: LineStyle::Segments,
        },
    );
    box_node.visible = false;
    let bounding_box = scene.insert_root(box_node);

    let (center, radius) = bounds.bounding_sphere();
    let mut sphere_node = SceneNode::line(
        "BoundingSphereHelper",
        LineNode {
            points: geometry::wire_sphere(radius, 16),
            color: SPHERE_HELPER_COLOR,
            opacity: 0.3,
            style: LineStyle::Segments,
        },
    );
    sphere_node.visible = false;
    sphere_node.transform.position = center;
    let bounding_sphere = scene.insert_root(sphere_node);

    let local_axes = scene.add_axes_helper(Some(model), "LocalAxesHelper", 2.0, false);

    let mut arrow_node = SceneNode::line(
        "VelocityArrow",
        LineNode {
            points: geometry::arrow_lines(Vec3::Y, 2.0, 0.5, 0.3),
            color: ARROW_COLOR,
            opacity: 1.0,
            style: LineStyle::Segments,
        },
    );
    arrow_node.visible = false;
    let velocity_arrow = scene.insert_child(model, arrow_node);

    ModelHelpers {
        bounding_box,
        bounding_sphere,
        local_axes,
        velocity_arrow,
    }
}
