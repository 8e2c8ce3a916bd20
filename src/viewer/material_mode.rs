use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scene::materials::{Color, HologramParams, Material, MaterialId, MaterialRegistry};
use crate::scene::{NodeId, NodeKind, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialMode {
    Hologram,
    Original,
    Wireframe,
    Clay,
}

pub const HOLOGRAM_COLOR: Color = Color::rgb(0.439, 0.757, 1.0); // #70c1ff
pub const CLAY_COLOR: Color = Color::rgb(0.784, 0.722, 0.604); // #c8b89a
const DEFAULT_ABERRATION: f32 = 3.0;

/// Owns the override materials and the per-model original snapshot, and
/// applies the process-wide mode onto whatever model is current.
pub struct MaterialModeController {
    mode: MaterialMode,
    hologram: MaterialId,
    wireframe: MaterialId,
    clay: MaterialId,
    originals: HashMap<NodeId, MaterialId>,
}

impl MaterialModeController {
    pub fn new(materials: &mut MaterialRegistry) -> Self {
        let hologram = materials.insert(Material::Hologram(HologramParams {
            color: HOLOGRAM_COLOR,
            aberration_strength: DEFAULT_ABERRATION,
            time: 0.0,
        }));
        let wireframe = materials.insert(Material::Wireframe {
            color: HOLOGRAM_COLOR,
        });
        let clay = materials.insert(Material::Clay {
            color: CLAY_COLOR,
            roughness: 0.85,
            metalness: 0.0,
        });
        Self {
            mode: MaterialMode::Hologram,
            hologram,
            wireframe,
            clay,
            originals: HashMap::new(),
        }
    }

    pub fn mode(&self) -> MaterialMode {
        self.mode
    }

    pub fn hologram_material(&self) -> MaterialId {
        self.hologram
    }

    /// Capture each mesh's as-loaded material. Called once per model,
    /// before any override is applied.
    pub fn snapshot_originals(&mut self, scene: &SceneGraph, meshes: &[NodeId]) {
        self.originals.clear();
        for &id in meshes {
            if let Some(NodeKind::Mesh(mesh)) = scene.node(id).map(|node| &node.kind) {
                self.originals.insert(id, mesh.material);
            }
        }
    }

    /// Drop the snapshot and release the captured materials.
    pub fn clear_snapshot(&mut self, materials: &mut MaterialRegistry) {
        for (_, material) in self.originals.drain() {
            materials.remove(material);
        }
    }

    pub fn snapshot_len(&self) -> usize {
        self.originals.len()
    }

    /// Remember `mode` globally and re-skin the current meshes, if any.
    /// With no model loaded this still records the mode, which the next
    /// installed model picks up.
    pub fn set_mode(&mut self, mode: MaterialMode, scene: &mut SceneGraph, meshes: &[NodeId]) {
        self.mode = mode;
        self.apply(scene, meshes);
    }

    pub fn apply(&self, scene: &mut SceneGraph, meshes: &[NodeId]) {
        for &id in meshes {
            let assigned = match self.mode {
                MaterialMode::Hologram => self.hologram,
                // A mesh with no snapshot entry falls back to the hologram
                // skin instead of disappearing.
                MaterialMode::Original => self.originals.get(&id).copied().unwrap_or(self.hologram),
                MaterialMode::Wireframe => self.wireframe,
                MaterialMode::Clay => self.clay,
            };
            if let Some(node) = scene.node_mut(id) {
                if let NodeKind::Mesh(mesh) = &mut node.kind {
                    mesh.material = assigned;
                }
            }
        }
    }

    pub fn set_hologram_color(&mut self, materials: &mut MaterialRegistry, color: Color) {
        if let Some(Material::Hologram(params)) = materials.get_mut(self.hologram) {
            params.color = color;
        }
    }

    pub fn set_aberration_strength(&mut self, materials: &mut MaterialRegistry, strength: f32) {
        if let Some(Material::Hologram(params)) = materials.get_mut(self.hologram) {
            params.aberration_strength = strength;
        }
    }

    pub fn hologram_params(&self, materials: &MaterialRegistry) -> HologramParams {
        match materials.get(self.hologram) {
            Some(Material::Hologram(params)) => params.clone(),
            _ => HologramParams {
                color: HOLOGRAM_COLOR,
                aberration_strength: DEFAULT_ABERRATION,
                time: 0.0,
            },
        }
    }

    /// Advance the hologram scan-line clock.
    pub fn tick(&mut self, materials: &mut MaterialRegistry, elapsed: f32) {
        if let Some(Material::Hologram(params)) = materials.get_mut(self.hologram) {
            params.time = elapsed;
        }
    }
}
