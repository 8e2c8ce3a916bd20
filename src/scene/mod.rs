pub mod geometry;
pub mod lighting;
pub mod materials;

pub use geometry::{Aabb, Geometry};
pub use materials::{Color, MaterialId};

use std::collections::HashMap;

use glam::{EulerRot, Mat4, Quat, Vec3};

use materials::MaterialRegistry;

/// Stable per-node identity, assigned at insertion and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied in XYZ order.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Independent segments: every point pair is one line.
    Segments,
    /// Connected strip through all points.
    Strip,
}

#[derive(Debug)]
pub struct MeshNode {
    pub geometry: Geometry,
    pub material: MaterialId,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

#[derive(Debug)]
pub struct LineNode {
    pub points: Vec<Vec3>,
    pub color: Color,
    pub opacity: f32,
    pub style: LineStyle,
}

#[derive(Debug)]
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
    Line(LineNode),
}

#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub kind: NodeKind,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl SceneNode {
    fn with_kind(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::identity(),
            visible: true,
            kind,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn group(name: &str) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mesh(name: &str, mesh: MeshNode) -> Self {
        Self::with_kind(name, NodeKind::Mesh(mesh))
    }

    pub fn line(name: &str, line: LineNode) -> Self {
        Self::with_kind(name, NodeKind::Line(line))
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// The CPU-side scene graph every controller acts on. Nodes are addressed
/// by [`NodeId`]; the material table rides along so importers and
/// controllers share one registry.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
    next_id: u64,
    pub materials: MaterialRegistry,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert_root(&mut self, node: SceneNode) -> NodeId {
        let id = self.allocate();
        self.nodes.insert(id, node);
        self.roots.push(id);
        id
    }

    pub fn insert_child(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        if !self.nodes.contains_key(&parent) {
            log::warn!("insert_child: parent {parent:?} missing, attaching at root");
            return self.insert_root(node);
        }
        let id = self.allocate();
        node.parent = Some(parent);
        self.nodes.insert(id, node);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        id
    }

    /// Detach `id` and drop it with all descendants, disposing any mesh
    /// geometry on the way out. Returns how many nodes were removed; zero
    /// when the id is already gone.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        let Some(parent) = self.nodes.get(&id).map(|node| node.parent) else {
            return 0;
        };
        match parent {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
        let mut stack = vec![id];
        let mut removed = 0;
        while let Some(current) = stack.pop() {
            if let Some(mut node) = self.nodes.remove(&current) {
                stack.append(&mut node.children);
                if let NodeKind::Mesh(mesh) = &mut node.kind {
                    mesh.geometry.dispose();
                }
                removed += 1;
            }
        }
        removed
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }

    /// Mesh nodes of the subtree under `id`, depth first.
    pub fn collect_meshes(&self, id: NodeId) -> Vec<NodeId> {
        let mut meshes = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                if matches!(node.kind, NodeKind::Mesh(_)) {
                    meshes.push(current);
                }
                stack.extend(node.children.iter().copied());
            }
        }
        meshes
    }

    /// World-space bounds of the subtree under `id`, or `None` when no
    /// visible node in it carries points. Hidden subtrees contribute
    /// nothing, so the helpers riding a model don't widen its bounds.
    pub fn world_aabb(&self, id: NodeId) -> Option<Aabb> {
        self.aabb_recursive(id, Mat4::IDENTITY)
    }

    fn aabb_recursive(&self, id: NodeId, parent_matrix: Mat4) -> Option<Aabb> {
        let node = self.nodes.get(&id)?;
        if !node.visible {
            return None;
        }
        let matrix = parent_matrix * node.transform.matrix();
        let mut bounds = match &node.kind {
            NodeKind::Mesh(mesh) => mesh.geometry.aabb().map(|b| b.transformed(&matrix)),
            NodeKind::Line(line) => {
                Aabb::from_points(line.points.iter().copied()).map(|b| b.transformed(&matrix))
            }
            NodeKind::Group => None,
        };
        for child in node.children.iter().copied() {
            if let Some(child_bounds) = self.aabb_recursive(child, matrix) {
                bounds = Some(match bounds {
                    Some(current) => current.union(child_bounds),
                    None => child_bounds,
                });
            }
        }
        bounds
    }

    /// Red/green/blue axis lines of the given length, grouped under one
    /// node so a single visibility flag controls them.
    pub fn add_axes_helper(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        length: f32,
        visible: bool,
    ) -> NodeId {
        let mut group = SceneNode::group(name);
        group.visible = visible;
        let group_id = match parent {
            Some(parent) => self.insert_child(parent, group),
            None => self.insert_root(group),
        };
        let axes = [
            (Vec3::X, Color::rgb(1.0, 0.0, 0.0), "AxisX"),
            (Vec3::Y, Color::rgb(0.0, 1.0, 0.0), "AxisY"),
            (Vec3::Z, Color::rgb(0.0, 0.0, 1.0), "AxisZ"),
        ];
        for (direction, color, axis_name) in axes {
            self.insert_child(
                group_id,
                SceneNode::line(
                    axis_name,
                    LineNode {
                        points: vec![Vec3::ZERO, direction * length],
                        color,
                        opacity: 1.0,
                        style: LineStyle::Segments,
                    },
                ),
            );
        }
        group_id
    }

    /// Ground grid in the xz plane with brighter center lines.
    pub fn add_grid_helper(&mut self, size: f32, divisions: u32, visible: bool) -> NodeId {
        let mut group = SceneNode::group("Grid");
        group.visible = visible;
        let group_id = self.insert_root(group);
        let (center, rest) = geometry::grid_lines(size, divisions);
        self.insert_child(
            group_id,
            SceneNode::line(
                "GridCenter",
                LineNode {
                    points: center,
                    color: Color::from_hex(0x444444),
                    opacity: 1.0,
                    style: LineStyle::Segments,
                },
            ),
        );
        self.insert_child(
            group_id,
            SceneNode::line(
                "GridLines",
                LineNode {
                    points: rest,
                    color: Color::from_hex(0x222222),
                    opacity: 1.0,
                    style: LineStyle::Segments,
                },
            ),
        );
        group_id
    }
}

#[cfg(test)]
mod tests {
    use super::materials::{Material, PbrParams};
    use super::*;

    fn unit_mesh(graph: &mut SceneGraph, name: &str) -> SceneNode {
        let material = graph.materials.insert(Material::Pbr(PbrParams::default()));
        SceneNode::mesh(
            name,
            MeshNode {
                geometry: Geometry::from_positions(vec![Vec3::splat(-0.5), Vec3::splat(0.5)]),
                material,
                cast_shadow: false,
                receive_shadow: false,
            },
        )
    }

    #[test]
    fn remove_subtree_detaches_and_disposes() {
        let mut graph = SceneGraph::new();
        let root = graph.insert_root(SceneNode::group("Root"));
        let mesh_node = unit_mesh(&mut graph, "Mesh");
        let child = graph.insert_child(root, mesh_node);
        let grandchild = graph.insert_child(child, SceneNode::group("Inner"));

        assert_eq!(graph.remove_subtree(child), 2);
        assert!(graph.contains(root));
        assert!(!graph.contains(child));
        assert!(!graph.contains(grandchild));
        assert!(graph.node(root).unwrap().children().is_empty());
        assert_eq!(graph.remove_subtree(child), 0);
    }

    #[test]
    fn world_aabb_applies_nested_transforms() {
        let mut graph = SceneGraph::new();
        let root = graph.insert_root(SceneNode::group("Root"));
        let mesh_node = unit_mesh(&mut graph, "Mesh");
        let child = graph.insert_child(root, mesh_node);

        graph.node_mut(root).unwrap().transform.scale = Vec3::splat(2.0);
        graph.node_mut(child).unwrap().transform.position = Vec3::new(1.0, 0.0, 0.0);

        let bounds = graph.world_aabb(root).unwrap();
        assert!((bounds.min.x - 1.0).abs() < 1e-5);
        assert!((bounds.max.x - 3.0).abs() < 1e-5);
        assert!((bounds.min.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn world_aabb_ignores_hidden_subtrees() {
        let mut graph = SceneGraph::new();
        let root = graph.insert_root(SceneNode::group("Root"));
        let mesh_node = unit_mesh(&mut graph, "Mesh");
        graph.insert_child(root, mesh_node);
        let mut far_line = SceneNode::line(
            "Helper",
            LineNode {
                points: vec![Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)],
                color: Color::WHITE,
                opacity: 1.0,
                style: LineStyle::Segments,
            },
        );
        far_line.visible = false;
        graph.insert_child(root, far_line);

        let bounds = graph.world_aabb(root).unwrap();
        assert!((bounds.max.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn collect_meshes_skips_groups_and_lines() {
        let mut graph = SceneGraph::new();
        let root = graph.insert_root(SceneNode::group("Root"));
        let mesh_node = unit_mesh(&mut graph, "Mesh");
        let mesh = graph.insert_child(root, mesh_node);
        graph.insert_child(
            root,
            SceneNode::line(
                "Line",
                LineNode {
                    points: vec![Vec3::ZERO, Vec3::ONE],
                    color: Color::WHITE,
                    opacity: 1.0,
                    style: LineStyle::Strip,
                },
            ),
        );
        assert_eq!(graph.collect_meshes(root), vec![mesh]);
    }

    #[test]
    fn axes_helper_builds_three_children() {
        let mut graph = SceneGraph::new();
        let axes = graph.add_axes_helper(None, "OriginAxes", 5.0, true);
        assert_eq!(graph.node(axes).unwrap().children().len(), 3);
    }
}
