use std::collections::VecDeque;
use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::materials::Color;
use crate::scene::{LineNode, LineStyle, NodeId, NodeKind, SceneGraph, SceneNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionType {
    None,
    Rotation,
    Linear,
    Circular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircularPlane {
    Xz,
    Xy,
    Yz,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    pub enabled: bool,
    pub motion_type: MotionType,
    /// rad/s per axis, rotation mode.
    pub angular_velocity: Vec3,
    /// units/s per axis, linear mode.
    pub linear_velocity: Vec3,
    pub circular_radius: f32,
    /// Revolutions per second.
    pub circular_speed: f32,
    pub circular_plane: CircularPlane,
    pub show_trajectory: bool,
    pub trajectory_length: usize,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            enabled: false,
            motion_type: MotionType::None,
            angular_velocity: Vec3::new(0.0, 0.5, 0.0),
            linear_velocity: Vec3::ZERO,
            circular_radius: 3.0,
            circular_speed: 1.0,
            circular_plane: CircularPlane::Xz,
            show_trajectory: false,
            trajectory_length: 300,
        }
    }
}

const TRAIL_COLOR: Color = Color::rgb(0.0, 1.0, 0.533); // #00ff88
const TRAIL_OPACITY: f32 = 0.7;

/// Advances the current model's transform every frame and maintains the
/// bounded trajectory trail.
pub struct MotionController {
    pub state: MotionState,
    trail: VecDeque<Vec3>,
    line: Option<NodeId>,
}

impl MotionController {
    pub fn new() -> Self {
        Self {
            state: MotionState::default(),
            trail: VecDeque::new(),
            line: None,
        }
    }

    pub fn trail(&self) -> &VecDeque<Vec3> {
        &self.trail
    }

    pub fn line_node(&self) -> Option<NodeId> {
        self.line
    }

    /// Per-frame update. Rotation and linear motion integrate `delta`
    /// (explicit Euler); circular motion is computed from absolute
    /// `elapsed` time so it stays exactly periodic. A no-op without a
    /// model.
    pub fn tick(&mut self, scene: &mut SceneGraph, model: Option<NodeId>, elapsed: f32, delta: f32) {
        let Some(model) = model else {
            return;
        };

        if self.state.enabled && self.state.motion_type != MotionType::None {
            if let Some(node) = scene.node_mut(model) {
                match self.state.motion_type {
                    MotionType::Rotation => {
                        node.transform.rotation += self.state.angular_velocity * delta;
                    }
                    MotionType::Linear => {
                        node.transform.position += self.state.linear_velocity * delta;
                    }
                    MotionType::Circular => {
                        let angle = elapsed * self.state.circular_speed * TAU;
                        let radius = self.state.circular_radius;
                        let position = &mut node.transform.position;
                        match self.state.circular_plane {
                            CircularPlane::Xz => {
                                position.x = angle.cos() * radius;
                                position.z = angle.sin() * radius;
                            }
                            CircularPlane::Xy => {
                                position.x = angle.cos() * radius;
                                position.y = angle.sin() * radius;
                            }
                            CircularPlane::Yz => {
                                position.y = angle.cos() * radius;
                                position.z = angle.sin() * radius;
                            }
                        }
                    }
                    MotionType::None => {}
                }
            }
        }

        if self.state.show_trajectory {
            let Some(position) = scene.node(model).map(|node| node.transform.position) else {
                return;
            };
            self.trail.push_back(position);
            while self.trail.len() > self.state.trajectory_length {
                self.trail.pop_front();
            }

            if self.trail.len() > 1 {
                match self.line {
                    None => {
                        let node = SceneNode::line(
                            "Trajectory",
                            LineNode {
                                points: self.trail.iter().copied().collect(),
                                color: TRAIL_COLOR,
                                opacity: TRAIL_OPACITY,
                                style: LineStyle::Strip,
                            },
                        );
                        self.line = Some(scene.insert_root(node));
                    }
                    Some(line) => {
                        if let Some(node) = scene.node_mut(line) {
                            if let NodeKind::Line(data) = &mut node.kind {
                                // Reuses the point buffer's allocation.
                                data.points.clear();
                                data.points.extend(self.trail.iter().copied());
                            }
                        }
                    }
                }
            }
        } else if let Some(line) = self.line.take() {
            scene.remove_subtree(line);
        }
    }

    /// Drop the recorded positions and the rendered line.
    pub fn clear(&mut self, scene: &mut SceneGraph) {
        self.trail.clear();
        if let Some(line) = self.line.take() {
            scene.remove_subtree(line);
        }
    }
}

impl Default for MotionController {
    fn default() -> Self {
        Self::new()
    }
}
