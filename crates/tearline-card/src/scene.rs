//! Per-mount scene instance
//!
//! Each mounted card owns a private copy of the imported node hierarchy and
//! mesh data; clip playback and morph deformation mutate only this copy.

use glam::{Mat4, Quat, Vec3};
use tearline_animation::NodeProperty;
use tearline_import::{ImportResult, MeshBounds};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl NodeTransform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub rest: NodeTransform,
    pub local: NodeTransform,
}

/// One drawable mesh primitive with its morph state
#[derive(Debug, Clone, Default)]
pub struct CardMesh {
    pub name: String,
    pub node: Option<usize>,
    pub base_positions: Vec<[f32; 3]>,
    pub base_normals: Vec<[f32; 3]>,
    /// Deformed by the current morph weights
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    morph_positions: Vec<Vec<[f32; 3]>>,
    morph_normals: Vec<Vec<[f32; 3]>>,
    pub morph_weights: Vec<f32>,
    /// Bumped whenever vertex data changes and must be re-uploaded
    pub vertex_version: u64,
}

impl CardMesh {
    /// A static mesh with no node and no morph targets
    pub fn new(
        name: impl Into<String>,
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        uvs: Vec<[f32; 2]>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            base_positions: positions.clone(),
            base_normals: normals.clone(),
            positions,
            normals,
            uvs,
            indices,
            ..Default::default()
        }
    }

    pub fn bounds(&self) -> Option<MeshBounds> {
        MeshBounds::from_positions(&self.base_positions)
    }

    /// Set morph weights and rebuild deformed vertices if they changed
    pub fn set_morph_weights(&mut self, weights: &[f32]) {
        let mut changed = false;
        for (i, w) in weights.iter().enumerate().take(self.morph_weights.len()) {
            if (self.morph_weights[i] - w).abs() > f32::EPSILON {
                self.morph_weights[i] = *w;
                changed = true;
            }
        }
        if changed {
            self.deform();
        }
    }

    fn deform(&mut self) {
        self.positions.clone_from(&self.base_positions);
        self.normals.clone_from(&self.base_normals);

        for (t, &w) in self.morph_weights.iter().enumerate() {
            if w == 0.0 {
                continue;
            }
            if let Some(deltas) = self.morph_positions.get(t) {
                for (p, d) in self.positions.iter_mut().zip(deltas) {
                    p[0] += d[0] * w;
                    p[1] += d[1] * w;
                    p[2] += d[2] * w;
                }
            }
            if let Some(deltas) = self.morph_normals.get(t) {
                for (n, d) in self.normals.iter_mut().zip(deltas) {
                    n[0] += d[0] * w;
                    n[1] += d[1] * w;
                    n[2] += d[2] * w;
                }
            }
        }

        for n in self.normals.iter_mut() {
            let v = Vec3::from_array(*n).normalize_or_zero();
            *n = v.to_array();
        }
        self.vertex_version += 1;
    }
}

/// A private, mutable instance of an imported model
#[derive(Debug, Clone)]
pub struct CardScene {
    pub nodes: Vec<SceneNode>,
    pub meshes: Vec<CardMesh>,
    pub roots: Vec<usize>,
}

impl CardScene {
    /// Deep-copy the imported model into a fresh instance
    pub fn instantiate(import: &ImportResult) -> Self {
        let parents = import.parents();
        let nodes = import
            .nodes
            .iter()
            .zip(parents)
            .map(|(n, parent)| {
                let rest = NodeTransform {
                    translation: Vec3::from_array(n.translation),
                    rotation: Quat::from_array(n.rotation),
                    scale: Vec3::from_array(n.scale),
                };
                SceneNode {
                    name: n.name.clone(),
                    parent,
                    children: n.children.clone(),
                    rest,
                    local: rest,
                }
            })
            .collect();

        let meshes = import
            .meshes
            .iter()
            .enumerate()
            .map(|(index, m)| {
                let normals = if m.normals.len() == m.positions.len() {
                    m.normals.clone()
                } else {
                    vec![[0.0, 0.0, 1.0]; m.positions.len()]
                };
                let mut mesh = CardMesh {
                    name: m.name.clone(),
                    node: import.node_for_mesh(index),
                    base_positions: m.positions.clone(),
                    base_normals: normals.clone(),
                    positions: m.positions.clone(),
                    normals,
                    uvs: m.uvs.clone(),
                    indices: m.indices.clone(),
                    morph_positions: m.morph_targets.iter().map(|t| t.positions.clone()).collect(),
                    morph_normals: m.morph_targets.iter().map(|t| t.normals.clone()).collect(),
                    morph_weights: vec![0.0; m.morph_targets.len()],
                    vertex_version: 0,
                };
                mesh.set_morph_weights(&m.morph_weights);
                mesh
            })
            .collect();

        Self {
            nodes,
            meshes,
            roots: import.root_nodes.clone(),
        }
    }

    /// Apply one sampled clip value to a node
    pub fn apply(&mut self, node_index: usize, property: NodeProperty, value: &[f32]) {
        let Some(node) = self.nodes.get_mut(node_index) else {
            return;
        };
        match property {
            NodeProperty::Translation if value.len() >= 3 => {
                node.local.translation = Vec3::new(value[0], value[1], value[2]);
            }
            NodeProperty::Rotation if value.len() >= 4 => {
                node.local.rotation = Quat::from_xyzw(value[0], value[1], value[2], value[3]);
            }
            NodeProperty::Scale if value.len() >= 3 => {
                node.local.scale = Vec3::new(value[0], value[1], value[2]);
            }
            NodeProperty::MorphWeights => {
                for mesh in self.meshes.iter_mut().filter(|m| m.node == Some(node_index)) {
                    mesh.set_morph_weights(value);
                }
            }
            _ => {}
        }
    }

    /// World matrix of every node in the current pose
    pub fn world_matrices(&self) -> Vec<Mat4> {
        self.compute_world(|n| n.local)
    }

    /// World matrix of every node in the rest pose
    pub fn rest_matrices(&self) -> Vec<Mat4> {
        self.compute_world(|n| n.rest)
    }

    fn compute_world(&self, pick: impl Fn(&SceneNode) -> NodeTransform) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut stack: Vec<(usize, Mat4)> = self.roots.iter().map(|&r| (r, Mat4::IDENTITY)).collect();
        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            let m = parent * pick(node).matrix();
            world[index] = m;
            for &child in &node.children {
                stack.push((child, m));
            }
        }
        world
    }

    /// Mesh bounds in rest-pose world space
    pub fn rest_bounds(&self) -> Vec<Option<MeshBounds>> {
        let rest = self.rest_matrices();
        self.meshes
            .iter()
            .map(|mesh| {
                let m = mesh.node.and_then(|n| rest.get(n)).copied().unwrap_or(Mat4::IDENTITY);
                let world: Vec<[f32; 3]> = mesh
                    .base_positions
                    .iter()
                    .map(|p| m.transform_point3(Vec3::from_array(*p)).to_array())
                    .collect();
                MeshBounds::from_positions(&world)
            })
            .collect()
    }

    /// Return every node to its rest transform
    pub fn reset_pose(&mut self) {
        for node in self.nodes.iter_mut() {
            node.local = node.rest;
        }
    }
}
