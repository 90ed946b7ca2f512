//! Import result types

/// Result of importing a model file
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// File stem or caller-supplied name
    pub name: String,
    /// One entry per mesh primitive
    pub meshes: Vec<ImportedMesh>,
    /// glTF scene graph nodes with transforms
    pub nodes: Vec<ImportedNode>,
    /// Indices of top-level (root) nodes in the scene graph
    pub root_nodes: Vec<usize>,
    /// Node-level animation clips (transform and morph weight channels)
    pub node_clips: Vec<ImportedNodeClip>,
}

impl ImportResult {
    /// Compute the combined bounding box across all meshes
    pub fn bounds(&self) -> Option<MeshBounds> {
        self.meshes
            .iter()
            .filter_map(|m| m.bounds())
            .reduce(|a, b| a.union(&b))
    }

    pub fn has_node_animations(&self) -> bool {
        !self.node_clips.is_empty()
    }

    /// Find the node that owns a mesh primitive
    pub fn node_for_mesh(&self, mesh_index: usize) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.mesh_primitive_indices.contains(&mesh_index))
    }

    /// Parent index of every node (roots map to `None`)
    pub fn parents(&self) -> Vec<Option<usize>> {
        let mut parents = vec![None; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            for &child in &node.children {
                if let Some(slot) = parents.get_mut(child) {
                    *slot = Some(index);
                }
            }
        }
        parents
    }
}

/// Axis-aligned bounding box computed from vertex positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl MeshBounds {
    /// Compute bounds from a set of vertex positions
    pub fn from_positions(positions: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = positions.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some(Self { min, max })
    }

    /// Size along each axis
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Merge with another bounds to get the union
    pub fn union(&self, other: &MeshBounds) -> MeshBounds {
        MeshBounds {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        }
    }
}

impl std::fmt::Display for MeshBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.size();
        write!(
            f,
            "{:.2} x {:.2} x {:.2} (min [{:.2}, {:.2}, {:.2}], max [{:.2}, {:.2}, {:.2}])",
            s[0], s[1], s[2],
            self.min[0], self.min[1], self.min[2],
            self.max[0], self.max[1], self.max[2],
        )
    }
}

/// Per-target vertex deltas of a morph target
#[derive(Debug, Clone, Default)]
pub struct ImportedMorphTarget {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
}

/// An imported mesh primitive with vertex data
#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Empty when the primitive has no TEXCOORD_0
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub morph_targets: Vec<ImportedMorphTarget>,
    /// Default morph weights (mesh weights, overridden by node weights)
    pub morph_weights: Vec<f32>,
}

impl ImportedMesh {
    /// Compute the axis-aligned bounding box of this mesh's vertices
    pub fn bounds(&self) -> Option<MeshBounds> {
        MeshBounds::from_positions(&self.positions)
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty() && self.uvs.len() == self.positions.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Which node property a channel animates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelProperty {
    Translation,
    Rotation,
    Scale,
    MorphWeights,
}

/// A single keyframe in a node animation channel
#[derive(Debug, Clone)]
pub struct ImportedKeyframe {
    pub time: f32,
    /// 3 floats for translation/scale, 4 for rotation (quaternion xyzw),
    /// one per morph target for weights
    pub value: Vec<f32>,
}

/// An animation channel targeting a specific node's property
#[derive(Debug, Clone)]
pub struct ImportedNodeChannel {
    pub node_index: usize,
    pub node_name: String,
    pub property: ChannelProperty,
    pub interpolation: String,
    pub keyframes: Vec<ImportedKeyframe>,
}

/// A complete node-level animation clip
#[derive(Debug, Clone)]
pub struct ImportedNodeClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<ImportedNodeChannel>,
}

/// A node from the glTF scene graph, preserving transform hierarchy
#[derive(Debug, Clone)]
pub struct ImportedNode {
    pub name: String,
    pub translation: [f32; 3],
    pub rotation: [f32; 4], // quaternion [x, y, z, w]
    pub scale: [f32; 3],
    pub mesh_primitive_indices: Vec<usize>, // indices into ImportResult.meshes
    pub children: Vec<usize>,              // indices into ImportResult.nodes
}
