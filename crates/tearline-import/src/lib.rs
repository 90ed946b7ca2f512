//! Tearline Import - glTF/GLB model import
//!
//! Extracts what the card controller needs from a model file: mesh
//! primitives (with morph targets), the node hierarchy and node-level
//! animation clips. Materials and embedded images are ignored; card faces
//! are textured at runtime.

mod gltf_import;
mod types;

pub use gltf_import::{import_gltf, import_gltf_slice, validate_geometry};
pub use types::{
    ChannelProperty, ImportResult, ImportedKeyframe, ImportedMesh, ImportedMorphTarget,
    ImportedNode, ImportedNodeChannel, ImportedNodeClip, MeshBounds,
};
