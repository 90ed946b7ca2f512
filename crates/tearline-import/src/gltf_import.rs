//! glTF/GLB file importer

use crate::types::{
    ChannelProperty, ImportResult, ImportedKeyframe, ImportedMesh, ImportedMorphTarget,
    ImportedNode, ImportedNodeChannel, ImportedNodeClip,
};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;
use std::collections::HashMap;
use std::path::Path;
use tearline_core::{Result, TearlineError};
use tracing::{debug, warn};

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Import a glTF or GLB file
pub fn import_gltf<P: AsRef<Path>>(path: P) -> Result<ImportResult> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path)
        .map_err(|e| TearlineError::Import(format!("Failed to import glTF: {}", e)))?;

    let name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();

    convert_document(&document, &buffers, name)
}

/// Import a glTF or GLB file already in memory
pub fn import_gltf_slice(bytes: &[u8], name: &str) -> Result<ImportResult> {
    let (document, buffers, _images) = gltf::import_slice(bytes)
        .map_err(|e| TearlineError::Import(format!("Failed to import glTF: {}", e)))?;
    convert_document(&document, &buffers, name.to_string())
}

/// Check that an imported model has something to draw
pub fn validate_geometry(result: &ImportResult) -> Result<()> {
    if result.meshes.is_empty() {
        return Err(TearlineError::MissingGeometry(format!(
            "'{}' contains no meshes",
            result.name
        )));
    }
    if let Some(mesh) = result.meshes.iter().find(|m| m.positions.is_empty()) {
        return Err(TearlineError::MissingGeometry(format!(
            "mesh '{}' in '{}' has no position attribute",
            mesh.name, result.name
        )));
    }
    Ok(())
}

fn convert_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    name: String,
) -> Result<ImportResult> {
    if document.extensions_required().any(|ext| ext == DRACO_EXTENSION) {
        return Err(TearlineError::Import(format!(
            "'{}' uses {}, which is not supported",
            name, DRACO_EXTENSION
        )));
    }

    // glTF mesh index -> indices into our flattened primitive list
    let mut primitive_map: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut meshes = Vec::new();

    for mesh in document.meshes() {
        let mesh_name = mesh
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let default_weights = mesh.weights().map(<[f32]>::to_vec).unwrap_or_default();

        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().collect())
                .unwrap_or_default();

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|iter| iter.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            let morph_targets: Vec<ImportedMorphTarget> = reader
                .read_morph_targets()
                .map(|(target_positions, target_normals, _tangents)| ImportedMorphTarget {
                    positions: target_positions.map(|iter| iter.collect()).unwrap_or_default(),
                    normals: target_normals.map(|iter| iter.collect()).unwrap_or_default(),
                })
                .collect();

            if positions.is_empty() {
                warn!("Primitive of mesh '{}' has no positions", mesh_name);
            }

            let mut morph_weights = default_weights.clone();
            morph_weights.resize(morph_targets.len(), 0.0);

            primitive_map.entry(mesh.index()).or_default().push(meshes.len());
            meshes.push(ImportedMesh {
                name: mesh_name.clone(),
                positions,
                normals,
                uvs,
                indices,
                morph_targets,
                morph_weights,
            });
        }
    }

    let mut nodes = Vec::new();
    for node in document.nodes() {
        let (translation, rotation, scale) = node.transform().decomposed();
        let mesh_primitive_indices = node
            .mesh()
            .and_then(|m| primitive_map.get(&m.index()).cloned())
            .unwrap_or_default();

        // Node weights override the mesh defaults
        if let Some(weights) = node.weights() {
            for &mesh_index in &mesh_primitive_indices {
                let mesh = &mut meshes[mesh_index];
                let count = mesh.morph_targets.len();
                mesh.morph_weights = weights.to_vec();
                mesh.morph_weights.resize(count, 0.0);
            }
        }

        nodes.push(ImportedNode {
            name: node
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("node_{}", node.index())),
            translation,
            rotation,
            scale,
            mesh_primitive_indices,
            children: node.children().map(|c| c.index()).collect(),
        });
    }

    let root_nodes = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => {
            let mut is_child = vec![false; nodes.len()];
            for node in &nodes {
                for &child in &node.children {
                    is_child[child] = true;
                }
            }
            (0..nodes.len()).filter(|&i| !is_child[i]).collect()
        }
    };

    let node_clips = import_node_clips(document, buffers, &nodes);

    debug!(
        "Imported '{}': {} primitives, {} nodes, {} clips",
        name,
        meshes.len(),
        nodes.len(),
        node_clips.len()
    );

    Ok(ImportResult {
        name,
        meshes,
        nodes,
        root_nodes,
        node_clips,
    })
}

fn import_node_clips(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    nodes: &[ImportedNode],
) -> Vec<ImportedNodeClip> {
    let mut clips = Vec::new();

    for animation in document.animations() {
        let clip_name = animation
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("animation_{}", animation.index()));

        let mut channels = Vec::new();
        let mut duration = 0.0_f32;

        for channel in animation.channels() {
            let node_index = channel.target().node().index();
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            if times.is_empty() {
                continue;
            }
            let Some(outputs) = reader.read_outputs() else {
                continue;
            };

            let (property, rows): (ChannelProperty, Vec<Vec<f32>>) = match outputs {
                ReadOutputs::Translations(values) => (
                    ChannelProperty::Translation,
                    values.map(|v| v.to_vec()).collect(),
                ),
                ReadOutputs::Rotations(values) => (
                    ChannelProperty::Rotation,
                    values.into_f32().map(|v| v.to_vec()).collect(),
                ),
                ReadOutputs::Scales(values) => {
                    (ChannelProperty::Scale, values.map(|v| v.to_vec()).collect())
                }
                ReadOutputs::MorphTargetWeights(values) => {
                    let flat: Vec<f32> = values.into_f32().collect();
                    let per_key = match channel.sampler().interpolation() {
                        Interpolation::CubicSpline => times.len() * 3,
                        _ => times.len(),
                    };
                    let width = (flat.len() / per_key).max(1);
                    (
                        ChannelProperty::MorphWeights,
                        flat.chunks(width).map(<[f32]>::to_vec).collect(),
                    )
                }
            };

            let interpolation = channel.sampler().interpolation();
            // Cubic spline packs [in_tangent, value, out_tangent] per key; keep the value
            let values: Vec<Vec<f32>> = match interpolation {
                Interpolation::CubicSpline => rows.into_iter().skip(1).step_by(3).collect(),
                _ => rows,
            };
            if values.len() != times.len() {
                warn!(
                    "Animation '{}' channel on node {} has {} values for {} keys; skipping",
                    clip_name,
                    node_index,
                    values.len(),
                    times.len()
                );
                continue;
            }

            if let Some(&last) = times.last() {
                duration = duration.max(last);
            }

            let keyframes = times
                .into_iter()
                .zip(values)
                .map(|(time, value)| ImportedKeyframe { time, value })
                .collect();

            channels.push(ImportedNodeChannel {
                node_index,
                node_name: nodes
                    .get(node_index)
                    .map(|n| n.name.clone())
                    .unwrap_or_default(),
                property,
                interpolation: match interpolation {
                    Interpolation::Linear => "LINEAR",
                    Interpolation::Step => "STEP",
                    Interpolation::CubicSpline => "CUBICSPLINE",
                }
                .to_string(),
                keyframes,
            });
        }

        if channels.is_empty() {
            continue;
        }

        clips.push(ImportedNodeClip {
            name: clip_name,
            duration,
            channels,
        });
    }

    clips
}
