//! Card mesh pipeline
//!
//! Each card mesh owns its vertex buffer, a uniform buffer and a texture bind
//! group. Vertex data is re-uploaded only when the mesh's vertex version
//! moves (UV projection, morph targets); the texture bind group is rebuilt
//! when the material version or the bound images change.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use tearline_card::{CardMesh, CardModel, MeshDraw};
use tracing::debug;
use wgpu::util::DeviceExt;

use crate::context::DEPTH_FORMAT;
use crate::texture_cache::TextureCache;

/// Card vertex: position, normal and the projected face UV
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct CardVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl CardVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CardVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-mesh uniforms: matches WGSL `CardUniforms`
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CardUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// offset.xy, repeat.xy
    pub region: [f32; 4],
    /// opacity, blend, face mode, time (s)
    pub params: [f32; 4],
}

impl CardUniforms {
    pub fn new(view_proj: Mat4, draw: &MeshDraw<'_>, time_s: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: draw.model.to_cols_array_2d(),
            region: [
                draw.region.offset[0],
                draw.region.offset[1],
                draw.region.repeat[0],
                draw.region.repeat[1],
            ],
            params: [draw.opacity, draw.blend, draw.mode as u32 as f32, time_s],
        }
    }
}

/// Interleave a card mesh's current vertex streams. Missing normals face +Z,
/// missing UVs are zero.
pub fn card_vertices(mesh: &CardMesh) -> Vec<CardVertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, &position)| CardVertex {
            position,
            normal: mesh.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
            uv: mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
        })
        .collect()
}

/// Index list for a mesh; unindexed meshes draw their vertices in order
pub fn card_indices(mesh: &CardMesh) -> Vec<u32> {
    if mesh.indices.is_empty() {
        (0..mesh.positions.len() as u32).collect()
    } else {
        mesh.indices.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextureKey {
    material_version: u64,
    next: String,
    previous: String,
}

struct GpuCardMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: usize,
    vertex_version: u64,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: Option<(TextureKey, wgpu::BindGroup)>,
}

pub struct CardPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    meshes: Vec<Option<GpuCardMesh>>,
    /// Meshes to draw this frame, by index into `meshes`
    visible: Vec<usize>,
}

impl CardPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Card Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("card_shader.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Card Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Card Texture Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Card Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Card Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[CardVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Double-sided: the back of the card shows the mirrored face
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_layout,
            texture_layout,
            meshes: Vec::new(),
            visible: Vec::new(),
        }
    }

    /// Sync GPU state with the card's draw list for this frame
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        card: &CardModel,
        textures: &TextureCache,
        view_proj: Mat4,
        time_s: f32,
    ) {
        self.visible.clear();
        let Some(scene) = card.scene() else {
            return;
        };
        if self.meshes.len() != scene.meshes.len() {
            self.meshes.clear();
            self.meshes.resize_with(scene.meshes.len(), || None);
        }

        for draw in card.draw_list() {
            let Some(mesh) = scene.meshes.get(draw.mesh_index) else {
                continue;
            };
            if mesh.positions.is_empty() {
                continue;
            }

            let slot = &mut self.meshes[draw.mesh_index];
            let needs_upload = match slot.as_mut() {
                Some(gpu) if gpu.vertex_version == draw.vertex_version => false,
                Some(gpu) if gpu.vertex_count == mesh.positions.len() => {
                    queue.write_buffer(&gpu.vertex_buffer, 0, bytemuck::cast_slice(&card_vertices(mesh)));
                    gpu.vertex_version = draw.vertex_version;
                    false
                }
                _ => true,
            };
            if needs_upload {
                *slot = Some(upload_mesh(device, &self.uniform_layout, mesh, draw.vertex_version));
            }
            let Some(gpu) = slot.as_mut() else {
                continue;
            };

            let uniforms = CardUniforms::new(view_proj, &draw, time_s);
            queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

            let key = TextureKey {
                material_version: draw.material_version,
                next: draw.texture.to_string(),
                previous: draw.previous_texture.to_string(),
            };
            let stale = gpu.texture_bind_group.as_ref().map_or(true, |(k, _)| *k != key);
            if stale {
                let next = textures.get_or_white(&key.next);
                let previous = textures.get_or_white(&key.previous);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Card Texture Bind Group"),
                    layout: &self.texture_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&next.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&previous.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&next.sampler),
                        },
                    ],
                });
                debug!("Card mesh {} bound '{}' (material v{})", draw.mesh_index, key.next, key.material_version);
                gpu.texture_bind_group = Some((key, bind_group));
            }

            self.visible.push(draw.mesh_index);
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        for &index in &self.visible {
            let Some(gpu) = self.meshes.get(index).and_then(Option::as_ref) else {
                continue;
            };
            let Some((_, textures)) = gpu.texture_bind_group.as_ref() else {
                continue;
            };
            pass.set_bind_group(0, &gpu.uniform_bind_group, &[]);
            pass.set_bind_group(1, textures, &[]);
            pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..gpu.index_count, 0, 0..1);
        }
    }

    /// Drop every GPU buffer (card unmounted or replaced)
    pub fn clear(&mut self) {
        self.meshes.clear();
        self.visible.clear();
    }
}

fn upload_mesh(
    device: &wgpu::Device,
    uniform_layout: &wgpu::BindGroupLayout,
    mesh: &CardMesh,
    vertex_version: u64,
) -> GpuCardMesh {
    let vertices = card_vertices(mesh);
    let indices = card_indices(mesh);

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("Card Vertex Buffer ({})", mesh.name)),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("Card Index Buffer ({})", mesh.name)),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Card Uniform Buffer"),
        size: std::mem::size_of::<CardUniforms>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Card Uniform Bind Group"),
        layout: uniform_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    GpuCardMesh {
        vertex_buffer,
        vertex_count: vertices.len(),
        vertex_version,
        index_buffer,
        index_count: indices.len() as u32,
        uniform_buffer,
        uniform_bind_group,
        texture_bind_group: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tearline_card::FaceMode;
    use tearline_core::TextureRegion;

    fn mesh() -> CardMesh {
        CardMesh::new(
            "face",
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0.0, 0.0, -1.0]],
            vec![[0.5, 0.5], [1.0, 0.0]],
            Vec::new(),
        )
    }

    #[test]
    fn uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<CardUniforms>(), 160);
        assert_eq!(std::mem::size_of::<CardVertex>(), 32);
    }

    #[test]
    fn vertices_fill_missing_streams() {
        let verts = card_vertices(&mesh());
        assert_eq!(verts.len(), 3);
        assert_eq!(verts[0].normal, [0.0, 0.0, -1.0]);
        assert_eq!(verts[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(verts[1].uv, [1.0, 0.0]);
        assert_eq!(verts[2].uv, [0.0, 0.0]);
    }

    #[test]
    fn unindexed_mesh_draws_in_order() {
        assert_eq!(card_indices(&mesh()), vec![0, 1, 2]);
        let mut indexed = mesh();
        indexed.indices = vec![2, 1, 0];
        assert_eq!(card_indices(&indexed), vec![2, 1, 0]);
    }

    #[test]
    fn uniforms_pack_draw_parameters() {
        let draw = MeshDraw {
            mesh_index: 1,
            model: Mat4::from_translation(glam::Vec3::new(0.0, 1.5, 0.0)),
            region: TextureRegion::new([0.0, 0.94], [1.0, 0.06]),
            opacity: 0.5,
            mode: FaceMode::Crossfade,
            blend: 0.25,
            texture: "next.png",
            previous_texture: "prev.png",
            vertex_version: 3,
            material_version: 2,
        };
        let u = CardUniforms::new(Mat4::IDENTITY, &draw, 1.5);
        assert_eq!(u.region, [0.0, 0.94, 1.0, 0.06]);
        assert_eq!(u.params, [0.5, 0.25, 1.0, 1.5]);
        assert_eq!(u.model[3][1], 1.5);
    }

    #[test]
    fn shader_back_face_threshold_matches_card() {
        let source = include_str!("card_shader.wgsl");
        let value = source
            .lines()
            .find_map(|line| line.trim().strip_prefix("const BACK_FACE_NORMAL_Z: f32 ="))
            .map(|rest| rest.trim().trim_end_matches(';').parse::<f32>().unwrap())
            .unwrap();
        assert_eq!(value, tearline_card::BACK_FACE_NORMAL_Z);

        // A fragment just past the threshold samples mirrored
        let z = tearline_card::BACK_FACE_NORMAL_Z - 0.01;
        let uv = tearline_card::back_face_uv([0.2, 0.7], z);
        assert!((uv[0] - 0.8).abs() < 1e-6);
    }
}
