//! Sunburst pipelines: a full-screen ray pass (alpha blended) followed by
//! instanced particle sprites (additive).

use bytemuck::{Pod, Zeroable};
use tearline_particles::{ParticleInstance, SunburstSimulation};
use wgpu::util::DeviceExt;

/// Matches WGSL `ViewportUniforms`
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct ViewportUniforms {
    size: [f32; 4],
}

pub struct SunburstPipeline {
    ray_pipeline: wgpu::RenderPipeline,
    ray_uniform_buffer: wgpu::Buffer,
    ray_bind_group: wgpu::BindGroup,

    particle_pipeline: wgpu::RenderPipeline,
    particle_layout: wgpu::BindGroupLayout,
    viewport_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    particle_bind_group: wgpu::BindGroup,
    quad_index_buffer: wgpu::Buffer,
    instance_count: u32,
    running: bool,
}

impl SunburstPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, capacity: usize) -> Self {
        // Ray pass
        let ray_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sunburst Ray Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sunburst_rays.wgsl").into()),
        });

        let ray_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sunburst Ray Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let ray_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sunburst Ray Uniforms"),
            contents: bytemuck::cast_slice(&[[0.0f32; 4]]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let ray_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sunburst Ray Bind Group"),
            layout: &ray_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ray_uniform_buffer.as_entire_binding(),
            }],
        });

        let ray_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sunburst Ray Pipeline Layout"),
            bind_group_layouts: &[&ray_layout],
            push_constant_ranges: &[],
        });

        let ray_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sunburst Ray Pipeline"),
            layout: Some(&ray_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ray_shader,
                entry_point: Some("vs_rays"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &ray_shader,
                entry_point: Some("fs_rays"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: flat_primitive(),
            depth_stencil: Some(overlay_depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Particle pass
        let particle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sunburst Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sunburst_particles.wgsl").into()),
        });

        let particle_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sunburst Particle Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let viewport_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sunburst Viewport Uniforms"),
            contents: bytemuck::cast_slice(&[ViewportUniforms { size: [1.0, 1.0, 0.0, 0.0] }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let instance_capacity = capacity.max(1);
        let instance_buffer = create_instance_buffer(device, instance_capacity);
        let particle_bind_group =
            create_particle_bind_group(device, &particle_layout, &viewport_buffer, &instance_buffer);

        let particle_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sunburst Particle Pipeline Layout"),
            bind_group_layouts: &[&particle_layout],
            push_constant_ranges: &[],
        });

        // Additive blend (src_alpha + One)
        let additive_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let particle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sunburst Particle Pipeline"),
            layout: Some(&particle_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &particle_shader,
                entry_point: Some("vs_particle"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &particle_shader,
                entry_point: Some("fs_particle"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(additive_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: flat_primitive(),
            depth_stencil: Some(overlay_depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let quad_indices: [u32; 6] = [0, 1, 2, 2, 1, 3];
        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sunburst Quad Index Buffer"),
            contents: bytemuck::cast_slice(&quad_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            ray_pipeline,
            ray_uniform_buffer,
            ray_bind_group,
            particle_pipeline,
            particle_layout,
            viewport_buffer,
            instance_buffer,
            instance_capacity,
            particle_bind_group,
            quad_index_buffer,
            instance_count: 0,
            running: false,
        }
    }

    /// Upload this frame's ray uniforms and live particles
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sim: &mut SunburstSimulation,
        surface_size: (u32, u32),
    ) {
        self.running = sim.is_running();
        if !self.running {
            self.instance_count = 0;
            return;
        }

        queue.write_buffer(&self.ray_uniform_buffer, 0, bytemuck::cast_slice(&[sim.ray_uniforms()]));
        let viewport = ViewportUniforms {
            size: [surface_size.0 as f32, surface_size.1 as f32, 0.0, 0.0],
        };
        queue.write_buffer(&self.viewport_buffer, 0, bytemuck::cast_slice(&[viewport]));

        let instances = sim.pack_instances();
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
            self.particle_bind_group = create_particle_bind_group(
                device,
                &self.particle_layout,
                &self.viewport_buffer,
                &self.instance_buffer,
            );
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
        self.instance_count = instances.len() as u32;
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if !self.running {
            return;
        }

        pass.set_pipeline(&self.ray_pipeline);
        pass.set_bind_group(0, &self.ray_bind_group, &[]);
        pass.draw(0..6, 0..1);

        if self.instance_count > 0 {
            pass.set_pipeline(&self.particle_pipeline);
            pass.set_bind_group(0, &self.particle_bind_group, &[]);
            pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..6, 0, 0..self.instance_count);
        }
    }
}

/// Triangle list, no culling
pub(crate) fn flat_primitive() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

/// Passes that share the depth attachment but never test or write it
pub(crate) fn overlay_depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: crate::context::DEPTH_FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Always,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sunburst Instance Buffer"),
        size: (capacity * std::mem::size_of::<ParticleInstance>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_particle_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    viewport: &wgpu::Buffer,
    instances: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Sunburst Particle Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: instances.as_entire_binding(),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tearline_particles::RayUniforms;

    #[test]
    fn gpu_structs_are_vec4_sized() {
        assert_eq!(std::mem::size_of::<RayUniforms>(), 16);
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 16);
        assert_eq!(std::mem::size_of::<ViewportUniforms>(), 16);
    }
}
