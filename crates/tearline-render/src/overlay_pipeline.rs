//! Overlay quad pipeline
//!
//! Flat cards drawn over the 3D scene in window pixels. A quad is placed by
//! [`overlay_quad_matrix`], which reproduces a CSS-style perspective: the
//! z = 0 plane maps 1:1 to window pixels and tilted quads foreshorten
//! toward a viewer `perspective` pixels in front of the window.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use tearline_core::Rect;
use wgpu::util::DeviceExt;

use crate::sunburst_pipeline::{flat_primitive, overlay_depth_state};
use crate::texture_cache::GpuTexture;

/// Viewer distance for the flip card, in pixels
pub const FLIP_PERSPECTIVE_PX: f32 = 1000.0;

/// Matches WGSL `OverlayUniforms`
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OverlayUniforms {
    pub transform: [[f32; 4]; 4],
    pub params: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadKind {
    Image = 0,
    Ring = 1,
}

/// How one quad sits on the stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadPlacement {
    pub rect: Rect,
    pub scale: f32,
    /// Degrees; positive pitches the top edge toward the viewer
    pub rot_x: f32,
    /// Degrees; positive turns the right edge away
    pub rot_y: f32,
    /// Extra downward offset in pixels
    pub translate_y: f32,
}

impl QuadPlacement {
    pub fn flat(rect: Rect) -> Self {
        Self {
            rect,
            scale: 1.0,
            rot_x: 0.0,
            rot_y: 0.0,
            translate_y: 0.0,
        }
    }
}

/// Unit quad (-0.5..0.5, y up) to clip space for a `width`×`height` window
pub fn overlay_quad_matrix(placement: &QuadPlacement, viewport: (f32, f32), perspective: f32) -> Mat4 {
    let (width, height) = (viewport.0.max(1.0), viewport.1.max(1.0));
    let perspective = perspective.max(1.0);

    let fov_y = 2.0 * (height * 0.5 / perspective).atan();
    let proj = Mat4::perspective_rh(fov_y, width / height, 1.0, perspective * 4.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, perspective), Vec3::ZERO, Vec3::Y);

    // Window pixels (origin top-left, y down) to a centred y-up plane
    let (cx, cy) = placement.rect.center();
    let centre = Vec3::new(cx - width * 0.5, height * 0.5 - cy - placement.translate_y, 0.0);

    let model = Mat4::from_translation(centre)
        * Mat4::from_rotation_y(placement.rot_y.to_radians())
        * Mat4::from_rotation_x(placement.rot_x.to_radians())
        * Mat4::from_scale(Vec3::new(
            placement.rect.width * placement.scale,
            placement.rect.height * placement.scale,
            1.0,
        ));

    proj * view * model
}

struct QuadSlot {
    uniform_buffer: wgpu::Buffer,
    bind_group: Option<(String, wgpu::BindGroup)>,
    visible: bool,
}

/// Fixed overlay slots, drawn in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlaySlot {
    FlipFront = 0,
    FlipBack = 1,
    Grail = 2,
    TearTrigger = 3,
}

const SLOT_COUNT: usize = 4;

pub struct OverlayPipeline {
    culled_pipeline: wgpu::RenderPipeline,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    quad_index_buffer: wgpu::Buffer,
    slots: Vec<QuadSlot>,
}

impl OverlayPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str, cull_mode: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_overlay"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_overlay"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    cull_mode,
                    ..flat_primitive()
                },
                depth_stencil: Some(overlay_depth_state()),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        // The flip card's two faces rely on culling to hide whichever side points away
        let culled_pipeline = make_pipeline("Overlay Culled Pipeline", Some(wgpu::Face::Back));
        let pipeline = make_pipeline("Overlay Pipeline", None);

        let quad_indices: [u32; 6] = [0, 1, 2, 2, 1, 3];
        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Quad Index Buffer"),
            contents: bytemuck::cast_slice(&quad_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let slots = (0..SLOT_COUNT)
            .map(|i| QuadSlot {
                uniform_buffer: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("Overlay Uniforms {}", i)),
                    size: std::mem::size_of::<OverlayUniforms>() as wgpu::BufferAddress,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                bind_group: None,
                visible: false,
            })
            .collect();

        Self {
            culled_pipeline,
            pipeline,
            layout,
            quad_index_buffer,
            slots,
        }
    }

    /// Hide every slot; call once per frame before [`set_quad`](Self::set_quad)
    pub fn begin_frame(&mut self) {
        for slot in &mut self.slots {
            slot.visible = false;
        }
    }

    /// Show a quad in `slot` this frame with the given transform and image
    #[allow(clippy::too_many_arguments)]
    pub fn set_quad(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot: OverlaySlot,
        transform: Mat4,
        kind: QuadKind,
        opacity: f32,
        time_s: f32,
        texture_name: &str,
        texture: &GpuTexture,
    ) {
        let layout = &self.layout;
        let Some(quad) = self.slots.get_mut(slot as usize) else {
            return;
        };

        let uniforms = OverlayUniforms {
            transform: transform.to_cols_array_2d(),
            params: [opacity, kind as u32 as f32, time_s, 0.0],
        };
        queue.write_buffer(&quad.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        if quad.bind_group.as_ref().map_or(true, |(name, _)| name != texture_name) {
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Overlay Bind Group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: quad.uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
            });
            quad.bind_group = Some((texture_name.to_string(), bind_group));
        }
        quad.visible = true;
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for (i, slot) in self.slots.iter().enumerate() {
            let Some((_, bind_group)) = slot.bind_group.as_ref().filter(|_| slot.visible) else {
                continue;
            };
            let culled = i == OverlaySlot::FlipFront as usize || i == OverlaySlot::FlipBack as usize;
            pass.set_pipeline(if culled { &self.culled_pipeline } else { &self.pipeline });
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw_indexed(0..6, 0, 0..1);
        }
    }

    /// Forget cached bind groups (textures were dropped)
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.bind_group = None;
            slot.visible = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const VIEWPORT: (f32, f32) = (1280.0, 720.0);

    /// Project a unit-quad corner to window pixels
    fn to_pixels(m: Mat4, x: f32, y: f32) -> (f32, f32) {
        let clip = m * Vec4::new(x, y, 0.0, 1.0);
        let ndc = clip / clip.w;
        (
            (ndc.x + 1.0) * 0.5 * VIEWPORT.0,
            (1.0 - ndc.y) * 0.5 * VIEWPORT.1,
        )
    }

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 0.05 && (a.1 - b.1).abs() < 0.05
    }

    #[test]
    fn flat_quad_maps_one_to_one() {
        let rect = Rect::new(100.0, 50.0, 200.0, 300.0);
        let m = overlay_quad_matrix(&QuadPlacement::flat(rect), VIEWPORT, FLIP_PERSPECTIVE_PX);
        assert!(close(to_pixels(m, -0.5, 0.5), (100.0, 50.0)));
        assert!(close(to_pixels(m, 0.5, -0.5), (300.0, 350.0)));
    }

    #[test]
    fn scale_and_offset_apply_around_centre() {
        let rect = Rect::centered(640.0, 360.0, 200.0, 200.0);
        let placement = QuadPlacement {
            scale: 0.5,
            translate_y: 40.0,
            ..QuadPlacement::flat(rect)
        };
        let m = overlay_quad_matrix(&placement, VIEWPORT, FLIP_PERSPECTIVE_PX);
        assert!(close(to_pixels(m, 0.0, 0.0), (640.0, 400.0)));
        assert!(close(to_pixels(m, -0.5, 0.5), (590.0, 350.0)));
    }

    #[test]
    fn tilted_top_edge_grows_toward_viewer() {
        let rect = Rect::centered(640.0, 360.0, 200.0, 200.0);
        let placement = QuadPlacement {
            rot_x: 20.0,
            ..QuadPlacement::flat(rect)
        };
        let m = overlay_quad_matrix(&placement, VIEWPORT, FLIP_PERSPECTIVE_PX);
        let top = to_pixels(m, 0.5, 0.5).0 - to_pixels(m, -0.5, 0.5).0;
        let bottom = to_pixels(m, 0.5, -0.5).0 - to_pixels(m, -0.5, -0.5).0;
        assert!(top > bottom);
    }

    #[test]
    fn half_turn_reverses_winding() {
        let rect = Rect::centered(640.0, 360.0, 200.0, 200.0);
        let front = overlay_quad_matrix(&QuadPlacement::flat(rect), VIEWPORT, FLIP_PERSPECTIVE_PX);
        let turned = overlay_quad_matrix(
            &QuadPlacement {
                rot_y: 180.0,
                ..QuadPlacement::flat(rect)
            },
            VIEWPORT,
            FLIP_PERSPECTIVE_PX,
        );
        let left = to_pixels(front, -0.5, 0.0).0;
        let mirrored = to_pixels(turned, -0.5, 0.0).0;
        assert!(left < 640.0 && mirrored > 640.0);
    }

    #[test]
    fn uniforms_are_80_bytes() {
        assert_eq!(std::mem::size_of::<OverlayUniforms>(), 80);
    }
}
