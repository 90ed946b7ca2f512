//! Tearline Render - wgpu renderer for the card stage
//!
//! Draws a [`tearline_sequencer::CardAnimation`] frame: the sunburst ray
//! and particle passes, the 3D card meshes with their face textures, and
//! the flat overlay cards placed with a perspective transform.

mod card_pipeline;
mod context;
mod overlay_pipeline;
mod stage_renderer;
mod sunburst_pipeline;
mod texture_cache;

pub use card_pipeline::{card_indices, card_vertices, CardPipeline, CardUniforms, CardVertex};
pub use context::{RenderContext, RenderError, DEPTH_FORMAT};
pub use overlay_pipeline::{
    overlay_quad_matrix, OverlayPipeline, OverlaySlot, OverlayUniforms, QuadKind, QuadPlacement,
    FLIP_PERSPECTIVE_PX,
};
pub use stage_renderer::{texture_key, StageRenderer};
pub use sunburst_pipeline::SunburstPipeline;
pub use texture_cache::{GpuTexture, TextureCache};

#[cfg(test)]
mod tests {
    fn parse_and_validate(name: &str, source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{} failed to parse: {}", name, e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{} failed validation: {:?}", name, e));
    }

    #[test]
    fn card_shader_wgsl_is_valid() {
        parse_and_validate("card_shader.wgsl", include_str!("card_shader.wgsl"));
    }

    #[test]
    fn sunburst_rays_wgsl_is_valid() {
        parse_and_validate("sunburst_rays.wgsl", include_str!("sunburst_rays.wgsl"));
    }

    #[test]
    fn sunburst_particles_wgsl_is_valid() {
        parse_and_validate("sunburst_particles.wgsl", include_str!("sunburst_particles.wgsl"));
    }

    #[test]
    fn overlay_wgsl_is_valid() {
        parse_and_validate("overlay.wgsl", include_str!("overlay.wgsl"));
    }
}
