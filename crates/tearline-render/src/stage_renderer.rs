//! Stage renderer: draws one session frame
//!
//! Draw order, back to front: sunburst rays, sunburst particles, the 3D
//! card, the flip card, the grail card and the tear-trigger ring.

use std::path::Path;

use tearline_core::Rect;
use tearline_sequencer::{AssetStore, CardAnimation, FrameSnapshot};
use tracing::{debug, info};

use crate::card_pipeline::CardPipeline;
use crate::context::{RenderContext, RenderError};
use crate::overlay_pipeline::{
    overlay_quad_matrix, OverlayPipeline, OverlaySlot, QuadKind, QuadPlacement, FLIP_PERSPECTIVE_PX,
};
use crate::sunburst_pipeline::SunburstPipeline;
use crate::texture_cache::TextureCache;

const WHITE: &str = "<white>";

/// Texture cache key for an asset path
pub fn texture_key(path: &Path) -> String {
    path.display().to_string()
}

pub struct StageRenderer {
    textures: TextureCache,
    card: CardPipeline,
    sunburst: SunburstPipeline,
    overlay: OverlayPipeline,
    clear_color: wgpu::Color,
}

impl StageRenderer {
    pub fn new(ctx: &RenderContext, particle_capacity: usize) -> Self {
        info!("Creating stage renderer ({} particle slots)", particle_capacity);
        Self {
            textures: TextureCache::new(&ctx.device, &ctx.queue),
            card: CardPipeline::new(&ctx.device, ctx.config.format),
            sunburst: SunburstPipeline::new(&ctx.device, ctx.config.format, particle_capacity),
            overlay: OverlayPipeline::new(&ctx.device, ctx.config.format),
            clear_color: wgpu::Color {
                r: 0.02,
                g: 0.02,
                b: 0.04,
                a: 1.0,
            },
        }
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Drop per-session GPU state before a replay
    pub fn reset(&mut self) {
        self.card.clear();
        self.overlay.clear();
    }

    /// Render the session's current frame. A skipped frame (surface timeout)
    /// is not an error.
    pub fn render(
        &mut self,
        ctx: &mut RenderContext,
        session: &mut CardAnimation,
        now_ms: f64,
    ) -> Result<(), RenderError> {
        self.sync_textures(ctx, session);

        let time_s = (now_ms / 1000.0) as f32;
        let snapshot = session.snapshot();
        let surface_size = (ctx.config.width, ctx.config.height);

        self.sunburst
            .prepare(&ctx.device, &ctx.queue, session.sunburst_mut(), surface_size);

        match session.card() {
            Some(card) => {
                let view_proj = session.config().card.camera.view_proj(ctx.aspect_ratio());
                self.card
                    .prepare(&ctx.device, &ctx.queue, card, &self.textures, view_proj, time_s);
            }
            None => self.card.clear(),
        }

        self.prepare_overlays(ctx, session, &snapshot, time_s);

        let Some(frame) = ctx.acquire_frame()? else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Stage Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Stage Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.sunburst.draw(&mut pass);
            self.card.draw(&mut pass);
            self.overlay.draw(&mut pass);
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Upload decoded images that are not on the GPU yet
    fn sync_textures(&mut self, ctx: &RenderContext, session: &CardAnimation) {
        let assets = &session.config().assets;
        let critical = [assets.card_image.as_path()];
        upload_from(&mut self.textures, ctx, session.assets(), &critical);

        let optional: Vec<&Path> = [
            &assets.logo,
            &assets.flip_front,
            &assets.flip_back,
            &assets.grail_image,
        ]
        .into_iter()
        .flatten()
        .map(|p| p.as_path())
        .filter(|p| !self.textures.contains(&texture_key(p)))
        .collect();
        if !optional.is_empty() {
            upload_from(&mut self.textures, ctx, &session.optional_assets(), &optional);
        }
    }

    fn prepare_overlays(
        &mut self,
        ctx: &RenderContext,
        session: &CardAnimation,
        snapshot: &FrameSnapshot,
        time_s: f32,
    ) {
        self.overlay.begin_frame();
        let assets = &session.config().assets;
        let layout = &snapshot.layout;
        let viewport = (layout.width, layout.height);

        if snapshot.flip_visible {
            let front = assets.flip_front.as_deref().unwrap_or(assets.card_image.as_path());
            let front = self.existing_key(front);
            let back = assets
                .flip_back
                .as_deref()
                .map_or_else(|| WHITE.to_string(), |p| self.existing_key(p));

            let placement = QuadPlacement {
                rect: layout.flip_card,
                scale: snapshot.flip.scale,
                rot_x: snapshot.flip.rotation_x,
                rot_y: snapshot.flip.rotation_y,
                translate_y: 0.0,
            };
            let back_placement = QuadPlacement {
                rot_y: placement.rot_y + 180.0,
                // The back's pitch mirrors once it is turned around
                rot_x: -placement.rot_x,
                ..placement
            };
            self.place(ctx, OverlaySlot::FlipFront, &placement, viewport, QuadKind::Image, time_s, &front);
            self.place(ctx, OverlaySlot::FlipBack, &back_placement, viewport, QuadKind::Image, time_s, &back);
        }

        if snapshot.grail.visible {
            if let Some(grail) = assets.grail_image.as_deref() {
                let key = self.existing_key(grail);
                let placement = QuadPlacement {
                    scale: snapshot.grail.scale,
                    translate_y: layout.grail.height * snapshot.grail.translate_y_percent / 100.0,
                    ..QuadPlacement::flat(layout.grail)
                };
                self.place(ctx, OverlaySlot::Grail, &placement, viewport, QuadKind::Image, time_s, &key);
            }
        }

        if snapshot.tear_trigger_visible {
            let trigger = layout.tear_trigger;
            let size = trigger.radius * 2.0;
            let placement = QuadPlacement::flat(Rect::centered(trigger.cx, trigger.cy, size, size));
            self.place(ctx, OverlaySlot::TearTrigger, &placement, viewport, QuadKind::Ring, time_s, WHITE);
        }
    }

    fn existing_key(&self, path: &Path) -> String {
        let key = texture_key(path);
        if self.textures.contains(&key) {
            key
        } else {
            WHITE.to_string()
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &mut self,
        ctx: &RenderContext,
        slot: OverlaySlot,
        placement: &QuadPlacement,
        viewport: (f32, f32),
        kind: QuadKind,
        time_s: f32,
        texture_key: &str,
    ) {
        if placement.rect.width <= 0.0 || placement.rect.height <= 0.0 {
            return;
        }
        let transform = overlay_quad_matrix(placement, viewport, FLIP_PERSPECTIVE_PX);
        let texture = self.textures.get_or_white(texture_key);
        self.overlay.set_quad(
            &ctx.device,
            &ctx.queue,
            slot,
            transform,
            kind,
            1.0,
            time_s,
            texture_key,
            texture,
        );
    }
}

fn upload_from(textures: &mut TextureCache, ctx: &RenderContext, store: &AssetStore, paths: &[&Path]) {
    for path in paths {
        let key = texture_key(path);
        if textures.contains(&key) {
            continue;
        }
        if let Some(image) = store.image(path) {
            if textures.upload_rgba(&ctx.device, &ctx.queue, &key, image.width, image.height, &image.rgba) {
                debug!("Texture ready: {}", key);
            }
        }
    }
}
