//! Card model controller
//!
//! Owns one scene instance and walks it through
//! `Hidden → Appearing → Idle → Tearing → Sliding → Disposed`. Completion is
//! reported upward through an event bus the owner drains every frame.

use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3};
use tearline_animation::{ClipAction, Easing, NodeClip, Tween};
use tearline_core::{Result, TextureRegion};
use tearline_import::{validate_geometry, ImportResult, MeshBounds};
use tearline_runtime::{EventBus, RuntimeSystem, Stopwatch, TimerQueue};
use tracing::{debug, info, warn};

use crate::config::CardConfig;
use crate::face::{CardFaceRenderer, FaceMesh, FaceMode};
use crate::scene::CardScene;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Hidden,
    Appearing,
    Idle,
    Tearing,
    Sliding,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardEvent {
    /// The intro spin-and-scale reached full progress (fires once)
    AppearComplete,
    /// The tear clip reached its final frame
    TearFinished,
    /// The slide-out profile ran to completion
    SlideFinished,
}

/// A decoded card image, identified by its source path
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

impl TextureInfo {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Ticket for an asynchronous texture load; only the newest one binds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRequest {
    pub generation: u64,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardEffect {
    StartAppear,
    ReapplyMaterials,
}

/// Everything the renderer needs to draw one mesh this frame
#[derive(Debug, Clone)]
pub struct MeshDraw<'a> {
    pub mesh_index: usize,
    pub model: Mat4,
    pub region: TextureRegion,
    pub opacity: f32,
    pub mode: FaceMode,
    pub blend: f32,
    pub texture: &'a str,
    /// Same as `texture` unless a cross-fade is running
    pub previous_texture: &'a str,
    pub vertex_version: u64,
    pub material_version: u64,
}

pub struct CardModel {
    config: CardConfig,
    scene: Option<CardScene>,
    clips: Vec<NodeClip>,
    tear_clip: Option<usize>,
    tear_action: ClipAction,
    face: Box<dyn CardFaceRenderer>,
    state: CardState,
    timers: TimerQueue<CardEffect>,
    events: EventBus<CardEvent>,
    appear: Option<Tween<f64>>,
    appear_requested: bool,
    appear_notified: bool,
    tear_latch: bool,
    is_tearing: bool,
    slide_watch: Stopwatch,
    slide_finished: bool,
    texture_generation: u64,
    texture: Option<TextureInfo>,
    previous_texture: Option<TextureInfo>,
    regions: Vec<TextureRegion>,
    material_version: u64,
    scale: f32,
    rotation_y: f32,
    offset_y: f32,
    opacity: f32,
    now_ms: f64,
}

impl CardModel {
    /// Instantiate a private copy of `import`. A model without drawable
    /// geometry mounts in a degraded state: it keeps its timing but draws
    /// nothing.
    pub fn mount(import: &ImportResult, config: CardConfig) -> Self {
        let scene = match validate_geometry(import) {
            Ok(()) => Some(CardScene::instantiate(import)),
            Err(e) => {
                warn!("Card model renders nothing: {}", e);
                None
            }
        };

        let clips: Vec<NodeClip> = import.node_clips.iter().map(NodeClip::from_imported).collect();
        let tear_clip = NodeClip::select(&clips, &config.tear_clip)
            .and_then(|c| clips.iter().position(|o| o.name == c.name));
        match tear_clip.and_then(|i| clips.get(i)) {
            Some(clip) => debug!("Tear clip '{}' ({:.2}s)", clip.name, clip.duration),
            None => debug!("Model has no animation clips; tear is visual-only"),
        }

        let face = config.face.build();
        let tear_action = ClipAction::once(config.tear_time_scale);

        Self {
            config,
            scene,
            clips,
            tear_clip,
            tear_action,
            face,
            state: CardState::Hidden,
            timers: TimerQueue::new(),
            events: EventBus::new(),
            appear: None,
            appear_requested: false,
            appear_notified: false,
            tear_latch: false,
            is_tearing: false,
            slide_watch: Stopwatch::new(),
            slide_finished: false,
            texture_generation: 0,
            texture: None,
            previous_texture: None,
            regions: Vec::new(),
            material_version: 0,
            scale: 0.0,
            rotation_y: 0.0,
            offset_y: 0.0,
            opacity: 1.0,
            now_ms: 0.0,
        }
    }

    pub fn state(&self) -> CardState {
        self.state
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&CardScene> {
        self.scene.as_ref()
    }

    pub fn is_degraded(&self) -> bool {
        self.scene.is_none()
    }

    pub fn texture(&self) -> Option<&TextureInfo> {
        self.texture.as_ref()
    }

    pub fn regions(&self) -> &[TextureRegion] {
        &self.regions
    }

    pub fn material_version(&self) -> u64 {
        self.material_version
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Uniform group scale, Y rotation (radians) and vertical slide offset
    pub fn group_pose(&self) -> (f32, f32, f32) {
        (self.scale, self.rotation_y, self.offset_y)
    }

    pub fn tear_started(&self) -> bool {
        self.tear_latch
    }

    pub fn tear_clip(&self) -> Option<&NodeClip> {
        self.tear_clip.and_then(|i| self.clips.get(i))
    }

    /// Queue the intro spin-and-scale. It starts after the configured frame
    /// delay so the first frame never shows a half-initialised card.
    pub fn begin_appear(&mut self) {
        if self.state != CardState::Hidden || self.appear_requested {
            return;
        }
        self.appear_requested = true;
        self.timers
            .defer_frames(self.config.appear_delay_frames, CardEffect::StartAppear);
    }

    /// Start using a new card image. The caller loads it and reports back
    /// with [`texture_ready`](Self::texture_ready).
    pub fn set_texture(&mut self, path: impl Into<String>) -> TextureRequest {
        self.texture_generation += 1;
        TextureRequest {
            generation: self.texture_generation,
            path: path.into(),
        }
    }

    /// Bind a loaded texture. Results for anything but the newest request
    /// are dropped. Returns true if the texture was bound.
    pub fn texture_ready(&mut self, generation: u64, info: TextureInfo, now_ms: f64) -> bool {
        if self.state == CardState::Disposed {
            return false;
        }
        if generation != self.texture_generation {
            debug!("Dropping stale texture '{}' (generation {})", info.path, generation);
            return false;
        }

        self.previous_texture = self.texture.take();
        self.face
            .begin_transition(now_ms, self.previous_texture.is_some());
        info!("Card texture '{}' ({}x{})", info.path, info.width, info.height);
        self.texture = Some(info);
        self.apply_materials();

        // Re-bind on the next two frames as well
        self.timers.defer_frames(1, CardEffect::ReapplyMaterials);
        self.timers.defer_frames(2, CardEffect::ReapplyMaterials);
        true
    }

    pub fn texture_failed(&mut self, generation: u64, reason: &str) {
        if generation == self.texture_generation {
            warn!("Card texture failed to load: {}", reason);
        }
    }

    /// Derive UVs and texture regions for every mesh from the face renderer
    fn apply_materials(&mut self) {
        self.material_version += 1;
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        let rest = scene.rest_matrices();
        let world_positions: Vec<Vec<[f32; 3]>> = scene
            .meshes
            .iter()
            .map(|mesh| {
                let m = mesh.node.and_then(|n| rest.get(n)).copied().unwrap_or(Mat4::IDENTITY);
                mesh.base_positions
                    .iter()
                    .map(|p| m.transform_point3(Vec3::from_array(*p)).to_array())
                    .collect()
            })
            .collect();
        let bounds: Vec<MeshBounds> = world_positions
            .iter()
            .map(|p| {
                MeshBounds::from_positions(p).unwrap_or(MeshBounds {
                    min: [0.0; 3],
                    max: [0.0; 3],
                })
            })
            .collect();
        let Some(card_bounds) = bounds.iter().copied().reduce(|a, b| a.union(&b)) else {
            return;
        };

        for ((mesh, positions), b) in scene.meshes.iter_mut().zip(&world_positions).zip(&bounds) {
            let face_mesh = FaceMesh {
                positions,
                uvs: &mesh.uvs,
                bounds: *b,
            };
            if let Some(uvs) = self.face.project_uvs(&face_mesh, &card_bounds) {
                mesh.uvs = uvs;
                mesh.vertex_version += 1;
            }
        }

        self.regions = self.face.regions(&bounds);
        debug!(
            "Applied '{}' face to {} meshes",
            self.face.name(),
            self.regions.len()
        );
    }

    /// Drive the tear clip. Re-triggering while the latch is held does
    /// nothing; clearing `tearing` releases the latch.
    pub fn set_tearing(&mut self, tearing: bool) -> bool {
        if !tearing {
            self.is_tearing = false;
            self.tear_latch = false;
            return false;
        }

        self.is_tearing = true;
        if self.tear_latch || self.state == CardState::Disposed {
            return false;
        }
        self.tear_latch = true;
        if self.state != CardState::Sliding {
            self.state = CardState::Tearing;
        }

        match self.tear_clip.and_then(|i| self.clips.get(i)) {
            Some(clip) => {
                info!("Playing tear clip '{}' at {}x", clip.name, self.config.tear_time_scale);
                self.tear_action.play();
            }
            None => debug!("No tear clip to play"),
        }
        true
    }

    /// Begin the slide-out. Only a tearing card can slide.
    pub fn start_slide(&mut self, now_ms: f64) -> bool {
        if !self.is_tearing || self.state != CardState::Tearing {
            debug!("Ignoring slide request in {:?}", self.state);
            return false;
        }
        self.state = CardState::Sliding;
        self.slide_watch.start(now_ms);
        true
    }

    /// Drain completion events raised since the last call
    pub fn take_events(&mut self) -> Vec<CardEvent> {
        self.events.drain()
    }

    fn handle_effect(&mut self, effect: CardEffect, now_ms: f64) {
        match effect {
            CardEffect::StartAppear => {
                self.state = CardState::Appearing;
                self.appear = Some(Tween::new(
                    now_ms,
                    self.config.appear_ms,
                    0.0,
                    1.0,
                    Easing::EaseOutCubic,
                ));
            }
            CardEffect::ReapplyMaterials => {
                self.material_version += 1;
            }
        }
    }

    pub fn draw_list(&self) -> Vec<MeshDraw<'_>> {
        let (Some(scene), Some(texture)) = (self.scene.as_ref(), self.texture.as_ref()) else {
            return Vec::new();
        };
        if matches!(self.state, CardState::Hidden | CardState::Disposed)
            || self.scale <= 0.0
            || self.opacity <= 0.0
        {
            return Vec::new();
        }

        let position = Vec3::from_array(self.config.position) + Vec3::new(0.0, self.offset_y, 0.0);
        let group = Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.rotation_y),
            position,
        );
        let world = scene.world_matrices();
        let previous = self.previous_texture.as_ref().unwrap_or(texture);
        let blend = self.face.blend(self.now_ms);

        scene
            .meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| {
                let node = mesh.node.and_then(|n| world.get(n)).copied().unwrap_or(Mat4::IDENTITY);
                MeshDraw {
                    mesh_index: i,
                    model: group * node,
                    region: self.regions.get(i).copied().unwrap_or(TextureRegion::FULL),
                    opacity: self.opacity,
                    mode: self.face.mode(),
                    blend,
                    texture: &texture.path,
                    previous_texture: if blend >= 1.0 { &texture.path } else { &previous.path },
                    vertex_version: mesh.vertex_version,
                    material_version: self.material_version,
                }
            })
            .collect()
    }
}

impl RuntimeSystem for CardModel {
    fn update(&mut self, now_ms: f64, dt: f64) -> Result<()> {
        if self.state == CardState::Disposed {
            return Ok(());
        }
        self.now_ms = now_ms;

        for effect in self.timers.drain_due(now_ms) {
            self.handle_effect(effect, now_ms);
        }

        if let Some(appear) = self.appear {
            let eased = appear.value(now_ms) as f32;
            self.scale = eased * self.config.base_scale;
            self.rotation_y = eased * TAU;
            if appear.is_finished(now_ms) {
                self.appear = None;
                if self.state == CardState::Appearing {
                    self.state = CardState::Idle;
                }
                if !self.appear_notified {
                    self.appear_notified = true;
                    self.events.push(CardEvent::AppearComplete);
                }
            }
        }

        if let Some(clip) = self.tear_clip.and_then(|i| self.clips.get(i)) {
            if let Some(sample) = self.tear_action.advance(clip, dt) {
                if let Some(scene) = self.scene.as_mut() {
                    for (node, property, value) in &sample.values {
                        scene.apply(*node, *property, value);
                    }
                }
                if sample.finished_now {
                    self.events.push(CardEvent::TearFinished);
                }
            }
        }

        if self.state == CardState::Sliding {
            let sample = self.config.slide.sample(self.slide_watch.elapsed_ms(now_ms));
            self.offset_y = sample.offset_y;
            self.opacity = sample.opacity;
            if sample.finished && !self.slide_finished {
                self.slide_finished = true;
                self.events.push(CardEvent::SlideFinished);
            }
        }

        self.timers.end_frame();
        Ok(())
    }

    fn unmount(&mut self) {
        if self.state == CardState::Disposed {
            return;
        }
        self.state = CardState::Disposed;
        self.timers.shutdown();
        self.scene = None;
        self.texture = None;
        self.previous_texture = None;
        let _ = self.events.drain();
        debug!("Card model disposed");
    }

    fn is_mounted(&self) -> bool {
        self.state != CardState::Disposed
    }

    fn name(&self) -> &str {
        "card"
    }
}
