//! CardAnimation - one pack-opening session
//!
//! Owns every animated component and runs them in a fixed order each frame:
//! preload, video, grail timeline, sequencer timers, card, flip card,
//! sunburst. Completion events flow back into the sequencer within the
//! same frame.

use std::sync::Arc;

use tearline_card::{CardEvent, CardModel, TextureInfo};
use tearline_core::Result;
use tearline_import::ImportResult;
use tearline_overlay::{FlipCard, FlipCardEvent, FlipTransform, GrailTransform, StageLayout};
use tearline_particles::SunburstSimulation;
use tearline_runtime::{AutoplayGuard, Interaction, RuntimeSystem, SyntheticVideo, VideoSource, VideoTimeline};
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::phase::{AnimationPhase, Effect};
use crate::preload::{preload, AssetLoader, AssetRequest, AssetStore, PreloadHandle};
use crate::sequencer::Sequencer;

/// Read-only view of the session for the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub phase: AnimationPhase,
    pub layout: StageLayout,
    pub tear_trigger_visible: bool,
    /// Set 1.5s into the tear, once per run
    pub intro_spin_played: bool,
    pub flip_visible: bool,
    pub flip: FlipTransform,
    pub grail: GrailTransform,
    pub sunburst_running: bool,
    pub video_time: f64,
    pub video_duration: Option<f64>,
    /// Playback was refused and is waiting for a user gesture
    pub awaiting_gesture: bool,
    pub failed: bool,
}

pub struct CardAnimation {
    config: SessionConfig,
    sequencer: Sequencer,
    video: Box<dyn VideoSource>,
    autoplay: AutoplayGuard,
    timeline: VideoTimeline,
    card: Option<CardModel>,
    flip: FlipCard,
    sunburst: SunburstSimulation,
    preload: Option<PreloadHandle>,
    assets: AssetStore,
    layout: StageLayout,
    viewport: (f32, f32, f32),
    last_ms: Option<f64>,
    failure: Option<String>,
    mounted: bool,
}

impl CardAnimation {
    pub fn new(config: SessionConfig, video: Box<dyn VideoSource>, preload: PreloadHandle) -> Self {
        let viewport = (1280.0, 720.0, 1.0);
        let mut sunburst = SunburstSimulation::new(config.sunburst());
        sunburst.set_viewport(viewport.0, viewport.1, viewport.2);
        let layout = StageLayout::compute(viewport.0, viewport.1, None);
        let mut flip = FlipCard::new(config.timing.entrance_ms, config.timing.flip_guard_ms);
        flip.set_bounds(layout.flip_card);

        Self {
            sequencer: Sequencer::new(config.timing.clone()),
            video,
            autoplay: AutoplayGuard::new(),
            timeline: VideoTimeline::new(config.grail.start_before_end, config.grail.card.appearance),
            card: None,
            flip,
            sunburst,
            preload: Some(preload),
            assets: AssetStore::default(),
            layout,
            viewport,
            last_ms: None,
            failure: None,
            mounted: true,
            config,
        }
    }

    /// Begin preloading the configured assets and build a session around a
    /// synthetic intro video
    pub fn start(config: SessionConfig, loader: Arc<dyn AssetLoader>) -> Self {
        let critical = vec![
            AssetRequest::image(config.assets.card_image.clone()),
            AssetRequest::model(config.assets.model.clone()),
        ];
        let optional = config
            .assets
            .optional_images()
            .into_iter()
            .map(AssetRequest::image)
            .collect();
        let handle = preload(loader, critical, optional);

        let mut video = SyntheticVideo::new(config.video.duration_secs)
            .with_playback_rate(config.video.playback_rate);
        if !config.video.autoplay_allowed {
            video = video.with_autoplay_blocked();
        }
        Self::new(config, Box::new(video), handle)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> AnimationPhase {
        self.sequencer.phase()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn card(&self) -> Option<&CardModel> {
        self.card.as_ref()
    }

    pub fn flip_card(&self) -> &FlipCard {
        &self.flip
    }

    pub fn sunburst(&self) -> &SunburstSimulation {
        &self.sunburst
    }

    pub fn sunburst_mut(&mut self) -> &mut SunburstSimulation {
        &mut self.sunburst
    }

    pub fn video(&self) -> &dyn VideoSource {
        self.video.as_ref()
    }

    pub fn autoplay(&self) -> &AutoplayGuard {
        &self.autoplay
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Optional assets loaded so far
    pub fn optional_assets(&self) -> AssetStore {
        self.preload
            .as_ref()
            .map(PreloadHandle::optional_assets)
            .unwrap_or_default()
    }

    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Window size in logical pixels plus the device pixel ratio
    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.viewport = (width, height, pixel_ratio);
        self.sunburst.set_viewport(width, height, pixel_ratio);
        self.relayout();
    }

    fn relayout(&mut self) {
        let aspect = self
            .assets
            .image(&self.config.assets.card_image)
            .map(|img| img.aspect());
        self.layout = StageLayout::compute(self.viewport.0, self.viewport.1, aspect);
        self.flip.set_bounds(self.layout.flip_card);
    }

    /// Advance the whole session to `now_ms`
    pub fn frame(&mut self, now_ms: f64) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }
        let dt = self
            .last_ms
            .map_or(0.0, |last| (now_ms - last).max(0.0) / 1000.0);
        self.last_ms = Some(now_ms);

        self.poll_preload();

        self.video.advance(dt);
        self.timeline.poll(self.video.as_ref());

        let mut effects = self
            .sequencer
            .on_video_time_advance(now_ms, self.video.current_time());
        effects.extend(self.sequencer.update(now_ms));
        self.apply_effects(effects, now_ms);

        let card_events = match self.card.as_mut() {
            Some(card) => {
                card.update(now_ms, dt)?;
                card.take_events()
            }
            None => Vec::new(),
        };
        for event in card_events {
            match event {
                CardEvent::AppearComplete => {
                    let effects = self.sequencer.on_model_appear_complete(now_ms);
                    self.apply_effects(effects, now_ms);
                }
                CardEvent::TearFinished => debug!("Tear clip finished"),
                CardEvent::SlideFinished => debug!("Card slid out"),
            }
        }

        self.flip.update(now_ms, dt)?;
        for event in self.flip.take_events() {
            match event {
                FlipCardEvent::RevealComplete => {
                    let effects = self.sequencer.on_flip_reveal_complete(now_ms);
                    self.apply_effects(effects, now_ms);
                }
            }
        }

        self.sunburst.update(now_ms, dt)?;
        Ok(())
    }

    fn poll_preload(&mut self) {
        let Some(outcome) = self.preload.as_mut().and_then(PreloadHandle::try_take) else {
            return;
        };
        match outcome {
            Ok(store) => {
                info!("Critical assets ready ({} loaded)", store.len());
                self.assets = store;
                self.sequencer.set_assets_ready();
                self.relayout();
                if let Err(e) = self.autoplay.start(self.video.as_mut()) {
                    error!("Video playback failed: {}", e);
                    self.failure = Some(e.to_string());
                }
            }
            Err(e) => {
                self.failure = Some(e.to_string());
            }
        }
    }

    fn apply_effects(&mut self, effects: Vec<Effect>, now_ms: f64) {
        for effect in effects {
            match effect {
                Effect::ShowCard => self.mount_card(now_ms),
                Effect::ShowTearTrigger => debug!("Tear trigger shown"),
                Effect::StartTear => {
                    if let Some(card) = self.card.as_mut() {
                        card.set_tearing(true);
                    }
                }
                Effect::IntroSpin => info!("Intro spin played"),
                Effect::StartSlide => {
                    if let Some(card) = self.card.as_mut() {
                        card.start_slide(now_ms);
                    }
                }
                Effect::StartFlipEntrance => {
                    self.flip.start_entrance(now_ms);
                }
                Effect::StartSunburst => self.sunburst.start(),
            }
        }
    }

    fn mount_card(&mut self, now_ms: f64) {
        let card_config = self.config.card_config();
        let mut card = match self.assets.model(&self.config.assets.model) {
            Some(model) => CardModel::mount(&model, card_config),
            None => {
                warn!("Card model {} is not loaded", self.config.assets.model.display());
                CardModel::mount(&ImportResult::default(), card_config)
            }
        };

        let image_path = &self.config.assets.card_image;
        let request = card.set_texture(image_path.display().to_string());
        match self.assets.image(image_path) {
            Some(image) => {
                let info = TextureInfo {
                    path: request.path.clone(),
                    width: image.width,
                    height: image.height,
                };
                card.texture_ready(request.generation, info, now_ms);
            }
            None => card.texture_failed(request.generation, "card image is not loaded"),
        }

        card.begin_appear();
        self.card = Some(card);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, now_ms: f64) {
        self.flip.pointer_move(x, y, now_ms);
    }

    pub fn pointer_leave(&mut self, now_ms: f64) {
        self.flip.pointer_leave(now_ms);
    }

    /// Route a click: the tear trigger while it is shown, otherwise the flip
    /// card once it is on stage. Every click also counts as a playback gesture.
    pub fn click(&mut self, x: f32, y: f32, now_ms: f64) {
        self.interaction(Interaction::Click);
        let phase = self.sequencer.phase();
        if phase.tear_trigger_visible() && self.layout.tear_trigger.contains(x, y) {
            self.trigger_tear(now_ms);
        } else if phase.is_tearing() && self.flip.bounds().contains(x, y) {
            self.flip.click(now_ms);
        }
    }

    pub fn trigger_tear(&mut self, now_ms: f64) {
        let effects = self.sequencer.on_tear_triggered(now_ms);
        self.apply_effects(effects, now_ms);
    }

    /// Returns true if the interaction started a blocked video
    pub fn interaction(&mut self, interaction: Interaction) -> bool {
        self.autoplay.on_interaction(interaction, self.video.as_mut())
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let phase = self.sequencer.phase();
        FrameSnapshot {
            phase,
            layout: self.layout,
            tear_trigger_visible: phase.tear_trigger_visible(),
            intro_spin_played: self.sequencer.intro_spin_played(),
            flip_visible: phase.is_tearing(),
            flip: self.flip.transform(),
            grail: self
                .config
                .grail
                .card
                .transform(self.timeline.grail_visible(), self.timeline.grail_progress()),
            sunburst_running: self.sunburst.is_running(),
            video_time: self.video.current_time(),
            video_duration: self.video.duration(),
            awaiting_gesture: self.autoplay.is_armed(),
            failed: self.failure.is_some(),
        }
    }

    /// Replay from the start with the assets already loaded
    pub fn reset(&mut self) {
        if !self.mounted {
            return;
        }
        info!("Session reset");
        self.sequencer.reset();
        if let Some(mut card) = self.card.take() {
            card.unmount();
        }
        self.flip.unmount();
        self.flip = FlipCard::new(self.config.timing.entrance_ms, self.config.timing.flip_guard_ms);
        self.flip.set_bounds(self.layout.flip_card);
        self.sunburst.unmount();
        self.sunburst = SunburstSimulation::new(self.config.sunburst());
        self.sunburst
            .set_viewport(self.viewport.0, self.viewport.1, self.viewport.2);
        self.timeline = VideoTimeline::new(
            self.config.grail.start_before_end,
            self.config.grail.card.appearance,
        );
        self.video.rewind();
        if self.sequencer.assets_ready() {
            if let Err(e) = self.autoplay.start(self.video.as_mut()) {
                error!("Video playback failed: {}", e);
                self.failure = Some(e.to_string());
            }
        }
    }

    /// Unmount everything. Later frames and inputs are ignored.
    pub fn shutdown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.sequencer.shutdown();
        if let Some(card) = self.card.as_mut() {
            card.unmount();
        }
        self.flip.unmount();
        self.sunburst.unmount();
        self.video.pause();
        self.autoplay.disarm();
        self.preload = None;
        info!("Session shut down");
    }
}
