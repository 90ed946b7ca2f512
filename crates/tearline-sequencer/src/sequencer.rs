//! Animation sequencer
//!
//! Sole owner of [`AnimationPhase`]. External callbacks and due timers both
//! go through [`transition`]; the resulting effects are returned to the
//! caller to carry out.

use tearline_runtime::TimerQueue;
use tracing::{debug, info};

use crate::config::TimingConfig;
use crate::phase::{transition, AnimationPhase, Effect, PhaseEvent};

pub struct Sequencer {
    phase: AnimationPhase,
    timing: TimingConfig,
    timers: TimerQueue<PhaseEvent>,
    assets_ready: bool,
    intro_spin_played: bool,
    flip_entrance_started: bool,
    mounted: bool,
}

impl Sequencer {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            phase: AnimationPhase::Idle,
            timing,
            timers: TimerQueue::new(),
            assets_ready: false,
            intro_spin_played: false,
            flip_entrance_started: false,
            mounted: true,
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn assets_ready(&self) -> bool {
        self.assets_ready
    }

    pub fn intro_spin_played(&self) -> bool {
        self.intro_spin_played
    }

    pub fn flip_entrance_started(&self) -> bool {
        self.flip_entrance_started
    }

    /// Critical assets resolved; the video may now drive the sequence
    pub fn set_assets_ready(&mut self) {
        if !self.assets_ready {
            debug!("Sequencer: critical assets ready");
        }
        self.assets_ready = true;
    }

    /// Feed the polled video position. The first positive time starts the
    /// sequence, provided the critical assets are in.
    pub fn on_video_time_advance(&mut self, now_ms: f64, current_time: f64) -> Vec<Effect> {
        if !self.assets_ready || current_time <= 0.0 || self.phase != AnimationPhase::Idle {
            return Vec::new();
        }
        self.dispatch(now_ms, PhaseEvent::VideoStarted)
    }

    /// The 3D card finished its intro spin-and-scale
    pub fn on_model_appear_complete(&mut self, now_ms: f64) -> Vec<Effect> {
        self.dispatch(now_ms, PhaseEvent::ModelAppearComplete)
    }

    pub fn on_tear_triggered(&mut self, now_ms: f64) -> Vec<Effect> {
        self.dispatch(now_ms, PhaseEvent::TearTriggered)
    }

    /// The flip card's entrance finished
    pub fn on_flip_reveal_complete(&mut self, now_ms: f64) -> Vec<Effect> {
        self.dispatch(now_ms, PhaseEvent::FlipRevealComplete)
    }

    /// Fire every timer due at `now_ms`. Call once per frame.
    pub fn update(&mut self, now_ms: f64) -> Vec<Effect> {
        let due = self.timers.drain_due(now_ms);
        let mut effects = Vec::new();
        for event in due {
            effects.extend(self.dispatch(now_ms, event));
        }
        self.timers.end_frame();
        effects
    }

    fn dispatch(&mut self, now_ms: f64, event: PhaseEvent) -> Vec<Effect> {
        if !self.mounted {
            return Vec::new();
        }
        let Some(row) = transition(self.phase, event, &self.timing) else {
            debug!("Sequencer: {:?} ignored in {:?}", event, self.phase);
            return Vec::new();
        };

        if row.next != self.phase {
            info!("Phase {:?} -> {:?} ({:?})", self.phase, row.next, event);
            self.phase = row.next;
        }
        for (delay_ms, scheduled) in &row.schedule {
            self.timers.schedule(now_ms, *delay_ms, *scheduled);
        }

        let mut effects = Vec::with_capacity(row.effects.len());
        for effect in row.effects {
            match effect {
                Effect::IntroSpin if self.intro_spin_played => continue,
                Effect::IntroSpin => self.intro_spin_played = true,
                Effect::StartFlipEntrance if self.flip_entrance_started => continue,
                Effect::StartFlipEntrance => self.flip_entrance_started = true,
                _ => {}
            }
            effects.push(effect);
        }
        effects
    }

    /// Return to `Idle` for a replay. Pending timers and latches are
    /// dropped; asset readiness is kept.
    pub fn reset(&mut self) {
        info!("Phase {:?} -> Idle (reset)", self.phase);
        self.phase = AnimationPhase::Idle;
        self.timers.clear();
        self.intro_spin_played = false;
        self.flip_entrance_started = false;
    }

    /// Stop for good; nothing scheduled fires afterwards
    pub fn shutdown(&mut self) {
        self.mounted = false;
        self.timers.shutdown();
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> Sequencer {
        let mut seq = Sequencer::new(TimingConfig::default());
        seq.set_assets_ready();
        seq
    }

    /// Drive the sequencer to `RotationComplete`, returning the clock
    fn to_rotation_complete(seq: &mut Sequencer) -> f64 {
        seq.on_video_time_advance(0.0, 0.05);
        assert_eq!(seq.update(1000.0), vec![Effect::ShowCard]);
        assert_eq!(seq.on_model_appear_complete(2600.0), vec![Effect::ShowTearTrigger]);
        2600.0
    }

    #[test]
    fn waits_for_assets_and_positive_time() {
        let mut seq = Sequencer::new(TimingConfig::default());
        seq.on_video_time_advance(0.0, 0.5);
        assert_eq!(seq.phase(), AnimationPhase::Idle);

        seq.set_assets_ready();
        seq.on_video_time_advance(0.0, 0.0);
        assert_eq!(seq.phase(), AnimationPhase::Idle);
        seq.on_video_time_advance(10.0, 0.01);
        assert_eq!(seq.phase(), AnimationPhase::VideoPlaying);
    }

    #[test]
    fn card_shows_one_second_after_video_starts() {
        let mut seq = ready();
        seq.on_video_time_advance(100.0, 0.1);
        assert!(seq.update(1099.0).is_empty());
        assert_eq!(seq.phase(), AnimationPhase::VideoPlaying);
        assert_eq!(seq.update(1100.0), vec![Effect::ShowCard]);
        assert_eq!(seq.phase(), AnimationPhase::CardRevealed);

        // Later video ticks do nothing
        seq.on_video_time_advance(1200.0, 1.2);
        assert_eq!(seq.pending_timers(), 0);
    }

    #[test]
    fn appear_complete_before_reveal_is_ignored() {
        let mut seq = ready();
        assert!(seq.on_model_appear_complete(0.0).is_empty());
        assert_eq!(seq.phase(), AnimationPhase::Idle);
    }

    #[test]
    fn double_tear_runs_once() {
        let mut seq = ready();
        let now = to_rotation_complete(&mut seq);
        assert_eq!(seq.on_tear_triggered(now), vec![Effect::StartTear]);
        assert!(seq.on_tear_triggered(now).is_empty());
        assert_eq!(seq.pending_timers(), 3);
    }

    #[test]
    fn slide_overlaps_tear_then_reveal() {
        let mut seq = ready();
        let now = to_rotation_complete(&mut seq);
        seq.on_tear_triggered(now);

        assert!(seq.update(now + 999.0).is_empty());
        assert_eq!(seq.update(now + 1000.0), vec![Effect::StartSlide]);
        assert_eq!(seq.phase(), AnimationPhase::Sliding);
        assert!(!seq.flip_entrance_started());

        let effects = seq.update(now + 1500.0);
        assert_eq!(effects, vec![Effect::IntroSpin, Effect::StartFlipEntrance]);
        assert!(seq.intro_spin_played());
        assert!(seq.flip_entrance_started());

        assert_eq!(seq.on_flip_reveal_complete(now + 3000.0), vec![Effect::StartSunburst]);
        assert_eq!(seq.phase(), AnimationPhase::Complete);
        assert!(seq.on_flip_reveal_complete(now + 3100.0).is_empty());
    }

    #[test]
    fn reset_allows_replay() {
        let mut seq = ready();
        let now = to_rotation_complete(&mut seq);
        seq.on_tear_triggered(now);
        seq.reset();
        assert_eq!(seq.phase(), AnimationPhase::Idle);
        assert_eq!(seq.pending_timers(), 0);
        assert!(seq.assets_ready());

        assert!(seq.update(now + 5000.0).is_empty());
        seq.on_video_time_advance(now + 5000.0, 0.1);
        assert_eq!(seq.phase(), AnimationPhase::VideoPlaying);
    }

    #[test]
    fn shutdown_silences_timers() {
        let mut seq = ready();
        seq.on_video_time_advance(0.0, 0.1);
        seq.shutdown();
        assert!(seq.update(5000.0).is_empty());
        assert_eq!(seq.phase(), AnimationPhase::VideoPlaying);
    }
}
