//! Animation phases and the transition table
//!
//! Every cross-component step of the choreography is one row here:
//! `(phase, event) → (next phase, immediate effects, delayed events)`.
//! Overlaps such as the slide starting before the tear clip ends are rows
//! with several delayed events, not timing coincidences.

use crate::config::TimingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnimationPhase {
    Idle,
    VideoPlaying,
    CardRevealed,
    RotationComplete,
    Tearing,
    Sliding,
    Complete,
}

impl AnimationPhase {
    /// The 3D card is mounted from `CardRevealed` on
    pub fn card_visible(self) -> bool {
        self >= AnimationPhase::CardRevealed
    }

    pub fn tear_trigger_visible(self) -> bool {
        self == AnimationPhase::RotationComplete
    }

    pub fn is_tearing(self) -> bool {
        self >= AnimationPhase::Tearing
    }
}

/// Inputs to the table. The `*Due` events only come from the timer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    VideoStarted,
    ShowCardDue,
    ModelAppearComplete,
    TearTriggered,
    IntroSpinDue,
    SlideDue,
    PokedexRevealDue,
    FlipRevealComplete,
}

/// Work the owner of the sequencer carries out in response to a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Mount the 3D card and begin its appear tween
    ShowCard,
    ShowTearTrigger,
    /// Play the tear clip
    StartTear,
    /// Decorative spin of the revealed artwork
    IntroSpin,
    StartSlide,
    StartFlipEntrance,
    StartSunburst,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: AnimationPhase,
    pub effects: Vec<Effect>,
    /// `(delay_ms, event)` pairs fed back into the table later
    pub schedule: Vec<(f64, PhaseEvent)>,
}

impl Transition {
    fn to(next: AnimationPhase) -> Self {
        Self {
            next,
            effects: Vec::new(),
            schedule: Vec::new(),
        }
    }

    fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    fn after(mut self, delay_ms: f64, event: PhaseEvent) -> Self {
        self.schedule.push((delay_ms, event));
        self
    }
}

/// Look up the row for `(phase, event)`. `None` means the event is ignored
/// in that phase; this is how double triggers become no-ops.
pub fn transition(
    phase: AnimationPhase,
    event: PhaseEvent,
    timing: &TimingConfig,
) -> Option<Transition> {
    use AnimationPhase::*;
    use PhaseEvent::*;

    let row = match (phase, event) {
        (Idle, VideoStarted) => {
            Transition::to(VideoPlaying).after(timing.show_card_ms, ShowCardDue)
        }
        (VideoPlaying, ShowCardDue) => Transition::to(CardRevealed).effect(Effect::ShowCard),
        (CardRevealed, ModelAppearComplete) => {
            Transition::to(RotationComplete).effect(Effect::ShowTearTrigger)
        }
        (RotationComplete, TearTriggered) => Transition::to(Tearing)
            .effect(Effect::StartTear)
            .after(timing.intro_spin_ms, IntroSpinDue)
            .after(timing.tear_to_slide_ms, SlideDue)
            .after(timing.pokedex_reveal_ms, PokedexRevealDue),
        (Tearing | Sliding | Complete, IntroSpinDue) => {
            Transition::to(phase).effect(Effect::IntroSpin)
        }
        (Tearing, SlideDue) => Transition::to(Sliding).effect(Effect::StartSlide),
        (Tearing | Sliding, PokedexRevealDue) => {
            Transition::to(phase).effect(Effect::StartFlipEntrance)
        }
        (Tearing | Sliding, FlipRevealComplete) => {
            Transition::to(Complete).effect(Effect::StartSunburst)
        }
        _ => return None,
    };
    Some(row)
}
