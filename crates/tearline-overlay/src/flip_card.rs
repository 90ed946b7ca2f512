//! Flip card controller
//!
//! Pointer tilt, click-to-flip and the entrance that reveals the card after
//! the tear. Rotations are in degrees.

use tearline_animation::{Easing, Tween};
use tearline_core::{Rect, Result, Tilt};
use tearline_runtime::{EventBus, RuntimeSystem};
use tracing::{debug, info};

/// Tilt at the edge of the card on either axis
pub const MAX_TILT_DEG: f32 = 24.0;

const ENTRANCE_START_SCALE: f32 = 0.6;
const ENTRANCE_TURN_DEG: f32 = 360.0;

/// Map a pointer offset in `[-0.5, 0.5]²` (from the card centre, y down)
/// to a tilt. The edges reach [`MAX_TILT_DEG`]; the top edge pitches toward
/// the viewer and the left edge turns toward the viewer.
pub fn tilt_from_offset(x: f32, y: f32) -> Tilt {
    let x = (x * 2.0).clamp(-1.0, 1.0);
    let y = (y * 2.0).clamp(-1.0, 1.0);
    Tilt::new(-y * MAX_TILT_DEG, x * MAX_TILT_DEG)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipCardEvent {
    /// Entrance finished; fires once per card
    RevealComplete,
}

/// Resolved transform for rendering the flip card this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipTransform {
    pub scale: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
}

impl FlipTransform {
    /// True when the back face points at the viewer
    pub fn shows_back(&self) -> bool {
        let y = self.rotation_y.rem_euclid(360.0);
        y > 90.0 && y < 270.0
    }
}

pub struct FlipCard {
    bounds: Rect,
    tilt: Tilt,
    flipped: bool,
    flip_guard_ms: f64,
    flip: Option<Tween<f32>>,
    entrance_ms: f64,
    entrance: Option<Tween<f64>>,
    entrance_started: bool,
    reveal_complete: bool,
    events: EventBus<FlipCardEvent>,
    now_ms: f64,
    mounted: bool,
}

impl FlipCard {
    pub fn new(entrance_ms: f64, flip_guard_ms: f64) -> Self {
        Self {
            bounds: Rect::default(),
            tilt: Tilt::ZERO,
            flipped: false,
            flip_guard_ms: flip_guard_ms.max(0.0),
            flip: None,
            entrance_ms: entrance_ms.max(0.0),
            entrance: None,
            entrance_started: false,
            reveal_complete: false,
            events: EventBus::new(),
            now_ms: 0.0,
            mounted: true,
        }
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn tilt(&self) -> Tilt {
        self.tilt
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn is_reveal_complete(&self) -> bool {
        self.reveal_complete
    }

    pub fn entrance_started(&self) -> bool {
        self.entrance_started
    }

    /// A flip is still turning; tilt input is ignored meanwhile
    pub fn is_flipping(&self, now_ms: f64) -> bool {
        self.flip.is_some_and(|f| !f.is_finished(now_ms))
    }

    /// Update the tilt from a pointer position in window pixels
    pub fn pointer_move(&mut self, px: f32, py: f32, now_ms: f64) {
        if !self.mounted || self.is_flipping(now_ms) {
            return;
        }
        if let Some((x, y)) = self.bounds.normalized_offset(px, py) {
            self.tilt = tilt_from_offset(x, y);
        }
    }

    pub fn pointer_leave(&mut self, now_ms: f64) {
        if !self.mounted || self.is_flipping(now_ms) {
            return;
        }
        self.tilt = Tilt::ZERO;
    }

    /// Toggle the flip. Returns the new flipped state.
    pub fn click(&mut self, now_ms: f64) -> bool {
        if !self.mounted {
            return self.flipped;
        }
        let from = self.base_rotation(now_ms);
        self.flipped = !self.flipped;
        let to = if self.flipped { 180.0 } else { 0.0 };
        self.flip = Some(Tween::new(now_ms, self.flip_guard_ms, from, to, Easing::EaseOutCubic));
        debug!("Flip card flipped={}", self.flipped);
        self.flipped
    }

    /// Begin the one-time reveal entrance. Later calls are ignored.
    pub fn start_entrance(&mut self, now_ms: f64) -> bool {
        if !self.mounted || self.entrance_started {
            return false;
        }
        self.entrance_started = true;
        self.entrance = Some(Tween::new(now_ms, self.entrance_ms, 0.0, 1.0, Easing::EaseOutCubic));
        info!("Flip card entrance started ({}ms)", self.entrance_ms);
        true
    }

    pub fn take_events(&mut self) -> Vec<FlipCardEvent> {
        self.events.drain()
    }

    fn base_rotation(&self, now_ms: f64) -> f32 {
        match self.flip {
            Some(flip) => flip.value(now_ms),
            None if self.flipped => 180.0,
            None => 0.0,
        }
    }

    pub fn transform(&self) -> FlipTransform {
        self.transform_at(self.now_ms)
    }

    pub fn transform_at(&self, now_ms: f64) -> FlipTransform {
        let (scale, reveal) = if self.reveal_complete {
            (1.0, ENTRANCE_TURN_DEG)
        } else if let Some(entrance) = self.entrance {
            let eased = entrance.value(now_ms) as f32;
            (
                ENTRANCE_START_SCALE + (1.0 - ENTRANCE_START_SCALE) * eased,
                ENTRANCE_TURN_DEG * eased,
            )
        } else {
            (ENTRANCE_START_SCALE, 0.0)
        };

        FlipTransform {
            scale,
            rotation_x: self.tilt.rot_x,
            rotation_y: self.base_rotation(now_ms) + self.tilt.rot_y + reveal,
        }
    }
}

impl RuntimeSystem for FlipCard {
    fn update(&mut self, now_ms: f64, _dt: f64) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }
        self.now_ms = now_ms;

        if self.flip.is_some_and(|f| f.is_finished(now_ms)) {
            self.flip = None;
        }

        if let Some(entrance) = self.entrance {
            if entrance.is_finished(now_ms) {
                self.entrance = None;
                self.reveal_complete = true;
                self.events.push(FlipCardEvent::RevealComplete);
                info!("Flip card reveal complete");
            }
        }
        Ok(())
    }

    fn unmount(&mut self) {
        self.mounted = false;
        self.entrance = None;
        self.flip = None;
        let _ = self.events.drain();
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn name(&self) -> &str {
        "flip_card"
    }
}
