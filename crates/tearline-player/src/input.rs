//! Window input to session pointer actions
//!
//! Positions arrive in physical pixels and leave in logical pixels, the
//! space the stage layout is computed in. A click is a left-button (or
//! touch) release that follows a press inside the window.

use winit::event::TouchPhase;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    Move { x: f32, y: f32 },
    Leave,
    /// Button or finger went down; counts as a playback gesture
    Press { touch: bool },
    Click { x: f32, y: f32 },
}

#[derive(Debug)]
pub struct PointerTracker {
    position: Option<(f32, f32)>,
    pressed: bool,
    scale_factor: f64,
}

impl PointerTracker {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            position: None,
            pressed: false,
            scale_factor: if scale_factor > 0.0 { scale_factor } else { 1.0 },
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn position(&self) -> Option<(f32, f32)> {
        self.position
    }

    fn to_logical(&self, physical: (f64, f64)) -> (f32, f32) {
        (
            (physical.0 / self.scale_factor) as f32,
            (physical.1 / self.scale_factor) as f32,
        )
    }

    pub fn cursor_moved(&mut self, physical: (f64, f64)) -> PointerAction {
        let (x, y) = self.to_logical(physical);
        self.position = Some((x, y));
        PointerAction::Move { x, y }
    }

    pub fn cursor_left(&mut self) -> PointerAction {
        self.position = None;
        self.pressed = false;
        PointerAction::Leave
    }

    /// Primary button state change
    pub fn button(&mut self, pressed: bool) -> Option<PointerAction> {
        if pressed {
            self.pressed = true;
            return Some(PointerAction::Press { touch: false });
        }
        let was_pressed = std::mem::replace(&mut self.pressed, false);
        match (was_pressed, self.position) {
            (true, Some((x, y))) => Some(PointerAction::Click { x, y }),
            _ => None,
        }
    }

    pub fn touch(&mut self, phase: TouchPhase, physical: (f64, f64)) -> Vec<PointerAction> {
        match phase {
            TouchPhase::Started => {
                self.pressed = true;
                vec![self.cursor_moved(physical), PointerAction::Press { touch: true }]
            }
            TouchPhase::Moved => vec![self.cursor_moved(physical)],
            TouchPhase::Ended => {
                let moved = self.cursor_moved(physical);
                let mut actions = vec![moved];
                actions.extend(self.button(false));
                actions.push(self.cursor_left());
                actions
            }
            TouchPhase::Cancelled => vec![self.cursor_left()],
        }
    }
}
