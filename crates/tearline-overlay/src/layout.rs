//! Stage layout in window pixels
//!
//! The 3D card, the flip card and the tear trigger share one centre. The
//! card is a fixed height with its width taken from the card image.

use tearline_core::Rect;

pub const CARD_HEIGHT: f32 = 400.0;
/// Flip card is this much narrower than the card it replaces
pub const FLIP_CARD_INSET: f32 = 20.0;
const TEAR_TRIGGER_RADIUS: f32 = 36.0;
const GRAIL_WIDTH: f32 = 320.0;
const GRAIL_TOP_MARGIN: f32 = 48.0;

/// Circular hit area that starts the tear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TearTrigger {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
}

impl TearTrigger {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        let dx = px - self.cx;
        let dy = py - self.cy;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageLayout {
    pub width: f32,
    pub height: f32,
    pub card: Rect,
    pub flip_card: Rect,
    pub grail: Rect,
    pub tear_trigger: TearTrigger,
}

impl StageLayout {
    /// Lay out a `width`×`height` window for a card image with the given
    /// aspect ratio (width / height); unknown aspects count as square.
    pub fn compute(width: f32, height: f32, image_aspect: Option<f32>) -> Self {
        let aspect = image_aspect.filter(|a| a.is_finite() && *a > 0.0).unwrap_or(1.0);
        let (cx, cy) = (width * 0.5, height * 0.5);

        let card_w = CARD_HEIGHT * aspect;
        let card = Rect::centered(cx, cy, card_w, CARD_HEIGHT);

        let flip_w = (card_w - FLIP_CARD_INSET).max(0.0);
        let flip_h = if card_w > 0.0 { CARD_HEIGHT * flip_w / card_w } else { 0.0 };
        let flip_card = Rect::centered(cx, cy, flip_w, flip_h);

        let grail_h = GRAIL_WIDTH * 1.4;
        let grail = Rect::new(cx - GRAIL_WIDTH * 0.5, GRAIL_TOP_MARGIN, GRAIL_WIDTH, grail_h);

        Self {
            width,
            height,
            card,
            flip_card,
            grail,
            tear_trigger: TearTrigger {
                cx,
                cy,
                radius: TEAR_TRIGGER_RADIUS,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_width_follows_image_aspect() {
        let layout = StageLayout::compute(1280.0, 720.0, Some(0.75));
        assert_eq!(layout.card.width, 300.0);
        assert_eq!(layout.card.height, 400.0);
        assert_eq!(layout.card.center(), (640.0, 360.0));
    }

    #[test]
    fn unknown_aspect_is_square() {
        let layout = StageLayout::compute(800.0, 600.0, None);
        assert_eq!(layout.card.width, 400.0);
        let layout = StageLayout::compute(800.0, 600.0, Some(f32::NAN));
        assert_eq!(layout.card.width, 400.0);
    }

    #[test]
    fn flip_card_is_narrower_and_proportional() {
        let layout = StageLayout::compute(1280.0, 720.0, Some(0.75));
        assert_eq!(layout.flip_card.width, 280.0);
        let expected_h = 400.0 * 280.0 / 300.0;
        assert!((layout.flip_card.height - expected_h).abs() < 1e-4);
        assert_eq!(layout.flip_card.center(), layout.card.center());
    }

    #[test]
    fn tear_trigger_sits_at_card_centre() {
        let layout = StageLayout::compute(1000.0, 800.0, Some(0.7));
        assert!(layout.tear_trigger.contains(500.0, 400.0));
        assert!(layout.tear_trigger.contains(520.0, 420.0));
        assert!(!layout.tear_trigger.contains(600.0, 400.0));
    }
}
