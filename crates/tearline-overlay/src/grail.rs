//! Grail overlay card
//!
//! Descends from above the window and grows to full size over the last
//! seconds of the intro video. Progress comes from
//! [`VideoTimeline::grail_progress`](tearline_runtime::VideoTimeline::grail_progress).

use serde::{Deserialize, Serialize};
use tearline_animation::ease_out_cubic;

/// Vertical travel, as a percentage of the card's own height
const DESCENT_PERCENT: f32 = -160.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrailCard {
    pub initial_scale: f32,
    /// Seconds before the end of the descent at which the card starts growing
    pub expand_start_before_end: f64,
    pub expand_duration: f64,
    /// Length of the descent in seconds
    pub appearance: f64,
}

impl Default for GrailCard {
    fn default() -> Self {
        Self {
            initial_scale: 0.9,
            expand_start_before_end: 1.5,
            expand_duration: 1.5,
            appearance: 1.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrailTransform {
    pub visible: bool,
    pub translate_y_percent: f32,
    pub scale: f32,
}

impl GrailCard {
    pub fn transform(&self, visible: bool, progress: f64) -> GrailTransform {
        let progress = progress.clamp(0.0, 1.0);
        let appearance = self.appearance.max(f64::EPSILON);
        let expand_start = (1.0 - self.expand_start_before_end / appearance).max(0.0);
        let expand_span = self.expand_duration / appearance;

        let mut scale = self.initial_scale;
        if progress >= expand_start {
            let t = if expand_span > 0.0 {
                ((progress - expand_start) / expand_span).min(1.0)
            } else {
                1.0
            };
            scale = self.initial_scale + (1.0 - self.initial_scale) * ease_out_cubic(t) as f32;
            if progress >= 1.0 {
                scale = 1.0;
            }
        }

        GrailTransform {
            visible,
            translate_y_percent: (1.0 - ease_out_cubic(progress) as f32) * DESCENT_PERCENT,
            scale,
        }
    }
}
