//! Slide-out profile for the torn card
//!
//! The card leaves the stage in three phases over a fixed total duration:
//! a slow drop, a fast drop that covers the rest of the distance, then a
//! fade to transparent while it holds below the stage.

use crate::easing::Easing;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlideProfile {
    pub total_ms: f64,
    /// World units travelled downward
    pub distance: f32,
    /// Fraction of `total_ms` spent in the slow drop
    pub slow_time: f64,
    /// Fraction of `distance` covered by the slow drop
    pub slow_distance: f32,
    /// Fraction of `total_ms` at which the fast drop ends and the fade begins
    pub fade_start: f64,
}

impl Default for SlideProfile {
    fn default() -> Self {
        Self {
            total_ms: 4000.0,
            distance: 30.0,
            slow_time: 0.35,
            slow_distance: 0.1,
            fade_start: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideSample {
    /// Downward offset from the starting Y (always <= 0)
    pub offset_y: f32,
    pub opacity: f32,
    pub finished: bool,
}

impl SlideProfile {
    pub fn sample(&self, elapsed_ms: f64) -> SlideSample {
        if self.total_ms <= 0.0 {
            return SlideSample {
                offset_y: -self.distance,
                opacity: 0.0,
                finished: true,
            };
        }

        let t = (elapsed_ms / self.total_ms).clamp(0.0, 1.0);
        let slow_time = self.slow_time.clamp(0.0, 1.0);
        let fade_start = self.fade_start.clamp(slow_time, 1.0);
        let slow_distance = self.slow_distance.clamp(0.0, 1.0);

        let travelled = if t < slow_time {
            let local = t / slow_time;
            slow_distance * Easing::EaseInOutCubic.apply(local) as f32
        } else if t < fade_start {
            let local = (t - slow_time) / (fade_start - slow_time);
            slow_distance + (1.0 - slow_distance) * Easing::EaseInQuad.apply(local) as f32
        } else {
            1.0
        };

        let opacity = if t < fade_start || fade_start >= 1.0 {
            if t >= 1.0 { 0.0 } else { 1.0 }
        } else {
            1.0 - ((t - fade_start) / (1.0 - fade_start)) as f32
        };

        SlideSample {
            offset_y: -travelled * self.distance,
            opacity: opacity.clamp(0.0, 1.0),
            finished: t >= 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_place_and_opaque() {
        let s = SlideProfile::default().sample(0.0);
        assert_eq!(s.offset_y, 0.0);
        assert_eq!(s.opacity, 1.0);
        assert!(!s.finished);
    }

    #[test]
    fn slow_phase_covers_small_distance() {
        let profile = SlideProfile::default();
        let s = profile.sample(0.35 * 4000.0);
        assert!((s.offset_y + 3.0).abs() < 1e-4);
        assert_eq!(s.opacity, 1.0);
    }

    #[test]
    fn fast_phase_reaches_full_distance() {
        let s = SlideProfile::default().sample(3000.0);
        assert!((s.offset_y + 30.0).abs() < 1e-4);
        assert_eq!(s.opacity, 1.0);
    }

    #[test]
    fn fades_out_at_the_end() {
        let profile = SlideProfile::default();
        let mid = profile.sample(3500.0);
        assert!((mid.opacity - 0.5).abs() < 1e-5);
        let end = profile.sample(4000.0);
        assert_eq!(end.opacity, 0.0);
        assert!(end.finished);
        assert_eq!(profile.sample(10_000.0), end);
    }

    #[test]
    fn offset_never_rises() {
        let profile = SlideProfile::default();
        let mut prev = 0.0;
        for ms in (0..=4000).step_by(10) {
            let s = profile.sample(ms as f64);
            assert!(s.offset_y <= prev + 1e-6);
            prev = s.offset_y;
        }
    }
}
