//! Easing curves
//!
//! Every curve clamps its input to [0, 1] so frame-timing overshoot never
//! pushes an animated value past its target.

use serde::{Deserialize, Serialize};

/// Canonical ease-out cubic: `1 - (1 - t)^3`
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseInQuad,
    #[default]
    EaseOutCubic,
    EaseInOutCubic,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutCubic => ease_out_cubic(t),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::EaseInQuad,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
    ];

    #[test]
    fn ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn ease_out_cubic_is_monotonic() {
        let mut prev = ease_out_cubic(0.0);
        for i in 1..=1000 {
            let v = ease_out_cubic(i as f64 / 1000.0);
            assert!(v >= prev, "decreased at step {}", i);
            prev = v;
        }
    }

    #[test]
    fn input_is_clamped() {
        for easing in ALL {
            assert_eq!(easing.apply(-0.5), 0.0);
            assert_eq!(easing.apply(1.7), 1.0);
        }
    }

    #[test]
    fn curves_hit_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-12, "{:?}", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12, "{:?}", easing);
        }
    }

    #[test]
    fn deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            easing: Easing,
        }
        let w: Wrapper = toml::from_str("easing = \"ease_in_quad\"").unwrap();
        assert_eq!(w.easing, Easing::EaseInQuad);
    }
}
