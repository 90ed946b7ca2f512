//! Tween descriptors
//!
//! A tween is plain data: when it started, how long it runs, the endpoints
//! and the curve. Owners store one per animated property and evaluate it
//! against the current clock each frame instead of scattering timestamp
//! math through callbacks.

use crate::easing::Easing;

/// Values that can be linearly interpolated
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for f32 {
    fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t as f32
    }
}

impl<const N: usize> Lerp for [f32; N] {
    fn lerp(self, other: Self, t: f64) -> Self {
        let mut out = self;
        for (o, b) in out.iter_mut().zip(other) {
            *o += (b - *o) * t as f32;
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween<T> {
    /// Clock time (ms) at which the tween begins
    pub start_ms: f64,
    pub duration_ms: f64,
    pub from: T,
    pub to: T,
    pub easing: Easing,
}

impl<T: Lerp> Tween<T> {
    pub fn new(start_ms: f64, duration_ms: f64, from: T, to: T, easing: Easing) -> Self {
        Self {
            start_ms,
            duration_ms,
            from,
            to,
            easing,
        }
    }

    /// Linear progress in [0, 1]; zero-length tweens are complete immediately
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return if now_ms >= self.start_ms { 1.0 } else { 0.0 };
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Eased progress in [0, 1]
    pub fn eased(&self, now_ms: f64) -> f64 {
        self.easing.apply(self.progress(now_ms))
    }

    pub fn value(&self, now_ms: f64) -> T {
        self.from.lerp(self.to, self.eased(now_ms))
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }

    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_from_before_start() {
        let tween = Tween::new(1000.0, 500.0, 0.6, 1.0, Easing::Linear);
        assert_eq!(tween.value(0.0), 0.6);
        assert!(!tween.is_finished(1000.0));
    }

    #[test]
    fn reaches_target_and_clamps() {
        let tween = Tween::new(0.0, 1500.0, 0.0f64, 1.0, Easing::EaseOutCubic);
        assert_eq!(tween.value(1500.0), 1.0);
        assert_eq!(tween.value(4000.0), 1.0);
        assert!(tween.is_finished(1500.0));
        assert_eq!(tween.end_ms(), 1500.0);
    }

    #[test]
    fn eased_midpoint() {
        let tween = Tween::new(0.0, 1000.0, 0.0f64, 360.0, Easing::EaseOutCubic);
        assert!((tween.value(500.0) - 315.0).abs() < 1e-9);
    }

    #[test]
    fn zero_duration_completes_at_start() {
        let tween = Tween::new(100.0, 0.0, 0.0f32, 1.0, Easing::Linear);
        assert_eq!(tween.value(99.0), 0.0);
        assert_eq!(tween.value(100.0), 1.0);
    }

    #[test]
    fn arrays_interpolate_componentwise() {
        let tween = Tween::new(0.0, 10.0, [0.0f32, 10.0, -4.0], [1.0, 20.0, 4.0], Easing::Linear);
        assert_eq!(tween.value(5.0), [0.5, 15.0, 0.0]);
    }
}
