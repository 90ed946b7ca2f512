//! Lightweight xorshift32 PRNG

use std::f32::consts::TAU;

pub struct ParticleRng {
    state: u32,
}

impl ParticleRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        // 24 bits fit exactly in an f32 mantissa, so the result never rounds up to 1.0
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Returns a float in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform angle in [0, 2π)
    pub fn angle(&mut self) -> f32 {
        self.next_f32() * TAU
    }

    /// Uniform value in [-1, 1)
    pub fn signed(&mut self) -> f32 {
        (self.next_f32() - 0.5) * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_range_bounds() {
        let mut rng = ParticleRng::new(42);
        for _ in 0..1000 {
            let v = rng.range(0.0, 10.0);
            assert!((0.0..10.0).contains(&v));
        }
    }

    #[test]
    fn unit_interval_is_half_open() {
        let mut rng = ParticleRng::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn signed_spans_both_sides() {
        let mut rng = ParticleRng::new(99);
        let values: Vec<f32> = (0..200).map(|_| rng.signed()).collect();
        assert!(values.iter().any(|v| *v < 0.0));
        assert!(values.iter().any(|v| *v > 0.0));
        assert!(values.iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn zero_seed_is_remapped() {
        let mut rng = ParticleRng::new(0);
        assert!(rng.next_f32() > 0.0);
    }
}
