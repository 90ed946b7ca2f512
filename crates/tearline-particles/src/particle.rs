//! Particle types: CPU simulation state, the fixed slot pool and GPU
//! instance data

use bytemuck::{Pod, Zeroable};
use std::f32::consts::TAU;

use crate::curves::life_alpha;
use crate::emitter::SunburstConfig;
use crate::rand::ParticleRng;

/// CPU-side particle state (not sent to GPU)
///
/// Positions are in clip space with the sunburst centre at the origin.
#[derive(Debug, Clone, Default)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Remaining life in seconds; the slot is free when `life <= 0`
    pub life: f32,
    /// Fixed per slot at pool creation
    pub max_life: f32,
    pub size: f32,
    pub angle: f32,
    /// Turns of spiral over a full life, in [-1, 1]
    pub spiral: f32,
}

impl Particle {
    pub fn is_active(&self) -> bool {
        self.life > 0.0
    }

    /// Normalized age in [0, 1]: 0 at birth, 1 at death
    pub fn progress(&self) -> f32 {
        if self.max_life <= 0.0 {
            1.0
        } else {
            (1.0 - self.life / self.max_life).clamp(0.0, 1.0)
        }
    }

    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        life_alpha(self.life / self.max_life)
    }

    /// Age the particle by `dt` and place it on its outward spiral
    pub fn step(&mut self, dt: f32, spread_speed: f32) {
        if !self.is_active() {
            return;
        }
        self.life -= dt;
        let t = self.progress();
        let a = self.angle + t * self.spiral * TAU;
        let r = t * spread_speed;
        self.x = a.cos() * r;
        self.y = a.sin() * r;
    }
}

/// GPU instance data: matches WGSL `ParticleInstance` (one vec4).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct ParticleInstance {
    /// x, y = clip-space position, z = size in physical pixels, w = alpha
    pub pos_size_alpha: [f32; 4],
}

impl ParticleInstance {
    pub fn from_particle(p: &Particle, pixel_ratio: f32) -> Self {
        Self {
            pos_size_alpha: [p.x, p.y, p.size * pixel_ratio, p.alpha()],
        }
    }
}

/// Fixed-capacity slot pool.
///
/// Slots are never allocated or freed after creation; emission reuses the
/// first slot whose life has run out.
pub struct ParticlePool {
    particles: Vec<Particle>,
}

impl ParticlePool {
    /// Create `config.pool_size` dead slots with per-slot lifetime and size
    pub fn new(config: &SunburstConfig, rng: &mut ParticleRng) -> Self {
        let [jitter_min, jitter_max] = config.lifetime_jitter;
        let particles = (0..config.pool_size)
            .map(|_| Particle {
                max_life: config.lifetime * rng.range(jitter_min, jitter_max),
                size: rng.range(config.size_min, config.size_max),
                angle: rng.angle(),
                spiral: rng.signed(),
                ..Particle::default()
            })
            .collect();
        Self { particles }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_active()).count()
    }

    /// Revive the first free slot at the centre. Returns its index, or
    /// `None` when every slot is alive.
    pub fn emit(&mut self, rng: &mut ParticleRng, speed_range: [f32; 2]) -> Option<usize> {
        let index = self.particles.iter().position(|p| !p.is_active())?;
        let angle = rng.angle();
        let speed = rng.range(speed_range[0], speed_range[1]);
        let spiral = rng.signed();

        let p = &mut self.particles[index];
        p.x = 0.0;
        p.y = 0.0;
        p.vx = angle.cos() * speed;
        p.vy = angle.sin() * speed;
        p.life = p.max_life;
        p.angle = angle;
        p.spiral = spiral;
        Some(index)
    }

    /// Step every active particle
    pub fn step(&mut self, dt: f32, spread_speed: f32) {
        for p in self.particles.iter_mut() {
            p.step(dt, spread_speed);
        }
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.is_active())
    }

    /// Kill every particle, keeping the slots
    pub fn clear(&mut self) {
        for p in self.particles.iter_mut() {
            p.life = 0.0;
        }
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(size: usize) -> (ParticlePool, ParticleRng) {
        let config = SunburstConfig {
            pool_size: size,
            ..Default::default()
        };
        let mut rng = ParticleRng::new(42);
        let pool = ParticlePool::new(&config, &mut rng);
        (pool, rng)
    }

    #[test]
    fn slots_start_dead_with_jittered_lifetimes() {
        let (pool, _) = small_pool(64);
        assert_eq!(pool.capacity(), 64);
        assert_eq!(pool.active_count(), 0);
        for i in 0..64 {
            let p = pool.get(i).unwrap();
            assert!(p.max_life >= 2.5 * 0.6 && p.max_life < 2.5 * 1.4);
            assert!(p.size >= 3.0 && p.size < 11.0);
        }
    }

    #[test]
    fn emit_reuses_first_free_slot() {
        let (mut pool, mut rng) = small_pool(4);
        assert_eq!(pool.emit(&mut rng, [0.08, 0.2]), Some(0));
        assert_eq!(pool.emit(&mut rng, [0.08, 0.2]), Some(1));
        assert_eq!(pool.emit(&mut rng, [0.08, 0.2]), Some(2));

        // Free slot 1 by running it out of life
        let max_life = pool.get(1).unwrap().max_life;
        pool.particles[1].step(max_life + 0.1, 0.68);
        assert!(!pool.get(1).unwrap().is_active());

        assert_eq!(pool.emit(&mut rng, [0.08, 0.2]), Some(1));
        assert_eq!(pool.emit(&mut rng, [0.08, 0.2]), Some(3));
        assert_eq!(pool.emit(&mut rng, [0.08, 0.2]), None);
    }

    #[test]
    fn particles_spiral_outward() {
        let mut p = Particle {
            life: 2.0,
            max_life: 2.0,
            angle: 0.0,
            spiral: 0.0,
            ..Default::default()
        };
        p.step(1.0, 0.68);
        // Halfway through life, straight along the angle
        assert!((p.x - 0.34).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);

        let mut q = Particle {
            life: 2.0,
            max_life: 2.0,
            angle: 0.0,
            spiral: 0.5,
            ..Default::default()
        };
        q.step(1.0, 0.68);
        // Quarter turn of spiral at t = 0.5
        let radius = (q.x * q.x + q.y * q.y).sqrt();
        assert!((radius - 0.34).abs() < 1e-5);
        assert!(q.x.abs() < 1e-5 && q.y > 0.0);
    }

    #[test]
    fn alpha_fades_with_life() {
        let mut p = Particle {
            life: 1.0,
            max_life: 1.0,
            ..Default::default()
        };
        assert_eq!(p.alpha(), 1.0);
        p.step(0.5, 1.0);
        assert!((p.alpha() - 0.425).abs() < 1e-6);
    }

    #[test]
    fn clear_kills_everything() {
        let (mut pool, mut rng) = small_pool(8);
        for _ in 0..8 {
            pool.emit(&mut rng, [0.08, 0.2]);
        }
        assert_eq!(pool.active_count(), 8);
        pool.clear();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.capacity(), 8);
    }

    #[test]
    fn particle_instance_layout() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 16);
        assert_eq!(std::mem::align_of::<ParticleInstance>(), 4);
    }
}
