//! Sunburst simulation: ray uniforms plus the stepped particle pool

use bytemuck::{Pod, Zeroable};
use tearline_core::Result;
use tearline_runtime::{FrameClock, RuntimeSystem};
use tracing::{debug, info};

use crate::curves::ray_fade;
use crate::emitter::{ResponsiveParams, SunburstConfig};
use crate::particle::{ParticleInstance, ParticlePool};
use crate::rand::ParticleRng;

/// Uniforms for the ray pass: matches WGSL `RayUniforms`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct RayUniforms {
    pub time: f32,
    pub fade: f32,
    pub radius_scale: f32,
    /// Viewport aspect (width / height)
    pub aspect: f32,
}

/// The whole CPU side of the sunburst. Idle until [`start`](Self::start),
/// inert after unmount.
pub struct SunburstSimulation {
    config: SunburstConfig,
    pool: ParticlePool,
    rng: ParticleRng,
    clock: FrameClock,
    /// Fractional emission carried between steps
    to_emit: f32,
    running: bool,
    mounted: bool,
    responsive: ResponsiveParams,
    pixel_ratio: f32,
    aspect: f32,
    instances: Vec<ParticleInstance>,
}

impl SunburstSimulation {
    pub fn new(config: SunburstConfig) -> Self {
        let mut rng = ParticleRng::new(config.seed);
        let pool = ParticlePool::new(&config, &mut rng);
        let responsive = config.responsive(f32::INFINITY);
        let clock = FrameClock::with_fixed_timestep(config.step_hz as f64);
        let instances = Vec::with_capacity(config.pool_size);
        Self {
            config,
            pool,
            rng,
            clock,
            to_emit: 0.0,
            running: false,
            mounted: true,
            responsive,
            pixel_ratio: 1.0,
            aspect: 1.0,
            instances,
        }
    }

    pub fn config(&self) -> &SunburstConfig {
        &self.config
    }

    /// Begin the effect with an initial burst. Starting twice is a no-op.
    pub fn start(&mut self) {
        if self.running || !self.mounted {
            return;
        }
        self.running = true;
        self.clock = FrameClock::with_fixed_timestep(self.config.step_hz as f64);
        self.to_emit = 0.0;
        let mut burst = 0;
        for _ in 0..self.config.burst_count {
            if self.emit_one() {
                burst += 1;
            }
        }
        info!("Sunburst started ({} particle burst)", burst);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Track the viewport: logical width drives the responsive constants,
    /// the pixel ratio is clamped before scaling sprite sizes.
    pub fn set_viewport(&mut self, logical_width: f32, logical_height: f32, pixel_ratio: f32) {
        self.responsive = self.config.responsive(logical_width);
        self.pixel_ratio = pixel_ratio.clamp(1.0, self.config.max_device_pixel_ratio);
        self.aspect = if logical_height > 0.0 {
            logical_width / logical_height
        } else {
            1.0
        };
        debug!(
            "Sunburst viewport {}x{} (radius scale {}, spread {})",
            logical_width, logical_height, self.responsive.radius_scale, self.responsive.spread_speed
        );
    }

    pub fn responsive(&self) -> ResponsiveParams {
        self.responsive
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn emit_one(&mut self) -> bool {
        self.pool
            .emit(&mut self.rng, [self.config.speed_min, self.config.speed_max])
            .is_some()
    }

    /// One fixed simulation step: emit at the constant rate, then age and
    /// move every live particle.
    pub fn step(&mut self) {
        if !self.running {
            return;
        }
        self.to_emit += self.config.emissions_per_step();
        while self.to_emit >= 1.0 {
            self.emit_one();
            self.to_emit -= 1.0;
        }
        let dt = 1.0 / self.config.step_hz;
        self.pool.step(dt, self.responsive.spread_speed);
    }

    /// Advance by a frame delta, running as many fixed steps as fit
    pub fn advance(&mut self, dt: f64) {
        if !self.running {
            return;
        }
        self.clock.tick_by(dt);
        while self.clock.should_fixed_update() {
            self.step();
            self.clock.consume_fixed_step();
        }
    }

    /// Seconds since `start`
    pub fn elapsed(&self) -> f32 {
        self.clock.total_time as f32
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn ray_uniforms(&self) -> RayUniforms {
        let elapsed = self.elapsed();
        RayUniforms {
            time: elapsed,
            fade: if self.running {
                ray_fade(elapsed, self.config.fade_in)
            } else {
                0.0
            },
            radius_scale: self.responsive.radius_scale,
            aspect: self.aspect,
        }
    }

    /// Pack live particles into instance data for the particle pass
    pub fn pack_instances(&mut self) -> &[ParticleInstance] {
        self.instances.clear();
        let ratio = self.pixel_ratio;
        self.instances.extend(
            self.pool
                .iter_active()
                .map(|p| ParticleInstance::from_particle(p, ratio)),
        );
        &self.instances
    }
}

impl RuntimeSystem for SunburstSimulation {
    fn update(&mut self, _now_ms: f64, dt: f64) -> Result<()> {
        if self.mounted {
            self.advance(dt);
        }
        Ok(())
    }

    fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.running = false;
        self.pool.clear();
        self.instances = Vec::new();
        debug!("Sunburst unmounted");
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn name(&self) -> &str {
        "sunburst"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_until_started() {
        let mut sim = SunburstSimulation::new(SunburstConfig::default());
        sim.advance(1.0);
        assert_eq!(sim.active_count(), 0);
        assert_eq!(sim.ray_uniforms().fade, 0.0);
    }

    #[test]
    fn start_bursts_once() {
        let mut sim = SunburstSimulation::new(SunburstConfig::default());
        sim.start();
        assert_eq!(sim.active_count(), 80);
        sim.start();
        assert_eq!(sim.active_count(), 80);
    }

    #[test]
    fn steady_state_stays_within_pool() {
        let config = SunburstConfig::default();
        let steps = (10.0 * config.lifetime * config.step_hz) as usize;
        let mut sim = SunburstSimulation::new(config);
        sim.start();

        let mut tail = Vec::new();
        for i in 0..steps {
            sim.step();
            let active = sim.active_count();
            assert!(active <= 520);
            if i >= steps - 60 {
                tail.push(active);
            }
        }

        // Neither leaking nor depleted: most of the pool stays in flight
        let min = *tail.iter().min().unwrap();
        assert!(min > 260, "pool drained to {}", min);
    }

    #[test]
    fn advance_runs_fixed_steps() {
        // Power-of-two rates keep the accumulator exact
        let config = SunburstConfig {
            step_hz: 64.0,
            ..Default::default()
        };
        let mut a = SunburstSimulation::new(config.clone());
        let mut b = SunburstSimulation::new(config);
        a.start();
        b.start();
        for _ in 0..32 {
            a.advance(1.0 / 32.0);
        }
        for _ in 0..64 {
            b.step();
        }
        assert_eq!(a.active_count(), b.active_count());
    }

    #[test]
    fn fade_in_then_pulse() {
        let mut sim = SunburstSimulation::new(SunburstConfig::default());
        sim.start();
        sim.advance(0.1);
        let early = sim.ray_uniforms().fade;
        sim.advance(0.2);
        sim.advance(0.2);
        sim.advance(0.2);
        let later = sim.ray_uniforms().fade;
        assert!(early > 0.0 && early < later);
        assert!(later <= 1.0);
    }

    #[test]
    fn viewport_switches_constants_and_clamps_ratio() {
        let mut sim = SunburstSimulation::new(SunburstConfig::default());
        sim.set_viewport(390.0, 844.0, 3.0);
        assert_eq!(sim.responsive().spread_speed, 0.98);
        assert_eq!(sim.ray_uniforms().radius_scale, 1.38);
        assert_eq!(sim.pixel_ratio(), 2.0);

        sim.set_viewport(1440.0, 900.0, 1.0);
        assert_eq!(sim.responsive().spread_speed, 0.68);
    }

    #[test]
    fn packed_sizes_use_pixel_ratio() {
        let mut sim = SunburstSimulation::new(SunburstConfig::default());
        sim.set_viewport(1280.0, 720.0, 2.0);
        sim.start();
        sim.step();
        let instances = sim.pack_instances();
        assert_eq!(instances.len(), 80 + 3);
        for inst in instances {
            assert!(inst.pos_size_alpha[2] >= 6.0 && inst.pos_size_alpha[2] < 22.0);
            assert!(inst.pos_size_alpha[3] > 0.0 && inst.pos_size_alpha[3] <= 1.0);
        }
    }

    #[test]
    fn unmount_stops_everything() {
        let mut sim = SunburstSimulation::new(SunburstConfig::default());
        sim.start();
        sim.unmount();
        assert!(!sim.is_mounted());
        sim.update(0.0, 1.0).unwrap();
        assert_eq!(sim.active_count(), 0);
        sim.start();
        assert!(!sim.is_running());
    }
}
