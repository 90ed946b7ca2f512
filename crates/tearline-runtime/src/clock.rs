//! Frame clock with fixed-timestep accumulator

use std::time::Instant;

/// Tracks session time and provides a fixed-timestep accumulator for
/// simulations that must step at a constant rate (the sunburst particles).
pub struct FrameClock {
    /// Total elapsed session time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Fixed timestep interval (default: 1/60 second)
    pub fixed_timestep: f64,
    /// Accumulated time for fixed-step consumption
    accumulator: f64,
    /// Last tick instant
    last_instant: Instant,
    /// Whether this is the first tick
    first_tick: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            fixed_timestep: 1.0 / 60.0,
            accumulator: 0.0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl FrameClock {
    /// Create a new frame clock with default 60Hz fixed timestep
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame clock with a custom fixed timestep
    pub fn with_fixed_timestep(hz: f64) -> Self {
        Self {
            fixed_timestep: 1.0 / hz,
            ..Self::default()
        }
    }

    /// Advance the clock from the wall clock. Call once per frame.
    pub fn tick(&mut self) {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            return;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(elapsed);
    }

    /// Advance the clock by an explicit delta (synthetic clocks, tests).
    pub fn tick_by(&mut self, dt: f64) {
        self.first_tick = false;
        self.advance(dt.max(0.0));
    }

    fn advance(&mut self, elapsed: f64) {
        // Clamp to avoid a burst of catch-up steps after a stall (max 250ms frame time)
        self.delta_time = elapsed.min(0.25);
        self.total_time += self.delta_time;
        self.accumulator += self.delta_time;
    }

    /// Total session time in milliseconds
    pub fn now_ms(&self) -> f64 {
        self.total_time * 1000.0
    }

    /// Returns true if there's enough accumulated time for a fixed update step
    pub fn should_fixed_update(&self) -> bool {
        self.accumulator >= self.fixed_timestep
    }

    /// Consume one fixed timestep from the accumulator
    pub fn consume_fixed_step(&mut self) {
        self.accumulator -= self.fixed_timestep;
    }
}

/// Elapsed-time source for one animation, anchored at its own start time.
///
/// Elapsed time never decreases even if a caller feeds an earlier `now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    started_at: Option<f64>,
    last_elapsed: f64,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `now_ms`. Restarting an already running stopwatch is a no-op.
    pub fn start(&mut self, now_ms: f64) {
        if self.started_at.is_none() {
            self.started_at = Some(now_ms);
            self.last_elapsed = 0.0;
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn stop(&mut self) {
        self.started_at = None;
        self.last_elapsed = 0.0;
    }

    /// Milliseconds since start (0 when not started)
    pub fn elapsed_ms(&mut self, now_ms: f64) -> f64 {
        let Some(start) = self.started_at else {
            return 0.0;
        };
        let elapsed = (now_ms - start).max(self.last_elapsed);
        self.last_elapsed = elapsed;
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_defaults() {
        let clock = FrameClock::new();
        assert!((clock.fixed_timestep - 1.0 / 60.0).abs() < 1e-10);
        assert_eq!(clock.total_time, 0.0);
        assert_eq!(clock.delta_time, 0.0);
    }

    #[test]
    fn test_first_tick_zero_delta() {
        let mut clock = FrameClock::new();
        clock.tick();
        assert_eq!(clock.delta_time, 0.0);
    }

    #[test]
    fn tick_by_accumulates_fixed_steps() {
        let mut clock = FrameClock::new();
        clock.tick_by(1.0 / 30.0);
        assert!((clock.now_ms() - 1000.0 / 30.0).abs() < 1e-9);

        let mut steps = 0;
        while clock.should_fixed_update() {
            clock.consume_fixed_step();
            steps += 1;
        }
        assert_eq!(steps, 2);
    }

    #[test]
    fn stall_is_clamped() {
        let mut clock = FrameClock::new();
        clock.tick_by(3.0);
        assert!((clock.delta_time - 0.25).abs() < 1e-12);
    }

    #[test]
    fn stopwatch_is_monotonic() {
        let mut watch = Stopwatch::new();
        assert_eq!(watch.elapsed_ms(500.0), 0.0);
        watch.start(1000.0);
        assert_eq!(watch.elapsed_ms(1250.0), 250.0);
        // An earlier timestamp never moves elapsed backwards
        assert_eq!(watch.elapsed_ms(1100.0), 250.0);
        // Second start is ignored while running
        watch.start(5000.0);
        assert_eq!(watch.elapsed_ms(1500.0), 500.0);
    }
}
