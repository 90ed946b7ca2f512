//! Sunburst configuration (parsed from TOML) and viewport-responsive constants

/// Tunables for the sunburst effect
#[derive(Debug, Clone, PartialEq)]
pub struct SunburstConfig {
    /// Fixed pool capacity
    pub pool_size: usize,
    /// Particles emitted at once when the effect starts
    pub burst_count: u32,
    /// Pool cycles per lifetime window
    pub emit_rate: f32,
    /// Mean particle lifetime in seconds
    pub lifetime: f32,
    /// Per-slot lifetime multiplier range
    pub lifetime_jitter: [f32; 2],
    /// Sprite size range in pixels
    pub size_min: f32,
    pub size_max: f32,
    /// Launch speed range (kept per particle, motion follows the spiral)
    pub speed_min: f32,
    pub speed_max: f32,
    pub spread_speed_desktop: f32,
    pub spread_speed_mobile: f32,
    pub radius_scale_desktop: f32,
    pub radius_scale_mobile: f32,
    /// Viewport widths at or below this many logical pixels use mobile constants
    pub mobile_breakpoint: f32,
    /// Ray fade-in duration in seconds
    pub fade_in: f32,
    pub max_device_pixel_ratio: f32,
    /// Simulation rate in steps per second
    pub step_hz: f32,
    pub seed: u32,
}

impl Default for SunburstConfig {
    fn default() -> Self {
        Self {
            pool_size: 520,
            burst_count: 80,
            emit_rate: 1.0,
            lifetime: 2.5,
            lifetime_jitter: [0.6, 1.4],
            size_min: 3.0,
            size_max: 11.0,
            speed_min: 0.08,
            speed_max: 0.2,
            spread_speed_desktop: 0.68,
            spread_speed_mobile: 0.98,
            radius_scale_desktop: 1.0,
            radius_scale_mobile: 1.38,
            mobile_breakpoint: 600.0,
            fade_in: 0.5,
            max_device_pixel_ratio: 2.0,
            step_hz: 60.0,
            seed: 0x5EED_5A7B,
        }
    }
}

/// Constants that switch at the mobile breakpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponsiveParams {
    pub radius_scale: f32,
    pub spread_speed: f32,
}

impl SunburstConfig {
    /// Parse a SunburstConfig from a TOML table, keeping defaults for absent keys
    pub fn from_toml(table: &toml::value::Table) -> Self {
        let mut config = Self::default();

        if let Some(v) = table.get("pool_size") {
            let n = v.as_integer().unwrap_or(520).max(1) as usize;
            config.pool_size = n.min(10000);
        }
        if let Some(v) = table.get("burst_count") {
            config.burst_count = v.as_integer().unwrap_or(0).max(0) as u32;
        }
        if let Some(v) = table.get("emit_rate") {
            config.emit_rate = toml_f32(v, config.emit_rate);
        }
        if let Some(v) = table.get("lifetime") {
            config.lifetime = toml_f32(v, config.lifetime);
        }
        if let Some(v) = table.get("lifetime_jitter") {
            config.lifetime_jitter = toml_vec2(v, config.lifetime_jitter);
        }
        if let Some(v) = table.get("size_min") {
            config.size_min = toml_f32(v, config.size_min);
        }
        if let Some(v) = table.get("size_max") {
            config.size_max = toml_f32(v, config.size_max);
        }
        if let Some(v) = table.get("speed_min") {
            config.speed_min = toml_f32(v, config.speed_min);
        }
        if let Some(v) = table.get("speed_max") {
            config.speed_max = toml_f32(v, config.speed_max);
        }
        if let Some(v) = table.get("spread_speed") {
            let pair = toml_vec2(
                v,
                [config.spread_speed_desktop, config.spread_speed_mobile],
            );
            config.spread_speed_desktop = pair[0];
            config.spread_speed_mobile = pair[1];
        }
        if let Some(v) = table.get("radius_scale") {
            let pair = toml_vec2(
                v,
                [config.radius_scale_desktop, config.radius_scale_mobile],
            );
            config.radius_scale_desktop = pair[0];
            config.radius_scale_mobile = pair[1];
        }
        if let Some(v) = table.get("mobile_breakpoint") {
            config.mobile_breakpoint = toml_f32(v, config.mobile_breakpoint);
        }
        if let Some(v) = table.get("fade_in") {
            config.fade_in = toml_f32(v, config.fade_in);
        }
        if let Some(v) = table.get("max_device_pixel_ratio") {
            config.max_device_pixel_ratio = toml_f32(v, config.max_device_pixel_ratio).max(1.0);
        }
        if let Some(v) = table.get("step_hz") {
            config.step_hz = toml_f32(v, config.step_hz).max(1.0);
        }
        if let Some(v) = table.get("seed") {
            config.seed = v.as_integer().unwrap_or(config.seed as i64) as u32;
        }

        config
    }

    /// Radius scale and spread speed for a viewport of `width` logical pixels
    pub fn responsive(&self, width: f32) -> ResponsiveParams {
        if width <= self.mobile_breakpoint {
            ResponsiveParams {
                radius_scale: self.radius_scale_mobile,
                spread_speed: self.spread_speed_mobile,
            }
        } else {
            ResponsiveParams {
                radius_scale: self.radius_scale_desktop,
                spread_speed: self.spread_speed_desktop,
            }
        }
    }

    /// Particles emitted per simulation step so the whole pool cycles
    /// within one lifetime window
    pub fn emissions_per_step(&self) -> f32 {
        if self.lifetime <= 0.0 || self.emit_rate <= 0.0 {
            return 0.0;
        }
        self.pool_size as f32 / (self.lifetime / self.emit_rate) / self.step_hz
    }
}

// ── TOML helpers (handle integer/float coercion) ──

fn toml_f32(v: &toml::Value, default: f32) -> f32 {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .unwrap_or(default)
}

fn toml_vec2(v: &toml::Value, default: [f32; 2]) -> [f32; 2] {
    match v.as_array() {
        Some(arr) if arr.len() >= 2 => [
            toml_f32(&arr[0], default[0]),
            toml_f32(&arr[1], default[1]),
        ],
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = SunburstConfig::default();
        assert_eq!(config.pool_size, 520);
        assert_eq!(config.burst_count, 80);
        assert!(config.lifetime_jitter[1] >= config.lifetime_jitter[0]);
        assert!(config.size_max > config.size_min);
    }

    #[test]
    fn parse_from_toml() {
        let toml_str = r#"
pool_size = 256
burst_count = 20
lifetime = 3
spread_speed = [0.5, 0.9]
fade_in = 1.0
"#;
        let table: toml::value::Table = toml::from_str(toml_str).unwrap();
        let config = SunburstConfig::from_toml(&table);
        assert_eq!(config.pool_size, 256);
        assert_eq!(config.burst_count, 20);
        assert!((config.lifetime - 3.0).abs() < 1e-6);
        assert!((config.spread_speed_desktop - 0.5).abs() < 1e-6);
        assert!((config.spread_speed_mobile - 0.9).abs() < 1e-6);
        // Untouched keys keep defaults
        assert!((config.radius_scale_mobile - 1.38).abs() < 1e-6);
    }

    #[test]
    fn pool_size_is_capped() {
        let table: toml::value::Table = toml::from_str("pool_size = 1000000").unwrap();
        assert_eq!(SunburstConfig::from_toml(&table).pool_size, 10000);
    }

    #[test]
    fn breakpoint_switches_constants() {
        let config = SunburstConfig::default();
        let mobile = config.responsive(600.0);
        assert_eq!(mobile.radius_scale, 1.38);
        assert_eq!(mobile.spread_speed, 0.98);
        let desktop = config.responsive(601.0);
        assert_eq!(desktop.radius_scale, 1.0);
        assert_eq!(desktop.spread_speed, 0.68);
    }

    #[test]
    fn emission_rate_cycles_pool_per_lifetime() {
        let config = SunburstConfig::default();
        let per_second = config.emissions_per_step() * config.step_hz;
        assert!((per_second * config.lifetime - 520.0).abs() < 1e-2);
    }
}
