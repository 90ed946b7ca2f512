//! Value-over-time curves for the sunburst

/// Linear interpolation between two floats
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Particle alpha from its remaining-life fraction `f` (1 at birth, 0 at
/// death). Fades slightly faster than linear near the end.
pub fn life_alpha(f: f32) -> f32 {
    let f = f.clamp(0.0, 1.0);
    f * (1.0 - 0.3 * (1.0 - f))
}

/// Ray-pass fade: a linear fade-in times a slow pulse
pub fn ray_fade(elapsed: f32, fade_in: f32) -> f32 {
    let fade_in = if fade_in > 0.0 {
        (elapsed / fade_in).min(1.0)
    } else {
        1.0
    };
    fade_in * (0.92 + 0.08 * (elapsed * 1.2).sin())
}
