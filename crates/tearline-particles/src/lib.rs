//! Tearline Particles - the sunburst celebration effect
//!
//! CPU side of a two-pass effect:
//! - rays: a full-screen pass driven by a handful of uniforms (time, fade,
//!   radius scale)
//! - particles: a fixed 520-slot pool stepped at 60Hz, each particle
//!   spiralling outward from the centre, packed into instance data for an
//!   additive point-sprite pass

pub mod curves;
pub mod emitter;
pub mod particle;
pub mod rand;
pub mod sunburst;

pub use emitter::{ResponsiveParams, SunburstConfig};
pub use particle::{Particle, ParticleInstance, ParticlePool};
pub use sunburst::{RayUniforms, SunburstSimulation};
