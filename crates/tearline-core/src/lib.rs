//! Tearline Core - Foundational types for the pack-opening stage
//!
//! This crate provides the types that all other tearline crates depend on:
//! - `Tilt` - pointer-driven card tilt in degrees
//! - `Rect` - screen-space bounding boxes
//! - `TextureRegion` - offset/repeat sampling window of a texture
//! - Error types and Result alias

mod error;
mod types;

pub use error::{Result, TearlineError};
pub use types::{Rect, TextureRegion, Tilt};
