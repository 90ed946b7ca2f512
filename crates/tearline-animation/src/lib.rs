//! Animation building blocks for tearline
//!
//! Two tiers, mirroring how the card choreography is driven:
//! - **Tweens**: `{start, duration, from, to, easing}` descriptors evaluated
//!   against the session clock each frame
//! - **Clips**: authored glTF node animations (transform and morph weight
//!   tracks) played through a `ClipAction`

pub mod clip;
pub mod easing;
pub mod player;
pub mod profile;
pub mod sampler;
pub mod tween;

pub use clip::{Interpolation, NodeClip, NodeKeyframe, NodeProperty, NodeTrack};
pub use easing::{ease_out_cubic, Easing};
pub use player::{ClipAction, ClipSample, LoopMode};
pub use profile::{SlideProfile, SlideSample};
pub use tween::{Lerp, Tween};
