//! Tearline Sequencer - choreography for one pack-opening session
//!
//! The [`Sequencer`] owns the [`AnimationPhase`] and turns callbacks and
//! due timers into effects through a transition table. [`CardAnimation`]
//! wires it to the video clock, the preloaded assets and every animated
//! component.

pub mod config;
pub mod phase;
pub mod preload;
pub mod sequencer;
pub mod session;

pub use config::{AssetConfig, GrailConfig, SessionConfig, TimingConfig, VideoConfig};
pub use phase::{transition, AnimationPhase, Effect, PhaseEvent, Transition};
pub use preload::{
    preload, AssetKind, AssetLoader, AssetRequest, AssetStore, DecodedImage, FsAssetLoader,
    LoadedAsset, PreloadHandle,
};
pub use sequencer::Sequencer;
pub use session::{CardAnimation, FrameSnapshot};
