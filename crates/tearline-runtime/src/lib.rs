//! Tearline Runtime - frame loop infrastructure
//!
//! Provides the building blocks every animated component runs on:
//! - `FrameClock` - per-frame delta plus a fixed-step accumulator
//! - `Stopwatch` - monotonic elapsed time for one concurrent animation
//! - `TimerQueue` - delayed and frame-deferred effects with a liveness guard
//! - `EventBus` - typed queue components use to report completion upward
//! - `VideoSource` / `VideoTimeline` - polled video clock and end-window math
//! - `AutoplayGuard` - retries rejected playback on the first user gesture
//! - `RuntimeSystem` - trait for mountable components ticked by the loop

mod autoplay;
mod clock;
mod event_bus;
mod system;
mod timer;
mod video;

pub use autoplay::{AutoplayGuard, Interaction};
pub use clock::{FrameClock, Stopwatch};
pub use event_bus::EventBus;
pub use system::RuntimeSystem;
pub use timer::{TimerId, TimerQueue};
pub use video::{SyntheticVideo, VideoSource, VideoTimeline};
