//! Tearline Overlay - 2D cards composited over the 3D stage
//!
//! The flip card is the collectible revealed after the tear; it follows the
//! pointer with a tilt, flips on click and plays a one-time entrance. The
//! grail card descends from the top edge while the intro video ends.

pub mod flip_card;
pub mod grail;
pub mod layout;

pub use flip_card::{tilt_from_offset, FlipCard, FlipCardEvent, FlipTransform, MAX_TILT_DEG};
pub use grail::{GrailCard, GrailTransform};
pub use layout::{StageLayout, TearTrigger};
