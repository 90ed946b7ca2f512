//! Tearline Player - windowed host for a card reveal session
//!
//! This crate provides the `PlayerApp` application handler, which feeds
//! window input into a [`tearline_sequencer::CardAnimation`] and draws it
//! with the stage renderer.

mod input;
mod player_app;

pub use input::{PointerAction, PointerTracker};
pub use player_app::PlayerApp;
