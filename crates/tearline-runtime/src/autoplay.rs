//! Autoplay recovery
//!
//! When the platform blocks video autoplay, one-shot listeners are armed for
//! several interaction kinds. The first interaction retries playback; on
//! success every listener is removed.

use tearline_core::{Result, TearlineError};
use tracing::{info, warn};

use crate::video::VideoSource;

/// User interactions that count as a playback gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    Click,
    TouchStart,
    MouseDown,
    Focus,
}

impl Interaction {
    pub const ALL: [Interaction; 4] = [
        Interaction::Click,
        Interaction::TouchStart,
        Interaction::MouseDown,
        Interaction::Focus,
    ];
}

#[derive(Debug, Default)]
pub struct AutoplayGuard {
    armed: Vec<Interaction>,
    retries: u32,
}

impl AutoplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playback. A blocked autoplay arms the interaction listeners and
    /// is not an error; any other failure propagates.
    pub fn start(&mut self, video: &mut dyn VideoSource) -> Result<()> {
        match video.play() {
            Ok(()) => {
                self.armed.clear();
                Ok(())
            }
            Err(TearlineError::AutoplayBlocked(reason)) => {
                warn!("Autoplay blocked ({}), waiting for user interaction", reason);
                self.armed = Interaction::ALL.to_vec();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Feed an interaction. Returns true if it started playback.
    pub fn on_interaction(&mut self, interaction: Interaction, video: &mut dyn VideoSource) -> bool {
        if !self.armed.contains(&interaction) {
            return false;
        }

        self.retries += 1;
        video.notify_user_gesture();
        match video.play() {
            Ok(()) => {
                info!("Playback started after {:?}", interaction);
                self.armed.clear();
                true
            }
            Err(e) => {
                warn!("Playback retry failed: {}", e);
                false
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        !self.armed.is_empty()
    }

    pub fn is_listening(&self, interaction: Interaction) -> bool {
        self.armed.contains(&interaction)
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Remove all listeners without retrying
    pub fn disarm(&mut self) {
        self.armed.clear();
    }
}
