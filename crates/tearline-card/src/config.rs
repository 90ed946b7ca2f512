//! Card controller configuration

use serde::{Deserialize, Serialize};
use tearline_animation::SlideProfile;

use crate::camera::CardCamera;
use crate::face::FaceVariant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Uniform scale the appear tween grows to
    pub base_scale: f32,
    /// Group position in world units
    pub position: [f32; 3],
    pub appear_ms: f64,
    /// Frames to wait after mount before the appear tween starts
    pub appear_delay_frames: u32,
    pub face: FaceVariant,
    /// Case-insensitive name fragment used to pick the tear clip
    pub tear_clip: String,
    pub tear_time_scale: f64,
    pub slide: SlideProfile,
    pub camera: CardCamera,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            base_scale: 1.5,
            position: [0.0, 0.0, 0.0],
            appear_ms: 1500.0,
            appear_delay_frames: 2,
            face: FaceVariant::default(),
            tear_clip: "tear".into(),
            tear_time_scale: 2.3,
            slide: SlideProfile::default(),
            camera: CardCamera::default(),
        }
    }
}
