//! Clip playback state

use crate::clip::{NodeClip, NodeProperty};
use crate::sampler::sample_node_track;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Repeat,
}

/// Playback state for one clip on one scene instance.
#[derive(Debug, Clone)]
pub struct ClipAction {
    /// Current playback time in seconds
    pub time: f64,
    /// Speed multiplier (1.0 = authored speed)
    pub time_scale: f64,
    pub loop_mode: LoopMode,
    /// Hold the final pose after a `Once` clip ends instead of releasing it
    pub clamp_when_finished: bool,
    playing: bool,
    finished: bool,
}

/// Sampled pose contribution of a clip for one frame
#[derive(Debug, Clone, Default)]
pub struct ClipSample {
    /// `(node index, property, value)` per track
    pub values: Vec<(usize, NodeProperty, Vec<f32>)>,
    /// The clip reached its end during this advance
    pub finished_now: bool,
}

impl ClipAction {
    pub fn new(time_scale: f64, loop_mode: LoopMode, clamp_when_finished: bool) -> Self {
        Self {
            time: 0.0,
            time_scale,
            loop_mode,
            clamp_when_finished,
            playing: false,
            finished: false,
        }
    }

    /// Play once at `time_scale`, holding the last frame
    pub fn once(time_scale: f64) -> Self {
        Self::new(time_scale, LoopMode::Once, true)
    }

    /// Rewind and start playing
    pub fn play(&mut self) {
        self.time = 0.0;
        self.playing = true;
        self.finished = false;
    }

    /// Stop and release the pose
    pub fn stop(&mut self) {
        self.time = 0.0;
        self.playing = false;
        self.finished = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the clip currently contributes a pose
    pub fn is_active(&self) -> bool {
        self.playing || (self.finished && self.clamp_when_finished)
    }

    /// Advance by `dt` seconds and sample every track.
    ///
    /// Returns `None` when the action is not contributing a pose.
    pub fn advance(&mut self, clip: &NodeClip, dt: f64) -> Option<ClipSample> {
        let mut finished_now = false;

        if self.playing {
            self.time += dt * self.time_scale;

            match self.loop_mode {
                LoopMode::Repeat => {
                    if clip.duration > 0.0 {
                        self.time = self.time.rem_euclid(clip.duration);
                    }
                }
                LoopMode::Once => {
                    if self.time >= clip.duration {
                        self.time = clip.duration;
                        self.playing = false;
                        self.finished = true;
                        finished_now = true;
                    } else if self.time < 0.0 {
                        self.time = 0.0;
                        self.playing = false;
                        self.finished = true;
                        finished_now = true;
                    }
                }
            }
        }

        if !self.is_active() {
            return None;
        }

        let values = clip
            .tracks
            .iter()
            .map(|t| (t.node_index, t.property, sample_node_track(t, self.time)))
            .collect();

        Some(ClipSample {
            values,
            finished_now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{Interpolation, NodeKeyframe, NodeTrack};

    fn slide_clip() -> NodeClip {
        NodeClip {
            name: "Tear".into(),
            duration: 2.3,
            tracks: vec![NodeTrack {
                node_index: 1,
                node_name: "strip".into(),
                property: NodeProperty::Translation,
                interpolation: Interpolation::Linear,
                keyframes: vec![
                    NodeKeyframe { time: 0.0, value: vec![0.0, 0.0, 0.0] },
                    NodeKeyframe { time: 2.3, value: vec![0.0, 2.3, 0.0] },
                ],
            }],
        }
    }

    #[test]
    fn idle_action_contributes_nothing() {
        let clip = slide_clip();
        let mut action = ClipAction::once(2.3);
        assert!(action.advance(&clip, 0.1).is_none());
    }

    #[test]
    fn time_scale_speeds_playback() {
        let clip = slide_clip();
        let mut action = ClipAction::once(2.3);
        action.play();
        let sample = action.advance(&clip, 0.5).unwrap();
        let y = sample.values[0].2[1];
        assert!((y - 1.15).abs() < 1e-5);
        assert!(!sample.finished_now);
    }

    #[test]
    fn once_clamps_at_final_frame() {
        let clip = slide_clip();
        let mut action = ClipAction::once(2.3);
        action.play();
        let sample = action.advance(&clip, 1.0).unwrap();
        assert!(sample.finished_now);
        assert!(action.is_finished());
        assert!(!action.is_playing());

        // Later frames keep the held pose without re-reporting completion
        let held = action.advance(&clip, 1.0).unwrap();
        assert!(!held.finished_now);
        assert!((held.values[0].2[1] - 2.3).abs() < 1e-5);
    }

    #[test]
    fn unclamped_once_releases_pose() {
        let clip = slide_clip();
        let mut action = ClipAction::new(1.0, LoopMode::Once, false);
        action.play();
        assert!(action.advance(&clip, 5.0).is_none());
        assert!(action.is_finished());
    }

    #[test]
    fn repeat_wraps_time() {
        let clip = slide_clip();
        let mut action = ClipAction::new(1.0, LoopMode::Repeat, false);
        action.play();
        action.advance(&clip, 3.3);
        assert!((action.time - 1.0).abs() < 1e-9);
        assert!(action.is_playing());
    }

    #[test]
    fn play_rewinds() {
        let clip = slide_clip();
        let mut action = ClipAction::once(1.0);
        action.play();
        action.advance(&clip, 10.0);
        action.play();
        assert_eq!(action.time, 0.0);
        assert!(!action.is_finished());
        action.stop();
        assert!(!action.is_active());
    }
}
