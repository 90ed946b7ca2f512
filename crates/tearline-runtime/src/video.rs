//! Video clock: the intro video's playback position and the grail overlay
//! timing derived from it

use tearline_core::{Result, TearlineError};

/// A playable video whose clock is polled once per frame
pub trait VideoSource {
    /// Request playback. Fails with [`TearlineError::AutoplayBlocked`] when
    /// the platform refuses to start without a user gesture.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Pause and seek back to the start
    fn rewind(&mut self);

    /// Advance the playback clock by a wall-clock delta in seconds
    fn advance(&mut self, dt: f64);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Total length in seconds, `None` until metadata has loaded
    fn duration(&self) -> Option<f64>;

    fn is_playing(&self) -> bool;

    /// A user gesture happened; platforms that gate autoplay may now allow it
    fn notify_user_gesture(&mut self) {}

    fn has_ended(&self) -> bool {
        matches!(self.duration(), Some(d) if self.current_time() >= d)
    }
}

/// Clock-driven stand-in for a decoded video stream
#[derive(Debug, Clone)]
pub struct SyntheticVideo {
    duration: f64,
    playback_rate: f64,
    time: f64,
    playing: bool,
    metadata_loaded: bool,
    autoplay_allowed: bool,
}

impl SyntheticVideo {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            playback_rate: 1.2,
            time: 0.0,
            playing: false,
            metadata_loaded: false,
            autoplay_allowed: true,
        }
    }

    pub fn with_playback_rate(mut self, rate: f64) -> Self {
        self.playback_rate = rate.max(0.0);
        self
    }

    /// Refuse `play()` until a user gesture has been seen
    pub fn with_autoplay_blocked(mut self) -> Self {
        self.autoplay_allowed = false;
        self
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }
}

impl VideoSource for SyntheticVideo {
    fn play(&mut self) -> Result<()> {
        if !self.autoplay_allowed {
            return Err(TearlineError::AutoplayBlocked(
                "playback requires a user gesture".into(),
            ));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn rewind(&mut self) {
        self.playing = false;
        self.time = 0.0;
    }

    fn advance(&mut self, dt: f64) {
        if !self.playing {
            return;
        }
        // Metadata arrives with the first decoded frame
        self.metadata_loaded = true;
        self.time = (self.time + dt.max(0.0) * self.playback_rate).min(self.duration);
        if self.time >= self.duration {
            self.playing = false;
        }
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> Option<f64> {
        self.metadata_loaded.then_some(self.duration)
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn notify_user_gesture(&mut self) {
        self.autoplay_allowed = true;
    }
}

/// Polled `{current_time, duration}` pair plus the grail overlay window
///
/// The overlay becomes visible `start_before_end` seconds before the video
/// ends and its progress runs 0→1 over `appearance` seconds.
#[derive(Debug, Clone)]
pub struct VideoTimeline {
    pub current_time: f64,
    pub duration: f64,
    start_before_end: f64,
    appearance: f64,
}

impl VideoTimeline {
    pub fn new(start_before_end: f64, appearance: f64) -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            start_before_end: start_before_end.max(0.0),
            appearance: appearance.max(f64::EPSILON),
        }
    }

    /// Take a fresh sample from the video. Returns false while the duration
    /// is still unknown.
    pub fn poll(&mut self, video: &dyn VideoSource) -> bool {
        match video.duration() {
            Some(duration) if duration > 0.0 => {
                self.update(video.current_time(), duration);
                true
            }
            _ => false,
        }
    }

    pub fn update(&mut self, current_time: f64, duration: f64) {
        self.current_time = current_time;
        self.duration = duration;
    }

    fn window_start(&self) -> f64 {
        self.duration - self.start_before_end
    }

    pub fn grail_visible(&self) -> bool {
        self.duration > 0.0 && self.current_time >= self.window_start()
    }

    pub fn grail_progress(&self) -> f64 {
        if !self.grail_visible() {
            return 0.0;
        }
        ((self.current_time - self.window_start()) / self.appearance).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_unknown_until_first_frame() {
        let mut video = SyntheticVideo::new(10.0);
        assert_eq!(video.duration(), None);
        video.play().unwrap();
        video.advance(0.1);
        assert_eq!(video.duration(), Some(10.0));
        assert!((video.current_time() - 0.12).abs() < 1e-9);
    }

    #[test]
    fn paused_video_does_not_advance() {
        let mut video = SyntheticVideo::new(10.0);
        video.advance(1.0);
        assert_eq!(video.current_time(), 0.0);
    }

    #[test]
    fn stops_at_end() {
        let mut video = SyntheticVideo::new(2.0).with_playback_rate(1.0);
        video.play().unwrap();
        video.advance(5.0);
        assert_eq!(video.current_time(), 2.0);
        assert!(!video.is_playing());
        assert!(video.has_ended());
    }

    #[test]
    fn rewind_returns_to_start() {
        let mut video = SyntheticVideo::new(10.0);
        video.play().unwrap();
        video.advance(3.0);
        video.rewind();
        assert_eq!(video.current_time(), 0.0);
        assert!(!video.is_playing());
        assert_eq!(video.duration(), Some(10.0));
    }

    #[test]
    fn blocked_autoplay_needs_gesture() {
        let mut video = SyntheticVideo::new(10.0).with_autoplay_blocked();
        assert!(matches!(video.play(), Err(TearlineError::AutoplayBlocked(_))));
        video.notify_user_gesture();
        assert!(video.play().is_ok());
    }

    #[test]
    fn grail_window_opens_before_end() {
        let mut timeline = VideoTimeline::new(1.4, 1.4);
        timeline.update(8.59, 10.0);
        assert!(!timeline.grail_visible());
        assert_eq!(timeline.grail_progress(), 0.0);

        timeline.update(8.6, 10.0);
        assert!(timeline.grail_visible());
        assert!(timeline.grail_progress().abs() < 1e-9);

        timeline.update(9.3, 10.0);
        assert!((timeline.grail_progress() - 0.5).abs() < 1e-9);

        timeline.update(10.0, 10.0);
        assert_eq!(timeline.grail_progress(), 1.0);

        timeline.update(12.0, 10.0);
        assert_eq!(timeline.grail_progress(), 1.0);
    }

    #[test]
    fn grail_hidden_without_duration() {
        let mut timeline = VideoTimeline::new(1.4, 1.4);
        timeline.update(5.0, 0.0);
        assert!(!timeline.grail_visible());
    }

    #[test]
    fn poll_waits_for_metadata() {
        let mut timeline = VideoTimeline::new(1.4, 1.4);
        let mut video = SyntheticVideo::new(10.0);
        assert!(!timeline.poll(&video));
        video.play().unwrap();
        video.advance(1.0);
        assert!(timeline.poll(&video));
        assert_eq!(timeline.duration, 10.0);
    }
}
