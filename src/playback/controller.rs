//! Playback controller: volume/speed state that survives sink swaps,
//! fractional scrubbing, and segment-synchronized position queries.

use std::time::Duration;
use tracing::debug;

use super::sink::{PlaybackError, PlaybackSink};
use crate::api::TranscriptSegment;

pub struct PlaybackController<S: PlaybackSink> {
    sink: S,
    segments: Vec<TranscriptSegment>,
    volume: f32,
    speed: f32,
}

impl<S: PlaybackSink> PlaybackController<S> {
    pub fn new(sink: S, segments: Vec<TranscriptSegment>) -> Self {
        let mut controller = Self {
            sink,
            segments,
            volume: 1.0,
            speed: 1.0,
        };
        controller.apply_settings();
        controller
    }

    fn apply_settings(&mut self) {
        self.sink.set_volume(self.volume);
        self.sink.set_speed(self.speed);
    }

    /// Swap the media source. Volume and speed are user preferences, not
    /// per-file state, so they carry over to the new sink.
    pub fn replace_sink(&mut self, sink: S) {
        self.sink = sink;
        self.apply_settings();
        debug!(
            "Replaced playback sink, reapplied volume={} speed={}",
            self.volume, self.speed
        );
    }

    pub fn play(&mut self) {
        self.sink.play();
    }

    pub fn pause(&mut self) {
        self.sink.pause();
    }

    pub fn toggle(&mut self) {
        if self.sink.is_paused() {
            self.sink.play();
        } else {
            self.sink.pause();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 2.0);
        self.sink.set_volume(self.volume);
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(0.25, 4.0);
        self.sink.set_speed(self.speed);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn position(&self) -> Duration {
        self.sink.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.sink.duration()
    }

    pub fn is_finished(&self) -> bool {
        self.sink.is_finished()
    }

    /// Scrub to a fraction of the total duration. Clamped to [0, 1]; a
    /// no-op when the media duration is unknown.
    pub fn seek_fraction(&mut self, fraction: f64) -> Result<(), PlaybackError> {
        let Some(duration) = self.sink.duration() else {
            return Ok(());
        };
        let fraction = fraction.clamp(0.0, 1.0);
        let target = duration.mul_f64(fraction);
        self.sink.try_seek(target)
    }

    /// Jump to a transcript segment's start and play from there.
    pub fn select_segment(&mut self, index: usize) -> Result<(), PlaybackError> {
        let Some(segment) = self.segments.get(index) else {
            return Ok(());
        };
        let start = segment.start.max(0.0);
        self.sink.try_seek(Duration::from_secs_f64(start))?;
        self.sink.play();
        Ok(())
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    /// Segment the playhead currently falls in, if any.
    pub fn active_segment(&self) -> Option<usize> {
        active_segment_at(&self.segments, self.sink.position().as_secs_f64())
    }
}

/// A position is inside a segment when `start <= pos < end`. Gaps between
/// segments yield `None`.
pub fn active_segment_at(segments: &[TranscriptSegment], position: f64) -> Option<usize> {
    segments
        .iter()
        .position(|s| position >= s.start && position < s.end)
}

/// Format a position in seconds as zero-padded MM:SS. Non-finite or
/// negative positions render as 00:00.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let total = seconds as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
