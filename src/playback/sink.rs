//! Audio output behind a trait seam.
//!
//! `RodioSink` decodes a file and plays it through the default output
//! device. The trait exists so the playback controller can be tested
//! without a sound card.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio output device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("failed to open audio file: {0}")]
    Open(String),
    #[error("seek not supported for this source")]
    SeekUnsupported,
}

pub trait PlaybackSink {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn set_volume(&mut self, volume: f32);
    fn set_speed(&mut self, speed: f32);
    fn try_seek(&mut self, position: Duration) -> Result<(), PlaybackError>;
    fn position(&self) -> Duration;
    /// Total media duration, when the decoder can report one.
    fn duration(&self) -> Option<Duration>;
    fn is_finished(&self) -> bool;
}

pub struct RodioSink {
    // Keeps the output stream alive for the lifetime of the sink.
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: rodio::Sink,
    duration: Option<Duration>,
}

impl RodioSink {
    /// Decode `path` and queue it on the default output device, paused.
    pub fn open(path: &Path) -> Result<Self, PlaybackError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;

        let file = File::open(path).map_err(|e| PlaybackError::Open(e.to_string()))?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Open(e.to_string()))?;
        let duration = decoder.total_duration();

        let sink = rodio::Sink::try_new(&handle)
            .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;
        sink.pause();
        sink.append(decoder);

        debug!("Opened {} for playback ({:?})", path.display(), duration);
        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
            duration,
        })
    }
}

impl PlaybackSink for RodioSink {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn set_speed(&mut self, speed: f32) {
        self.sink.set_speed(speed);
    }

    fn try_seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.sink
            .try_seek(position)
            .map_err(|_| PlaybackError::SeekUnsupported)
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
