//! Recording session state machine.
//!
//! Idle → Recording → (Paused ⇄ Recording) → Stopped → Idle. The elapsed
//! counter ticks once per second and only while Recording; the tick task and
//! the capture stream are started and stopped together on every exit path so
//! neither can outlive the session.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use super::capture::{negotiate_encoding, AudioEncoding, CaptureError, CaptureSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
    Paused,
    Stopped,
}

/// Finished recording: all captured chunks concatenated into one WAV blob
/// tagged with the negotiated mime type.
#[derive(Debug, Clone)]
pub struct RecordingBlob {
    pub data: Vec<u8>,
    pub mime_type: &'static str,
    pub filename: String,
    pub duration_seconds: u64,
}

pub struct RecordingSession {
    capture: Box<dyn CaptureSource>,
    state: RecordingState,
    encoding: Option<AudioEncoding>,
    elapsed: Arc<AtomicU64>,
    tick: Option<JoinHandle<()>>,
}

impl RecordingSession {
    pub fn new(capture: Box<dyn CaptureSource>) -> Self {
        Self {
            capture,
            state: RecordingState::Idle,
            encoding: None,
            elapsed: Arc::new(AtomicU64::new(0)),
            tick: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    /// Begin capturing. Only valid from Idle; other states are no-ops.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state != RecordingState::Idle {
            warn!("start() ignored in state {:?}", self.state);
            return Ok(());
        }

        let supported = self.capture.supported_encodings();
        let encoding = negotiate_encoding(&supported).ok_or_else(|| {
            CaptureError::DeviceUnavailable("no supported audio encoding".to_string())
        })?;

        self.capture.start(encoding)?;
        self.encoding = Some(encoding);
        self.elapsed.store(0, Ordering::Relaxed);
        self.spawn_tick();
        self.state = RecordingState::Recording;

        info!("Recording started ({:?})", encoding);
        Ok(())
    }

    /// Suspend capture and the elapsed tick. No-op outside Recording.
    pub fn pause(&mut self) {
        if self.state != RecordingState::Recording {
            return;
        }
        self.stop_tick();
        if let Err(e) = self.capture.pause() {
            warn!("Failed to pause capture: {}", e);
        }
        self.state = RecordingState::Paused;
        debug!("Recording paused at {}s", self.elapsed_seconds());
    }

    /// Resume capture and the elapsed tick. No-op outside Paused.
    pub fn resume(&mut self) {
        if self.state != RecordingState::Paused {
            return;
        }
        if let Err(e) = self.capture.resume() {
            warn!("Failed to resume capture: {}", e);
        }
        self.spawn_tick();
        self.state = RecordingState::Recording;
        debug!("Recording resumed at {}s", self.elapsed_seconds());
    }

    /// Finalize the session. Returns `None` when nothing was captured — a
    /// zero-byte result is discarded silently and the session returns to
    /// Idle. Callers are expected to confirm with the user before invoking
    /// this.
    pub fn stop(&mut self) -> Result<Option<RecordingBlob>, CaptureError> {
        if !matches!(
            self.state,
            RecordingState::Recording | RecordingState::Paused
        ) {
            return Ok(None);
        }

        self.stop_tick();
        let chunks = self.capture.stop()?;
        let total_bytes: usize = chunks.iter().map(Vec::len).sum();

        if total_bytes == 0 {
            debug!("Recording produced no audio, discarding");
            self.state = RecordingState::Idle;
            return Ok(None);
        }

        self.state = RecordingState::Stopped;
        let encoding = self.encoding.unwrap_or(AudioEncoding::WavPcmI16);
        let blob = finalize_blob(
            &chunks,
            encoding,
            self.capture.sample_rate(),
            self.elapsed_seconds(),
        )?;

        info!(
            "Recording stopped: {}s, {} bytes",
            blob.duration_seconds,
            blob.data.len()
        );
        Ok(Some(blob))
    }

    /// Throw the session away: stop the tick, release the device, reset to
    /// Idle.
    pub fn discard(&mut self) {
        self.stop_tick();
        if self.capture.is_active() {
            if let Err(e) = self.capture.stop() {
                warn!("Failed to stop capture on discard: {}", e);
            }
        }
        self.elapsed.store(0, Ordering::Relaxed);
        self.state = RecordingState::Idle;
    }

    fn spawn_tick(&mut self) {
        let elapsed = Arc::clone(&self.elapsed);
        // Create the interval here so its baseline is the moment the tick is
        // started, not whenever the spawned task first gets polled.
        let mut ticker = interval(Duration::from_secs(1));
        self.tick = Some(tokio::spawn(async move {
            // The first tick of a tokio interval fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                elapsed.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    fn stop_tick(&mut self) {
        if let Some(handle) = self.tick.take() {
            handle.abort();
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.stop_tick();
    }
}

/// Format elapsed/playback seconds as zero-padded MM:SS.
pub fn format_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn finalize_blob(
    chunks: &[Vec<u8>],
    encoding: AudioEncoding,
    sample_rate: u32,
    duration_seconds: u64,
) -> Result<RecordingBlob, CaptureError> {
    let pcm = chunks.concat();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: (encoding.bytes_per_sample() * 8) as u16,
        sample_format: match encoding {
            AudioEncoding::WavPcmI16 => hound::SampleFormat::Int,
            AudioEncoding::WavPcmF32 => hound::SampleFormat::Float,
        },
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| CaptureError::Stream(e.to_string()))?;
        match encoding {
            AudioEncoding::WavPcmI16 => {
                for bytes in pcm.chunks_exact(2) {
                    let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
                    writer
                        .write_sample(sample)
                        .map_err(|e| CaptureError::Stream(e.to_string()))?;
                }
            }
            AudioEncoding::WavPcmF32 => {
                for bytes in pcm.chunks_exact(4) {
                    let sample = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    writer
                        .write_sample(sample)
                        .map_err(|e| CaptureError::Stream(e.to_string()))?;
                }
            }
        }
        writer
            .finalize()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;
    }

    let filename = format!("recording_{}.wav", chrono::Utc::now().timestamp_millis());
    Ok(RecordingBlob {
        data: cursor.into_inner(),
        mime_type: encoding.mime_type(),
        filename,
        duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCaptureState {
        started: bool,
        paused: bool,
        stop_calls: u32,
    }

    struct FakeCaptureSource {
        state: Arc<Mutex<FakeCaptureState>>,
        chunks: Vec<Vec<u8>>,
        fail_start: bool,
    }

    impl FakeCaptureSource {
        fn new(chunks: Vec<Vec<u8>>) -> (Self, Arc<Mutex<FakeCaptureState>>) {
            let state = Arc::new(Mutex::new(FakeCaptureState::default()));
            (
                Self {
                    state: Arc::clone(&state),
                    chunks,
                    fail_start: false,
                },
                state,
            )
        }

        fn failing() -> Self {
            Self {
                state: Arc::new(Mutex::new(FakeCaptureState::default())),
                chunks: Vec::new(),
                fail_start: true,
            }
        }
    }

    impl CaptureSource for FakeCaptureSource {
        fn supported_encodings(&self) -> Vec<AudioEncoding> {
            vec![AudioEncoding::WavPcmI16]
        }

        fn start(&mut self, _encoding: AudioEncoding) -> Result<(), CaptureError> {
            if self.fail_start {
                return Err(CaptureError::DeviceUnavailable("denied".to_string()));
            }
            self.state.lock().unwrap().started = true;
            Ok(())
        }

        fn pause(&mut self) -> Result<(), CaptureError> {
            self.state.lock().unwrap().paused = true;
            Ok(())
        }

        fn resume(&mut self) -> Result<(), CaptureError> {
            self.state.lock().unwrap().paused = false;
            Ok(())
        }

        fn stop(&mut self) -> Result<Vec<Vec<u8>>, CaptureError> {
            let mut state = self.state.lock().unwrap();
            state.started = false;
            state.stop_calls += 1;
            Ok(std::mem::take(&mut self.chunks))
        }

        fn is_active(&self) -> bool {
            self.state.lock().unwrap().started
        }

        fn sample_rate(&self) -> u32 {
            16000
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_advances_only_while_recording() {
        let (capture, _) = FakeCaptureSource::new(vec![vec![0u8; 4]]);
        let mut session = RecordingSession::new(Box::new(capture));

        assert_eq!(session.elapsed_seconds(), 0);
        session.start().unwrap();
        assert_eq!(session.state(), RecordingState::Recording);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(session.elapsed_seconds(), 2);

        session.pause();
        assert_eq!(session.state(), RecordingState::Paused);
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(session.elapsed_seconds(), 2);

        session.resume();
        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(session.elapsed_seconds(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_pause_resume_are_noops() {
        let (capture, state) = FakeCaptureSource::new(Vec::new());
        let mut session = RecordingSession::new(Box::new(capture));

        session.pause();
        session.resume();
        assert_eq!(session.state(), RecordingState::Idle);
        assert!(!state.lock().unwrap().paused);

        session.start().unwrap();
        session.resume(); // not paused, must not touch the capture
        assert_eq!(session.state(), RecordingState::Recording);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_byte_recording_is_discarded_silently() {
        let (capture, _) = FakeCaptureSource::new(Vec::new());
        let mut session = RecordingSession::new(Box::new(capture));

        session.start().unwrap();
        let result = session.stop().unwrap();
        assert!(result.is_none());
        assert_eq!(session.state(), RecordingState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_concatenates_chunks_in_order() {
        let first: Vec<u8> = 1i16.to_le_bytes().to_vec();
        let second: Vec<u8> = 2i16.to_le_bytes().to_vec();
        let (capture, state) = FakeCaptureSource::new(vec![first, second]);
        let mut session = RecordingSession::new(Box::new(capture));

        session.start().unwrap();
        let blob = session.stop().unwrap().expect("blob");

        assert_eq!(blob.mime_type, "audio/wav");
        assert!(blob.filename.starts_with("recording_"));
        assert!(blob.filename.ends_with(".wav"));
        assert_eq!(state.lock().unwrap().stop_calls, 1);

        // WAV data section carries the samples in arrival order.
        let mut reader = hound::WavReader::new(Cursor::new(blob.data)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_failure_leaves_session_idle() {
        let mut session = RecordingSession::new(Box::new(FakeCaptureSource::failing()));
        let err = session.start().unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        assert_eq!(session.state(), RecordingState::Idle);
        assert_eq!(session.elapsed_seconds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_releases_device_and_resets() {
        let (capture, state) = FakeCaptureSource::new(vec![vec![0u8; 2]]);
        let mut session = RecordingSession::new(Box::new(capture));

        session.start().unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        settle().await;

        session.discard();
        assert_eq!(session.state(), RecordingState::Idle);
        assert_eq!(session.elapsed_seconds(), 0);
        assert!(!state.lock().unwrap().started);

        // Tick is gone: time passing no longer advances the counter.
        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(session.elapsed_seconds(), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(600), "10:00");
    }
}
