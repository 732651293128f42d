//! Microphone capture behind a trait seam.
//!
//! The capture source owns the input device exclusively while active and
//! buffers encoded chunks in arrival order. `MicCaptureSource` is the cpal
//! implementation; tests substitute their own.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("audio input device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("capture stream error: {0}")]
    Stream(String),
}

/// Audio encodings a capture source may produce, identified by how samples
/// are laid out in each buffered chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    /// Little-endian 16-bit PCM.
    WavPcmI16,
    /// Little-endian 32-bit float PCM.
    WavPcmF32,
}

impl AudioEncoding {
    pub fn mime_type(&self) -> &'static str {
        "audio/wav"
    }

    pub fn bytes_per_sample(&self) -> usize {
        match self {
            AudioEncoding::WavPcmI16 => 2,
            AudioEncoding::WavPcmF32 => 4,
        }
    }
}

/// Descending preference order for encoding negotiation.
pub const ENCODING_PREFERENCES: &[AudioEncoding] =
    &[AudioEncoding::WavPcmI16, AudioEncoding::WavPcmF32];

/// First preferred encoding the source supports.
pub fn negotiate_encoding(supported: &[AudioEncoding]) -> Option<AudioEncoding> {
    ENCODING_PREFERENCES
        .iter()
        .copied()
        .find(|preference| supported.contains(preference))
}

pub trait CaptureSource {
    fn supported_encodings(&self) -> Vec<AudioEncoding>;

    /// Begin capturing with the negotiated encoding. Clears any chunks left
    /// from a previous run.
    fn start(&mut self, encoding: AudioEncoding) -> Result<(), CaptureError>;

    fn pause(&mut self) -> Result<(), CaptureError>;

    fn resume(&mut self) -> Result<(), CaptureError>;

    /// Stop capturing, release the device, and hand back every buffered
    /// chunk in arrival order.
    fn stop(&mut self) -> Result<Vec<Vec<u8>>, CaptureError>;

    fn is_active(&self) -> bool;

    fn sample_rate(&self) -> u32;
}

pub struct MicCaptureSource {
    device: cpal::Device,
    config: cpal::StreamConfig,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    stream: Option<cpal::Stream>,
    active: bool,
    target_sample_rate: u32,
}

impl MicCaptureSource {
    /// Open the default input device. Fails with `DeviceUnavailable` when
    /// the host has no usable input.
    pub fn new(sample_rate: u32) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            CaptureError::DeviceUnavailable("no default input device".to_string())
        })?;

        info!(
            "Recording source using device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self {
            device,
            config,
            chunks: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            active: false,
            target_sample_rate: sample_rate,
        })
    }
}

impl CaptureSource for MicCaptureSource {
    fn supported_encodings(&self) -> Vec<AudioEncoding> {
        vec![AudioEncoding::WavPcmI16, AudioEncoding::WavPcmF32]
    }

    fn start(&mut self, encoding: AudioEncoding) -> Result<(), CaptureError> {
        if self.active {
            return Err(CaptureError::Stream("source already capturing".to_string()));
        }

        {
            let mut chunks = self.chunks.lock().unwrap();
            chunks.clear();
            chunks.shrink_to_fit();
        }

        let chunks_clone = Arc::clone(&self.chunks);
        let err_fn = |err| error!("Capture stream error: {}", err);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let chunk = encode_chunk(data, encoding);
                    if let Ok(mut chunks) = chunks_clone.lock() {
                        chunks.push(chunk);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;
        self.stream = Some(stream);
        self.active = true;

        info!("Microphone capture started");
        Ok(())
    }

    fn pause(&mut self) -> Result<(), CaptureError> {
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| CaptureError::Stream(e.to_string()))?;
            debug!("Microphone capture paused");
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<(), CaptureError> {
        if let Some(stream) = &self.stream {
            stream
                .play()
                .map_err(|e| CaptureError::Stream(e.to_string()))?;
            debug!("Microphone capture resumed");
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<Vec<u8>>, CaptureError> {
        if !self.active {
            return Err(CaptureError::Stream("source not capturing".to_string()));
        }

        // Dropping the stream releases the device.
        if let Some(stream) = self.stream.take() {
            debug!("Stopping microphone stream");
            drop(stream);
        }
        self.active = false;

        let chunks = {
            let mut guard = self.chunks.lock().unwrap();
            std::mem::take(&mut *guard)
        };

        info!("Microphone stopped, {} chunks captured", chunks.len());
        Ok(chunks)
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn sample_rate(&self) -> u32 {
        self.target_sample_rate
    }
}

impl Drop for MicCaptureSource {
    fn drop(&mut self) {
        if self.active {
            debug!("Dropping active MicCaptureSource, cleaning up");
            let _ = self.stop();
        }
    }
}

fn encode_chunk(data: &[f32], encoding: AudioEncoding) -> Vec<u8> {
    match encoding {
        AudioEncoding::WavPcmI16 => {
            let mut chunk = Vec::with_capacity(data.len() * 2);
            for &sample in data {
                let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                chunk.extend_from_slice(&scaled.to_le_bytes());
            }
            chunk
        }
        AudioEncoding::WavPcmF32 => {
            let mut chunk = Vec::with_capacity(data.len() * 4);
            for &sample in data {
                chunk.extend_from_slice(&sample.to_le_bytes());
            }
            chunk
        }
    }
}
