pub mod capture;
pub mod session;

pub use capture::{
    negotiate_encoding, AudioEncoding, CaptureError, CaptureSource, MicCaptureSource,
    ENCODING_PREFERENCES,
};
pub use session::{format_duration, RecordingBlob, RecordingSession, RecordingState};
