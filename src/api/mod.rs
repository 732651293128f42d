pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, UploadRequest};
pub use error::ApiError;
pub use types::{
    sort_for_display, ActionItem, AgendaItem, AudioRecord, RecordStatus, SummaryResult, Transcript,
    TranscriptDoc, TranscriptSegment,
};
