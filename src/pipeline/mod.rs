//! Upload → transcribe → summarize pipeline.
//!
//! Each stage tracks its own state so a failure in one leaves the others'
//! results intact: a failed summarize never clears a fetched transcript.
//! Stage results are committed through generation counters so a stale
//! response from a superseded request cannot overwrite a newer one.

pub mod chat;

use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, SummaryResult, Transcript, UploadRequest};

pub use chat::{ChatMessage, ChatRole, ChatThread, Delivery, CHAT_FAILURE_FALLBACK};

#[derive(Debug, Clone, PartialEq)]
pub enum StageState {
    Idle,
    Running,
    Failed(String),
    Done,
}

impl StageState {
    pub fn is_running(&self) -> bool {
        matches!(self, StageState::Running)
    }
}

/// Summarization either produced content or determined the audio was too
/// short to say anything about.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    TooShort,
    Ready(SummaryResult),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage was invoked before its prerequisite completed.
    #[error("{0}")]
    Guard(&'static str),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone)]
pub struct PipelineSnapshot {
    pub record_id: Option<String>,
    pub upload: StageState,
    pub transcribe: StageState,
    pub summarize: StageState,
    pub transcript: Option<Transcript>,
    pub summary: Option<SummaryResult>,
}

struct PipelineInner {
    record_id: Option<String>,
    upload: StageState,
    transcribe: StageState,
    summarize: StageState,
    transcript: Option<Transcript>,
    summary: Option<SummaryResult>,
    transcribe_gen: u64,
    summarize_gen: u64,
}

pub struct MeetingPipeline {
    client: Arc<ApiClient>,
    language: String,
    inner: Arc<Mutex<PipelineInner>>,
}

impl MeetingPipeline {
    pub fn new(client: Arc<ApiClient>, language: &str) -> Self {
        Self {
            client,
            language: language.to_string(),
            inner: Arc::new(Mutex::new(PipelineInner {
                record_id: None,
                upload: StageState::Idle,
                transcribe: StageState::Idle,
                summarize: StageState::Idle,
                transcript: None,
                summary: None,
                transcribe_gen: 0,
                summarize_gen: 0,
            })),
        }
    }

    /// Bind the pipeline to an already-uploaded record.
    pub fn attach_record(&self, record_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.record_id = Some(record_id.to_string());
        inner.upload = StageState::Done;
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        let inner = self.inner.lock().unwrap();
        PipelineSnapshot {
            record_id: inner.record_id.clone(),
            upload: inner.upload.clone(),
            transcribe: inner.transcribe.clone(),
            summarize: inner.summarize.clone(),
            transcript: inner.transcript.clone(),
            summary: inner.summary.clone(),
        }
    }

    pub fn record_id(&self) -> Option<String> {
        self.inner.lock().unwrap().record_id.clone()
    }

    pub fn transcript(&self) -> Option<Transcript> {
        self.inner.lock().unwrap().transcript.clone()
    }

    /// Upload the audio and bind the returned record id.
    pub async fn upload(&self, request: &UploadRequest) -> Result<String, PipelineError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.upload = StageState::Running;
        }

        match self.client.upload_audio(request).await {
            Ok(record_id) => {
                let mut inner = self.inner.lock().unwrap();
                inner.record_id = Some(record_id.clone());
                inner.upload = StageState::Done;
                info!("Upload complete, record {}", record_id);
                Ok(record_id)
            }
            Err(e) => {
                let mut inner = self.inner.lock().unwrap();
                inner.upload = StageState::Failed(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Request transcription for the bound record. Requires a completed
    /// upload.
    pub async fn transcribe(&self) -> Result<Transcript, PipelineError> {
        let (record_id, generation) = {
            let mut inner = self.inner.lock().unwrap();
            let Some(record_id) = inner.record_id.clone() else {
                return Err(PipelineError::Guard(
                    "no audio has been uploaded for this session",
                ));
            };
            inner.transcribe = StageState::Running;
            inner.transcribe_gen += 1;
            (record_id, inner.transcribe_gen)
        };

        let result = self
            .client
            .request_transcription(&record_id, &self.language)
            .await;
        self.commit_transcript(generation, result)
    }

    /// Fetch an existing transcript without requesting a new transcription.
    pub async fn fetch_transcript(&self) -> Result<Transcript, PipelineError> {
        let (record_id, generation) = {
            let mut inner = self.inner.lock().unwrap();
            let Some(record_id) = inner.record_id.clone() else {
                return Err(PipelineError::Guard(
                    "no audio has been uploaded for this session",
                ));
            };
            inner.transcribe = StageState::Running;
            inner.transcribe_gen += 1;
            (record_id, inner.transcribe_gen)
        };

        let result = self.client.get_transcript(&record_id).await;
        self.commit_transcript(generation, result)
    }

    fn commit_transcript(
        &self,
        generation: u64,
        result: Result<Transcript, ApiError>,
    ) -> Result<Transcript, PipelineError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.transcribe_gen != generation {
            warn!("Discarding superseded transcription result");
            return result.map_err(PipelineError::Api);
        }
        match result {
            Ok(transcript) => {
                inner.transcript = Some(transcript.clone());
                inner.transcribe = StageState::Done;
                Ok(transcript)
            }
            Err(e) => {
                inner.transcribe = StageState::Failed(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Summarize the transcript. Requires a non-empty transcript; an
    /// all-empty summary response classifies as `TooShort`.
    pub async fn summarize(&self) -> Result<SummaryOutcome, PipelineError> {
        let (record_id, generation) = {
            let mut inner = self.inner.lock().unwrap();
            let has_transcript = inner
                .transcript
                .as_ref()
                .map(|t| !t.is_empty())
                .unwrap_or(false);
            if !has_transcript {
                return Err(PipelineError::Guard(
                    "a transcript is required before summarizing",
                ));
            }
            let Some(record_id) = inner.record_id.clone() else {
                return Err(PipelineError::Guard(
                    "no audio has been uploaded for this session",
                ));
            };
            inner.summarize = StageState::Running;
            inner.summarize_gen += 1;
            (record_id, inner.summarize_gen)
        };

        let result = self
            .client
            .request_summary(&record_id, &self.language)
            .await;

        let mut inner = self.inner.lock().unwrap();
        if inner.summarize_gen != generation {
            warn!("Discarding superseded summary result");
            return match result {
                Ok(summary) if summary.is_too_short() => Ok(SummaryOutcome::TooShort),
                Ok(summary) => Ok(SummaryOutcome::Ready(summary)),
                Err(e) => Err(e.into()),
            };
        }
        match result {
            Ok(summary) => {
                inner.summarize = StageState::Done;
                if summary.is_too_short() {
                    Ok(SummaryOutcome::TooShort)
                } else {
                    inner.summary = Some(summary.clone());
                    Ok(SummaryOutcome::Ready(summary))
                }
            }
            Err(e) => {
                // The transcript stays; only the summarize stage fails.
                inner.summarize = StageState::Failed(e.user_message());
                Err(e.into())
            }
        }
    }
}
