//! HTTP client for the meeting backend.
//!
//! One method per endpoint: register/login, audio upload/list/delete,
//! transcript and summary retrieval/creation, and chat. Authenticated calls
//! attach the session token as a `token` header.

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, info};

use super::error::ApiError;
use super::types::{AudioRecord, SummaryResult, Transcript, TranscriptDoc};
use crate::session::Session;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

/// A file queued for upload, with its processing options.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub language: String,
    pub diarization: bool,
    pub hotwords: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Session) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token.as_deref() {
            Some(token) if !token.is_empty() => builder.header("token", token),
            _ => builder,
        }
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    async fn json_body(response: reqwest::Response) -> Result<Value, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/register/"))
            .json(&Credentials { username, password })
            .send()
            .await?;
        Self::ensure_success(response).await?;
        info!("Registered user {}", username);
        Ok(())
    }

    /// Log in, returning the bearer token to persist client-side.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.url("/login/"))
            .json(&Credentials { username, password })
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let value = Self::json_body(response).await?;
        value
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("login response missing token".to_string()))
    }

    /// Upload audio as multipart form data. Hotwords are repeated form
    /// entries; blank entries are skipped.
    pub async fn upload_audio(&self, upload: &UploadRequest) -> Result<String, ApiError> {
        let part = Part::bytes(upload.data.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime_type)?;

        let mut form = Form::new().part("file", part);
        for hotword in &upload.hotwords {
            if !hotword.trim().is_empty() {
                form = form.text("hotwords", hotword.clone());
            }
        }
        form = form
            .text("language", upload.language.clone())
            .text("diarization", if upload.diarization { "true" } else { "false" });

        debug!(
            "Uploading {} ({} bytes, language={}, diarization={})",
            upload.filename,
            upload.data.len(),
            upload.language,
            upload.diarization
        );

        let response = self
            .authed(self.http.post(self.url("/audio")))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let value = Self::json_body(response).await?;

        value
            .get("audio_id")
            .or_else(|| value.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("upload response missing audio_id".to_string()))
    }

    pub async fn list_records(&self) -> Result<Vec<AudioRecord>, ApiError> {
        let response = self.authed(self.http.get(self.url("/audio"))).send().await?;
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn delete_record(&self, record_id: &str) -> Result<(), ApiError> {
        let response = self
            .authed(self.http.delete(self.url(&format!("/audio/{record_id}"))))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        info!("Deleted record {}", record_id);
        Ok(())
    }

    pub async fn get_transcript(&self, record_id: &str) -> Result<Transcript, ApiError> {
        let response = self
            .authed(
                self.http
                    .get(self.url(&format!("/transcribe/audio/{record_id}/"))),
            )
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let value = Self::json_body(response).await?;
        transcript_from_value(value)
    }

    /// Request transcription for an uploaded record and return the produced
    /// transcript.
    pub async fn request_transcription(
        &self,
        record_id: &str,
        language: &str,
    ) -> Result<Transcript, ApiError> {
        let response = self
            .authed(self.http.post(self.url("/transcribe/")))
            .form(&[("audio_id", record_id), ("language", language)])
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let value = Self::json_body(response).await?;
        transcript_from_value(value)
    }

    pub async fn get_summary(&self, record_id: &str) -> Result<SummaryResult, ApiError> {
        let response = self
            .authed(
                self.http
                    .get(self.url(&format!("/summarize/audio/{record_id}/"))),
            )
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let value = Self::json_body(response).await?;
        Ok(SummaryResult::from_value(&value))
    }

    pub async fn request_summary(
        &self,
        record_id: &str,
        language: &str,
    ) -> Result<SummaryResult, ApiError> {
        let response = self
            .authed(self.http.post(self.url("/summarize/")))
            .form(&[("audio_id", record_id), ("language", language)])
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let value = Self::json_body(response).await?;
        Ok(SummaryResult::from_value(&value))
    }

    /// Ask a free-form question against a record's transcript/summary
    /// context.
    pub async fn chat(&self, record_id: &str, user_message: &str) -> Result<String, ApiError> {
        let form = Form::new()
            .text("audio_id", record_id.to_string())
            .text("user_message", user_message.to_string());

        let response = self
            .authed(self.http.post(self.url("/chat/")))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let value = Self::json_body(response).await?;
        Ok(chat_reply_from_value(&value))
    }
}

/// The transcript endpoints return either an array of documents or one bare
/// document.
fn transcript_from_value(value: Value) -> Result<Transcript, ApiError> {
    if value.is_array() {
        let docs: Vec<TranscriptDoc> =
            serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
        return Ok(Transcript::from_docs(docs));
    }
    let doc: TranscriptDoc =
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(Transcript::from_docs(vec![doc]))
}

/// The chat endpoint's reply lives under `response`, which may itself be a
/// string or an object keyed `answer`/`output`.
fn chat_reply_from_value(value: &Value) -> String {
    match value.get("response") {
        Some(Value::String(reply)) => reply.clone(),
        Some(nested @ Value::Object(_)) => nested
            .get("answer")
            .or_else(|| nested.get("output"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| nested.to_string()),
        _ => "I cannot answer this question.".to_string(),
    }
}
