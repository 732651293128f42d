//! Wire types for the meeting backend.
//!
//! The backend is loose about shapes: status strings vary in case, summary
//! payloads may be nested one level, action items may be bare strings. All
//! normalization happens here so the rest of the crate sees one data model.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Processing status of an uploaded audio record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Processing,
    Completed,
    Failed,
    ConnectionFailed,
    /// Unknown status strings pass through untouched.
    Other(String),
}

impl RecordStatus {
    /// Case-insensitive normalization. A missing status means the record
    /// finished before status tracking existed, so it reads as Completed.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return RecordStatus::Completed;
        };
        match raw.to_ascii_lowercase().as_str() {
            "processing" => RecordStatus::Processing,
            "completed" => RecordStatus::Completed,
            "failed" => RecordStatus::Failed,
            "connection failed" => RecordStatus::ConnectionFailed,
            _ => RecordStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordStatus::Processing => "Processing",
            RecordStatus::Completed => "Completed",
            RecordStatus::Failed => "Failed",
            RecordStatus::ConnectionFailed => "Connection Failed",
            RecordStatus::Other(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecordStatus::Processing)
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Completed
    }
}

impl Serialize for RecordStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(RecordStatus::parse(raw.as_deref()))
    }
}

/// A server-side audio record. The client holds a read-only cached copy
/// refreshed by polling; structural equality drives re-commit suppression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRecord {
    #[serde(rename = "audio_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub upload_time: Option<String>,
    #[serde(rename = "s3_url", default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
}

/// Display ordering: Processing records first, then newest upload first.
pub fn sort_for_display(records: &mut [AudioRecord]) {
    records.sort_by(|a, b| {
        let a_processing = a.status == RecordStatus::Processing;
        let b_processing = b.status == RecordStatus::Processing;
        b_processing
            .cmp(&a_processing)
            .then_with(|| b.upload_time.cmp(&a.upload_time))
    });
}

/// A time-bounded transcript span attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// One element of the transcript response array.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptDoc {
    #[serde(default)]
    pub audio_name: Option<String>,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub audio_name: Option<String>,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// The backend claims segments arrive sorted and non-overlapping but
    /// does not enforce it, so sort defensively by start time here.
    pub fn from_docs(docs: Vec<TranscriptDoc>) -> Self {
        let Some(doc) = docs.into_iter().next() else {
            return Self::default();
        };
        let mut segments = doc.segments;
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self {
            audio_name: doc.audio_name,
            segments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Distinct speakers in first-seen order.
    pub fn speakers(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for segment in &self.segments {
            if let Some(speaker) = &segment.speaker {
                if !seen.contains(speaker) {
                    seen.push(speaker.clone());
                }
            }
        }
        seen
    }

    /// Full transcript text, one line per segment.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgendaItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionItem {
    pub task: String,
}

impl<'de> Deserialize<'de> for ActionItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Object { task: String },
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(task) | Raw::Object { task } => ActionItem { task },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryResult {
    pub narrative: String,
    pub agendas: Vec<AgendaItem>,
    pub action_items: Vec<ActionItem>,
}

impl SummaryResult {
    /// Normalize either payload shape:
    /// `{"summary": {"summary": ..., "agendas": [...], ...}}` or the flat
    /// `{"summary": "...", "agendas": [...], "action_items": [...]}`.
    pub fn from_value(value: &Value) -> Self {
        if let Some(inner) = value.get("summary") {
            if inner.is_object() {
                return Self::parse_flat(inner);
            }
        }
        Self::parse_flat(value)
    }

    fn parse_flat(value: &Value) -> Self {
        let narrative = value
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let agendas = value
            .get("agendas")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let action_items = value
            .get("action_items")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        Self {
            narrative,
            agendas,
            action_items,
        }
    }

    /// An all-empty summary is the backend's way of saying the input was
    /// too short to summarize; render it as that, not as an empty view.
    pub fn is_too_short(&self) -> bool {
        self.narrative.trim().is_empty() && self.agendas.is_empty() && self.action_items.is_empty()
    }
}
