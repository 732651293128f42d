//! End-to-end pipeline behavior against a mock backend.

use std::sync::Arc;
use voxminute::api::ApiClient;
use voxminute::pipeline::{
    ChatThread, MeetingPipeline, PipelineError, StageState, SummaryOutcome, CHAT_FAILURE_FALLBACK,
};
use voxminute::session::Session;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pipeline_for(server: &MockServer) -> MeetingPipeline {
    let session = Session {
        token: Some("tok-123".to_string()),
        username: None,
    };
    let client = Arc::new(ApiClient::new(&server.uri(), session));
    MeetingPipeline::new(client, "en")
}

async fn mount_transcription(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/transcribe/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "audio_name": "standup",
            "segments": [{"start": 0.0, "end": 3.0, "text": "We shipped the beta."}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn transcribe_before_upload_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server);
    let err = pipeline.transcribe().await.unwrap_err();
    assert!(matches!(err, PipelineError::Guard(_)));
}

#[tokio::test]
async fn transcribe_commits_transcript_and_stage() {
    let server = MockServer::start().await;
    mount_transcription(&server).await;

    let pipeline = pipeline_for(&server);
    pipeline.attach_record("a1");
    let transcript = pipeline.transcribe().await.unwrap();
    assert_eq!(transcript.segments.len(), 1);

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.transcribe, StageState::Done);
    assert!(snapshot.transcript.is_some());
}

#[tokio::test]
async fn failed_summarize_keeps_transcript() {
    let server = MockServer::start().await;
    mount_transcription(&server).await;
    Mock::given(method("POST"))
        .and(path("/summarize/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "detail": "summarizer unavailable"
        })))
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server);
    pipeline.attach_record("a1");
    pipeline.transcribe().await.unwrap();

    let err = pipeline.summarize().await.unwrap_err();
    assert!(matches!(err, PipelineError::Api(_)));

    let snapshot = pipeline.snapshot();
    assert_eq!(
        snapshot.summarize,
        StageState::Failed("summarizer unavailable".to_string())
    );
    // The transcript must survive the failed summary.
    assert!(snapshot.transcript.is_some());
    assert_eq!(snapshot.transcribe, StageState::Done);
}

#[tokio::test]
async fn empty_summary_classifies_as_too_short() {
    let server = MockServer::start().await;
    mount_transcription(&server).await;
    Mock::given(method("POST"))
        .and(path("/summarize/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "summary": "",
            "agendas": [],
            "action_items": []
        })))
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server);
    pipeline.attach_record("a1");
    pipeline.transcribe().await.unwrap();

    let outcome = pipeline.summarize().await.unwrap();
    assert_eq!(outcome, SummaryOutcome::TooShort);
    assert_eq!(pipeline.snapshot().summarize, StageState::Done);
}

#[tokio::test]
async fn summarize_parses_nested_summary_payload() {
    let server = MockServer::start().await;
    mount_transcription(&server).await;
    Mock::given(method("POST"))
        .and(path("/summarize/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "summary": {
                "summary": "The beta shipped on time.",
                "agendas": [{"name": "Beta launch", "points": ["timeline"]}],
                "action_items": ["Announce to customers"]
            }
        })))
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server);
    pipeline.attach_record("a1");
    pipeline.transcribe().await.unwrap();

    match pipeline.summarize().await.unwrap() {
        SummaryOutcome::Ready(summary) => {
            assert_eq!(summary.narrative, "The beta shipped on time.");
            assert_eq!(summary.action_items[0].task, "Announce to customers");
        }
        SummaryOutcome::TooShort => panic!("expected a summary"),
    }
}

#[tokio::test]
async fn chat_failure_resolves_thread_with_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = Session {
        token: Some("tok-123".to_string()),
        username: None,
    };
    let client = ApiClient::new(&server.uri(), session);

    let mut thread = ChatThread::new();
    let id = thread.begin("What went wrong?");
    let result = client.chat("a1", "What went wrong?").await;
    thread.complete(id, result);

    let messages = thread.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, CHAT_FAILURE_FALLBACK);
}
