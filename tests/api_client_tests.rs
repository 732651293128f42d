//! HTTP contract tests for the backend client, against a mock server.

use voxminute::api::{ApiClient, RecordStatus, UploadRequest};
use voxminute::session::Session;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn logged_in_client(server: &MockServer) -> ApiClient {
    let session = Session {
        token: Some("tok-123".to_string()),
        username: Some("alice".to_string()),
    };
    ApiClient::new(&server.uri(), session)
}

fn upload_request() -> UploadRequest {
    UploadRequest {
        data: vec![1, 2, 3, 4],
        filename: "demo.wav".to_string(),
        mime_type: "audio/wav".to_string(),
        language: "en".to_string(),
        diarization: false,
        hotwords: Vec::new(),
    }
}

#[tokio::test]
async fn login_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/"))
        .and(body_string_contains("alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "tok-123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Session::default());
    let token = client.login("alice", "hunter2").await.unwrap();
    assert_eq!(token, "tok-123");
}

#[tokio::test]
async fn upload_sends_multipart_fields_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio"))
        .and(header("token", "tok-123"))
        .and(body_string_contains("demo.wav"))
        .and(body_string_contains("language"))
        .and(body_string_contains("diarization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "audio_id": "a1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server);
    let record_id = client.upload_audio(&upload_request()).await.unwrap();
    assert_eq!(record_id, "a1");
}

#[tokio::test]
async fn upload_skips_blank_hotwords() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio"))
        .and(body_string_contains("kubernetes"))
        .and(body_string_contains("istio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "audio_id": "a1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server);
    let mut request = upload_request();
    request.hotwords = vec![
        "kubernetes".to_string(),
        "   ".to_string(),
        "istio".to_string(),
    ];
    client.upload_audio(&request).await.unwrap();

    let received = &server.received_requests().await.unwrap()[0];
    let body = String::from_utf8_lossy(&received.body);
    assert_eq!(body.matches("name=\"hotwords\"").count(), 2);
}

#[tokio::test]
async fn upload_error_surfaces_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio"))
        .respond_with(ResponseTemplate::new(413).set_body_json(serde_json::json!({
            "detail": "File too large. Maximum size is 100MB."
        })))
        .mount(&server)
        .await;

    let client = logged_in_client(&server);
    let err = client.upload_audio(&upload_request()).await.unwrap_err();
    assert_eq!(err.user_message(), "File too large. Maximum size is 100MB.");
}

#[tokio::test]
async fn list_records_parses_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio"))
        .and(header("token", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "audio_id": "a1",
                "filename": "standup.wav",
                "upload_time": "2024-10-26T10:00:00",
                "s3_url": "https://bucket/a1.wav",
                "status": "processing"
            },
            {
                "audio_id": "a2",
                "filename": "retro.wav",
                "status": "Completed"
            }
        ])))
        .mount(&server)
        .await;

    let client = logged_in_client(&server);
    let records = client.list_records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, RecordStatus::Processing);
    assert_eq!(records[1].status, RecordStatus::Completed);
}

#[tokio::test]
async fn list_records_404_reads_as_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = logged_in_client(&server);
    let err = client.list_records().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn transcript_array_response_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transcribe/audio/a1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "audio_name": "standup",
                "segments": [
                    {"start": 0.0, "end": 3.2, "speaker": "SPEAKER_00", "text": "Good morning."},
                    {"start": 3.5, "end": 6.0, "speaker": "SPEAKER_01", "text": "Hi all."}
                ]
            }
        ])))
        .mount(&server)
        .await;

    let client = logged_in_client(&server);
    let transcript = client.get_transcript("a1").await.unwrap();
    assert_eq!(transcript.audio_name.as_deref(), Some("standup"));
    assert_eq!(transcript.segments.len(), 2);
    assert_eq!(
        transcript.speakers(),
        vec!["SPEAKER_00".to_string(), "SPEAKER_01".to_string()]
    );
}

#[tokio::test]
async fn request_transcription_posts_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transcribe/"))
        .and(body_string_contains("audio_id=a1"))
        .and(body_string_contains("language=en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "segments": [{"start": 0.0, "end": 1.0, "text": "hello"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server);
    let transcript = client.request_transcription("a1", "en").await.unwrap();
    assert_eq!(transcript.segments[0].text, "hello");
}

#[tokio::test]
async fn chat_reply_falls_back_when_response_missing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .and(body_string_contains("user_message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok"
        })))
        .mount(&server)
        .await;

    let client = logged_in_client(&server);
    let reply = client.chat("a1", "What was decided?").await.unwrap();
    assert_eq!(reply, "I cannot answer this question.");
}

#[tokio::test]
async fn delete_record_hits_record_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/audio/a1"))
        .and(header("token", "tok-123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server);
    client.delete_record("a1").await.unwrap();
}
