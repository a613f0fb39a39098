//! HttpVoiceService against a mock voice service.

use mentor_voice::api::{
    CloneRequest, HttpVoiceService, QuotePosition, ServiceError, SpeechRequest, VoiceService,
};
use mentor_voice::config::ApiConfig;
use mockito::{Matcher, Server};
use serde_json::json;

fn service_for(server: &Server) -> HttpVoiceService {
    HttpVoiceService::new(&ApiConfig {
        base_url: format!("{}/", server.url()),
        ..ApiConfig::default()
    })
    .expect("client builds")
}

#[tokio::test]
async fn clone_voice_posts_samples_and_returns_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/clone_voice")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "voice_name": "Coach",
            "voice_samples": ["AAEC", "AwQF"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"voice_id": "abc123"}"#)
        .create_async()
        .await;

    let service = service_for(&server);
    let id = service
        .clone_voice(&CloneRequest {
            voice_name: "Coach".into(),
            voice_samples: vec!["AAEC".into(), "AwQF".into()],
        })
        .await
        .unwrap();

    assert_eq!(id, "abc123");
    mock.assert_async().await;
}

#[tokio::test]
async fn clone_voice_without_id_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/clone_voice")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let err = service_for(&server)
        .clone_voice(&CloneRequest {
            voice_name: "Coach".into(),
            voice_samples: vec!["AAEC".into()],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::MissingField("voice_id")));
}

#[tokio::test]
async fn text_to_speech_sends_options_and_returns_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/text_to_speech")
        .match_body(Matcher::Json(json!({
            "text": "Test text",
            "voice_id": "abc123",
            "include_quote": true,
            "quote_position": "end"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"audio": "SUQz", "text": "Test text Keep going."}"#)
        .create_async()
        .await;

    let payload = service_for(&server)
        .text_to_speech(&SpeechRequest {
            text: "Test text".into(),
            voice_id: "abc123".into(),
            include_quote: true,
            quote_position: QuotePosition::End,
        })
        .await
        .unwrap();

    assert_eq!(payload.audio, "SUQz");
    assert_eq!(payload.text.as_deref(), Some("Test text Keep going."));
    mock.assert_async().await;
}

#[tokio::test]
async fn error_status_surfaces_error_field() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/text_to_speech")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "Text and voice_id are required"}"#)
        .create_async()
        .await;

    let err = service_for(&server)
        .text_to_speech(&SpeechRequest {
            text: "x".into(),
            voice_id: "v".into(),
            include_quote: false,
            quote_position: QuotePosition::Start,
        })
        .await
        .unwrap_err();

    match err {
        ServiceError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Text and voice_id are required");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let service = HttpVoiceService::new(&ApiConfig {
        base_url: "http://127.0.0.1:1".into(),
        connect_timeout_ms: 500,
        timeout_secs: 2,
    })
    .unwrap();

    let err = service
        .clone_voice(&CloneRequest {
            voice_name: "Coach".into(),
            voice_samples: vec![],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Transport(_)));
}
