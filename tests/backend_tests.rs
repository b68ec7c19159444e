//! HTTP backends against mock servers

use inner_voice::backend::{
    BackendRequest, GeminiBackend, HttpBackend, InferenceBackend, TRANSPORT_FAILURE_MESSAGE,
};
use inner_voice::session::{Turn, UtteranceSource};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request_with_context() -> BackendRequest {
    BackendRequest {
        persona: "Philosopher".to_string(),
        context: vec![
            Turn::user("I can't sleep", "Philosopher", UtteranceSource::Voice),
            Turn::assistant("Rest is also a practice.", "Philosopher"),
        ],
        text: "I feel stuck".to_string(),
    }
}

#[tokio::test]
async fn test_http_backend_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .and(body_partial_json(json!({
            "userText": "I feel stuck",
            "persona": "Philosopher",
            "chatHistory": [
                {"role": "user", "parts": [{"text": "I can't sleep"}]},
                {"role": "model", "parts": [{"text": "Rest is also a practice."}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseText": "Sit with the discomfort; clarity follows."
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let reply = backend.generate(&request_with_context()).await.unwrap();

    assert_eq!(reply.text, "Sit with the discomfort; clarity follows.");
}

#[tokio::test]
async fn test_http_backend_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "AI Error: Could not generate response. Check your Gemini API key.",
            "details": "API key not valid"
        })))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let err = backend.generate(&request_with_context()).await.unwrap_err();

    assert_eq!(
        err.message,
        "AI Error: Could not generate response. Check your Gemini API key."
    );
    assert_eq!(err.details.as_deref(), Some("API key not valid"));
    assert_eq!(err.status, Some(500));
}

#[tokio::test]
async fn test_http_backend_error_without_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let err = backend.generate(&request_with_context()).await.unwrap_err();

    assert_eq!(err.message, "Unknown server error.");
    assert_eq!(err.status, Some(502));
}

#[tokio::test]
async fn test_http_backend_malformed_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let err = backend.generate(&request_with_context()).await.unwrap_err();

    assert_eq!(err.status, Some(200));
    assert!(err.details.is_some());
}

#[tokio::test]
async fn test_http_backend_blank_reply_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/process-text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responseText": "  "})))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    assert!(backend.generate(&request_with_context()).await.is_err());
}

#[tokio::test]
async fn test_http_backend_unreachable() {
    // Bind then release a port so nothing is listening on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(format!("http://{}", addr));
    let err = backend.generate(&request_with_context()).await.unwrap_err();

    assert_eq!(err.message, TRANSPORT_FAILURE_MESSAGE);
    assert!(err.status.is_none());
    assert!(err.details.is_some());
}

#[tokio::test]
async fn test_gemini_backend_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "I can't sleep"}]},
                {"role": "model", "parts": [{"text": "Rest is also a practice."}]},
                {"role": "user", "parts": [{"text": "I feel stuck"}]}
            ],
            "generationConfig": {"temperature": 0.5}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Sit with the discomfort; "}, {"text": "clarity follows."}]
                }
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = GeminiBackend::new("test-key")
        .with_base_url(mock_server.uri())
        .with_temperature(0.5);
    let reply = backend.generate(&request_with_context()).await.unwrap();

    assert_eq!(reply.text, "Sit with the discomfort; clarity follows.");
}

#[tokio::test]
async fn test_gemini_backend_rejected_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "API key not valid.",
                "status": "PERMISSION_DENIED"
            }
        })))
        .mount(&mock_server)
        .await;

    let backend = GeminiBackend::new("bad-key").with_base_url(mock_server.uri());
    let err = backend.generate(&request_with_context()).await.unwrap_err();

    assert_eq!(
        err.message,
        "AI Error: Could not generate response. Check your Gemini API key."
    );
    assert_eq!(
        err.details.as_deref(),
        Some("PERMISSION_DENIED: API key not valid.")
    );
    assert_eq!(err.status, Some(403));
}

#[tokio::test]
async fn test_gemini_backend_no_candidates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&mock_server)
        .await;

    let backend = GeminiBackend::new("key").with_base_url(mock_server.uri());
    let err = backend.generate(&request_with_context()).await.unwrap_err();

    assert_eq!(err.message, "The inference service returned an empty response.");
}
