//! Integration tests for `OllamaClient` using wiremock HTTP mocks.

use std::time::Duration;

use revan_analyzer::{Analyzer, AnalyzerError, ModelBackend, OllamaClient};
use revan_core::{FailureKind, ParseQuality, Review, Sentiment};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OllamaClient {
    OllamaClient::with_base_url(base_url, "mistral", 5).expect("client construction should not fail")
}

fn generate_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "mistral",
        "created_at": "2024-05-01T12:00:00Z",
        "response": text,
        "done": true
    }))
}

#[tokio::test]
async fn generate_returns_trimmed_response_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(generate_reply("  Positive | quality | Solid build \n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let text = client.generate("prompt").await.expect("should generate");
    assert_eq!(text, "Positive | quality | Solid build");
}

#[tokio::test]
async fn generate_sends_model_prompt_and_sampling_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "mistral",
            "prompt": "hello",
            "stream": false,
            "options": { "temperature": 0.5, "top_p": 0.75 }
        })))
        .respond_with(generate_reply("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_sampling(0.5, 0.75);
    assert_eq!(client.generate("hello").await.unwrap(), "ok");
}

#[tokio::test]
async fn server_error_is_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .generate("prompt")
        .await
        .unwrap_err();
    assert!(
        matches!(err, AnalyzerError::UnexpectedStatus { status: 500, .. }),
        "got: {err:?}"
    );
    assert_eq!(err.kind(), FailureKind::HttpStatus);
}

#[tokio::test]
async fn non_json_body_is_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .generate("prompt")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::Deserialize { .. }), "got: {err:?}");
    assert_eq!(err.kind(), FailureKind::MalformedResponse);
}

#[tokio::test]
async fn slow_endpoint_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(generate_reply("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = OllamaClient::with_base_url(&server.uri(), "mistral", 1).unwrap();
    let err = client.generate("prompt").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Timeout, "got: {err:?}");
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let client = test_client("http://127.0.0.1:1");
    let err = client.generate("prompt").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Unreachable, "got: {err:?}");
}

#[tokio::test]
async fn retries_are_off_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client(&server.uri()).generate("prompt").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn retries_transient_status_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(generate_reply("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retries(3, 0);
    assert_eq!(client.generate("prompt").await.unwrap(), "recovered");
}

#[tokio::test]
async fn does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid options"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retries(3, 0);
    let err = client.generate("prompt").await.unwrap_err();
    assert!(matches!(err, AnalyzerError::UnexpectedStatus { status: 400, .. }));
}

#[tokio::test]
async fn generate_not_found_is_model_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": "model 'mistral' not found, try pulling it first"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retries(3, 0);
    let err = client.generate("prompt").await.unwrap_err();
    assert!(
        matches!(err, AnalyzerError::ModelNotFound { ref model } if model == "mistral"),
        "got: {err:?}"
    );
    assert!(err.kind().counts_toward_abort());
}

#[tokio::test]
async fn list_models_and_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "mistral:latest", "size": 4_109_865_159_u64 },
                { "name": "llama3:8b" }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert_eq!(
        client.list_models().await.unwrap(),
        ["mistral:latest", "llama3:8b"]
    );
    client.health().await.expect("healthy");
}

#[tokio::test]
async fn health_fails_when_model_is_not_installed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{ "name": "llama3:8b" }, { "name": "mistral-nemo:latest" }]
        })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).health().await.unwrap_err();
    assert!(matches!(err, AnalyzerError::ModelNotFound { ref model } if model == "mistral"));
    assert_eq!(err.kind(), FailureKind::ModelNotFound);
}

#[tokio::test]
async fn health_fails_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).health().await.unwrap_err();
    assert!(matches!(err, AnalyzerError::UnexpectedStatus { status: 502, .. }));
}

#[tokio::test]
async fn analyzer_over_http_parses_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(generate_reply(
            "Positive | delivery,quality | Fast shipping, great quality",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = Analyzer::new(test_client(&server.uri()));
    let result = analyzer
        .analyze(&Review::new("Came next day, very sturdy"), "r1")
        .await
        .unwrap();
    assert_eq!(result.sentiment, Sentiment::Positive);
    assert_eq!(result.topics_joined(), "delivery;quality");
    assert_eq!(result.summary, "Fast shipping, great quality");
    assert_eq!(result.parse, ParseQuality::Full);
}

#[tokio::test]
async fn missing_response_field_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&server)
        .await;

    let analyzer = Analyzer::new(test_client(&server.uri()));
    let err = analyzer
        .analyze(&Review::new("fine"), "r1")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::EmptyResponse));
    assert_eq!(err.kind(), FailureKind::EmptyResponse);
}
