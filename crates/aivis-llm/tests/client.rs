//! Integration tests for `LlmClient` using wiremock HTTP mocks.

use std::time::Duration;

use aivis_core::Backend;
use aivis_llm::{invoke_with_retry, BaseUrls, LlmClient, LlmError, LlmSettings, RetryPolicy, TextGenerator};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> LlmSettings {
    LlmSettings {
        openai_api_key: Some("sk-test".to_owned()),
        anthropic_api_key: Some("ant-test".to_owned()),
        gemini_api_key: Some("gm-test".to_owned()),
        openai_model: "gpt-4o".to_owned(),
        claude_model: "claude-3-5-sonnet-20241022".to_owned(),
        gemini_model: "gemini-2.0-flash-exp".to_owned(),
        timeout_secs: 5,
    }
}

fn test_client(base_url: &str) -> LlmClient {
    LlmClient::with_base_urls(settings(), BaseUrls::all(base_url))
        .expect("client construction should not fail")
}

fn instant_retries() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff_base: Duration::ZERO,
    }
}

#[tokio::test]
async fn openai_returns_first_choice_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o",
            "temperature": 0.7,
            "messages": [{ "role": "user", "content": "best crm?" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Try Acme or Asana." } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = test_client(&server.uri())
        .invoke(Backend::ChatGpt, "best crm?", 0.7)
        .await
        .expect("should return text");

    assert_eq!(text, "Try Acme or Asana.");
}

#[tokio::test]
async fn anthropic_joins_text_blocks_and_sends_version_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({ "max_tokens": 4096 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [
                { "type": "text", "text": "Acme is " },
                { "type": "tool_use", "id": "x" },
                { "type": "text", "text": "popular." }
            ]
        })))
        .mount(&server)
        .await;

    let text = test_client(&server.uri())
        .invoke(Backend::Claude, "who leads?", 0.0)
        .await
        .expect("should return text");

    assert_eq!(text, "Acme is popular.");
}

#[tokio::test]
async fn gemini_reads_first_candidate_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
        .and(header("x-goog-api-key", "gm-test"))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": { "temperature": 0.7 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Monday.com" } ] } }
            ]
        })))
        .mount(&server)
        .await;

    let text = test_client(&server.uri())
        .invoke(Backend::Gemini, "which tool?", 0.7)
        .await
        .expect("should return text");

    assert_eq!(text, "Monday.com");
}

#[tokio::test]
async fn empty_choice_list_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .invoke(Backend::ChatGpt, "hi", 0.7)
        .await
        .expect_err("empty choices should fail");

    assert!(matches!(err, LlmError::EmptyResponse(Backend::ChatGpt)));
}

#[tokio::test]
async fn missing_key_fails_without_a_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut no_keys = settings();
    no_keys.anthropic_api_key = None;
    let client = LlmClient::with_base_urls(no_keys, BaseUrls::all(&server.uri()))
        .expect("client construction should not fail");

    let err = client
        .invoke(Backend::Claude, "hi", 0.7)
        .await
        .expect_err("missing key should fail");
    assert!(matches!(err, LlmError::MissingApiKey(Backend::Claude)));
}

#[tokio::test]
async fn rate_limit_is_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": { "message": "Rate limit reached for requests" }
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [ { "message": { "content": "third time lucky" } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let text = invoke_with_retry(&client, instant_retries(), Backend::ChatGpt, "hi", 0.7)
        .await
        .expect("third attempt should succeed");

    assert_eq!(text, "third time lucky");
}

#[tokio::test]
async fn server_errors_exhaust_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = invoke_with_retry(&client, instant_retries(), Backend::Gemini, "hi", 0.7)
        .await
        .expect_err("all attempts fail");

    assert!(matches!(err, LlmError::ServerError { status: 503, .. }));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "invalid x-api-key" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = invoke_with_retry(&client, instant_retries(), Backend::Claude, "hi", 0.7)
        .await
        .expect_err("401 is terminal");

    assert_eq!(err.to_string(), "claude API error (HTTP 401): invalid x-api-key");
}
