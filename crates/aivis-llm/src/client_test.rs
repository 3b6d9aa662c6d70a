use super::*;

fn settings() -> LlmSettings {
    LlmSettings {
        openai_api_key: Some("sk-openai".to_owned()),
        anthropic_api_key: None,
        gemini_api_key: Some("gm-key".to_owned()),
        openai_model: "gpt-4o".to_owned(),
        claude_model: "claude-3-5-sonnet-20241022".to_owned(),
        gemini_model: "gemini-2.0-flash-exp".to_owned(),
        timeout_secs: 30,
    }
}

fn test_client(base_url: &str) -> LlmClient {
    LlmClient::with_base_urls(settings(), BaseUrls::all(base_url))
        .expect("client construction should not fail")
}

#[test]
fn endpoint_urls_strip_trailing_slash() {
    let client = test_client("http://localhost:9999/");
    assert_eq!(
        client.openai_url(),
        "http://localhost:9999/v1/chat/completions"
    );
    assert_eq!(client.anthropic_url(), "http://localhost:9999/v1/messages");
    assert_eq!(
        client.gemini_url(),
        "http://localhost:9999/v1beta/models/gemini-2.0-flash-exp:generateContent"
    );
}

#[test]
fn missing_key_is_reported_per_backend() {
    let client = test_client("http://localhost:9999");
    assert!(client.api_key(Backend::ChatGpt).is_ok());
    assert!(matches!(
        client.api_key(Backend::Claude),
        Err(LlmError::MissingApiKey(Backend::Claude))
    ));
}

#[test]
fn status_429_maps_to_rate_limited() {
    let body = r#"{"error":{"message":"Too many requests"}}"#;
    let err = status_error(Backend::ChatGpt, StatusCode::TOO_MANY_REQUESTS, body);
    assert!(matches!(err, LlmError::RateLimited { ref message, .. } if message == "Too many requests"));
}

#[test]
fn status_5xx_maps_to_server_error() {
    let err = status_error(Backend::Gemini, StatusCode::SERVICE_UNAVAILABLE, "overloaded");
    assert!(matches!(err, LlmError::ServerError { status: 503, .. }));
}

#[test]
fn status_4xx_keeps_provider_message() {
    let body = r#"{"error":{"message":"model not found"}}"#;
    let err = status_error(Backend::Claude, StatusCode::NOT_FOUND, body);
    assert_eq!(
        err.to_string(),
        "claude API error (HTTP 404): model not found"
    );
}

#[test]
fn settings_debug_redacts_keys() {
    let rendered = format!("{:?}", settings());
    assert!(!rendered.contains("sk-openai"));
    assert!(rendered.contains("[redacted]"));
}
