//! HTTP client for the OpenAI, Anthropic and Gemini text-generation APIs.
//!
//! One `reqwest::Client` is shared by all three backends. Each backend has
//! its own base URL so tests can point any of them at a mock server.

use std::time::Duration;

use aivis_core::{AppConfig, Backend};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::LlmError;
use crate::generator::TextGenerator;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorEnvelope, GeminiContent,
    GeminiPart, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    MessagesRequest, MessagesResponse,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 4096;

/// Credentials and model names for each backend.
#[derive(Clone)]
pub struct LlmSettings {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_model: String,
    pub claude_model: String,
    pub gemini_model: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_model", &self.openai_model)
            .field("claude_model", &self.claude_model)
            .field("gemini_model", &self.gemini_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LlmSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            openai_api_key: config.openai_api_key.clone(),
            anthropic_api_key: config.anthropic_api_key.clone(),
            gemini_api_key: config.gemini_api_key.clone(),
            openai_model: config.openai_model.clone(),
            claude_model: config.claude_model.clone(),
            gemini_model: config.gemini_model.clone(),
            timeout_secs: config.llm_request_timeout_secs,
        }
    }
}

/// Base URLs per backend, without trailing slash.
#[derive(Debug, Clone)]
pub struct BaseUrls {
    pub openai: String,
    pub anthropic: String,
    pub gemini: String,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            openai: OPENAI_BASE_URL.to_owned(),
            anthropic: ANTHROPIC_BASE_URL.to_owned(),
            gemini: GEMINI_BASE_URL.to_owned(),
        }
    }
}

impl BaseUrls {
    /// Points every backend at the same server (for wiremock).
    #[must_use]
    pub fn all(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_owned();
        Self {
            openai: base.clone(),
            anthropic: base.clone(),
            gemini: base,
        }
    }
}

/// Production [`TextGenerator`] speaking each provider's native HTTP API.
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
    base_urls: BaseUrls,
}

impl LlmClient {
    /// Creates a client pointed at the production provider endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        Self::with_base_urls(settings, BaseUrls::default())
    }

    /// Creates a client with custom base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn with_base_urls(settings: LlmSettings, base_urls: BaseUrls) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("aivis/0.1 (answer-visibility)")
            .build()?;

        Ok(Self {
            client,
            settings,
            base_urls: BaseUrls {
                openai: base_urls.openai.trim_end_matches('/').to_owned(),
                anthropic: base_urls.anthropic.trim_end_matches('/').to_owned(),
                gemini: base_urls.gemini.trim_end_matches('/').to_owned(),
            },
        })
    }

    fn api_key(&self, backend: Backend) -> Result<&str, LlmError> {
        let key = match backend {
            Backend::ChatGpt => self.settings.openai_api_key.as_deref(),
            Backend::Claude => self.settings.anthropic_api_key.as_deref(),
            Backend::Gemini => self.settings.gemini_api_key.as_deref(),
        };
        key.ok_or(LlmError::MissingApiKey(backend))
    }

    fn openai_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_urls.openai)
    }

    fn anthropic_url(&self) -> String {
        format!("{}/v1/messages", self.base_urls.anthropic)
    }

    fn gemini_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_urls.gemini, self.settings.gemini_model
        )
    }

    async fn invoke_openai(&self, prompt: &str, temperature: f64) -> Result<String, LlmError> {
        let key = self.api_key(Backend::ChatGpt)?;
        let body = ChatCompletionRequest {
            model: &self.settings.openai_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };
        let request = self.client.post(self.openai_url()).bearer_auth(key).json(&body);
        let response: ChatCompletionResponse = send_json(Backend::ChatGpt, request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse(Backend::ChatGpt))
    }

    async fn invoke_anthropic(&self, prompt: &str, temperature: f64) -> Result<String, LlmError> {
        let key = self.api_key(Backend::Claude)?;
        let body = MessagesRequest {
            model: &self.settings.claude_model,
            max_tokens: ANTHROPIC_MAX_TOKENS,
            temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let request = self
            .client
            .post(self.anthropic_url())
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let response: MessagesResponse = send_json(Backend::Claude, request).await?;

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        non_empty(Backend::Claude, text)
    }

    async fn invoke_gemini(&self, prompt: &str, temperature: f64) -> Result<String, LlmError> {
        let key = self.api_key(Backend::Gemini)?;
        let body = GenerateContentRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature },
        };
        let request = self
            .client
            .post(self.gemini_url())
            .header("x-goog-api-key", key)
            .json(&body);
        let response: GenerateContentResponse = send_json(Backend::Gemini, request).await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        non_empty(Backend::Gemini, text)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn invoke(
        &self,
        backend: Backend,
        prompt: &str,
        temperature: f64,
    ) -> Result<String, LlmError> {
        tracing::debug!(backend = %backend, prompt_chars = prompt.chars().count(), "invoking backend");
        match backend {
            Backend::ChatGpt => self.invoke_openai(prompt, temperature).await,
            Backend::Claude => self.invoke_anthropic(prompt, temperature).await,
            Backend::Gemini => self.invoke_gemini(prompt, temperature).await,
        }
    }
}

fn non_empty(backend: Backend, text: String) -> Result<String, LlmError> {
    if text.trim().is_empty() {
        Err(LlmError::EmptyResponse(backend))
    } else {
        Ok(text)
    }
}

/// Sends the request, maps non-2xx statuses to typed errors, and decodes the
/// body as `T`.
async fn send_json<T: DeserializeOwned>(
    backend: Backend,
    request: RequestBuilder,
) -> Result<T, LlmError> {
    let response = request.send().await.map_err(|e| classify_transport(backend, e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| classify_transport(backend, e))?;

    if !status.is_success() {
        return Err(status_error(backend, status, &body));
    }

    serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
        context: format!("{backend} response"),
        source: e,
    })
}

fn classify_transport(backend: Backend, err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout(backend)
    } else {
        LlmError::Http(err)
    }
}

pub(crate) fn status_error(backend: Backend, status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.chars().take(200).collect());

    if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited { backend, message }
    } else if status.is_server_error() {
        LlmError::ServerError {
            backend,
            status: status.as_u16(),
            message,
        }
    } else {
        LlmError::Api {
            backend,
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
