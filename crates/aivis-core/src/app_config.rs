use std::net::SocketAddr;

use crate::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_model: String,
    pub claude_model: String,
    pub gemini_model: String,
    /// Backend used for sentiment, insight and action-plan calls.
    pub reasoning_backend: Backend,
    pub llm_request_timeout_secs: u64,
    pub llm_max_attempts: u32,
    pub llm_retry_backoff_base_secs: u64,
    pub query_max_concurrency: usize,
    pub max_concurrent_runs: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
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
            .field("reasoning_backend", &self.reasoning_backend)
            .field("llm_request_timeout_secs", &self.llm_request_timeout_secs)
            .field("llm_max_attempts", &self.llm_max_attempts)
            .field(
                "llm_retry_backoff_base_secs",
                &self.llm_retry_backoff_base_secs,
            )
            .field("query_max_concurrency", &self.query_max_concurrency)
            .field("max_concurrent_runs", &self.max_concurrent_runs)
            .finish()
    }
}
