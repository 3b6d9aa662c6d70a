use aivis_core::Backend;
use thiserror::Error;

/// Errors returned by a text-generation call.
///
/// Retry decisions are made on the rendered message (see
/// [`crate::retry::is_transient`]), so every transient variant says so in its
/// Display text.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured for {0}")]
    MissingApiKey(Backend),

    /// The request exceeded the configured timeout.
    #[error("request timeout calling {0}")]
    Timeout(Backend),

    /// HTTP 429 from the provider.
    #[error("{backend} rate limit exceeded: {message}")]
    RateLimited { backend: Backend, message: String },

    /// HTTP 5xx from the provider.
    #[error("{backend} temporary server error (HTTP {status}): {message}")]
    ServerError {
        backend: Backend,
        status: u16,
        message: String,
    },

    /// Any other non-2xx status.
    #[error("{backend} API error (HTTP {status}): {message}")]
    Api {
        backend: Backend,
        status: u16,
        message: String,
    },

    #[error("{0} returned no text")]
    EmptyResponse(Backend),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
