//! Text-generation backends: the [`TextGenerator`] seam, an HTTP client for
//! the supported providers, and the retry policy wrapped around every call.

pub mod client;
pub mod error;
pub mod generator;
pub mod retry;
pub mod types;

pub use client::{BaseUrls, LlmClient, LlmSettings};
pub use error::LlmError;
pub use generator::TextGenerator;
pub use retry::{invoke_with_retry, is_transient, is_transient_message, RetryPolicy};
