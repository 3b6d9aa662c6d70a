use aivis_core::Backend;
use async_trait::async_trait;

use crate::error::LlmError;

/// A single text-generation call against one backend.
///
/// Implementations make exactly one attempt; retry policy belongs to the
/// caller (see [`crate::retry::invoke_with_retry`]).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn invoke(
        &self,
        backend: Backend,
        prompt: &str,
        temperature: f64,
    ) -> Result<String, LlmError>;
}
