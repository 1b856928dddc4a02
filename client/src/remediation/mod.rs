//! Remediation: ask a text-completion service how to fix a failed build

mod assistant;
mod gemini;

pub use assistant::{build_prompt, RemediationAssistant, FALLBACK_SOLUTION};
pub use gemini::GeminiProvider;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when calling a completion provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Provider returned error: {0}")]
    ProviderError(String),

    #[error("Provider is not configured: {0}")]
    NotConfigured(String),

    #[error("Provider returned no text")]
    EmptyResponse,
}

/// Prompt-in, text-out completion service
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model being used
    fn model(&self) -> &str;

    /// Complete a free-text prompt
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}
