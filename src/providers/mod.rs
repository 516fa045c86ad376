pub mod anthropic;
pub mod json;
pub mod openai;

use crate::error::Result;
use async_trait::async_trait;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiEmbeddings;

/// Text-embedding provider. One call per search; failures are handled by the
/// calling stage, never retried here.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Chat-completion provider. Returns the raw text of the model's reply; JSON
/// extraction and schema validation happen at the call site so each stage can
/// apply its own fallback on malformed output.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Stand-in used when no API key is configured. Every stage treats the error
/// as a provider outage and takes its deterministic fallback, so the service
/// still produces playlists, just without model assistance.
pub struct Unconfigured(pub &'static str);

#[async_trait]
impl ChatProvider for Unconfigured {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(crate::error::AppError::ExternalApi(format!(
            "{} is not configured",
            self.0
        )))
    }
}

#[async_trait]
impl EmbeddingProvider for Unconfigured {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(crate::error::AppError::ExternalApi(format!(
            "{} is not configured",
            self.0
        )))
    }
}
