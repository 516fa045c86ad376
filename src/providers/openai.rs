use crate::error::{AppError, Result};
use crate::providers::EmbeddingProvider;
use async_trait::async_trait;
use serde::Deserialize;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const MODEL: &str = "text-embedding-3-small";

/// Text-embedding client backed by the OpenAI embeddings API.
pub struct OpenAiEmbeddings {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": MODEL,
                "input": text,
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Embedding API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Embedding API error {}: {}",
                status, error_text
            )));
        }

        let body: EmbeddingsResponse = response.json().await.map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse embedding response: {}", e))
        })?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::ExternalApi("Embedding response was empty".to_string()))
    }
}
