use crate::error::{AppError, Result};
use crate::providers::ChatProvider;
use async_trait::async_trait;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const MODEL: &str = "claude-sonnet-4-5-20250929";

/// Chat-completion client backed by the Anthropic Messages API.
pub struct AnthropicClient {
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": MODEL,
                "max_tokens": 4096,
                "messages": [{
                    "role": "user",
                    "content": prompt
                }]
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Claude API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Claude API error {}: {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response.json().await.map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse Claude response: {}", e))
        })?;

        let content_text = response_json["content"][0]["text"]
            .as_str()
            .ok_or_else(|| AppError::ExternalApi("Invalid Claude response format".to_string()))?;

        Ok(content_text.to_string())
    }
}
