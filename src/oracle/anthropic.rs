// src/oracle/anthropic.rs — Anthropic Messages API oracle

use async_trait::async_trait;

use super::Oracle;
use crate::infra::errors::PromptsmithError;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicOracle {
    api_key: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicOracle {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            max_tokens: 4096,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request_body(&self, request: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{ "role": "user", "content": request }],
        })
    }

    fn unavailable(&self, message: impl Into<String>) -> PromptsmithError {
        PromptsmithError::OracleUnavailable {
            oracle: self.id().to_string(),
            message: message.into(),
        }
    }
}

/// Concatenate the text blocks of a Messages API response.
fn extract_text(resp: &serde_json::Value) -> String {
    resp["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|c| c["type"] == "text")
                .filter_map(|c| c["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[async_trait]
impl Oracle for AnthropicOracle {
    fn id(&self) -> &str {
        "anthropic"
    }

    async fn transform(&self, request: &str) -> Result<String, PromptsmithError> {
        let body = self.build_request_body(request);

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(self.unavailable(format!(
                "HTTP {}: {}",
                status,
                crate::util::truncate_str(&error_body, 300)
            )));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.unavailable(format!("failed to decode response: {e}")))?;

        Ok(extract_text(&resp))
    }
}
