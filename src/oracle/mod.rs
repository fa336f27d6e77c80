// src/oracle/mod.rs — Oracle service boundary

pub mod anthropic;
pub mod claude_cli;
pub mod gateway;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::infra::config::{OracleBackend, OracleConfig};
use crate::infra::errors::PromptsmithError;

/// A black-box text transformer (usually an LLM). Identical requests may
/// legitimately produce different responses.
#[async_trait]
pub trait Oracle: Send + Sync {
    fn id(&self) -> &str;

    /// Fails with `OracleUnavailable` when the call cannot be completed.
    async fn transform(&self, request: &str) -> Result<String, PromptsmithError>;
}

/// Build the oracle selected in config.
pub fn from_config(config: &OracleConfig) -> Result<Arc<dyn Oracle>, PromptsmithError> {
    match config.backend {
        OracleBackend::ClaudeCli => Ok(Arc::new(claude_cli::ClaudeCliOracle::new(
            config.command.clone(),
        ))),
        OracleBackend::Anthropic => {
            let api_key = std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or(PromptsmithError::MissingApiKey)?;
            Ok(Arc::new(
                anthropic::AnthropicOracle::new(api_key, config.model.clone())
                    .with_max_tokens(config.max_tokens),
            ))
        }
    }
}

/// Per-call timeout from config; 0 disables it.
pub fn timeout_from_config(config: &OracleConfig) -> Option<Duration> {
    (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs))
}
