// src/oracle/gateway.rs — Single choke point for oracle calls
//
// Counts every call (success or failure), applies the optional per-call
// timeout, strips markdown fences from responses. Caching and budget
// enforcement stay with the callers: see `invoke_cached`.

use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::Oracle;
use crate::core::call_budget::CallBudget;
use crate::core::response_cache::ResponseCache;
use crate::infra::errors::PromptsmithError;

pub struct OracleGateway {
    oracle: Arc<dyn Oracle>,
    timeout: Option<Duration>,
    calls: AtomicU32,
}

impl OracleGateway {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            timeout: None,
            calls: AtomicU32::new(0),
        }
    }

    /// A timed-out call is reported as `OracleTimeout`, which callers treat
    /// exactly like an unavailable oracle. The in-flight call is dropped.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn oracle_id(&self) -> &str {
        self.oracle.id()
    }

    /// Calls issued through this gateway so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Send one request to the oracle.
    pub async fn invoke(&self, request: &str) -> Result<String, PromptsmithError> {
        let call_no = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            oracle = self.oracle.id(),
            call = call_no,
            request_chars = request.chars().count(),
            "Invoking oracle"
        );

        let raw = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.oracle.transform(request)).await
            {
                Ok(result) => result,
                Err(_) => Err(PromptsmithError::OracleTimeout {
                    oracle: self.oracle.id().to_string(),
                    secs: limit.as_secs(),
                }),
            },
            None => self.oracle.transform(request).await,
        };

        match raw {
            Ok(text) => Ok(strip_code_fences(&text)),
            Err(e) => {
                tracing::warn!(oracle = self.oracle.id(), call = call_no, "Oracle call failed: {e}");
                Err(e)
            }
        }
    }

    /// Cache-wrapped invoke for call sites. A hit costs nothing; a miss
    /// deducts one call from `budget` whether or not it succeeds, and only
    /// successful responses are stored.
    pub async fn invoke_cached(
        &self,
        cache: &mut ResponseCache,
        budget: &mut CallBudget,
        key: &str,
        request: &str,
    ) -> Result<String, PromptsmithError> {
        if let Some(hit) = cache.get(key) {
            return Ok(hit);
        }

        let result = self.invoke(request).await;
        budget.deduct();

        let text = result?;
        cache.set(key, text.clone());
        Ok(text)
    }
}

/// Remove a surrounding ``` fence (and its language tag). Anything not
/// wrapped in a fence is returned unchanged.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() < 6 || !trimmed.starts_with("```") || !trimmed.ends_with("```") {
        return text.to_string();
    }

    let inner = &trimmed[3..trimmed.len() - 3];
    let body = match inner.find('\n') {
        Some(pos) => &inner[pos + 1..],
        None => inner,
    };
    body.trim().to_string()
}

/// The outermost `{…}` span of `text`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a structured response, mapping any failure to `OracleMalformed`.
pub fn parse_json<T: DeserializeOwned>(text: &str, expected: &str) -> Result<T, PromptsmithError> {
    let malformed = |message: String| PromptsmithError::OracleMalformed {
        expected: expected.to_string(),
        message,
    };

    let json = extract_json_object(text).ok_or_else(|| malformed("no JSON object found".into()))?;
    serde_json::from_str(json).map_err(|e| malformed(e.to_string()))
}
