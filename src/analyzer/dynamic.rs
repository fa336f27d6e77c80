// src/analyzer/dynamic.rs — Oracle-backed domain analysis
//
// Optional collaborator for both engines. One oracle call per distinct
// input, cached for an hour. Any failure surfaces as `AnalysisUnavailable`
// and callers fall back to `DomainInsights::fallback()`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::markers;
use crate::core::call_budget::CallBudget;
use crate::core::prompts;
use crate::core::response_cache::ResponseCache;
use crate::infra::errors::PromptsmithError;
use crate::oracle::gateway::{parse_json, OracleGateway};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertiseLevel {
    #[serde(alias = "novice")]
    Beginner,
    #[serde(alias = "advanced")]
    Expert,
    #[default]
    #[serde(other)]
    Intermediate,
}

impl ExpertiseLevel {
    /// Offline estimate used when no dynamic insight is available.
    pub fn estimate(text: &str) -> Self {
        if markers::word_count(text) < 15 {
            ExpertiseLevel::Beginner
        } else if markers::technical_count(text) >= 3 {
            ExpertiseLevel::Expert
        } else {
            ExpertiseLevel::Intermediate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpertiseLevel::Beginner => "beginner",
            ExpertiseLevel::Intermediate => "intermediate",
            ExpertiseLevel::Expert => "expert",
        }
    }
}

impl fmt::Display for ExpertiseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the oracle reports about the prompt's domain and its gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainInsights {
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default)]
    pub expertise_level: ExpertiseLevel,
    #[serde(default)]
    pub domain_specific: bool,
    #[serde(default)]
    pub missing_context: Vec<String>,
    #[serde(default)]
    pub missing_examples: Vec<String>,
    #[serde(default)]
    pub missing_constraints: Vec<String>,
    #[serde(default)]
    pub missing_criteria: Vec<String>,
    #[serde(default)]
    pub key_terms: Vec<String>,
}

fn default_domain() -> String {
    "general".into()
}

impl DomainInsights {
    /// Documented stand-in when dynamic analysis is unavailable.
    pub fn fallback() -> Self {
        Self {
            domain: default_domain(),
            expertise_level: ExpertiseLevel::Intermediate,
            domain_specific: false,
            missing_context: Vec::new(),
            missing_examples: Vec::new(),
            missing_constraints: Vec::new(),
            missing_criteria: Vec::new(),
            key_terms: Vec::new(),
        }
    }
}

pub struct DynamicAnalyzer {
    cache: ResponseCache,
}

impl Default for DynamicAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicAnalyzer {
    pub fn new() -> Self {
        Self {
            cache: ResponseCache::for_dynamic_analysis(),
        }
    }

    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    /// One oracle call on a cache miss, charged to `budget`.
    pub async fn analyze(
        &mut self,
        gateway: &OracleGateway,
        budget: &mut CallBudget,
        text: &str,
    ) -> Result<DomainInsights, PromptsmithError> {
        let key = ResponseCache::make_key("dynamic_analysis", text, &[]);
        let request = prompts::dynamic_analysis_request(text);

        let response = gateway
            .invoke_cached(&mut self.cache, budget, &key, &request)
            .await
            .map_err(|e| PromptsmithError::AnalysisUnavailable(e.to_string()))?;

        parse_json::<DomainInsights>(&response, "domain insights JSON")
            .map_err(|e| PromptsmithError::AnalysisUnavailable(e.to_string()))
    }
}
