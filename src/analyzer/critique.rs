// src/analyzer/critique.rs — Parse oracle critiques into structured reports

use serde::Deserialize;

use crate::core::types::CritiqueReport;
use crate::infra::errors::PromptsmithError;
use crate::oracle::gateway::parse_json;

/// Wire shape the critique request asks for. Sub-scores default to the
/// overall score when the oracle omits them.
#[derive(Debug, Deserialize)]
struct RawCritique {
    #[serde(alias = "overallScore", alias = "overall", alias = "score")]
    overall_score: f32,
    #[serde(default)]
    clarity: Option<f32>,
    #[serde(default)]
    effectiveness: Option<f32>,
    #[serde(default)]
    completeness: Option<f32>,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
    #[serde(
        default,
        alias = "continuationAdvice",
        alias = "should_continue",
        alias = "continue"
    )]
    continuation_advice: bool,
}

/// Parse a fence-stripped critique response. Fails with `OracleMalformed`
/// when no usable JSON object is present; callers substitute
/// `CritiqueReport::fallback()`.
pub fn parse_critique(text: &str) -> Result<CritiqueReport, PromptsmithError> {
    let raw: RawCritique = parse_json(text, "critique JSON")?;
    let overall = raw.overall_score;

    Ok(CritiqueReport {
        overall_score: overall,
        clarity: raw.clarity.unwrap_or(overall),
        effectiveness: raw.effectiveness.unwrap_or(overall),
        completeness: raw.completeness.unwrap_or(overall),
        improvements: clean_list(raw.improvements),
        concerns: clean_list(raw.concerns),
        continuation_advice: raw.continuation_advice,
    }
    .clamped())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
