// src/core/types.rs — Core domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::infra::errors::PromptsmithError;

/// The text artifact being improved. Each accepted step produces a new
/// unit; a unit is never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementUnit {
    text: String,
}

impl RefinementUnit {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters (not bytes). All growth ratios use this.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl fmt::Display for RefinementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Which engine drives a run. The two are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Self-critique convergence loop.
    #[default]
    Refine,
    /// Layered progressive enhancement.
    Enhance,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Refine => write!(f, "refine"),
            Strategy::Enhance => write!(f, "enhance"),
        }
    }
}

impl FromStr for Strategy {
    type Err = PromptsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refine" | "self-refine" => Ok(Strategy::Refine),
            "enhance" | "progressive" => Ok(Strategy::Enhance),
            other => Err(PromptsmithError::Config(format!(
                "unknown strategy '{other}' (expected refine or enhance)"
            ))),
        }
    }
}

// ─── Convergence loop ───────────────────────────────────────────

/// Structured critique of one unit. Scores are always within [0, 10].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueReport {
    pub overall_score: f32,
    pub clarity: f32,
    pub effectiveness: f32,
    pub completeness: f32,
    pub improvements: Vec<String>,
    pub concerns: Vec<String>,
    pub continuation_advice: bool,
}

impl CritiqueReport {
    pub const FALLBACK_OVERALL: f32 = 5.0;
    pub const FALLBACK_SUBSCORE: f32 = 6.0;

    /// Stand-in used when the oracle's critique cannot be parsed.
    pub fn fallback() -> Self {
        Self {
            overall_score: Self::FALLBACK_OVERALL,
            clarity: Self::FALLBACK_SUBSCORE,
            effectiveness: Self::FALLBACK_SUBSCORE,
            completeness: Self::FALLBACK_SUBSCORE,
            improvements: Vec::new(),
            concerns: Vec::new(),
            continuation_advice: false,
        }
    }

    /// Clamp every score into [0, 10]. NaN becomes 0.
    pub fn clamped(mut self) -> Self {
        self.overall_score = clamp_score(self.overall_score);
        self.clarity = clamp_score(self.clarity);
        self.effectiveness = clamp_score(self.effectiveness);
        self.completeness = clamp_score(self.completeness);
        self
    }
}

pub fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 10.0)
    }
}

/// Why the convergence loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    QualityAchieved,
    MaxIterations,
    DiminishingReturns,
    ClaudeRecommendation,
    ClaudeLimit,
    ImprovementFailed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::QualityAchieved => "quality_achieved",
            StopReason::MaxIterations => "max_iterations",
            StopReason::DiminishingReturns => "diminishing_returns",
            StopReason::ClaudeRecommendation => "claude_recommendation",
            StopReason::ClaudeLimit => "claude_limit",
            StopReason::ImprovementFailed => "improvement_failed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse label for what an improvement round should focus on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Structural,
    Enhancement,
    Polish,
}

impl Stage {
    /// 1 → structural fixes, 2 → context/examples/constraints, 3+ → polish.
    pub fn for_iteration(iteration: u8) -> Self {
        match iteration {
            0 | 1 => Stage::Structural,
            2 => Stage::Enhancement,
            _ => Stage::Polish,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Structural => "structural",
            Stage::Enhancement => "enhancement",
            Stage::Polish => "polish",
        }
    }
}

/// One critique attempt. Append-only; never edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u8,
    pub unit: RefinementUnit,
    pub critique: CritiqueReport,
    /// The critique call itself failed; `critique` holds the fallback
    /// report and takes no part in scoring.
    #[serde(default)]
    pub critique_failed: bool,
    /// Score gain against the previous record (or the static baseline).
    pub quality_gain: f32,
    pub elapsed: Duration,
    pub created_at: DateTime<Utc>,
}

/// Terminal result of a convergence-loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineResult {
    pub run_id: String,
    pub final_unit: RefinementUnit,
    pub iterations: Vec<IterationRecord>,
    pub total_oracle_calls: u32,
    pub baseline_score: f32,
    pub total_quality_gain: f32,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl RefineResult {
    /// Score of the last critique that actually came back.
    pub fn final_score(&self) -> f32 {
        self.iterations
            .iter()
            .rev()
            .find(|r| !r.critique_failed)
            .map(|r| r.critique.overall_score)
            .unwrap_or(self.baseline_score)
    }

    /// Iterations whose critique reached the oracle and was scored.
    pub fn applied_iterations(&self) -> usize {
        self.iterations.iter().filter(|r| !r.critique_failed).count()
    }
}

// ─── Layered pipeline ───────────────────────────────────────────

/// What happened to one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LayerOutcome {
    Applied,
    Skipped { reason: String },
    Failed { reason: String },
}

impl LayerOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LayerOutcome::Applied)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, LayerOutcome::Skipped { .. })
    }
}

impl fmt::Display for LayerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerOutcome::Applied => write!(f, "applied"),
            LayerOutcome::Skipped { reason } => write!(f, "skipped ({reason})"),
            LayerOutcome::Failed { reason } => write!(f, "failed ({reason})"),
        }
    }
}

/// One layer attempt. Append-only; never edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerResult {
    pub layer: String,
    pub priority: u8,
    pub outcome: LayerOutcome,
    /// Descriptive diff of the accepted before/after pair. Empty unless applied.
    pub improvements: Vec<String>,
    pub length_before: usize,
    pub length_after: usize,
    pub oracle_calls: u32,
    pub elapsed: Duration,
}

/// Terminal result of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceResult {
    pub run_id: String,
    pub final_unit: RefinementUnit,
    pub layers: Vec<LayerResult>,
    /// Names of the applied layers, in the order they were accepted.
    pub accepted_layers: Vec<String>,
    pub applied_count: usize,
    pub skipped_count: usize,
    pub total_oracle_calls: u32,
    pub overall_improvement: f32,
    pub elapsed: Duration,
}

// ─── Progress ───────────────────────────────────────────────────

/// Lifecycle events emitted while a run progresses.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    IterationStart {
        iteration: u8,
        max_iterations: u8,
    },
    IterationEnd {
        iteration: u8,
        score: f32,
        gain: f32,
        stop: Option<StopReason>,
    },
    LayerEnd {
        layer: String,
        priority: u8,
        outcome: LayerOutcome,
    },
    OracleFailure {
        message: String,
    },
    Complete {
        summary: String,
        oracle_calls: u32,
        max_oracle_calls: u32,
    },
}
