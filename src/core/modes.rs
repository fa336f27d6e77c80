// src/core/modes.rs — Mode registry and budget resolution

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::infra::errors::PromptsmithError;

pub const FEATURE_SELF_REFINE: &str = "self_refine";
pub const FEATURE_PROGRESSIVE: &str = "progressive";
pub const FEATURE_DYNAMIC_ANALYSIS: &str = "dynamic_analysis";
pub const FEATURE_CACHING: &str = "caching";

/// Named feature switches. Ordered so serialized configs are stable.
pub type FeatureToggles = BTreeMap<String, bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Fast,
    Balanced,
    Thorough,
    Research,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Fast, Mode::Balanced, Mode::Thorough, Mode::Research];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Fast => "fast",
            Mode::Balanced => "balanced",
            Mode::Thorough => "thorough",
            Mode::Research => "research",
        }
    }

    /// The fixed defaults for this mode.
    pub fn defaults(&self) -> BudgetConfig {
        let (target, iterations, calls, progress, dynamic) = match self {
            Mode::Fast => (7.0, 1, 2, false, false),
            Mode::Balanced => (8.0, 3, 8, true, true),
            Mode::Thorough => (8.5, 5, 15, true, true),
            Mode::Research => (9.0, 8, 30, true, true),
        };

        let mut features = FeatureToggles::new();
        features.insert(FEATURE_SELF_REFINE.into(), true);
        features.insert(FEATURE_PROGRESSIVE.into(), true);
        features.insert(FEATURE_DYNAMIC_ANALYSIS.into(), dynamic);
        features.insert(FEATURE_CACHING.into(), true);

        BudgetConfig {
            target_quality_score: target,
            max_iterations: iterations,
            max_oracle_calls: calls,
            show_progress: progress,
            features,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Balanced
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = PromptsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Mode::Fast),
            "balanced" => Ok(Mode::Balanced),
            "thorough" => Ok(Mode::Thorough),
            "research" => Ok(Mode::Research),
            other => Err(PromptsmithError::InvalidMode(other.to_string())),
        }
    }
}

/// Resolved budget for one run. Never mutated once a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub target_quality_score: f32,
    pub max_iterations: u8,
    pub max_oracle_calls: u32,
    pub show_progress: bool,
    pub features: FeatureToggles,
}

impl BudgetConfig {
    /// Unknown feature names read as disabled.
    pub fn feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Mode::default().defaults()
    }
}

/// Caller-supplied overrides. `None` keeps the mode default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetOverrides {
    pub target_quality_score: Option<f32>,
    pub max_iterations: Option<u8>,
    pub max_oracle_calls: Option<u32>,
    pub show_progress: Option<bool>,
    #[serde(default)]
    pub features: FeatureToggles,
}

impl BudgetOverrides {
    /// Layer `other` on top of `self`: fields set in `other` win, feature
    /// maps merge key-by-key.
    pub fn merged_with(mut self, other: &BudgetOverrides) -> Self {
        if other.target_quality_score.is_some() {
            self.target_quality_score = other.target_quality_score;
        }
        if other.max_iterations.is_some() {
            self.max_iterations = other.max_iterations;
        }
        if other.max_oracle_calls.is_some() {
            self.max_oracle_calls = other.max_oracle_calls;
        }
        if other.show_progress.is_some() {
            self.show_progress = other.show_progress;
        }
        for (name, enabled) in &other.features {
            self.features.insert(name.clone(), *enabled);
        }
        self
    }
}

/// Shallow-merge the mode's defaults with `overrides`. The feature map is
/// merged key-by-key rather than replaced.
pub fn resolve(mode: Mode, overrides: &BudgetOverrides) -> BudgetConfig {
    let mut config = mode.defaults();

    if let Some(target) = overrides.target_quality_score {
        config.target_quality_score = target;
    }
    if let Some(iterations) = overrides.max_iterations {
        config.max_iterations = iterations;
    }
    if let Some(calls) = overrides.max_oracle_calls {
        config.max_oracle_calls = calls;
    }
    if let Some(progress) = overrides.show_progress {
        config.show_progress = progress;
    }
    for (name, enabled) in &overrides.features {
        config.features.insert(name.clone(), *enabled);
    }

    config
}

/// Range-check a resolved config. Returns one message per violation; the
/// caller decides whether to abort.
pub fn validate(config: &BudgetConfig) -> Vec<String> {
    let mut violations = Vec::new();

    if !(0.0..=10.0).contains(&config.target_quality_score) {
        violations.push(format!(
            "target_quality_score must be within [0, 10], got {}",
            config.target_quality_score
        ));
    }
    if !(1..=10).contains(&config.max_iterations) {
        violations.push(format!(
            "max_iterations must be within [1, 10], got {}",
            config.max_iterations
        ));
    }
    if !(1..=50).contains(&config.max_oracle_calls) {
        violations.push(format!(
            "max_oracle_calls must be within [1, 50], got {}",
            config.max_oracle_calls
        ));
    }

    violations
}
