// src/analyzer/static_analysis.rs — Deterministic keyword-based prompt analysis
//
// Pure and offline: no oracle calls, always returns a report. Its overall
// score is the baseline the convergence loop measures gains against.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::markers;

const VAGUE_WORDS: &[&str] = &[
    "something", "stuff", "things", "thing", "somehow", "maybe", "etc", "whatever", "good", "nice",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Coding,
    Writing,
    Analysis,
    Creative,
    General,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Coding => "coding",
            TaskType::Writing => "writing",
            TaskType::Analysis => "analysis",
            TaskType::Creative => "creative",
            TaskType::General => "general",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            TaskType::Coding => &[
                "code", "function", "bug", "implement", "rust", "python", "script", "api",
                "refactor", "test", "compile",
            ],
            TaskType::Writing => &[
                "write", "essay", "email", "article", "blog", "letter", "summary", "summarize",
                "draft",
            ],
            TaskType::Analysis => &[
                "analyze", "analyse", "compare", "evaluate", "assess", "review", "data",
                "report", "trend",
            ],
            TaskType::Creative => &[
                "story", "poem", "creative", "imagine", "character", "fiction", "song", "plot",
            ],
            TaskType::General => &[],
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub clarity: f32,
    pub specificity: f32,
    pub structure: f32,
    pub completeness: f32,
    pub overall: f32,
}

/// Fixed-shape report for one input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticAnalysis {
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub quality_scores: QualityScores,
    pub task_type: TaskType,
    pub detected_patterns: Vec<String>,
    pub recommended_frameworks: Vec<String>,
    pub improvement_priority: ImprovementPriority,
}

/// Analyze `text`. Deterministic: the same text always yields the same report.
pub fn analyze(text: &str) -> StaticAnalysis {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();
    let word_count = words.len();

    let vague = words.iter().filter(|w| VAGUE_WORDS.contains(*w)).count();
    let structural = markers::structural_count(text);
    let examples = markers::example_count(text);
    let constraints = markers::constraint_count(text);
    let success = markers::success_count(text);
    let context = markers::context_count(text);
    let technical = markers::technical_count(text);
    let has_numbers = text.chars().any(|c| c.is_ascii_digit());
    let paragraphs = text.split("\n\n").filter(|p| !p.trim().is_empty()).count();

    let mut issues = Vec::new();
    let mut suggestions = Vec::new();

    // ── clarity ──
    let mut clarity: f32 = 7.0;
    if word_count < 8 {
        clarity -= 2.0;
        issues.push("Prompt is very short and may be ambiguous".to_string());
        suggestions.push("Describe the task, the input and the expected output".to_string());
    }
    if vague > 0 {
        clarity -= (vague as f32).min(3.0);
        issues.push(format!("Contains {vague} vague word(s)"));
        suggestions.push("Replace vague words with concrete requirements".to_string());
    }
    if text.contains('?') || lower.starts_with("please") || word_count >= 20 {
        clarity += 1.0;
    }

    // ── specificity ──
    let mut specificity: f32 = 3.0 + (word_count as f32 / 15.0).min(4.0);
    if has_numbers {
        specificity += 1.0;
    }
    if technical > 0 {
        specificity += 1.0;
    }
    if constraints > 0 {
        specificity += 1.0;
    }

    // ── structure ──
    let mut structure: f32 = 3.0 + (structural.min(3) as f32 * 2.0);
    if paragraphs > 1 {
        structure += 1.0;
    }
    if structural == 0 && word_count > 60 {
        issues.push("Long prompt without headers or lists".to_string());
        suggestions.push("Break the prompt into sections or numbered steps".to_string());
    }

    // ── completeness ──
    let mut completeness: f32 = 3.0;
    if examples > 0 {
        completeness += 2.0;
    } else {
        suggestions.push("Add an example of the desired output".to_string());
    }
    if constraints > 0 {
        completeness += 2.0;
    } else {
        issues.push("No explicit constraints or requirements".to_string());
    }
    if success > 0 {
        completeness += 1.5;
    }
    if context > 0 {
        completeness += 1.5;
    } else {
        suggestions.push("State the context and intended audience".to_string());
    }

    let clarity = clamp10(clarity);
    let specificity = clamp10(specificity);
    let structure = clamp10(structure);
    let completeness = clamp10(completeness);
    let overall = round1((clarity + specificity + structure + completeness) / 4.0);

    let task_type = classify(&words);

    let mut detected_patterns = Vec::new();
    if lower.contains("you are") || lower.contains("act as") {
        detected_patterns.push("role_prompt".to_string());
    }
    if lower.contains("step by step") || markers::numbered_count(text) >= 2 {
        detected_patterns.push("step_by_step".to_string());
    }
    if examples > 0 {
        detected_patterns.push("examples".to_string());
    }
    if ["format", "json", "table", "markdown"]
        .iter()
        .any(|w| words.contains(w))
    {
        detected_patterns.push("output_format".to_string());
    }

    let mut recommended_frameworks = Vec::new();
    match task_type {
        TaskType::Coding => recommended_frameworks.push("chain-of-thought".to_string()),
        TaskType::Analysis => recommended_frameworks.push("step-back".to_string()),
        TaskType::Creative => recommended_frameworks.push("persona".to_string()),
        TaskType::Writing | TaskType::General => {}
    }
    if examples == 0 {
        recommended_frameworks.push("few-shot".to_string());
    }
    if !detected_patterns.iter().any(|p| p == "role_prompt") {
        recommended_frameworks.push("role-task-format".to_string());
    }

    let improvement_priority = if overall < 5.0 {
        ImprovementPriority::High
    } else if overall < 7.5 {
        ImprovementPriority::Medium
    } else {
        ImprovementPriority::Low
    };

    StaticAnalysis {
        issues,
        suggestions,
        quality_scores: QualityScores {
            clarity,
            specificity,
            structure,
            completeness,
            overall,
        },
        task_type,
        detected_patterns,
        recommended_frameworks,
        improvement_priority,
    }
}

/// Keyword vote; ties go to the earlier type, no votes is `General`.
fn classify(words: &[&str]) -> TaskType {
    let mut best = TaskType::General;
    let mut best_votes = 0;
    for candidate in [
        TaskType::Coding,
        TaskType::Writing,
        TaskType::Analysis,
        TaskType::Creative,
    ] {
        let votes = words
            .iter()
            .filter(|w| candidate.keywords().contains(*w))
            .count();
        if votes > best_votes {
            best = candidate;
            best_votes = votes;
        }
    }
    best
}

fn clamp10(v: f32) -> f32 {
    v.clamp(0.0, 10.0)
}

fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}
