// src/core/prompts.rs — Builds the oracle requests for critique, improvement, layers and analysis

use super::layers::EnhancementLayer;
use super::types::{CritiqueReport, Stage};
use crate::analyzer::dynamic::{DomainInsights, ExpertiseLevel};
use crate::analyzer::static_analysis::TaskType;

/// Most gap items forwarded to a single layer.
pub const MAX_GAP_ITEMS: usize = 3;

/// Per-layer context the pipeline forwards to the oracle.
pub struct LayerGuidance<'a> {
    pub domain: &'a str,
    pub expertise: ExpertiseLevel,
    pub task_type: TaskType,
    pub gaps: &'a [String],
    /// 1-based position of this layer in the run.
    pub step: u8,
    /// Layers already accepted earlier in the run.
    pub accepted: &'a [String],
}

/// Ask for a JSON critique of `text`.
pub fn critique_request(text: &str, iteration: u8, insights: Option<&DomainInsights>) -> String {
    let mut prompt = String::with_capacity(text.len() + 1024);

    prompt.push_str("# Role\n\n");
    prompt.push_str(
        "You are a strict reviewer of prompts written for large language models. \
         Score the prompt below and say what would make it better.\n\n",
    );

    if let Some(insights) = insights {
        append_domain_section(&mut prompt, insights);
    }

    prompt.push_str(&format!("# Prompt (revision {iteration})\n\n"));
    prompt.push_str(text);
    prompt.push_str("\n\n");

    prompt.push_str("# Response format\n\n");
    prompt.push_str(
        "Reply with a single JSON object and nothing else:\n\
         {\n\
         \x20 \"overall_score\": <0-10>,\n\
         \x20 \"clarity\": <0-10>,\n\
         \x20 \"effectiveness\": <0-10>,\n\
         \x20 \"completeness\": <0-10>,\n\
         \x20 \"improvements\": [\"concrete change\", ...],\n\
         \x20 \"concerns\": [\"problem\", ...],\n\
         \x20 \"continuation_advice\": <true if another revision would clearly help>\n\
         }\n",
    );

    prompt
}

/// Ask for a rewritten prompt addressing the last critique.
pub fn improve_request(
    text: &str,
    critique: &CritiqueReport,
    stage: Stage,
    iteration: u8,
    remaining_calls: u32,
) -> String {
    let mut prompt = String::with_capacity(text.len() + 1024);

    prompt.push_str("# Role\n\n");
    prompt.push_str("You rewrite prompts for large language models so they work better.\n\n");

    prompt.push_str("# Focus\n\n");
    prompt.push_str(match stage {
        Stage::Structural => {
            "Fix the structure first: organize the prompt into clear sections, \
             state the task up front and make the expected output explicit.\n\n"
        }
        Stage::Enhancement => {
            "Enrich the prompt: add missing context, a short example and the \
             constraints the answer must respect.\n\n"
        }
        Stage::Polish => {
            "Polish only: tighten wording and remove redundancy. Do not \
             restructure what already works.\n\n"
        }
    });

    if !critique.concerns.is_empty() {
        prompt.push_str("# Concerns\n\n");
        for concern in &critique.concerns {
            prompt.push_str(&format!("- {concern}\n"));
        }
        prompt.push('\n');
    }

    if !critique.improvements.is_empty() {
        prompt.push_str("# Requested improvements\n\n");
        for (i, item) in critique.improvements.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, item));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "This is revision {iteration} (current score {:.1}/10). {remaining_calls} \
         oracle call(s) remain in the budget, so make this revision count.\n\n",
        critique.overall_score
    ));

    prompt.push_str("# Prompt\n\n");
    prompt.push_str(text);
    prompt.push_str("\n\n");

    prompt.push_str("Return only the improved prompt text, without commentary.\n");
    prompt
}

/// Ask one enhancement layer to rewrite `text`.
pub fn layer_request(layer: &EnhancementLayer, text: &str, guidance: &LayerGuidance<'_>) -> String {
    let mut prompt = String::with_capacity(text.len() + 1024);

    prompt.push_str(&format!("# Enhancement: {}\n\n", layer.title));
    prompt.push_str(layer.instructions);
    prompt.push_str("\n\n");

    prompt.push_str("# Audience\n\n");
    prompt.push_str(&format!(
        "Domain: {}\nExpertise level: {}\nTask type: {}\n\n",
        guidance.domain, guidance.expertise, guidance.task_type
    ));

    if !guidance.accepted.is_empty() {
        prompt.push_str(&format!(
            "# Earlier layers\n\nThis is step {}. Already applied: {}. Do not undo them.\n\n",
            guidance.step,
            guidance.accepted.join(", ")
        ));
    }

    if !guidance.gaps.is_empty() {
        prompt.push_str("# Known gaps\n\n");
        for gap in guidance.gaps.iter().take(MAX_GAP_ITEMS) {
            prompt.push_str(&format!("- {gap}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str("# Prompt\n\n");
    prompt.push_str(text);
    prompt.push_str("\n\n");

    prompt.push_str(
        "Keep everything the prompt already says. Return only the enhanced \
         prompt text, without commentary.\n",
    );
    prompt
}

/// Ask for domain insights about `text`.
pub fn dynamic_analysis_request(text: &str) -> String {
    let mut prompt = String::with_capacity(text.len() + 1024);

    prompt.push_str(
        "Analyze the prompt below. Identify its subject domain, the expertise \
         of its likely author and what it is missing.\n\n",
    );
    prompt.push_str("# Prompt\n\n");
    prompt.push_str(text);
    prompt.push_str("\n\n");

    prompt.push_str(
        "Reply with a single JSON object and nothing else:\n\
         {\n\
         \x20 \"domain\": \"short domain name\",\n\
         \x20 \"expertise_level\": \"beginner\" | \"intermediate\" | \"expert\",\n\
         \x20 \"domain_specific\": <true|false>,\n\
         \x20 \"missing_context\": [\"...\"],\n\
         \x20 \"missing_examples\": [\"...\"],\n\
         \x20 \"missing_constraints\": [\"...\"],\n\
         \x20 \"missing_criteria\": [\"...\"],\n\
         \x20 \"key_terms\": [\"...\"]\n\
         }\n",
    );
    prompt
}

fn append_domain_section(prompt: &mut String, insights: &DomainInsights) {
    prompt.push_str("# Domain\n\n");
    prompt.push_str(&format!(
        "Domain: {} (author expertise: {})\n",
        insights.domain, insights.expertise_level
    ));
    if !insights.key_terms.is_empty() {
        prompt.push_str(&format!("Key terms: {}\n", insights.key_terms.join(", ")));
    }
    prompt.push('\n');
}
