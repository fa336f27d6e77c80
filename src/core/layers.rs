// src/core/layers.rs — Static enhancement layer registry
//
// Layers are plain records: a name, a priority, the skip conditions that
// make the layer unnecessary, and the validator a candidate must pass.
// The pipeline walks `LAYERS` in priority order.

use crate::analyzer::dynamic::DomainInsights;
use crate::analyzer::markers;

pub const SHORT_PROMPT_CHARS: usize = 50;
pub const LONG_PROMPT_CHARS: usize = 2000;
const STRUCTURED_MIN_LINES: usize = 2;
const CONSTRAINT_HEAVY_MIN_WORDS: usize = 3;

/// Named pure predicate that makes a layer unnecessary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipCondition {
    VeryShortPrompt,
    VeryLongPrompt,
    AlreadyStructured,
    ExampleRich,
    ConstraintHeavy,
    CriteriaDefined,
}

impl SkipCondition {
    pub fn name(&self) -> &'static str {
        match self {
            SkipCondition::VeryShortPrompt => "very_short_prompt",
            SkipCondition::VeryLongPrompt => "very_long_prompt",
            SkipCondition::AlreadyStructured => "already_structured",
            SkipCondition::ExampleRich => "example_rich",
            SkipCondition::ConstraintHeavy => "constraint_heavy",
            SkipCondition::CriteriaDefined => "criteria_defined",
        }
    }

    /// Reason recorded on the skipped layer.
    pub fn reason(&self) -> &'static str {
        match self {
            SkipCondition::VeryShortPrompt => "prompt_too_short",
            SkipCondition::VeryLongPrompt => "prompt_too_long",
            SkipCondition::AlreadyStructured => "already_structured",
            SkipCondition::ExampleRich => "already_has_examples",
            SkipCondition::ConstraintHeavy => "already_constrained",
            SkipCondition::CriteriaDefined => "criteria_already_defined",
        }
    }

    pub fn holds(&self, text: &str) -> bool {
        match self {
            SkipCondition::VeryShortPrompt => text.chars().count() < SHORT_PROMPT_CHARS,
            SkipCondition::VeryLongPrompt => text.chars().count() > LONG_PROMPT_CHARS,
            SkipCondition::AlreadyStructured => {
                markers::structural_count(text) >= STRUCTURED_MIN_LINES
            }
            SkipCondition::ExampleRich => markers::example_count(text) > 0,
            SkipCondition::ConstraintHeavy => {
                markers::constraint_count(text) >= CONSTRAINT_HEAVY_MIN_WORDS
            }
            SkipCondition::CriteriaDefined => markers::success_count(text) > 0,
        }
    }
}

/// Layer-specific content check applied after the growth window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerCheck {
    StructureIncreases,
    ContextIncreases,
    ExampleIntroduced,
    ConstraintsIncrease,
    CriteriaIntroduced,
}

impl MarkerCheck {
    pub fn passes(&self, before: &str, after: &str) -> bool {
        match self {
            MarkerCheck::StructureIncreases => {
                markers::structural_count(after) > markers::structural_count(before)
            }
            MarkerCheck::ContextIncreases => {
                markers::context_count(after) > markers::context_count(before)
            }
            MarkerCheck::ExampleIntroduced => {
                markers::example_count(before) == 0 && markers::example_count(after) > 0
            }
            MarkerCheck::ConstraintsIncrease => {
                markers::constraint_count(after) > markers::constraint_count(before)
            }
            MarkerCheck::CriteriaIntroduced => {
                markers::success_count(before) == 0 && markers::success_count(after) > 0
            }
        }
    }
}

/// Which `DomainInsights` gap list feeds a layer's guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapSource {
    None,
    Context,
    Examples,
    Constraints,
    Criteria,
}

#[derive(Debug)]
pub struct EnhancementLayer {
    pub name: &'static str,
    pub title: &'static str,
    pub priority: u8,
    pub skip_conditions: &'static [SkipCondition],
    /// Inclusive bounds on after/before character length.
    pub min_growth: f32,
    pub max_growth: f32,
    pub marker_check: MarkerCheck,
    pub gap_source: GapSource,
    pub instructions: &'static str,
}

pub static LAYERS: [EnhancementLayer; 5] = [
    EnhancementLayer {
        name: "structure_clarity",
        title: "Structure & Clarity",
        priority: 1,
        skip_conditions: &[SkipCondition::VeryShortPrompt, SkipCondition::AlreadyStructured],
        min_growth: 1.10,
        max_growth: 2.5,
        marker_check: MarkerCheck::StructureIncreases,
        gap_source: GapSource::None,
        instructions: "Reorganize the prompt into clear sections. Use markdown headers, \
                       bullet points or numbered steps so the task, inputs and expected \
                       output are easy to find. Clarify ambiguous wording.",
    },
    EnhancementLayer {
        name: "context_background",
        title: "Context & Background",
        priority: 2,
        skip_conditions: &[SkipCondition::VeryLongPrompt],
        min_growth: 1.05,
        max_growth: 2.0,
        marker_check: MarkerCheck::ContextIncreases,
        gap_source: GapSource::Context,
        instructions: "Add the background the reader needs: the context of the task, \
                       its purpose, the intended audience and any assumptions.",
    },
    EnhancementLayer {
        name: "examples_patterns",
        title: "Examples & Patterns",
        priority: 3,
        skip_conditions: &[SkipCondition::ExampleRich, SkipCondition::VeryLongPrompt],
        min_growth: 1.05,
        max_growth: 3.0,
        marker_check: MarkerCheck::ExampleIntroduced,
        gap_source: GapSource::Examples,
        instructions: "Add one or two short, concrete examples of the desired input and \
                       output. Label them clearly, for example with \"Example:\".",
    },
    EnhancementLayer {
        name: "constraints_requirements",
        title: "Constraints & Requirements",
        priority: 4,
        skip_conditions: &[SkipCondition::ConstraintHeavy],
        min_growth: 1.05,
        max_growth: 2.0,
        marker_check: MarkerCheck::ConstraintsIncrease,
        gap_source: GapSource::Constraints,
        instructions: "State the constraints the answer must respect: what it must and \
                       must not do, limits on length or format, and anything to avoid.",
    },
    EnhancementLayer {
        name: "success_criteria",
        title: "Success Criteria & Validation",
        priority: 5,
        skip_conditions: &[SkipCondition::CriteriaDefined],
        min_growth: 1.05,
        max_growth: 1.8,
        marker_check: MarkerCheck::CriteriaIntroduced,
        gap_source: GapSource::Criteria,
        instructions: "Add explicit success criteria: how a good answer will be measured \
                       and how the result can be verified.",
    },
];

impl EnhancementLayer {
    /// First declared condition that currently holds, if any.
    pub fn skip_condition(&self, text: &str) -> Option<SkipCondition> {
        self.skip_conditions.iter().copied().find(|c| c.holds(text))
    }

    /// Growth window plus the layer's marker check.
    pub fn validate(&self, before: &str, after: &str) -> bool {
        match growth_ratio(before, after) {
            Some(ratio) if (self.min_growth..=self.max_growth).contains(&ratio) => {
                self.marker_check.passes(before, after)
            }
            _ => false,
        }
    }

    pub fn gaps<'a>(&self, insights: &'a DomainInsights) -> &'a [String] {
        match self.gap_source {
            GapSource::None => &[],
            GapSource::Context => &insights.missing_context,
            GapSource::Examples => &insights.missing_examples,
            GapSource::Constraints => &insights.missing_constraints,
            GapSource::Criteria => &insights.missing_criteria,
        }
    }
}

/// after/before in characters. `None` when `before` is empty.
pub fn growth_ratio(before: &str, after: &str) -> Option<f32> {
    let before_len = before.chars().count();
    if before_len == 0 {
        return None;
    }
    Some(after.chars().count() as f32 / before_len as f32)
}

/// Descriptive marker diff between an accepted before/after pair.
pub fn describe_improvements(before: &str, after: &str) -> Vec<String> {
    let mut out = Vec::new();

    let deltas = [
        (markers::header_count(before), markers::header_count(after), "headers"),
        (markers::bullet_count(before), markers::bullet_count(after), "bullet points"),
        (markers::numbered_count(before), markers::numbered_count(after), "numbered steps"),
        (markers::example_count(before), markers::example_count(after), "example markers"),
        (markers::code_block_count(before), markers::code_block_count(after), "code blocks"),
    ];
    for (b, a, label) in deltas {
        if a > b {
            out.push(format!("+{} {label}", a - b));
        }
    }

    if let Some(ratio) = growth_ratio(before, after) {
        let pct = ((ratio - 1.0) * 100.0).round() as i64;
        if pct > 0 {
            out.push(format!("length +{pct}%"));
        }
    }
    out
}

/// Bounded composite score in [0, 3].
pub fn overall_improvement(initial: &str, final_text: &str) -> f32 {
    let Some(ratio) = growth_ratio(initial, final_text) else {
        return 0.0;
    };

    let mut score = (ratio - 1.0).max(0.0);
    if markers::structural_count(final_text) > 0 {
        score += 0.5;
    }
    if markers::example_count(final_text) > 0 {
        score += 0.3;
    }
    score.min(3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "Write a function that takes a list of numbers and returns them sorted in ascending order";

    fn layer(name: &str) -> &'static EnhancementLayer {
        LAYERS.iter().find(|l| l.name == name).unwrap()
    }

    // ─── Registry ───────────────────────────────────────────────

    #[test]
    fn test_layers_in_priority_order() {
        let priorities: Vec<u8> = LAYERS.iter().map(|l| l.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4, 5]);
        for l in &LAYERS {
            assert!(l.min_growth >= 1.05 && l.max_growth <= 3.0, "{}", l.name);
            assert!(l.min_growth < l.max_growth);
        }
    }

    // ─── Skip conditions ────────────────────────────────────────

    #[test]
    fn test_short_prompt_skips_structure() {
        let cond = layer("structure_clarity").skip_condition("Sort a list").unwrap();
        assert_eq!(cond, SkipCondition::VeryShortPrompt);
        assert_eq!(cond.reason(), "prompt_too_short");
    }

    #[test]
    fn test_structured_prompt_skips_structure() {
        let text = "# Task\n- sort the numbers in the list given\n- return them ascending order";
        assert_eq!(
            layer("structure_clarity").skip_condition(text),
            Some(SkipCondition::AlreadyStructured)
        );
    }

    #[test]
    fn test_long_prompt_skips_context_and_examples() {
        let long = "word ".repeat(500);
        assert_eq!(
            layer("context_background").skip_condition(&long),
            Some(SkipCondition::VeryLongPrompt)
        );
        assert_eq!(
            layer("examples_patterns").skip_condition(&long).map(|c| c.reason()),
            Some("prompt_too_long")
        );
    }

    #[test]
    fn test_constraint_and_criteria_conditions() {
        let constrained = "You must be brief, should avoid jargon and never guess.";
        assert_eq!(
            layer("constraints_requirements").skip_condition(constrained),
            Some(SkipCondition::ConstraintHeavy)
        );
        assert_eq!(
            layer("success_criteria").skip_condition("Success means all tests pass"),
            Some(SkipCondition::CriteriaDefined)
        );
        assert_eq!(layer("success_criteria").skip_condition(PLAIN), None);
    }

    #[test]
    fn test_plain_prompt_skips_nothing() {
        for l in &LAYERS {
            assert_eq!(l.skip_condition(PLAIN), None, "{}", l.name);
        }
    }

    // ─── Validators ─────────────────────────────────────────────

    #[test]
    fn test_structure_accepts_structured_growth() {
        let after = format!("# Task\n\n{PLAIN}\n\n# Output\n- a sorted list");
        assert!(layer("structure_clarity").validate(PLAIN, &after));
    }

    #[test]
    fn test_structure_rejects_small_growth() {
        let before = "x".repeat(100);
        let after = format!("# T\n{}", "x".repeat(101));
        assert_eq!(growth_ratio(&before, &after), Some(1.05));
        assert!(!layer("structure_clarity").validate(&before, &after));
    }

    #[test]
    fn test_structure_rejects_excessive_growth() {
        let after = format!("# Task\n{}", PLAIN.repeat(3));
        assert!(!layer("structure_clarity").validate(PLAIN, &after));
    }

    #[test]
    fn test_examples_requires_new_marker() {
        let l = layer("examples_patterns");
        let with_example = format!("{PLAIN}. Example: [3, 1, 2] becomes [1, 2, 3].");
        assert!(l.validate(PLAIN, &with_example));
        let padded = format!("{PLAIN}. The numbers can be large or small ones too.");
        assert!(!l.validate(PLAIN, &padded));
    }

    #[test]
    fn test_constraints_requires_more_signal_words() {
        let l = layer("constraints_requirements");
        let after = format!("{PLAIN}. You must not allocate a new list.");
        assert!(l.validate(PLAIN, &after));
    }

    #[test]
    fn test_growth_window_inclusive() {
        let l = layer("context_background");
        let before = "a".repeat(100);
        let after = format!("{} context", "a".repeat(97));
        assert_eq!(growth_ratio(&before, &after), Some(1.05));
        assert!(l.validate(&before, &after));
    }

    #[test]
    fn test_empty_before_fails() {
        for l in &LAYERS {
            assert!(!l.validate("", "# Example\n- must succeed with context"));
        }
    }

    // ─── Improvements / overall ─────────────────────────────────

    #[test]
    fn test_describe_improvements() {
        let before = "Sort numbers quickly please, thanks a lot";
        let after = "# Task\nSort numbers.\n- fast\n- stable\n\nExample: [2,1] -> [1,2]\n```\nsort(xs)\n```";
        let items = describe_improvements(before, after);
        assert!(items.contains(&"+1 headers".to_string()));
        assert!(items.contains(&"+2 bullet points".to_string()));
        assert!(items.contains(&"+1 example markers".to_string()));
        assert!(items.contains(&"+1 code blocks".to_string()));
        assert!(items.iter().any(|i| i.starts_with("length +")));
    }

    #[test]
    fn test_overall_improvement_bounds() {
        assert_eq!(overall_improvement("", "anything"), 0.0);
        assert_eq!(overall_improvement("same", "same"), 0.0);
        let huge = format!("# H\nExample: x\n{}", "y".repeat(1000));
        assert_eq!(overall_improvement("tiny", &huge), 3.0);
    }

    #[test]
    fn test_overall_improvement_bonuses() {
        let initial = "a".repeat(100);
        let structured = format!("# A\n{}", "a".repeat(96));
        let score = overall_improvement(&initial, &structured);
        assert!((score - 0.5).abs() < 1e-6, "{score}");
    }

    #[test]
    fn test_gap_lists_per_layer() {
        let mut insights = DomainInsights::fallback();
        insights.missing_examples = vec!["sample request".into()];
        assert!(layer("structure_clarity").gaps(&insights).is_empty());
        assert_eq!(layer("examples_patterns").gaps(&insights), ["sample request".to_string()]);
    }
}
