// src/core/progressive.rs — Layered progressive enhancement pipeline
//
// Walks the static layer registry once, in priority order. Each layer is
// skipped, applied or failed; every layer gets exactly one recorded outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::call_budget::CallBudget;
use super::layers::{self, EnhancementLayer, LAYERS};
use super::modes::{BudgetConfig, FEATURE_CACHING, FEATURE_DYNAMIC_ANALYSIS};
use super::prompts::{self, LayerGuidance};
use super::response_cache::ResponseCache;
use super::types::*;
use crate::analyzer::dynamic::{DomainInsights, DynamicAnalyzer, ExpertiseLevel};
use crate::analyzer::static_analysis::{self, StaticAnalysis, TaskType};
use crate::infra::errors::PromptsmithError;
use crate::oracle::gateway::OracleGateway;
use crate::oracle::Oracle;

pub const SKIP_CALL_LIMIT: &str = "claude_call_limit";
pub const FAIL_VALIDATION: &str = "validation_failed";
pub const FAIL_LAYER: &str = "layer_failed";

/// Dynamic analysis only runs when it leaves at least one layer call.
const DYNAMIC_ANALYSIS_RESERVE: u32 = 2;

/// What every layer sees: the analyses of the original text, the run's
/// budget and the layers accepted so far.
#[derive(Debug, Clone)]
pub struct EnhancementContext {
    pub original: RefinementUnit,
    pub analysis: StaticAnalysis,
    pub insights: Option<DomainInsights>,
    pub config: BudgetConfig,
    pub expertise_level: ExpertiseLevel,
    pub domain_specific: bool,
    pub accepted_layers: Vec<String>,
    /// Layers visited so far, skipped ones included.
    pub iteration: u8,
}

impl EnhancementContext {
    pub fn new(text: &str, insights: Option<DomainInsights>, config: &BudgetConfig) -> Self {
        let analysis = static_analysis::analyze(text);
        let expertise_level = insights
            .as_ref()
            .map(|i| i.expertise_level)
            .unwrap_or_else(|| ExpertiseLevel::estimate(text));
        let domain_specific = insights
            .as_ref()
            .map(|i| i.domain_specific)
            .unwrap_or(analysis.task_type != TaskType::General);

        Self {
            original: RefinementUnit::new(text),
            analysis,
            insights,
            config: config.clone(),
            expertise_level,
            domain_specific,
            accepted_layers: Vec::new(),
            iteration: 0,
        }
    }

    pub fn domain(&self) -> &str {
        self.insights
            .as_ref()
            .map(|i| i.domain.as_str())
            .unwrap_or("general")
    }

    pub fn guidance(&self, layer: &EnhancementLayer) -> LayerGuidance<'_> {
        LayerGuidance {
            domain: self.domain(),
            expertise: self.expertise_level,
            task_type: self.analysis.task_type,
            gaps: self.insights.as_ref().map(|i| layer.gaps(i)).unwrap_or(&[]),
            step: self.iteration,
            accepted: &self.accepted_layers,
        }
    }
}

pub struct ProgressiveEnhancer {
    gateway: OracleGateway,
    cache: ResponseCache,
    analyzer: DynamicAnalyzer,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send>>,
}

impl ProgressiveEnhancer {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            gateway: OracleGateway::new(oracle),
            cache: ResponseCache::for_progressive(),
            analyzer: DynamicAnalyzer::new(),
            on_progress: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.gateway = self.gateway.with_timeout(timeout);
        self
    }

    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    pub fn oracle_calls(&self) -> u32 {
        self.gateway.calls()
    }

    /// Run every layer once. Never fails; a layer whose oracle call fails
    /// is recorded and the pipeline moves on with the unit it had.
    pub async fn run(&mut self, text: &str, config: &BudgetConfig) -> EnhanceResult {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let caching = config.feature(FEATURE_CACHING);
        self.cache.set_enabled(caching);
        self.analyzer.set_cache_enabled(caching);

        let mut budget = CallBudget::new(config.max_oracle_calls);

        let insights = if config.feature(FEATURE_DYNAMIC_ANALYSIS)
            && budget.can_afford(DYNAMIC_ANALYSIS_RESERVE)
        {
            match self.analyzer.analyze(&self.gateway, &mut budget, text).await {
                Ok(i) => Some(i),
                Err(e) => {
                    tracing::warn!("Dynamic analysis failed, using fallback insights: {e}");
                    Some(DomainInsights::fallback())
                }
            }
        } else {
            None
        };

        let mut ctx = EnhancementContext::new(text, insights, config);
        let mut unit = ctx.original.clone();
        let mut results: Vec<LayerResult> = Vec::with_capacity(LAYERS.len());

        tracing::info!(
            run_id = %run_id,
            max_calls = ctx.config.max_oracle_calls,
            expertise = %ctx.expertise_level,
            task_type = %ctx.analysis.task_type,
            "Starting layered enhancement"
        );

        for layer in LAYERS.iter() {
            ctx.iteration += 1;
            let layer_start = Instant::now();
            let spent_before = budget.spent();
            let length_before = unit.char_len();
            let mut improvements = Vec::new();

            let outcome = if !budget.can_afford(1) {
                LayerOutcome::Skipped {
                    reason: SKIP_CALL_LIMIT.into(),
                }
            } else if let Some(cond) = layer.skip_condition(unit.text()) {
                tracing::debug!(layer = layer.name, condition = cond.name(), "Layer skipped");
                LayerOutcome::Skipped {
                    reason: cond.reason().into(),
                }
            } else {
                match self.apply(layer, &unit, &ctx, &mut budget).await {
                    Ok(candidate) if layer.validate(unit.text(), candidate.text()) => {
                        improvements = layers::describe_improvements(unit.text(), candidate.text());
                        tracing::info!(layer = layer.name, ?improvements, "Layer accepted");
                        unit = candidate;
                        ctx.accepted_layers.push(layer.name.to_string());
                        LayerOutcome::Applied
                    }
                    Ok(_) => {
                        tracing::info!(layer = layer.name, "Layer candidate rejected");
                        LayerOutcome::Failed {
                            reason: FAIL_VALIDATION.into(),
                        }
                    }
                    Err(e) => {
                        self.emit(ProgressEvent::OracleFailure {
                            message: e.to_string(),
                        });
                        LayerOutcome::Failed {
                            reason: FAIL_LAYER.into(),
                        }
                    }
                }
            };

            self.emit(ProgressEvent::LayerEnd {
                layer: layer.name.to_string(),
                priority: layer.priority,
                outcome: outcome.clone(),
            });

            results.push(LayerResult {
                layer: layer.name.to_string(),
                priority: layer.priority,
                outcome,
                improvements,
                length_before,
                length_after: unit.char_len(),
                oracle_calls: budget.spent() - spent_before,
                elapsed: layer_start.elapsed(),
            });
        }

        let applied_count = results.iter().filter(|r| r.outcome.is_applied()).count();
        let skipped_count = results.iter().filter(|r| r.outcome.is_skipped()).count();
        let overall_improvement = layers::overall_improvement(ctx.original.text(), unit.text());

        tracing::info!(
            run_id = %run_id,
            applied = applied_count,
            skipped = skipped_count,
            oracle_calls = budget.spent(),
            overall_improvement,
            accepted = ?ctx.accepted_layers,
            "Layered enhancement finished"
        );

        self.emit(ProgressEvent::Complete {
            summary: format!(
                "{applied_count} layer(s) applied, {skipped_count} skipped, improvement {overall_improvement:.2}"
            ),
            oracle_calls: budget.spent(),
            max_oracle_calls: budget.total,
        });

        EnhanceResult {
            run_id,
            final_unit: unit,
            layers: results,
            accepted_layers: ctx.accepted_layers,
            applied_count,
            skipped_count,
            total_oracle_calls: budget.spent(),
            overall_improvement,
            elapsed: start.elapsed(),
        }
    }

    /// One oracle call for `layer`, producing a candidate unit.
    async fn apply(
        &mut self,
        layer: &EnhancementLayer,
        unit: &RefinementUnit,
        ctx: &EnhancementContext,
        budget: &mut CallBudget,
    ) -> Result<RefinementUnit, PromptsmithError> {
        let domain_flag = if ctx.domain_specific { "domain" } else { "generic" };
        let key = ResponseCache::make_key(
            "layer",
            unit.text(),
            &[layer.name, ctx.expertise_level.as_str(), domain_flag],
        );
        let request = prompts::layer_request(layer, unit.text(), &ctx.guidance(layer));

        let text = self
            .gateway
            .invoke_cached(&mut self.cache, budget, &key, &request)
            .await?;
        Ok(RefinementUnit::new(text.trim()))
    }
}
