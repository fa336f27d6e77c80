// src/core/self_refine.rs — Self-critique convergence loop
//
// critique → decide → (improve → critique) | stop. One oracle call per
// critique and one per improvement, all charged to a single CallBudget.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::call_budget::CallBudget;
use super::modes::{BudgetConfig, FEATURE_CACHING, FEATURE_DYNAMIC_ANALYSIS};
use super::prompts;
use super::response_cache::ResponseCache;
use super::types::*;
use crate::analyzer::critique::parse_critique;
use crate::analyzer::dynamic::{DomainInsights, DynamicAnalyzer};
use crate::analyzer::static_analysis;
use crate::oracle::gateway::OracleGateway;
use crate::oracle::Oracle;

/// Gain below this between consecutive records counts as converged.
pub const DIMINISHING_RETURNS_THRESHOLD: f32 = 0.3;

/// Calls one more round needs: an improvement plus the critique after it.
const ROUND_COST: u32 = 2;

/// Dynamic analysis only runs when it still leaves a full round.
const DYNAMIC_ANALYSIS_RESERVE: u32 = 3;

/// Drives one unit of text toward a quality target.
pub struct SelfRefine {
    gateway: OracleGateway,
    cache: ResponseCache,
    analyzer: DynamicAnalyzer,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send>>,
}

impl SelfRefine {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            gateway: OracleGateway::new(oracle),
            cache: ResponseCache::for_self_refine(),
            analyzer: DynamicAnalyzer::new(),
            on_progress: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.gateway = self.gateway.with_timeout(timeout);
        self
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Oracle calls issued through this engine across all runs.
    pub fn oracle_calls(&self) -> u32 {
        self.gateway.calls()
    }

    /// Run the loop. Never fails: oracle trouble ends the run early and the
    /// result carries whatever was reached.
    pub async fn run(&mut self, text: &str, config: &BudgetConfig) -> RefineResult {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let caching = config.feature(FEATURE_CACHING);
        self.cache.set_enabled(caching);

        let mut budget = CallBudget::new(config.max_oracle_calls);
        let baseline_score = static_analysis::analyze(text).quality_scores.overall;
        let mut unit = RefinementUnit::new(text);
        let mut records: Vec<IterationRecord> = Vec::new();

        tracing::info!(
            run_id = %run_id,
            target = config.target_quality_score,
            max_iterations = config.max_iterations,
            max_calls = config.max_oracle_calls,
            baseline = baseline_score,
            "Starting convergence loop"
        );

        let insights = self.dynamic_insights(config, &mut budget, text, caching).await;

        let mut iteration: u8 = 0;
        let stop_reason = loop {
            if !budget.can_afford(1) {
                break StopReason::ClaudeLimit;
            }
            iteration += 1;
            self.emit(ProgressEvent::IterationStart {
                iteration,
                max_iterations: config.max_iterations,
            });
            let iter_start = Instant::now();

            // ── Critiquing ──
            let critique = match self
                .critique(&mut budget, &unit, iteration, insights.as_ref())
                .await
            {
                Some(c) => c,
                None => {
                    // The attempt was charged, so it stays in the trace.
                    records.push(IterationRecord {
                        iteration,
                        unit: unit.clone(),
                        critique: CritiqueReport::fallback(),
                        critique_failed: true,
                        quality_gain: 0.0,
                        elapsed: iter_start.elapsed(),
                        created_at: chrono::Utc::now(),
                    });
                    self.emit(ProgressEvent::IterationEnd {
                        iteration,
                        score: CritiqueReport::FALLBACK_OVERALL,
                        gain: 0.0,
                        stop: Some(StopReason::ClaudeLimit),
                    });
                    break StopReason::ClaudeLimit;
                }
            };

            let previous = records
                .last()
                .map(|r| r.critique.overall_score)
                .unwrap_or(baseline_score);
            let gain = critique.overall_score - previous;

            // ── Deciding ──
            let decision = decide(
                &critique,
                iteration,
                records.len() + 1,
                gain,
                &budget,
                config,
            );

            records.push(IterationRecord {
                iteration,
                unit: unit.clone(),
                critique: critique.clone(),
                critique_failed: false,
                quality_gain: gain,
                elapsed: iter_start.elapsed(),
                created_at: chrono::Utc::now(),
            });
            self.emit(ProgressEvent::IterationEnd {
                iteration,
                score: critique.overall_score,
                gain,
                stop: decision,
            });

            if let Some(reason) = decision {
                break reason;
            }

            // ── Improving ──
            let stage = Stage::for_iteration(iteration);
            match self
                .improve(&mut budget, &unit, &critique, stage, iteration)
                .await
            {
                Some(next) => unit = next,
                None => break StopReason::ImprovementFailed,
            }
        };

        let total_quality_gain = records
            .iter()
            .rev()
            .find(|r| !r.critique_failed)
            .map(|r| r.critique.overall_score - baseline_score)
            .unwrap_or(0.0);

        tracing::info!(
            run_id = %run_id,
            stop_reason = %stop_reason,
            iterations = records.len(),
            oracle_calls = budget.spent(),
            gain = total_quality_gain,
            "Convergence loop finished"
        );

        self.emit(ProgressEvent::Complete {
            summary: format!(
                "{} after {} iteration(s), gain {:+.1}",
                stop_reason,
                records.len(),
                total_quality_gain
            ),
            oracle_calls: budget.spent(),
            max_oracle_calls: budget.total,
        });

        RefineResult {
            run_id,
            final_unit: unit,
            iterations: records,
            total_oracle_calls: budget.spent(),
            baseline_score,
            total_quality_gain,
            stop_reason,
            elapsed: start.elapsed(),
        }
    }

    async fn dynamic_insights(
        &mut self,
        config: &BudgetConfig,
        budget: &mut CallBudget,
        text: &str,
        caching: bool,
    ) -> Option<DomainInsights> {
        if !config.feature(FEATURE_DYNAMIC_ANALYSIS) || !budget.can_afford(DYNAMIC_ANALYSIS_RESERVE)
        {
            return None;
        }
        self.analyzer.set_cache_enabled(caching);
        match self.analyzer.analyze(&self.gateway, budget, text).await {
            Ok(insights) => Some(insights),
            Err(e) => {
                tracing::warn!("Dynamic analysis failed, using fallback insights: {e}");
                Some(DomainInsights::fallback())
            }
        }
    }

    /// `None` when the oracle could not be reached. A reply that cannot be
    /// parsed yields the fallback report instead.
    async fn critique(
        &mut self,
        budget: &mut CallBudget,
        unit: &RefinementUnit,
        iteration: u8,
        insights: Option<&DomainInsights>,
    ) -> Option<CritiqueReport> {
        let iteration_ctx = iteration.to_string();
        let key = ResponseCache::make_key("critique", unit.text(), &[&iteration_ctx]);
        let request = prompts::critique_request(unit.text(), iteration, insights);

        match self
            .gateway
            .invoke_cached(&mut self.cache, budget, &key, &request)
            .await
        {
            Ok(response) => match parse_critique(&response) {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::warn!(iteration, "Critique unparseable, using fallback: {e}");
                    Some(CritiqueReport::fallback())
                }
            },
            Err(e) => {
                self.emit(ProgressEvent::OracleFailure {
                    message: e.to_string(),
                });
                None
            }
        }
    }

    async fn improve(
        &mut self,
        budget: &mut CallBudget,
        unit: &RefinementUnit,
        critique: &CritiqueReport,
        stage: Stage,
        iteration: u8,
    ) -> Option<RefinementUnit> {
        let iteration_ctx = iteration.to_string();
        let key = ResponseCache::make_key(
            "improve",
            unit.text(),
            &[stage.as_str(), &iteration_ctx],
        );
        let request = prompts::improve_request(
            unit.text(),
            critique,
            stage,
            iteration,
            budget.remaining(),
        );

        match self
            .gateway
            .invoke_cached(&mut self.cache, budget, &key, &request)
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!(iteration, stage = stage.as_str(), "Improvement accepted");
                Some(RefinementUnit::new(text.trim()))
            }
            Ok(_) => {
                tracing::warn!(iteration, "Improvement came back empty, keeping current text");
                None
            }
            Err(e) => {
                self.emit(ProgressEvent::OracleFailure {
                    message: e.to_string(),
                });
                None
            }
        }
    }
}

/// Stop rules in priority order; `None` means keep improving.
pub fn decide(
    critique: &CritiqueReport,
    iteration: u8,
    record_count: usize,
    gain: f32,
    budget: &CallBudget,
    config: &BudgetConfig,
) -> Option<StopReason> {
    if critique.overall_score >= config.target_quality_score {
        Some(StopReason::QualityAchieved)
    } else if iteration >= config.max_iterations {
        Some(StopReason::MaxIterations)
    } else if record_count >= 2 && gain < DIMINISHING_RETURNS_THRESHOLD {
        Some(StopReason::DiminishingReturns)
    } else if !critique.continuation_advice {
        Some(StopReason::ClaudeRecommendation)
    } else if !budget.can_afford(ROUND_COST) {
        Some(StopReason::ClaudeLimit)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::modes::Mode;

    fn report(score: f32, advice: bool) -> CritiqueReport {
        CritiqueReport {
            overall_score: score,
            continuation_advice: advice,
            ..CritiqueReport::fallback()
        }
    }

    // ─── decide ─────────────────────────────────────────────────

    #[test]
    fn test_quality_achieved_wins_over_everything() {
        let config = Mode::Balanced.defaults();
        let budget = CallBudget::new(0);
        let reason = decide(&report(9.0, false), 3, 3, 0.0, &budget, &config);
        assert_eq!(reason, Some(StopReason::QualityAchieved));
    }

    #[test]
    fn test_max_iterations_before_diminishing_returns() {
        let config = Mode::Balanced.defaults();
        let budget = CallBudget::new(8);
        let reason = decide(&report(6.0, true), 3, 3, 0.1, &budget, &config);
        assert_eq!(reason, Some(StopReason::MaxIterations));
    }

    #[test]
    fn test_diminishing_returns_needs_two_records() {
        let config = Mode::Balanced.defaults();
        let budget = CallBudget::new(8);
        assert_eq!(decide(&report(5.1, true), 1, 1, 0.1, &budget, &config), None);
        assert_eq!(
            decide(&report(5.1, true), 2, 2, 0.1, &budget, &config),
            Some(StopReason::DiminishingReturns)
        );
    }

    #[test]
    fn test_recommendation_then_budget() {
        let config = Mode::Balanced.defaults();
        let mut budget = CallBudget::new(8);
        assert_eq!(
            decide(&report(6.0, false), 1, 1, 1.0, &budget, &config),
            Some(StopReason::ClaudeRecommendation)
        );
        for _ in 0..7 {
            budget.deduct();
        }
        assert_eq!(
            decide(&report(6.0, true), 1, 1, 1.0, &budget, &config),
            Some(StopReason::ClaudeLimit)
        );
    }

    #[test]
    fn test_fast_mode_stops_after_first_critique() {
        let config = Mode::Fast.defaults();
        let budget = CallBudget::new(2);
        assert_eq!(
            decide(&report(4.0, true), 1, 1, 0.0, &budget, &config),
            Some(StopReason::MaxIterations)
        );
    }
}
