//! Iteration Controller
//!
//! Bounded generate → validate → feedback loop. Each round generates a
//! candidate, validates it synchronously, and either accepts (gate pass),
//! stops on stagnation, or feeds violations back into the next attempt.
//! The best-scoring candidate seen is always retained, so the caller gets
//! a usable result even when no round clears the gate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use toets_core::{Severity, ValidationContext, ValidationResult, Validator};

use crate::feedback::{FeedbackBuilder, FeedbackItem};
use crate::generator::{DefinitionGenerator, GeneratedDefinition};
use crate::llm_client::TokenUsage;

/// Tunables for the iteration loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationConfig {
    /// Upper bound on generation attempts, feedback rounds included
    pub max_iterations: usize,
    /// Minimum score improvement per iteration before stagnation is declared
    pub improvement_threshold: f64,
    /// Overall score required for acceptance
    pub acceptance_score: f64,
    /// Minimum per-category score required for acceptance
    pub category_floor: f64,
    /// Extra attempts when a single LLM call fails (transient errors)
    pub max_generation_retries: usize,
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            improvement_threshold: 0.05,
            acceptance_score: 0.80,
            category_floor: 0.75,
            max_generation_retries: 2,
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationOutcome {
    /// A candidate cleared the acceptance gate
    Accepted,
    /// Score improvement fell below the threshold
    Stagnated,
    /// All iterations used without clearing the gate
    MaxIterationsReached,
    /// A mid-loop generation call failed after retries; best-so-far returned
    GenerationFailed,
    /// Cancelled between iterations; best-so-far returned
    Cancelled,
}

/// Telemetry for one iteration, consumed by the UI layer and the
/// generation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationTrace {
    pub iteration: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub overall_score: f64,
    pub critical_violations: usize,
    pub high_violations: usize,
    pub medium_violations: usize,
    pub low_violations: usize,
    /// Feedback issued on the basis of this iteration's violations
    pub feedback: Vec<FeedbackItem>,
    pub usage: TokenUsage,
}

impl IterationTrace {
    fn new(iteration: usize, validation: &ValidationResult, usage: TokenUsage) -> Self {
        Self {
            iteration,
            timestamp: chrono::Utc::now(),
            overall_score: validation.overall_score,
            critical_violations: validation.count_by_severity(Severity::Critical)
                + validation.count_by_severity(Severity::Error),
            high_violations: validation.count_by_severity(Severity::High),
            medium_violations: validation.count_by_severity(Severity::Medium),
            low_violations: validation.count_by_severity(Severity::Low),
            feedback: Vec::new(),
            usage,
        }
    }
}

/// Final result of one loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationReport {
    pub definitie: GeneratedDefinition,
    pub validation: ValidationResult,
    /// Whether the returned candidate clears the acceptance gate
    pub accepted: bool,
    pub outcome: IterationOutcome,
    pub iterations: Vec<IterationTrace>,
    pub total_usage: TokenUsage,
}

/// Cooperative cancellation, checked between iterations only - never during
/// an in-flight LLM call.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives the bounded generate → validate → feedback loop.
///
/// Owns no global state: generator, validator, and config are injected at
/// construction and the controller is otherwise stateless across runs.
pub struct IterationController {
    generator: DefinitionGenerator,
    validator: Validator,
    config: IterationConfig,
}

impl IterationController {
    pub fn new(
        generator: DefinitionGenerator,
        validator: Validator,
        config: IterationConfig,
    ) -> Self {
        Self {
            generator,
            validator,
            config,
        }
    }

    pub fn config(&self) -> &IterationConfig {
        &self.config
    }

    /// Direct access to the validator, for validate-only flows.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Run the loop to completion.
    pub async fn run(&self, ctx: &ValidationContext) -> Result<IterationReport> {
        self.run_with_cancellation(ctx, &CancellationFlag::new())
            .await
    }

    /// Run the loop, checking the cancellation flag between iterations.
    pub async fn run_with_cancellation(
        &self,
        ctx: &ValidationContext,
        cancel: &CancellationFlag,
    ) -> Result<IterationReport> {
        let mut feedback_builder = FeedbackBuilder::new();
        let mut traces: Vec<IterationTrace> = Vec::new();
        let mut total_usage = TokenUsage::default();

        // Iteration 1: no feedback. A failure here is a hard failure - there
        // is no earlier candidate to fall back on.
        let current = self.generate_with_retry(ctx, None, &[]).await?;
        total_usage.add(current.usage);
        let current_validation = self.validator.validate(ctx, &current.definitie);
        traces.push(IterationTrace::new(1, &current_validation, current.usage));
        debug!(
            begrip = %ctx.begrip,
            score = current_validation.overall_score,
            "iteration 1 validated"
        );

        let mut best = (current, current_validation);
        if self.gate_pass(&best.1) {
            info!(begrip = %ctx.begrip, "definition accepted on first iteration");
            return Ok(self.report(best, IterationOutcome::Accepted, traces, total_usage));
        }

        let mut last_validation = best.1.clone();
        let mut last_candidate = best.0.clone();
        let mut outcome = IterationOutcome::MaxIterationsReached;

        for iteration in 2..=self.config.max_iterations {
            if cancel.is_cancelled() {
                outcome = IterationOutcome::Cancelled;
                break;
            }

            let feedback = feedback_builder.build(&last_validation.violations, iteration - 1);
            if let Some(trace) = traces.last_mut() {
                trace.feedback = feedback.clone();
            }

            let candidate = match self
                .generate_with_retry(ctx, Some(&last_candidate), &feedback)
                .await
            {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!(
                        begrip = %ctx.begrip,
                        iteration,
                        "generation failed after retries, keeping best candidate: {e:#}"
                    );
                    outcome = IterationOutcome::GenerationFailed;
                    break;
                }
            };
            total_usage.add(candidate.usage);

            // Always validate the exact text just generated; never a stale
            // candidate.
            let validation = self.validator.validate(ctx, &candidate.definitie);
            traces.push(IterationTrace::new(iteration, &validation, candidate.usage));
            debug!(
                begrip = %ctx.begrip,
                iteration,
                score = validation.overall_score,
                "iteration validated"
            );

            let delta = validation.overall_score - best.1.overall_score;
            if validation.overall_score > best.1.overall_score {
                best = (candidate.clone(), validation.clone());
            }
            last_candidate = candidate;
            last_validation = validation;

            if delta < self.config.improvement_threshold {
                info!(
                    begrip = %ctx.begrip,
                    iteration,
                    delta,
                    "stagnation detected, stopping"
                );
                outcome = IterationOutcome::Stagnated;
                break;
            }
            if self.gate_pass(&last_validation) {
                info!(begrip = %ctx.begrip, iteration, "definition accepted");
                return Ok(self.report(
                    (last_candidate, last_validation),
                    IterationOutcome::Accepted,
                    traces,
                    total_usage,
                ));
            }
        }

        Ok(self.report(best, outcome, traces, total_usage))
    }

    fn gate_pass(&self, validation: &ValidationResult) -> bool {
        validation.is_acceptable(self.config.acceptance_score, self.config.category_floor)
    }

    fn report(
        &self,
        (definitie, validation): (GeneratedDefinition, ValidationResult),
        outcome: IterationOutcome,
        iterations: Vec<IterationTrace>,
        total_usage: TokenUsage,
    ) -> IterationReport {
        let accepted = self.gate_pass(&validation);
        IterationReport {
            definitie,
            validation,
            accepted,
            outcome,
            iterations,
            total_usage,
        }
    }

    async fn generate_with_retry(
        &self,
        ctx: &ValidationContext,
        previous: Option<&GeneratedDefinition>,
        feedback: &[FeedbackItem],
    ) -> Result<GeneratedDefinition> {
        let mut last_error = None;
        for attempt in 0..=self.config.max_generation_retries {
            let result = match previous {
                None => self.generator.generate(ctx).await,
                Some(prev) => self.generator.regenerate(ctx, prev, feedback).await,
            };
            match result {
                Ok(generated) => return Ok(generated),
                Err(e) => {
                    warn!(attempt, "generation attempt failed: {e:#}");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("generation failed without an error")))
    }
}
