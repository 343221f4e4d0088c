//! Definition Orchestrator
//!
//! Main entry point for agentic definition generation. Runs the bounded
//! iteration loop and, when persistence is enabled, stores the resulting
//! definition and writes the generation audit log.
//!
//! All collaborators are constructor-injected; there are no process-wide
//! singletons and no UI-framework types anywhere in this path.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use da_agentic::{
    CancellationFlag, DefinitionGenerator, IterationConfig, IterationController,
    IterationReport, LlmClient,
};
use toets_core::{RuleStore, ValidationContext, Validator};

#[cfg(feature = "database")]
use crate::database::{DefinitionRepository, GenerationLogRepository};
#[cfg(feature = "database")]
use crate::models::{Definition, DefinitionStatus, NewDefinition};

/// Result of one orchestrated generation run
#[derive(Debug)]
pub struct OrchestratorResult {
    pub report: IterationReport,
    /// Stored definition, when persistence was requested
    #[cfg(feature = "database")]
    pub definition: Option<Definition>,
}

/// Orchestrates generation, validation, and persistence of definitions
pub struct DefinitionOrchestrator {
    controller: IterationController,
    model_name: String,
    #[cfg(feature = "database")]
    definitions: Option<DefinitionRepository>,
    #[cfg(feature = "database")]
    generation_log: Option<GenerationLogRepository>,
}

impl DefinitionOrchestrator {
    /// Generate a definition for the given context, without persisting.
    pub async fn generate(&self, ctx: &ValidationContext) -> Result<OrchestratorResult> {
        self.generate_with_cancellation(ctx, &CancellationFlag::new())
            .await
    }

    /// Generate, checking the cancellation flag between iterations.
    pub async fn generate_with_cancellation(
        &self,
        ctx: &ValidationContext,
        cancel: &CancellationFlag,
    ) -> Result<OrchestratorResult> {
        #[cfg(feature = "database")]
        let log_id = match &self.generation_log {
            Some(log) => Some(
                log.start_log(&ctx.begrip, Some(&self.model_name))
                    .await
                    .context("failed to open generation log")?,
            ),
            None => None,
        };

        let run = self.controller.run_with_cancellation(ctx, cancel).await;

        #[cfg(feature = "database")]
        if let (Some(log), Some(log_id), Err(_)) = (&self.generation_log, log_id, &run) {
            // Hard failure: no candidate at all. Close the log entry so the
            // run is still visible in the audit trail.
            log.mark_failed(log_id).await.ok();
        }

        let report = run?;

        #[cfg(feature = "database")]
        if let (Some(log), Some(log_id)) = (&self.generation_log, log_id) {
            log.complete(log_id, &report, None)
                .await
                .context("failed to record generation log")?;
        }

        Ok(OrchestratorResult {
            report,
            #[cfg(feature = "database")]
            definition: None,
        })
    }

    /// Generate and persist the result.
    ///
    /// The definition is stored as `review` when it cleared the acceptance
    /// gate, `draft` otherwise - a best-effort result is always persisted so
    /// the reviewer sees *something* rather than a failure screen. Duplicate
    /// policy is enforced by the repository; pass `allow_duplicate` after
    /// the user confirmed the advisory warning.
    #[cfg(feature = "database")]
    pub async fn generate_and_save(
        &self,
        ctx: &ValidationContext,
        allow_duplicate: bool,
    ) -> Result<OrchestratorResult> {
        let definitions = self
            .definitions
            .as_ref()
            .context("persistence requested but no database connection")?;
        let log_id = match &self.generation_log {
            Some(log) => Some(
                log.start_log(&ctx.begrip, Some(&self.model_name))
                    .await
                    .context("failed to open generation log")?,
            ),
            None => None,
        };

        let run = self.controller.run(ctx).await;
        if let (Some(log), Some(log_id), Err(_)) = (&self.generation_log, log_id, &run) {
            log.mark_failed(log_id).await.ok();
        }
        let report = run?;

        let new = NewDefinition {
            begrip: ctx.begrip.clone(),
            definitie: report.definitie.definitie.clone(),
            categorie: ctx.categorie_marker,
            organisatorische_context: ctx
                .organisatorische_context
                .clone()
                .unwrap_or_default(),
            juridische_context: ctx.juridische_context.clone(),
            voorbeelden: report.definitie.voorbeelden.clone(),
        };

        let definition = definitions.create(new, allow_duplicate).await?;
        definitions
            .attach_validation(definition.id, &report.validation)
            .await?;
        if report.accepted {
            definitions
                .set_status(definition.id, DefinitionStatus::Review)
                .await?;
        }
        let definition = definitions.get(definition.id).await?;

        if let (Some(log), Some(log_id)) = (&self.generation_log, log_id) {
            log.complete(log_id, &report, Some(definition.id))
                .await
                .context("failed to record generation log")?;
        }

        info!(
            begrip = %ctx.begrip,
            id = %definition.id,
            accepted = report.accepted,
            "definition stored"
        );

        Ok(OrchestratorResult {
            report,
            definition: Some(definition),
        })
    }

    /// Validate a text directly, without generation.
    pub fn validate(
        &self,
        ctx: &ValidationContext,
        text: &str,
    ) -> toets_core::ValidationResult {
        self.controller.validator().validate(ctx, text)
    }

    pub fn config(&self) -> &IterationConfig {
        self.controller.config()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Builder for DefinitionOrchestrator
pub struct OrchestratorBuilder {
    rule_store: Option<Arc<RuleStore>>,
    client: Option<Arc<dyn LlmClient>>,
    config: IterationConfig,
    #[cfg(feature = "database")]
    pool: Option<sqlx::SqlitePool>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            rule_store: None,
            client: None,
            config: IterationConfig::default(),
            #[cfg(feature = "database")]
            pool: None,
        }
    }

    /// Use a pre-loaded rule store instead of the builtin set.
    pub fn with_rule_store(mut self, store: Arc<RuleStore>) -> Self {
        self.rule_store = Some(store);
        self
    }

    /// Use a specific LLM client instead of the environment-selected one.
    pub fn with_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_config(mut self, config: IterationConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable persistence through the given pool.
    #[cfg(feature = "database")]
    pub fn with_pool(mut self, pool: sqlx::SqlitePool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn build(self) -> Result<DefinitionOrchestrator> {
        let rule_store = self
            .rule_store
            .unwrap_or_else(|| Arc::new(RuleStore::builtin()));
        let client = match self.client {
            Some(client) => client,
            None => da_agentic::create_llm_client()?,
        };
        let model_name = client.model_name().to_string();

        let validator = Validator::new(rule_store)?;
        let generator = DefinitionGenerator::with_client(client);
        let controller = IterationController::new(generator, validator, self.config);

        Ok(DefinitionOrchestrator {
            controller,
            model_name,
            #[cfg(feature = "database")]
            definitions: self.pool.clone().map(DefinitionRepository::new),
            #[cfg(feature = "database")]
            generation_log: self.pool.map(GenerationLogRepository::new),
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
