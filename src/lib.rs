//! DefinitieAgent - generation and validation of Dutch administrative definitions
//!
//! Application crate: wires the toetsregel engine (`toets-core`) and the LLM
//! generation loop (`da-agentic`) to configuration, SQLite persistence, and
//! the CLI. The UI layer is a thin consumer of the orchestrator's report
//! types; no business logic lives at that edge.
//!
//! ## Layering
//!
//! ```text
//! CLI / UI adapter
//!   └─ agentic::DefinitionOrchestrator   (this crate)
//!        ├─ da_agentic::IterationController
//!        │    ├─ DefinitionGenerator → LlmClient (OpenAI / Anthropic)
//!        │    └─ toets_core::Validator ← RuleStore
//!        └─ database::DefinitionRepository (feature "database")
//! ```

pub mod agentic;
pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod error;
pub mod models;

pub use agentic::{DefinitionOrchestrator, OrchestratorBuilder};
pub use config::{AppConfig, ConfigLoader};
pub use error::ConfigError;
#[cfg(feature = "database")]
pub use error::{RepositoryError, RepositoryResult};
pub use models::{Definition, DefinitionStatus, NewDefinition};
