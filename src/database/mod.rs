//! Database layer
//!
//! SQLite-backed repositories. The schema is created by the repositories at
//! startup; this is a single-user application with no external migration
//! runner.

pub mod definition_repository;
pub mod generation_log_repository;

pub use definition_repository::DefinitionRepository;
pub use generation_log_repository::{GenerationLogRepository, GenerationLogRow, GenerationStatsSummary};
