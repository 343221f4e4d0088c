//! Error types for the application crate
//!
//! Validation of definition content never surfaces here - the validator
//! reports violations as data. These errors cover infrastructure and the
//! one recoverable business condition: attempting to create a duplicate
//! definition without explicitly allowing it.

use thiserror::Error;
use uuid::Uuid;

/// Repository-layer errors
#[cfg(feature = "database")]
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A non-archived definition with the same (begrip, organisatorische
    /// context, juridische context, categorie) already exists. Recoverable:
    /// retry with `allow_duplicate` after the user confirms.
    #[error("duplicate definition for begrip '{begrip}' in this context (existing id {existing_id})")]
    DuplicateDefinition { begrip: String, existing_id: Uuid },

    #[error("definition {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value no longer parses (enum renamed, corrupted row)
    #[error("invalid stored value: {0}")]
    InvalidRow(String),
}

#[cfg(feature = "database")]
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Configuration-loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("rule store error: {0}")]
    RuleStore(#[from] toets_core::RuleStoreError),

    #[error("invalid configuration value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },
}
