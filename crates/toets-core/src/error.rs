//! Error types for rule store loading
//!
//! Validation of definition *content* never errors - bad content comes back
//! as violations in a `ValidationResult`. These errors cover the
//! infrastructure side only: unreadable or malformed rule files.

use thiserror::Error;

/// Errors raised while loading or compiling the toetsregel set
#[derive(Error, Debug)]
pub enum RuleStoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("duplicate rule code '{0}'")]
    DuplicateCode(String),

    #[error("invalid pattern in rule {code}: {source}")]
    Pattern {
        code: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("no rule files found in {0}")]
    EmptyDirectory(String),
}

/// Result alias for rule store operations
pub type RuleStoreResult<T> = Result<T, RuleStoreError>;
