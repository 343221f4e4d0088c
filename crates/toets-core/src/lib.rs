//! Toetsregel engine for Dutch administrative definitions
//!
//! This crate owns the quality-rule ("toetsregel") store and the validator
//! that scores candidate definition texts against it. It has no database,
//! network, or async dependencies - validation is pure and deterministic so
//! the same input always produces the same scored result.
//!
//! ## Architecture
//!
//! ```text
//! YAML rule files → RuleStore (loaded once, shared) → Validator → ValidationResult
//! ```
//!
//! The generation loop in `da-agentic` consumes `ValidationResult` to build
//! feedback; the application crate persists it alongside the definition.

pub mod error;
pub mod keywords;
pub mod rules;
pub mod store;
pub mod validation;
pub mod validator;

pub use error::RuleStoreError;
pub use keywords::category_keywords;
pub use rules::{OntologicalCategory, RuleCategory, RuleCheck, Severity, StructureCheck, ValidationRule};
pub use store::RuleStore;
pub use validation::{ValidationContext, ValidationResult, Violation};
pub use validator::Validator;

/// Violation code for empty definition text.
pub const CODE_EMPTY: &str = "VAL-EMP-001";
/// Violation code for definition text below the minimum word count.
pub const CODE_TOO_SHORT: &str = "VAL-LEN-001";
/// Violation code for definition text above the maximum length.
pub const CODE_TOO_LONG: &str = "VAL-LEN-002";
