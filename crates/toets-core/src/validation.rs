//! Validation contracts
//!
//! The types exchanged between the validator, the feedback builder, and the
//! application layer: the per-call context, individual violations, and the
//! scored result.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::{OntologicalCategory, RuleCategory, Severity};

/// Context for one validation call.
///
/// The marker, when present, states the ontological category explicitly and
/// short-circuits the ESS-02 keyword scan. The organisational/legal context
/// strings are carried for duplicate lookup and prompt building; the pattern
/// rules do not read them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationContext {
    /// The term being defined
    pub begrip: String,
    /// Explicit ontological category override
    pub categorie_marker: Option<OntologicalCategory>,
    pub organisatorische_context: Option<String>,
    pub juridische_context: Option<String>,
}

impl ValidationContext {
    pub fn for_begrip(begrip: impl Into<String>) -> Self {
        Self {
            begrip: begrip.into(),
            ..Default::default()
        }
    }

    pub fn with_marker(mut self, categorie: OntologicalCategory) -> Self {
        self.categorie_marker = Some(categorie);
        self
    }

    pub fn with_organisatorische_context(mut self, context: impl Into<String>) -> Self {
        self.organisatorische_context = Some(context.into());
        self
    }

    pub fn with_juridische_context(mut self, context: impl Into<String>) -> Self {
        self.juridische_context = Some(context.into());
        self
    }
}

/// One failed rule instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code, e.g. "ESS-01", or an input-guard code like "VAL-EMP-001"
    pub code: String,
    /// Category of the owning rule; input guards carry none
    pub categorie: Option<RuleCategory>,
    pub severity: Severity,
    pub message: String,
    /// Matched pattern, ambiguity detail, etc.
    pub detail: Option<String>,
}

impl Violation {
    pub fn new(
        code: impl Into<String>,
        categorie: Option<RuleCategory>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            categorie,
            severity,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity >= Severity::Critical
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.severity, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

/// Outcome of evaluating one definition text against the full rule set.
///
/// Violations are sorted by rule code; for identical input and rule set the
/// result is identical on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Overall score in [0, 1]
    pub overall_score: f64,
    /// Per-category scores in [0, 1], keyed in deterministic category order
    pub category_scores: BTreeMap<RuleCategory, f64>,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    /// Gate pass: overall and all category scores meet their thresholds and
    /// no critical (or worse) violation is present.
    pub fn is_acceptable(&self, min_overall: f64, category_floor: f64) -> bool {
        self.overall_score >= min_overall
            && self.category_scores.values().all(|s| *s >= category_floor)
            && !self.has_critical()
    }

    pub fn has_critical(&self) -> bool {
        self.violations.iter().any(Violation::is_critical)
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    pub fn violation_codes(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.code.as_str()).collect()
    }
}
