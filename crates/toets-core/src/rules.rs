//! Toetsregel data model
//!
//! A toetsregel is one named quality rule applied to a definition text. Rules
//! are immutable reference data: loaded once at startup, never mutated by the
//! validation or generation paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rule category, the first segment of every rule code (e.g. ESS in ESS-02)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleCategory {
    /// Aanbevelingen redactie en afbakening
    Arai,
    /// Context
    Con,
    /// Essentie
    Ess,
    /// Integriteit
    Int,
    /// Samenhang
    Sam,
    /// Structuur
    Str,
    /// Verwijzingen
    Ver,
}

impl RuleCategory {
    /// All categories in deterministic (code-sorted) order
    pub fn all() -> &'static [RuleCategory] {
        &[
            RuleCategory::Arai,
            RuleCategory::Con,
            RuleCategory::Ess,
            RuleCategory::Int,
            RuleCategory::Sam,
            RuleCategory::Str,
            RuleCategory::Ver,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Arai => "ARAI",
            RuleCategory::Con => "CON",
            RuleCategory::Ess => "ESS",
            RuleCategory::Int => "INT",
            RuleCategory::Sam => "SAM",
            RuleCategory::Str => "STR",
            RuleCategory::Ver => "VER",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ARAI" => Ok(RuleCategory::Arai),
            "CON" => Ok(RuleCategory::Con),
            "ESS" => Ok(RuleCategory::Ess),
            "INT" => Ok(RuleCategory::Int),
            "SAM" => Ok(RuleCategory::Sam),
            "STR" => Ok(RuleCategory::Str),
            "VER" => Ok(RuleCategory::Ver),
            other => Err(format!("unknown rule category '{}'", other)),
        }
    }
}

/// Severity of a rule or violation
///
/// `Error` is reserved for the input guards (VAL-EMP-001 / VAL-LEN-001):
/// a definition that trips one is unusable regardless of the other rules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Error,
}

impl Severity {
    /// Score deduction for one violation of this severity. These constants
    /// live only here; the scoring paths never hardcode them.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Low => 0.05,
            Severity::Medium => 0.15,
            Severity::High => 0.25,
            Severity::Critical => 0.40,
            Severity::Error => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ontological category of a begrip: what kind of thing the term names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OntologicalCategory {
    Type,
    Exemplaar,
    Proces,
    Resultaat,
}

impl OntologicalCategory {
    pub fn all() -> &'static [OntologicalCategory] {
        &[
            OntologicalCategory::Type,
            OntologicalCategory::Exemplaar,
            OntologicalCategory::Proces,
            OntologicalCategory::Resultaat,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OntologicalCategory::Type => "type",
            OntologicalCategory::Exemplaar => "exemplaar",
            OntologicalCategory::Proces => "proces",
            OntologicalCategory::Resultaat => "resultaat",
        }
    }
}

impl fmt::Display for OntologicalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OntologicalCategory {
    type Err = String;

    /// Accepts the Dutch aliases: particulier → exemplaar,
    /// activiteit → proces, uitkomst → resultaat.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "type" => Ok(OntologicalCategory::Type),
            "exemplaar" | "particulier" => Ok(OntologicalCategory::Exemplaar),
            "proces" | "activiteit" => Ok(OntologicalCategory::Proces),
            "resultaat" | "uitkomst" => Ok(OntologicalCategory::Resultaat),
            other => Err(format!("unknown ontological category '{}'", other)),
        }
    }
}

/// Structural property a definition text must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructureCheck {
    /// Exactly one sentence, with at least `min_words` words
    SingleSentence { min_words: usize },
    /// The first word must not be one of these (articles, auxiliaries)
    ForbiddenStart { words: Vec<String> },
    /// The begrip itself must not appear in its own definition text
    NotCircular,
}

/// Evaluation logic of one toetsregel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCheck {
    /// Presence of any of these patterns is a violation
    ForbiddenPattern { patterns: Vec<String> },
    /// At least one of these indicators must be present
    RequiredElement { indicators: Vec<String> },
    /// A derived property of the text must hold
    Structure { check: StructureCheck },
    /// ESS-02: the ontological category must be explicit, either via a
    /// context marker or via exactly one category keyword set matching
    CategoryExplicit,
}

/// One toetsregel: code, category, severity, and evaluation logic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Rule code, e.g. "ESS-02"
    pub code: String,
    pub categorie: RuleCategory,
    pub severity: Severity,
    /// Short name, e.g. "Expliciete ontologische categorie"
    pub naam: String,
    /// Violation message shown to users and fed to the feedback builder
    pub beschrijving: String,
    pub check: RuleCheck,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for cat in RuleCategory::all() {
            assert_eq!(cat.as_str().parse::<RuleCategory>().unwrap(), *cat);
        }
        assert!("XYZ".parse::<RuleCategory>().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Critical);
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_severity_weights_ordered() {
        assert!(Severity::Error.weight() > Severity::Critical.weight());
        assert!(Severity::Critical.weight() > Severity::High.weight());
        assert!(Severity::High.weight() > Severity::Medium.weight());
        assert!(Severity::Medium.weight() > Severity::Low.weight());
    }

    #[test]
    fn test_ontological_category_aliases() {
        assert_eq!(
            "particulier".parse::<OntologicalCategory>().unwrap(),
            OntologicalCategory::Exemplaar
        );
        assert_eq!(
            "activiteit".parse::<OntologicalCategory>().unwrap(),
            OntologicalCategory::Proces
        );
        assert_eq!(
            "uitkomst".parse::<OntologicalCategory>().unwrap(),
            OntologicalCategory::Resultaat
        );
        assert_eq!(
            "Type".parse::<OntologicalCategory>().unwrap(),
            OntologicalCategory::Type
        );
    }

    #[test]
    fn test_rule_check_yaml_roundtrip() {
        let yaml = r#"
kind: forbidden_pattern
patterns:
  - "om te"
  - "met als doel"
"#;
        let check: RuleCheck = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            check,
            RuleCheck::ForbiddenPattern {
                patterns: vec!["om te".to_string(), "met als doel".to_string()]
            }
        );
    }
}
