//! Definition entity
//!
//! One candidate or accepted definition for a begrip. Rows are archived
//! rather than deleted; duplicates are detectable but not forbidden (the
//! former UNIQUE index was replaced by an application-level advisory
//! lookup with an explicit override flag).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use toets_core::{OntologicalCategory, Violation};

/// Lifecycle status of a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionStatus {
    Draft,
    Review,
    Established,
    Archived,
}

impl DefinitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionStatus::Draft => "draft",
            DefinitionStatus::Review => "review",
            DefinitionStatus::Established => "established",
            DefinitionStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for DefinitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DefinitionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DefinitionStatus::Draft),
            "review" => Ok(DefinitionStatus::Review),
            "established" => Ok(DefinitionStatus::Established),
            "archived" => Ok(DefinitionStatus::Archived),
            other => Err(format!("unknown definition status '{}'", other)),
        }
    }
}

/// A stored definition with its latest validation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub id: Uuid,
    pub begrip: String,
    pub definitie: String,
    pub categorie: Option<OntologicalCategory>,
    pub organisatorische_context: String,
    pub juridische_context: Option<String>,
    pub status: DefinitionStatus,
    pub version_number: i64,
    pub validation_score: Option<f64>,
    pub validation_issues: Vec<Violation>,
    pub voorbeelden: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Definition {
    pub fn is_archived(&self) -> bool {
        self.status == DefinitionStatus::Archived
    }
}

/// Input for creating a definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDefinition {
    pub begrip: String,
    pub definitie: String,
    pub categorie: Option<OntologicalCategory>,
    pub organisatorische_context: String,
    pub juridische_context: Option<String>,
    pub voorbeelden: Vec<String>,
}
