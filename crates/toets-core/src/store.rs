//! Toetsregel store
//!
//! Loads the rule set from per-category YAML files and holds it immutably
//! for the process lifetime. Loading happens once; every validation call
//! shares the same `Arc<RuleStore>`. Reloading per request is explicitly
//! not supported.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{RuleStoreError, RuleStoreResult};
use crate::rules::{RuleCategory, ValidationRule};

/// Builtin rule files, embedded so the engine works with zero filesystem
/// setup. An on-disk rules directory with the same format overrides these.
const BUILTIN_RULE_FILES: &[(&str, &str)] = &[
    ("arai.yaml", include_str!("../rules/arai.yaml")),
    ("con.yaml", include_str!("../rules/con.yaml")),
    ("ess.yaml", include_str!("../rules/ess.yaml")),
    ("int.yaml", include_str!("../rules/int.yaml")),
    ("sam.yaml", include_str!("../rules/sam.yaml")),
    ("str.yaml", include_str!("../rules/str.yaml")),
    ("ver.yaml", include_str!("../rules/ver.yaml")),
];

/// On-disk / embedded file format: a version marker plus a list of rules.
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[allow(dead_code)]
    #[serde(default)]
    version: Option<String>,
    rules: Vec<ValidationRule>,
}

/// Immutable, code-sorted set of toetsregels
#[derive(Debug)]
pub struct RuleStore {
    rules: Vec<ValidationRule>,
}

impl RuleStore {
    /// The embedded default rule set.
    pub fn builtin() -> Self {
        let mut rules = Vec::new();
        for (name, content) in BUILTIN_RULE_FILES {
            let file: RuleFile = serde_yaml::from_str(content)
                .unwrap_or_else(|e| panic!("builtin rule file {} is invalid: {}", name, e));
            rules.extend(file.rules);
        }
        Self::from_rules(rules).expect("builtin rule set contains duplicate codes")
    }

    /// Parse a single YAML document in the rule file format.
    pub fn from_yaml_str(content: &str) -> RuleStoreResult<Self> {
        let file: RuleFile = serde_yaml::from_str(content).map_err(|e| RuleStoreError::Parse {
            path: "<inline>".to_string(),
            source: e,
        })?;
        Self::from_rules(file.rules)
    }

    /// Load and merge all `*.yaml` files in a directory.
    ///
    /// Files are read in sorted order for deterministic merging; filenames
    /// starting with `_` are skipped (metadata, not rules).
    pub fn from_dir(dir: impl AsRef<Path>) -> RuleStoreResult<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| RuleStoreError::Io {
                path: dir.display().to_string(),
                source: e,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension().map(|e| e == "yaml" || e == "yml").unwrap_or(false)
                    && !p
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("")
                        .starts_with('_')
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(RuleStoreError::EmptyDirectory(dir.display().to_string()));
        }

        let mut rules = Vec::new();
        for path in paths {
            let content = std::fs::read_to_string(&path).map_err(|e| RuleStoreError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let file: RuleFile =
                serde_yaml::from_str(&content).map_err(|e| RuleStoreError::Parse {
                    path: path.display().to_string(),
                    source: e,
                })?;
            rules.extend(file.rules);
        }

        let store = Self::from_rules(rules)?;
        info!(
            "Loaded {} toetsregels from {}",
            store.len(),
            dir.display()
        );
        Ok(store)
    }

    fn from_rules(mut rules: Vec<ValidationRule>) -> RuleStoreResult<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.code.clone()) {
                return Err(RuleStoreError::DuplicateCode(rule.code.clone()));
            }
        }
        rules.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(Self { rules })
    }

    /// All rules, sorted by code.
    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub fn get(&self, code: &str) -> Option<&ValidationRule> {
        self.rules.iter().find(|r| r.code == code)
    }

    pub fn by_category(
        &self,
        categorie: RuleCategory,
    ) -> impl Iterator<Item = &ValidationRule> {
        self.rules.iter().filter(move |r| r.categorie == categorie)
    }

    /// Categories that have at least one rule in this store.
    pub fn categories(&self) -> Vec<RuleCategory> {
        let mut cats: Vec<RuleCategory> = self.rules.iter().map(|r| r.categorie).collect();
        cats.sort();
        cats.dedup();
        cats
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;

    #[test]
    fn test_builtin_loads() {
        let store = RuleStore::builtin();
        assert!(store.len() >= 12, "builtin set too small: {}", store.len());
        assert!(store.get("ESS-01").is_some());
        assert!(store.get("ESS-02").is_some());
        assert!(store.get("STR-01").is_some());
        assert!(store.get("INT-01").is_some());
    }

    #[test]
    fn test_builtin_is_code_sorted() {
        let store = RuleStore::builtin();
        let codes: Vec<_> = store.rules().iter().map(|r| r.code.clone()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn test_builtin_severities() {
        let store = RuleStore::builtin();
        assert_eq!(store.get("ESS-01").unwrap().severity, Severity::Critical);
        assert_eq!(store.get("ESS-02").unwrap().severity, Severity::Critical);
        assert_eq!(store.get("STR-01").unwrap().severity, Severity::High);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let yaml = r#"
rules:
  - code: ESS-01
    categorie: ESS
    severity: critical
    naam: "a"
    beschrijving: "a"
    check:
      kind: forbidden_pattern
      patterns: ["om te"]
  - code: ESS-01
    categorie: ESS
    severity: critical
    naam: "b"
    beschrijving: "b"
    check:
      kind: forbidden_pattern
      patterns: ["met als doel"]
"#;
        let err = RuleStore::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, RuleStoreError::DuplicateCode(code) if code == "ESS-01"));
    }

    #[test]
    fn test_by_category() {
        let store = RuleStore::builtin();
        let ess: Vec<_> = store.by_category(RuleCategory::Ess).collect();
        assert_eq!(ess.len(), 3);
        assert!(ess.iter().all(|r| r.categorie == RuleCategory::Ess));
    }
}
