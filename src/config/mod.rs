//! Configuration
//!
//! Environment-driven application settings plus the loader for the on-disk
//! toetsregel files. The rule store is loaded once per process and shared
//! immutably; there is deliberately no reload-per-request path.

use std::path::Path;
use std::sync::Arc;

use da_agentic::IterationConfig;
use serde::{Deserialize, Serialize};
use toets_core::RuleStore;
use tracing::info;

use crate::error::ConfigError;

/// Default on-disk location for configuration, overridable via
/// `DEFAGENT_CONFIG_DIR`.
const DEFAULT_CONFIG_DIR: &str = "config";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub config_dir: String,
    pub database_url: String,
    pub iteration: IterationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_dir: DEFAULT_CONFIG_DIR.to_string(),
            database_url: "sqlite://definitie_agent.db".to_string(),
            iteration: IterationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read settings from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            config_dir: std::env::var("DEFAGENT_CONFIG_DIR")
                .unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://definitie_agent.db".to_string()),
            iteration: IterationConfig::default(),
        };

        if let Some(value) = env_parse::<usize>("DEFAGENT_MAX_ITERATIONS")? {
            config.iteration.max_iterations = value;
        }
        if let Some(value) = env_parse::<f64>("DEFAGENT_IMPROVEMENT_THRESHOLD")? {
            config.iteration.improvement_threshold = value;
        }
        if let Some(value) = env_parse::<f64>("DEFAGENT_ACCEPTANCE_SCORE")? {
            config.iteration.acceptance_score = value;
        }
        if let Some(value) = env_parse::<f64>("DEFAGENT_CATEGORY_FLOOR")? {
            config.iteration.category_floor = value;
        }

        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Loader for the toetsregel configuration directory.
pub struct ConfigLoader {
    config_dir: String,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Create loader from DEFAGENT_CONFIG_DIR env var or default to "config"
    pub fn from_env() -> Self {
        let dir = std::env::var("DEFAGENT_CONFIG_DIR")
            .unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
        Self::new(dir)
    }

    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Load the rule store from `<config_dir>/toetsregels/*.yaml`, or fall
    /// back to the builtin rule set when the directory is absent.
    pub fn load_rule_store(&self) -> Result<Arc<RuleStore>, ConfigError> {
        let rules_dir = Path::new(&self.config_dir).join("toetsregels");

        let store = if rules_dir.is_dir() {
            RuleStore::from_dir(&rules_dir)?
        } else {
            info!(
                "no toetsregel directory at {}, using builtin rule set",
                rules_dir.display()
            );
            RuleStore::builtin()
        };

        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_falls_back_to_builtin() {
        let loader = ConfigLoader::new("/nonexistent/path");
        let store = loader.load_rule_store().unwrap();
        assert!(!store.is_empty());
        assert!(store.get("ESS-02").is_some());
    }

    #[test]
    fn test_loader_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        let rules_dir = dir.path().join("toetsregels");
        std::fs::create_dir(&rules_dir).unwrap();
        std::fs::write(
            rules_dir.join("ess.yaml"),
            r#"
rules:
  - code: ESS-01
    categorie: ESS
    severity: critical
    naam: "Geen doelbeschrijving"
    beschrijving: "Beschrijf wat het begrip is."
    check:
      kind: forbidden_pattern
      patterns: ["om te"]
"#,
        )
        .unwrap();

        let loader = ConfigLoader::new(dir.path().to_str().unwrap());
        let store = loader.load_rule_store().unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("ESS-01").is_some());
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.config_dir, "config");
        assert_eq!(config.iteration.max_iterations, 3);
    }
}
