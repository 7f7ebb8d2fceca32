//! Configuration file management
//!
//! Handles loading run settings from a YAML or JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Settings;

/// Contents of a configuration file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Test selection pattern
    pub filter: Option<String>,

    /// Report passed tests too
    pub verbose: Option<bool>,

    /// Report calls as they start
    pub stream: Option<bool>,

    /// Output format (text, json, ci-event)
    pub format: Option<String>,

    /// Diagnostic log level
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        Ok(config)
    }

    pub fn settings(&self) -> Settings {
        Settings {
            filter: self.filter.clone(),
            verbose: self.verbose,
            stream: self.stream,
            format: self.format.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suitecheck.yaml");
        std::fs::write(&path, "filter: Net\nverbose: true\nformat: json\n").unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.filter.as_deref(), Some("Net"));
        assert_eq!(config.verbose, Some(true));
        assert_eq!(config.stream, None);
        assert_eq!(config.settings().format.as_deref(), Some("json"));
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suitecheck.json");
        std::fs::write(&path, r#"{"stream": true, "log_level": "debug"}"#).unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(
            config,
            FileConfig {
                stream: Some(true),
                log_level: Some("debug".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        let err = FileConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{\"rounds\": 3}").unwrap();
        let err = FileConfig::load(&bad).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON config"));
    }

    #[test]
    fn test_is_yaml_file() {
        assert!(is_yaml_file(Path::new("a.yml")));
        assert!(!is_yaml_file(Path::new("a.json")));
        assert!(!is_yaml_file(Path::new("a")));
    }
}
