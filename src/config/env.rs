//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use super::Settings;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SUITECHECK";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Filter from SUITECHECK_FILTER
    pub filter: Option<String>,
    /// Verbose from SUITECHECK_VERBOSE
    pub verbose: Option<bool>,
    /// Stream from SUITECHECK_STREAM
    pub stream: Option<bool>,
    /// Output format from SUITECHECK_FORMAT
    pub format: Option<String>,
    /// Log level from SUITECHECK_LOG
    pub log_level: Option<String>,
    /// Config file from SUITECHECK_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));
        Self {
            filter: get("FILTER"),
            verbose: get("VERBOSE").map(|v| parse_bool(&v)),
            stream: get("STREAM").map(|v| parse_bool(&v)),
            format: get("FORMAT"),
            log_level: get("LOG"),
            config_file: get("CONFIG"),
        }
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

/// Parse an environment boolean
fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Help text listing the recognized variables
pub fn env_help() -> String {
    format!(
        "Environment Variables:\n\
         \n  {ENV_PREFIX}_FILTER    Regular expression selecting tests\
         \n  {ENV_PREFIX}_VERBOSE   Report passed tests too (true/false)\
         \n  {ENV_PREFIX}_STREAM    Report calls as they start (true/false)\
         \n  {ENV_PREFIX}_FORMAT    Output format (text, json, ci-event)\
         \n  {ENV_PREFIX}_LOG       Diagnostic log level (trace..error)\
         \n  {ENV_PREFIX}_CONFIG    Path to configuration file\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::from_lookup(lookup(&[]));
        assert_eq!(config, EnvConfig::default());
    }

    #[test]
    fn test_env_values() {
        let config = EnvConfig::from_lookup(lookup(&[
            ("SUITECHECK_FILTER", "Net"),
            ("SUITECHECK_FORMAT", "json"),
            ("SUITECHECK_CONFIG", "ci.yaml"),
            ("OTHER_FILTER", "ignored"),
        ]));
        assert_eq!(config.filter.as_deref(), Some("Net"));
        assert_eq!(config.format.as_deref(), Some("json"));
        assert_eq!(config.config_file.as_deref(), Some("ci.yaml"));
        assert_eq!(config.settings().filter.as_deref(), Some("Net"));
    }

    #[test]
    fn test_env_bool_parsing() {
        for truthy in ["1", "true", "YES", "on", "Enabled"] {
            let config = EnvConfig::from_lookup(lookup(&[("SUITECHECK_VERBOSE", truthy)]));
            assert_eq!(config.verbose, Some(true), "{truthy}");
        }
        let config = EnvConfig::from_lookup(lookup(&[("SUITECHECK_STREAM", "off")]));
        assert_eq!(config.stream, Some(false));
    }

    #[test]
    fn test_env_help_lists_variables() {
        let help = env_help();
        assert!(help.contains("SUITECHECK_FILTER"));
        assert!(help.contains("SUITECHECK_CONFIG"));
    }
}
