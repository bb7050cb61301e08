// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration handling for remediabot
//!
//! Configuration is read from YAML or TOML (chosen by file extension). A
//! missing file is not an error: every section falls back to its defaults.

use crate::error::{EngineError, Result};
use crate::issue::Severity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Audit pass settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Remediation pass settings
    #[serde(default)]
    pub remediation: RemediationConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Audit pass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Lowest severity recorded for non-compliant issues
    #[serde(default = "default_severity_threshold")]
    pub severity_threshold: Severity,

    /// Attach collected element context to every issue
    #[serde(default = "default_true")]
    pub detailed: bool,

    /// Checks (by name) the runner should skip
    #[serde(default)]
    pub disabled_checks: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            severity_threshold: default_severity_threshold(),
            detailed: true,
            disabled_checks: Vec::new(),
        }
    }
}

/// Remediation pass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationConfig {
    /// Call the text generator when one is supplied. When false, generation
    /// requests are packaged and returned without being sent.
    #[serde(default = "default_true")]
    pub generate_content: bool,

    /// Maximum characters of element markup placed in prompts and context
    #[serde(default = "default_context_char_limit")]
    pub context_char_limit: usize,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            generate_content: true,
            context_char_limit: default_context_char_limit(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_severity_threshold() -> Severity {
    Severity::Minor
}

fn default_context_char_limit() -> usize {
    500
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|e| e == "toml").unwrap_or(false)
}

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = if is_toml(path) {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    if config.remediation.context_char_limit == 0 {
        return Err(EngineError::Config(
            "remediation.context_char_limit must be greater than zero".to_string(),
        ));
    }

    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Get default config file path
pub fn default_config_path() -> PathBuf {
    PathBuf::from(".remediabot.yml")
}

/// Write default configuration to a file
pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();
    let content = if is_toml(path) {
        toml::to_string_pretty(&config).map_err(|e| EngineError::Config(e.to_string()))?
    } else {
        serde_yaml::to_string(&config)?
    };
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.audit.severity_threshold, Severity::Minor);
        assert!(config.audit.detailed);
        assert!(config.remediation.generate_content);
        assert_eq!(config.remediation.context_char_limit, 500);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/remediabot.yml")).unwrap();
        assert!(config.audit.disabled_checks.is_empty());
    }

    #[test]
    fn test_partial_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        std::fs::write(
            &path,
            "audit:\n  severity_threshold: major\n  disabled_checks: [color-contrast]\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.audit.severity_threshold, Severity::Major);
        assert_eq!(config.audit.disabled_checks, vec!["color-contrast".to_string()]);
        assert!(config.audit.detailed);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_toml_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[remediation]\ngenerate_content = false\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.remediation.generate_content);
        assert_eq!(config.remediation.context_char_limit, 500);
    }

    #[test]
    fn test_zero_context_limit_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        std::fs::write(&path, "remediation:\n  context_char_limit: 0\n").unwrap();
        assert!(matches!(load_config(&path), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_write_default_config_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("defaults.yml");
        write_default_config(&path).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.audit.severity_threshold, Severity::Minor);
    }
}
