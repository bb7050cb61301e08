// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for remediabot

use thiserror::Error;

/// Main error type for the audit and remediation engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document has no content to audit")]
    EmptyDocument,

    #[error("Check {check} failed: {message}")]
    CheckFailed { check: String, message: String },

    #[error("Invalid remediation transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("no remediation template for {0}")]
    NoTemplate(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
