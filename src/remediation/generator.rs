// SPDX-License-Identifier: PMPL-1.0-or-later
//! Contract for the external text-generation collaborator.
//!
//! The engine never talks to a provider directly. A [`TextGenerator`] takes a
//! packaged [`GenerationRequest`] and answers with raw text, which the
//! dispatcher parses for the expected fragment.

use crate::remediation::templates::FixType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fully-formed prompt ready to hand to a generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub issue_id: String,
    pub issue_type: String,
    pub prompt: String,
    pub fix_type: FixType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<String>,
    /// Markup of the element at the time the request was built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_html: Option<String>,
}

/// Ways a generator can fail; each one fails the issue, never the run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation timed out")]
    Timeout,

    #[error("generation refused: {0}")]
    Refused(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can turn a prompt into text
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> std::result::Result<String, GenerationError>;
}

impl<F> TextGenerator for F
where
    F: Fn(&GenerationRequest) -> std::result::Result<String, GenerationError> + Send + Sync,
{
    fn generate(&self, request: &GenerationRequest) -> std::result::Result<String, GenerationError> {
        self(request)
    }
}
