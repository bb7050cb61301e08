// SPDX-License-Identifier: PMPL-1.0-or-later
//! Engine facade: shared registries plus configuration, with one call per
//! pass.
//!
//! Registries are built once and shared by reference count, so an engine is
//! cheap to clone into worker threads.

use crate::checks::AuditRunner;
use crate::config::Config;
use crate::context::ContextCollector;
use crate::document::Document;
use crate::error::Result;
use crate::issue::IssueLedger;
use crate::remediation::{RemediationOutcome, Remediator, TemplateRegistry, TextGenerator};
use crate::report::{AuditReport, RemediationReport};
use crate::standards::Standards;
use std::sync::Arc;
use tracing::info;

/// Output of [`Engine::remediate`]
#[derive(Debug, Clone)]
pub struct RemediatedDocument {
    /// Serialised tree after in-engine fixes
    pub html: String,
    /// Audit of the input, before any fix
    pub audit: AuditReport,
    pub report: RemediationReport,
}

/// Audit and remediation entry point
#[derive(Clone)]
pub struct Engine {
    standards: Standards,
    templates: Arc<TemplateRegistry>,
    config: Config,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    /// Engine over the built-in registries
    pub fn new(config: Config) -> Self {
        Self {
            standards: Standards::builtin(),
            templates: Arc::new(TemplateRegistry::builtin()),
            config,
            generator: None,
        }
    }

    /// Attach a text generator for content-type fixes
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn standards(&self) -> &Standards {
        &self.standards
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    fn runner(&self) -> AuditRunner {
        AuditRunner::new(self.standards.clone(), self.config.audit.clone())
            .with_collector(ContextCollector::new(self.config.remediation.context_char_limit))
    }

    fn remediator(&self) -> Remediator {
        let remediator = Remediator::new(self.templates.clone(), self.config.remediation.clone());
        match &self.generator {
            Some(generator) => remediator.with_generator(generator.clone()),
            None => remediator,
        }
    }

    /// Run every enabled check over a parsed document
    pub fn audit_document(&self, doc: &Document) -> IssueLedger {
        self.runner().run(doc)
    }

    /// Audit a parsed document, then remediate it in place
    pub fn remediate_document(&self, doc: &mut Document) -> (IssueLedger, RemediationOutcome) {
        let ledger = self.audit_document(doc);
        let outcome = self.remediator().remediate(doc, &ledger);
        (ledger, outcome)
    }

    /// Parse and audit one HTML document
    pub fn audit(&self, html: &str) -> Result<AuditReport> {
        let doc = Document::parse(html)?;
        let ledger = self.audit_document(&doc);
        info!(issues = ledger.len(), "Audit complete");
        Ok(AuditReport::new(ledger.into_issues()))
    }

    /// Audit one HTML document, then remediate what it reported.
    ///
    /// The audit completes before the first fix is applied; fixes see the
    /// tree as mutated by earlier fixes.
    pub fn remediate(&self, html: &str) -> Result<RemediatedDocument> {
        let mut doc = Document::parse(html)?;
        let (ledger, outcome) = self.remediate_document(&mut doc);

        Ok(RemediatedDocument {
            html: doc.to_html(),
            audit: AuditReport::new(ledger.into_issues()),
            report: RemediationReport::new(outcome),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::issue::RemediationStatus;
    use crate::remediation::{GenerationError, GenerationRequest};

    const PAGE: &str = r#"<html lang="en"><head><title>Budget 2024</title></head><body>
        <main>
            <h1>Budget 2024</h1>
            <p style="color: #bbbbbb">Light grey paragraph</p>
            <img src="pie.png">
        </main>
    </body></html>"#;

    #[test]
    fn test_empty_input_fails_fast() {
        let engine = Engine::default();
        assert!(matches!(engine.audit("   "), Err(EngineError::EmptyDocument)));
        assert!(matches!(engine.remediate(""), Err(EngineError::EmptyDocument)));
    }

    #[test]
    fn test_audit_reports_and_summarises() {
        let report = Engine::default().audit(PAGE).unwrap();
        let types: Vec<_> = report.issues.iter().map(|i| i.issue.issue_type.as_str()).collect();
        assert!(types.contains(&"missing-alt-text"));
        assert!(types.contains(&"insufficient-color-contrast"));
        assert!(types.contains(&"compliant-document-title"));
        assert_eq!(report.summary.total_issues, report.issues.len());
        assert!(report.has_critical());
    }

    #[test]
    fn test_disabled_check_is_skipped() {
        let mut config = Config::default();
        config.audit.disabled_checks = vec!["color-contrast".to_string()];
        let report = Engine::new(config).audit(PAGE).unwrap();
        assert!(report
            .issues
            .iter()
            .all(|i| i.issue.issue_type != "insufficient-color-contrast"));
    }

    #[test]
    fn test_remediate_applies_contrast_fix() {
        let result = Engine::default().remediate(PAGE).unwrap();
        assert!(result.html.contains("color: #000000"));
        assert!(!result.html.contains("#bbbbbb"));
        assert_eq!(result.report.summary.remediated_issues, 1);
        assert!(result
            .report
            .pending_requests
            .iter()
            .any(|r| r.issue_type == "missing-alt-text"));
        assert!(result.audit.issues.iter().any(|i| i.issue.issue_type == "insufficient-color-contrast"));
    }

    #[test]
    fn test_remediate_with_generator() {
        let generator = |_: &GenerationRequest| -> std::result::Result<String, GenerationError> {
            Err(GenerationError::Timeout)
        };
        let result = Engine::default()
            .with_generator(Arc::new(generator))
            .remediate(PAGE)
            .unwrap();
        let alt = result
            .report
            .issues
            .iter()
            .find(|i| i.issue.issue_type == "missing-alt-text")
            .unwrap();
        assert_eq!(alt.remediation_status, RemediationStatus::Failed);
        assert_eq!(
            alt.remediation_details.failure_reason.as_deref(),
            Some("generation timed out")
        );
        assert!(result.report.pending_requests.is_empty());
    }
}
