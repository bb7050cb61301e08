// SPDX-License-Identifier: PMPL-1.0-or-later
//! Remediation pass: turns an audit ledger into tracked remediation issues.
//!
//! Runs strictly after the audit. Issues are processed in ledger order
//! against the mutable document, so later fixes see earlier mutations.

pub mod contrast;
pub mod dispatcher;
pub mod generator;
pub mod templates;

pub use dispatcher::{parse_response, Dispatch, Dispatcher, GeneratedFix, CONTRAST_ISSUE};
pub use generator::{GenerationError, GenerationRequest, TextGenerator};
pub use templates::{FixType, PromptValues, Template, TemplateRegistry};

use crate::config::RemediationConfig;
use crate::document::Document;
use crate::issue::{IssueLedger, RemediationIssue};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one remediation pass
#[derive(Debug, Clone, Default)]
pub struct RemediationOutcome {
    /// Every non-compliant issue with its remediation status
    pub issues: Vec<RemediationIssue>,
    /// Requests that were packaged but not sent to a generator
    pub pending_requests: Vec<GenerationRequest>,
}

/// Drives the dispatcher over a ledger
pub struct Remediator {
    dispatcher: Dispatcher,
    config: RemediationConfig,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Remediator {
    pub fn new(templates: Arc<TemplateRegistry>, config: RemediationConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(templates, config.context_char_limit),
            config,
            generator: None,
        }
    }

    /// Send requests to this generator (unless `generate_content` is off)
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Remediate every non-compliant issue of the ledger
    pub fn remediate(&self, doc: &mut Document, ledger: &IssueLedger) -> RemediationOutcome {
        let mut outcome = RemediationOutcome::default();
        let generator = self
            .generator
            .as_deref()
            .filter(|_| self.config.generate_content);

        for audit in ledger.issues().iter().filter(|i| !i.is_compliant()) {
            let mut issue = RemediationIssue::pending(audit.issue.clone());

            let recorded = match self.dispatcher.dispatch(doc, &issue.issue) {
                Ok(Dispatch::Applied(details)) => issue.mark_remediated(details),
                Ok(Dispatch::Request(request)) => match generator {
                    Some(generator) => {
                        let response = generator.generate(&request);
                        self.dispatcher.accept(&mut issue, &request, response)
                    }
                    None => {
                        outcome.pending_requests.push(request);
                        Ok(())
                    }
                },
                Err(e) => {
                    warn!(issue_id = %issue.issue.id, error = %e, "Remediation failed");
                    issue.mark_failed(&e.to_string())
                }
            };
            if let Err(e) = recorded {
                warn!(issue_id = %issue.issue.id, error = %e, "Could not record remediation outcome");
            }

            debug!(
                issue_id = %issue.issue.id,
                status = %issue.remediation_status,
                "Issue processed"
            );
            outcome.issues.push(issue);
        }

        info!(
            processed = outcome.issues.len(),
            pending = outcome.pending_requests.len(),
            "Remediation pass complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::AuditRunner;
    use crate::config::AuditConfig;
    use crate::issue::RemediationStatus;
    use crate::standards::Standards;

    const PAGE: &str = r#"<html lang="en"><head><title>Annual Report</title></head><body>
        <h1>Annual Report</h1>
        <p style="color: #aaaaaa">Faint text</p>
        <img src="chart.png">
        <a href="/more">Read more</a>
        <table><tr><th scope="col">A</th><th scope="col">B</th></tr><tr><td>1</td><td>2</td></tr></table>
    </body></html>"#;

    fn audit(doc: &Document) -> IssueLedger {
        AuditRunner::new(Standards::builtin(), AuditConfig::default()).run(doc)
    }

    fn status_of<'a>(outcome: &'a RemediationOutcome, issue_type: &str) -> &'a RemediationIssue {
        outcome
            .issues
            .iter()
            .find(|i| i.issue.issue_type == issue_type)
            .unwrap()
    }

    #[test]
    fn test_without_generator_requests_are_packaged() {
        let mut doc = Document::parse(PAGE).unwrap();
        let ledger = audit(&doc);
        let remediator = Remediator::new(Arc::new(TemplateRegistry::builtin()), RemediationConfig::default());
        let outcome = remediator.remediate(&mut doc, &ledger);

        assert!(outcome.issues.iter().all(|i| !i.issue.issue_type.starts_with("compliant-")));
        assert_eq!(
            status_of(&outcome, "insufficient-color-contrast").remediation_status,
            RemediationStatus::Remediated
        );
        assert_eq!(
            status_of(&outcome, "missing-alt-text").remediation_status,
            RemediationStatus::NeedsRemediation
        );
        let tbody = status_of(&outcome, "table-missing-tbody");
        assert_eq!(tbody.remediation_status, RemediationStatus::Failed);
        assert_eq!(
            tbody.remediation_details.failure_reason.as_deref(),
            Some("no remediation template for table-missing-tbody")
        );
        assert!(outcome
            .pending_requests
            .iter()
            .any(|r| r.issue_type == "missing-alt-text"));
        assert!(doc.to_html().contains("color: #000000"));
    }

    #[test]
    fn test_generator_outcomes_are_recorded() {
        let mut doc = Document::parse(PAGE).unwrap();
        let ledger = audit(&doc);
        let generator = |request: &GenerationRequest| -> std::result::Result<String, GenerationError> {
            match request.fix_type {
                FixType::Attribute => Ok("```\nalt=\"Revenue chart\"\n```".to_string()),
                _ => Err(GenerationError::Unavailable("offline".to_string())),
            }
        };
        let remediator = Remediator::new(Arc::new(TemplateRegistry::builtin()), RemediationConfig::default())
            .with_generator(Arc::new(generator));
        let outcome = remediator.remediate(&mut doc, &ledger);

        assert!(outcome.pending_requests.is_empty());
        let alt = status_of(&outcome, "missing-alt-text");
        assert_eq!(alt.remediation_status, RemediationStatus::Remediated);
        assert_eq!(alt.remediation_details.after_content.as_deref(), Some("alt=\"Revenue chart\""));

        let failed: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.remediation_status == RemediationStatus::Failed)
            .filter(|i| remediator.dispatcher().templates().get(&i.issue.issue_type).is_some())
            .collect();
        assert!(!failed.is_empty());
        assert!(failed.iter().all(|i| i
            .remediation_details
            .failure_reason
            .as_deref()
            .unwrap()
            .contains("offline")));
    }

    #[test]
    fn test_generate_content_off_keeps_requests() {
        let mut doc = Document::parse(PAGE).unwrap();
        let ledger = audit(&doc);
        let generator = |_: &GenerationRequest| -> std::result::Result<String, GenerationError> {
            panic!("generator must not be called")
        };
        let config = RemediationConfig {
            generate_content: false,
            ..RemediationConfig::default()
        };
        let remediator = Remediator::new(Arc::new(TemplateRegistry::builtin()), config)
            .with_generator(Arc::new(generator));
        let outcome = remediator.remediate(&mut doc, &ledger);
        assert!(!outcome.pending_requests.is_empty());
    }
}
