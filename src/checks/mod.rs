// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility checks and the audit runner.
//!
//! Each check module focuses on one group of related WCAG criteria. A check
//! inspects the [`Document`] and emits issues through an [`IssueSink`]; the
//! [`AuditRunner`] runs every registered check in isolation so that a check
//! which fails (or panics) contributes nothing while the rest still run.

pub mod contrast;
pub mod document;
pub mod forms;
pub mod headings;
pub mod images;
pub mod landmarks;
pub mod links;
pub mod tables;

use crate::config::AuditConfig;
use crate::context::ContextCollector;
use crate::document::{Document, NodeId};
use crate::error::{EngineError, Result};
use crate::issue::{AuditIssue, Issue, IssueLedger, IssueStatus, Location, Severity};
use crate::standards::Standards;
use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

/// Trait implemented by all checks
pub trait Check: Send + Sync {
    /// Stable name, used by `audit.disabled_checks`
    fn name(&self) -> &'static str;

    /// Short description of what this check inspects
    fn description(&self) -> &str;

    /// Inspect the document and emit issues
    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()>;
}

/// The full catalogue, in execution order
pub fn default_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(headings::HeadingHierarchyCheck),
        Box::new(headings::HeadingContentCheck),
        Box::new(document::DocumentTitleCheck),
        Box::new(document::DocumentLanguageCheck),
        Box::new(landmarks::MainLandmarkCheck),
        Box::new(landmarks::SkipLinkCheck),
        Box::new(landmarks::LandmarksCheck),
        Box::new(images::AltTextCheck),
        Box::new(images::FigureStructureCheck),
        Box::new(links::LinkTextCheck),
        Box::new(links::NewWindowLinkCheck),
        Box::new(tables::TableHeaderCheck),
        Box::new(tables::TableStructureCheck),
        Box::new(forms::FormLabelCheck),
        Box::new(forms::FormRequiredFieldCheck),
        Box::new(forms::FormFieldsetCheck),
        Box::new(contrast::ColorContrastCheck),
    ]
}

/// Collects the issues emitted by one check.
///
/// WCAG criterion, default severity and compliance status come from the
/// taxonomy; the sink applies the severity threshold and attaches element
/// context when detailed output is enabled.
pub struct IssueSink<'a> {
    doc: &'a Document,
    standards: &'a Standards,
    collector: ContextCollector,
    threshold: Severity,
    detailed: bool,
    issues: Vec<AuditIssue>,
}

impl<'a> IssueSink<'a> {
    /// Create a sink for one check run
    pub fn new(
        doc: &'a Document,
        standards: &'a Standards,
        config: &AuditConfig,
        collector: ContextCollector,
    ) -> Self {
        Self {
            doc,
            standards,
            collector,
            threshold: config.severity_threshold,
            detailed: config.detailed,
            issues: Vec::new(),
        }
    }

    /// Emit an issue with the taxonomy defaults
    pub fn emit(&mut self, issue_type: &str, node: Option<NodeId>, message: impl Into<String>) {
        self.draft(issue_type, node, message).emit();
    }

    /// Start an issue that needs a severity override or extra details
    pub fn draft(
        &mut self,
        issue_type: &str,
        node: Option<NodeId>,
        message: impl Into<String>,
    ) -> Draft<'_, 'a> {
        Draft {
            sink: self,
            issue_type: issue_type.to_string(),
            node,
            message: message.into(),
            severity: None,
            details: Map::new(),
        }
    }

    fn record(&mut self, draft: DraftParts) {
        let standards = self.standards;
        let entry = standards.taxonomy.classify(&draft.issue_type);
        let severity = draft.severity.unwrap_or(entry.severity);
        let status = if entry.compliant {
            IssueStatus::Compliant
        } else {
            IssueStatus::Reported
        };

        if status == IssueStatus::Reported && severity.rank() < self.threshold.rank() {
            debug!(
                issue_type = %draft.issue_type,
                severity = %severity,
                "Skipping issue below severity threshold"
            );
            return;
        }

        let mut issue = Issue::new(&draft.issue_type, severity, &draft.message)
            .with_wcag(entry.wcag_criterion);

        if let Some(node) = draft.node.filter(|n| self.doc.is_element(*n)) {
            let (index, _) = self.doc.position_of_type(node);
            let image_src = if self.doc.tag(node) == "img" {
                self.doc.attr(node, "src").map(str::to_string)
            } else {
                None
            };
            issue = issue
                .with_element(self.doc.tag(node))
                .with_selector(&self.doc.selector(node))
                .with_location(Location {
                    path: Some(self.doc.path(node)),
                    index: Some(index),
                    image_src,
                    ..Location::default()
                });

            if self.detailed {
                let mut context = match self.collector.collect(self.doc, node).to_value() {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                context.extend(draft.details);
                issue = issue.with_context(Value::Object(context));
            }
        } else if self.detailed && !draft.details.is_empty() {
            issue = issue.with_context(Value::Object(draft.details));
        }

        debug!(issue_type = %issue.issue_type, severity = %severity, "Issue added");

        let mut audit = AuditIssue::new(issue, status);
        audit.help_text = Some(entry.description.to_string());
        audit.standards_reference = Some(standards.reference_for(&draft.issue_type));
        self.issues.push(audit);
    }

    /// Issues emitted so far
    pub fn issues(&self) -> &[AuditIssue] {
        &self.issues
    }

    /// Consume the sink
    pub fn into_issues(self) -> Vec<AuditIssue> {
        self.issues
    }
}

struct DraftParts {
    issue_type: String,
    node: Option<NodeId>,
    message: String,
    severity: Option<Severity>,
    details: Map<String, Value>,
}

/// An issue under construction; call [`Draft::emit`] to record it
pub struct Draft<'s, 'a> {
    sink: &'s mut IssueSink<'a>,
    issue_type: String,
    node: Option<NodeId>,
    message: String,
    severity: Option<Severity>,
    details: Map<String, Value>,
}

impl Draft<'_, '_> {
    /// Override the taxonomy severity
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Attach a detail to the issue context
    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Record the issue
    pub fn emit(self) {
        let parts = DraftParts {
            issue_type: self.issue_type,
            node: self.node,
            message: self.message,
            severity: self.severity,
            details: self.details,
        };
        self.sink.record(parts);
    }
}

/// Runs the registered checks against a document
pub struct AuditRunner {
    checks: Vec<Box<dyn Check>>,
    standards: Standards,
    config: AuditConfig,
    collector: ContextCollector,
}

impl AuditRunner {
    /// Runner with the full check catalogue
    pub fn new(standards: Standards, config: AuditConfig) -> Self {
        Self::with_checks(default_checks(), standards, config)
    }

    /// Runner with an explicit check list
    pub fn with_checks(
        checks: Vec<Box<dyn Check>>,
        standards: Standards,
        config: AuditConfig,
    ) -> Self {
        Self {
            checks,
            standards,
            config,
            collector: ContextCollector::default(),
        }
    }

    /// Use a collector with a specific snippet limit
    pub fn with_collector(mut self, collector: ContextCollector) -> Self {
        self.collector = collector;
        self
    }

    /// Names of the registered checks, in order
    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run every enabled check and collect the issue ledger
    pub fn run(&self, doc: &Document) -> IssueLedger {
        let mut ledger = IssueLedger::new();

        for check in &self.checks {
            if self.config.disabled_checks.iter().any(|d| d == check.name()) {
                debug!(check = check.name(), "Check disabled by configuration");
                continue;
            }

            debug!(check = check.name(), "Running check");
            match self.run_isolated(check.as_ref(), doc) {
                Ok(issues) => {
                    debug!(check = check.name(), count = issues.len(), "Check finished");
                    ledger.extend(issues);
                }
                Err(e) => {
                    error!(check = check.name(), error = %e, "Check failed, output discarded");
                }
            }
        }

        ledger
    }

    fn run_isolated(&self, check: &dyn Check, doc: &Document) -> Result<Vec<AuditIssue>> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut sink = IssueSink::new(doc, &self.standards, &self.config, self.collector);
            check.run(doc, &mut sink).map(|_| sink.into_issues())
        }));

        match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "panic".to_string());
                Err(EngineError::CheckFailed {
                    check: check.name().to_string(),
                    message,
                })
            }
        }
    }
}

/// Parse a span attribute, treating anything unparsable as 1
pub(crate) fn span_value(value: Option<&str>) -> u32 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(1)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Run one check over HTML with default settings
    pub fn run_check(check: &dyn Check, html: &str) -> Vec<AuditIssue> {
        let doc = Document::parse(html).unwrap();
        let runner = AuditRunner::with_checks(
            vec![],
            Standards::builtin(),
            AuditConfig::default(),
        );
        runner.run_isolated(check, &doc).unwrap()
    }

    /// Issue types in emission order
    pub fn types(issues: &[AuditIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.issue.issue_type.as_str()).collect()
    }
}
