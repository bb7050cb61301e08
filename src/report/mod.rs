// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report documents for audit and remediation passes.
//!
//! Supports two output formats:
//! - Text: human-readable issues grouped by severity with WCAG references
//! - JSON: the report document itself, for programmatic consumption

use crate::error::Result;
use crate::issue::{AuditIssue, RemediationIssue, RemediationStatus, Severity};
use crate::remediation::{GenerationRequest, RemediationOutcome};
use crate::summary::{AuditSummary, BatchCounts, RemediationSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Status group keys, matching the summary counters
const STATUS_COMPLIANT: &str = "compliant";
const STATUS_NEEDS_REMEDIATION: &str = "needs_remediation";

/// Result of auditing one document or a batch of documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    #[serde(default = "Uuid::new_v4")]
    pub report_id: Uuid,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub summary: AuditSummary,
    /// Issue ids by page number; issues without a page are left out
    #[serde(default)]
    pub by_page: BTreeMap<u32, Vec<String>>,
    /// Issue ids under `compliant` and `needs_remediation`
    #[serde(default)]
    pub by_status: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub issues: Vec<AuditIssue>,
}

impl AuditReport {
    /// Report over the given issues, summary and groups derived from them
    pub fn new(issues: Vec<AuditIssue>) -> Self {
        let (by_page, by_status) = group_issues(&issues);
        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            html_path: None,
            document_id: None,
            summary: AuditSummary::from_issues(&issues),
            by_page,
            by_status,
            issues,
        }
    }

    pub fn with_html_path(mut self, path: &str) -> Self {
        self.html_path = Some(path.to_string());
        self
    }

    pub fn with_document_id(mut self, id: &str) -> Self {
        self.document_id = Some(id.to_string());
        self
    }

    /// Whether a non-compliant critical issue remains
    pub fn has_critical(&self) -> bool {
        AuditSummary::outstanding(&self.issues, Severity::Critical) > 0
    }

    /// Load a report produced elsewhere; missing counters default to zero
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => audit_text(self),
            OutputFormat::Json => to_json(self),
        }
    }
}

/// Result of remediating one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationReport {
    #[serde(default = "Uuid::new_v4")]
    pub report_id: Uuid,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediated_html_path: Option<String>,
    pub summary: RemediationSummary,
    #[serde(default)]
    pub issues: Vec<RemediationIssue>,
    /// Generation requests nobody answered yet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_requests: Vec<GenerationRequest>,
}

impl RemediationReport {
    pub fn new(outcome: RemediationOutcome) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            html_path: None,
            document_id: None,
            remediated_html_path: None,
            summary: RemediationSummary::from_issues(&outcome.issues),
            issues: outcome.issues,
            pending_requests: outcome.pending_requests,
        }
    }

    pub fn with_html_path(mut self, path: &str) -> Self {
        self.html_path = Some(path.to_string());
        self
    }

    pub fn with_document_id(mut self, id: &str) -> Self {
        self.document_id = Some(id.to_string());
        self
    }

    pub fn with_remediated_html_path(mut self, path: &str) -> Self {
        self.remediated_html_path = Some(path.to_string());
        self
    }

    /// Recompute the summary with externally supplied batch counters
    pub fn with_batch_counts(mut self, counts: &BatchCounts) -> Self {
        self.summary = RemediationSummary::reconcile(&self.issues, Some(counts));
        self
    }

    /// Load a report produced elsewhere; missing counters default to zero
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => remediation_text(self),
            OutputFormat::Json => to_json(self),
        }
    }
}

fn group_issues(issues: &[AuditIssue]) -> (BTreeMap<u32, Vec<String>>, BTreeMap<String, Vec<String>>) {
    let mut by_page: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut by_status: BTreeMap<String, Vec<String>> = [STATUS_COMPLIANT, STATUS_NEEDS_REMEDIATION]
        .iter()
        .map(|k| (k.to_string(), Vec::new()))
        .collect();

    for audit in issues {
        let id = audit.issue.id.clone();
        if let Some(page) = audit.issue.location.as_ref().and_then(|l| l.page_number) {
            by_page.entry(page).or_default().push(id.clone());
        }
        let status = if audit.is_compliant() {
            STATUS_COMPLIANT
        } else {
            STATUS_NEEDS_REMEDIATION
        };
        by_status.entry(status.to_string()).or_default().push(id);
    }
    (by_page, by_status)
}

fn to_json<T: Serialize>(report: &T) -> String {
    serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {}\"}}", e))
}

fn severity_line(counts: &std::collections::BTreeMap<String, usize>) -> String {
    Severity::RECOGNISED
        .iter()
        .map(|s| format!("{} {}", counts.get(s.as_str()).copied().unwrap_or(0), s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn subject(html_path: &Option<String>, document_id: &Option<String>) -> String {
    html_path
        .as_deref()
        .or(document_id.as_deref())
        .unwrap_or("<document>")
        .to_string()
}

fn audit_text(report: &AuditReport) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    output.push_str("=== Remediabot Accessibility Audit ===\n");
    output.push_str(&format!(
        "Document: {}\n\n",
        subject(&report.html_path, &report.document_id)
    ));

    if summary.needs_remediation == 0 {
        output.push_str(&format!(
            "No accessibility issues found ({} compliant check result(s)).\n",
            summary.compliant
        ));
        output.push_str(&pages_text(report));
        return output;
    }

    output.push_str(&format!(
        "Found {} issue(s) needing remediation, {} compliant\n",
        summary.needs_remediation, summary.compliant
    ));
    output.push_str(&format!("Severity: {}\n", severity_line(&summary.severity_counts)));
    output.push_str(&format!(
        "Status: {} needs_remediation, {} compliant\n\n",
        status_count(report, STATUS_NEEDS_REMEDIATION),
        status_count(report, STATUS_COMPLIANT)
    ));

    for severity in Severity::RECOGNISED {
        let group: Vec<&AuditIssue> = report
            .issues
            .iter()
            .filter(|i| !i.is_compliant() && i.issue.severity == severity)
            .collect();
        if group.is_empty() {
            continue;
        }

        output.push_str(&format!("--- {} ({}) ---\n", severity, group.len()));
        for audit in group {
            let issue = &audit.issue;
            output.push_str(&format!("[{}] {}\n", issue.issue_type, issue.message));
            output.push_str(&format!("  Location: {}\n", issue.location_string()));
            match &audit.standards_reference {
                Some(reference) => output.push_str(&format!("  WCAG: {}\n", reference)),
                None if !issue.wcag_criterion.is_empty() => {
                    output.push_str(&format!("  WCAG: {}\n", issue.wcag_criterion))
                }
                None => {}
            }
            if let Some(help) = &audit.help_text {
                output.push_str(&format!("  Fix: {}\n", help));
            }
            output.push('\n');
        }
    }

    output.push_str(&pages_text(report));

    if report.has_critical() {
        output.push_str("RESULT: CRITICAL ISSUES REMAIN\n");
    } else {
        output.push_str("RESULT: NEEDS REMEDIATION\n");
    }
    output
}

fn status_count(report: &AuditReport, status: &str) -> usize {
    report.by_status.get(status).map(Vec::len).unwrap_or(0)
}

/// Per-page issue counts, empty when no issue carries a page number
fn pages_text(report: &AuditReport) -> String {
    if report.by_page.is_empty() {
        return String::new();
    }
    let mut output = String::from("--- PAGES ---\n");
    for (page, ids) in &report.by_page {
        output.push_str(&format!("Page {}: {} issue(s) ({})\n", page, ids.len(), ids.join(", ")));
    }
    output.push('\n');
    output
}

fn remediation_text(report: &RemediationReport) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    output.push_str("=== Remediabot Remediation Report ===\n");
    output.push_str(&format!(
        "Document: {}\n",
        subject(&report.html_path, &report.document_id)
    ));
    if let Some(out) = &report.remediated_html_path {
        output.push_str(&format!("Remediated HTML: {}\n", out));
    }
    output.push('\n');

    output.push_str(&format!(
        "Processed {} issue(s): {} remediated, {} not remediated\n",
        summary.issues_processed, summary.remediated_issues, summary.failed_issues
    ));
    output.push_str(&format!("Severity: {}\n\n", severity_line(&summary.severity_counts)));

    for issue in &report.issues {
        let details = &issue.remediation_details;
        output.push_str(&format!(
            "[{}] {} ({})\n",
            issue.remediation_status, issue.issue.issue_type, issue.issue.id
        ));
        match issue.remediation_status {
            RemediationStatus::Remediated => {
                if let Some(fix) = &details.fix_description {
                    output.push_str(&format!("  Fix: {}\n", fix));
                }
            }
            RemediationStatus::Failed => {
                if let Some(reason) = &details.failure_reason {
                    output.push_str(&format!("  Reason: {}\n", reason));
                }
            }
            RemediationStatus::NeedsRemediation => {
                output.push_str(&format!("  {}\n", issue.issue.message));
            }
        }
    }

    if !report.pending_requests.is_empty() {
        output.push_str(&format!(
            "\n{} generation request(s) awaiting content\n",
            report.pending_requests.len()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Issue, IssueStatus, Location, RemediationDetails};

    fn audit_issue(issue_type: &str, severity: Severity) -> AuditIssue {
        let mut issue = AuditIssue::new(
            Issue::new(issue_type, severity, "Image is missing alt text")
                .with_wcag("1.1.1")
                .with_location(Location {
                    path: Some("html > body > img".to_string()),
                    ..Location::default()
                }),
            IssueStatus::Reported,
        );
        issue.standards_reference = Some("1.1.1 Non-text Content (Level A)".to_string());
        issue
    }

    #[test]
    fn test_text_report_all_compliant() {
        let issues = vec![AuditIssue::new(
            Issue::new("compliant-document-title", Severity::Info, "ok"),
            IssueStatus::Compliant,
        )];
        let report = AuditReport::new(issues).render(OutputFormat::Text);
        assert!(report.contains("No accessibility issues found (1 compliant"));
    }

    #[test]
    fn test_text_report_groups_by_severity() {
        let report = AuditReport::new(vec![audit_issue("missing-alt-text", Severity::Critical)])
            .with_html_path("page-1.html");
        let text = report.render(OutputFormat::Text);
        assert!(text.contains("Document: page-1.html"));
        assert!(text.contains("--- CRITICAL (1) ---"));
        assert!(text.contains("[missing-alt-text] Image is missing alt text"));
        assert!(text.contains("WCAG: 1.1.1 Non-text Content (Level A)"));
        assert!(text.contains("Location: html > body > img"));
        assert!(text.contains("CRITICAL ISSUES REMAIN"));
    }

    #[test]
    fn test_json_report_shape() {
        let report = AuditReport::new(vec![audit_issue("missing-alt-text", Severity::Critical)])
            .with_document_id("doc-42");
        let parsed: serde_json::Value = serde_json::from_str(&report.render(OutputFormat::Json)).unwrap();
        assert_eq!(parsed["document_id"], "doc-42");
        assert_eq!(parsed["summary"]["total_issues"], 1);
        assert_eq!(parsed["issues"][0]["type"], "missing-alt-text");
        assert_eq!(parsed["issues"][0]["status"], "reported");
        assert!(parsed.get("html_path").is_none());
    }

    #[test]
    fn test_remediation_report_with_batch_counts() {
        let mut fixed = RemediationIssue::pending(Issue::new("insufficient-color-contrast", Severity::Major, "x"));
        fixed
            .mark_remediated(RemediationDetails {
                fix_description: Some("Changed text color".to_string()),
                ..RemediationDetails::default()
            })
            .unwrap();
        let outcome = RemediationOutcome {
            issues: vec![fixed],
            pending_requests: Vec::new(),
        };
        let report = RemediationReport::new(outcome).with_remediated_html_path("out.html");
        assert_eq!(report.summary.remediated_issues, 1);

        let text = report.render(OutputFormat::Text);
        assert!(text.contains("Remediated HTML: out.html"));
        assert!(text.contains("[remediated] insufficient-color-contrast"));
        assert!(text.contains("Fix: Changed text color"));

        let batch = BatchCounts {
            issues_processed: Some(12),
            ..BatchCounts::default()
        };
        let report = report.with_batch_counts(&batch);
        assert_eq!(report.summary.issues_processed, 12);
        assert_eq!(report.summary.remediated_issues, 1);
    }

    #[test]
    fn test_external_report_loads_leniently() {
        let json = r#"{
            "html_path": "chunk-3.html",
            "summary": {"total_issues": 1, "needs_remediation": 1, "compliant": 0,
                        "severity_counts": {}, "issue_type_stats": {}},
            "issues": [{"type": "missing-alt-text", "severity": "SEVERE", "description": "x"}]
        }"#;
        let report = AuditReport::from_json(json).unwrap();
        assert_eq!(report.issues[0].issue.severity, Severity::Unknown);
        assert_eq!(report.issues[0].issue.message, "x");
        let recomputed = AuditSummary::from_issues(&report.issues);
        assert_eq!(recomputed.total_issues, 1);
        assert_eq!(recomputed.severity_counts.values().sum::<usize>(), 0);
    }

    #[test]
    fn test_groups_by_page_and_status() {
        let paged = |id: &str, issue_type: &str, page: Option<u32>, status: IssueStatus| {
            let mut issue = Issue::new(issue_type, Severity::Major, "x").with_location(Location {
                page_number: page,
                ..Location::default()
            });
            issue.id = id.to_string();
            AuditIssue::new(issue, status)
        };
        let report = AuditReport::new(vec![
            paged("issue-1", "missing-alt-text", Some(2), IssueStatus::Reported),
            paged("issue-2", "compliant-document-title", Some(1), IssueStatus::Compliant),
            paged("issue-3", "generic-title", Some(2), IssueStatus::Reported),
            paged("issue-4", "missing-main-landmark", None, IssueStatus::Reported),
        ]);

        assert_eq!(report.by_page.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(report.by_page[&2], vec!["issue-1", "issue-3"]);
        assert_eq!(report.by_status["compliant"], vec!["issue-2"]);
        assert_eq!(report.by_status["needs_remediation"], vec!["issue-1", "issue-3", "issue-4"]);

        let text = report.render(OutputFormat::Text);
        assert!(text.contains("Status: 3 needs_remediation, 1 compliant"));
        assert!(text.contains("Page 2: 2 issue(s) (issue-1, issue-3)"));

        let parsed: serde_json::Value = serde_json::from_str(&report.render(OutputFormat::Json)).unwrap();
        assert_eq!(parsed["by_page"]["1"][0], "issue-2");
        assert_eq!(parsed["by_status"]["needs_remediation"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }
}
