// SPDX-License-Identifier: PMPL-1.0-or-later
//! Issue data model: severities, compliance and remediation statuses, and
//! the append-only ledger an audit pass writes into.
//!
//! An [`Issue`] is the shared record shape. Audit passes wrap it in an
//! [`AuditIssue`] (compliance status); remediation passes wrap it in a
//! [`RemediationIssue`] (remediation status and details). Both serialise
//! flat, with lowercase string enums.

use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity levels for issues.
///
/// Ordering follows urgency: `Unknown < Info < Minor < Major < Critical`.
/// Unrecognised severity strings deserialise to [`Severity::Unknown`] so that
/// externally produced reports can still be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    /// Severity value that was not recognised
    Unknown,
    /// Informational
    Info,
    /// Minor barrier
    Minor,
    /// Significant barrier
    Major,
    /// Blocks access to content
    Critical,
}

impl Severity {
    /// All recognised severities, most urgent first
    pub const RECOGNISED: [Severity; 4] = [
        Severity::Critical,
        Severity::Major,
        Severity::Minor,
        Severity::Info,
    ];

    /// Numeric rank used for sorting and threshold filtering
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::Major => 3,
            Severity::Minor => 2,
            Severity::Info => 1,
            Severity::Unknown => 0,
        }
    }

    /// Lowercase key used in severity count maps
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Minor => "minor",
            Severity::Info => "info",
            Severity::Unknown => "unknown",
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Severity::Unknown)
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "major" => Ok(Severity::Major),
            "minor" => Ok(Severity::Minor),
            "info" => Ok(Severity::Info),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Major => write!(f, "MAJOR"),
            Severity::Minor => write!(f, "MINOR"),
            Severity::Info => write!(f, "INFO"),
            Severity::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Audit status of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    /// Outstanding defect that needs remediation
    #[default]
    Reported,
    /// Rule is already satisfied
    Compliant,
}

/// Outcome of a remediation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    /// Fix applied or generated content accepted
    Remediated,
    /// Fix attempted and failed
    Failed,
    /// Resting state before any attempt
    #[default]
    NeedsRemediation,
}

impl std::fmt::Display for RemediationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemediationStatus::Remediated => write!(f, "remediated"),
            RemediationStatus::Failed => write!(f, "failed"),
            RemediationStatus::NeedsRemediation => write!(f, "needs_remediation"),
        }
    }
}

/// Where an issue was found
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Deterministic root-to-element path, resolvable by `Document::resolve_path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Position among elements with the same tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

/// A single accessibility finding tied to one document element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Ledger-assigned identifier (`issue-N`)
    #[serde(default)]
    pub id: String,
    /// Issue type key into the taxonomy (e.g., "missing-alt-text")
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: Severity,
    /// WCAG criterion reference (e.g., "1.1.1")
    #[serde(default)]
    pub wcag_criterion: String,
    #[serde(alias = "description")]
    pub message: String,
    /// Short CSS selector for the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Tag name of the element involved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    /// Free-form context (map or string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Issue {
    /// Create a new issue
    pub fn new(issue_type: &str, severity: Severity, message: &str) -> Self {
        Self {
            id: String::new(),
            issue_type: issue_type.to_string(),
            severity,
            wcag_criterion: String::new(),
            message: message.to_string(),
            selector: None,
            element: None,
            context: None,
            location: None,
            timestamp: Utc::now(),
        }
    }

    /// Set the WCAG criterion
    pub fn with_wcag(mut self, criterion: &str) -> Self {
        self.wcag_criterion = criterion.to_string();
        self
    }

    /// Set the element selector
    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    /// Set the element tag name
    pub fn with_element(mut self, element: &str) -> Self {
        self.element = Some(element.to_string());
        self
    }

    /// Set the context
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Element path from the location, if any
    pub fn path(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.path.as_deref())
    }

    /// Get location string for display
    pub fn location_string(&self) -> String {
        let location = match &self.location {
            Some(l) => l,
            None => return "<unknown>".to_string(),
        };
        match (&location.file_path, &location.path) {
            (Some(f), Some(p)) => format!("{} @ {}", f, p),
            (Some(f), None) => f.clone(),
            (None, Some(p)) => p.clone(),
            (None, None) => "<unknown>".to_string(),
        }
    }
}

/// An issue as reported by an audit pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditIssue {
    #[serde(flatten)]
    pub issue: Issue,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standards_reference: Option<String>,
}

impl AuditIssue {
    /// Wrap an issue with the given status
    pub fn new(issue: Issue, status: IssueStatus) -> Self {
        Self {
            issue,
            status,
            help_text: None,
            standards_reference: None,
        }
    }

    /// An issue is compliant when its status says so or its type carries the
    /// `compliant-` prefix.
    pub fn is_compliant(&self) -> bool {
        self.status == IssueStatus::Compliant || self.issue.issue_type.starts_with("compliant-")
    }

    /// Sort key: compliant issues rank 0, others by severity
    pub fn priority(&self) -> u8 {
        if self.is_compliant() {
            0
        } else {
            self.issue.severity.rank()
        }
    }
}

/// Details recorded for a remediation attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemediationDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// An issue as tracked through a remediation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationIssue {
    #[serde(flatten)]
    pub issue: Issue,
    #[serde(default)]
    pub remediation_status: RemediationStatus,
    #[serde(default)]
    pub remediation_details: RemediationDetails,
}

impl RemediationIssue {
    /// Start tracking an issue in the `needs_remediation` state
    pub fn pending(issue: Issue) -> Self {
        Self {
            issue,
            remediation_status: RemediationStatus::NeedsRemediation,
            remediation_details: RemediationDetails::default(),
        }
    }

    /// Whether an attempt has already concluded
    pub fn is_settled(&self) -> bool {
        self.remediation_status != RemediationStatus::NeedsRemediation
    }

    fn transition(&mut self, to: RemediationStatus) -> Result<()> {
        if self.is_settled() {
            return Err(EngineError::InvalidTransition {
                from: self.remediation_status.to_string(),
                to: to.to_string(),
            });
        }
        self.remediation_status = to;
        Ok(())
    }

    /// Record a successful fix
    pub fn mark_remediated(&mut self, details: RemediationDetails) -> Result<()> {
        self.transition(RemediationStatus::Remediated)?;
        self.remediation_details = details;
        Ok(())
    }

    /// Record a failed attempt
    pub fn mark_failed(&mut self, reason: &str) -> Result<()> {
        self.transition(RemediationStatus::Failed)?;
        self.remediation_details.failure_reason = Some(reason.to_string());
        Ok(())
    }
}

impl From<AuditIssue> for RemediationIssue {
    fn from(audit: AuditIssue) -> Self {
        RemediationIssue::pending(audit.issue)
    }
}

/// Append-only collection of audit issues for one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueLedger {
    issues: Vec<AuditIssue>,
}

impl IssueLedger {
    /// Create empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an issue, assigning the next `issue-N` identifier
    pub fn push(&mut self, mut issue: AuditIssue) {
        issue.issue.id = format!("issue-{}", self.issues.len() + 1);
        self.issues.push(issue);
    }

    /// Append issues in order
    pub fn extend(&mut self, issues: impl IntoIterator<Item = AuditIssue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// All issues in emission order
    pub fn issues(&self) -> &[AuditIssue] {
        &self.issues
    }

    /// Get issues by severity
    pub fn by_severity(&self, severity: Severity) -> Vec<&AuditIssue> {
        self.issues.iter().filter(|i| i.issue.severity == severity).collect()
    }

    /// Get issues of a given type
    pub fn by_type(&self, issue_type: &str) -> Vec<&AuditIssue> {
        self.issues.iter().filter(|i| i.issue.issue_type == issue_type).collect()
    }

    /// Issues that still need remediation
    pub fn needs_remediation(&self) -> Vec<&AuditIssue> {
        self.issues.iter().filter(|i| !i.is_compliant()).collect()
    }

    /// Check if any outstanding critical issue remains
    pub fn has_critical(&self) -> bool {
        self.issues
            .iter()
            .any(|i| !i.is_compliant() && i.issue.severity == Severity::Critical)
    }

    /// Total count
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Is empty
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Consume the ledger
    pub fn into_issues(self) -> Vec<AuditIssue> {
        self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Major);
        assert!(Severity::Major > Severity::Minor);
        assert!(Severity::Minor > Severity::Info);
        assert!(Severity::Info > Severity::Unknown);
    }

    #[test]
    fn test_severity_lenient_deserialize() {
        let s: Severity = serde_json::from_str("\"MAJOR\"").unwrap();
        assert_eq!(s, Severity::Major);
        let s: Severity = serde_json::from_str("\"severe\"").unwrap();
        assert_eq!(s, Severity::Unknown);
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
    }

    #[test]
    fn test_compliant_by_prefix() {
        let issue = AuditIssue::new(
            Issue::new("compliant-alt-text", Severity::Critical, "ok"),
            IssueStatus::Reported,
        );
        assert!(issue.is_compliant());
        assert_eq!(issue.priority(), 0);

        let issue = AuditIssue::new(
            Issue::new("missing-alt-text", Severity::Critical, "bad"),
            IssueStatus::Reported,
        );
        assert!(!issue.is_compliant());
        assert_eq!(issue.priority(), 4);
    }

    #[test]
    fn test_ledger_assigns_sequential_ids() {
        let mut ledger = IssueLedger::new();
        ledger.push(AuditIssue::new(Issue::new("a", Severity::Minor, "a"), IssueStatus::Reported));
        ledger.push(AuditIssue::new(Issue::new("b", Severity::Major, "b"), IssueStatus::Reported));
        let ids: Vec<_> = ledger.issues().iter().map(|i| i.issue.id.as_str()).collect();
        assert_eq!(ids, vec!["issue-1", "issue-2"]);
    }

    #[test]
    fn test_remediation_transitions() {
        let mut issue = RemediationIssue::pending(Issue::new("empty-link-text", Severity::Critical, "x"));
        issue.mark_failed("timeout").unwrap();
        assert_eq!(issue.remediation_status, RemediationStatus::Failed);
        assert_eq!(issue.remediation_details.failure_reason.as_deref(), Some("timeout"));

        let err = issue.mark_remediated(RemediationDetails::default());
        assert!(matches!(err, Err(EngineError::InvalidTransition { .. })));
    }

    #[test]
    fn test_issue_json_shape() {
        let mut issue = RemediationIssue::pending(
            Issue::new("missing-title", Severity::Major, "no title").with_wcag("2.4.2"),
        );
        issue.issue.id = "issue-1".to_string();
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["type"], "missing-title");
        assert_eq!(value["severity"], "major");
        assert_eq!(value["remediation_status"], "needs_remediation");
        assert_eq!(value["wcag_criterion"], "2.4.2");
    }
}
