// SPDX-License-Identifier: PMPL-1.0-or-later
//! Summary aggregation for audit and remediation results.
//!
//! Summaries are derived from an issue collection and can be merged across
//! documents; merging only sums counts, so the order documents finish in
//! does not matter.

use crate::issue::{AuditIssue, Issue, RemediationIssue, RemediationStatus, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `{critical, major, minor, info}` with every bucket present
fn empty_severity_counts() -> BTreeMap<String, usize> {
    Severity::RECOGNISED
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect()
}

/// Severity and per-type counts shared by both summary kinds
fn count_issues<'a>(issues: impl Iterator<Item = &'a Issue>) -> (BTreeMap<String, usize>, BTreeMap<String, usize>) {
    let mut severity_counts = empty_severity_counts();
    let mut issue_type_stats = BTreeMap::new();
    for issue in issues {
        // unrecognised severities still count toward the total
        if let Some(count) = severity_counts.get_mut(issue.severity.as_str()) {
            *count += 1;
        }
        *issue_type_stats.entry(issue.issue_type.clone()).or_insert(0) += 1;
    }
    (severity_counts, issue_type_stats)
}

fn merge_counts(into: &mut BTreeMap<String, usize>, from: &BTreeMap<String, usize>) {
    for (key, count) in from {
        *into.entry(key.clone()).or_insert(0) += count;
    }
}

/// Statistics for one audit (or several merged audits)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_issues: usize,
    pub needs_remediation: usize,
    pub compliant: usize,
    pub severity_counts: BTreeMap<String, usize>,
    pub issue_type_stats: BTreeMap<String, usize>,
}

impl Default for AuditSummary {
    fn default() -> Self {
        Self {
            total_issues: 0,
            needs_remediation: 0,
            compliant: 0,
            severity_counts: empty_severity_counts(),
            issue_type_stats: BTreeMap::new(),
        }
    }
}

impl AuditSummary {
    pub fn from_issues(issues: &[AuditIssue]) -> Self {
        let (severity_counts, issue_type_stats) = count_issues(issues.iter().map(|i| &i.issue));
        let compliant = issues.iter().filter(|i| i.is_compliant()).count();
        Self {
            total_issues: issues.len(),
            needs_remediation: issues.len() - compliant,
            compliant,
            severity_counts,
            issue_type_stats,
        }
    }

    /// Outstanding (non-compliant) issues at a given severity
    pub fn outstanding(issues: &[AuditIssue], severity: Severity) -> usize {
        issues
            .iter()
            .filter(|i| !i.is_compliant() && i.issue.severity == severity)
            .count()
    }

    /// Add another summary's counts to this one
    pub fn merge(&mut self, other: &AuditSummary) {
        self.total_issues += other.total_issues;
        self.needs_remediation += other.needs_remediation;
        self.compliant += other.compliant;
        merge_counts(&mut self.severity_counts, &other.severity_counts);
        merge_counts(&mut self.issue_type_stats, &other.issue_type_stats);
    }
}

/// Remediation counters reported by one file of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    #[serde(default)]
    pub issues_processed: usize,
    #[serde(default)]
    pub issues_remediated: usize,
    #[serde(default)]
    pub issues_failed: usize,
}

/// Externally supplied counters for multi-document runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    #[serde(default)]
    pub issues_processed: Option<usize>,
    #[serde(default)]
    pub issues_remediated: Option<usize>,
    #[serde(default)]
    pub issues_failed: Option<usize>,
    #[serde(default)]
    pub file_results: Vec<FileCounts>,
}

impl BatchCounts {
    /// Sum of the per-file counters
    pub fn file_totals(&self) -> FileCounts {
        self.file_results.iter().fold(FileCounts::default(), |acc, f| FileCounts {
            issues_processed: acc.issues_processed + f.issues_processed,
            issues_remediated: acc.issues_remediated + f.issues_remediated,
            issues_failed: acc.issues_failed + f.issues_failed,
        })
    }
}

/// Statistics for one remediation pass (or several merged passes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationSummary {
    pub total_issues: usize,
    pub issues_processed: usize,
    pub remediated_issues: usize,
    pub failed_issues: usize,
    pub severity_counts: BTreeMap<String, usize>,
    pub issue_type_stats: BTreeMap<String, usize>,
}

impl Default for RemediationSummary {
    fn default() -> Self {
        Self {
            total_issues: 0,
            issues_processed: 0,
            remediated_issues: 0,
            failed_issues: 0,
            severity_counts: empty_severity_counts(),
            issue_type_stats: BTreeMap::new(),
        }
    }
}

impl RemediationSummary {
    /// Counts derived from the issues alone. Anything not remediated counts
    /// as failed.
    pub fn from_issues(issues: &[RemediationIssue]) -> Self {
        Self::reconcile(issues, None)
    }

    /// Counts derived from the issues, overridden by batch counters.
    ///
    /// Non-zero per-file totals replace the issue-derived counts. After
    /// that, a remediated or failed count that is still zero falls back to
    /// the top-level counter when one is given.
    pub fn reconcile(issues: &[RemediationIssue], batch: Option<&BatchCounts>) -> Self {
        let (severity_counts, issue_type_stats) = count_issues(issues.iter().map(|i| &i.issue));
        let remediated = issues
            .iter()
            .filter(|i| i.remediation_status == RemediationStatus::Remediated)
            .count();

        let mut processed = issues.len();
        let mut remediated_issues = remediated;
        let mut failed_issues = issues.len() - remediated;

        if let Some(batch) = batch {
            if let Some(top) = batch.issues_processed.filter(|n| *n > 0) {
                processed = top;
            }

            let files = batch.file_totals();
            if files.issues_processed > 0 {
                remediated_issues = files.issues_remediated;
                failed_issues = files.issues_failed;
                processed = files.issues_processed;
            }

            if remediated_issues == 0 {
                if let Some(top) = batch.issues_remediated {
                    remediated_issues = top;
                }
            }
            if failed_issues == 0 {
                if let Some(top) = batch.issues_failed {
                    failed_issues = top;
                }
            }
        }

        Self {
            total_issues: processed,
            issues_processed: processed,
            remediated_issues,
            failed_issues,
            severity_counts,
            issue_type_stats,
        }
    }

    /// Add another summary's counts to this one
    pub fn merge(&mut self, other: &RemediationSummary) {
        self.total_issues += other.total_issues;
        self.issues_processed += other.issues_processed;
        self.remediated_issues += other.remediated_issues;
        self.failed_issues += other.failed_issues;
        merge_counts(&mut self.severity_counts, &other.severity_counts);
        merge_counts(&mut self.issue_type_stats, &other.issue_type_stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueStatus, RemediationDetails};

    fn audit_issue(issue_type: &str, severity: Severity, status: IssueStatus) -> AuditIssue {
        AuditIssue::new(Issue::new(issue_type, severity, "x"), status)
    }

    fn sample() -> Vec<AuditIssue> {
        vec![
            audit_issue("missing-alt-text", Severity::Critical, IssueStatus::Reported),
            audit_issue("generic-link-text", Severity::Major, IssueStatus::Reported),
            audit_issue("generic-link-text", Severity::Major, IssueStatus::Reported),
            audit_issue("url-as-link-text", Severity::Minor, IssueStatus::Reported),
            audit_issue("compliant-link-text", Severity::Info, IssueStatus::Compliant),
            // prefix alone marks compliance
            audit_issue("compliant-alt-text", Severity::Critical, IssueStatus::Reported),
        ]
    }

    #[test]
    fn test_severity_counts_sum_to_total() {
        let summary = AuditSummary::from_issues(&sample());
        let sum: usize = summary.severity_counts.values().sum();
        assert_eq!(sum, summary.total_issues);
        assert_eq!(summary.severity_counts["critical"], 2);
        assert_eq!(summary.issue_type_stats["generic-link-text"], 2);
    }

    #[test]
    fn test_compliant_issues_never_need_remediation() {
        let summary = AuditSummary::from_issues(&sample());
        assert_eq!(summary.compliant, 2);
        assert_eq!(summary.needs_remediation, 4);
        assert_eq!(AuditSummary::outstanding(&sample(), Severity::Critical), 1);
    }

    #[test]
    fn test_unknown_severity_counts_in_total_only() {
        let issues = vec![audit_issue("odd", Severity::Unknown, IssueStatus::Reported)];
        let summary = AuditSummary::from_issues(&issues);
        assert_eq!(summary.total_issues, 1);
        assert_eq!(summary.severity_counts.values().sum::<usize>(), 0);
        assert!(!summary.severity_counts.contains_key("unknown"));
    }

    #[test]
    fn test_merge_is_order_independent() {
        let issues = sample();
        let a = AuditSummary::from_issues(&issues[..2]);
        let b = AuditSummary::from_issues(&issues[2..4]);
        let c = AuditSummary::from_issues(&issues[4..]);

        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);

        let mut right = c.clone();
        right.merge(&a);
        right.merge(&b);

        assert_eq!(left, right);
        assert_eq!(left, AuditSummary::from_issues(&issues));
    }

    fn remediation_issue(status: RemediationStatus) -> RemediationIssue {
        let mut issue = RemediationIssue::pending(Issue::new("missing-alt-text", Severity::Critical, "x"));
        match status {
            RemediationStatus::Remediated => issue.mark_remediated(RemediationDetails::default()).unwrap(),
            RemediationStatus::Failed => issue.mark_failed("boom").unwrap(),
            RemediationStatus::NeedsRemediation => {}
        }
        issue
    }

    #[test]
    fn test_array_derived_counts() {
        let issues = vec![
            remediation_issue(RemediationStatus::Remediated),
            remediation_issue(RemediationStatus::Failed),
            remediation_issue(RemediationStatus::NeedsRemediation),
        ];
        let summary = RemediationSummary::from_issues(&issues);
        assert_eq!(summary.issues_processed, 3);
        assert_eq!(summary.remediated_issues, 1);
        assert_eq!(summary.failed_issues, 2);
    }

    #[test]
    fn test_file_results_override_zero_array_counts() {
        let batch = BatchCounts {
            file_results: vec![
                FileCounts { issues_processed: 4, issues_remediated: 3, issues_failed: 1 },
                FileCounts { issues_processed: 3, issues_remediated: 2, issues_failed: 1 },
            ],
            ..BatchCounts::default()
        };
        let summary = RemediationSummary::reconcile(&[], Some(&batch));
        assert_eq!(summary.remediated_issues, 5);
        assert_eq!(summary.failed_issues, 2);
        assert_eq!(summary.issues_processed, 7);
        assert_eq!(summary.total_issues, 7);
    }

    #[test]
    fn test_top_level_counters_are_the_fallback() {
        let batch = BatchCounts {
            issues_processed: Some(9),
            issues_remediated: Some(6),
            issues_failed: Some(3),
            file_results: vec![FileCounts::default()],
        };
        let summary = RemediationSummary::reconcile(&[], Some(&batch));
        assert_eq!(
            (summary.issues_processed, summary.remediated_issues, summary.failed_issues),
            (9, 6, 3)
        );
    }

    #[test]
    fn test_batch_counts_deserialize_with_missing_fields() {
        let batch: BatchCounts =
            serde_json::from_str(r#"{"file_results": [{"issues_remediated": 2}]}"#).unwrap();
        assert_eq!(batch.issues_processed, None);
        assert_eq!(batch.file_totals().issues_remediated, 2);
    }
}
