// SPDX-License-Identifier: PMPL-1.0-or-later
//! Multi-document processing.
//!
//! Converted PDFs often arrive as one HTML file per page. This module walks
//! a directory and audits or remediates every HTML file on the rayon pool
//! (one document and ledger per worker), then merges the per-file results.
//! Issue ids are renumbered across the batch so they stay unique.

use crate::document::{Document, NodeId};
use crate::engine::Engine;
use crate::error::Result;
use crate::issue::{AuditIssue, Issue, Location, RemediationStatus};
use crate::remediation::RemediationOutcome;
use crate::report::{AuditReport, RemediationReport};
use crate::summary::{AuditSummary, BatchCounts, FileCounts};
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File extensions treated as documents
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

static PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)page[_-]?(\d+)").expect("valid regex"));

/// Audit of one file
#[derive(Debug, Clone)]
pub struct FileAudit {
    pub path: PathBuf,
    /// Page number taken from the file name, if it carries one
    pub page_number: Option<u32>,
    pub summary: AuditSummary,
    pub issues: Vec<AuditIssue>,
}

/// Audit of a directory
#[derive(Debug, Clone, Default)]
pub struct BatchAudit {
    /// Per-file results, sorted by path
    pub files: Vec<FileAudit>,
    /// Files that could not be read or parsed
    pub skipped: Vec<PathBuf>,
    pub summary: AuditSummary,
}

impl BatchAudit {
    /// Flatten into a single report over all files
    pub fn into_report(self, dir: &Path) -> AuditReport {
        let summary = self.summary;
        let issues: Vec<AuditIssue> = self.files.into_iter().flat_map(|f| f.issues).collect();
        let mut report = AuditReport::new(issues).with_html_path(&dir.display().to_string());
        report.summary = summary;
        report
    }
}

/// Remediation of one file
#[derive(Debug, Clone)]
pub struct FileRemediation {
    pub path: PathBuf,
    /// Where the remediated HTML was written
    pub output_path: PathBuf,
    pub counts: FileCounts,
    pub outcome: RemediationOutcome,
}

/// Remediation of a directory
#[derive(Debug, Clone, Default)]
pub struct BatchRemediation {
    /// Per-file results, sorted by path
    pub files: Vec<FileRemediation>,
    /// Files that could not be read, parsed or written
    pub skipped: Vec<PathBuf>,
}

impl BatchRemediation {
    /// Per-file counters for summary reconciliation
    pub fn counts(&self) -> BatchCounts {
        BatchCounts {
            file_results: self.files.iter().map(|f| f.counts).collect(),
            ..BatchCounts::default()
        }
    }

    /// Flatten into a single report over all files
    pub fn into_report(self, dir: &Path, out_dir: &Path) -> RemediationReport {
        let counts = self.counts();
        let mut outcome = RemediationOutcome::default();
        for file in self.files {
            outcome.issues.extend(file.outcome.issues);
            outcome.pending_requests.extend(file.outcome.pending_requests);
        }
        RemediationReport::new(outcome)
            .with_batch_counts(&counts)
            .with_html_path(&dir.display().to_string())
            .with_remediated_html_path(&out_dir.display().to_string())
    }
}

/// Give issues batch-wide ids starting after `next`, returning old to new
fn renumber<'a>(issues: impl Iterator<Item = &'a mut Issue>, next: &mut usize) -> HashMap<String, String> {
    let mut renamed = HashMap::new();
    for issue in issues {
        *next += 1;
        let id = format!("issue-{}", next);
        renamed.insert(std::mem::replace(&mut issue.id, id.clone()), id);
    }
    renamed
}

/// HTML files under `dir`, sorted, skipping hidden directories
pub fn collect_html_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_str().unwrap_or("");
            !(e.file_type().is_dir() && e.depth() > 0 && name.starts_with('.'))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| HTML_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Page number embedded in a file name (`page_3.html`, `Page-12.htm`)
pub fn page_number_from_path(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    PAGE_RE.captures(name)?.get(1)?.as_str().parse().ok()
}

/// Page number for an element: a `data-page-number` attribute or a
/// `page-N` class or id on the element or an enclosing container
pub fn element_page_number(doc: &Document, node: NodeId) -> Option<u32> {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .find_map(|n| {
            let from_attr = doc
                .attr(n, "data-page-number")
                .and_then(|v| v.trim().parse().ok());
            from_attr.or_else(|| {
                doc.classes(n)
                    .into_iter()
                    .chain(doc.attr(n, "id"))
                    .find_map(|v| PAGE_RE.captures(v)?.get(1)?.as_str().parse().ok())
            })
        })
}

/// Stamp file path and page number on one issue. A page number in the file
/// name wins over one found on the element.
fn stamp_location(doc: &Document, path: &Path, issue: &mut Issue) {
    let element_page = issue
        .path()
        .and_then(|p| doc.resolve_path(p))
        .and_then(|n| element_page_number(doc, n));
    let location = issue.location.get_or_insert_with(Location::default);
    location.file_path = Some(path.display().to_string());
    location.page_number = page_number_from_path(path).or(element_page);
}

/// Audit one file, stamping file path and page number on every issue
pub fn audit_file(engine: &Engine, path: &Path) -> Result<FileAudit> {
    let html = std::fs::read_to_string(path)?;
    let doc = Document::parse(&html)?;
    let file_page = page_number_from_path(path);

    let mut issues = engine.audit_document(&doc).into_issues();
    for audit in &mut issues {
        stamp_location(&doc, path, &mut audit.issue);
    }

    Ok(FileAudit {
        path: path.to_path_buf(),
        page_number: file_page,
        summary: AuditSummary::from_issues(&issues),
        issues,
    })
}

/// Audit every HTML file under `dir` in parallel
pub fn audit_directory(engine: &Engine, dir: &Path) -> BatchAudit {
    info!("Scanning directory: {}", dir.display());
    let files = collect_html_files(dir);

    let results: Vec<(PathBuf, Result<FileAudit>)> = files
        .par_iter()
        .map(|path| (path.clone(), audit_file(engine, path)))
        .collect();

    let mut batch = BatchAudit::default();
    for (path, result) in results {
        match result {
            Ok(file) => {
                batch.summary.merge(&file.summary);
                batch.files.push(file);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                batch.skipped.push(path);
            }
        }
    }

    let mut next = 0;
    for file in &mut batch.files {
        renumber(file.issues.iter_mut().map(|a| &mut a.issue), &mut next);
    }

    info!(
        "Audited {} files ({} skipped), found {} issues",
        batch.files.len(),
        batch.skipped.len(),
        batch.summary.total_issues
    );
    batch
}

/// Remediated output location for `path`, mirroring its place under `dir`
fn output_path(dir: &Path, out_dir: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(dir) {
        Ok(relative) => out_dir.join(relative),
        Err(_) => out_dir.join(path.file_name().unwrap_or(path.as_os_str())),
    }
}

/// Remediate one file and write the result to `output`
pub fn remediate_file(engine: &Engine, path: &Path, output: &Path) -> Result<FileRemediation> {
    let html = std::fs::read_to_string(path)?;
    let mut doc = Document::parse(&html)?;
    let (_, mut outcome) = engine.remediate_document(&mut doc);
    for issue in &mut outcome.issues {
        stamp_location(&doc, path, &mut issue.issue);
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, doc.to_html())?;
    debug!("Remediated HTML written to {}", output.display());

    let processed = outcome.issues.len();
    let remediated = outcome
        .issues
        .iter()
        .filter(|i| i.remediation_status == RemediationStatus::Remediated)
        .count();
    Ok(FileRemediation {
        path: path.to_path_buf(),
        output_path: output.to_path_buf(),
        counts: FileCounts {
            issues_processed: processed,
            issues_remediated: remediated,
            issues_failed: processed - remediated,
        },
        outcome,
    })
}

/// Remediate every HTML file under `dir` in parallel, writing each result
/// to the same relative path under `out_dir`
pub fn remediate_directory(engine: &Engine, dir: &Path, out_dir: &Path) -> BatchRemediation {
    info!("Remediating directory: {}", dir.display());
    let files = collect_html_files(dir);

    let results: Vec<(PathBuf, Result<FileRemediation>)> = files
        .par_iter()
        .map(|path| {
            let output = output_path(dir, out_dir, path);
            (path.clone(), remediate_file(engine, path, &output))
        })
        .collect();

    let mut batch = BatchRemediation::default();
    let mut next = 0;
    for (path, result) in results {
        match result {
            Ok(mut file) => {
                let renamed = renumber(file.outcome.issues.iter_mut().map(|i| &mut i.issue), &mut next);
                for request in &mut file.outcome.pending_requests {
                    if let Some(id) = renamed.get(&request.issue_id) {
                        request.issue_id = id.clone();
                    }
                }
                batch.files.push(file);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                batch.skipped.push(path);
            }
        }
    }

    let totals = batch.counts().file_totals();
    info!(
        "Remediated {} files ({} skipped): {} of {} issues fixed",
        batch.files.len(),
        batch.skipped.len(),
        totals.issues_remediated,
        totals.issues_processed
    );
    batch
}
