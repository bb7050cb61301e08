// SPDX-License-Identifier: PMPL-1.0-or-later
//! Heading checks - WCAG 1.3.1 Info and Relationships, 2.4.6 Headings and Labels
//!
//! - Heading levels must not be skipped (an h3 needs an earlier h2)
//! - A document needs a main heading (h1)
//! - Headings need real, non-generic text

use crate::checks::{Check, IssueSink};
use crate::document::{Document, NodeId, HEADING_TAGS};
use crate::error::Result;

/// Heading text that says nothing about the section
const GENERIC_HEADINGS: &[&str] = &["heading", "title", "subtitle", "header"];

/// Headings with their numeric level, in document order
fn headings(doc: &Document) -> Vec<(NodeId, usize)> {
    doc.find_all(HEADING_TAGS)
        .into_iter()
        .filter_map(|node| {
            let level = doc.tag(node).strip_prefix('h')?.parse().ok()?;
            Some((node, level))
        })
        .collect()
}

/// Checks heading levels are introduced in order
pub struct HeadingHierarchyCheck;

impl Check for HeadingHierarchyCheck {
    fn name(&self) -> &'static str {
        "heading-hierarchy"
    }

    fn description(&self) -> &str {
        "Checks heading levels are not skipped and an h1 exists (WCAG 1.3.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        let headings = headings(doc);
        let body = doc.find_first("body");

        if headings.is_empty() {
            sink.emit("no-headings", body, "Document has no heading elements");
            return Ok(());
        }

        let has_h1 = headings.iter().any(|(_, level)| *level == 1);
        if !has_h1 {
            sink.emit("no-h1", body, "Document has no main heading (h1)");
        }

        let mut seen = [false; 7];
        let mut skipped = false;
        for (node, level) in &headings {
            let level = *level;
            if level > 1 && !seen[level - 1] {
                skipped = true;
                sink.emit(
                    "skipped-heading-level",
                    Some(*node),
                    format!(
                        "Heading level skipped: h{} appears before any h{}",
                        level,
                        level - 1
                    ),
                );
            }
            seen[level] = true;
        }

        if has_h1 && !skipped {
            sink.emit(
                "compliant-heading-hierarchy",
                Some(headings[0].0),
                "Document has proper heading hierarchy",
            );
        }

        Ok(())
    }
}

/// Checks headings carry descriptive text
pub struct HeadingContentCheck;

impl Check for HeadingContentCheck {
    fn name(&self) -> &'static str {
        "heading-content"
    }

    fn description(&self) -> &str {
        "Checks headings are not empty or generic (WCAG 2.4.6)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        let headings = headings(doc);
        if headings.is_empty() {
            return Ok(());
        }

        let mut has_issues = false;
        for (node, _) in &headings {
            let text = doc.text(*node);
            if text.is_empty() {
                has_issues = true;
                sink.emit("empty-heading", Some(*node), "Heading has no text content");
            } else if GENERIC_HEADINGS.contains(&text.to_lowercase().as_str()) {
                has_issues = true;
                sink.emit(
                    "generic-heading",
                    Some(*node),
                    format!("Heading has generic text: '{}'", text),
                );
            }
        }

        if !has_issues {
            sink.emit(
                "compliant-heading-content",
                Some(headings[0].0),
                "Document has proper heading content",
            );
        }

        Ok(())
    }
}
