// SPDX-License-Identifier: PMPL-1.0-or-later
//! Landmark checks - WCAG 1.3.1 Info and Relationships, 2.4.1 Bypass Blocks

use crate::checks::{Check, IssueSink};
use crate::document::{Document, NodeId};
use crate::error::Result;

/// Only the first few links can serve as a skip link
const SKIP_LINK_WINDOW: usize = 5;

/// Words that mark a skip link
const SKIP_LINK_WORDS: &[&str] = &["skip", "jump", "content", "main"];

/// First element that is either the landmark tag or carries the role
fn find_landmark(doc: &Document, tag: &str, role: &str) -> Option<NodeId> {
    doc.find_first(tag)
        .or_else(|| doc.find_first_where(|e| e.attr("role") == Some(role)))
}

/// Checks for a `<main>` element or `role="main"`
pub struct MainLandmarkCheck;

impl Check for MainLandmarkCheck {
    fn name(&self) -> &'static str {
        "main-landmark"
    }

    fn description(&self) -> &str {
        "Checks the document has a main landmark (WCAG 1.3.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        match find_landmark(doc, "main", "main") {
            Some(main) => sink.emit(
                "compliant-main-landmark",
                Some(main),
                "Document has proper main landmark",
            ),
            None => sink.emit(
                "missing-main-landmark",
                doc.find_first("body"),
                "Document missing main landmark (main element or role='main')",
            ),
        }
        Ok(())
    }
}

/// Checks one of the first links skips to the content
pub struct SkipLinkCheck;

impl Check for SkipLinkCheck {
    fn name(&self) -> &'static str {
        "skip-link"
    }

    fn description(&self) -> &str {
        "Checks for a skip navigation link near the top (WCAG 2.4.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        let skip_link = doc
            .find_all(&["a"])
            .into_iter()
            .take(SKIP_LINK_WINDOW)
            .find(|link| {
                let href = doc.attr(*link, "href").unwrap_or("");
                let text = doc.text(*link).to_lowercase();
                href.starts_with('#') && SKIP_LINK_WORDS.iter().any(|w| text.contains(w))
            });

        match skip_link {
            Some(link) => sink.emit(
                "compliant-skip-link",
                Some(link),
                "Document has proper skip navigation link",
            ),
            None => sink.emit(
                "missing-skip-link",
                doc.find_first("body"),
                "Document missing skip navigation link",
            ),
        }
        Ok(())
    }
}

/// Checks navigation, banner and contentinfo landmarks
pub struct LandmarksCheck;

/// (tag, role, issue suffix, label)
const LANDMARKS: &[(&str, &str, &str, &str)] = &[
    ("nav", "navigation", "navigation-landmark", "navigation landmark (nav element or role='navigation')"),
    ("header", "banner", "header-landmark", "header landmark (header element or role='banner')"),
    ("footer", "contentinfo", "footer-landmark", "footer landmark (footer element or role='contentinfo')"),
];

impl Check for LandmarksCheck {
    fn name(&self) -> &'static str {
        "landmarks"
    }

    fn description(&self) -> &str {
        "Checks for navigation, header and footer landmarks (WCAG 1.3.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for (tag, role, suffix, label) in LANDMARKS {
            match find_landmark(doc, tag, role) {
                Some(node) => sink.emit(
                    &format!("compliant-{}", suffix),
                    Some(node),
                    format!("Document has {}", label),
                ),
                None => sink.emit(
                    &format!("missing-{}", suffix),
                    doc.find_first("body"),
                    format!("Document missing {}", label),
                ),
            }
        }
        Ok(())
    }
}
