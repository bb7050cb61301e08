// SPDX-License-Identifier: PMPL-1.0-or-later
//! Link checks - WCAG 2.4.4 Link Purpose, 2.4.9 Link Purpose (Link Only),
//! 3.2.5 Change on Request

use crate::checks::{Check, IssueSink};
use crate::document::{Document, NodeId};
use crate::error::Result;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// Link text that does not describe the destination
const GENERIC_LINK_TEXTS: &[&str] = &[
    "click here",
    "click",
    "here",
    "read more",
    "more",
    "learn more",
    "details",
    "link",
    "this link",
    "this page",
    "this",
    "go",
    "go to",
    "view",
    "view more",
    "see more",
    "see details",
    "continue",
    "continue reading",
];

/// Phrases announcing that a link opens a new window
const WARNING_PHRASES: &[&str] = &["new window", "new tab", "opens in new", "external"];

/// Classes of visually hidden, screen-reader-only text
const SCREEN_READER_CLASSES: &[&str] = &["sr-only", "visually-hidden", "screen-reader-text"];

/// Classes of "opens externally" icons
const EXTERNAL_ICON_CLASSES: &[&str] = &["external", "new-window", "fa-external-link"];

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://|^www\.|\.(?:com|org|net|edu|gov|io)(?:/|$)").expect("valid regex")
});

fn is_url(text: &str) -> bool {
    URL_RE.is_match(text)
}

fn has_warning_phrase(text: &str) -> bool {
    let lower = text.to_lowercase();
    WARNING_PHRASES.iter().any(|p| lower.contains(p))
}

/// Checks link text is descriptive and unambiguous
pub struct LinkTextCheck;

impl Check for LinkTextCheck {
    fn name(&self) -> &'static str {
        "link-text"
    }

    fn description(&self) -> &str {
        "Checks links have descriptive, unambiguous text (WCAG 2.4.4, 2.4.9)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        let mut targets_by_text: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut texted_links: Vec<(NodeId, String, String)> = Vec::new();

        for link in doc.find_all(&["a"]) {
            let href = doc.attr(link, "href").unwrap_or("").trim();
            if href.starts_with('#') && href.trim_matches('#').is_empty() {
                continue;
            }

            let text = doc.text(link);
            if text.is_empty() {
                let image_alt = doc
                    .find_first_in(link, "img")
                    .and_then(|img| doc.non_empty_attr(img, "alt"));
                match image_alt {
                    Some(alt) => sink.emit(
                        "compliant-image-link",
                        Some(link),
                        format!("Link with image has appropriate alt text: \"{}\"", alt),
                    ),
                    None => sink.emit("empty-link-text", Some(link), "Link has no text content"),
                }
                continue;
            }

            let lower = text.to_lowercase();
            if GENERIC_LINK_TEXTS.contains(&lower.as_str()) {
                sink.draft(
                    "generic-link-text",
                    Some(link),
                    format!("Generic link text: '{}' is not descriptive", text),
                )
                .detail("link_text", text.as_str())
                .emit();
            } else if is_url(&text) {
                sink.draft(
                    "url-as-link-text",
                    Some(link),
                    format!("URL used as link text: '{}'", text),
                )
                .detail("link_text", text.as_str())
                .emit();
            } else {
                sink.emit(
                    "compliant-link-text",
                    Some(link),
                    format!("Link has descriptive text: '{}'", text),
                );
            }

            if !href.is_empty() {
                targets_by_text
                    .entry(lower.clone())
                    .or_default()
                    .insert(href.to_string());
            }
            texted_links.push((link, lower, text));
        }

        for (link, lower, text) in &texted_links {
            let targets = targets_by_text.get(lower).map(BTreeSet::len).unwrap_or(0);
            if targets > 1 {
                sink.draft(
                    "duplicate-link-text-different-url",
                    Some(*link),
                    format!("Multiple links with text '{}' go to different destinations", text),
                )
                .detail("link_text", text.as_str())
                .emit();
            }
        }

        Ok(())
    }
}

/// Checks links opening a new window say so
pub struct NewWindowLinkCheck;

impl NewWindowLinkCheck {
    fn opens_new_window(doc: &Document, link: NodeId) -> bool {
        let blank = doc
            .attr(link, "target")
            .map(|t| t.trim().eq_ignore_ascii_case("_blank"))
            .unwrap_or(false);
        let external = doc
            .attr(link, "rel")
            .map(|r| r.split_whitespace().any(|t| t.eq_ignore_ascii_case("external")))
            .unwrap_or(false);
        blank || external
    }

    /// How the link warns users, if it does
    fn warning_method(doc: &Document, link: NodeId) -> Option<&'static str> {
        if has_warning_phrase(&doc.text(link)) {
            return Some("text content");
        }
        if doc.attr(link, "aria-label").map(has_warning_phrase).unwrap_or(false) {
            return Some("aria-label");
        }
        if doc.attr(link, "title").map(has_warning_phrase).unwrap_or(false) {
            return Some("title attribute");
        }

        let descendants: Vec<NodeId> = doc.descendants(link).filter(|d| doc.is_element(*d)).collect();
        let screen_reader_warning = descendants.iter().any(|d| {
            doc.class_contains_any(*d, SCREEN_READER_CLASSES) && has_warning_phrase(&doc.text(*d))
        });
        if screen_reader_warning {
            return Some("screen reader text");
        }

        let icon = descendants
            .iter()
            .copied()
            .chain(doc.sibling_after(link))
            .any(|n| doc.class_contains_any(n, EXTERNAL_ICON_CLASSES));
        if icon {
            return Some("icon");
        }

        None
    }
}

impl Check for NewWindowLinkCheck {
    fn name(&self) -> &'static str {
        "new-window-link"
    }

    fn description(&self) -> &str {
        "Checks links opening new windows warn the user (WCAG 3.2.5)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for link in doc.find_all(&["a"]) {
            if !Self::opens_new_window(doc, link) {
                continue;
            }
            let text = doc.text(link);
            match Self::warning_method(doc, link) {
                Some(method) => sink.emit(
                    "compliant-new-window-link",
                    Some(link),
                    format!(
                        "Link opens in new window with appropriate warning via {}: '{}'",
                        method, text
                    ),
                ),
                None => sink
                    .draft(
                        "new-window-link-no-warning",
                        Some(link),
                        format!("Link opens in new window without warning: '{}'", text),
                    )
                    .detail("link_text", text.as_str())
                    .emit(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{run_check, types};

    #[test]
    fn test_duplicate_text_different_targets() {
        let html = r#"<html><body>
            <a href="/a">details</a>
            <a href="/b">details</a>
        </body></html>"#;
        let issues = run_check(&LinkTextCheck, html);
        let duplicates: Vec<_> = issues
            .iter()
            .filter(|i| i.issue.issue_type == "duplicate-link-text-different-url")
            .collect();
        assert_eq!(duplicates.len(), 2);
    }

    #[test]
    fn test_duplicate_text_same_target() {
        let html = r#"<html><body>
            <a href="/a">details</a>
            <a href="/a">Details</a>
        </body></html>"#;
        let issues = run_check(&LinkTextCheck, html);
        assert!(!types(&issues).contains(&"duplicate-link-text-different-url"));
    }

    #[test]
    fn test_link_text_classification() {
        let html = r##"<html><body>
            <a href="#">top</a>
            <a href="/x"></a>
            <a href="/logo"><img src="logo.png" alt="ACME home"></a>
            <a href="/more">Read more</a>
            <a href="https://example.com">https://example.com</a>
            <a href="/report">Annual report 2023</a>
        </body></html>"##;
        let issues = run_check(&LinkTextCheck, html);
        assert_eq!(
            types(&issues),
            vec![
                "empty-link-text",
                "compliant-image-link",
                "generic-link-text",
                "url-as-link-text",
                "compliant-link-text"
            ]
        );
        assert_eq!(issues[2].issue.context.as_ref().unwrap()["link_text"], "Read more");
    }

    #[test]
    fn test_url_patterns() {
        assert!(is_url("www.example.org"));
        assert!(is_url("example.gov/data"));
        assert!(!is_url("The .comma story"));
    }

    #[test]
    fn test_new_window_warnings() {
        let html = r#"<html><body>
            <a href="/a" target="_blank">Report</a>
            <a href="/b" target="_blank">Report (opens in new tab)</a>
            <a href="/c" target="_blank" aria-label="Report, opens in new window">Report</a>
            <a href="/d" rel="external">Report<span class="sr-only"> (external site)</span></a>
            <a href="/e" target="_blank">Report <i class="fa fa-external-link"></i></a>
            <a href="/f">Same window</a>
        </body></html>"#;
        let issues = run_check(&NewWindowLinkCheck, html);
        assert_eq!(
            types(&issues),
            vec![
                "new-window-link-no-warning",
                "compliant-new-window-link",
                "compliant-new-window-link",
                "compliant-new-window-link",
                "compliant-new-window-link"
            ]
        );
    }
}
