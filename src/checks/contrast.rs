// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast check - WCAG 1.4.3 Contrast (Minimum)
//!
//! Only inline styles are considered. Text defaults to black; the background
//! is the nearest inline background on the element or its ancestors below
//! `<html>`, defaulting to white.

use crate::checks::{Check, IssueSink};
use crate::color::{self, Rgb};
use crate::document::{Document, NodeId};
use crate::error::Result;

/// Elements that usually carry text
const TEXT_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "a", "span", "div", "li", "td", "th",
];

/// Resolved color, or `Err(())` when a declaration exists but cannot be parsed
pub(crate) type Resolved = std::result::Result<Rgb, ()>;

fn style(doc: &Document, node: NodeId) -> &str {
    doc.attr(node, "style").unwrap_or("")
}

pub(crate) fn text_color(doc: &Document, node: NodeId) -> Resolved {
    match color::inline_color(style(doc, node)) {
        Some(value) => color::parse_color(value).ok_or(()),
        None => Ok(color::BLACK),
    }
}

pub(crate) fn background_color(doc: &Document, node: NodeId) -> Resolved {
    let chain = std::iter::once(node).chain(doc.ancestors(node).take_while(|a| doc.tag(*a) != "html"));
    for current in chain {
        if let Some(value) = color::inline_background(style(doc, current)) {
            return color::parse_background(value).ok_or(());
        }
    }
    Ok(color::WHITE)
}

/// Checks inline text/background color pairs meet the minimum ratio
pub struct ColorContrastCheck;

impl Check for ColorContrastCheck {
    fn name(&self) -> &'static str {
        "color-contrast"
    }

    fn description(&self) -> &str {
        "Checks text has sufficient contrast with its background (WCAG 1.4.3)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for node in doc.find_all(TEXT_ELEMENTS) {
            if doc.text(node).is_empty() {
                continue;
            }

            let (fg, bg) = match (text_color(doc, node), background_color(doc, node)) {
                (Ok(fg), Ok(bg)) => (fg, bg),
                _ => {
                    if doc.has_attr(node, "style") || doc.has_attr(node, "class") {
                        sink.emit(
                            "potential-color-contrast-issue",
                            Some(node),
                            "Potential color contrast issue - colors could not be determined automatically",
                        );
                    }
                    continue;
                }
            };

            let ratio = color::contrast_ratio(fg, bg);
            let large = color::is_large_text(doc.tag(node), style(doc, node));
            let required = color::required_ratio(large);
            if ratio < required {
                sink.draft(
                    "insufficient-color-contrast",
                    Some(node),
                    format!(
                        "Insufficient color contrast: {:.2}:1 (minimum required: {:.1}:1)",
                        ratio, required
                    ),
                )
                .detail("text_color", color::to_hex(fg))
                .detail("background_color", color::to_hex(bg))
                .detail("contrast_ratio", format!("{:.2}:1", ratio))
                .detail("required_ratio", format!("{:.1}:1", required))
                .detail("is_large_text", large)
                .emit();
            }
        }
        Ok(())
    }
}
