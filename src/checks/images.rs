// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image checks - WCAG 1.1.1 Non-text Content (Level A)
//!
//! Checks that all `<img>` elements have appropriate alt attributes:
//! - Every `<img>` must have an `alt` attribute (not missing)
//! - Alt text must be descriptive (not generic like "image", "photo")
//! - Empty alt is only acceptable when the image is marked decorative
//!
//! Figures must carry a non-empty `<figcaption>`.

use crate::checks::{Check, IssueSink};
use crate::document::Document;
use crate::error::Result;

/// Generic alt text values that indicate unhelpful descriptions
const GENERIC_ALT_VALUES: &[&str] = &["image", "diagram", "photo", "picture", "graphic", "icon"];

/// Checks `<img>` alternative text
pub struct AltTextCheck;

impl Check for AltTextCheck {
    fn name(&self) -> &'static str {
        "alt-text"
    }

    fn description(&self) -> &str {
        "Checks <img> elements for proper alt text (WCAG 1.1.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for img in doc.find_all(&["img"]) {
            let alt = match doc.attr(img, "alt") {
                Some(alt) => alt.trim(),
                None => {
                    sink.emit("missing-alt-text", Some(img), "Image missing alt text");
                    continue;
                }
            };

            if alt.is_empty() {
                let decorative = doc.attr(img, "role") == Some("presentation")
                    || doc.attr(img, "aria-hidden") == Some("true");
                if decorative {
                    sink.emit(
                        "compliant-decorative-image",
                        Some(img),
                        "Decorative image properly marked",
                    );
                } else {
                    sink.emit(
                        "empty-alt-text",
                        Some(img),
                        "Image has empty alt text but is not marked as decorative",
                    );
                }
            } else if GENERIC_ALT_VALUES.contains(&alt.to_lowercase().as_str()) {
                sink.draft(
                    "generic-alt-text",
                    Some(img),
                    format!("Image has generic alt text: '{}'", alt),
                )
                .detail("current_alt", alt)
                .emit();
            } else {
                sink.emit("compliant-alt-text", Some(img), "Image has proper alt text");
            }
        }
        Ok(())
    }
}

/// Checks `<figure>` elements carry a caption
pub struct FigureStructureCheck;

impl Check for FigureStructureCheck {
    fn name(&self) -> &'static str {
        "figure-structure"
    }

    fn description(&self) -> &str {
        "Checks <figure> elements have a non-empty figcaption (WCAG 1.1.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for figure in doc.find_all(&["figure"]) {
            match doc.find_first_in(figure, "figcaption") {
                None => sink.emit("missing-figure-caption", Some(figure), "Figure missing caption"),
                Some(caption) if doc.text(caption).is_empty() => {
                    sink.emit("empty-figure-caption", Some(figure), "Figure has empty caption")
                }
                Some(_) => sink.emit(
                    "compliant-figure-structure",
                    Some(figure),
                    "Figure has proper structure and caption",
                ),
            }
        }
        Ok(())
    }
}
