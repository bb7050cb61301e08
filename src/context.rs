// SPDX-License-Identifier: PMPL-1.0-or-later
//! Context collector: the surrounding evidence for one element, shared by
//! report output and remediation prompts.

use crate::document::{Document, NodeId, HEADING_TAGS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum characters of sibling text kept on either side
const SIBLING_TEXT_LIMIT: usize = 200;

/// Tag and attributes of the enclosing element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentContext {
    pub element_name: String,
    pub attributes: BTreeMap<String, String>,
}

/// Index of an element among all elements with its tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub index: usize,
    pub total: usize,
}

/// Evidence gathered around one element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementContext {
    pub element_name: String,
    pub attributes: BTreeMap<String, String>,
    pub text_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentContext>,
    pub html_snippet: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text_before: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text_after: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure_caption: Option<String>,
    pub position: Position,
}

impl ElementContext {
    /// Free-form map form stored on an issue
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Plain-text rendering used in remediation prompts
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("Element: <{}>", self.element_name)];
        let mut push = |label: &str, value: &str| {
            if !value.is_empty() {
                lines.push(format!("{}: {}", label, value));
            }
        };
        push("Text", &self.text_content);
        push("Text before", &self.text_before);
        push("Text after", &self.text_after);
        push("Nearest heading", self.nearest_heading.as_deref().unwrap_or(""));
        push("Figure caption", self.figure_caption.as_deref().unwrap_or(""));
        if let Some(parent) = &self.parent {
            push("Parent", &format!("<{}>", parent.element_name));
        }
        if self.position.total > 1 {
            push(
                "Position",
                &format!("{} of {}", self.position.index + 1, self.position.total),
            );
        }
        lines.join("\n")
    }
}

/// Collects [`ElementContext`] for nodes of a document
#[derive(Debug, Clone, Copy)]
pub struct ContextCollector {
    char_limit: usize,
}

impl Default for ContextCollector {
    fn default() -> Self {
        Self { char_limit: 500 }
    }
}

impl ContextCollector {
    /// Collector truncating snippets to `char_limit` characters
    pub fn new(char_limit: usize) -> Self {
        Self { char_limit }
    }

    /// Gather context for an element; non-elements yield an empty context
    pub fn collect(&self, doc: &Document, node: NodeId) -> ElementContext {
        let element = match doc.element(node) {
            Some(e) => e,
            None => return ElementContext::default(),
        };

        let parent = doc
            .parent(node)
            .and_then(|p| doc.element(p))
            .map(|p| ParentContext {
                element_name: p.tag.clone(),
                attributes: p.attributes.clone(),
            });

        let (before, after) = doc.sibling_text(node);
        let (index, total) = doc.position_of_type(node);

        let figure_caption = doc
            .closest(node, "figure")
            .and_then(|figure| doc.find_first_in(figure, "figcaption"))
            .map(|caption| doc.text(caption));

        ElementContext {
            element_name: element.tag.clone(),
            attributes: element.attributes.clone(),
            text_content: truncate(&doc.text(node), self.char_limit),
            parent,
            html_snippet: truncate(&doc.outer_html(node), self.char_limit),
            text_before: tail(&before, SIBLING_TEXT_LIMIT.min(self.char_limit)),
            text_after: truncate(&after, SIBLING_TEXT_LIMIT.min(self.char_limit)),
            nearest_heading: doc
                .preceding(node, HEADING_TAGS)
                .map(|h| doc.text(h))
                .filter(|t| !t.is_empty()),
            figure_caption,
            position: Position { index, total },
        }
    }
}

/// First `limit` characters, with an ellipsis when cut
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push_str("...");
    cut
}

/// Last `limit` characters, with a leading ellipsis when cut
fn tail(text: &str, limit: usize) -> String {
    let count = text.chars().count();
    if count <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().skip(count - limit).collect();
    format!("...{}", kept)
}
