// SPDX-License-Identifier: PMPL-1.0-or-later
//! Prompt templates for issue types fixed with generated content.
//!
//! Placeholders: `{context}`, `{element_html}`, `{current_alt}`, `{link_text}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shape of the fragment a generator must answer with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixType {
    /// A single `name="value"` assignment
    Attribute,
    /// Replacement markup in a fenced block
    Content,
    /// Either an attribute assignment or fenced markup
    Mixed,
}

impl std::fmt::Display for FixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixType::Attribute => write!(f, "attribute"),
            FixType::Content => write!(f, "content"),
            FixType::Mixed => write!(f, "mixed"),
        }
    }
}

/// A prompt with its expected response shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub prompt: &'static str,
    pub fix_type: FixType,
    pub attribute_name: Option<&'static str>,
}

const fn attribute(name: &'static str, prompt: &'static str) -> Template {
    Template {
        prompt,
        fix_type: FixType::Attribute,
        attribute_name: Some(name),
    }
}

const fn content(prompt: &'static str) -> Template {
    Template {
        prompt,
        fix_type: FixType::Content,
        attribute_name: None,
    }
}

const ALT_TEXT_PROMPT: &str = "\
This image has no usable alternative text. Write alt text that describes the \
content and purpose of the image in one concise sentence, without phrases \
such as \"image of\" or \"picture of\".

Current image: {element_html}

Context:
{context}

Answer with only the attribute:
```
alt=\"your alternative text\"
```";

const GENERIC_ALT_PROMPT: &str = "\
This image has generic alternative text (\"{current_alt}\") that does not \
describe it. Write alt text that describes the content and purpose of the \
image in one concise sentence, without phrases such as \"image of\".

Current image: {element_html}

Context:
{context}

Answer with only the attribute:
```
alt=\"your alternative text\"
```";

const FIGURE_CAPTION_PROMPT: &str = "\
This figure has no caption. Write a short figcaption that explains what the \
figure shows and why it matters in the surrounding text.

Current figure: {element_html}

Context:
{context}

Answer with the caption markup:
```html
<figcaption>Caption text</figcaption>
```";

const HEADING_LEVEL_PROMPT: &str = "\
This heading skips a level in the document outline. Rewrite it at the level \
that continues the outline from the previous heading, keeping its text.

Current heading: {element_html}

Context:
{context}

Answer with the corrected heading markup:
```html
<hN>Heading text</hN>
```";

const HEADING_TEXT_PROMPT: &str = "\
This heading is empty or generic. Write heading text that names the topic of \
the section it introduces.

Current heading: {element_html}

Context:
{context}

Answer with the heading markup:
```html
<hN>Heading text</hN>
```";

const LANGUAGE_PROMPT: &str = "\
The document does not declare a valid language. Identify the primary \
language of the content and answer with its BCP 47 code.

Content excerpt:
{context}

Answer with only the attribute:
```
lang=\"en\"
```";

const TITLE_PROMPT: &str = "\
The document title is missing, empty or generic. Write a concise title that \
identifies the document.

Current title: {element_html}

Content excerpt:
{context}

Answer with the title markup:
```html
<title>Document title</title>
```";

const TABLE_HEADERS_PROMPT: &str = "\
This data table has no header cells. Rewrite the table so that header cells \
use <th> with a scope attribute, keeping all data unchanged.

Current table: {element_html}

Context:
{context}

Answer with the corrected table:
```html
<table>...</table>
```";

const TABLE_SCOPE_PROMPT: &str = "\
This table header cell has no scope. Decide whether it labels a column or a \
row.

Current header: {element_html}

Context:
{context}

Answer with only the attribute:
```
scope=\"col\"
```
or
```
scope=\"row\"
```";

const TABLE_CAPTION_PROMPT: &str = "\
This complex table has no caption. Write a caption that summarises what the \
table contains.

Current table: {element_html}

Context:
{context}

Answer with the caption markup:
```html
<caption>Caption text</caption>
```";

const FORM_LABEL_PROMPT: &str = "\
This form control has no accessible label. Either write a <label> element \
pointing at the control's id, or an aria-label for the control.

Current control: {element_html}

Context:
{context}

Answer with a label:
```html
<label for=\"control-id\">Label text</label>
```
or with only the attribute:
```
aria-label=\"Label text\"
```";

const EMPTY_LINK_PROMPT: &str = "\
This link has no text. Write link text that describes its destination and \
makes sense out of context.

Current link: {element_html}

Context:
{context}

Answer with the link markup:
```html
<a href=\"...\">Link text</a>
```";

const LINK_TEXT_PROMPT: &str = "\
The link text \"{link_text}\" does not describe where the link goes. Write \
link text that describes its destination and makes sense out of context.

Current link: {element_html}

Context:
{context}

Answer with the link markup:
```html
<a href=\"...\">Link text</a>
```";

const DUPLICATE_LINK_PROMPT: &str = "\
Several links share the text \"{link_text}\" but lead to different \
destinations. Write text for this link that tells it apart from the others.

Current link: {element_html}

Context:
{context}

Answer with the link markup:
```html
<a href=\"...\">Link text</a>
```";

const NEW_WINDOW_PROMPT: &str = "\
The link \"{link_text}\" opens a new window without telling the user. Write \
link markup that keeps the text and adds a warning such as \
\"(opens in new window)\".

Current link: {element_html}

Context:
{context}

Answer with the link markup:
```html
<a href=\"...\" target=\"_blank\">Link text (opens in new window)</a>
```";

const TEMPLATES: &[(&str, Template)] = &[
    ("missing-alt-text", attribute("alt", ALT_TEXT_PROMPT)),
    ("empty-alt-text", attribute("alt", ALT_TEXT_PROMPT)),
    ("generic-alt-text", attribute("alt", GENERIC_ALT_PROMPT)),
    ("missing-figure-caption", content(FIGURE_CAPTION_PROMPT)),
    ("empty-figure-caption", content(FIGURE_CAPTION_PROMPT)),
    ("skipped-heading-level", content(HEADING_LEVEL_PROMPT)),
    ("empty-heading", content(HEADING_TEXT_PROMPT)),
    ("generic-heading", content(HEADING_TEXT_PROMPT)),
    ("missing-document-language", attribute("lang", LANGUAGE_PROMPT)),
    ("invalid-document-language", attribute("lang", LANGUAGE_PROMPT)),
    ("missing-title", content(TITLE_PROMPT)),
    ("empty-title", content(TITLE_PROMPT)),
    ("generic-title", content(TITLE_PROMPT)),
    ("table-missing-headers", content(TABLE_HEADERS_PROMPT)),
    ("table-missing-scope", attribute("scope", TABLE_SCOPE_PROMPT)),
    ("table-missing-caption", content(TABLE_CAPTION_PROMPT)),
    (
        "form-control-missing-label",
        Template {
            prompt: FORM_LABEL_PROMPT,
            fix_type: FixType::Mixed,
            attribute_name: Some("aria-label"),
        },
    ),
    ("empty-link-text", content(EMPTY_LINK_PROMPT)),
    ("generic-link-text", content(LINK_TEXT_PROMPT)),
    ("url-as-link-text", content(LINK_TEXT_PROMPT)),
    ("duplicate-link-text-different-url", content(DUPLICATE_LINK_PROMPT)),
    ("new-window-link-no-warning", content(NEW_WINDOW_PROMPT)),
];

/// Values substituted into a prompt
#[derive(Debug, Clone, Default)]
pub struct PromptValues {
    pub context: Option<String>,
    pub element_html: Option<String>,
    pub current_alt: Option<String>,
    pub link_text: Option<String>,
}

impl Template {
    /// Substitute the placeholders; absent values become "Not available" or ""
    pub fn render(&self, values: &PromptValues) -> String {
        let or_unavailable = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("Not available")
                .to_string()
        };
        self.prompt
            .replace("{context}", &or_unavailable(&values.context))
            .replace("{element_html}", &or_unavailable(&values.element_html))
            .replace("{current_alt}", values.current_alt.as_deref().unwrap_or(""))
            .replace("{link_text}", values.link_text.as_deref().unwrap_or(""))
    }
}

/// Immutable registry of prompt templates keyed by issue type
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<&'static str, Template>,
}

impl TemplateRegistry {
    /// Registry with the built-in templates
    pub fn builtin() -> Self {
        Self {
            templates: TEMPLATES
                .iter()
                .map(|(issue_type, template)| (*issue_type, template.clone()))
                .collect(),
        }
    }

    pub fn get(&self, issue_type: &str) -> Option<&Template> {
        self.templates.get(issue_type)
    }

    pub fn contains(&self, issue_type: &str) -> bool {
        self.templates.contains_key(issue_type)
    }

    pub fn issue_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.templates.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standards::Taxonomy;

    #[test]
    fn test_every_template_targets_a_defect() {
        let taxonomy = Taxonomy::builtin();
        let registry = TemplateRegistry::builtin();
        for issue_type in registry.issue_types() {
            let entry = taxonomy.get(issue_type);
            assert!(entry.is_some(), "{} is not in the taxonomy", issue_type);
            assert!(!entry.unwrap().compliant, "{} is compliant", issue_type);
        }
    }

    #[test]
    fn test_attribute_templates_name_their_attribute() {
        let registry = TemplateRegistry::builtin();
        for issue_type in registry.issue_types() {
            let template = registry.get(issue_type).unwrap();
            if template.fix_type == FixType::Attribute {
                let name = template.attribute_name.unwrap();
                assert!(template.prompt.contains(&format!("{}=", name)), "{}", issue_type);
            }
        }
    }

    #[test]
    fn test_render_defaults() {
        let registry = TemplateRegistry::builtin();
        let prompt = registry.get("generic-alt-text").unwrap().render(&PromptValues::default());
        assert!(prompt.contains("generic alternative text (\"\")"));
        assert!(prompt.contains("Current image: Not available"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_render_values() {
        let registry = TemplateRegistry::builtin();
        let values = PromptValues {
            context: Some("Nearest heading: Sales".to_string()),
            link_text: Some("click here".to_string()),
            ..PromptValues::default()
        };
        let prompt = registry.get("generic-link-text").unwrap().render(&values);
        assert!(prompt.contains("The link text \"click here\""));
        assert!(prompt.contains("Nearest heading: Sales"));
    }

    #[test]
    fn test_no_template_for_structural_issues() {
        let registry = TemplateRegistry::builtin();
        assert!(!registry.contains("table-missing-tbody"));
        assert!(!registry.contains("insufficient-color-contrast"));
    }
}
