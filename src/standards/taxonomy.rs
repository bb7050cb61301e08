// SPDX-License-Identifier: PMPL-1.0-or-later
//! Issue taxonomy: every issue type the checks can emit, with its WCAG
//! criterion, default severity, remediation strategy and compliance flag.

use crate::issue::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default strategy for fixing an issue type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationType {
    Attribute,
    Content,
    Structure,
    Style,
    Element,
    Mixed,
    /// No automated strategy
    Manual,
}

/// Static description of one issue type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyEntry {
    pub wcag_criterion: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub remediation_type: RemediationType,
    pub element_types: &'static [&'static str],
    /// Entry records a satisfied rule rather than a defect
    pub compliant: bool,
}

const fn defect(
    wcag_criterion: &'static str,
    severity: Severity,
    remediation_type: RemediationType,
    element_types: &'static [&'static str],
    description: &'static str,
) -> TaxonomyEntry {
    TaxonomyEntry {
        wcag_criterion,
        severity,
        description,
        remediation_type,
        element_types,
        compliant: false,
    }
}

const fn satisfied(
    wcag_criterion: &'static str,
    severity: Severity,
    element_types: &'static [&'static str],
    description: &'static str,
) -> TaxonomyEntry {
    TaxonomyEntry {
        wcag_criterion,
        severity,
        description,
        remediation_type: RemediationType::Manual,
        element_types,
        compliant: true,
    }
}

const UNKNOWN: TaxonomyEntry = TaxonomyEntry {
    wcag_criterion: "Unknown",
    severity: Severity::Unknown,
    description: "Unknown issue type",
    remediation_type: RemediationType::Manual,
    element_types: &[],
    compliant: false,
};

use RemediationType::*;
use Severity::{Critical, Info, Major, Minor};

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const CONTROLS: &[&str] = &["input", "select", "textarea"];

const ISSUE_TYPES: &[(&str, TaxonomyEntry)] = &[
    // Headings
    ("no-headings", defect("1.3.1", Major, Structure, &["body"], "Document has no heading elements")),
    ("no-h1", defect("1.3.1", Major, Structure, &["h1"], "Document has no main heading (h1)")),
    ("skipped-heading-level", defect("1.3.1", Major, Structure, HEADINGS, "Heading level skipped")),
    ("compliant-heading-hierarchy", satisfied("1.3.1", Major, HEADINGS, "Document has proper heading hierarchy")),
    ("empty-heading", defect("2.4.6", Major, Content, HEADINGS, "Heading has no text content")),
    ("generic-heading", defect("2.4.6", Minor, Content, HEADINGS, "Heading has generic text")),
    ("compliant-heading-content", satisfied("2.4.6", Major, HEADINGS, "Document has proper heading content")),
    // Document
    ("missing-title", defect("2.4.2", Major, Element, &["title"], "Document missing title element")),
    ("empty-title", defect("2.4.2", Major, Content, &["title"], "Document has empty title element")),
    ("generic-title", defect("2.4.2", Minor, Content, &["title"], "Document has generic title")),
    ("compliant-document-title", satisfied("2.4.2", Major, &["title"], "Document has proper title")),
    ("missing-document-language", defect("3.1.1", Critical, Attribute, &["html"], "Document language not specified")),
    ("invalid-document-language", defect("3.1.1", Major, Attribute, &["html"], "Document has invalid language code")),
    ("compliant-document-language", satisfied("3.1.1", Critical, &["html"], "Document has valid language attribute")),
    // Landmarks
    ("missing-main-landmark", defect("1.3.1", Major, Structure, &["main"], "No main landmark identified")),
    ("compliant-main-landmark", satisfied("1.3.1", Major, &["main"], "Document has proper main landmark")),
    ("missing-skip-link", defect("2.4.1", Major, Element, &["a"], "No skip navigation link found")),
    ("compliant-skip-link", satisfied("2.4.1", Major, &["a"], "Document has skip navigation link")),
    ("missing-navigation-landmark", defect("1.3.1", Minor, Structure, &["nav"], "Document missing navigation landmark")),
    ("compliant-navigation-landmark", satisfied("1.3.1", Minor, &["nav"], "Document has navigation landmark")),
    ("missing-header-landmark", defect("1.3.1", Minor, Structure, &["header"], "Document missing header landmark")),
    ("compliant-header-landmark", satisfied("1.3.1", Minor, &["header"], "Document has header landmark")),
    ("missing-footer-landmark", defect("1.3.1", Minor, Structure, &["footer"], "Document missing footer landmark")),
    ("compliant-footer-landmark", satisfied("1.3.1", Minor, &["footer"], "Document has footer landmark")),
    // Images and figures
    ("missing-alt-text", defect("1.1.1", Critical, Attribute, &["img"], "Image missing alternative text")),
    ("empty-alt-text", defect("1.1.1", Major, Attribute, &["img"], "Image has empty alt text but is not marked decorative")),
    ("generic-alt-text", defect("1.1.1", Major, Attribute, &["img"], "Image has generic or uninformative alternative text")),
    ("compliant-decorative-image", satisfied("1.1.1", Minor, &["img"], "Decorative image properly marked")),
    ("compliant-alt-text", satisfied("1.1.1", Critical, &["img"], "Image has proper alt text")),
    ("missing-figure-caption", defect("1.1.1", Major, Content, &["figure"], "Figure missing caption")),
    ("empty-figure-caption", defect("1.1.1", Major, Content, &["figure", "figcaption"], "Figure has empty caption")),
    ("compliant-figure-structure", satisfied("1.1.1", Major, &["figure"], "Figure has proper structure and caption")),
    // Links
    ("empty-link-text", defect("2.4.4", Critical, Content, &["a"], "Link has no text content")),
    ("generic-link-text", defect("2.4.4", Major, Content, &["a"], "Link text is generic")),
    ("url-as-link-text", defect("2.4.4", Minor, Content, &["a"], "URL used as link text")),
    ("compliant-link-text", satisfied("2.4.4", Info, &["a"], "Link has descriptive text")),
    ("compliant-image-link", satisfied("2.4.4", Info, &["a", "img"], "Image link has alternative text")),
    ("duplicate-link-text-different-url", defect("2.4.9", Major, Content, &["a"], "Links with the same text go to different destinations")),
    ("new-window-link-no-warning", defect("3.2.5", Minor, Attribute, &["a"], "Link opens in new window without warning")),
    ("compliant-new-window-link", satisfied("3.2.5", Info, &["a"], "Link opening in new window carries a warning")),
    // Tables
    ("table-missing-headers", defect("1.3.1", Major, Structure, &["table"], "Data table has no header cells")),
    ("table-missing-scope", defect("1.3.1", Minor, Attribute, &["th"], "Table header missing scope attribute")),
    ("table-missing-caption", defect("1.3.1", Minor, Element, &["table"], "Complex table missing caption")),
    ("table-missing-thead", defect("1.3.1", Minor, Structure, &["table"], "Table with headers should use thead")),
    ("table-missing-tbody", defect("1.3.1", Minor, Structure, &["table"], "Table should use tbody")),
    ("table-missing-headers-id", defect("1.3.1", Major, Attribute, &["table", "td", "th"], "Complex table missing headers/id associations")),
    ("table-irregular-headers", defect("1.3.1", Major, Structure, &["table"], "Table has irregular header structure")),
    // Forms
    ("form-control-missing-name", defect("1.3.1", Major, Attribute, CONTROLS, "Form control missing name attribute")),
    ("form-control-missing-label", defect("1.3.1", Critical, Mixed, CONTROLS, "Form control missing label")),
    ("form-label-empty", defect("3.3.2", Major, Content, &["label"], "Label element has no text content")),
    ("form-required-field-missing-aria", defect("3.3.2", Minor, Attribute, CONTROLS, "Required field missing aria-required")),
    ("form-required-field-not-indicated", defect("3.3.2", Major, Content, CONTROLS, "Required field not visually indicated")),
    ("form-fieldset-missing-legend", defect("1.3.1", Major, Element, &["fieldset"], "Fieldset missing legend")),
    ("form-related-controls-no-fieldset", defect("1.3.1", Major, Structure, &["input"], "Related controls not grouped in a fieldset")),
    // Color
    ("insufficient-color-contrast", defect("1.4.3", Major, Style, &["*"], "Text has insufficient color contrast")),
    ("potential-color-contrast-issue", defect("1.4.3", Minor, Style, &["*"], "Color contrast could not be determined")),
];

/// Immutable issue-type registry with reverse indices
#[derive(Debug, Clone)]
pub struct Taxonomy {
    entries: BTreeMap<&'static str, TaxonomyEntry>,
    by_criterion: BTreeMap<&'static str, Vec<&'static str>>,
    by_severity: BTreeMap<Severity, Vec<&'static str>>,
    by_element: BTreeMap<&'static str, Vec<&'static str>>,
}

impl Taxonomy {
    /// Build the registry from the built-in table
    pub fn builtin() -> Self {
        let mut taxonomy = Self {
            entries: BTreeMap::new(),
            by_criterion: BTreeMap::new(),
            by_severity: BTreeMap::new(),
            by_element: BTreeMap::new(),
        };
        for (issue_type, entry) in ISSUE_TYPES {
            let issue_type: &'static str = *issue_type;
            taxonomy
                .by_criterion
                .entry(entry.wcag_criterion)
                .or_default()
                .push(issue_type);
            taxonomy
                .by_severity
                .entry(entry.severity)
                .or_default()
                .push(issue_type);
            for element in entry.element_types.iter().copied() {
                taxonomy.by_element.entry(element).or_default().push(issue_type);
            }
            taxonomy.entries.insert(issue_type, entry.clone());
        }
        taxonomy
    }

    /// Entry for an issue type; unregistered types get the "Unknown" entry
    pub fn classify(&self, issue_type: &str) -> &TaxonomyEntry {
        self.entries.get(issue_type).unwrap_or(&UNKNOWN)
    }

    /// Entry for a registered issue type
    pub fn get(&self, issue_type: &str) -> Option<&TaxonomyEntry> {
        self.entries.get(issue_type)
    }

    /// Whether the issue type is registered
    pub fn contains(&self, issue_type: &str) -> bool {
        self.entries.contains_key(issue_type)
    }

    /// Whether the issue type records a satisfied rule
    pub fn is_compliant_type(&self, issue_type: &str) -> bool {
        self.classify(issue_type).compliant
    }

    /// Issue types mapped to a WCAG criterion
    pub fn by_criterion(&self, criterion: &str) -> &[&'static str] {
        self.by_criterion.get(criterion).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Issue types with a default severity
    pub fn by_severity(&self, severity: Severity) -> &[&'static str] {
        self.by_severity.get(&severity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Issue types applicable to an element tag
    pub fn by_element(&self, element: &str) -> &[&'static str] {
        self.by_element.get(element).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All registered issue types
    pub fn issue_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of registered issue types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}
