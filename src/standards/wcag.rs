// SPDX-License-Identifier: PMPL-1.0-or-later
//! WCAG success criterion table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WcagLevel {
    /// Level A - minimum conformance
    A,
    /// Level AA - standard conformance
    AA,
    /// Level AAA - enhanced conformance
    AAA,
}

impl std::fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WcagLevel::A => write!(f, "A"),
            WcagLevel::AA => write!(f, "AA"),
            WcagLevel::AAA => write!(f, "AAA"),
        }
    }
}

/// One success criterion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criterion {
    pub name: &'static str,
    /// `None` for criteria missing from the table
    pub level: Option<WcagLevel>,
    pub description: &'static str,
}

impl Criterion {
    /// Level as displayed in reports ("Unknown" when not registered)
    pub fn level_label(&self) -> String {
        self.level
            .map(|l| l.to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// `1.4.3 Contrast (Minimum) (Level AA)`
    pub fn reference(&self, id: &str) -> String {
        format!("{} {} (Level {})", id, self.name, self.level_label())
    }
}

const UNKNOWN: Criterion = Criterion {
    name: "Unknown Criterion",
    level: None,
    description: "No description available",
};

const CRITERIA: &[(&str, WcagLevel, &str, &str)] = &[
    ("1.1.1", WcagLevel::A, "Non-text Content",
        "All non-text content that is presented to the user has a text alternative that serves the equivalent purpose."),
    ("1.2.1", WcagLevel::A, "Audio-only and Video-only (Prerecorded)",
        "For prerecorded audio-only and prerecorded video-only media, alternatives are provided."),
    ("1.2.2", WcagLevel::A, "Captions (Prerecorded)",
        "Captions are provided for all prerecorded audio content in synchronized media."),
    ("1.3.1", WcagLevel::A, "Info and Relationships",
        "Information, structure, and relationships conveyed through presentation can be programmatically determined."),
    ("1.3.2", WcagLevel::A, "Meaningful Sequence",
        "When the sequence in which content is presented affects its meaning, a correct reading sequence can be programmatically determined."),
    ("1.4.1", WcagLevel::A, "Use of Color",
        "Color is not used as the only visual means of conveying information."),
    ("1.4.3", WcagLevel::AA, "Contrast (Minimum)",
        "The visual presentation of text and images of text has a contrast ratio of at least 4.5:1."),
    ("2.1.1", WcagLevel::A, "Keyboard",
        "All functionality is operable through a keyboard interface."),
    ("2.4.1", WcagLevel::A, "Bypass Blocks",
        "A mechanism is available to bypass blocks of content that are repeated on multiple Web pages."),
    ("2.4.2", WcagLevel::A, "Page Titled",
        "Web pages have titles that describe topic or purpose."),
    ("2.4.4", WcagLevel::A, "Link Purpose (In Context)",
        "The purpose of each link can be determined from the link text alone or together with its programmatically determined link context."),
    ("2.4.6", WcagLevel::AA, "Headings and Labels",
        "Headings and labels describe topic or purpose."),
    ("2.4.9", WcagLevel::AAA, "Link Purpose (Link Only)",
        "A mechanism is available to allow the purpose of each link to be identified from link text alone."),
    ("3.1.1", WcagLevel::A, "Language of Page",
        "The default human language of each Web page can be programmatically determined."),
    ("3.2.5", WcagLevel::AAA, "Change on Request",
        "Changes of context are initiated only by user request or a mechanism is available to turn off such changes."),
    ("3.3.2", WcagLevel::A, "Labels or Instructions",
        "Labels or instructions are provided when content requires user input."),
    ("4.1.1", WcagLevel::A, "Parsing",
        "In content implemented using markup languages, elements have complete start and end tags."),
    ("4.1.2", WcagLevel::A, "Name, Role, Value",
        "For all user interface components, the name and role can be programmatically determined."),
];

/// Immutable criterion lookup
#[derive(Debug, Clone)]
pub struct WcagCatalog {
    criteria: BTreeMap<&'static str, Criterion>,
}

impl WcagCatalog {
    /// The built-in WCAG 2.1 subset used by the checks
    pub fn builtin() -> Self {
        let criteria = CRITERIA
            .iter()
            .map(|&(id, level, name, description)| {
                (
                    id,
                    Criterion {
                        name,
                        level: Some(level),
                        description,
                    },
                )
            })
            .collect();
        Self { criteria }
    }

    /// Look up a criterion, falling back to "Unknown Criterion"
    pub fn criterion(&self, id: &str) -> &Criterion {
        self.criteria.get(id).unwrap_or(&UNKNOWN)
    }

    /// Whether the id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.criteria.contains_key(id)
    }

    /// Registered criterion ids in order
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.criteria.keys().copied()
    }
}

impl Default for WcagCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
