// SPDX-License-Identifier: PMPL-1.0-or-later
//! Remediabot - accessibility audit and remediation for PDF-derived HTML
//!
//! Remediabot audits HTML produced by PDF conversion against a fixed
//! catalogue of WCAG rules, ranks what it finds by severity, and drives
//! remediation: contrast problems are fixed in place, everything else is
//! packaged as a prompt for an external text generator.
//!
//! ## Checks
//!
//! - **Headings** (1.3.1/2.4.6): hierarchy and content
//! - **Document** (2.4.2/3.1.1): title and language
//! - **Landmarks** (1.3.1/2.4.1): main, navigation, banner, contentinfo, skip link
//! - **Images** (1.1.1): alt text and figure captions
//! - **Links** (2.4.4/3.2.5): link text, duplicates, new-window warnings
//! - **Tables** (1.3.1): headers, scope, captions, structure
//! - **Forms** (1.3.1/3.3.2): labels, required fields, fieldsets
//! - **Contrast** (1.4.3): WCAG contrast ratio

pub mod batch;
pub mod checks;
pub mod color;
pub mod config;
pub mod context;
pub mod document;
pub mod engine;
pub mod error;
pub mod issue;
pub mod remediation;
pub mod report;
pub mod standards;
pub mod summary;

pub use engine::{Engine, RemediatedDocument};
pub use error::{EngineError, Result};
