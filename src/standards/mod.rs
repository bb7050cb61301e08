// SPDX-License-Identifier: PMPL-1.0-or-later
//! Static standards registries: the issue taxonomy and the WCAG criterion
//! table. Both are built once and shared read-only.

pub mod taxonomy;
pub mod wcag;

pub use taxonomy::{RemediationType, Taxonomy, TaxonomyEntry};
pub use wcag::{Criterion, WcagCatalog, WcagLevel};

use std::sync::Arc;

/// Shared handles to the read-only registries
#[derive(Debug, Clone, Default)]
pub struct Standards {
    pub taxonomy: Arc<Taxonomy>,
    pub wcag: Arc<WcagCatalog>,
}

impl Standards {
    /// Build the built-in registries
    pub fn builtin() -> Self {
        Self {
            taxonomy: Arc::new(Taxonomy::builtin()),
            wcag: Arc::new(WcagCatalog::builtin()),
        }
    }

    /// `1.1.1 Non-text Content (Level A)` for an issue type's criterion
    pub fn reference_for(&self, issue_type: &str) -> String {
        let criterion = self.taxonomy.classify(issue_type).wcag_criterion;
        self.wcag.criterion(criterion).reference(criterion)
    }
}
