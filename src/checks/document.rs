// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document-level checks - WCAG 2.4.2 Page Titled, 3.1.1 Language of Page

use crate::checks::{Check, IssueSink};
use crate::document::Document;
use crate::error::Result;

/// Titles left behind by conversion tools
const GENERIC_TITLES: &[&str] = &["untitled", "document", "page", "new page", "title"];

/// Checks the document has a meaningful `<title>`
pub struct DocumentTitleCheck;

impl Check for DocumentTitleCheck {
    fn name(&self) -> &'static str {
        "document-title"
    }

    fn description(&self) -> &str {
        "Checks the document has a descriptive title (WCAG 2.4.2)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        let title = match doc.find_first("title") {
            Some(t) => t,
            None => {
                sink.emit(
                    "missing-title",
                    doc.find_first("head"),
                    "Document missing title element",
                );
                return Ok(());
            }
        };

        let text = doc.text(title);
        if text.is_empty() {
            sink.emit("empty-title", Some(title), "Document has empty title element");
        } else if GENERIC_TITLES.contains(&text.to_lowercase().as_str()) {
            sink.emit(
                "generic-title",
                Some(title),
                format!("Document has generic title: '{}'", text),
            );
        } else {
            sink.emit("compliant-document-title", Some(title), "Document has proper title");
        }

        Ok(())
    }
}

/// Checks `<html lang>` is present and plausible
pub struct DocumentLanguageCheck;

impl Check for DocumentLanguageCheck {
    fn name(&self) -> &'static str {
        "document-language"
    }

    fn description(&self) -> &str {
        "Checks the html element declares the document language (WCAG 3.1.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        let html = match doc.find_first("html") {
            Some(h) => h,
            None => return Ok(()),
        };

        match doc.attr(html, "lang").map(str::trim) {
            None => sink.emit(
                "missing-document-language",
                Some(html),
                "Document missing language attribute on HTML element",
            ),
            Some(lang) if lang.chars().count() < 2 => sink.emit(
                "invalid-document-language",
                Some(html),
                format!("Document has invalid language code: '{}'", lang),
            ),
            Some(lang) => sink.emit(
                "compliant-document-language",
                Some(html),
                format!("Document has valid language attribute: '{}'", lang),
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{run_check, types};

    #[test]
    fn test_title_variants() {
        let cases = [
            ("<html><head></head><body></body></html>", "missing-title"),
            ("<html><head><title> </title></head></html>", "empty-title"),
            ("<html><head><title>Untitled</title></head></html>", "generic-title"),
            ("<html><head><title>2023 Annual Report</title></head></html>", "compliant-document-title"),
        ];
        for (html, expected) in cases {
            let issues = run_check(&DocumentTitleCheck, html);
            assert_eq!(types(&issues), vec![expected], "{}", html);
        }
    }

    #[test]
    fn test_language_variants() {
        let cases = [
            ("<html><body></body></html>", "missing-document-language"),
            ("<html lang=\" e \"><body></body></html>", "invalid-document-language"),
            ("<html lang=\"en-GB\"><body></body></html>", "compliant-document-language"),
        ];
        for (html, expected) in cases {
            let issues = run_check(&DocumentLanguageCheck, html);
            assert_eq!(types(&issues), vec![expected], "{}", html);
        }
    }

    #[test]
    fn test_missing_language_is_critical() {
        let issues = run_check(&DocumentLanguageCheck, "<html><body></body></html>");
        assert_eq!(issues[0].issue.severity, crate::issue::Severity::Critical);
        assert_eq!(issues[0].issue.wcag_criterion, "3.1.1");
    }
}
