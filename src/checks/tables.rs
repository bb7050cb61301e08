// SPDX-License-Identifier: PMPL-1.0-or-later
//! Table checks - WCAG 1.3.1 Info and Relationships
//!
//! Layout tables (presentational role, layout classes, or too small to hold
//! data) are skipped. Data tables need header cells with scope; complex
//! tables additionally need a caption and headers/id associations.

use crate::checks::{span_value, Check, IssueSink};
use crate::document::{Document, NodeId};
use crate::error::Result;

/// Class fragments marking a table used for layout
const LAYOUT_CLASSES: &[&str] = &["layout", "grid", "non-data"];

/// Tables with more rows than this benefit from a caption
const LARGE_TABLE_ROWS: usize = 10;

/// Rows of `table` itself, skipping rows of nested tables
fn rows(doc: &Document, table: NodeId) -> Vec<NodeId> {
    doc.find_all_in(table, &["tr"])
        .into_iter()
        .filter(|row| doc.closest(*row, "table") == Some(table))
        .collect()
}

/// Cells of one row, in order
fn cells(doc: &Document, row: NodeId) -> Vec<NodeId> {
    doc.element_children(row)
        .filter(|c| matches!(doc.tag(*c), "td" | "th"))
        .collect()
}

fn is_layout_table(doc: &Document, table: NodeId) -> bool {
    if doc.attr(table, "role") == Some("presentation") {
        return true;
    }
    let classes = doc.classes(table).join(" ").to_lowercase();
    if LAYOUT_CLASSES.iter().any(|c| classes.contains(c)) {
        return true;
    }

    let has_th = doc.find_first_in(table, "th").is_some();
    let has_caption = doc.find_first_in(table, "caption").is_some();
    if !has_th && !has_caption {
        let rows = rows(doc, table);
        if rows.len() <= 1 {
            return true;
        }
        if cells(doc, rows[0]).len() <= 1 {
            return true;
        }
    }
    false
}

fn is_complex_table(doc: &Document, table: NodeId) -> bool {
    let merged = doc.find_all_in(table, &["td", "th"]).into_iter().any(|cell| {
        span_value(doc.attr(cell, "rowspan")) > 1 || span_value(doc.attr(cell, "colspan")) > 1
    });
    if merged {
        return true;
    }

    let rows = rows(doc, table);
    let header_rows = rows
        .iter()
        .filter(|row| doc.find_first_in(**row, "th").is_some())
        .count();
    header_rows > 1 || rows.len() > LARGE_TABLE_ROWS
}

/// Checks data tables have header cells, scopes and captions
pub struct TableHeaderCheck;

impl Check for TableHeaderCheck {
    fn name(&self) -> &'static str {
        "table-header"
    }

    fn description(&self) -> &str {
        "Checks data tables have scoped header cells and complex tables a caption (WCAG 1.3.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for table in doc.find_all(&["table"]) {
            if is_layout_table(doc, table) {
                continue;
            }

            let headers = doc.find_all_in(table, &["th"]);
            if headers.is_empty() {
                sink.emit(
                    "table-missing-headers",
                    Some(table),
                    "Data table has no header cells (th elements)",
                );
            } else {
                for header in headers.into_iter().filter(|h| !doc.has_attr(*h, "scope")) {
                    sink.emit(
                        "table-missing-scope",
                        Some(header),
                        "Table header missing scope attribute",
                    );
                }
            }

            if is_complex_table(doc, table) && doc.find_first_in(table, "caption").is_none() {
                sink.emit(
                    "table-missing-caption",
                    Some(table),
                    "Complex table missing caption element",
                );
            }
        }
        Ok(())
    }
}

/// Checks table sectioning and header regularity
pub struct TableStructureCheck;

impl TableStructureCheck {
    fn check_irregular_headers(doc: &Document, table: NodeId, rows: &[NodeId], sink: &mut IssueSink<'_>) {
        if rows.len() < 2 {
            return;
        }

        let first_row = cells(doc, rows[0]);
        let first_row_headers = first_row.iter().filter(|c| doc.tag(**c) == "th").count();
        if first_row_headers > 0 && first_row_headers < first_row.len() {
            sink.emit(
                "table-irregular-headers",
                Some(table),
                "Table has irregular header structure in the first row",
            );
        }

        // Row headers are judged on the body rows only
        let body_rows: Vec<Vec<NodeId>> = rows[1..]
            .iter()
            .map(|r| cells(doc, *r))
            .filter(|c| !c.is_empty())
            .collect();
        let row_headers = body_rows
            .iter()
            .filter(|c| doc.tag(c[0]) == "th")
            .count();
        if row_headers > 0 && row_headers < body_rows.len() {
            sink.emit(
                "table-irregular-headers",
                Some(table),
                "Table has irregular header structure in the first column",
            );
        }
    }
}

impl Check for TableStructureCheck {
    fn name(&self) -> &'static str {
        "table-structure"
    }

    fn description(&self) -> &str {
        "Checks tables use thead/tbody, headers/id associations and regular headers (WCAG 1.3.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for table in doc.find_all(&["table"]) {
            if is_layout_table(doc, table) {
                continue;
            }
            let rows = rows(doc, table);

            let header_first_row = rows
                .first()
                .map(|r| doc.find_first_in(*r, "th").is_some())
                .unwrap_or(false);
            if header_first_row && doc.find_first_in(table, "thead").is_none() {
                sink.emit(
                    "table-missing-thead",
                    Some(table),
                    "Table with headers should use thead element",
                );
            }

            if !doc.declares_tbody(table) && rows.len() > 1 {
                sink.emit("table-missing-tbody", Some(table), "Table should use tbody element");
            }

            if is_complex_table(doc, table) {
                let associated = doc
                    .find_all_in(table, &["td"])
                    .into_iter()
                    .any(|td| doc.has_attr(td, "headers"))
                    || doc
                        .find_all_in(table, &["th"])
                        .into_iter()
                        .any(|th| doc.has_attr(th, "id"));
                if !associated {
                    sink.emit(
                        "table-missing-headers-id",
                        Some(table),
                        "Complex table should use headers/id attributes for cell associations",
                    );
                }
            }

            Self::check_irregular_headers(doc, table, &rows, sink);
        }
        Ok(())
    }
}
