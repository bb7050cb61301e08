// SPDX-License-Identifier: PMPL-1.0-or-later
//! Form checks - WCAG 1.3.1 Info and Relationships, 3.3.2 Labels or Instructions

use crate::checks::{Check, IssueSink};
use crate::document::{Document, NodeId};
use crate::error::Result;
use crate::issue::Severity;
use std::collections::BTreeMap;

/// Input types that carry no user-entered value
const SKIPPED_INPUT_TYPES: &[&str] = &["hidden", "submit", "reset", "button"];

/// How far up two checkboxes may look for a shared container
const CHECKBOX_PARENT_LEVELS: usize = 3;

fn input_type(doc: &Document, control: NodeId) -> String {
    doc.attr(control, "type").unwrap_or("").trim().to_lowercase()
}

/// Inputs, selects and textareas that need a label, in document order
fn labelled_controls(doc: &Document) -> Vec<NodeId> {
    doc.find_all(&["input", "select", "textarea"])
        .into_iter()
        .filter(|c| {
            doc.tag(*c) != "input" || !SKIPPED_INPUT_TYPES.contains(&input_type(doc, *c).as_str())
        })
        .collect()
}

/// `<label for=...>` pointing at the control
fn label_for(doc: &Document, control: NodeId) -> Option<NodeId> {
    let id = doc.attr(control, "id")?;
    doc.find_first_where(|e| e.tag == "label" && e.attr("for") == Some(id))
}

/// Whether the control has an accessible name. A placeholder alone does not count.
fn has_associated_label(doc: &Document, control: NodeId) -> bool {
    if label_for(doc, control).is_some() || doc.closest(control, "label").is_some() {
        return true;
    }

    let labelled_by = doc.attr(control, "aria-labelledby").unwrap_or("");
    let referenced_text = labelled_by
        .split_whitespace()
        .filter_map(|id| doc.find_by_id(id))
        .any(|label| !doc.text(label).is_empty());
    if referenced_text {
        return true;
    }

    doc.non_empty_attr(control, "aria-label").is_some()
        || doc.non_empty_attr(control, "title").is_some()
}

fn control_label(doc: &Document, control: NodeId) -> String {
    match doc.tag(control) {
        "input" => {
            let kind = input_type(doc, control);
            format!("Form control ({})", if kind.is_empty() { "text" } else { &kind })
        }
        "select" => "Select control".to_string(),
        _ => "Textarea control".to_string(),
    }
}

/// Checks form controls are named and labelled
pub struct FormLabelCheck;

impl Check for FormLabelCheck {
    fn name(&self) -> &'static str {
        "form-label"
    }

    fn description(&self) -> &str {
        "Checks form controls have names and associated labels (WCAG 1.3.1, 3.3.2)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for control in labelled_controls(doc) {
            let label = control_label(doc, control);
            if !doc.has_attr(control, "name") {
                sink.emit(
                    "form-control-missing-name",
                    Some(control),
                    format!("{} missing name attribute", label),
                );
            }
            if !has_associated_label(doc, control) {
                sink.emit(
                    "form-control-missing-label",
                    Some(control),
                    format!("{} has no associated label", label),
                );
            }
        }

        for label in doc.find_all(&["label"]) {
            if doc.text(label).is_empty() {
                sink.emit("form-label-empty", Some(label), "Label element has no text content");
            }
        }
        Ok(())
    }
}

/// Checks required fields are marked for every user
pub struct FormRequiredFieldCheck;

impl FormRequiredFieldCheck {
    fn is_required(doc: &Document, control: NodeId) -> bool {
        doc.has_attr(control, "required") || doc.attr(control, "aria-required") == Some("true")
    }

    fn is_visually_indicated(doc: &Document, control: NodeId) -> bool {
        let indicates = |label: NodeId| {
            let text = doc.text(label);
            text.contains('*') || text.to_lowercase().contains("required")
        };
        label_for(doc, control).map(indicates).unwrap_or(false)
            || doc.closest(control, "label").map(indicates).unwrap_or(false)
    }
}

impl Check for FormRequiredFieldCheck {
    fn name(&self) -> &'static str {
        "form-required-field"
    }

    fn description(&self) -> &str {
        "Checks required fields carry aria-required and a visible marker (WCAG 3.3.2)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for control in labelled_controls(doc) {
            if !Self::is_required(doc, control) {
                continue;
            }
            if !doc.has_attr(control, "aria-required") {
                sink.emit(
                    "form-required-field-missing-aria",
                    Some(control),
                    "Required form field missing aria-required='true' attribute",
                );
            }
            if !Self::is_visually_indicated(doc, control) {
                sink.emit(
                    "form-required-field-not-indicated",
                    Some(control),
                    "Required form field not visually indicated as required",
                );
            }
        }
        Ok(())
    }
}

/// Checks fieldsets have legends and related controls are grouped
pub struct FormFieldsetCheck;

impl FormFieldsetCheck {
    fn in_fieldset(doc: &Document, controls: &[NodeId]) -> bool {
        controls.iter().any(|c| doc.closest(*c, "fieldset").is_some())
    }

    fn inputs_of_type(doc: &Document, form: NodeId, kind: &str) -> Vec<NodeId> {
        doc.find_all_in(form, &["input"])
            .into_iter()
            .filter(|i| input_type(doc, *i) == kind)
            .collect()
    }

    fn check_radio_groups(doc: &Document, form: NodeId, sink: &mut IssueSink<'_>) {
        let mut groups: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();
        for radio in Self::inputs_of_type(doc, form, "radio") {
            if let Some(name) = doc.attr(radio, "name") {
                let group = groups.entry(name).or_default();
                if group.is_empty() {
                    order.push(name);
                }
                group.push(radio);
            }
        }

        for name in order {
            let radios = &groups[name];
            if radios.len() > 1 && !Self::in_fieldset(doc, radios) {
                sink.emit(
                    "form-related-controls-no-fieldset",
                    Some(radios[0]),
                    format!(
                        "Group of {} radio buttons should be wrapped in fieldset with legend",
                        radios.len()
                    ),
                );
            }
        }
    }

    fn share_close_parent(doc: &Document, a: NodeId, b: NodeId) -> bool {
        let near_a: Vec<NodeId> = doc.ancestors(a).take(CHECKBOX_PARENT_LEVELS).collect();
        doc.ancestors(b)
            .take(CHECKBOX_PARENT_LEVELS)
            .any(|p| near_a.contains(&p))
    }

    fn check_checkbox_groups(doc: &Document, form: NodeId, sink: &mut IssueSink<'_>) {
        let checkboxes = Self::inputs_of_type(doc, form, "checkbox");
        if checkboxes.len() <= 2 {
            return;
        }

        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        let mut current: Vec<NodeId> = Vec::new();
        for checkbox in checkboxes {
            match current.last() {
                Some(prev) if !Self::share_close_parent(doc, checkbox, *prev) => {
                    if current.len() > 1 {
                        groups.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                }
                _ => {}
            }
            current.push(checkbox);
        }
        if current.len() > 1 {
            groups.push(current);
        }

        for group in groups {
            if !Self::in_fieldset(doc, &group) {
                sink.draft(
                    "form-related-controls-no-fieldset",
                    Some(group[0]),
                    format!(
                        "Group of {} checkboxes should be wrapped in fieldset with legend",
                        group.len()
                    ),
                )
                .severity(Severity::Minor)
                .emit();
            }
        }
    }
}

impl Check for FormFieldsetCheck {
    fn name(&self) -> &'static str {
        "form-fieldset"
    }

    fn description(&self) -> &str {
        "Checks fieldsets have legends and related controls are grouped (WCAG 1.3.1)"
    }

    fn run(&self, doc: &Document, sink: &mut IssueSink<'_>) -> Result<()> {
        for fieldset in doc.find_all(&["fieldset"]) {
            let has_legend = doc
                .find_first_in(fieldset, "legend")
                .map(|l| !doc.text(l).is_empty())
                .unwrap_or(false);
            if !has_legend {
                sink.emit(
                    "form-fieldset-missing-legend",
                    Some(fieldset),
                    "Fieldset missing legend element or legend has no content",
                );
            }
        }

        for form in doc.find_all(&["form"]) {
            Self::check_radio_groups(doc, form, sink);
            Self::check_checkbox_groups(doc, form, sink);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{run_check, types};

    #[test]
    fn test_label_association_methods() {
        let html = r#"<html><body><form>
            <label for="email">Email</label><input id="email" name="email">
            <label>Phone <input name="phone"></label>
            <span id="city-label">City</span><input name="city" aria-labelledby="city-label">
            <input name="zip" aria-label="Postcode">
            <input name="country" title="Country">
            <input type="submit">
            <input type="hidden" name="token">
        </form></body></html>"#;
        assert!(run_check(&FormLabelCheck, html).is_empty());
    }

    #[test]
    fn test_placeholder_is_not_a_label() {
        let html = r#"<html><body><input name="q" placeholder="Search"></body></html>"#;
        let issues = run_check(&FormLabelCheck, html);
        assert_eq!(types(&issues), vec!["form-control-missing-label"]);
        assert_eq!(issues[0].issue.severity, Severity::Critical);
    }

    #[test]
    fn test_unnamed_controls_and_empty_labels() {
        let html = r#"<html><body>
            <label for="notes"> </label><textarea id="notes"></textarea>
            <select aria-label="Size"><option>S</option></select>
        </body></html>"#;
        let issues = run_check(&FormLabelCheck, html);
        assert_eq!(
            types(&issues),
            vec!["form-control-missing-name", "form-control-missing-name", "form-label-empty"]
        );
        assert_eq!(issues[0].issue.message, "Textarea control missing name attribute");
    }

    #[test]
    fn test_dangling_labelledby_is_not_a_label() {
        let html = r#"<html><body><input name="a" aria-labelledby="nowhere"></body></html>"#;
        assert_eq!(types(&run_check(&FormLabelCheck, html)), vec!["form-control-missing-label"]);
    }

    #[test]
    fn test_required_fields() {
        let html = r#"<html><body>
            <label for="a">Name *</label><input id="a" name="a" required aria-required="true">
            <label for="b">Email</label><input id="b" name="b" required>
            <label>Phone (required) <input name="c" aria-required="true"></label>
            <input name="d">
        </body></html>"#;
        let issues = run_check(&FormRequiredFieldCheck, html);
        assert_eq!(
            types(&issues),
            vec!["form-required-field-missing-aria", "form-required-field-not-indicated"]
        );
        assert_eq!(issues[0].issue.severity, Severity::Minor);
    }

    #[test]
    fn test_fieldset_legend() {
        let html = r#"<html><body>
            <fieldset><legend>Contact</legend><input name="a"></fieldset>
            <fieldset><legend> </legend><input name="b"></fieldset>
            <fieldset><input name="c"></fieldset>
        </body></html>"#;
        let issues = run_check(&FormFieldsetCheck, html);
        assert_eq!(
            types(&issues),
            vec!["form-fieldset-missing-legend", "form-fieldset-missing-legend"]
        );
    }

    #[test]
    fn test_radio_groups_need_fieldset() {
        let html = r#"<html><body><form>
            <input type="radio" name="size" value="s"><input type="radio" name="size" value="m">
            <fieldset><legend>Colour</legend>
              <input type="radio" name="colour" value="r"><input type="radio" name="colour" value="g">
            </fieldset>
            <input type="radio" name="single" value="x">
        </form></body></html>"#;
        let issues = run_check(&FormFieldsetCheck, html);
        assert_eq!(types(&issues), vec!["form-related-controls-no-fieldset"]);
        assert_eq!(issues[0].issue.severity, Severity::Major);
        assert!(issues[0].issue.message.contains("2 radio buttons"));
    }

    #[test]
    fn test_checkbox_groups_are_minor() {
        let html = r#"<html><body><form><div>
            <label><input type="checkbox" name="a"> A</label>
            <label><input type="checkbox" name="b"> B</label>
            <label><input type="checkbox" name="c"> C</label>
        </div></form></body></html>"#;
        let issues = run_check(&FormFieldsetCheck, html);
        assert_eq!(types(&issues), vec!["form-related-controls-no-fieldset"]);
        assert_eq!(issues[0].issue.severity, Severity::Minor);
        assert!(issues[0].issue.message.contains("3 checkboxes"));
    }

    #[test]
    fn test_two_checkboxes_are_not_a_group() {
        let html = r#"<html><body><form>
            <input type="checkbox" name="a"><input type="checkbox" name="b">
        </form></body></html>"#;
        assert!(run_check(&FormFieldsetCheck, html).is_empty());
    }
}
