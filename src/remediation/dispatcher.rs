// SPDX-License-Identifier: PMPL-1.0-or-later
//! Remediation dispatcher - picks the fix strategy for one issue.
//!
//! Contrast issues are fixed in place. Issue types with a template become a
//! [`GenerationRequest`]; the generator's answer comes back through
//! [`Dispatcher::accept`]. Everything else is left for manual work.

use crate::context::{truncate, ContextCollector};
use crate::document::{Document, NodeId};
use crate::error::{EngineError, Result};
use crate::issue::{Issue, RemediationDetails, RemediationIssue};
use crate::remediation::contrast::fix_contrast;
use crate::remediation::generator::{GenerationError, GenerationRequest};
use crate::remediation::templates::{FixType, PromptValues, Template, TemplateRegistry};
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

/// The only issue type fixed without generated content
pub const CONTRAST_ISSUE: &str = "insufficient-color-contrast";

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("valid regex")
});

/// What the dispatcher decided for one issue
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Fixed in the document
    Applied(RemediationDetails),
    /// Needs generated content
    Request(GenerationRequest),
}

/// Fragment extracted from a generator response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedFix {
    Attribute { name: String, value: String },
    Content(String),
}

impl GeneratedFix {
    fn describe(&self) -> String {
        match self {
            GeneratedFix::Attribute { name, .. } => format!("Set {} attribute from generated content", name),
            GeneratedFix::Content(_) => "Replaced element with generated content".to_string(),
        }
    }

    fn after_content(&self) -> String {
        match self {
            GeneratedFix::Attribute { name, value } => format!("{}=\"{}\"", name, value),
            GeneratedFix::Content(content) => content.clone(),
        }
    }
}

/// Dispatches issues to fix strategies
#[derive(Debug, Clone)]
pub struct Dispatcher {
    templates: Arc<TemplateRegistry>,
    collector: ContextCollector,
    char_limit: usize,
}

impl Dispatcher {
    pub fn new(templates: Arc<TemplateRegistry>, char_limit: usize) -> Self {
        Self {
            templates,
            collector: ContextCollector::new(char_limit),
            char_limit,
        }
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Decide (and for contrast, perform) the fix for one issue
    pub fn dispatch(&self, doc: &mut Document, issue: &Issue) -> Result<Dispatch> {
        let node = issue.path().and_then(|p| doc.resolve_path(p));

        if issue.issue_type == CONTRAST_ISSUE {
            let node = node.ok_or_else(|| EngineError::ElementNotFound(issue.location_string()))?;
            debug!(issue_id = %issue.id, "Applying in-engine contrast fix");
            return fix_contrast(doc, node, &issue.message).map(Dispatch::Applied);
        }

        let template = self
            .templates
            .get(&issue.issue_type)
            .ok_or_else(|| EngineError::NoTemplate(issue.issue_type.clone()))?;
        debug!(issue_id = %issue.id, issue_type = %issue.issue_type, "Packaging generation request");
        Ok(Dispatch::Request(self.build_request(doc, issue, node, template)))
    }

    fn build_request(
        &self,
        doc: &Document,
        issue: &Issue,
        node: Option<NodeId>,
        template: &Template,
    ) -> GenerationRequest {
        let detail = |key: &str| {
            issue
                .context
                .as_ref()
                .and_then(|c| c.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let element_html = node.map(|n| truncate(&doc.outer_html(n), self.char_limit));
        let values = PromptValues {
            context: node.map(|n| self.collector.collect(doc, n).describe()),
            element_html: element_html.clone(),
            current_alt: detail("current_alt")
                .or_else(|| node.and_then(|n| doc.attr(n, "alt")).map(str::to_string)),
            link_text: detail("link_text").or_else(|| node.map(|n| doc.text(n))),
        };

        GenerationRequest {
            issue_id: issue.id.clone(),
            issue_type: issue.issue_type.clone(),
            prompt: template.render(&values),
            fix_type: template.fix_type,
            attribute_name: template.attribute_name.map(str::to_string),
            element_html,
        }
    }

    /// Record a generator's answer on the issue.
    ///
    /// Generator errors and responses without the expected fragment mark the
    /// issue failed; only an invalid status transition is an error.
    pub fn accept(
        &self,
        issue: &mut RemediationIssue,
        request: &GenerationRequest,
        response: std::result::Result<String, GenerationError>,
    ) -> Result<()> {
        let parsed = response.and_then(|text| {
            parse_response(request.fix_type, request.attribute_name.as_deref(), &text).ok_or_else(|| {
                GenerationError::Malformed(format!("no {} fragment in response", request.fix_type))
            })
        });

        match parsed {
            Ok(fix) => {
                let details = RemediationDetails {
                    description: Some(issue.issue.message.clone()),
                    fix_description: Some(fix.describe()),
                    before_content: request.element_html.clone(),
                    after_content: Some(fix.after_content()),
                    failure_reason: None,
                };
                debug!(issue_id = %issue.issue.id, "Generated content accepted");
                issue.mark_remediated(details)
            }
            Err(e) => {
                warn!(issue_id = %issue.issue.id, issue_type = %issue.issue.issue_type, error = %e, "Remediation failed");
                issue.mark_failed(&e.to_string())
            }
        }
    }
}

/// Extract the fragment a template asked for
pub fn parse_response(fix_type: FixType, attribute_name: Option<&str>, text: &str) -> Option<GeneratedFix> {
    match fix_type {
        FixType::Attribute => attribute_name.and_then(|name| parse_attribute(text, name)),
        FixType::Content => parse_fenced(text).map(GeneratedFix::Content),
        FixType::Mixed => attribute_name
            .and_then(|name| parse_attribute(text, name))
            .or_else(|| {
                parse_fenced(text)
                    .filter(|markup| markup.contains('<'))
                    .map(GeneratedFix::Content)
            }),
    }
}

fn parse_attribute(text: &str, name: &str) -> Option<GeneratedFix> {
    let pattern = format!(
        r#"(?i)(?:^|[\s`])({})\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(text)?;
    let value = caps.get(2).or_else(|| caps.get(3))?.as_str().trim();
    if value.is_empty() {
        return None;
    }
    Some(GeneratedFix::Attribute {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_fenced(text: &str) -> Option<String> {
    FENCE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|content| !content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{RemediationStatus, Severity};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(TemplateRegistry::builtin()), 500)
    }

    fn issue_at(doc: &Document, issue_type: &str, node: NodeId) -> Issue {
        let mut issue = Issue::new(issue_type, Severity::Major, "test issue")
            .with_location(crate::issue::Location {
                path: Some(doc.path(node)),
                ..Default::default()
            });
        issue.id = "issue-1".to_string();
        issue
    }

    #[test]
    fn test_contrast_is_applied_in_place() {
        let mut doc =
            Document::parse(r#"<html><body><p style="color: #aaaaaa">Faint</p></body></html>"#).unwrap();
        let p = doc.find_first("p").unwrap();
        let issue = issue_at(&doc, CONTRAST_ISSUE, p);

        match dispatcher().dispatch(&mut doc, &issue).unwrap() {
            Dispatch::Applied(details) => {
                assert_eq!(details.after_content.as_deref(), Some("color: #000000"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(doc.attr(p, "style"), Some("color: #000000"));
    }

    #[test]
    fn test_contrast_without_element_is_an_error() {
        let mut doc = Document::parse("<html><body></body></html>").unwrap();
        let issue = Issue::new(CONTRAST_ISSUE, Severity::Major, "lost");
        assert!(dispatcher().dispatch(&mut doc, &issue).is_err());
    }

    #[test]
    fn test_template_builds_request() {
        let mut doc = Document::parse(
            r#"<html><body><h2>Team</h2><a href="/t">click here</a></body></html>"#,
        )
        .unwrap();
        let link = doc.find_first("a").unwrap();
        let issue = issue_at(&doc, "generic-link-text", link);

        let request = match dispatcher().dispatch(&mut doc, &issue).unwrap() {
            Dispatch::Request(r) => r,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(request.issue_id, "issue-1");
        assert_eq!(request.fix_type, FixType::Content);
        assert!(request.prompt.contains("The link text \"click here\""));
        assert!(request.prompt.contains("Nearest heading: Team"));
        assert_eq!(request.element_html.as_deref(), Some(r#"<a href="/t">click here</a>"#));
    }

    #[test]
    fn test_templateless_issue_is_an_error() {
        let mut doc = Document::parse("<html><body><table></table></body></html>").unwrap();
        let table = doc.find_first("table").unwrap();
        let issue = issue_at(&doc, "table-missing-tbody", table);
        let err = dispatcher().dispatch(&mut doc, &issue).unwrap_err();
        assert!(matches!(err, EngineError::NoTemplate(ref t) if t == "table-missing-tbody"));
        assert_eq!(err.to_string(), "no remediation template for table-missing-tbody");
    }

    #[test]
    fn test_parse_attribute_responses() {
        let fenced = "```\nalt=\"Bar chart of revenue by quarter\"\n```";
        assert_eq!(
            parse_response(FixType::Attribute, Some("alt"), fenced),
            Some(GeneratedFix::Attribute {
                name: "alt".to_string(),
                value: "Bar chart of revenue by quarter".to_string()
            })
        );
        assert_eq!(
            parse_response(FixType::Attribute, Some("lang"), "The language is lang='fr'."),
            Some(GeneratedFix::Attribute {
                name: "lang".to_string(),
                value: "fr".to_string()
            })
        );
        assert_eq!(parse_response(FixType::Attribute, Some("alt"), "data-alt=\"x\""), None);
        assert_eq!(parse_response(FixType::Attribute, Some("alt"), "alt=\"\""), None);
    }

    #[test]
    fn test_parse_content_and_mixed_responses() {
        let html = "Here you go:\n```html\n<figcaption>Revenue by quarter</figcaption>\n```\nDone.";
        assert_eq!(
            parse_response(FixType::Content, None, html),
            Some(GeneratedFix::Content("<figcaption>Revenue by quarter</figcaption>".to_string()))
        );
        assert_eq!(parse_response(FixType::Content, None, "no fence here"), None);

        let label = "```html\n<label for=\"email\">Email</label>\n```";
        assert!(matches!(
            parse_response(FixType::Mixed, Some("aria-label"), label),
            Some(GeneratedFix::Content(_))
        ));
        let aria = "```\naria-label=\"Email address\"\n```";
        assert!(matches!(
            parse_response(FixType::Mixed, Some("aria-label"), aria),
            Some(GeneratedFix::Attribute { .. })
        ));
        assert_eq!(parse_response(FixType::Mixed, Some("aria-label"), "```\nEmail\n```"), None);
    }

    #[test]
    fn test_accept_records_outcomes() {
        let d = dispatcher();
        let request = GenerationRequest {
            issue_id: "issue-1".to_string(),
            issue_type: "missing-alt-text".to_string(),
            prompt: String::new(),
            fix_type: FixType::Attribute,
            attribute_name: Some("alt".to_string()),
            element_html: Some("<img src=\"a.png\">".to_string()),
        };
        let base = Issue::new("missing-alt-text", Severity::Critical, "Image missing alt text");

        let mut ok = RemediationIssue::pending(base.clone());
        d.accept(&mut ok, &request, Ok("alt=\"Company logo\"".to_string())).unwrap();
        assert_eq!(ok.remediation_status, RemediationStatus::Remediated);
        assert_eq!(ok.remediation_details.after_content.as_deref(), Some("alt=\"Company logo\""));
        assert_eq!(ok.remediation_details.before_content.as_deref(), Some("<img src=\"a.png\">"));

        let mut refused = RemediationIssue::pending(base.clone());
        d.accept(&mut refused, &request, Err(GenerationError::Refused("policy".to_string())))
            .unwrap();
        assert_eq!(refused.remediation_status, RemediationStatus::Failed);
        assert_eq!(
            refused.remediation_details.failure_reason.as_deref(),
            Some("generation refused: policy")
        );

        let mut malformed = RemediationIssue::pending(base);
        d.accept(&mut malformed, &request, Ok("I think it shows a logo".to_string())).unwrap();
        assert_eq!(malformed.remediation_status, RemediationStatus::Failed);
        assert!(malformed
            .remediation_details
            .failure_reason
            .unwrap()
            .contains("no attribute fragment"));

        // settled issues cannot be re-accepted
        assert!(d.accept(&mut ok, &request, Ok("alt=\"x\"".to_string())).is_err());
    }
}
