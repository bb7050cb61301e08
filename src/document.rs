// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document accessor over a parsed HTML tree.
//!
//! HTML is parsed with `scraper` and imported into an arena of nodes, each
//! exposing `{tag, attributes, children, parent}`. Node ids are assigned in
//! document (pre-)order, so iterating the arena visits elements in the order
//! they appear in the source.
//!
//! Every query is read-only and tolerant: asking for an attribute, text or
//! relative of a node that is not an element yields `None`/`""`/empty rather
//! than failing. The only mutation is [`Document::set_style_property`], used
//! by the in-engine contrast fix.

use crate::error::{EngineError, Result};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TABLE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)(table|tbody)\b").expect("valid regex"));

/// Handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of the node
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Tag name and attributes of an element node
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

impl ElementData {
    /// Attribute value, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Root,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Elements serialised without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text content is not markup-escaped
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Heading tags in level order
pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// An HTML document tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    /// Per table (in document order): whether the source markup declared a
    /// `<tbody>`. The tree builder inserts one implicitly otherwise.
    declared_tbody: Vec<bool>,
}

enum Pending<'a> {
    Element(ElementRef<'a>, NodeId),
    Text(String, NodeId),
}

impl Document {
    /// Parse an HTML document.
    ///
    /// Fails with [`EngineError::EmptyDocument`] when there is nothing to
    /// parse; any other input yields a tree (the parser repairs malformed
    /// markup).
    pub fn parse(html: &str) -> Result<Self> {
        if html.trim().is_empty() {
            return Err(EngineError::EmptyDocument);
        }

        let parsed = Html::parse_document(html);
        let mut doc = Document {
            nodes: vec![Node {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
            declared_tbody: scan_declared_tbody(html),
        };

        let mut stack = vec![Pending::Element(parsed.root_element(), doc.root())];
        while let Some(pending) = stack.pop() {
            match pending {
                Pending::Text(text, parent) => {
                    doc.append(parent, NodeData::Text(text));
                }
                Pending::Element(element, parent) => {
                    let value = element.value();
                    let attributes = value
                        .attrs()
                        .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                        .collect();
                    let id = doc.append(
                        parent,
                        NodeData::Element(ElementData {
                            tag: value.name().to_lowercase(),
                            attributes,
                        }),
                    );

                    let mut children = Vec::new();
                    for child in element.children() {
                        if let Some(child_element) = ElementRef::wrap(child) {
                            children.push(Pending::Element(child_element, id));
                        } else if let Some(text) = child.value().as_text() {
                            let content: &str = text;
                            children.push(Pending::Text(content.to_string(), id));
                        }
                    }
                    // Reversed so the first child is popped (and appended) first
                    stack.extend(children.into_iter().rev());
                }
            }
        }

        Ok(doc)
    }

    fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// The synthetic root above `<html>`
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes (elements and text) in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds nothing but its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Element data for a node, if it is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.node(id).map(|n| &n.data) {
            Some(NodeData::Element(e)) => Some(e),
            _ => None,
        }
    }

    /// Whether a node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Tag name, or `""` for non-elements
    pub fn tag(&self, id: NodeId) -> &str {
        self.element(id).map(|e| e.tag.as_str()).unwrap_or("")
    }

    /// Attribute value
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Whether the element carries an attribute (even an empty one)
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Attribute value trimmed, treating blank values as absent
    pub fn non_empty_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attr(id, name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Class names of an element
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Whether any class name contains one of the given fragments (case-insensitive)
    pub fn class_contains_any(&self, id: NodeId, fragments: &[&str]) -> bool {
        self.classes(id).iter().any(|class| {
            let class = class.to_lowercase();
            fragments.iter().any(|f| class.contains(f))
        })
    }

    /// Parent node (the root for `<html>`)
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// All child nodes, including text
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Element children in order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|c| self.is_element(*c))
    }

    /// Element ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Nearest ancestor with the given tag
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors(id).find(|a| self.tag(*a) == tag)
    }

    /// All descendant nodes in document order (excluding `id` itself)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Previous element sibling
    pub fn sibling_before(&self, id: NodeId) -> Option<NodeId> {
        self.siblings_before(id).next()
    }

    /// Next element sibling
    pub fn sibling_after(&self, id: NodeId) -> Option<NodeId> {
        self.siblings_after(id).next()
    }

    /// Preceding sibling nodes (including text), nearest first
    pub fn siblings_before(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let siblings = self.parent(id).map(|p| self.children(p)).unwrap_or(&[]);
        let pos = siblings.iter().position(|s| *s == id).unwrap_or(0);
        siblings[..pos].iter().rev().copied().filter(|s| self.is_element(*s))
    }

    /// Following sibling element nodes, nearest first
    pub fn siblings_after(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let siblings = self.parent(id).map(|p| self.children(p)).unwrap_or(&[]);
        let start = siblings
            .iter()
            .position(|s| *s == id)
            .map(|p| p + 1)
            .unwrap_or(siblings.len());
        siblings[start..].iter().copied().filter(|s| self.is_element(*s))
    }

    /// Text of the sibling nodes (elements and text) on either side of a node
    pub fn sibling_text(&self, id: NodeId) -> (String, String) {
        let siblings = self.parent(id).map(|p| self.children(p)).unwrap_or(&[]);
        let pos = match siblings.iter().position(|s| *s == id) {
            Some(p) => p,
            None => return (String::new(), String::new()),
        };
        let collect = |nodes: &[NodeId]| {
            let raw: String = nodes.iter().map(|n| self.raw_text(*n)).collect();
            collapse_whitespace(&raw)
        };
        (collect(&siblings[..pos]), collect(&siblings[pos + 1..]))
    }

    /// Elements with any of the given tags, in document order
    pub fn find_all(&self, tags: &[&str]) -> Vec<NodeId> {
        self.find_attr(|e| tags.contains(&e.tag.as_str()))
    }

    /// Elements matching a predicate, in document order
    pub fn find_attr(&self, predicate: impl Fn(&ElementData) -> bool) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match &n.data {
                NodeData::Element(e) if predicate(e) => Some(NodeId(i)),
                _ => None,
            })
            .collect()
    }

    /// Descendant elements of `scope` with any of the given tags
    pub fn find_all_in(&self, scope: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|d| tags.contains(&self.tag(*d)))
            .collect()
    }

    /// First element with the given tag
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.find_first_where(|e| e.tag == tag)
    }

    /// First element matching a predicate
    pub fn find_first_where(&self, predicate: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        self.nodes.iter().enumerate().find_map(|(i, n)| match &n.data {
            NodeData::Element(e) if predicate(e) => Some(NodeId(i)),
            _ => None,
        })
    }

    /// First descendant of `scope` with the given tag
    pub fn find_first_in(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope).find(|d| self.tag(*d) == tag)
    }

    /// Element with the given `id` attribute
    pub fn find_by_id(&self, id_value: &str) -> Option<NodeId> {
        self.find_first_where(|e| e.attr("id") == Some(id_value))
    }

    /// Nearest element before `id` in document order with one of the tags
    pub fn preceding(&self, id: NodeId, tags: &[&str]) -> Option<NodeId> {
        (1..id.0.min(self.nodes.len()))
            .rev()
            .map(NodeId)
            .find(|n| tags.contains(&self.tag(*n)))
    }

    /// Visible text of a node: descendant text, whitespace-collapsed and trimmed
    pub fn text(&self, id: NodeId) -> String {
        collapse_whitespace(&self.raw_text(id))
    }

    fn raw_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.node(current).map(|n| &n.data) {
                Some(NodeData::Text(t)) => out.push_str(t),
                Some(NodeData::Element(e)) if RAW_TEXT_ELEMENTS.contains(&e.tag.as_str()) => {}
                Some(_) => stack.extend(self.children(current).iter().rev().copied()),
                None => {}
            }
        }
        out
    }

    /// Whether a table's source markup declared its own `<tbody>`
    pub fn declares_tbody(&self, table: NodeId) -> bool {
        let (ordinal, _) = self.position_of_type(table);
        match self.declared_tbody.get(ordinal) {
            Some(declared) => *declared,
            None => self.find_first_in(table, "tbody").is_some(),
        }
    }

    /// `(index, total)` of an element among all elements with its tag
    pub fn position_of_type(&self, id: NodeId) -> (usize, usize) {
        let tag = self.tag(id);
        let same = self.find_all(&[tag]);
        let index = same.iter().position(|n| *n == id).unwrap_or(0);
        (index, same.len())
    }

    /// Deterministic root-to-element path, e.g. `html > body > p:nth-of-type(2)`.
    ///
    /// A segment carries `:nth-of-type(k)` only when its parent has more
    /// than one element child with that tag.
    pub fn path(&self, id: NodeId) -> String {
        if !self.is_element(id) {
            return String::new();
        }
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.filter(|n| self.is_element(*n)) {
            let tag = self.tag(node);
            let same: Vec<NodeId> = self
                .parent(node)
                .map(|p| self.element_children(p).filter(|c| self.tag(*c) == tag).collect())
                .unwrap_or_default();
            if same.len() > 1 {
                let k = same.iter().position(|n| *n == node).unwrap_or(0) + 1;
                segments.push(format!("{}:nth-of-type({})", tag, k));
            } else {
                segments.push(tag.to_string());
            }
            current = self.parent(node);
        }
        segments.reverse();
        segments.join(" > ")
    }

    /// Resolve a path produced by [`Document::path`]
    pub fn resolve_path(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for segment in path.split('>').map(str::trim).filter(|s| !s.is_empty()) {
            let (tag, nth) = match segment.split_once(":nth-of-type(") {
                Some((tag, rest)) => (tag, rest.trim_end_matches(')').parse::<usize>().ok()?),
                None => (segment, 1),
            };
            current = self
                .element_children(current)
                .filter(|c| self.tag(*c) == tag)
                .nth(nth.checked_sub(1)?)?;
        }
        if current == self.root() {
            None
        } else {
            Some(current)
        }
    }

    /// Short CSS selector hint: `tag#id`, `tag.class`, or the full path
    pub fn selector(&self, id: NodeId) -> String {
        let tag = self.tag(id);
        if let Some(element_id) = self.non_empty_attr(id, "id") {
            return format!("{}#{}", tag, element_id);
        }
        let classes = self.classes(id);
        if !classes.is_empty() {
            return format!("{}.{}", tag, classes.join("."));
        }
        self.path(id)
    }

    /// Set (or replace) one declaration in an element's inline `style`.
    ///
    /// Returns the previous style attribute value, if any.
    pub fn set_style_property(
        &mut self,
        id: NodeId,
        property: &str,
        value: &str,
    ) -> Result<Option<String>> {
        let element = match self.nodes.get_mut(id.0).map(|n| &mut n.data) {
            Some(NodeData::Element(e)) => e,
            _ => return Err(EngineError::ElementNotFound(format!("node {}", id.0))),
        };

        let previous = element.attributes.get("style").cloned();
        let mut declarations: Vec<(String, String)> = previous
            .as_deref()
            .unwrap_or("")
            .split(';')
            .filter_map(|d| {
                let (k, v) = d.split_once(':')?;
                Some((k.trim().to_string(), v.trim().to_string()))
            })
            .filter(|(k, _)| !k.is_empty())
            .collect();

        match declarations
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
        {
            Some(existing) => existing.1 = value.to_string(),
            None => declarations.push((property.to_string(), value.to_string())),
        }

        let style = declarations
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        element.attributes.insert("style".to_string(), style);
        Ok(previous)
    }

    /// Serialise one node (and its subtree) to HTML
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialise the whole document
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        self.write_node(self.root(), &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let mut stack = vec![Emit::Open(id)];
        while let Some(step) = stack.pop() {
            let current = match step {
                Emit::Close(tag) => {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                    continue;
                }
                Emit::Open(current) => current,
            };
            let node = match self.node(current) {
                Some(n) => n,
                None => continue,
            };
            match &node.data {
                NodeData::Root => {
                    stack.extend(node.children.iter().rev().map(|c| Emit::Open(*c)));
                }
                NodeData::Text(text) => {
                    let raw = node
                        .parent
                        .map(|p| RAW_TEXT_ELEMENTS.contains(&self.tag(p)))
                        .unwrap_or(false);
                    if raw {
                        out.push_str(text);
                    } else {
                        out.push_str(&escape_text(text));
                    }
                }
                NodeData::Element(e) => {
                    out.push('<');
                    out.push_str(&e.tag);
                    for (name, value) in &e.attributes {
                        out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
                    }
                    out.push('>');
                    if VOID_ELEMENTS.contains(&e.tag.as_str()) {
                        continue;
                    }
                    stack.push(Emit::Close(e.tag.as_str()));
                    stack.extend(node.children.iter().rev().map(|c| Emit::Open(*c)));
                }
            }
        }
    }
}

/// Serialisation step: open a node or close an element tag
enum Emit<'a> {
    Open(NodeId),
    Close(&'a str),
}

/// Iterator over element ancestors
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next.filter(|n| self.doc.is_element(*n))?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over descendants
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}

/// Which tables (by start-tag order) contain a literal `<tbody>` of their own
fn scan_declared_tbody(html: &str) -> Vec<bool> {
    let mut declared = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    for caps in TABLE_TAG_RE.captures_iter(html) {
        let closing = !caps[1].is_empty();
        match (closing, caps[2].to_ascii_lowercase().as_str()) {
            (false, "table") => {
                open.push(declared.len());
                declared.push(false);
            }
            (true, "table") => {
                open.pop();
            }
            (false, "tbody") => {
                if let Some(table) = open.last() {
                    declared[*table] = true;
                }
            }
            _ => {}
        }
    }
    declared
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
