//! In-memory element-tree adapter.
//!
//! A small fake DOM used by the crate's own acceptance tests and as the
//! reference backend for the default view library: shared-handle elements
//! with attributes, mutable control state (checked/selected/value) and a
//! recorded event log, plus a CSS-flavored selector engine.
//!
//! Selector syntax: comma-separated alternatives of whitespace-separated
//! simple selectors (descendant combinator). A simple selector is an
//! optional tag (or `*`) followed by attribute filters: `[name=value]`,
//! `[name]` (present), `[!name]` (absent). Composition takes the cartesian
//! product of the alternatives, so nesting distributes over commas.

mod controls;

pub use controls::default_view_specs;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::adapter::Adapter;
use crate::view::Views;

/// A node in the mock element tree. Cloning clones the handle, not the node.
#[derive(Clone)]
pub struct MockElement {
    node: Rc<RefCell<NodeData>>,
}

struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    children: Vec<MockElement>,
    parent: Weak<RefCell<NodeData>>,
    checked: bool,
    selected: bool,
    value: String,
    events: Vec<String>,
}

impl MockElement {
    /// Create an element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            node: Rc::new(RefCell::new(NodeData {
                tag: tag.into(),
                attrs: BTreeMap::new(),
                children: Vec::new(),
                parent: Weak::new(),
                checked: false,
                selected: false,
                value: String::new(),
                events: Vec::new(),
            })),
        }
    }

    /// Set an attribute. A `value` attribute also seeds the mutable value
    /// state, the way a DOM input's initial value does.
    #[must_use]
    pub fn with_attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        {
            let mut node = self.node.borrow_mut();
            if name == "value" {
                node.value.clone_from(&value);
            }
            let _ = node.attrs.insert(name, value);
        }
        self
    }

    /// Append a child, wiring its parent link
    #[must_use]
    pub fn with_child(self, child: Self) -> Self {
        child.node.borrow_mut().parent = Rc::downgrade(&self.node);
        self.node.borrow_mut().children.push(child);
        self
    }

    /// Tag name
    #[must_use]
    pub fn tag(&self) -> String {
        self.node.borrow().tag.clone()
    }

    /// Attribute value, if present
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.node.borrow().attrs.get(name).cloned()
    }

    /// Whether the attribute is present at all
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.node.borrow().attrs.contains_key(name)
    }

    /// Checked state (checkboxes, radios)
    #[must_use]
    pub fn checked(&self) -> bool {
        self.node.borrow().checked
    }

    /// Set the checked state
    pub fn set_checked(&self, checked: bool) {
        self.node.borrow_mut().checked = checked;
    }

    /// Selected state (options)
    #[must_use]
    pub fn selected(&self) -> bool {
        self.node.borrow().selected
    }

    /// Set the selected state
    pub fn set_selected(&self, selected: bool) {
        self.node.borrow_mut().selected = selected;
    }

    /// Current value state (text inputs)
    #[must_use]
    pub fn value(&self) -> String {
        self.node.borrow().value.clone()
    }

    /// Set the value state
    pub fn set_value(&self, value: impl Into<String>) {
        self.node.borrow_mut().value = value.into();
    }

    /// Child handles, in insertion order
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.node.borrow().children.clone()
    }

    /// Parent handle, if attached
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.node.borrow().parent.upgrade().map(|node| Self { node })
    }

    /// Record a fired event ("change", "click", "submit")
    pub fn fire(&self, event: impl Into<String>) {
        self.node.borrow_mut().events.push(event.into());
    }

    /// Events fired on this element, in order
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.node.borrow().events.clone()
    }

    /// Handle identity
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Render as an opening tag with its attributes
    #[must_use]
    pub fn render(&self) -> String {
        let node = self.node.borrow();
        let mut out = format!("<{}", node.tag);
        for (name, value) in &node.attrs {
            if value.is_empty() {
                out.push_str(&format!(" {name}"));
            } else {
                out.push_str(&format!(" {name}=\"{value}\""));
            }
        }
        out.push('>');
        out
    }
}

impl fmt::Debug for MockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MockElement({})", self.render())
    }
}

impl PartialEq for MockElement {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// CSS-flavored selector for the mock tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockSelector(
    /// The selector source text
    pub String,
);

impl From<&str> for MockSelector {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MockSelector {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for MockSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
enum AttrFilter {
    Present(String),
    Absent(String),
    Equals(String, String),
}

#[derive(Debug)]
struct SimpleSelector {
    tag: Option<String>,
    filters: Vec<AttrFilter>,
}

fn simple_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\*|[a-zA-Z][a-zA-Z0-9_-]*)?((?:\[[^\]]*\])*)$").unwrap()
    })
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]").unwrap())
}

fn parse_simple(token: &str) -> Option<SimpleSelector> {
    let caps = simple_re().captures(token)?;
    let tag = caps
        .get(1)
        .map(|m| m.as_str())
        .filter(|t| !t.is_empty() && *t != "*")
        .map(str::to_string);
    let mut filters = Vec::new();
    if let Some(attr_part) = caps.get(2) {
        for attr in attr_re().captures_iter(attr_part.as_str()) {
            let inner = &attr[1];
            if let Some(name) = inner.strip_prefix('!') {
                filters.push(AttrFilter::Absent(name.to_string()));
            } else if let Some((name, value)) = inner.split_once('=') {
                filters.push(AttrFilter::Equals(name.to_string(), value.to_string()));
            } else {
                filters.push(AttrFilter::Present(inner.to_string()));
            }
        }
    }
    if tag.is_none() && filters.is_empty() && token != "*" {
        return None;
    }
    Some(SimpleSelector { tag, filters })
}

fn matches(element: &MockElement, simple: &SimpleSelector) -> bool {
    if let Some(tag) = &simple.tag {
        if element.tag() != *tag {
            return false;
        }
    }
    simple.filters.iter().all(|filter| match filter {
        AttrFilter::Present(name) => element.has_attr(name),
        AttrFilter::Absent(name) => !element.has_attr(name),
        AttrFilter::Equals(name, value) => element.attr(name).as_deref() == Some(value),
    })
}

fn contains(list: &[MockElement], element: &MockElement) -> bool {
    list.iter().any(|e| e.ptr_eq(element))
}

fn collect_matching_descendants(
    element: &MockElement,
    simple: &SimpleSelector,
    out: &mut Vec<MockElement>,
) {
    for child in element.children() {
        if matches(&child, simple) {
            out.push(child.clone());
        }
        collect_matching_descendants(&child, simple, out);
    }
}

fn order_visit(element: &MockElement, matched: &[MockElement], out: &mut Vec<MockElement>) {
    for child in element.children() {
        if contains(matched, &child) {
            out.push(child.clone());
        }
        order_visit(&child, matched, out);
    }
}

/// Adapter over the mock element tree
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAdapter;

impl Adapter for MockAdapter {
    type Selector = MockSelector;
    type Element = MockElement;
    type Group = Vec<MockElement>;

    // Selectors distribute over comma alternatives, so composition is the
    // cartesian product joined with the descendant combinator. This keeps
    // composition associative.
    fn compose_selectors(&self, first: &MockSelector, second: &MockSelector) -> MockSelector {
        let mut parts = Vec::new();
        for a in first.0.split(',') {
            for b in second.0.split(',') {
                parts.push(format!("{} {}", a.trim(), b.trim()));
            }
        }
        MockSelector(parts.join(", "))
    }

    fn run_selector(&self, selector: &MockSelector, root: &MockElement) -> Vec<MockElement> {
        let mut matched: Vec<MockElement> = Vec::new();
        for alternative in selector.0.split(',') {
            let steps: Option<Vec<SimpleSelector>> = alternative
                .split_whitespace()
                .map(parse_simple)
                .collect();
            // An unparseable or empty alternative matches nothing
            let Some(steps) = steps else { continue };
            if steps.is_empty() {
                continue;
            }

            let mut current = vec![root.clone()];
            for step in &steps {
                let mut next = Vec::new();
                for element in &current {
                    collect_matching_descendants(element, step, &mut next);
                }
                let mut deduped = Vec::new();
                for element in next {
                    if !contains(&deduped, &element) {
                        deduped.push(element);
                    }
                }
                current = deduped;
            }
            for element in current {
                if !contains(&matched, &element) {
                    matched.push(element);
                }
            }
        }

        // Normalize to document order across alternatives
        let mut ordered = Vec::with_capacity(matched.len());
        order_visit(root, &matched, &mut ordered);
        ordered
    }

    fn iterate_selector<R>(
        &self,
        group: Vec<MockElement>,
        f: impl FnMut(MockElement) -> R,
    ) -> Vec<R> {
        group.into_iter().map(f).collect()
    }

    fn print_selector(&self, selector: &MockSelector) -> String {
        selector.0.clone()
    }

    fn print_element(&self, element: &MockElement) -> String {
        element.render()
    }
}

/// A view factory over the mock adapter with its default view library
#[must_use]
pub fn views() -> Views<MockAdapter> {
    Views::new(MockAdapter, default_view_specs())
}
