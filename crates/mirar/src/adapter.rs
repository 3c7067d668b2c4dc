//! The adapter seam: how Mirar finds and renders elements.
//!
//! Mirar is adapter-agnostic. A backend (CSS/DOM, component tree, remote
//! browser commands) plugs in by implementing [`Adapter`], which is exactly
//! four operations plus two diagnostic printers:
//!
//! - `compose_selectors` — associative nesting of two selectors
//! - `run_selector` — execute a selector against a root element
//! - `iterate_selector` — walk a match group in traversal order
//! - `print_selector` / `print_element` — renderers for error messages and
//!   the `print_*` built-ins
//!
//! Adapters additionally supply the default view library's selectors and raw
//! actions as [`DefaultViewSpecs`]; the core wraps them uniformly so every
//! backend gets equivalent checkbox/radio/input/select/form/button behavior.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

/// A backend that knows how to select and render elements.
///
/// # Contract
///
/// - `compose_selectors` must be associative: composing `(a, b)` then `c`
///   selects the same elements as composing `a` then `(b, c)`.
/// - Composing `a` then `b` must mean "within matches of `a`, find matches
///   of `b`" (or the backend's equivalent nesting semantics).
/// - `run_selector` followed by `iterate_selector` must be safe to invoke
///   twice per logical call without behavioral drift: the cardinality-checked
///   call forms perform a non-mutating identity pass before invoking a
///   possibly side-effecting action.
/// - `iterate_selector` must preserve the backend's natural document or
///   traversal order.
pub trait Adapter: 'static {
    /// Opaque description of "where to look" under a root
    type Selector: Clone + 'static;
    /// A single matched node
    type Element: Clone + 'static;
    /// A collection of matched nodes
    type Group;

    /// Compose two selectors so `second` is matched within the scope of `first`
    fn compose_selectors(&self, first: &Self::Selector, second: &Self::Selector)
        -> Self::Selector;

    /// Execute a selector against a root element, returning the matched group
    /// (possibly empty)
    fn run_selector(&self, selector: &Self::Selector, root: &Self::Element) -> Self::Group;

    /// Apply `f` to every element of `group` in traversal order, collecting
    /// the results
    fn iterate_selector<R>(
        &self,
        group: Self::Group,
        f: impl FnMut(Self::Element) -> R,
    ) -> Vec<R>;

    /// Render a selector for diagnostics
    fn print_selector(&self, selector: &Self::Selector) -> String;

    /// Render an element for diagnostics
    fn print_element(&self, element: &Self::Element) -> String;
}

/// A named per-element operation: one element in, zero or more caller
/// arguments, any [`Value`] out.
pub type ActionFn<A> = Rc<dyn Fn(&<A as Adapter>::Element, &[Value]) -> Value>;

/// A named whole-set operation: the full ordered match set in, zero or more
/// caller arguments, any [`Value`] out.
pub type AggregateFn<A> = Rc<dyn Fn(&[<A as Adapter>::Element], &[Value]) -> Value>;

/// A deferred selector: renders a concrete selector from the arguments
/// supplied at materialization time.
pub type SelectorFn<S> = Rc<dyn Fn(&[Value]) -> S>;

/// Adapter-supplied raw material for one default view: a selector plus the
/// backend's native actions for that control.
pub struct DefaultViewSpec<A: Adapter> {
    /// Selector matching the control (e.g. `input[type=checkbox]`)
    pub selector: A::Selector,
    /// Raw actions, keyed by the names in the default-view catalog
    pub actions: BTreeMap<String, ActionFn<A>>,
}

impl<A: Adapter> DefaultViewSpec<A> {
    /// Start a spec from a selector
    #[must_use]
    pub fn new(selector: A::Selector) -> Self {
        Self {
            selector,
            actions: BTreeMap::new(),
        }
    }

    /// Add a named action
    #[must_use]
    pub fn action(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&A::Element, &[Value]) -> Value + 'static,
    ) -> Self {
        let _ = self.actions.insert(name.into(), Rc::new(f));
        self
    }
}

impl<A: Adapter> std::fmt::Debug for DefaultViewSpec<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultViewSpec")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// The full set of control specs an adapter supplies for the default view
/// library. See the catalog in [`crate::views`] for the action vocabulary
/// each control is expected to declare.
#[derive(Debug)]
pub struct DefaultViewSpecs<A: Adapter> {
    /// Checkbox-like controls: `toggle`, `is_checked`, `get_value`
    pub checkbox: DefaultViewSpec<A>,
    /// Radio-button controls: `select`, `get_selected_value`
    pub radio: DefaultViewSpec<A>,
    /// Text-entry controls: `enter_text`, `get_text`
    pub text_input: DefaultViewSpec<A>,
    /// Single-choice selection controls: `select`, `get_selection`
    pub single_select: DefaultViewSpec<A>,
    /// Multi-choice selection controls: `select`, `get_selection`
    pub multi_select: DefaultViewSpec<A>,
    /// Form containers: `submit`
    pub form: DefaultViewSpec<A>,
    /// Clickable buttons: `click`
    pub button: DefaultViewSpec<A>,
}
