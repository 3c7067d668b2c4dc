//! Materialized views: a resolved selector bound to a root.
//!
//! Materialization is a pure binding step. Every call on a bound action or
//! aggregate re-runs the selector against the root, so no state is cached
//! across calls and two materialized views sharing a root never interfere.
//!
//! Cardinality rules (the `.one`/`.at` forms) need the match count before
//! the action runs, because the action may have side effects. So those forms
//! make a non-mutating identity pass first and only then invoke the action;
//! adapters must keep `run_selector`/`iterate_selector` free of behavioral
//! drift across the two passes.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::adapter::{ActionFn, Adapter, AggregateFn};
use crate::result::{MirarError, MirarResult, SelectedElements};

/// A view bound to a resolved selector and a root element.
///
/// Exposes every declared action and aggregate by name, plus the built-ins:
/// [`get`](Self::get) (all matched elements, no narrowing),
/// [`get_one`](Self::get_one)/[`get_at`](Self::get_at) (cardinality-checked),
/// and the [`print_selected`](Self::print_selected)/[`print_root`](Self::print_root)/
/// [`print_selector`](Self::print_selector) diagnostics.
pub struct MaterializedView<A: Adapter> {
    adapter: Rc<A>,
    selector: A::Selector,
    root: A::Element,
    actions: BTreeMap<String, ActionFn<A>>,
    aggregates: BTreeMap<String, AggregateFn<A>>,
}

impl<A: Adapter> fmt::Debug for MaterializedView<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterializedView")
            .field("selector", &self.adapter.print_selector(&self.selector))
            .field("root", &self.adapter.print_element(&self.root))
            .finish_non_exhaustive()
    }
}

impl<A: Adapter> MaterializedView<A> {
    pub(crate) fn new(
        adapter: Rc<A>,
        selector: A::Selector,
        root: A::Element,
        actions: BTreeMap<String, ActionFn<A>>,
        aggregates: BTreeMap<String, AggregateFn<A>>,
    ) -> Self {
        Self {
            adapter,
            selector,
            root,
            actions,
            aggregates,
        }
    }

    /// Run the selector against the root, collecting the matched elements in
    /// traversal order. Fresh query on every call.
    fn select(&self) -> Vec<A::Element> {
        let group = self.adapter.run_selector(&self.selector, &self.root);
        let elements = self.adapter.iterate_selector(group, |e| e);
        trace!(
            selector = %self.adapter.print_selector(&self.selector),
            matched = elements.len(),
            "selector query"
        );
        elements
    }

    fn zero_error(&self) -> MirarError {
        MirarError::ZeroSelectedElements {
            selector: self.adapter.print_selector(&self.selector),
            root: self.adapter.print_element(&self.root),
            selected: SelectedElements::default(),
        }
    }

    fn render_selected(&self, elements: &[A::Element]) -> SelectedElements {
        SelectedElements(
            elements
                .iter()
                .map(|e| self.adapter.print_element(e))
                .collect(),
        )
    }

    /// The identity pass behind every cardinality-checked call: exactly one
    /// element or a structured failure.
    fn require_one(&self) -> MirarResult<A::Element> {
        let mut elements = self.select();
        match elements.len() {
            1 => Ok(elements.remove(0)),
            0 => Err(self.zero_error()),
            _ => Err(MirarError::MultipleSelectedElements {
                selector: self.adapter.print_selector(&self.selector),
                root: self.adapter.print_element(&self.root),
                selected: self.render_selected(&elements),
            }),
        }
    }

    /// The identity pass behind `.at(n)`: the n-th element (1-indexed) or a
    /// structured failure.
    fn require_at(&self, n: usize) -> MirarResult<A::Element> {
        let mut elements = self.select();
        if elements.is_empty() {
            return Err(self.zero_error());
        }
        if n == 0 || n > elements.len() {
            return Err(MirarError::IndexOutOfBounds {
                index: n,
                selector: self.adapter.print_selector(&self.selector),
                root: self.adapter.print_element(&self.root),
                selected: self.render_selected(&elements),
            });
        }
        Ok(elements.remove(n - 1))
    }

    /// Look up a declared action by name.
    ///
    /// # Errors
    ///
    /// [`MirarError::UnknownAction`] for a name the view never declared.
    pub fn action(&self, name: &str) -> MirarResult<MaterializedAction<'_, A>> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| MirarError::UnknownAction {
                name: name.to_string(),
                declared: self.actions.keys().cloned().collect(),
            })?;
        Ok(MaterializedAction {
            view: self,
            action: Rc::clone(action),
        })
    }

    /// Look up a declared aggregate by name.
    ///
    /// # Errors
    ///
    /// [`MirarError::UnknownAggregate`] for a name the view never declared.
    pub fn aggregate(&self, name: &str) -> MirarResult<MaterializedAggregate<'_, A>> {
        let aggregate = self
            .aggregates
            .get(name)
            .ok_or_else(|| MirarError::UnknownAggregate {
                name: name.to_string(),
                declared: self.aggregates.keys().cloned().collect(),
            })?;
        Ok(MaterializedAggregate {
            view: self,
            aggregate: Rc::clone(aggregate),
        })
    }

    /// All matched elements, in traversal order. Never narrows cardinality;
    /// zero matches is an empty vec, not an error.
    #[must_use]
    pub fn get(&self) -> Vec<A::Element> {
        self.select()
    }

    /// Exactly one matched element.
    ///
    /// # Errors
    ///
    /// [`MirarError::ZeroSelectedElements`] or
    /// [`MirarError::MultipleSelectedElements`].
    pub fn get_one(&self) -> MirarResult<A::Element> {
        self.require_one()
    }

    /// The n-th matched element, 1-indexed.
    ///
    /// # Errors
    ///
    /// [`MirarError::ZeroSelectedElements`] on an empty match set,
    /// [`MirarError::IndexOutOfBounds`] when fewer than `n` elements matched.
    pub fn get_at(&self, n: usize) -> MirarResult<A::Element> {
        self.require_at(n)
    }

    /// Rendered representation of every matched element
    #[must_use]
    pub fn print_selected(&self) -> Vec<String> {
        self.select()
            .iter()
            .map(|e| self.adapter.print_element(e))
            .collect()
    }

    /// Rendered representation of the bound root
    #[must_use]
    pub fn print_root(&self) -> String {
        self.adapter.print_element(&self.root)
    }

    /// Rendered representation of the resolved selector
    #[must_use]
    pub fn print_selector(&self) -> String {
        self.adapter.print_selector(&self.selector)
    }

    /// Names of the bound actions
    #[must_use]
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Names of the bound aggregates
    #[must_use]
    pub fn aggregate_names(&self) -> Vec<&str> {
        self.aggregates.keys().map(String::as_str).collect()
    }
}

/// A named action bound to a resolved selector and root, with the three call
/// forms of the cardinality protocol.
pub struct MaterializedAction<'a, A: Adapter> {
    view: &'a MaterializedView<A>,
    action: ActionFn<A>,
}

impl<A: Adapter> fmt::Debug for MaterializedAction<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterializedAction").finish_non_exhaustive()
    }
}

impl<A: Adapter> MaterializedAction<'_, A> {
    /// Run against every matched element, returning the per-element results
    /// in traversal order. Zero matches yields an empty vec, not an error.
    #[must_use]
    pub fn call(&self, args: &[Value]) -> Vec<Value> {
        let group = self
            .view
            .adapter
            .run_selector(&self.view.selector, &self.view.root);
        self.view
            .adapter
            .iterate_selector(group, |e| (self.action)(&e, args))
    }

    /// Run against exactly one matched element.
    ///
    /// # Errors
    ///
    /// [`MirarError::ZeroSelectedElements`] or
    /// [`MirarError::MultipleSelectedElements`]; the action is not invoked
    /// on failure.
    pub fn one(&self, args: &[Value]) -> MirarResult<Value> {
        let element = self.view.require_one()?;
        Ok((self.action)(&element, args))
    }

    /// Run against the n-th matched element, 1-indexed.
    ///
    /// # Errors
    ///
    /// [`MirarError::ZeroSelectedElements`] on an empty match set,
    /// [`MirarError::IndexOutOfBounds`] when fewer than `n` elements
    /// matched; the action is not invoked on failure.
    pub fn at(&self, n: usize, args: &[Value]) -> MirarResult<Value> {
        let element = self.view.require_at(n)?;
        Ok((self.action)(&element, args))
    }
}

/// A named aggregate bound to a resolved selector and root. Single call
/// form: aggregates are total over zero, one, or many matches and never
/// raise cardinality errors.
pub struct MaterializedAggregate<'a, A: Adapter> {
    view: &'a MaterializedView<A>,
    aggregate: AggregateFn<A>,
}

impl<A: Adapter> fmt::Debug for MaterializedAggregate<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterializedAggregate")
            .finish_non_exhaustive()
    }
}

impl<A: Adapter> MaterializedAggregate<'_, A> {
    /// Invoke once against the full ordered match set
    #[must_use]
    pub fn call(&self, args: &[Value]) -> Value {
        let elements = self.view.select();
        (self.aggregate)(&elements, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::text_views;
    use serde_json::json;

    fn echo(e: &String, _args: &[Value]) -> Value {
        json!(e.clone())
    }

    fn echo_with_arg(e: &String, args: &[Value]) -> Value {
        json!(format!("{e}{}", args[0]))
    }

    fn concat(es: &[String], _args: &[Value]) -> Value {
        json!(es.concat())
    }

    mod action_call_tests {
        use super::*;

        #[test]
        fn test_bare_call_returns_one_result_per_match() {
            let views = text_views();
            let v = views.view("a".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"aaaa".to_string()).unwrap();

            let results = mat.action("echo").unwrap().call(&[]);
            assert_eq!(results.len(), 4);
            assert!(results.iter().all(|r| r == &json!("a")));
        }

        #[test]
        fn test_bare_call_on_zero_matches_is_empty_not_an_error() {
            let views = text_views();
            let v = views.view("z".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"aaaa".to_string()).unwrap();

            assert!(mat.action("echo").unwrap().call(&[]).is_empty());
        }

        #[test]
        fn test_action_arguments_are_forwarded() {
            let views = text_views();
            let v = views
                .view("a".to_string())
                .with_action("echo", echo_with_arg);
            let mat = v.materialize(&"a".to_string()).unwrap();

            let result = mat.action("echo").unwrap().one(&[json!(1)]).unwrap();
            assert_eq!(result, json!("a1"));
        }

        #[test]
        fn test_unknown_action_is_an_immediate_error() {
            let views = text_views();
            let v = views.view("a".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"a".to_string()).unwrap();

            let err = mat.action("missing").unwrap_err();
            assert!(matches!(err, MirarError::UnknownAction { .. }));
            assert!(err.to_string().contains("echo"));
        }
    }

    mod cardinality_tests {
        use super::*;

        #[test]
        fn test_one_succeeds_on_exactly_one_match() {
            let views = text_views();
            let v = views.view("a".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"xaz".to_string()).unwrap();

            assert_eq!(mat.action("echo").unwrap().one(&[]).unwrap(), json!("a"));
        }

        #[test]
        fn test_one_fails_on_zero_matches() {
            let views = text_views();
            let v = views.view("a".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"bbbb".to_string()).unwrap();

            let err = mat.action("echo").unwrap().one(&[]).unwrap_err();
            assert!(matches!(err, MirarError::ZeroSelectedElements { .. }));
        }

        #[test]
        fn test_one_fails_on_multiple_matches() {
            let views = text_views();
            let v = views.view("a".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"aba".to_string()).unwrap();

            let err = mat.action("echo").unwrap().one(&[]).unwrap_err();
            assert!(matches!(err, MirarError::MultipleSelectedElements { .. }));
            assert_eq!(err.selected().unwrap().len(), 2);
        }

        #[test]
        fn test_at_is_one_indexed() {
            let views = text_views();
            let v = views.view("[ab]".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"ab".to_string()).unwrap();

            assert_eq!(mat.action("echo").unwrap().at(1, &[]).unwrap(), json!("a"));
            assert_eq!(mat.action("echo").unwrap().at(2, &[]).unwrap(), json!("b"));
        }

        #[test]
        fn test_at_zero_is_out_of_bounds() {
            let views = text_views();
            let v = views.view("a".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"a".to_string()).unwrap();

            let err = mat.action("echo").unwrap().at(0, &[]).unwrap_err();
            assert!(matches!(err, MirarError::IndexOutOfBounds { index: 0, .. }));
        }

        #[test]
        fn test_at_past_the_end_is_out_of_bounds() {
            let views = text_views();
            let v = views.view("a".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"abbb".to_string()).unwrap();

            let err = mat.action("echo").unwrap().at(2, &[]).unwrap_err();
            assert!(matches!(err, MirarError::IndexOutOfBounds { index: 2, .. }));
            assert_eq!(err.selected().unwrap().len(), 1);
        }

        #[test]
        fn test_at_on_zero_matches_reports_zero_selected() {
            let views = text_views();
            let v = views.view("a".to_string()).with_action("echo", echo);
            let mat = v.materialize(&"bbbb".to_string()).unwrap();

            let err = mat.action("echo").unwrap().at(2, &[]).unwrap_err();
            assert!(matches!(err, MirarError::ZeroSelectedElements { .. }));
        }
    }

    mod aggregate_tests {
        use super::*;

        #[test]
        fn test_aggregate_sees_the_full_match_set() {
            let views = text_views();
            let v = views.view("a".to_string()).with_aggregate("concat", concat);
            let mat = v.materialize(&"aba".to_string()).unwrap();

            assert_eq!(mat.aggregate("concat").unwrap().call(&[]), json!("aa"));
        }

        #[test]
        fn test_aggregate_is_total_over_zero_matches() {
            let views = text_views();
            let v = views.view("z".to_string()).with_aggregate("concat", concat);
            let mat = v.materialize(&"aba".to_string()).unwrap();

            assert_eq!(mat.aggregate("concat").unwrap().call(&[]), json!(""));
        }

        #[test]
        fn test_aggregate_arguments_are_forwarded() {
            let views = text_views();
            let v = views
                .view("a".to_string())
                .with_aggregate("tagged", |es: &[String], args: &[Value]| {
                    json!(format!("{}{}", es.concat(), args[0]))
                });
            let mat = v.materialize(&"aa".to_string()).unwrap();

            assert_eq!(
                mat.aggregate("tagged").unwrap().call(&[json!(true)]),
                json!("aatrue")
            );
        }

        #[test]
        fn test_unknown_aggregate_is_an_immediate_error() {
            let views = text_views();
            let v = views.view("a".to_string());
            let mat = v.materialize(&"a".to_string()).unwrap();

            assert!(matches!(
                mat.aggregate("missing").unwrap_err(),
                MirarError::UnknownAggregate { .. }
            ));
        }
    }

    mod builtin_tests {
        use super::*;

        #[test]
        fn test_get_returns_all_matched_elements() {
            let views = text_views();
            let mat = views
                .view("a".to_string())
                .materialize(&"aba".to_string())
                .unwrap();
            assert_eq!(mat.get(), vec!["a".to_string(), "a".to_string()]);
        }

        #[test]
        fn test_get_one_and_get_at_apply_cardinality_rules() {
            let views = text_views();
            let mat = views
                .view("a".to_string())
                .materialize(&"aba".to_string())
                .unwrap();

            assert!(matches!(
                mat.get_one().unwrap_err(),
                MirarError::MultipleSelectedElements { .. }
            ));
            assert_eq!(mat.get_at(2).unwrap(), "a");
        }

        #[test]
        fn test_print_selected_renders_each_match() {
            let views = text_views();
            let mat = views
                .view("a".to_string())
                .materialize(&"aba".to_string())
                .unwrap();
            assert_eq!(mat.print_selected(), vec!["a", "a"]);
        }

        #[test]
        fn test_print_root_and_print_selector() {
            let views = text_views();
            let composed = views
                .view("a".to_string())
                .then(&views.view("b".to_string()))
                .unwrap();
            let mat = composed.materialize(&"aba".to_string()).unwrap();

            assert_eq!(mat.print_root(), "aba");
            assert_eq!(mat.print_selector(), "ab");
        }
    }

    mod diagnostic_message_tests {
        use super::*;

        #[test]
        fn test_multiple_selected_message_carries_full_context() {
            let views = text_views();
            let mat = views
                .view("a".to_string())
                .materialize(&"aba".to_string())
                .unwrap();

            let msg = mat.get_one().unwrap_err().to_string();
            assert!(msg.contains("Selector: \"a\""));
            assert!(msg.contains("Root: \"aba\""));
            assert_eq!(msg.matches("\"a\",").count(), 2);
        }

        #[test]
        fn test_zero_selected_message_carries_full_context() {
            let views = text_views();
            let mat = views
                .view("a".to_string())
                .materialize(&"bbbb".to_string())
                .unwrap();

            let msg = mat.get_one().unwrap_err().to_string();
            assert!(msg.contains("Selector: \"a\""));
            assert!(msg.contains("Root: \"bbbb\""));
            assert!(msg.contains("Selected: []"));
        }

        #[test]
        fn test_index_out_of_bounds_message_carries_full_context() {
            let views = text_views();
            let mat = views
                .view("a".to_string())
                .materialize(&"abbb".to_string())
                .unwrap();

            let msg = mat.get_at(2).unwrap_err().to_string();
            assert!(msg.contains("Index: 2"));
            assert!(msg.contains("Selector: \"a\""));
            assert!(msg.contains("Root: \"abbb\""));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Composing (a.b).c and a.(b.c) must match the same sequence
            /// against any root.
            #[test]
            fn prop_selector_composition_is_associative(
                a in "[abc]{1,2}",
                b in "[abc]{1,2}",
                c in "[abc]{1,2}",
                root in "[abc]{0,12}",
            ) {
                let views = text_views();
                let (va, vb, vc) = (
                    views.view(a),
                    views.view(b),
                    views.view(c),
                );

                let left = va.then(&vb).unwrap().then(&vc).unwrap();
                let right = va.then(&vb.then(&vc).unwrap()).unwrap();

                let left_mat = left.materialize(&root).unwrap();
                let right_mat = right.materialize(&root).unwrap();
                prop_assert_eq!(left_mat.get(), right_mat.get());
            }

            /// For a selector matching k elements: the bare call returns k
            /// results, `.one` succeeds iff k == 1, and `.at(n)` succeeds
            /// iff 1 <= n <= k.
            #[test]
            fn prop_cardinality_laws(root in "[ab]{0,10}", n in 0_usize..12) {
                let views = text_views();
                let v = views.view("a".to_string()).with_action("echo", echo);
                let mat = v.materialize(&root).unwrap();
                let k = root.matches('a').count();

                let action = mat.action("echo").unwrap();
                prop_assert_eq!(action.call(&[]).len(), k);
                prop_assert_eq!(action.one(&[]).is_ok(), k == 1);
                prop_assert_eq!(action.at(n, &[]).is_ok(), n >= 1 && n <= k);
            }
        }
    }
}
