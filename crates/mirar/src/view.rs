//! Composable test views.
//!
//! A [`View`] is an immutable description: a selector (concrete, or deferred
//! behind parameters) plus named maps of actions and aggregates. Views are
//! created through a [`Views`] factory bound to one adapter, composed with
//! [`View::then`], and bound to a root with [`View::materialize`].
//!
//! Composition narrows: `outer.then(&inner)` selects the inner view's
//! elements within the outer view's matches, and the composed view speaks the
//! inner view's vocabulary — its actions and aggregates are exactly the
//! right-hand view's.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::adapter::{ActionFn, Adapter, AggregateFn, DefaultViewSpecs, SelectorFn};
use crate::materialize::MaterializedView;
use crate::result::{MirarError, MirarResult};
use crate::views::DefaultViews;

/// A selector that is either ready to run or waiting for its arguments.
///
/// The two cases compose differently, so the discriminator is an explicit
/// variant rather than a runtime function test.
pub enum SelectorSpec<S> {
    /// A selector value usable as-is
    Concrete(S),
    /// A selector produced from materialization-time arguments
    Parameterized {
        /// Number of arguments `render` expects
        arity: usize,
        /// Renders the concrete selector from the supplied arguments
        render: SelectorFn<S>,
    },
}

impl<S: Clone> Clone for SelectorSpec<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Concrete(s) => Self::Concrete(s.clone()),
            Self::Parameterized { arity, render } => Self::Parameterized {
                arity: *arity,
                render: Rc::clone(render),
            },
        }
    }
}

impl<S> fmt::Debug for SelectorSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(_) => f.write_str("SelectorSpec::Concrete"),
            Self::Parameterized { arity, .. } => f
                .debug_struct("SelectorSpec::Parameterized")
                .field("arity", arity)
                .finish_non_exhaustive(),
        }
    }
}

impl<S: Clone> SelectorSpec<S> {
    /// Number of selector arguments this spec requires at materialization
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            Self::Concrete(_) => 0,
            Self::Parameterized { arity, .. } => *arity,
        }
    }

    /// Resolve to a concrete selector, checking argument arity exactly
    pub(crate) fn resolve(&self, args: &[Value]) -> MirarResult<S> {
        match self {
            Self::Concrete(s) => {
                if args.is_empty() {
                    Ok(s.clone())
                } else {
                    Err(MirarError::SelectorArityMismatch {
                        expected: 0,
                        supplied: args.len(),
                    })
                }
            }
            Self::Parameterized { arity, render } => {
                if args.len() == *arity {
                    Ok(render(args))
                } else {
                    Err(MirarError::SelectorArityMismatch {
                        expected: *arity,
                        supplied: args.len(),
                    })
                }
            }
        }
    }
}

/// An immutable, composable test view: a selector plus named actions and
/// aggregates over the elements it matches.
pub struct View<A: Adapter> {
    adapter: Rc<A>,
    selector: SelectorSpec<A::Selector>,
    actions: BTreeMap<String, ActionFn<A>>,
    aggregates: BTreeMap<String, AggregateFn<A>>,
}

impl<A: Adapter> Clone for View<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: Rc::clone(&self.adapter),
            selector: self.selector.clone(),
            actions: self.actions.clone(),
            aggregates: self.aggregates.clone(),
        }
    }
}

impl<A: Adapter> fmt::Debug for View<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("selector", &self.selector)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("aggregates", &self.aggregates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<A: Adapter> View<A> {
    pub(crate) fn from_parts(
        adapter: Rc<A>,
        selector: SelectorSpec<A::Selector>,
        actions: BTreeMap<String, ActionFn<A>>,
        aggregates: BTreeMap<String, AggregateFn<A>>,
    ) -> Self {
        Self {
            adapter,
            selector,
            actions,
            aggregates,
        }
    }

    /// Add a named action (a per-element operation)
    #[must_use]
    pub fn with_action(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&A::Element, &[Value]) -> Value + 'static,
    ) -> Self {
        let _ = self.actions.insert(name.into(), Rc::new(f));
        self
    }

    /// Add a named aggregate (a whole-match-set operation)
    #[must_use]
    pub fn with_aggregate(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&[A::Element], &[Value]) -> Value + 'static,
    ) -> Self {
        let _ = self.aggregates.insert(name.into(), Rc::new(f));
        self
    }

    /// The view's selector spec
    #[must_use]
    pub fn selector(&self) -> &SelectorSpec<A::Selector> {
        &self.selector
    }

    /// Names of the declared actions
    #[must_use]
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Names of the declared aggregates
    #[must_use]
    pub fn aggregate_names(&self) -> Vec<&str> {
        self.aggregates.keys().map(String::as_str).collect()
    }

    /// Look up a declared action by name
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&ActionFn<A>> {
        self.actions.get(name)
    }

    /// Look up a declared aggregate by name
    #[must_use]
    pub fn aggregate(&self, name: &str) -> Option<&AggregateFn<A>> {
        self.aggregates.get(name)
    }

    /// Compose this view with a nested one.
    ///
    /// The composed selector finds `next`'s elements within this view's
    /// matches; the composed actions and aggregates are exactly `next`'s
    /// (the right-hand view wins). If this view's selector is parameterized,
    /// the composed selector stays parameterized with the same arity.
    ///
    /// # Errors
    ///
    /// [`MirarError::ParameterizedCompose`] if `next` has a parameterized
    /// selector: only the leftmost view of a composition can receive
    /// selector arguments.
    pub fn then(&self, next: &Self) -> MirarResult<Self> {
        let next_selector = match &next.selector {
            SelectorSpec::Concrete(s) => s.clone(),
            SelectorSpec::Parameterized { .. } => return Err(MirarError::ParameterizedCompose),
        };

        let selector = match &self.selector {
            SelectorSpec::Concrete(s) => {
                SelectorSpec::Concrete(self.adapter.compose_selectors(s, &next_selector))
            }
            SelectorSpec::Parameterized { arity, render } => {
                let adapter = Rc::clone(&self.adapter);
                let render = Rc::clone(render);
                SelectorSpec::Parameterized {
                    arity: *arity,
                    render: Rc::new(move |args| {
                        adapter.compose_selectors(&render(args), &next_selector)
                    }),
                }
            }
        };

        Ok(Self {
            adapter: Rc::clone(&self.adapter),
            selector,
            actions: next.actions.clone(),
            aggregates: next.aggregates.clone(),
        })
    }

    /// Bind the view to a root element.
    ///
    /// Shorthand for [`View::materialize_with`] with no selector arguments;
    /// use this for views with concrete selectors.
    ///
    /// # Errors
    ///
    /// [`MirarError::SelectorArityMismatch`] if the view's selector is
    /// parameterized.
    pub fn materialize(&self, root: &A::Element) -> MirarResult<MaterializedView<A>> {
        self.materialize_with(root, &[])
    }

    /// Bind the view to a root element, supplying selector arguments.
    ///
    /// The argument count must equal the selector's declared arity exactly
    /// (zero for concrete selectors). Materialization is a pure binding step:
    /// no querying happens until a bound action or aggregate is called, and
    /// every such call re-queries from the root.
    ///
    /// # Errors
    ///
    /// [`MirarError::SelectorArityMismatch`] on excess or missing arguments.
    pub fn materialize_with(
        &self,
        root: &A::Element,
        selector_args: &[Value],
    ) -> MirarResult<MaterializedView<A>> {
        let selector = self.selector.resolve(selector_args)?;
        debug!(
            selector = %self.adapter.print_selector(&selector),
            actions = self.actions.len(),
            aggregates = self.aggregates.len(),
            "materialized view"
        );
        Ok(MaterializedView::new(
            Rc::clone(&self.adapter),
            selector,
            root.clone(),
            self.actions.clone(),
            self.aggregates.clone(),
        ))
    }
}

/// Factory for views bound to one adapter.
///
/// Holds the adapter and the wrapped default view library; every view it
/// creates shares the same selector semantics, so views from different
/// factories never mix.
pub struct Views<A: Adapter> {
    adapter: Rc<A>,
    defaults: DefaultViews<A>,
}

impl<A: Adapter> fmt::Debug for Views<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Views").finish_non_exhaustive()
    }
}

impl<A: Adapter> Views<A> {
    /// Plug in an adapter together with its default view specs
    #[must_use]
    pub fn new(adapter: A, specs: DefaultViewSpecs<A>) -> Self {
        let adapter = Rc::new(adapter);
        let defaults = DefaultViews::from_specs(&adapter, specs);
        Self { adapter, defaults }
    }

    /// Create a view from a concrete selector, with no actions yet
    #[must_use]
    pub fn view(&self, selector: A::Selector) -> View<A> {
        View::from_parts(
            Rc::clone(&self.adapter),
            SelectorSpec::Concrete(selector),
            BTreeMap::new(),
            BTreeMap::new(),
        )
    }

    /// Create a view whose selector is rendered from arguments supplied at
    /// materialization time.
    ///
    /// `arity` is the exact number of arguments `render` expects; it is
    /// enforced at materialization.
    #[must_use]
    pub fn parameterized(
        &self,
        arity: usize,
        render: impl Fn(&[Value]) -> A::Selector + 'static,
    ) -> View<A> {
        View::from_parts(
            Rc::clone(&self.adapter),
            SelectorSpec::Parameterized {
                arity,
                render: Rc::new(render),
            },
            BTreeMap::new(),
            BTreeMap::new(),
        )
    }

    /// The default view library wrapped for this adapter
    #[must_use]
    pub fn defaults(&self) -> &DefaultViews<A> {
        &self.defaults
    }

    /// The adapter this factory is bound to
    #[must_use]
    pub fn adapter(&self) -> &Rc<A> {
        &self.adapter
    }
}
