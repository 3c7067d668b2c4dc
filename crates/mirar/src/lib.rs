//! Mirar: cross-framework UI test-assertion helper.
//!
//! Mirar (Spanish: "to look") lets a test author describe a *view* — a
//! selector plus named actions and aggregates over the elements it matches —
//! against an abstract element model, then *materialize* that view against a
//! concrete rendered root to run actions and make assertions. Backends plug
//! in through the four-operation [`Adapter`] seam; the core is
//! adapter-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      MIRAR Architecture                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  then   ┌─────────┐  materialize  ┌──────────┐  │
//! │  │  View   │────────►│  View   │──────────────►│ Material │  │
//! │  │ (outer) │         │(composed)│   + root     │ izedView │  │
//! │  └─────────┘         └─────────┘               └────┬─────┘  │
//! │       ▲                                             │        │
//! │  ┌────┴─────┐   four operations   ┌─────────┐  .one/.at/()   │
//! │  │  Views   │◄───────────────────►│ Adapter │◄─────┘         │
//! │  │ factory  │                     │ backend │                │
//! │  └──────────┘                     └─────────┘                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mirar::mock::{self, MockElement};
//! use serde_json::json;
//!
//! let views = mock::views();
//! let root = MockElement::new("div").with_child(
//!     MockElement::new("input")
//!         .with_attr("type", "checkbox")
//!         .with_attr("value", "cb-value"),
//! );
//!
//! let checkbox = views.defaults().checkbox.materialize(&root)?;
//! checkbox.action("toggle")?.one(&[])?;
//! assert_eq!(checkbox.action("is_checked")?.one(&[])?, json!(true));
//! # Ok::<(), mirar::MirarError>(())
//! ```
//!
//! # Cardinality protocol
//!
//! A materialized action has three call forms: the bare call runs against
//! every match (zero matches is an empty result, not an error), `.one`
//! requires exactly one match, and `.at(n)` requires at least `n` matches
//! (1-indexed). Aggregates are total: they always see the full ordered match
//! set, even when it is empty. The `.one`/`.at` forms are the only place the
//! core raises [`MirarError::ZeroSelectedElements`],
//! [`MirarError::MultipleSelectedElements`] or
//! [`MirarError::IndexOutOfBounds`], and those errors never get retried or
//! recovered — a cardinality mismatch is a test-authoring or application bug.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod adapter;
pub mod materialize;
pub mod mock;
pub mod result;
pub mod view;
pub mod views;

#[cfg(test)]
pub(crate) mod testutil;

pub use adapter::{ActionFn, Adapter, AggregateFn, DefaultViewSpec, DefaultViewSpecs, SelectorFn};
pub use materialize::{MaterializedAction, MaterializedAggregate, MaterializedView};
pub use result::{MirarError, MirarResult, SelectedElements};
pub use view::{SelectorSpec, View, Views};
pub use views::DefaultViews;

/// The dynamic value currency for action/aggregate arguments and results
pub use serde_json::Value;
