//! Result and error types for Mirar.
//!
//! The cardinality errors (`ZeroSelectedElements`, `MultipleSelectedElements`,
//! `IndexOutOfBounds`) are raised only by the `.one`/`.at` call forms of a
//! materialized action. They carry the rendered selector, rendered root and
//! per-element rendered matched set, so a failing assertion is debuggable
//! straight from the message without a debugger.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for Mirar operations
pub type MirarResult<T> = Result<T, MirarError>;

/// Rendered representations of the elements a selector matched.
///
/// Rendering happens when the error is constructed, via the adapter's
/// element printer, so displaying the error needs no adapter access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectedElements(pub Vec<String>);

impl SelectedElements {
    /// Number of matched elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the selector matched nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SelectedElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "[]");
        }
        writeln!(f, "[")?;
        for e in &self.0 {
            writeln!(f, "\t\t\"{e}\",")?;
        }
        write!(f, "\t]")
    }
}

/// Errors that can occur in Mirar
#[derive(Debug, Error)]
pub enum MirarError {
    /// A `.one` call matched nothing, or `.at` was called on an empty match set
    #[error(
        "zero elements returned by selector\n\tSelector: \"{selector}\"\n\tRoot: \"{root}\"\n\tSelected: {selected}"
    )]
    ZeroSelectedElements {
        /// Rendered selector
        selector: String,
        /// Rendered root element
        root: String,
        /// Rendered matched elements (always empty here)
        selected: SelectedElements,
    },

    /// A `.one` call matched more than one element
    #[error(
        "multiple elements returned by selector\n\tSelector: \"{selector}\"\n\tRoot: \"{root}\"\n\tSelected: {selected}"
    )]
    MultipleSelectedElements {
        /// Rendered selector
        selector: String,
        /// Rendered root element
        root: String,
        /// Rendered matched elements
        selected: SelectedElements,
    },

    /// `.at(n)` requested an element past the end of the match set
    #[error(
        "index out of bounds\n\tIndex: {index}\n\tSelector: \"{selector}\"\n\tRoot: \"{root}\"\n\tSelected: {selected}"
    )]
    IndexOutOfBounds {
        /// Requested 1-based index
        index: usize,
        /// Rendered selector
        selector: String,
        /// Rendered root element
        root: String,
        /// Rendered matched elements
        selected: SelectedElements,
    },

    /// A parameterized selector was materialized or rendered with the wrong
    /// number of arguments
    #[error("parameterized selector arity mismatch: expected {expected} selector argument(s), got {supplied}")]
    SelectorArityMismatch {
        /// Declared parameter count
        expected: usize,
        /// Arguments actually supplied
        supplied: usize,
    },

    /// The right operand of a composition had a parameterized selector.
    ///
    /// Only the leftmost (outermost) view of a composition may defer its
    /// selector; there is no way for a nested view to receive arguments.
    #[error("cannot compose: the right-hand view has a parameterized selector")]
    ParameterizedCompose,

    /// Lookup of an action name that the view never declared
    #[error("unknown action \"{name}\" (declared actions: {declared:?})")]
    UnknownAction {
        /// Requested action name
        name: String,
        /// Names the view actually declares
        declared: Vec<String>,
    },

    /// Lookup of an aggregate name that the view never declared
    #[error("unknown aggregate \"{name}\" (declared aggregates: {declared:?})")]
    UnknownAggregate {
        /// Requested aggregate name
        name: String,
        /// Names the view actually declares
        declared: Vec<String>,
    },
}

impl MirarError {
    /// The rendered matched-element set carried by a cardinality error, if any
    #[must_use]
    pub fn selected(&self) -> Option<&SelectedElements> {
        match self {
            Self::ZeroSelectedElements { selected, .. }
            | Self::MultipleSelectedElements { selected, .. }
            | Self::IndexOutOfBounds { selected, .. } => Some(selected),
            _ => None,
        }
    }
}
