//! Engine-test adapter: selectors are regexes, elements are strings.
//!
//! Selector composition is string concatenation (trivially associative) and
//! running a selector collects every non-overlapping match in the root, so
//! the whole cardinality protocol is exercisable from plain string fixtures.

use regex::Regex;

use crate::adapter::{Adapter, DefaultViewSpec, DefaultViewSpecs};
use crate::view::Views;

/// Adapter over plain strings for the engine's own tests
#[derive(Debug, Clone, Copy)]
pub struct TextAdapter;

impl Adapter for TextAdapter {
    type Selector = String;
    type Element = String;
    type Group = Vec<String>;

    fn compose_selectors(&self, first: &String, second: &String) -> String {
        format!("{first}{second}")
    }

    fn run_selector(&self, selector: &String, root: &String) -> Vec<String> {
        Regex::new(selector).map_or_else(
            |_| Vec::new(),
            |re| re.find_iter(root).map(|m| m.as_str().to_string()).collect(),
        )
    }

    fn iterate_selector<R>(&self, group: Vec<String>, f: impl FnMut(String) -> R) -> Vec<R> {
        group.into_iter().map(f).collect()
    }

    fn print_selector(&self, selector: &String) -> String {
        selector.clone()
    }

    fn print_element(&self, element: &String) -> String {
        element.clone()
    }
}

/// The text adapter declares no real controls; the default specs are inert
/// placeholders, mirroring how the engine tests never touch them.
fn empty_specs() -> DefaultViewSpecs<TextAdapter> {
    DefaultViewSpecs {
        checkbox: DefaultViewSpec::new(String::new()),
        radio: DefaultViewSpec::new(String::new()),
        text_input: DefaultViewSpec::new(String::new()),
        single_select: DefaultViewSpec::new(String::new()),
        multi_select: DefaultViewSpec::new(String::new()),
        form: DefaultViewSpec::new(String::new()),
        button: DefaultViewSpec::new(String::new()),
    }
}

/// A view factory over the text adapter
pub fn text_views() -> Views<TextAdapter> {
    Views::new(TextAdapter, empty_specs())
}
