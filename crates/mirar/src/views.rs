//! The default view library.
//!
//! A fixed catalog of common UI controls, wrapped uniformly through the view
//! constructor so every adapter gets equivalent test behavior for free. The
//! adapter supplies only raw material (a selector and native actions per
//! control, as [`DefaultViewSpecs`]); the behavioral contracts are the
//! adapter's responsibility and are pinned down by the acceptance tests in
//! this module.
//!
//! | View | Actions |
//! |---|---|
//! | `checkbox` | `toggle`, `is_checked`, `get_value` |
//! | `radio` | `select`, `get_selected_value` |
//! | `text_input` | `enter_text(text)`, `get_text` |
//! | `single_select` | `select(value)`, `get_selection` |
//! | `multi_select` | `select(values)`, `get_selection` |
//! | `form` | `submit` |
//! | `button` | `click` |

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::adapter::{Adapter, DefaultViewSpec, DefaultViewSpecs};
use crate::view::{SelectorSpec, View};

/// The default view catalog, wrapped for one adapter.
///
/// Each member is an ordinary [`View`]: it composes with user views and
/// materializes like any other.
pub struct DefaultViews<A: Adapter> {
    /// Checkbox-like controls
    pub checkbox: View<A>,
    /// Radio-button controls
    pub radio: View<A>,
    /// Single-line and multi-line text entry
    pub text_input: View<A>,
    /// Single-choice selection controls
    pub single_select: View<A>,
    /// Multi-choice selection controls
    pub multi_select: View<A>,
    /// Form containers
    pub form: View<A>,
    /// Clickable buttons
    pub button: View<A>,
}

impl<A: Adapter> fmt::Debug for DefaultViews<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultViews").finish_non_exhaustive()
    }
}

fn wrap<A: Adapter>(adapter: &Rc<A>, spec: DefaultViewSpec<A>) -> View<A> {
    View::from_parts(
        Rc::clone(adapter),
        SelectorSpec::Concrete(spec.selector),
        spec.actions,
        BTreeMap::new(),
    )
}

impl<A: Adapter> DefaultViews<A> {
    pub(crate) fn from_specs(adapter: &Rc<A>, specs: DefaultViewSpecs<A>) -> Self {
        Self {
            checkbox: wrap(adapter, specs.checkbox),
            radio: wrap(adapter, specs.radio),
            text_input: wrap(adapter, specs.text_input),
            single_select: wrap(adapter, specs.single_select),
            multi_select: wrap(adapter, specs.multi_select),
            form: wrap(adapter, specs.form),
            button: wrap(adapter, specs.button),
        }
    }
}
