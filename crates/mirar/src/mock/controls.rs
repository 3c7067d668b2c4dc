//! Default view specs for the mock controls.
//!
//! Raw selectors and actions in the shape the core's default view library
//! expects. The behavioral contracts live in the acceptance tests of
//! [`crate::views`]; the implementations here are deliberately the dumbest
//! thing that honors them, with every mutation firing the same event a real
//! DOM control would.

use serde_json::{json, Value};

use super::{MockAdapter, MockElement};
use crate::adapter::{DefaultViewSpec, DefaultViewSpecs};

fn radio_group_of(radio: &MockElement) -> Vec<MockElement> {
    // Group scope is the immediate siblings sharing this radio's name.
    // A radio without a name falls back to its id, so an unnamed radio is
    // a group of one.
    let name = radio
        .attr("name")
        .or_else(|| radio.attr("id"))
        .unwrap_or_default();
    radio.parent().map_or_else(Vec::new, |parent| {
        parent
            .children()
            .into_iter()
            .filter(|sibling| {
                sibling.tag() == "input"
                    && sibling.attr("type").as_deref() == Some("radio")
                    && sibling
                        .attr("name")
                        .or_else(|| sibling.attr("id"))
                        .unwrap_or_default()
                        == name
            })
            .collect()
    })
}

fn options_of(select: &MockElement) -> Vec<MockElement> {
    select
        .children()
        .into_iter()
        .filter(|child| child.tag() == "option")
        .collect()
}

fn option_value(option: &MockElement) -> String {
    option.attr("value").unwrap_or_default()
}

/// The mock adapter's default view library material
#[must_use]
pub fn default_view_specs() -> DefaultViewSpecs<MockAdapter> {
    DefaultViewSpecs {
        checkbox: DefaultViewSpec::new("input[type=checkbox]".into())
            .action("toggle", |e: &MockElement, _: &[Value]| {
                e.set_checked(!e.checked());
                e.fire("change");
                Value::Null
            })
            .action("is_checked", |e: &MockElement, _: &[Value]| {
                json!(e.checked())
            })
            .action("get_value", |e: &MockElement, _: &[Value]| {
                json!(e.attr("value").unwrap_or_default())
            }),

        radio: DefaultViewSpec::new("input[type=radio]".into())
            .action("select", |e: &MockElement, _: &[Value]| {
                for sibling in radio_group_of(e) {
                    sibling.set_checked(sibling.ptr_eq(e));
                }
                e.set_checked(true);
                e.fire("change");
                Value::Null
            })
            .action("get_selected_value", |e: &MockElement, _: &[Value]| {
                radio_group_of(e)
                    .into_iter()
                    .find(MockElement::checked)
                    .map_or(Value::Null, |checked| {
                        json!(checked.attr("value").unwrap_or_default())
                    })
            }),

        text_input: DefaultViewSpec::new("input[type=text], textarea".into())
            .action("enter_text", |e: &MockElement, args: &[Value]| {
                let text = args.first().and_then(Value::as_str).unwrap_or_default();
                e.set_value(text);
                e.fire("change");
                Value::Null
            })
            .action("get_text", |e: &MockElement, _: &[Value]| json!(e.value())),

        single_select: DefaultViewSpec::new("select[!multiple]".into())
            .action("select", |e: &MockElement, args: &[Value]| {
                let target = args.first().and_then(Value::as_str).unwrap_or_default();
                let options = options_of(e);
                // An unknown value leaves the selection untouched
                if options.iter().any(|o| option_value(o) == target) {
                    for option in &options {
                        option.set_selected(option_value(option) == target);
                    }
                    e.fire("change");
                }
                Value::Null
            })
            .action("get_selection", |e: &MockElement, _: &[Value]| {
                let options = options_of(e);
                options
                    .iter()
                    .find(|o| o.selected())
                    .or_else(|| options.first())
                    .map_or_else(|| json!(""), |o| json!(option_value(o)))
            }),

        multi_select: DefaultViewSpec::new("select[multiple]".into())
            .action("select", |e: &MockElement, args: &[Value]| {
                let values: Vec<String> = args
                    .first()
                    .and_then(Value::as_array)
                    .map(|vs| {
                        vs.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                let options = options_of(e);
                if !options.is_empty() {
                    for option in &options {
                        option.set_selected(values.contains(&option_value(option)));
                    }
                    e.fire("change");
                }
                Value::Null
            })
            .action("get_selection", |e: &MockElement, _: &[Value]| {
                let selected: Vec<String> = options_of(e)
                    .iter()
                    .filter(|o| o.selected())
                    .map(option_value)
                    .collect();
                json!(selected)
            }),

        form: DefaultViewSpec::new("form".into()).action(
            "submit",
            |e: &MockElement, _: &[Value]| {
                e.fire("submit");
                Value::Null
            },
        ),

        button: DefaultViewSpec::new(
            "button, input[type=button], input[type=submit]".into(),
        )
        .action("click", |e: &MockElement, _: &[Value]| {
            e.fire("click");
            Value::Null
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_group_is_sibling_scoped() {
        let left = MockElement::new("input")
            .with_attr("type", "radio")
            .with_attr("name", "side")
            .with_attr("value", "left");
        let right = MockElement::new("input")
            .with_attr("type", "radio")
            .with_attr("name", "side")
            .with_attr("value", "right");
        let other = MockElement::new("input")
            .with_attr("type", "radio")
            .with_attr("name", "elsewhere")
            .with_attr("value", "x");
        let _root = MockElement::new("form")
            .with_child(left.clone())
            .with_child(right.clone())
            .with_child(other.clone());

        let group = radio_group_of(&left);
        assert_eq!(group.len(), 2);
        assert!(group[0].ptr_eq(&left));
        assert!(group[1].ptr_eq(&right));
    }

    #[test]
    fn test_detached_radio_has_no_group() {
        let radio = MockElement::new("input").with_attr("type", "radio");
        assert!(radio_group_of(&radio).is_empty());
    }

    #[test]
    fn test_options_of_ignores_non_option_children() {
        let select = MockElement::new("select")
            .with_child(MockElement::new("option").with_attr("value", "a"))
            .with_child(MockElement::new("optgroup"))
            .with_child(MockElement::new("option").with_attr("value", "b"));
        assert_eq!(options_of(&select).len(), 2);
    }
}
