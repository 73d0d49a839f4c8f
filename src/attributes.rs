//! Built-in per-attribute rules.
//!
//! Rules run in a fixed order and the first one that rejects an attribute
//! decides the outcome:
//!
//! 1. name allowlists (generic prefixes, per-tag and generic attributes,
//!    attributes admitted by value or class allowlists)
//! 2. exact value allowlist for the `(tag, attribute)` pair
//! 3. scheme and relative-URL checks for URL-valued attributes
//! 4. `class` token filtering and `style` declaration filtering

use std::borrow::Cow;

use crate::class::filter_classes;
use crate::policy::Policy;
use crate::report::RemovalReason;
use crate::style::filter_style;
use crate::url_check::{check_url, is_url_attribute};

/// Outcome of the built-in rules for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Keep the attribute unchanged
    Keep,
    /// Keep the attribute with a new value
    Replace(String),
    /// Drop the attribute
    Remove(RemovalReason),
}

pub(crate) fn filter_attribute(policy: &Policy, tag: &str, name: &str, value: &str) -> Verdict {
    if !policy.is_attribute_allowed(tag, name) {
        return Verdict::Remove(RemovalReason::NotAllowed);
    }

    if let Some(values) = policy
        .tag_attribute_values
        .get(tag)
        .and_then(|attrs| attrs.get(name))
    {
        if !values.contains(value) {
            return Verdict::Remove(RemovalReason::ValueNotAllowed);
        }
    }

    let mut current = Cow::Borrowed(value);

    if is_url_attribute(tag, name) {
        match check_url(policy, value) {
            Ok(checked) => current = checked,
            Err(reason) => return Verdict::Remove(reason),
        }
    }

    match name {
        "class" => {
            if let Some(allowed) = &policy.allowed_classes {
                match filter_classes(tag, &current, allowed) {
                    Some(classes) => current = Cow::Owned(classes),
                    None => return Verdict::Remove(RemovalReason::NoAllowedClasses),
                }
            }
        }
        "style" => {
            if let Some(allowed) = &policy.filter_style_properties {
                current = Cow::Owned(filter_style(&current, allowed));
            }
        }
        _ => {}
    }

    if current == value {
        Verdict::Keep
    } else {
        Verdict::Replace(current.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PolicyBuilder;

    #[test]
    fn event_handlers_are_removed() {
        let policy = Policy::default();

        assert_eq!(
            filter_attribute(&policy, "img", "onerror", "alert(1)"),
            Verdict::Remove(RemovalReason::NotAllowed)
        );
        assert_eq!(filter_attribute(&policy, "img", "src", ""), Verdict::Keep);
    }

    #[test]
    fn generic_prefix_allows_any_tag() {
        let policy = PolicyBuilder::new()
            .generic_attribute_prefixes(["data-"])
            .build()
            .unwrap();

        assert_eq!(filter_attribute(&policy, "div", "data-v", "foo"), Verdict::Keep);
        assert_eq!(
            filter_attribute(&policy, "div", "datav", "foo"),
            Verdict::Remove(RemovalReason::NotAllowed)
        );
    }

    #[test]
    fn value_allowlist_admits_and_restricts() {
        let policy = PolicyBuilder::new()
            .add_tags(["my-tag"])
            .add_tag_attribute_values("my-tag", "my-attr", ["val"])
            .build()
            .unwrap();

        assert_eq!(filter_attribute(&policy, "my-tag", "my-attr", "val"), Verdict::Keep);
        assert_eq!(
            filter_attribute(&policy, "my-tag", "my-attr", "VAL"),
            Verdict::Remove(RemovalReason::ValueNotAllowed)
        );
    }

    #[test]
    fn value_allowlist_restricts_listed_attribute() {
        let policy = PolicyBuilder::new()
            .add_tag_attribute_values("ol", "start", ["1"])
            .build()
            .unwrap();

        assert_eq!(filter_attribute(&policy, "ol", "start", "1"), Verdict::Keep);
        assert_eq!(
            filter_attribute(&policy, "ol", "start", "5"),
            Verdict::Remove(RemovalReason::ValueNotAllowed)
        );
    }

    #[test]
    fn javascript_href_is_removed() {
        let policy = Policy::default();

        assert_eq!(
            filter_attribute(&policy, "a", "href", "javascript:alert(1)"),
            Verdict::Remove(RemovalReason::UrlScheme)
        );
    }

    #[test]
    fn class_is_filtered_when_active() {
        let policy = PolicyBuilder::new()
            .add_allowed_classes("span", ["a"])
            .build()
            .unwrap();

        assert_eq!(
            filter_attribute(&policy, "span", "class", "a b c"),
            Verdict::Replace("a".into())
        );
        assert_eq!(
            filter_attribute(&policy, "div", "class", "a"),
            Verdict::Remove(RemovalReason::NotAllowed)
        );
    }

    #[test]
    fn generic_class_is_removed_for_unlisted_tag() {
        let policy = PolicyBuilder::new()
            .add_generic_attributes(["class"])
            .add_allowed_classes("span", ["a"])
            .build()
            .unwrap();

        assert_eq!(
            filter_attribute(&policy, "div", "class", "a"),
            Verdict::Remove(RemovalReason::NoAllowedClasses)
        );
    }

    #[test]
    fn style_is_filtered_when_configured() {
        let policy = PolicyBuilder::new()
            .add_tag_attributes("span", ["style"])
            .filter_style_properties(["color"])
            .build()
            .unwrap();

        assert_eq!(
            filter_attribute(&policy, "span", "style", "color: red; position: fixed"),
            Verdict::Replace("color:red".into())
        );
        assert_eq!(
            filter_attribute(&policy, "span", "style", "border: none"),
            Verdict::Replace(String::new())
        );
    }

    #[test]
    fn style_passes_through_without_property_filter() {
        let policy = PolicyBuilder::new()
            .add_tag_attributes("span", ["style"])
            .build()
            .unwrap();

        assert_eq!(
            filter_attribute(&policy, "span", "style", "position: fixed"),
            Verdict::Keep
        );
    }
}
