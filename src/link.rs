use crate::dom::Element;

/// Returns true for kept elements that navigate somewhere when activated.
pub(crate) fn is_link(element: &Element) -> bool {
    matches!(element.name.as_str(), "a" | "area") && element.attributes.contains("href")
}

/// Forces `rel` onto a link element.
///
/// Returns true if the attribute was added or its value changed. Elements
/// that are not links, and every element when `rel` is `None`, are left
/// untouched.
pub(crate) fn apply_link_rel(element: &mut Element, rel: Option<&str>) -> bool {
    let Some(rel) = rel else {
        return false;
    };
    if !is_link(element) || element.attributes.get("rel") == Some(rel) {
        return false;
    }
    element.attributes.set("rel", rel);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel_is_appended_to_links() {
        let mut a = Element::new("a").with_attribute("href", "https://x.com");

        assert!(apply_link_rel(&mut a, Some("noopener noreferrer")));
        assert_eq!(a.attributes.names(), vec!["href", "rel"]);
        assert_eq!(a.attributes.get("rel"), Some("noopener noreferrer"));
    }

    #[test]
    fn existing_rel_is_overwritten_in_place() {
        let mut a = Element::new("a")
            .with_attribute("rel", "opener")
            .with_attribute("href", "/");

        assert!(apply_link_rel(&mut a, Some("noopener")));
        assert_eq!(a.attributes.names(), vec!["rel", "href"]);
        assert_eq!(a.attributes.get("rel"), Some("noopener"));
    }

    #[test]
    fn anchors_without_href_are_not_links() {
        let mut a = Element::new("a").with_attribute("name", "top");

        assert!(!apply_link_rel(&mut a, Some("noopener")));
        assert!(!a.attributes.contains("rel"));
    }

    #[test]
    fn disabled_rule_leaves_rel_alone() {
        let mut a = Element::new("a")
            .with_attribute("href", "/")
            .with_attribute("rel", "author");

        assert!(!apply_link_rel(&mut a, None));
        assert_eq!(a.attributes.get("rel"), Some("author"));
    }

    #[test]
    fn area_is_a_link() {
        let area = Element::new("area").with_attribute("href", "/");
        assert!(is_link(&area));
        assert!(!is_link(&Element::new("img").with_attribute("href", "/")));
    }
}
