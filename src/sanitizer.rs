//! The tree sanitizer.
//!
//! Walks the owned tree depth-first, pre-order. Elements outside the tag
//! allowlist are unwrapped, or removed with their subtree when they are
//! clean-content tags. Kept elements have their attributes filtered before
//! their children are visited.

use crate::attributes::{filter_attribute, Verdict};
use crate::document::Document;
use crate::dom::{Element, Fragment, Node};
use crate::filter::invoke_isolated;
use crate::link::apply_link_rel;
use crate::logging::CleanLog;
use crate::parser::parse_fragment;
use crate::policy::Policy;
use crate::report::{CleanReport, RemovalReason};

impl Policy {
    /// Parses and sanitizes `html`.
    ///
    /// Never fails. Malformed markup is recovered by the parser and a failing
    /// attribute filter only affects the attribute it was called for.
    ///
    /// # Examples
    ///
    /// ```
    /// use html_policy::Policy;
    ///
    /// let document = Policy::default().clean("<b><img src='' onerror='alert(1)'>x</b>");
    ///
    /// assert_eq!(document.to_string(), r#"<b><img src="">x</b>"#);
    /// assert_eq!(document.report().len(), 1);
    /// ```
    pub fn clean(&self, html: &str) -> Document {
        self.clean_fragment(parse_fragment(html))
    }

    /// Parses, sanitizes and serializes `html`.
    pub fn clean_to_string(&self, html: &str) -> String {
        self.clean(html).to_string()
    }

    /// Sanitizes an already parsed fragment.
    pub fn clean_fragment(&self, fragment: Fragment) -> Document {
        let span = tracing::debug_span!("clean", roots = fragment.nodes.len());
        let _guard = span.enter();

        let mut report = CleanReport::new();
        let nodes = {
            let mut log = CleanLog::new(&mut report);
            sanitize_nodes(fragment.nodes, self, &mut log)
        };

        tracing::debug!(changes = report.len(), "sanitized fragment");
        Document::new(Fragment::new(nodes), report)
    }
}

/// Sanitizes a list of sibling nodes.
pub(crate) fn sanitize_nodes(
    nodes: Vec<Node>,
    policy: &Policy,
    log: &mut CleanLog<'_>,
) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        sanitize_node(node, policy, log, &mut out);
    }
    out
}

fn sanitize_node(node: Node, policy: &Policy, log: &mut CleanLog<'_>, out: &mut Vec<Node>) {
    match node {
        Node::Text(text) => push_text(out, text),
        Node::Comment(text) => {
            if policy.strip_comments {
                log.comment_removed();
            } else {
                out.push(Node::Comment(text));
            }
        }
        Node::Element(mut element) => {
            if !policy.tags.contains(&element.name) {
                if policy.clean_content_tags.contains(&element.name) {
                    log.subtree_removed(&element.name);
                    return;
                }
                log.tag_unwrapped(&element.name);
                for child in element.children {
                    sanitize_node(child, policy, log, out);
                }
                return;
            }

            sanitize_attributes(&mut element, policy, log);
            let children = std::mem::take(&mut element.children);
            element.children = sanitize_nodes(children, policy, log);
            out.push(Node::Element(element));
        }
    }
}

/// Unwrapping can leave text next to text; keep them as one node.
fn push_text(out: &mut Vec<Node>, text: String) {
    if let Some(Node::Text(prev)) = out.last_mut() {
        prev.push_str(&text);
    } else {
        out.push(Node::Text(text));
    }
}

fn sanitize_attributes(element: &mut Element, policy: &Policy, log: &mut CleanLog<'_>) {
    let tag = element.name.clone();
    let tag = tag.as_str();

    // 1. Built-in per-attribute rules
    element.attributes.retain(|name, value| {
        match filter_attribute(policy, tag, name, value.as_str()) {
            Verdict::Keep => true,
            Verdict::Replace(new_value) => {
                log.attribute_rewritten(tag, name);
                *value = new_value;
                true
            }
            Verdict::Remove(reason) => {
                log.attribute_removed(tag, name, reason);
                false
            }
        }
    });

    // 2. Forced values
    if let Some(forced) = policy.set_tag_attribute_values.get(tag) {
        for (name, value) in forced {
            if element.attributes.get(name) != Some(value.as_str()) {
                element.attributes.set(name.clone(), value.clone());
                log.attribute_set(tag, name);
            }
        }
    }

    // 3. Link relation, once per element
    if apply_link_rel(element, policy.link_rel()) {
        log.attribute_set(tag, "rel");
    }

    // 4. User hook, last
    if let Some(filter) = &policy.attribute_filter {
        element.attributes.retain(|name, value| {
            match invoke_isolated(filter.as_ref(), tag, name, value.as_str()) {
                Ok(Some(new_value)) => {
                    if new_value != *value {
                        log.attribute_rewritten(tag, name);
                        *value = new_value;
                    }
                    true
                }
                Ok(None) => {
                    log.attribute_removed(tag, name, RemovalReason::AttributeFilter);
                    false
                }
                Err(error) => {
                    log.hook_failed(tag, name, &error);
                    true
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PolicyBuilder;
    use crate::error::FilterError;
    use crate::report::CleanEventKind;

    fn clean_with(policy: &Policy, html: &str) -> String {
        policy.clean_to_string(html)
    }

    #[test]
    fn strips_event_handlers_and_keeps_empty_src() {
        let out = clean_with(
            &Policy::default(),
            "<b><img src='' onerror='alert(\\'hax\\')'>I'm not trying to XSS you</b>",
        );
        assert_eq!(out, "<b><img src=\"\">I'm not trying to XSS you</b>");
    }

    #[test]
    fn disallowed_tags_are_unwrapped() {
        let policy = PolicyBuilder::new().tags(["img"]).build().unwrap();

        let out = clean_with(&policy, "<b><img src='' onerror='x'>text</b>");
        assert_eq!(out, "<img src=\"\">text");
    }

    #[test]
    fn unwrapping_is_recursive() {
        let policy = PolicyBuilder::new().tags(["b"]).build().unwrap();

        let out = clean_with(&policy, "<div><span>a<b>b</b><script>c</script></span>d</div>");
        assert_eq!(out, "a<b>b</b>d");
    }

    #[test]
    fn clean_content_tags_drop_subtree() {
        let out = clean_with(
            &Policy::default(),
            "<script>alert('hello')</script><style>a { background: #fff }</style>",
        );
        assert_eq!(out, "");
    }

    #[test]
    fn allowed_tag_wins_over_clean_content() {
        let policy = PolicyBuilder::new()
            .add_tags(["style"])
            .build()
            .unwrap();

        let out = clean_with(&policy, "<style>p{}</style>");
        assert_eq!(out, "<style>p{}</style>");
    }

    #[test]
    fn links_get_rel() {
        let out = clean_with(&Policy::default(), "<a href='https://baidu.com'>baidu</a>");
        assert_eq!(
            out,
            r#"<a href="https://baidu.com" rel="noopener noreferrer">baidu</a>"#
        );
    }

    #[test]
    fn disabled_link_rel_keeps_anchor_plain() {
        let policy = PolicyBuilder::new().link_rel(None::<String>).build().unwrap();

        let out = clean_with(&policy, "<a href='https://baidu.com'>baidu</a>");
        assert_eq!(out, r#"<a href="https://baidu.com">baidu</a>"#);
    }

    #[test]
    fn javascript_links_lose_href_and_rel() {
        let out = clean_with(&Policy::default(), "<a href='javascript:alert(1)'>x</a>");
        assert_eq!(out, "<a>x</a>");
    }

    #[test]
    fn forced_values_are_added() {
        let policy = PolicyBuilder::new()
            .add_tags(["my-tag"])
            .set_tag_attribute_value("my-tag", "my-attr", "val")
            .build()
            .unwrap();

        let out = clean_with(&policy, "<my-tag>");
        assert_eq!(out, r#"<my-tag my-attr="val"></my-tag>"#);
    }

    #[test]
    fn forced_values_overwrite_in_place() {
        let policy = PolicyBuilder::new()
            .set_tag_attribute_value("img", "alt", "image")
            .build()
            .unwrap();

        let out = clean_with(&policy, "<img alt='x' src='/a.png'>");
        assert_eq!(out, r#"<img alt="image" src="/a.png">"#);
    }

    #[test]
    fn classes_are_filtered_per_tag() {
        let policy = PolicyBuilder::new()
            .add_allowed_classes("a", ["b", "c"])
            .add_allowed_classes("span", ["a"])
            .build()
            .unwrap();

        let out = clean_with(
            &policy,
            "<span class='a b c'><a href='.' class='c b a'>T</a></span><div class='a b c'>U</div>",
        );
        assert_eq!(
            out,
            concat!(
                r#"<span class="a"><a href="." class="c b" rel="noopener noreferrer">T</a></span>"#,
                "<div>U</div>"
            )
        );
    }

    #[test]
    fn style_properties_are_filtered() {
        let policy = PolicyBuilder::new()
            .attributes([("span", ["style"])])
            .filter_style_properties(["color", "font-size"])
            .build()
            .unwrap();

        let out = clean_with(
            &policy,
            "<span style='color: red; position: fixed; font-size: var(--something)'>T</span>\
             <span style='border: none'></span><div style='color: red'></div>",
        );
        assert_eq!(
            out,
            concat!(
                r#"<span style="color:red;font-size:var(--something)">T</span>"#,
                r#"<span style=""></span><div></div>"#
            )
        );
    }

    #[test]
    fn hook_removes_and_rewrites() {
        let policy = PolicyBuilder::new()
            .link_rel(None::<String>)
            .attribute_filter(|element: &str, attribute: &str, value: &str| {
                if element == "img" && attribute == "src" {
                    return Ok(None);
                }
                Ok(Some(value.to_string()))
            })
            .build()
            .unwrap();

        let out = clean_with(&policy, "<a href=/><img alt=Home src=foo></a>");
        assert_eq!(out, r#"<a href="/"><img alt="Home"></a>"#);
    }

    #[test]
    fn hook_sees_injected_attributes() {
        let policy = PolicyBuilder::new()
            .attribute_filter(|_: &str, attribute: &str, value: &str| {
                if attribute == "rel" {
                    return Ok(Some(format!("{} nofollow", value)));
                }
                Ok(Some(value.to_string()))
            })
            .build()
            .unwrap();

        let out = clean_with(&policy, "<a href='/'>x</a>");
        assert_eq!(out, r#"<a href="/" rel="noopener noreferrer nofollow">x</a>"#);
    }

    #[test]
    fn failing_hook_keeps_prior_value() {
        let policy = PolicyBuilder::new()
            .link_rel(None::<String>)
            .attribute_filter(|_: &str, attribute: &str, _: &str| {
                if attribute == "alt" {
                    return Err(FilterError::new("unexpected value"));
                }
                Ok(None)
            })
            .build()
            .unwrap();

        let document = policy.clean("<img alt=Home src=foo><img alt=Away>");
        assert_eq!(document.to_string(), r#"<img alt="Home"><img alt="Away">"#);
        assert_eq!(document.report().count(CleanEventKind::HookFailed), 2);
    }

    #[test]
    fn panicking_hook_does_not_abort() {
        let policy = PolicyBuilder::new()
            .link_rel(None::<String>)
            .attribute_filter(|_: &str, attribute: &str, value: &str| {
                if attribute == "href" {
                    panic!("hook bug");
                }
                Ok(Some(value.to_uppercase()))
            })
            .build()
            .unwrap();

        let out = clean_with(&policy, "<a href='/x' title='t'>x</a>");
        assert_eq!(out, r#"<a href="/x" title="T">x</a>"#);
    }

    #[test]
    fn comments_follow_policy() {
        assert_eq!(clean_with(&Policy::default(), "a<!-- x -->b"), "ab");

        let keep = PolicyBuilder::new().strip_comments(false).build().unwrap();
        assert_eq!(clean_with(&keep, "a<!-- x -->b"), "a<!-- x -->b");
    }

    #[test]
    fn report_lists_changes() {
        let document =
            Policy::default().clean("<font color=red>x</font><b onclick=y>z</b><!--c-->");
        let report = document.report();

        assert_eq!(report.count(CleanEventKind::TagUnwrapped), 1);
        assert_eq!(report.count(CleanEventKind::AttributeRemoved), 1);
        assert_eq!(report.count(CleanEventKind::CommentRemoved), 1);
        assert_eq!(report.events()[1].attribute(), Some("onclick"));
    }

    #[test]
    fn clean_input_produces_empty_report() {
        let document = Policy::default().clean("<p>hello <b>world</b></p>");
        assert!(document.report().is_empty());
    }

    #[test]
    fn clean_fragment_accepts_built_trees() {
        let tree = Fragment::new(vec![Node::Element(
            Element::new("iframe")
                .with_attribute("src", "https://evil")
                .with_child(Node::Text("fallback".into())),
        )]);

        let document = Policy::default().clean_fragment(tree);
        assert_eq!(document.to_string(), "fallback");
    }
}
