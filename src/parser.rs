//! HTML5 fragment parsing.
//!
//! Tokenizing and tree construction are delegated to html5ever, which
//! recovers from malformed markup the same way browsers do. The resulting
//! `RcDom` is converted into the crate's owned [`Fragment`].

use html5ever::tendril::TendrilSink;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::dom::{Attributes, Element, Fragment, Node};

pub(crate) const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements nested deeper than this are flattened.
///
/// Past the limit each element is kept with its text and comments, and its
/// descendant elements follow it as siblings in document order.
pub const MAX_DEPTH: usize = 512;

/// Parses `html` as the content of a `<div>` element.
///
/// Never fails: unclosed tags, implicit tags and misnested markup are
/// resolved by the HTML5 tree construction rules.
///
/// # Examples
///
/// ```
/// use html_policy::{parse_fragment, Node};
///
/// let fragment = parse_fragment("<p>one<p>two");
/// assert_eq!(fragment.nodes.len(), 2);
/// assert!(matches!(&fragment.nodes[0], Node::Element(el) if el.name == "p"));
/// ```
pub fn parse_fragment(html: &str) -> Fragment {
    let dom = parse_dom(html);
    let mut nodes = Vec::new();
    if let Some(root) = fragment_root(&dom) {
        for child in root.children.borrow().iter() {
            convert(child, 0, &mut nodes);
        }
    }
    Fragment::new(nodes)
}

/// Runs the html5ever fragment parser over `html`.
pub(crate) fn parse_dom(html: &str) -> RcDom {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("div"),
    );
    html5ever::parse_fragment(RcDom::default(), Default::default(), context, Vec::new()).one(html)
}

/// Returns the synthetic `<html>` element holding the parsed fragment.
pub(crate) fn fragment_root(dom: &RcDom) -> Option<Handle> {
    dom.document
        .children
        .borrow()
        .iter()
        .find(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
}

fn convert(handle: &Handle, depth: usize, out: &mut Vec<Node>) {
    match &handle.data {
        NodeData::Text { contents } => {
            let text = contents.borrow();
            // The tree builder merges adjacent text, but a dropped sibling
            // can still leave two text nodes side by side.
            if let Some(Node::Text(prev)) = out.last_mut() {
                prev.push_str(&text);
            } else {
                out.push(Node::Text(text.to_string()));
            }
        }
        NodeData::Comment { contents } => out.push(Node::Comment(contents.to_string())),
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            if depth >= MAX_DEPTH {
                tracing::debug!(element = %name.local, depth, "flattening deeply nested element");
                flatten(handle, out);
                return;
            }

            let mut element = Element {
                name: name.local.to_string(),
                attributes: convert_attributes(&attrs.borrow()),
                children: Vec::new(),
            };

            // <template> keeps its content in a separate document fragment.
            let contents = template_contents.borrow();
            let source = contents.as_ref().unwrap_or(handle);
            for child in source.children.borrow().iter() {
                convert(child, depth + 1, &mut element.children);
            }

            out.push(Node::Element(element));
        }
        NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {}
    }
}

fn convert_attributes(attrs: &[Attribute]) -> Attributes {
    attrs
        .iter()
        .map(|attr| {
            let name = match &attr.name.prefix {
                Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                None => attr.name.local.to_string(),
            };
            (name, attr.value.to_string())
        })
        .collect()
}

/// Emits `handle` and every element below it as a flat list, in preorder.
/// Text and comments stay with their parent element.
fn flatten(handle: &Handle, out: &mut Vec<Node>) {
    let mut stack = vec![handle.clone()];
    while let Some(handle) = stack.pop() {
        let NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } = &handle.data
        else {
            continue;
        };

        let mut element = Element {
            name: name.local.to_string(),
            attributes: convert_attributes(&attrs.borrow()),
            children: Vec::new(),
        };

        let mut nested = Vec::new();
        let contents = template_contents.borrow();
        let source = contents.as_ref().unwrap_or(&handle);
        for child in source.children.borrow().iter() {
            match child.data {
                NodeData::Element { .. } => nested.push(child.clone()),
                _ => convert(child, MAX_DEPTH, &mut element.children),
            }
        }

        out.push(Node::Element(element));
        stack.extend(nested.into_iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        node.as_element().expect("expected element")
    }

    #[test]
    fn parses_text_only() {
        let fragment = parse_fragment("plain text");
        assert_eq!(fragment.nodes, vec![Node::Text("plain text".into())]);
    }

    #[test]
    fn lowercases_names_and_keeps_attribute_order() {
        let fragment = parse_fragment("<A HREF='/x' Title=t ID=i>x</A>");

        let a = element(&fragment.nodes[0]);
        assert_eq!(a.name, "a");
        assert_eq!(a.attributes.names(), vec!["href", "title", "id"]);
    }

    #[test]
    fn recovers_unclosed_tags() {
        let fragment = parse_fragment("<b><i>x");

        let b = element(&fragment.nodes[0]);
        let i = element(&b.children[0]);
        assert_eq!(i.children, vec![Node::Text("x".into())]);
    }

    #[test]
    fn duplicate_attributes_keep_first() {
        let fragment = parse_fragment("<span a=1 a=2></span>");

        let span = element(&fragment.nodes[0]);
        assert_eq!(span.attributes.get("a"), Some("1"));
        assert_eq!(span.attributes.len(), 1);
    }

    #[test]
    fn keeps_comments() {
        let fragment = parse_fragment("a<!-- note -->b");
        assert_eq!(fragment.nodes[1], Node::Comment(" note ".into()));
    }

    #[test]
    fn template_contents_become_children() {
        let fragment = parse_fragment("<template><b>x</b></template>");

        let template = element(&fragment.nodes[0]);
        assert_eq!(template.name, "template");
        assert_eq!(element(&template.children[0]).name, "b");
    }

    #[test]
    fn script_content_is_text() {
        let fragment = parse_fragment("<script>if (a < b) {}</script>");

        let script = element(&fragment.nodes[0]);
        assert_eq!(script.children, vec![Node::Text("if (a < b) {}".into())]);
    }

    #[test]
    fn deep_nesting_is_flattened() {
        let html = "<span>".repeat(MAX_DEPTH + 10);
        let fragment = parse_fragment(&html);

        let mut current = &fragment.nodes;
        for _ in 0..MAX_DEPTH {
            assert_eq!(current.len(), 1);
            current = &element(&current[0]).children;
        }
        assert_eq!(current.len(), 10);
        assert!(current.iter().all(|node| element(node).children.is_empty()));
    }

    #[test]
    fn deep_text_is_kept_with_its_element() {
        let html = format!("{}<i>a<b>b</b>c</i>", "<span>".repeat(MAX_DEPTH));
        let fragment = parse_fragment(&html);

        let mut current = &fragment.nodes;
        for _ in 0..MAX_DEPTH {
            current = &element(&current[0]).children;
        }
        let i = element(&current[0]);
        assert_eq!(i.name, "i");
        assert_eq!(i.children, vec![Node::Text("ac".into())]);
        let b = element(&current[1]);
        assert_eq!(b.children, vec![Node::Text("b".into())]);
    }
}
