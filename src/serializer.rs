//! HTML serialization of the owned tree.
//!
//! The owned tree implements html5ever's [`Serialize`], so escaping, void
//! elements and raw-text handling come from html5ever's `HtmlSerializer`.
//! Every element is written in the HTML namespace and attribute names are
//! written as stored, prefix included.

use std::io;

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};

use crate::dom::{Element, Fragment, Node};
use crate::parser::HTML_NAMESPACE;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Parents whose text html5ever writes without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style",
    "script",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "noscript",
];

/// Returns true for elements that never have an end tag.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Serializes `nodes` into `writer`.
///
/// # Errors
///
/// Returns any error produced by `writer`.
pub fn serialize_nodes<W: io::Write>(writer: W, nodes: &[Node]) -> io::Result<()> {
    serialize(writer, &Nodes(nodes), SerializeOpts::default())
}

/// Serializes `nodes` into a new string.
///
/// # Examples
///
/// ```
/// use html_policy::{serialize_to_string, Element, Node};
///
/// let link = Element::new("a")
///     .with_attribute("href", "/?a=1&b=2")
///     .with_child(Node::Text("x < y".into()));
///
/// assert_eq!(
///     serialize_to_string(&[Node::Element(link)]),
///     r#"<a href="/?a=1&amp;b=2">x &lt; y</a>"#
/// );
/// ```
pub fn serialize_to_string(nodes: &[Node]) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = serialize_nodes(&mut buf, nodes);
    String::from_utf8_lossy(&buf).into_owned()
}

struct Nodes<'a>(&'a [Node]);

impl Serialize for Nodes<'_> {
    fn serialize<S>(&self, serializer: &mut S, _: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        for node in self.0 {
            write_node(serializer, node, None)?;
        }
        Ok(())
    }
}

impl Serialize for Fragment {
    fn serialize<S>(&self, serializer: &mut S, scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        Nodes(&self.nodes).serialize(serializer, scope)
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: &mut S, scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match (scope, self) {
            (TraversalScope::ChildrenOnly(_), Node::Element(el)) => {
                for child in &el.children {
                    write_node(serializer, child, Some(el.name.as_str()))?;
                }
                Ok(())
            }
            (TraversalScope::ChildrenOnly(_), _) => Ok(()),
            (TraversalScope::IncludeNode, node) => write_node(serializer, node, None),
        }
    }
}

fn write_node<S: Serializer>(
    serializer: &mut S,
    node: &Node,
    parent: Option<&str>,
) -> io::Result<()> {
    match node {
        Node::Text(text) => match parent {
            // Raw text may only come from a foreign-content element (an svg
            // <style>, say) that is rendered as its HTML namesake. An end-tag
            // opener would let it break out, so escape it up front; html5ever
            // then writes the escaped text verbatim.
            Some(p) if RAW_TEXT_ELEMENTS.contains(&p) && text.contains("</") => {
                serializer.write_text(&escape_text(text))
            }
            _ => serializer.write_text(text),
        },
        Node::Comment(text) => serializer.write_comment(text),
        Node::Element(el) => write_element(serializer, el),
    }
}

fn write_element<S: Serializer>(serializer: &mut S, el: &Element) -> io::Result<()> {
    let name = html_name(&el.name);
    let attr_names: Vec<(QualName, &str)> = el
        .attributes
        .iter()
        .map(|(name, value)| (attribute_name(name), value))
        .collect();

    serializer.start_elem(
        name.clone(),
        attr_names.iter().map(|(name, value)| (name, *value)),
    )?;

    if !is_void_element(&el.name) {
        // The parser drops one leading newline in these, so put it back.
        if matches!(el.name.as_str(), "pre" | "textarea" | "listing") {
            if let Some(Node::Text(text)) = el.children.first() {
                if text.starts_with('\n') {
                    serializer.write_text("\n")?;
                }
            }
        }
        for child in &el.children {
            write_node(serializer, child, Some(el.name.as_str()))?;
        }
    }

    serializer.end_elem(name)
}

fn html_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

fn attribute_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn escapes_text_but_not_quotes() {
        let out = serialize_to_string(&[text("I'm \"quoted\" & <b>")]);
        assert_eq!(out, "I'm \"quoted\" &amp; &lt;b&gt;");
    }

    #[test]
    fn quotes_attributes() {
        let el = Element::new("span").with_attribute("title", "say \"hi\"\u{a0}now <3");

        let out = serialize_to_string(&[Node::Element(el)]);
        assert_eq!(out, r#"<span title="say &quot;hi&quot;&nbsp;now <3"></span>"#);
    }

    #[test]
    fn prefixed_attribute_names_are_kept() {
        let el = Element::new("a").with_attribute("xlink:href", "#x");

        let out = serialize_to_string(&[Node::Element(el)]);
        assert_eq!(out, r##"<a xlink:href="#x"></a>"##);
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let img = Element::new("img").with_attribute("src", "");
        let br = Element::new("br").with_child(text("ignored"));

        let out = serialize_to_string(&[Node::Element(img), Node::Element(br)]);
        assert_eq!(out, r#"<img src=""><br>"#);
    }

    #[test]
    fn raw_text_is_not_escaped() {
        let style = Element::new("style").with_child(text("a > b { color: red }"));

        let out = serialize_to_string(&[Node::Element(style)]);
        assert_eq!(out, "<style>a > b { color: red }</style>");
    }

    #[test]
    fn raw_text_with_end_tag_is_escaped() {
        let style = Element::new("style").with_child(text("</style><img src=x>"));

        let out = serialize_to_string(&[Node::Element(style)]);
        assert_eq!(out, "<style>&lt;/style&gt;&lt;img src=x&gt;</style>");
    }

    #[test]
    fn comments_round_trip() {
        let out = serialize_to_string(&[Node::Comment(" hi ".into())]);
        assert_eq!(out, "<!-- hi -->");
    }

    #[test]
    fn pre_restores_leading_newline() {
        let pre = Element::new("pre").with_child(text("\nx"));

        let out = serialize_to_string(&[Node::Element(pre)]);
        assert_eq!(out, "<pre>\n\nx</pre>");
    }

    #[test]
    fn node_serializes_with_html5ever_driver() {
        let b = Node::Element(Element::new("b").with_child(text("x & y")));

        let mut outer = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::IncludeNode,
            ..Default::default()
        };
        serialize(&mut outer, &b, opts).unwrap();
        assert_eq!(String::from_utf8(outer).unwrap(), "<b>x &amp; y</b>");

        let mut inner = Vec::new();
        serialize(&mut inner, &b, SerializeOpts::default()).unwrap();
        assert_eq!(String::from_utf8(inner).unwrap(), "x &amp; y");

        let mut whole = Vec::new();
        let fragment = Fragment::new(vec![b, text("!")]);
        serialize(&mut whole, &fragment, SerializeOpts::default()).unwrap();
        assert_eq!(String::from_utf8(whole).unwrap(), "<b>x &amp; y</b>!");
    }
}
