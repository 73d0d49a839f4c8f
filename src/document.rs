use std::fmt;
use std::io;

use crate::dom::{Fragment, Node};
use crate::report::CleanReport;
use crate::serializer::{serialize_nodes, serialize_to_string};

/// A sanitized fragment together with the changes made to produce it.
///
/// Use [`Display`](fmt::Display) (or `to_string`) to get the HTML.
#[derive(Debug, Clone, Default)]
pub struct Document {
    fragment: Fragment,
    report: CleanReport,
}

impl Document {
    pub(crate) fn new(fragment: Fragment, report: CleanReport) -> Self {
        Self { fragment, report }
    }

    /// The sanitized top-level nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.fragment.nodes
    }

    /// What the sanitizer changed, in document order.
    pub fn report(&self) -> &CleanReport {
        &self.report
    }

    /// Consumes the document, returning the sanitized tree.
    pub fn into_fragment(self) -> Fragment {
        self.fragment
    }

    /// Serializes the document into `writer`.
    ///
    /// # Errors
    ///
    /// Returns any error produced by `writer`.
    pub fn write_to<W: io::Write>(&self, writer: W) -> io::Result<()> {
        serialize_nodes(writer, &self.fragment.nodes)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_to_string(&self.fragment.nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn sample() -> Document {
        let fragment = Fragment::new(vec![
            Node::Element(Element::new("b").with_child(Node::Text("bold".into()))),
            Node::Text(" & more".into()),
        ]);
        Document::new(fragment, CleanReport::new())
    }

    #[test]
    fn displays_as_html() {
        assert_eq!(sample().to_string(), "<b>bold</b> &amp; more");
    }

    #[test]
    fn write_to_matches_display() {
        let mut buf = Vec::new();
        sample().write_to(&mut buf).unwrap();

        assert_eq!(String::from_utf8(buf).unwrap(), sample().to_string());
    }

    #[test]
    fn into_fragment_returns_nodes() {
        let document = sample();
        assert_eq!(document.nodes().len(), 2);
        assert_eq!(document.into_fragment().nodes.len(), 2);
    }
}
