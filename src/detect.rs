use markup5ever_rcdom::{Handle, NodeData};

use crate::parser;

/// Best-effort check for whether `src` contains markup.
///
/// The input is run through the fragment parser and reported as HTML when
/// any element or comment comes out of it. Plain text, including
/// text with character references or a stray `<`, is not HTML.
///
/// This is a heuristic for choosing between [`clean`](crate::clean) and
/// [`clean_text`](crate::clean_text). It is not a security boundary.
///
/// # Examples
///
/// ```
/// use html_policy::is_html;
///
/// assert!(!is_html("plain text"));
/// assert!(is_html("<p>html!</p>"));
/// ```
pub fn is_html(src: &str) -> bool {
    let dom = parser::parse_dom(src);
    parser::fragment_root(&dom).is_some_and(|root| has_markup(&root))
}

fn has_markup(node: &Handle) -> bool {
    node.children
        .borrow()
        .iter()
        .any(|child| matches!(child.data, NodeData::Element { .. } | NodeData::Comment { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_html() {
        assert!(!is_html("plain text"));
        assert!(!is_html(""));
        assert!(!is_html("1 < 2 & 3 > 2"));
        assert!(!is_html("fish &amp; chips"));
    }

    #[test]
    fn tags_are_html() {
        assert!(is_html("<p>html!</p>"));
        assert!(is_html("text then <br>"));
        assert!(is_html("<my-element>"));
    }

    #[test]
    fn comments_are_html() {
        assert!(is_html("a <!-- b --> c"));
    }
}
