/// Turns an arbitrary string into HTML text.
///
/// The input is never parsed as markup. Every character with a special
/// meaning to the HTML tokenizer is replaced by a character reference, which
/// makes the result safe as element content and as a quoted or unquoted
/// attribute value.
///
/// Escaping is one-way: running it twice escapes the `&` of the first pass.
///
/// # Examples
///
/// ```
/// use html_policy::clean_text;
///
/// assert_eq!(
///     clean_text("Robert\"); abuse();//"),
///     "Robert&quot;);&#32;abuse();&#47;&#47;"
/// );
/// ```
pub fn clean_text(src: &str) -> String {
    let mut out = String::with_capacity(src.len().max(4));
    for c in src.chars() {
        let replacement = match c {
            // starts a tag
            '<' => "&lt;",
            // ends an unquoted attribute value
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&apos;",
            // legacy IE attribute delimiter
            '`' => "&grave;",
            '/' => "&#47;",
            '&' => "&amp;",
            '=' => "&#61;",
            // whitespace ends an unquoted attribute value
            ' ' => "&#32;",
            '\t' => "&#9;",
            '\n' => "&#10;",
            '\x0c' => "&#12;",
            '\r' => "&#13;",
            '\0' => "&#65533;",
            _ => {
                out.push(c);
                continue;
            }
        };
        out.push_str(replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quote_break_out() {
        assert_eq!(
            clean_text("Robert\"); abuse();//"),
            "Robert&quot;);&#32;abuse();&#47;&#47;"
        );
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            clean_text("<b class='x'>"),
            "&lt;b&#32;class&#61;&apos;x&apos;&gt;"
        );
    }

    #[test]
    fn escapes_whitespace_and_nul() {
        assert_eq!(clean_text("a\tb\nc\r\x0c\0"), "a&#9;b&#10;c&#13;&#12;&#65533;");
    }

    #[test]
    fn not_idempotent() {
        let once = clean_text("&");
        assert_eq!(once, "&amp;");
        assert_eq!(clean_text(&once), "&amp;amp;");
    }

    #[test]
    fn passes_unicode_through() {
        assert_eq!(clean_text("héllo世界"), "héllo世界");
    }
}
