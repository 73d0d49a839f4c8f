use std::collections::BTreeSet;

use cssparser::{Delimiter, ParseError, Parser, ParserInput, ToCss, Token, TokenSerializationType};

/// Blocks nested deeper than this make the declaration invalid.
const MAX_NESTING: usize = 32;

/// Filters an inline `style` declaration list.
///
/// The value is tokenized with cssparser, so strings, comments, escapes and
/// blocks are read the way a browser reads them. Each declaration must be
/// an identifier, a colon and a value. Declarations that are malformed,
/// have an empty value, or whose property (compared case-insensitively) is
/// not in `allowed` are dropped, as are values holding bad strings, bad
/// URLs, stray closing brackets or `{}` blocks.
///
/// Survivors are re-serialized from their tokens as `property:value` joined
/// by `;`, with comments removed and whitespace collapsed. The property is
/// lowercased. An empty result is still a valid (empty) style.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use html_policy::filter_style;
///
/// let allowed = BTreeSet::from(["color".to_string(), "font-size".to_string()]);
///
/// assert_eq!(
///     filter_style("color: red; position: fixed; font-size: var(--something)", &allowed),
///     "color:red;font-size:var(--something)"
/// );
/// assert_eq!(filter_style("border: none", &allowed), "");
/// ```
pub fn filter_style(value: &str, allowed: &BTreeSet<String>) -> String {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut out = String::with_capacity(value.len());

    while !parser.is_exhausted() {
        let declaration = parser.parse_until_after(Delimiter::Semicolon, parse_declaration);
        let Ok(Some((property, val))) = declaration else {
            continue;
        };
        if !allowed.contains(&property) {
            continue;
        }
        if !out.is_empty() {
            out.push(';');
        }
        out.push_str(&property);
        out.push(':');
        out.push_str(&val);
    }
    out
}

/// Parses `property: value`, returning `None` for an empty value.
fn parse_declaration<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<Option<(String, String)>, ParseError<'i, ()>> {
    let property = input.expect_ident()?.to_ascii_lowercase();
    input.expect_colon()?;

    let mut value = String::new();
    write_value(input, &mut value, 0)?;
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some((property, value)))
}

fn write_value<'i>(
    input: &mut Parser<'i, '_>,
    out: &mut String,
    depth: usize,
) -> Result<(), ParseError<'i, ()>> {
    if depth > MAX_NESTING {
        return Err(input.new_custom_error(()));
    }

    let start = out.len();
    let mut previous = TokenSerializationType::nothing();
    let mut space = false;

    while let Ok(token) = input.next_including_whitespace() {
        let token = token.clone();
        let close = match token {
            Token::WhiteSpace(_) => {
                space = true;
                continue;
            }
            Token::BadString(_)
            | Token::BadUrl(_)
            | Token::CloseParenthesis
            | Token::CloseSquareBracket
            | Token::CloseCurlyBracket
            | Token::CurlyBracketBlock
            | Token::Delim('\\') => return Err(input.new_unexpected_token_error(token)),
            Token::Function(_) | Token::ParenthesisBlock => Some(')'),
            Token::SquareBracketBlock => Some(']'),
            _ => None,
        };

        let kind = token.serialization_type();
        if out.len() > start && (space || previous.needs_separator_when_before(kind)) {
            out.push(' ');
        }
        space = false;
        // Writing into a String cannot fail.
        let _ = token.to_css(out);
        previous = kind;

        if let Some(close) = close {
            input.parse_nested_block(|nested| write_value(nested, out, depth + 1))?;
            out.push(close);
            previous = TokenSerializationType::nothing();
        }
    }
    Ok(())
}
