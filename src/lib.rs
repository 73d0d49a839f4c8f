//! Allowlist-based HTML sanitization for untrusted rich text.
//!
//! Input is parsed the way a browser would parse it inside a `<div>`, every
//! element, attribute and comment is checked against a [`Policy`], and the
//! surviving tree is serialized back to HTML that is safe to embed.
//!
//! - **Tags** outside the allowlist are unwrapped, keeping their content.
//!   Clean-content tags such as `script` and `style` lose their content too.
//! - **Attributes** pass through name and value allowlists, URL scheme
//!   checks and `class`/`style` filtering. Values can be forced onto tags,
//!   links get a `rel` value and a user [`AttributeFilter`] has the last word.
//! - **Reports** list every change made, see [`CleanReport`].
//!
//! Sanitizing never fails. Only building an invalid policy returns an
//! [`Error`].
//!
//! # Examples
//!
//! ```
//! let safe = html_policy::clean("<b><img src='' onerror='alert(1)'>hi</b><script>x</script>");
//! assert_eq!(safe, r#"<b><img src="">hi</b>"#);
//! ```
//!
//! A custom policy:
//!
//! ```
//! use html_policy::Policy;
//!
//! let policy = Policy::builder()
//!     .tags(["p", "a"])
//!     .generic_attribute_prefixes(["data-"])
//!     .build()
//!     .expect("valid policy");
//!
//! assert_eq!(
//!     policy.clean_to_string("<p data-id=1><a href='https://x.com'><b>x</b></a></p>"),
//!     r#"<p data-id="1"><a href="https://x.com" rel="noopener noreferrer">x</a></p>"#
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::OnceLock;

mod attributes;
mod builder;
mod class;
mod config;
mod detect;
mod document;
mod dom;
mod error;
mod escape;
mod filter;
mod link;
mod logging;
mod parser;
mod policy;
mod report;
mod sanitizer;
mod serializer;
mod style;
mod url_check;

pub use builder::PolicyBuilder;
pub use class::filter_classes;
pub use config::{PolicyConfig, UrlRelativeConfig};
pub use detect::is_html;
pub use document::Document;
pub use dom::{Attributes, Element, Fragment, Node};
pub use error::{ConfigError, ConfigErrorKind, Error, FilterError};
pub use escape::clean_text;
pub use filter::{AttributeFilter, FilterRegistry, FilterResult, SharedFilter};
pub use parser::{parse_fragment, MAX_DEPTH};
pub use policy::{
    Policy, UrlRelative, DEFAULT_CLEAN_CONTENT_TAGS, DEFAULT_GENERIC_ATTRIBUTES,
    DEFAULT_LINK_REL, DEFAULT_TAGS, DEFAULT_TAG_ATTRIBUTES, DEFAULT_URL_SCHEMES,
};
pub use report::{CleanEvent, CleanEventKind, CleanReport, RemovalReason};
pub use serializer::{is_void_element, serialize_nodes, serialize_to_string};
pub use style::filter_style;

fn default_policy() -> &'static Policy {
    static DEFAULT: OnceLock<Policy> = OnceLock::new();
    DEFAULT.get_or_init(Policy::default)
}

/// Sanitizes `html` with the default policy.
pub fn clean(html: &str) -> String {
    default_policy().clean_to_string(html)
}

/// Sanitizes `html` with the default policy, keeping the change report.
pub fn clean_with_report(html: &str) -> Document {
    default_policy().clean(html)
}
