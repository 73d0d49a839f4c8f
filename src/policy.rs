//! The sanitization policy.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use url::Url;

use crate::builder::PolicyBuilder;
use crate::filter::SharedFilter;

/// Tags kept by the default policy.
pub const DEFAULT_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "area", "article", "aside", "b", "bdi", "bdo", "blockquote", "br",
    "caption", "center", "cite", "code", "col", "colgroup", "data", "dd", "del", "details", "dfn",
    "div", "dl", "dt", "em", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "hr", "i", "img", "ins", "kbd", "li", "map", "mark", "nav", "ol", "p",
    "pre", "q", "rp", "rt", "rtc", "ruby", "s", "samp", "small", "span", "strike", "strong",
    "sub", "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "tt",
    "u", "ul", "var", "wbr",
];

/// Tags whose whole subtree the default policy discards.
pub const DEFAULT_CLEAN_CONTENT_TAGS: &[&str] = &["script", "style"];

/// Attributes the default policy allows on every tag.
pub const DEFAULT_GENERIC_ATTRIBUTES: &[&str] = &["lang", "title"];

/// Per-tag attributes allowed by the default policy.
pub const DEFAULT_TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "hreflang"]),
    ("bdo", &["dir"]),
    ("blockquote", &["cite"]),
    ("col", &["align", "char", "charoff", "span"]),
    ("colgroup", &["align", "char", "charoff", "span"]),
    ("del", &["cite", "datetime"]),
    ("hr", &["align", "size", "width"]),
    ("img", &["align", "alt", "height", "src", "width"]),
    ("ins", &["cite", "datetime"]),
    ("ol", &["start"]),
    ("q", &["cite"]),
    ("table", &["align", "char", "charoff", "summary"]),
    ("tbody", &["align", "char", "charoff"]),
    ("td", &["align", "char", "charoff", "colspan", "headers", "rowspan"]),
    ("tfoot", &["align", "char", "charoff"]),
    ("th", &["align", "char", "charoff", "colspan", "headers", "rowspan", "scope"]),
    ("thead", &["align", "char", "charoff"]),
    ("tr", &["align", "char", "charoff"]),
];

/// URL schemes allowed by the default policy.
pub const DEFAULT_URL_SCHEMES: &[&str] = &[
    "bitcoin", "ftp", "ftps", "geo", "http", "https", "im", "irc", "ircs", "magnet", "mailto",
    "mms", "mx", "news", "nntp", "openpgp4fpr", "sip", "sms", "smsto", "ssh", "tel", "url",
    "webcal", "wtai", "xmpp",
];

/// `rel` value the default policy forces onto links.
pub const DEFAULT_LINK_REL: &str = "noopener noreferrer";

/// What to do with relative URLs in URL-valued attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UrlRelative {
    /// Keep relative URLs as written
    #[default]
    PassThrough,
    /// Remove attributes holding relative URLs
    Deny,
    /// Resolve relative URLs against a base URL
    RewriteWithBase(Url),
}

/// An immutable set of sanitization rules.
///
/// A policy is built once, through [`PolicyBuilder`] or
/// [`PolicyConfig`](crate::PolicyConfig), and can then be shared freely
/// between threads and reused for any number of inputs.
///
/// # Examples
///
/// ```
/// use html_policy::Policy;
///
/// let policy = Policy::builder()
///     .tags(["p", "a"])
///     .link_rel(None::<String>)
///     .build()
///     .expect("valid policy");
///
/// let out = policy.clean_to_string("<p onclick=x()><a href='/x'>link</a><em>!</em></p>");
/// assert_eq!(out, r#"<p><a href="/x">link</a>!</p>"#);
/// ```
#[derive(Clone)]
pub struct Policy {
    pub(crate) tags: BTreeSet<String>,
    pub(crate) clean_content_tags: BTreeSet<String>,
    pub(crate) tag_attributes: BTreeMap<String, BTreeSet<String>>,
    pub(crate) generic_attributes: BTreeSet<String>,
    pub(crate) generic_attribute_prefixes: BTreeSet<String>,
    pub(crate) tag_attribute_values: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    pub(crate) set_tag_attribute_values: BTreeMap<String, BTreeMap<String, String>>,
    pub(crate) allowed_classes: Option<BTreeMap<String, BTreeSet<String>>>,
    pub(crate) filter_style_properties: Option<BTreeSet<String>>,
    pub(crate) link_rel: Option<String>,
    pub(crate) url_schemes: BTreeSet<String>,
    pub(crate) url_relative: UrlRelative,
    pub(crate) strip_comments: bool,
    pub(crate) attribute_filter: Option<SharedFilter>,
}

impl Policy {
    /// Starts a builder from the default policy.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::new()
    }

    /// A policy that keeps no tags and no attributes.
    ///
    /// Cleaning with it reduces any input to its text, minus the content of
    /// `script` and `style`.
    pub fn empty() -> Self {
        Self {
            tags: BTreeSet::new(),
            clean_content_tags: to_set(DEFAULT_CLEAN_CONTENT_TAGS),
            tag_attributes: BTreeMap::new(),
            generic_attributes: BTreeSet::new(),
            generic_attribute_prefixes: BTreeSet::new(),
            tag_attribute_values: BTreeMap::new(),
            set_tag_attribute_values: BTreeMap::new(),
            allowed_classes: None,
            filter_style_properties: None,
            link_rel: None,
            url_schemes: to_set(DEFAULT_URL_SCHEMES),
            url_relative: UrlRelative::PassThrough,
            strip_comments: true,
            attribute_filter: None,
        }
    }

    /// Returns true if elements named `tag` are kept.
    pub fn is_tag_allowed(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns the allowed tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Returns true if `attribute` may appear on `tag` before value checks.
    ///
    /// This covers the per-tag and generic allowlists, generic prefixes, and
    /// the attributes admitted by value allowlists and class allowlists.
    pub fn is_attribute_allowed(&self, tag: &str, attribute: &str) -> bool {
        self.generic_attribute_prefixes
            .iter()
            .any(|prefix| attribute.starts_with(prefix.as_str()))
            || self.generic_attributes.contains(attribute)
            || self
                .tag_attributes
                .get(tag)
                .is_some_and(|attrs| attrs.contains(attribute))
            || self
                .tag_attribute_values
                .get(tag)
                .is_some_and(|attrs| attrs.contains_key(attribute))
            || (attribute == "class"
                && self
                    .allowed_classes
                    .as_ref()
                    .is_some_and(|classes| classes.contains_key(tag)))
    }

    /// Returns the forced `rel` value for links, if enabled.
    pub fn link_rel(&self) -> Option<&str> {
        self.link_rel.as_deref()
    }

    /// Returns true if comments are removed.
    pub fn strips_comments(&self) -> bool {
        self.strip_comments
    }

    /// Returns true if an attribute filter is installed.
    pub fn has_attribute_filter(&self) -> bool {
        self.attribute_filter.is_some()
    }
}

impl Default for Policy {
    fn default() -> Self {
        let tag_attributes = DEFAULT_TAG_ATTRIBUTES
            .iter()
            .map(|(tag, attrs)| (tag.to_string(), to_set(attrs)))
            .collect();

        Self {
            tags: to_set(DEFAULT_TAGS),
            tag_attributes,
            generic_attributes: to_set(DEFAULT_GENERIC_ATTRIBUTES),
            link_rel: Some(DEFAULT_LINK_REL.to_string()),
            ..Self::empty()
        }
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("tags", &self.tags)
            .field("clean_content_tags", &self.clean_content_tags)
            .field("tag_attributes", &self.tag_attributes)
            .field("generic_attributes", &self.generic_attributes)
            .field("generic_attribute_prefixes", &self.generic_attribute_prefixes)
            .field("tag_attribute_values", &self.tag_attribute_values)
            .field("set_tag_attribute_values", &self.set_tag_attribute_values)
            .field("allowed_classes", &self.allowed_classes)
            .field("filter_style_properties", &self.filter_style_properties)
            .field("link_rel", &self.link_rel)
            .field("url_schemes", &self.url_schemes)
            .field("url_relative", &self.url_relative)
            .field("strip_comments", &self.strip_comments)
            .field("attribute_filter", &self.attribute_filter.is_some())
            .finish()
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
