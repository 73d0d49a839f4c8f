use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::{
    error::{ConfigError, ConfigErrorKind, Error},
    filter::{FilterResult, SharedFilter},
    policy::{Policy, UrlRelative},
};

/// Builder for [`Policy`].
///
/// Setters never fail; all names are checked and normalized in
/// [`build`](Self::build), before any input can be sanitized with the
/// result. Tag, attribute, prefix, style property and URL scheme names are
/// ASCII-lowercased. Class names and attribute values are kept as written.
///
/// # Examples
///
/// ```
/// use html_policy::PolicyBuilder;
///
/// let policy = PolicyBuilder::new()
///     .add_tags(["my-tag"])
///     .add_tag_attributes("my-tag", ["my-attr"])
///     .generic_attribute_prefixes(["data-"])
///     .build()
///     .expect("valid policy");
///
/// assert!(policy.is_tag_allowed("my-tag"));
/// assert!(policy.is_attribute_allowed("div", "data-id"));
/// ```
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    draft: Policy,
}

impl PolicyBuilder {
    /// Creates a builder starting from the default policy.
    pub fn new() -> Self {
        Self {
            draft: Policy::default(),
        }
    }

    /// Creates a builder starting from [`Policy::empty`].
    pub fn empty() -> Self {
        Self {
            draft: Policy::empty(),
        }
    }

    /// Replaces the set of allowed tags.
    pub fn tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft.tags = collect(tags);
        self
    }

    /// Adds allowed tags.
    pub fn add_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft.tags.extend(collect(tags));
        self
    }

    /// Removes allowed tags.
    pub fn rm_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for tag in tags {
            self.draft.tags.remove(&tag.into().to_ascii_lowercase());
        }
        self
    }

    /// Replaces the set of tags removed together with their content.
    pub fn clean_content_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft.clean_content_tags = collect(tags);
        self
    }

    /// Replaces all attribute allowlists.
    ///
    /// The key `"*"` sets the attributes allowed on every tag; any other key
    /// is a tag name.
    pub fn attributes<I, T, A>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (T, A)>,
        T: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        self.draft.tag_attributes.clear();
        self.draft.generic_attributes.clear();
        for (tag, attrs) in attributes {
            let tag = tag.into();
            if tag == "*" {
                self.draft.generic_attributes.extend(collect(attrs));
            } else {
                self.draft
                    .tag_attributes
                    .entry(tag)
                    .or_default()
                    .extend(collect(attrs));
            }
        }
        self
    }

    /// Adds attributes allowed on `tag`.
    pub fn add_tag_attributes<T, I>(mut self, tag: T, attributes: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft
            .tag_attributes
            .entry(tag.into())
            .or_default()
            .extend(collect(attributes));
        self
    }

    /// Adds attributes allowed on every tag.
    pub fn add_generic_attributes<I>(mut self, attributes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft.generic_attributes.extend(collect(attributes));
        self
    }

    /// Replaces the attribute name prefixes allowed on every tag.
    pub fn generic_attribute_prefixes<I>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft.generic_attribute_prefixes = collect(prefixes);
        self
    }

    /// Restricts `attribute` on `tag` to the listed exact values.
    ///
    /// Listing values also admits the attribute on that tag.
    pub fn add_tag_attribute_values<T, A, I>(mut self, tag: T, attribute: A, values: I) -> Self
    where
        T: Into<String>,
        A: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft
            .tag_attribute_values
            .entry(tag.into())
            .or_default()
            .entry(attribute.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Forces `attribute` on every kept `tag` element to `value`.
    pub fn set_tag_attribute_value<T, A, V>(mut self, tag: T, attribute: A, value: V) -> Self
    where
        T: Into<String>,
        A: Into<String>,
        V: Into<String>,
    {
        self.draft
            .set_tag_attribute_values
            .entry(tag.into())
            .or_default()
            .insert(attribute.into(), value.into());
        self
    }

    /// Allows the listed class tokens on `tag` and turns class filtering on.
    ///
    /// Once class filtering is on, tags without an entry lose their `class`
    /// attribute entirely.
    pub fn add_allowed_classes<T, I>(mut self, tag: T, classes: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft
            .allowed_classes
            .get_or_insert_with(BTreeMap::new)
            .entry(tag.into())
            .or_default()
            .extend(classes.into_iter().map(Into::into));
        self
    }

    /// Turns class filtering on without allowing any class yet.
    pub fn filter_classes(mut self) -> Self {
        self.draft.allowed_classes.get_or_insert_with(BTreeMap::new);
        self
    }

    /// Keeps only the listed properties in `style` attributes.
    pub fn filter_style_properties<I>(mut self, properties: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft.filter_style_properties = Some(collect(properties));
        self
    }

    /// Sets the `rel` forced onto links, or disables the rule with `None`.
    pub fn link_rel<S: Into<String>>(mut self, rel: Option<S>) -> Self {
        self.draft.link_rel = rel.map(Into::into);
        self
    }

    /// Replaces the URL schemes allowed in URL-valued attributes.
    pub fn url_schemes<I>(mut self, schemes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft.url_schemes = collect(schemes);
        self
    }

    /// Adds allowed URL schemes.
    pub fn add_url_schemes<I>(mut self, schemes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.draft.url_schemes.extend(collect(schemes));
        self
    }

    /// Sets how relative URLs are handled.
    pub fn url_relative(mut self, policy: UrlRelative) -> Self {
        self.draft.url_relative = policy;
        self
    }

    /// Sets whether comments are removed.
    pub fn strip_comments(mut self, strip: bool) -> Self {
        self.draft.strip_comments = strip;
        self
    }

    /// Installs the attribute filter hook.
    ///
    /// # Examples
    ///
    /// ```
    /// use html_policy::Policy;
    ///
    /// let policy = Policy::builder()
    ///     .link_rel(None::<String>)
    ///     .attribute_filter(|element: &str, attribute: &str, value: &str| {
    ///         if element == "img" && attribute == "src" {
    ///             return Ok(None);
    ///         }
    ///         Ok(Some(value.to_string()))
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(
    ///     policy.clean_to_string("<a href=/><img alt=Home src=foo></a>"),
    ///     r#"<a href="/"><img alt="Home"></a>"#
    /// );
    /// ```
    pub fn attribute_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &str, &str) -> FilterResult + Send + Sync + 'static,
    {
        self.draft.attribute_filter = Some(Arc::new(filter));
        self
    }

    /// Installs a shared attribute filter, or removes it with `None`.
    pub fn attribute_filter_shared(mut self, filter: Option<SharedFilter>) -> Self {
        self.draft.attribute_filter = filter;
        self
    }

    /// Validates the accumulated settings and returns the policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any tag, attribute, prefix or style
    /// property name is empty, or if a URL scheme is not a valid scheme.
    pub fn build(self) -> Result<Policy, Error> {
        let mut policy = self.draft;

        // 1. Names must be usable
        check_names("tag", policy.tags.iter())?;
        check_names("clean-content tag", policy.clean_content_tags.iter())?;
        check_names("generic attribute", policy.generic_attributes.iter())?;
        check_names("attribute prefix", policy.generic_attribute_prefixes.iter())?;
        for (tag, attrs) in &policy.tag_attributes {
            check_names("tag", std::iter::once(tag))?;
            check_names("attribute", attrs.iter())?;
        }
        for (tag, attrs) in &policy.tag_attribute_values {
            check_names("tag", std::iter::once(tag))?;
            check_names("attribute", attrs.keys())?;
        }
        for (tag, attrs) in &policy.set_tag_attribute_values {
            check_names("tag", std::iter::once(tag))?;
            check_names("attribute", attrs.keys())?;
        }
        if let Some(classes) = &policy.allowed_classes {
            check_names("tag", classes.keys())?;
        }
        if let Some(properties) = &policy.filter_style_properties {
            check_names("style property", properties.iter())?;
        }
        for scheme in &policy.url_schemes {
            check_scheme(scheme)?;
        }

        // 2. Normalize nested keys the setters could not lowercase
        policy.tag_attributes = lower_keys(policy.tag_attributes, lower_set);
        policy.tag_attribute_values = lower_value_lists(policy.tag_attribute_values);
        policy.set_tag_attribute_values = lower_forced_values(policy.set_tag_attribute_values);
        policy.allowed_classes = policy
            .allowed_classes
            .map(|classes| lower_keys(classes, |set| set));

        tracing::debug!(
            tags = policy.tags.len(),
            link_rel = ?policy.link_rel,
            attribute_filter = policy.attribute_filter.is_some(),
            "built sanitization policy"
        );

        Ok(policy)
    }
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn collect<I>(items: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    items
        .into_iter()
        .map(|item| item.into().to_ascii_lowercase())
        .collect()
}

fn lower_set(set: BTreeSet<String>) -> BTreeSet<String> {
    set.into_iter().map(|s| s.to_ascii_lowercase()).collect()
}

/// Lowercases map keys. Sets under colliding keys are unioned.
fn lower_keys(
    map: BTreeMap<String, BTreeSet<String>>,
    mut map_value: impl FnMut(BTreeSet<String>) -> BTreeSet<String>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (key, value) in map {
        out.entry(key.to_ascii_lowercase())
            .or_default()
            .extend(map_value(value));
    }
    out
}

/// Lowercases tag and attribute names. Value lists under colliding names are
/// unioned; the values themselves keep their case.
fn lower_value_lists(
    map: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
) -> BTreeMap<String, BTreeMap<String, BTreeSet<String>>> {
    let mut out: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
    for (tag, attrs) in map {
        let merged = out.entry(tag.to_ascii_lowercase()).or_default();
        for (attr, values) in attrs {
            merged
                .entry(attr.to_ascii_lowercase())
                .or_default()
                .extend(values);
        }
    }
    out
}

/// Lowercases tag and attribute names of forced values. On a collision the
/// last name in key order wins.
fn lower_forced_values(
    map: BTreeMap<String, BTreeMap<String, String>>,
) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut out: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (tag, attrs) in map {
        let merged = out.entry(tag.to_ascii_lowercase()).or_default();
        for (attr, value) in attrs {
            merged.insert(attr.to_ascii_lowercase(), value);
        }
    }
    out
}

fn check_names<'a>(what: &str, names: impl Iterator<Item = &'a String>) -> Result<(), Error> {
    for name in names {
        if name.trim().is_empty() {
            return Err(ConfigError::new(
                ConfigErrorKind::EmptyName,
                format!("{} name must not be empty", what),
            )
            .into());
        }
    }
    Ok(())
}

fn check_scheme(scheme: &str) -> Result<(), Error> {
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::new(
            ConfigErrorKind::InvalidUrlScheme,
            format!("'{}' is not a valid url scheme", scheme),
        )
        .into())
    }
}
