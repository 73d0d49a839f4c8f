//! Declarative policy configuration.
//!
//! A [`PolicyConfig`] mirrors the builder options as plain data so a policy
//! can live in a JSON file. Every field is optional and a missing field
//! keeps the default policy's value. Attribute filters are code, so the
//! configuration refers to them by name and [`PolicyConfig::into_policy`]
//! resolves the name in a [`FilterRegistry`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::builder::PolicyBuilder;
use crate::error::{ConfigError, ConfigErrorKind, Error};
use crate::filter::FilterRegistry;
use crate::policy::{Policy, UrlRelative};

/// Policy options in deserializable form.
///
/// # Examples
///
/// ```
/// use html_policy::{FilterRegistry, PolicyConfig};
///
/// let config = PolicyConfig::from_json_str(
///     r#"{ "tags": ["a", "b"], "link_rel": null }"#,
/// )
/// .unwrap();
/// let policy = config.into_policy(&FilterRegistry::new()).unwrap();
///
/// assert_eq!(
///     policy.clean_to_string("<a href='/x'><i>hi</i></a>"),
///     r#"<a href="/x">hi</a>"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Replaces the tag allowlist
    pub tags: Option<Vec<String>>,
    /// Tags removed together with their content
    pub clean_content_tags: Option<Vec<String>>,
    /// Replaces the attribute allowlists; the `"*"` key applies to every tag
    pub attributes: Option<BTreeMap<String, Vec<String>>>,
    /// Attribute name prefixes allowed on every tag
    pub generic_attribute_prefixes: Option<Vec<String>>,
    /// Exact values allowed per tag and attribute
    pub tag_attribute_values: Option<BTreeMap<String, BTreeMap<String, Vec<String>>>>,
    /// Values forced onto every kept element of a tag
    pub set_tag_attribute_values: Option<BTreeMap<String, BTreeMap<String, String>>>,
    /// Class tokens allowed per tag
    pub allowed_classes: Option<BTreeMap<String, Vec<String>>>,
    /// Properties kept in `style` attributes
    pub filter_style_properties: Option<Vec<String>>,
    /// `rel` forced onto links; `null` disables the rule
    #[serde(deserialize_with = "present")]
    pub link_rel: Option<Option<String>>,
    /// Replaces the allowed URL schemes
    pub url_schemes: Option<Vec<String>>,
    /// Handling of relative URLs
    pub url_relative: Option<UrlRelativeConfig>,
    /// Whether comments are removed
    pub strip_comments: Option<bool>,
    /// Name of an attribute filter registered in a [`FilterRegistry`]
    pub attribute_filter: Option<String>,
}

/// Relative URL handling in deserializable form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case", deny_unknown_fields)]
pub enum UrlRelativeConfig {
    /// Keep relative URLs as written
    PassThrough,
    /// Remove attributes holding relative URLs
    Deny,
    /// Resolve relative URLs against `base`
    RewriteWithBase {
        /// Absolute base URL
        base: String,
    },
}

/// Distinguishes an explicit `null` from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl PolicyConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::MalformedConfig`] if the text is not valid
    /// JSON, has fields of the wrong type or contains unknown fields.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| {
            tracing::debug!(error = %e, "rejected policy configuration");
            ConfigError::new(ConfigErrorKind::MalformedConfig, e.to_string()).into()
        })
    }

    /// Resolves the configuration into a validated [`Policy`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::UnknownAttributeFilter`] if
    /// `attribute_filter` names a filter missing from `filters`,
    /// [`ConfigErrorKind::MalformedConfig`] if a rewrite base is not an
    /// absolute URL, and any error [`PolicyBuilder::build`] reports.
    pub fn into_policy(self, filters: &FilterRegistry) -> Result<Policy, Error> {
        let mut builder = PolicyBuilder::new();

        if let Some(tags) = self.tags {
            builder = builder.tags(tags);
        }
        if let Some(tags) = self.clean_content_tags {
            builder = builder.clean_content_tags(tags);
        }
        if let Some(attributes) = self.attributes {
            builder = builder.attributes(attributes);
        }
        if let Some(prefixes) = self.generic_attribute_prefixes {
            builder = builder.generic_attribute_prefixes(prefixes);
        }
        for (tag, attrs) in self.tag_attribute_values.unwrap_or_default() {
            for (attr, values) in attrs {
                builder = builder.add_tag_attribute_values(tag.clone(), attr, values);
            }
        }
        for (tag, attrs) in self.set_tag_attribute_values.unwrap_or_default() {
            for (attr, value) in attrs {
                builder = builder.set_tag_attribute_value(tag.clone(), attr, value);
            }
        }
        if let Some(classes) = self.allowed_classes {
            builder = builder.filter_classes();
            for (tag, tokens) in classes {
                builder = builder.add_allowed_classes(tag, tokens);
            }
        }
        if let Some(properties) = self.filter_style_properties {
            builder = builder.filter_style_properties(properties);
        }
        if let Some(rel) = self.link_rel {
            builder = builder.link_rel(rel);
        }
        if let Some(schemes) = self.url_schemes {
            builder = builder.url_schemes(schemes);
        }
        if let Some(relative) = self.url_relative {
            builder = builder.url_relative(relative.resolve()?);
        }
        if let Some(strip) = self.strip_comments {
            builder = builder.strip_comments(strip);
        }
        if let Some(name) = self.attribute_filter {
            let filter = filters.get(&name).ok_or_else(|| {
                ConfigError::new(
                    ConfigErrorKind::UnknownAttributeFilter,
                    format!("no attribute filter registered as '{}'", name),
                )
            })?;
            builder = builder.attribute_filter_shared(Some(filter));
        }

        builder.build()
    }
}

impl UrlRelativeConfig {
    fn resolve(self) -> Result<UrlRelative, Error> {
        Ok(match self {
            UrlRelativeConfig::PassThrough => UrlRelative::PassThrough,
            UrlRelativeConfig::Deny => UrlRelative::Deny,
            UrlRelativeConfig::RewriteWithBase { base } => {
                let url = Url::parse(&base).map_err(|e| {
                    ConfigError::new(
                        ConfigErrorKind::MalformedConfig,
                        format!("invalid base URL '{}': {}", base, e),
                    )
                })?;
                UrlRelative::RewriteWithBase(url)
            }
        })
    }
}
