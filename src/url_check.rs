use std::borrow::Cow;

use url::{ParseError, Url};

use crate::policy::{Policy, UrlRelative};
use crate::report::RemovalReason;

/// Returns true if `attribute` on `element` holds a URL.
///
/// Prefixed names are matched on their local part, so `xlink:href` counts.
pub(crate) fn is_url_attribute(element: &str, attribute: &str) -> bool {
    let attribute = attribute.split_once(':').map_or(attribute, |(_, local)| local);
    matches!(attribute, "href" | "src")
        || (element == "a" && attribute == "ping")
        || (element == "form" && attribute == "action")
        || (element == "object" && attribute == "data")
        || (matches!(element, "button" | "input") && attribute == "formaction")
        || (element == "video" && attribute == "poster")
}

/// Checks a URL value against the policy's schemes and relative-URL rule.
///
/// Returns the value to keep, which differs from the input only when
/// relative URLs are rewritten against a base.
pub(crate) fn check_url<'v>(
    policy: &Policy,
    value: &'v str,
) -> Result<Cow<'v, str>, RemovalReason> {
    match Url::parse(value) {
        Ok(url) => {
            if policy.url_schemes.contains(url.scheme()) {
                Ok(Cow::Borrowed(value))
            } else {
                Err(RemovalReason::UrlScheme)
            }
        }
        Err(ParseError::RelativeUrlWithoutBase) => match &policy.url_relative {
            UrlRelative::PassThrough => Ok(Cow::Borrowed(value)),
            UrlRelative::Deny => Err(RemovalReason::RelativeUrl),
            UrlRelative::RewriteWithBase(base) => base
                .join(value)
                .map(|joined| Cow::Owned(joined.to_string()))
                .map_err(|_| RemovalReason::InvalidUrl),
        },
        Err(_) => Err(RemovalReason::InvalidUrl),
    }
}
