use std::collections::{BTreeMap, BTreeSet};

/// Filters a `class` attribute value against a per-tag allowlist.
///
/// Tokens are split on ASCII whitespace and kept in their original order if
/// `allowed[tag]` contains them. Returns `None` when `tag` has no entry or no
/// token survives, meaning the attribute should be removed rather than left
/// as `class=""`.
///
/// # Examples
///
/// ```
/// use std::collections::{BTreeMap, BTreeSet};
/// use html_policy::filter_classes;
///
/// let allowed = BTreeMap::from([
///     ("a".to_string(), BTreeSet::from(["b".to_string(), "c".to_string()])),
/// ]);
///
/// assert_eq!(filter_classes("a", "c b a", &allowed), Some("c b".to_string()));
/// assert_eq!(filter_classes("div", "c", &allowed), None);
/// ```
pub fn filter_classes(
    tag: &str,
    value: &str,
    allowed: &BTreeMap<String, BTreeSet<String>>,
) -> Option<String> {
    let allowed = allowed.get(tag)?;
    let kept: Vec<&str> = value
        .split_ascii_whitespace()
        .filter(|token| allowed.contains(*token))
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}
