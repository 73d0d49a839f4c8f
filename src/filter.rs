//! User-supplied attribute filters.
//!
//! A filter is the last stage of attribute sanitization. It sees every
//! attribute that survived the built-in rules and may drop it or rewrite its
//! value; it can never add attributes. Filters are arbitrary code, so every
//! invocation is isolated: an `Err` or a panic leaves the attribute as it was.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::FilterError;

/// Outcome of a filter invocation.
pub type FilterResult = Result<Option<String>, FilterError>;

/// A final veto or rewrite for attribute values.
///
/// Returning `Ok(None)` removes the attribute, `Ok(Some(value))` replaces its
/// value. The returned value is stored as plain text and escaped on output.
///
/// Closures with the matching signature implement this trait.
///
/// # Examples
///
/// ```
/// use html_policy::{AttributeFilter, FilterResult};
///
/// struct NoImages;
///
/// impl AttributeFilter for NoImages {
///     fn filter(&self, element: &str, attribute: &str, value: &str) -> FilterResult {
///         if element == "img" && attribute == "src" {
///             return Ok(None);
///         }
///         Ok(Some(value.to_string()))
///     }
/// }
///
/// assert_eq!(NoImages.filter("img", "src", "/a.png"), Ok(None));
/// ```
pub trait AttributeFilter: Send + Sync {
    /// Decides the fate of one attribute.
    fn filter(&self, element: &str, attribute: &str, value: &str) -> FilterResult;
}

impl<F> AttributeFilter for F
where
    F: Fn(&str, &str, &str) -> FilterResult + Send + Sync,
{
    fn filter(&self, element: &str, attribute: &str, value: &str) -> FilterResult {
        self(element, attribute, value)
    }
}

/// Shared handle to an attribute filter.
pub type SharedFilter = Arc<dyn AttributeFilter>;

/// Runs `filter`, turning a panic into a [`FilterError`].
pub(crate) fn invoke_isolated(
    filter: &dyn AttributeFilter,
    element: &str,
    attribute: &str,
    value: &str,
) -> FilterResult {
    match panic::catch_unwind(AssertUnwindSafe(|| filter.filter(element, attribute, value))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "filter panicked".to_string());
            Err(FilterError::new(message))
        }
    }
}

/// Named attribute filters that configuration files can refer to.
///
/// A configuration names its filter with a string; resolving that name here
/// turns it into a callable, and an unknown name is a configuration error.
///
/// # Examples
///
/// ```
/// use html_policy::FilterRegistry;
///
/// let mut registry = FilterRegistry::new();
/// registry.register("drop-ids", |_el: &str, attr: &str, value: &str| {
///     Ok((attr != "id").then(|| value.to_string()))
/// });
///
/// assert!(registry.get("drop-ids").is_some());
/// assert!(registry.get("missing").is_none());
/// ```
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, SharedFilter>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `filter` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&str, &str, &str) -> FilterResult + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    /// Registers an already shared filter under `name`.
    pub fn register_shared(&mut self, name: impl Into<String>, filter: SharedFilter) -> &mut Self {
        self.filters.insert(name.into(), filter);
        self
    }

    /// Looks up a filter by name.
    pub fn get(&self, name: &str) -> Option<SharedFilter> {
        self.filters.get(name).cloned()
    }

    /// Returns the number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if no filters are registered.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FilterRegistry")
            .field("filters", &names)
            .finish()
    }
}
