//! Record of what a sanitize call changed.
//!
//! Events carry element and attribute names only, never attribute values or
//! text, so a report can be logged without echoing untrusted content.

use std::fmt;

/// Kind of change made by the sanitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanEventKind {
    /// A disallowed element was replaced by its children
    TagUnwrapped,
    /// A disallowed element was removed together with its content
    SubtreeRemoved,
    /// A comment was removed
    CommentRemoved,
    /// An attribute was removed
    AttributeRemoved,
    /// An attribute value was changed
    AttributeRewritten,
    /// An attribute was injected or overwritten by the policy
    AttributeSet,
    /// The attribute filter hook failed and the attribute was left unchanged
    HookFailed,
}

impl fmt::Display for CleanEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanEventKind::TagUnwrapped => write!(f, "tag_unwrapped"),
            CleanEventKind::SubtreeRemoved => write!(f, "subtree_removed"),
            CleanEventKind::CommentRemoved => write!(f, "comment_removed"),
            CleanEventKind::AttributeRemoved => write!(f, "attribute_removed"),
            CleanEventKind::AttributeRewritten => write!(f, "attribute_rewritten"),
            CleanEventKind::AttributeSet => write!(f, "attribute_set"),
            CleanEventKind::HookFailed => write!(f, "hook_failed"),
        }
    }
}

/// Why an attribute was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// Not on any allowlist for the element
    NotAllowed,
    /// Value not in the value allowlist
    ValueNotAllowed,
    /// URL uses a scheme outside the allowed set
    UrlScheme,
    /// Relative URL under a policy that denies them
    RelativeUrl,
    /// Value could not be parsed as a URL
    InvalidUrl,
    /// No class token survived filtering
    NoAllowedClasses,
    /// The attribute filter hook dropped it
    AttributeFilter,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalReason::NotAllowed => write!(f, "not allowed"),
            RemovalReason::ValueNotAllowed => write!(f, "value not allowed"),
            RemovalReason::UrlScheme => write!(f, "url scheme not allowed"),
            RemovalReason::RelativeUrl => write!(f, "relative url denied"),
            RemovalReason::InvalidUrl => write!(f, "invalid url"),
            RemovalReason::NoAllowedClasses => write!(f, "no allowed classes"),
            RemovalReason::AttributeFilter => write!(f, "dropped by attribute filter"),
        }
    }
}

/// A single change made while sanitizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanEvent {
    kind: CleanEventKind,
    element: Option<String>,
    attribute: Option<String>,
    reason: Option<RemovalReason>,
}

impl CleanEvent {
    /// Creates an event for `element`.
    pub fn new(kind: CleanEventKind, element: Option<impl Into<String>>) -> Self {
        Self {
            kind,
            element: element.map(Into::into),
            attribute: None,
            reason: None,
        }
    }

    /// Sets the attribute the event is about.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Sets the removal reason.
    pub fn with_reason(mut self, reason: RemovalReason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Returns the event kind.
    pub fn kind(&self) -> CleanEventKind {
        self.kind
    }

    /// Returns the element name, if any.
    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    /// Returns the attribute name, if any.
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Returns the removal reason, if any.
    pub fn reason(&self) -> Option<RemovalReason> {
        self.reason
    }
}

impl fmt::Display for CleanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(element) = &self.element {
            write!(f, " <{}>", element)?;
        }
        if let Some(attribute) = &self.attribute {
            write!(f, " @{}", attribute)?;
        }
        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

/// Ordered list of the changes one sanitize call made.
///
/// # Example
///
/// ```
/// use html_policy::{clean_with_report, CleanEventKind};
///
/// let document = clean_with_report("<b onclick='x()'>hi</b><script>x()</script>");
/// let report = document.report();
///
/// assert_eq!(report.count(CleanEventKind::AttributeRemoved), 1);
/// assert_eq!(report.count(CleanEventKind::SubtreeRemoved), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    events: Vec<CleanEvent>,
}

impl CleanReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event.
    pub fn record(&mut self, event: CleanEvent) {
        self.events.push(event);
    }

    /// Returns the recorded events in order.
    pub fn events(&self) -> &[CleanEvent] {
        &self.events
    }

    /// Returns how many events of `kind` were recorded.
    pub fn count(&self, kind: CleanEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the input needed no changes.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
