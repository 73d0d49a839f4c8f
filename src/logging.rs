use crate::error::FilterError;
use crate::report::{CleanEvent, CleanEventKind, CleanReport, RemovalReason};

/// Report-backed logging for one sanitize call.
///
/// Every change the sanitizer makes goes through here, so the
/// [`CleanReport`] and the `tracing` output always agree. Only element and
/// attribute names are logged; values and text stay out of the logs.
#[derive(Debug)]
pub(crate) struct CleanLog<'a> {
    report: &'a mut CleanReport,
}

impl<'a> CleanLog<'a> {
    pub(crate) fn new(report: &'a mut CleanReport) -> Self {
        Self { report }
    }

    pub(crate) fn tag_unwrapped(&mut self, element: &str) {
        tracing::trace!(element, "unwrapping disallowed element");
        self.report
            .record(CleanEvent::new(CleanEventKind::TagUnwrapped, Some(element)));
    }

    pub(crate) fn subtree_removed(&mut self, element: &str) {
        tracing::debug!(element, "removing element and its content");
        self.report
            .record(CleanEvent::new(CleanEventKind::SubtreeRemoved, Some(element)));
    }

    pub(crate) fn comment_removed(&mut self) {
        tracing::trace!("removing comment");
        self.report
            .record(CleanEvent::new(CleanEventKind::CommentRemoved, None::<String>));
    }

    pub(crate) fn attribute_removed(
        &mut self,
        element: &str,
        attribute: &str,
        reason: RemovalReason,
    ) {
        tracing::trace!(element, attribute, %reason, "removing attribute");
        self.report.record(
            CleanEvent::new(CleanEventKind::AttributeRemoved, Some(element))
                .with_attribute(attribute)
                .with_reason(reason),
        );
    }

    pub(crate) fn attribute_rewritten(&mut self, element: &str, attribute: &str) {
        tracing::trace!(element, attribute, "rewriting attribute value");
        self.report.record(
            CleanEvent::new(CleanEventKind::AttributeRewritten, Some(element))
                .with_attribute(attribute),
        );
    }

    pub(crate) fn attribute_set(&mut self, element: &str, attribute: &str) {
        tracing::trace!(element, attribute, "setting attribute from policy");
        self.report.record(
            CleanEvent::new(CleanEventKind::AttributeSet, Some(element)).with_attribute(attribute),
        );
    }

    pub(crate) fn hook_failed(&mut self, element: &str, attribute: &str, error: &FilterError) {
        tracing::warn!(element, attribute, %error, "attribute filter failed, keeping attribute");
        self.report.record(
            CleanEvent::new(CleanEventKind::HookFailed, Some(element)).with_attribute(attribute),
        );
    }
}
