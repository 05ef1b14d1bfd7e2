// SPDX-License-Identifier: MIT OR Apache-2.0
//! The annotated error value.

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::capture::Callers;
use crate::code::Code;
use crate::reason::{ErrorReason, ReasonRef, empty_reason};
use crate::BoxError;

/// Separator placed between message fragments.
pub const MESSAGE_SEPARATOR: &str = " : ";

/// An error decorated with a reason, a status code, message fragments, a
/// reporting flag and the call stack of the site that annotated it.
///
/// Values are normally produced by [`wrap`](crate::wrap) or one of the
/// annotators; the constructors here are for building one from scratch.
///
/// ```
/// use werror_core::{AnnotatedError, Code, wrap, with_code, with_message};
///
/// let err = wrap(
///     AnnotatedError::new("disk full"),
///     [with_code(Code::ResourceExhausted), with_message("saving draft")],
/// );
/// assert_eq!(
///     err.to_string(),
///     "reason: , code: 8, message: disk full : saving draft"
/// );
/// assert!(!err.callers().is_empty());
/// ```
pub struct AnnotatedError {
    cause: Option<BoxError>,
    messages: Vec<String>,
    reason: ReasonRef,
    code: Code,
    should_report: bool,
    callers: Option<Callers>,
}

impl AnnotatedError {
    /// Create an error from text. The call stack is captured by the first
    /// annotation pass rather than here.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_parts(None, text.into())
    }

    /// Promote a plain error, keeping it as the cause.
    pub fn from_cause(cause: impl Into<BoxError>) -> Self {
        let cause = cause.into();
        let text = cause.to_string();
        Self::with_parts(Some(cause), text)
    }

    fn with_parts(cause: Option<BoxError>, text: String) -> Self {
        Self {
            cause,
            messages: vec![text],
            reason: empty_reason(),
            code: Code::Unknown,
            should_report: true,
            callers: None,
        }
    }

    /// Status code.
    pub fn code(&self) -> Code {
        self.code
    }

    /// Reason the error occurred.
    pub fn reason(&self) -> &dyn ErrorReason {
        self.reason.as_ref()
    }

    /// Shared handle to the reason.
    pub fn reason_ref(&self) -> &ReasonRef {
        &self.reason
    }

    /// Message fragments, oldest first. Never empty.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Fragments joined with [`MESSAGE_SEPARATOR`].
    pub fn message(&self) -> String {
        self.messages.join(MESSAGE_SEPARATOR)
    }

    /// Whether a reporting collaborator should be notified.
    pub fn should_report(&self) -> bool {
        self.should_report
    }

    /// Captured frame addresses; empty until the first capture.
    pub fn callers(&self) -> &[usize] {
        self.callers.as_ref().map(Callers::frames).unwrap_or(&[])
    }

    /// Location of the call that captured the stack.
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.callers.as_ref().map(Callers::location)
    }

    /// Whether the call stack has been captured.
    pub fn has_callers(&self) -> bool {
        self.callers.is_some()
    }

    /// The underlying error, if this value was promoted from one.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Take the underlying error out, consuming the annotation.
    pub fn into_cause(self) -> Option<BoxError> {
        self.cause
    }

    pub(crate) fn set_code(&mut self, code: Code) {
        self.code = code;
    }

    pub(crate) fn set_reason(&mut self, reason: ReasonRef) {
        self.reason = reason;
    }

    pub(crate) fn ignore_report(&mut self) {
        self.should_report = false;
    }

    pub(crate) fn push_message(&mut self, text: String) {
        self.messages.push(text);
    }

    /// Capture the call stack unless it was captured before.
    ///
    /// `skip` counts frames above the caller of this method.
    #[inline(never)]
    #[track_caller]
    pub(crate) fn capture_callers(&mut self, skip: usize) {
        if self.callers.is_none() {
            self.callers = Some(Callers::capture(skip.saturating_add(1)));
        }
    }

    #[cfg(test)]
    pub(crate) fn set_callers(&mut self, callers: Callers) {
        self.callers = Some(callers);
    }
}

impl fmt::Display for AnnotatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reason: {}, code: {}, message: ", self.reason, self.code.as_i32())?;
        for (i, m) in self.messages.iter().enumerate() {
            if i > 0 {
                f.write_str(MESSAGE_SEPARATOR)?;
            }
            f.write_str(m)?;
        }
        Ok(())
    }
}

impl fmt::Debug for AnnotatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("AnnotatedError");
        d.field("reason", &self.reason);
        d.field("code", &self.code);
        d.field("messages", &self.messages);
        d.field("should_report", &self.should_report);
        if let Some(ref callers) = self.callers {
            d.field("callers", callers);
        }
        if let Some(ref cause) = self.cause {
            d.field("cause", &cause.to_string());
        }
        d.finish()
    }
}

impl StdError for AnnotatedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// The shape a crash-reporting integration reads from an error.
pub trait Reportable {
    /// Frame addresses of the capture site, innermost first.
    fn callers(&self) -> &[usize];

    /// Whether the error should be sent to the reporter.
    fn should_report(&self) -> bool;
}

impl Reportable for AnnotatedError {
    fn callers(&self) -> &[usize] {
        AnnotatedError::callers(self)
    }

    fn should_report(&self) -> bool {
        self.should_report
    }
}

// ---------------------------------------------------------------------------
// Serialization support
// ---------------------------------------------------------------------------

/// Serialisable snapshot of an [`AnnotatedError`] (without the opaque cause
/// and raw frame addresses).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct AnnotatedErrorDto {
    /// Display form of the reason.
    pub reason: String,
    /// Status code.
    pub code: Code,
    /// Message fragments, oldest first.
    pub messages: Vec<String>,
    /// Reporting flag.
    pub should_report: bool,
    /// `file:line:column` of the capture site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Number of captured frames.
    pub frame_count: usize,
    /// Display form of the cause, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&AnnotatedError> for AnnotatedErrorDto {
    fn from(err: &AnnotatedError) -> Self {
        Self {
            reason: err.reason.to_string(),
            code: err.code,
            messages: err.messages.clone(),
            should_report: err.should_report,
            location: err.location().map(|l| l.to_string()),
            frame_count: err.callers().len(),
            source_message: err.cause.as_ref().map(|c| c.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::StaticReason;
    use std::io;
    use std::sync::Arc;

    #[test]
    fn new_seeds_single_message_and_defaults() {
        let err = AnnotatedError::new("x");
        assert_eq!(err.messages(), ["x".to_string()]);
        assert_eq!(err.code(), Code::Unknown);
        assert!(err.reason().is_empty());
        assert!(err.should_report());
        assert!(!err.has_callers());
        assert!(err.callers().is_empty());
        assert!(err.location().is_none());
        assert!(err.cause().is_none());
    }

    #[test]
    fn display_format() {
        let err = AnnotatedError::new("x");
        insta::assert_snapshot!(err.to_string(), @"reason: , code: 2, message: x");
    }

    #[test]
    fn display_joins_messages_and_shows_reason() {
        let mut err = AnnotatedError::new("boom");
        err.push_message("a".into());
        err.push_message("b".into());
        err.set_reason(Arc::new(StaticReason("conflict")));
        err.set_code(Code::Aborted);
        assert_eq!(
            err.to_string(),
            "reason: conflict, code: 10, message: boom : a : b"
        );
        assert_eq!(err.message(), "boom : a : b");
    }

    #[test]
    fn from_cause_copies_message_and_keeps_source() {
        let err = AnnotatedError::from_cause(io::Error::other("disk gone"));
        assert_eq!(err.message(), "disk gone");
        let src = StdError::source(&err).unwrap();
        assert_eq!(src.to_string(), "disk gone");
        assert!(src.downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn capture_is_set_once() {
        let mut err = AnnotatedError::new("x");
        let original = Callers::from_parts(vec![1, 2, 3, 4, 5], Location::caller());
        err.set_callers(original.clone());
        err.capture_callers(0);
        assert_eq!(err.callers(), &[1, 2, 3, 4, 5]);
        assert_eq!(err.location(), Some(original.location()));
    }

    #[test]
    fn capture_records_caller_location() {
        let mut err = AnnotatedError::new("x");
        let line = line!() + 1;
        err.capture_callers(0);
        assert!(!err.callers().is_empty());
        let loc = err.location().unwrap();
        assert_eq!(loc.file(), file!());
        assert_eq!(loc.line(), line);
    }

    #[test]
    fn reportable_matches_inherent_accessors() {
        let mut err = AnnotatedError::new("x");
        err.ignore_report();
        let r: &dyn Reportable = &err;
        assert!(!r.should_report());
        assert!(r.callers().is_empty());
    }

    #[test]
    fn debug_includes_cause_when_present() {
        let err = AnnotatedError::from_cause(io::Error::other("inner"));
        let dbg = format!("{err:?}");
        assert!(dbg.contains("AnnotatedError"));
        assert!(dbg.contains("inner"));
        assert!(!dbg.contains("callers"));
    }

    #[test]
    fn into_cause_returns_original() {
        let err = AnnotatedError::from_cause(io::Error::new(io::ErrorKind::NotFound, "nf"));
        let cause = err.into_cause().unwrap();
        let io_err = cause.downcast::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn dto_snapshot() {
        let mut err = AnnotatedError::from_cause(io::Error::other("inner"));
        err.set_code(Code::NotFound);
        err.push_message("lookup".into());
        let dto = AnnotatedErrorDto::from(&err);
        assert_eq!(dto.reason, "");
        assert_eq!(dto.code, Code::NotFound);
        assert_eq!(dto.messages, vec!["inner".to_string(), "lookup".to_string()]);
        assert!(dto.location.is_none());
        assert_eq!(dto.frame_count, 0);
        assert_eq!(dto.source_message.as_deref(), Some("inner"));

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["code"], serde_json::json!("NOT_FOUND"));
        assert!(json.get("location").is_none());
    }

    #[test]
    fn annotated_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<AnnotatedError>();
    }
}
