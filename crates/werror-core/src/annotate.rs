// SPDX-License-Identifier: MIT OR Apache-2.0
//! Annotators and the `wrap` entry points.
//!
//! An [`Annotator`] sets one piece of metadata. Applied to an
//! [`AnnotatedError`] it mutates that value in place; applied to any other
//! error it first promotes the error (keeping it as the cause) and captures
//! the call stack at the annotating call site.
//!
//! Code, reason and the reporting flag are last-write-wins; messages
//! accumulate. The call stack is captured once and never replaced, so the
//! deepest site that annotated an error is the one that is kept.

use std::any::Any;
use std::sync::Arc;

use crate::code::Code;
use crate::error::AnnotatedError;
use crate::reason::{ErrorReason, ReasonRef, reason_from_any};
use crate::BoxError;

/// Result alias for functions returning annotated errors.
pub type AnnotatedResult<T> = Result<T, AnnotatedError>;

/// One metadata update, applied by [`wrap`] or [`Annotator::apply`].
#[derive(Debug, Clone)]
pub enum Annotator {
    /// Overwrite the status code.
    Code(Code),
    /// Overwrite the reason.
    Reason(ReasonRef),
    /// Clear the reporting flag.
    IgnoreReport,
    /// Append a message fragment.
    Message(String),
    /// Capture the call stack if not yet captured, skipping the given number
    /// of extra frames above the annotating call.
    Callers(usize),
    /// Leave the error untouched.
    Noop,
}

impl Annotator {
    /// Apply to a single error, outside of [`wrap`].
    ///
    /// A plain error is promoted and its stack captured at the caller of
    /// this method. A [`Annotator::Noop`] returns the input unchanged.
    #[inline(never)]
    #[track_caller]
    pub fn apply(self, err: BoxError) -> BoxError {
        self.apply_at(err, 1)
    }

    /// `skip` counts frames between this function and the annotating site.
    #[inline(never)]
    #[track_caller]
    pub(crate) fn apply_at(self, err: BoxError, skip: usize) -> BoxError {
        if matches!(self, Self::Noop) {
            return err;
        }

        let (mut werr, promoted) = match err.downcast::<AnnotatedError>() {
            Ok(werr) => (werr, false),
            Err(plain) => (Box::new(AnnotatedError::from_cause(plain)), true),
        };

        match self {
            Self::Code(code) => werr.set_code(code),
            Self::Reason(reason) => werr.set_reason(reason),
            Self::IgnoreReport => werr.ignore_report(),
            Self::Message(text) => werr.push_message(text),
            Self::Callers(offset) => {
                werr.capture_callers(skip.saturating_add(1).saturating_add(offset))
            }
            Self::Noop => {}
        }
        if promoted {
            werr.capture_callers(skip.saturating_add(1));
        }
        werr
    }
}

/// Set the status code.
pub fn with_code(code: Code) -> Annotator {
    Annotator::Code(code)
}

/// Set the reason.
pub fn with_reason<R: ErrorReason>(reason: R) -> Annotator {
    Annotator::Reason(Arc::new(reason))
}

/// Set an already shared reason.
pub fn with_reason_ref(reason: ReasonRef) -> Annotator {
    Annotator::Reason(reason)
}

/// Set the reason from a dynamically typed value.
///
/// Accepts a [`ReasonRef`], a `Box<dyn ErrorReason>`, or one of this crate's
/// reason types. Any other value has no display capability to offer, so the
/// returned annotator is [`Annotator::Noop`].
pub fn with_reason_any(value: Box<dyn Any + Send + Sync>) -> Annotator {
    match reason_from_any(value) {
        Some(reason) => Annotator::Reason(reason),
        None => {
            tracing::debug!(target: "werror", "ignoring reason without display capability");
            Annotator::Noop
        }
    }
}

/// Clear the reporting flag.
pub fn with_ignore_report() -> Annotator {
    Annotator::IgnoreReport
}

/// Append a message fragment.
pub fn with_message(text: impl Into<String>) -> Annotator {
    Annotator::Message(text.into())
}

/// Capture the call stack, skipping `offset` frames above the annotating
/// call. Has no effect on an error whose stack was already captured.
pub fn with_callers(offset: usize) -> Annotator {
    Annotator::Callers(offset)
}

/// Annotate `err` with each annotator in order.
///
/// The result is always an [`AnnotatedError`] whose call stack is captured;
/// when no annotator had to promote the error, the caller of `wrap` becomes
/// the capture site. A stack captured earlier is never replaced.
#[inline(never)]
#[track_caller]
pub fn wrap<E, I>(err: E, annotators: I) -> AnnotatedError
where
    E: Into<BoxError>,
    I: IntoIterator<Item = Annotator>,
{
    wrap_at(err.into(), annotators, 1)
}

/// [`wrap`] for an optional error: `None` stays `None` and no annotator runs.
#[inline(never)]
#[track_caller]
pub fn wrap_opt<E, I>(err: Option<E>, annotators: I) -> Option<AnnotatedError>
where
    E: Into<BoxError>,
    I: IntoIterator<Item = Annotator>,
{
    match err {
        Some(err) => Some(wrap_at(err.into(), annotators, 1)),
        None => None,
    }
}

#[inline(never)]
#[track_caller]
fn wrap_at<I>(mut err: BoxError, annotators: I, skip: usize) -> AnnotatedError
where
    I: IntoIterator<Item = Annotator>,
{
    for annotator in annotators {
        err = annotator.apply_at(err, skip.saturating_add(1));
    }

    let mut werr = match err.downcast::<AnnotatedError>() {
        Ok(werr) => *werr,
        Err(plain) => AnnotatedError::from_cause(plain),
    };
    werr.capture_callers(skip.saturating_add(1));
    werr
}

/// Annotate the error side of a `Result`.
///
/// ```
/// use werror_core::{Code, ResultExt, with_code, with_message};
///
/// fn load() -> Result<String, std::io::Error> {
///     Err(std::io::Error::other("no such file"))
/// }
///
/// let err = load()
///     .annotate([with_code(Code::NotFound), with_message("loading profile")])
///     .unwrap_err();
/// assert_eq!(err.code(), Code::NotFound);
/// assert_eq!(err.message(), "no such file : loading profile");
/// ```
pub trait ResultExt<T> {
    /// Run `annotators` over the error, if any. `Ok` passes through.
    fn annotate<I>(self, annotators: I) -> AnnotatedResult<T>
    where
        I: IntoIterator<Item = Annotator>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    #[inline(never)]
    #[track_caller]
    fn annotate<I>(self, annotators: I) -> AnnotatedResult<T>
    where
        I: IntoIterator<Item = Annotator>,
    {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(wrap_at(err.into(), annotators, 1)),
        }
    }
}
