// SPDX-License-Identifier: MIT OR Apache-2.0
//! Metadata accessors for arbitrary errors.
//!
//! Each accessor looks at the error it is given and, when that error is not
//! an [`AnnotatedError`], returns the documented default instead of failing.
//! None of them walk the `source()` chain; use [`find`] for that.

use std::error::Error as StdError;
use std::panic::Location;

use crate::code::Code;
use crate::error::AnnotatedError;
use crate::reason::{EMPTY_REASON, ErrorReason};

fn narrow<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a AnnotatedError> {
    err.downcast_ref::<AnnotatedError>()
}

/// Status code, or [`Code::Unknown`].
pub fn code(err: &(dyn StdError + 'static)) -> Code {
    narrow(err).map_or(Code::Unknown, AnnotatedError::code)
}

/// Reason, or the empty reason.
pub fn reason<'a>(err: &'a (dyn StdError + 'static)) -> &'a dyn ErrorReason {
    match narrow(err) {
        Some(werr) => werr.reason(),
        None => &EMPTY_REASON,
    }
}

/// Joined message fragments, or `""`.
pub fn message(err: &(dyn StdError + 'static)) -> String {
    narrow(err).map(AnnotatedError::message).unwrap_or_default()
}

/// Reporting flag, or `true`: errors are reported unless told otherwise.
pub fn should_report(err: &(dyn StdError + 'static)) -> bool {
    narrow(err).is_none_or(AnnotatedError::should_report)
}

/// Captured frame addresses, or an empty slice.
pub fn callers<'a>(err: &'a (dyn StdError + 'static)) -> &'a [usize] {
    match narrow(err) {
        Some(werr) => werr.callers(),
        None => &[],
    }
}

/// Capture-site location, or `None`.
pub fn location(err: &(dyn StdError + 'static)) -> Option<&'static Location<'static>> {
    narrow(err).and_then(AnnotatedError::location)
}

/// Iterate over `err` and every error in its `source()` chain.
pub fn chain<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |e: &&'a (dyn StdError + 'static)| (*e).source())
}

/// First [`AnnotatedError`] in the chain starting at `err`.
pub fn find<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a AnnotatedError> {
    chain(err).find_map(narrow)
}

/// Whether any error in the chain is of type `T`.
pub fn is_caused_by<T: StdError + 'static>(err: &(dyn StdError + 'static)) -> bool {
    chain(err).any(|e| e.is::<T>())
}
