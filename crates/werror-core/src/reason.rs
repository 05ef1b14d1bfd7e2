// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application-defined error reasons.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Classifies *why* an error occurred.
///
/// Reasons are defined by the application (often as a fieldless enum) and
/// are used for programmatic branching and for grouping reports. The display
/// form is what ends up in the annotated error's message.
///
/// ```
/// use std::any::Any;
/// use std::fmt;
/// use werror_core::ErrorReason;
///
/// #[derive(Debug)]
/// enum Reason {
///     UserNotFound,
/// }
///
/// impl fmt::Display for Reason {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str("user_not_found")
///     }
/// }
///
/// impl ErrorReason for Reason {
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait ErrorReason: fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// Returns this reason as a `&dyn Any` to allow downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl dyn ErrorReason {
    /// Downcast to a concrete reason type.
    pub fn downcast_ref<T: ErrorReason>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Whether the concrete reason type is `T`.
    pub fn is<T: ErrorReason>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// True for the empty reason (and any reason whose display form is empty).
    pub fn is_empty(&self) -> bool {
        self.is::<EmptyReason>() || self.to_string().is_empty()
    }
}

/// The reason of an error that was never given one. Displays as `""`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EmptyReason;

impl fmt::Display for EmptyReason {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

impl ErrorReason for EmptyReason {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A reason backed by a static string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticReason(pub &'static str);

impl fmt::Display for StaticReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl ErrorReason for StaticReason {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared, type-erased reason as stored on an annotated error.
pub type ReasonRef = Arc<dyn ErrorReason>;

/// Borrowed default returned by the accessors for non-annotated errors.
pub(crate) static EMPTY_REASON: EmptyReason = EmptyReason;

static EMPTY_REASON_REF: LazyLock<ReasonRef> = LazyLock::new(|| Arc::new(EmptyReason));

/// Shared handle to the empty reason; cloning it never allocates.
pub(crate) fn empty_reason() -> ReasonRef {
    Arc::clone(&EMPTY_REASON_REF)
}

/// Try to interpret a dynamically typed value as a reason.
///
/// Recognises an already-erased [`ReasonRef`], a `Box<dyn ErrorReason>`, and
/// the reason types defined in this crate. Anything else yields `None`.
pub(crate) fn reason_from_any(value: Box<dyn Any + Send + Sync>) -> Option<ReasonRef> {
    let value = match value.downcast::<ReasonRef>() {
        Ok(r) => return Some(*r),
        Err(v) => v,
    };
    let value = match value.downcast::<Box<dyn ErrorReason>>() {
        Ok(r) => return Some(Arc::from(*r)),
        Err(v) => v,
    };
    let value = match value.downcast::<StaticReason>() {
        Ok(r) => return Some(Arc::new(*r)),
        Err(v) => v,
    };
    match value.downcast::<EmptyReason>() {
        Ok(_) => Some(empty_reason()),
        Err(_) => None,
    }
}
