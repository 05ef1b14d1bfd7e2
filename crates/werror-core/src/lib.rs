// SPDX-License-Identifier: MIT OR Apache-2.0
//! Annotated errors for service code.
//!
//! An [`AnnotatedError`] decorates an underlying error with a [`Code`]
//! (transport status), an [`ErrorReason`] (application classification),
//! message fragments, a reporting flag and the call stack of the site that
//! first annotated it. Errors are decorated by passing them through
//! [`wrap`] with a list of [`Annotator`]s. Any error, annotated or not, can
//! be queried with the accessors in [`access`].
//!
//! ```
//! use std::io;
//! use werror_core::{Code, StaticReason, access, with_code, with_reason, wrap};
//!
//! fn fetch() -> Result<(), werror_core::AnnotatedError> {
//!     let res: Result<(), io::Error> = Err(io::Error::other("connection reset"));
//!     res.map_err(|e| {
//!         wrap(e, [with_code(Code::Unavailable), with_reason(StaticReason("upstream"))])
//!     })
//! }
//!
//! let err = fetch().unwrap_err();
//! assert_eq!(access::code(&err), Code::Unavailable);
//! assert_eq!(access::reason(&err).to_string(), "upstream");
//! assert!(access::should_report(&err));
//! assert!(access::is_caused_by::<io::Error>(&err));
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
mod annotate;
pub mod capture;
mod code;
mod error;
mod reason;

pub use annotate::{
    AnnotatedResult, Annotator, ResultExt, with_callers, with_code, with_ignore_report,
    with_message, with_reason, with_reason_any, with_reason_ref, wrap, wrap_opt,
};
pub use capture::{CaptureSettings, Callers, ConfigureError};
pub use code::{Code, InvalidCode};
pub use error::{AnnotatedError, AnnotatedErrorDto, MESSAGE_SEPARATOR, Reportable};
pub use reason::{EmptyReason, ErrorReason, ReasonRef, StaticReason};

/// Boxed, thread-safe error accepted by every annotator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
