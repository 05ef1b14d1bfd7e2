// SPDX-License-Identifier: MIT OR Apache-2.0
//! Crash-reporter seam for annotated errors.
//!
//! A [`Reporter`] decides whether an error should reach a [`Notifier`]
//! (respecting `with_ignore_report`, ignored codes and the master switch
//! from [`werror_config::ReportConfig`]) and builds an [`ErrorReport`] with
//! symbolised frames for the ones that should.
//!
//! ```
//! use werror_core::{Code, with_code, wrap};
//! use werror_config::ReportConfig;
//! use werror_report::{MemoryNotifier, Reporter};
//!
//! let reporter = Reporter::new(MemoryNotifier::new(), ReportConfig::default());
//! let err = wrap(std::io::Error::other("boom"), [with_code(Code::Internal)]);
//! assert!(reporter.report(&err).unwrap().is_sent());
//! assert_eq!(reporter.notifier().len(), 1);
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod notifier;
mod report;
mod reporter;

pub use notifier::{JsonLinesNotifier, MemoryNotifier, Notifier, TracingNotifier};
pub use report::{ErrorReport, ReportFrame, resolve_frames};
pub use reporter::{ReportOutcome, Reporter, SuppressReason};

/// Errors raised while delivering a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The notifier could not deliver the report.
    #[error("notifier failed: {reason}")]
    Notify {
        /// Failure detail.
        reason: String,
    },

    /// The report could not be serialised.
    #[error("failed to serialize report: {reason}")]
    Serialize {
        /// Failure detail.
        reason: String,
    },
}
