// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reporting policy.

use std::error::Error as StdError;
use std::fmt;

use werror_config::{ReportConfig, WerrorConfig};
use werror_core::{Code, access};

use crate::ReportError;
use crate::notifier::Notifier;
use crate::report::ErrorReport;

/// Why an error was not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Reporting is switched off.
    Disabled,
    /// The error was annotated with `with_ignore_report`.
    NotReportable,
    /// The error's code is in the ignore list.
    IgnoredCode(Code),
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("reporting disabled"),
            Self::NotReportable => f.write_str("error marked as not reportable"),
            Self::IgnoredCode(code) => write!(f, "code {code} is ignored"),
        }
    }
}

/// Result of [`Reporter::report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The notifier accepted this report.
    Sent(ErrorReport),
    /// Policy kept the error from the notifier.
    Suppressed(SuppressReason),
}

impl ReportOutcome {
    /// Whether a report was sent.
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }

    /// The report that was sent, if any.
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            Self::Sent(report) => Some(report),
            Self::Suppressed(_) => None,
        }
    }
}

/// Applies a [`ReportConfig`] and forwards surviving errors to a notifier.
#[derive(Debug, Clone)]
pub struct Reporter<N> {
    notifier: N,
    config: ReportConfig,
}

impl<N: Notifier> Reporter<N> {
    /// Create a reporter with an explicit policy.
    pub fn new(notifier: N, config: ReportConfig) -> Self {
        Self { notifier, config }
    }

    /// Create a reporter from the `report` section of a full configuration.
    pub fn from_config(notifier: N, config: &WerrorConfig) -> Self {
        Self::new(notifier, config.report.clone())
    }

    /// Policy in force.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// The wrapped notifier.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Take the notifier back.
    pub fn into_notifier(self) -> N {
        self.notifier
    }

    /// Report `err` unless policy suppresses it.
    ///
    /// Metadata comes from the first annotated error in the chain; a plain
    /// error is treated as reportable with code `UNKNOWN`.
    pub fn report(&self, err: &(dyn StdError + 'static)) -> Result<ReportOutcome, ReportError> {
        if let Some(reason) = self.suppression(err) {
            tracing::debug!(target: "werror::report", %reason, "report suppressed");
            return Ok(ReportOutcome::Suppressed(reason));
        }

        let report = ErrorReport::from_error(err, self.config.resolve_symbols)
            .with_release_stage(self.config.release_stage.clone());
        self.notifier.notify(&report)?;
        tracing::debug!(
            target: "werror::report",
            code = %report.code,
            frames = report.frames.len(),
            "report sent"
        );
        Ok(ReportOutcome::Sent(report))
    }

    fn suppression(&self, err: &(dyn StdError + 'static)) -> Option<SuppressReason> {
        if !self.config.enabled {
            return Some(SuppressReason::Disabled);
        }
        let found = access::find(err);
        if found.is_some_and(|werr| !werr.should_report()) {
            return Some(SuppressReason::NotReportable);
        }
        let code = found.map_or(Code::Unknown, |werr| werr.code());
        if self.config.ignored_codes.contains(&code) {
            return Some(SuppressReason::IgnoredCode(code));
        }
        None
    }
}
