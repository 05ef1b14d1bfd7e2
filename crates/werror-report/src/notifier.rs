// SPDX-License-Identifier: MIT OR Apache-2.0
//! Notifier implementations.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use crate::ReportError;
use crate::report::ErrorReport;

/// Destination for error reports.
pub trait Notifier: Send + Sync {
    /// Deliver one report.
    fn notify(&self, report: &ErrorReport) -> Result<(), ReportError>;
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, report: &ErrorReport) -> Result<(), ReportError> {
        (**self).notify(report)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, report: &ErrorReport) -> Result<(), ReportError> {
        (**self).notify(report)
    }
}

// ---------------------------------------------------------------------------
// TracingNotifier
// ---------------------------------------------------------------------------

/// Emits each report as an `error` event on the `werror::report` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, report: &ErrorReport) -> Result<(), ReportError> {
        tracing::error!(
            target: "werror::report",
            reason = %report.reason,
            code = %report.code,
            location = report.location.as_deref().unwrap_or(""),
            frames = report.frames.len(),
            causes = ?report.causes,
            release_stage = report.release_stage.as_deref().unwrap_or(""),
            "{}",
            report.message
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryNotifier
// ---------------------------------------------------------------------------

/// Thread-safe in-memory collector.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    inner: Arc<Mutex<Vec<ErrorReport>>>,
}

impl MemoryNotifier {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every report received so far.
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of reports received.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored report.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, report: &ErrorReport) -> Result<(), ReportError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonLinesNotifier
// ---------------------------------------------------------------------------

/// Writes each report as one line of JSON.
#[derive(Debug)]
pub struct JsonLinesNotifier<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesNotifier<W> {
    /// Write to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Notifier for JsonLinesNotifier<W> {
    fn notify(&self, report: &ErrorReport) -> Result<(), ReportError> {
        let line = serde_json::to_string(report).map_err(|e| ReportError::Serialize {
            reason: e.to_string(),
        })?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|e| ReportError::Notify {
                reason: e.to_string(),
            })
    }
}
