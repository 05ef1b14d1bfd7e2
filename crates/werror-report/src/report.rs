// SPDX-License-Identifier: MIT OR Apache-2.0
//! The report payload handed to notifiers.

use std::error::Error as StdError;
use std::ffi::c_void;

use serde::{Deserialize, Serialize};
use werror_core::{AnnotatedError, Code, access};

// ---------------------------------------------------------------------------
// ReportFrame
// ---------------------------------------------------------------------------

/// One stack frame, symbolised when debug info was available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFrame {
    /// Instruction address.
    pub address: usize,
    /// Demangled symbol name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Source line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl ReportFrame {
    /// A frame with only its address.
    pub fn unresolved(address: usize) -> Self {
        Self {
            address,
            symbol: None,
            file: None,
            line: None,
        }
    }
}

/// Symbolise frame addresses.
///
/// Each address keeps the innermost symbol the resolver reports for it.
/// Addresses that cannot be resolved come back as [`ReportFrame::unresolved`].
pub fn resolve_frames(addresses: &[usize]) -> Vec<ReportFrame> {
    addresses
        .iter()
        .map(|&address| {
            let mut frame = ReportFrame::unresolved(address);
            backtrace::resolve(address as *mut c_void, |symbol| {
                if frame.symbol.is_some() {
                    return;
                }
                frame.symbol = symbol.name().map(|n| n.to_string());
                frame.file = symbol.filename().map(|p| p.display().to_string());
                frame.line = symbol.lineno();
            });
            frame
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ErrorReport
// ---------------------------------------------------------------------------

/// Everything a crash reporter needs to know about one error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Display form of the reason; empty when none was set.
    pub reason: String,
    /// Status code.
    pub code: Code,
    /// Joined message.
    pub message: String,
    /// Message fragments, oldest first.
    pub messages: Vec<String>,
    /// `file:line:column` of the capture site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Captured frames, innermost first.
    #[serde(default)]
    pub frames: Vec<ReportFrame>,
    /// Display strings of the errors underneath the annotated one.
    #[serde(default)]
    pub causes: Vec<String>,
    /// Deployment stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_stage: Option<String>,
}

impl ErrorReport {
    /// Build a report from any error.
    ///
    /// The first [`AnnotatedError`] in the `source()` chain supplies the
    /// metadata. Without one, the report carries the error's display string
    /// and default metadata.
    pub fn from_error(err: &(dyn StdError + 'static), resolve_symbols: bool) -> Self {
        match access::find(err) {
            Some(werr) => Self::from_annotated(werr, resolve_symbols),
            None => {
                let text = err.to_string();
                Self {
                    reason: String::new(),
                    code: Code::Unknown,
                    message: text.clone(),
                    messages: vec![text],
                    location: None,
                    frames: Vec::new(),
                    causes: causes_below(err),
                    release_stage: None,
                }
            }
        }
    }

    fn from_annotated(werr: &AnnotatedError, resolve_symbols: bool) -> Self {
        let frames = if resolve_symbols {
            resolve_frames(werr.callers())
        } else {
            werr.callers()
                .iter()
                .copied()
                .map(ReportFrame::unresolved)
                .collect()
        };
        Self {
            reason: werr.reason().to_string(),
            code: werr.code(),
            message: werr.message(),
            messages: werr.messages().to_vec(),
            location: werr.location().map(|l| l.to_string()),
            frames,
            causes: causes_below(werr),
            release_stage: None,
        }
    }

    /// Attach a release stage.
    pub fn with_release_stage(mut self, stage: Option<String>) -> Self {
        self.release_stage = stage;
        self
    }
}

fn causes_below(err: &(dyn StdError + 'static)) -> Vec<String> {
    access::chain(err).skip(1).map(|e| e.to_string()).collect()
}
