// SPDX-License-Identifier: MIT OR Apache-2.0
//! Call-stack capture.
//!
//! Frames are recorded as raw instruction-pointer addresses so capture stays
//! cheap; symbolisation is left to whoever eventually reports the error.
//! The [`Location`] recorded next to the frames comes from `#[track_caller]`
//! and is exact even when the optimiser inlines the annotating functions.

use std::fmt;
use std::panic::Location;
use std::sync::OnceLock;

/// Frame cap used when the process never called [`configure`].
pub const DEFAULT_MAX_FRAMES: usize = 100;

/// Process-wide capture settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Maximum number of frames recorded per capture.
    pub max_frames: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

/// Largest accepted frame cap.
pub const MAX_FRAMES_LIMIT: usize = 1024;

/// Errors returned by [`configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigureError {
    /// The frame cap is outside `1..=MAX_FRAMES_LIMIT`.
    #[error("max_frames {max_frames} out of range (1..={limit})", limit = MAX_FRAMES_LIMIT)]
    OutOfRange {
        /// Rejected cap.
        max_frames: usize,
    },

    /// Settings were installed earlier; they stay in force.
    #[error("capture settings already installed (max_frames = {max_frames})")]
    AlreadyConfigured {
        /// Frame cap currently in force.
        max_frames: usize,
    },
}

static SETTINGS: OnceLock<CaptureSettings> = OnceLock::new();

/// Install the capture settings for this process.
///
/// `max_frames` must lie in `1..=MAX_FRAMES_LIMIT`. Settings can be
/// installed once; a second call fails and leaves the installed ones
/// untouched.
pub fn configure(settings: CaptureSettings) -> Result<(), ConfigureError> {
    if !(1..=MAX_FRAMES_LIMIT).contains(&settings.max_frames) {
        return Err(ConfigureError::OutOfRange {
            max_frames: settings.max_frames,
        });
    }
    SETTINGS
        .set(settings)
        .map_err(|_| ConfigureError::AlreadyConfigured {
            max_frames: self::settings().max_frames,
        })
}

/// Settings currently in force.
pub fn settings() -> CaptureSettings {
    SETTINGS.get().copied().unwrap_or_default()
}

/// A captured call stack plus the source location that requested it.
#[derive(Clone, PartialEq, Eq)]
pub struct Callers {
    frames: Vec<usize>,
    location: &'static Location<'static>,
}

impl Callers {
    /// Capture the current stack.
    ///
    /// `skip` frames above the caller of this function are omitted, so
    /// `skip == 0` makes the caller the first recorded frame.
    #[inline(never)]
    #[track_caller]
    pub fn capture(skip: usize) -> Self {
        let location = Location::caller();
        let frames = frames(skip.saturating_add(1), settings().max_frames);
        tracing::trace!(
            target: "werror::capture",
            frames = frames.len(),
            file = location.file(),
            line = location.line(),
            "captured callers"
        );
        Self { frames, location }
    }

    /// Build from already-known parts.
    pub fn from_parts(frames: Vec<usize>, location: &'static Location<'static>) -> Self {
        Self { frames, location }
    }

    /// Raw frame addresses, innermost first.
    pub fn frames(&self) -> &[usize] {
        &self.frames
    }

    /// Source location of the annotating call.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Debug for Callers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callers")
            .field("location", &format_args!("{}", self.location))
            .field("frames", &self.frames.len())
            .finish()
    }
}

/// Frames the unwinder may add below [`frames`] itself.
const UNWINDER_SLACK: usize = 16;

/// Walk the stack, dropping everything up to and including this function
/// plus `skip` further frames, keeping at most `max` addresses.
///
/// A `skip` deeper than the stack falls back to the frames just above this
/// function, so a capture is never empty.
#[inline(never)]
fn frames(skip: usize, max: usize) -> Vec<usize> {
    let here = frames as fn(usize, usize) -> Vec<usize> as usize;
    let max = max.max(1);
    let mut all: Vec<usize> = Vec::with_capacity(32);
    let mut own_frame: Option<usize> = None;

    // Runs inside the unwinder: nothing here may panic.
    backtrace::trace(|frame| {
        if own_frame.is_none() && frame.symbol_address() as usize == here {
            own_frame = Some(all.len());
        }
        all.push(frame.ip() as usize);
        let budget = match own_frame {
            Some(idx) => idx.saturating_add(1).saturating_add(skip).saturating_add(max),
            None => max.saturating_add(UNWINDER_SLACK),
        };
        all.len() < budget
    });

    // Without a recognisable own frame the whole walk is kept.
    let above = own_frame.map_or(0, |idx| idx + 1);
    let start = if above.saturating_add(skip) < all.len() {
        above + skip
    } else {
        above.min(all.len().saturating_sub(1))
    };
    all.into_iter().skip(start).take(max).collect()
}
