// SPDX-License-Identifier: MIT OR Apache-2.0
//! Capture settings are process-wide, so this file holds a single test.

use std::io;

use werror_core::capture::{self, CaptureSettings, ConfigureError, MAX_FRAMES_LIMIT};
use werror_core::{with_callers, wrap};

#[test]
fn smallest_cap_still_records_the_call_site() {
    assert_eq!(
        capture::configure(CaptureSettings { max_frames: 0 }),
        Err(ConfigureError::OutOfRange { max_frames: 0 })
    );
    assert_eq!(capture::settings().max_frames, capture::DEFAULT_MAX_FRAMES);

    capture::configure(CaptureSettings { max_frames: 1 }).unwrap();

    let err = wrap(io::Error::other("x"), Vec::new());
    assert_eq!(err.callers().len(), 1);

    let err = wrap(io::Error::other("x"), [with_callers(usize::MAX)]);
    assert_eq!(err.callers().len(), 1);

    assert_eq!(
        capture::configure(CaptureSettings {
            max_frames: MAX_FRAMES_LIMIT
        }),
        Err(ConfigureError::AlreadyConfigured { max_frames: 1 })
    );
    assert_eq!(capture::settings().max_frames, 1);
}
