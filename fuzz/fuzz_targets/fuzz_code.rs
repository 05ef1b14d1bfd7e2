// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz status-code parsing, annotation and configuration parsing.
//!
//! Verifies:
//! 1. Deserializing arbitrary strings as Code never panics.
//! 2. Integer conversion accepts exactly the 17 known codes.
//! 3. Wrapping with arbitrary messages keeps the display layout.
//! 4. `parse_toml` and `validate_config` never panic.
#![no_main]
use libfuzzer_sys::fuzz_target;
use werror_core::{AnnotatedError, AnnotatedErrorDto, Code, with_code, with_message, wrap};

fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };

    // --- Property 1: JSON deserialization never panics ---
    if let Ok(code) = serde_json::from_str::<Code>(s) {
        assert_eq!(format!("{code}"), code.as_str(), "Display and as_str must agree");
        let json = serde_json::to_string(&code).expect("Code must serialize");
        let rt: Code = serde_json::from_str(&json).expect("Code round-trip must succeed");
        assert_eq!(code, rt);
    }

    // --- Property 2: integer conversion ---
    let raw = i32::from_le_bytes(
        data.get(..4)
            .and_then(|b| b.try_into().ok())
            .unwrap_or([0; 4]),
    );
    match Code::try_from(raw) {
        Ok(code) => assert_eq!(code.as_i32(), raw),
        Err(_) => assert!(!(0..=16).contains(&raw)),
    }

    // --- Property 3: annotation keeps the display layout ---
    let code = Code::ALL[data.first().copied().unwrap_or(0) as usize % Code::ALL.len()];
    let err = wrap(AnnotatedError::new(s), [with_code(code), with_message(s)]);
    let expected = format!("reason: , code: {}, message: {s} : {s}", code.as_i32());
    assert_eq!(err.to_string(), expected);
    let dto = AnnotatedErrorDto::from(&err);
    assert_eq!(dto.messages.len(), 2);

    // --- Property 4: config parsing never panics ---
    if let Ok(cfg) = werror_config::parse_toml(s) {
        match werror_config::validate_config(&cfg) {
            Ok(warnings) => {
                for w in &warnings {
                    let _ = format!("{w}");
                }
            }
            Err(e) => {
                let _ = format!("{e}");
            }
        }
    }
});
