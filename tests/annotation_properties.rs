// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cross-crate checks of the annotation model: wrapping, overwrite and
//! accumulation rules, defaults for plain errors, and capture stability.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use proptest::prelude::*;
use werror_core::{
    AnnotatedError, Annotator, BoxError, Code, StaticReason, access, with_callers, with_code,
    with_ignore_report, with_message, with_reason, wrap, wrap_opt,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn fast_config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    }
}

#[derive(Debug)]
struct Context {
    what: &'static str,
    inner: BoxError,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.what)
    }
}

impl StdError for Context {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_ref() as &(dyn StdError + 'static))
    }
}

const REASONS: [&str; 4] = ["", "user_not_found", "quota", "conflict"];

fn arb_code() -> BoxedStrategy<Code> {
    prop::sample::select(Code::ALL.to_vec()).boxed()
}

/// One annotator plus a mirror of what it should do to the metadata.
#[derive(Debug, Clone)]
enum Step {
    Code(Code),
    Reason(&'static str),
    Message(String),
    Ignore,
    Noop,
}

impl Step {
    fn annotator(&self) -> Annotator {
        match self {
            Step::Code(c) => with_code(*c),
            Step::Reason(r) => with_reason(StaticReason(*r)),
            Step::Message(m) => with_message(m.clone()),
            Step::Ignore => with_ignore_report(),
            Step::Noop => Annotator::Noop,
        }
    }
}

fn arb_step() -> BoxedStrategy<Step> {
    prop_oneof![
        arb_code().prop_map(Step::Code),
        prop::sample::select(REASONS.to_vec()).prop_map(Step::Reason),
        "[a-z ]{0,12}".prop_map(Step::Message),
        Just(Step::Ignore),
        Just(Step::Noop),
    ]
    .boxed()
}

// ── Wrap never yields a bare error ──────────────────────────────────────

#[test]
fn wrap_without_annotators_still_annotates() {
    let err = wrap(io::Error::other("base"), Vec::new());
    assert_eq!(err.code(), Code::Unknown);
    assert!(err.reason().is_empty());
    assert!(err.should_report());
    assert!(!err.callers().is_empty());
}

#[test]
fn wrap_opt_of_none_is_none() {
    let out = wrap_opt(
        None::<io::Error>,
        [with_code(Code::Aborted), with_callers(0)],
    );
    assert!(out.is_none());
}

// ── Plain errors read as defaults ───────────────────────────────────────

#[test]
fn plain_error_defaults() {
    let err = io::Error::other("plain");
    assert_eq!(access::code(&err), Code::Unknown);
    assert_eq!(access::reason(&err).to_string(), "");
    assert_eq!(access::message(&err), "");
    assert!(access::should_report(&err));
    assert!(access::callers(&err).is_empty());
}

#[test]
fn annotated_error_inside_plain_wrapper_is_found_not_read() {
    let inner = wrap(io::Error::other("db"), [with_code(Code::Unavailable)]);
    let outer = Context {
        what: "handling request",
        inner: Box::new(inner),
    };
    assert_eq!(access::code(&outer), Code::Unknown);
    let found = access::find(&outer).unwrap();
    assert_eq!(found.code(), Code::Unavailable);
    assert!(access::is_caused_by::<io::Error>(&outer));
}

// ── Capture stability ───────────────────────────────────────────────────

#[inline(never)]
fn repository_lookup() -> AnnotatedError {
    wrap(io::Error::other("row missing"), [with_code(Code::NotFound)])
}

#[inline(never)]
fn service_layer() -> AnnotatedError {
    wrap(repository_lookup(), [with_message("loading profile")])
}

#[test]
fn deepest_capture_site_survives_rewrapping() {
    let direct = repository_lookup();
    let layered = service_layer();
    assert_eq!(direct.location().map(|l| l.line()), layered.location().map(|l| l.line()));
    assert_eq!(layered.message(), "row missing : loading profile");
    assert_eq!(layered.code(), Code::NotFound);
}

#[test]
fn annotated_errors_travel_between_threads() {
    let err = std::thread::spawn(|| wrap(io::Error::other("worker"), [with_code(Code::Internal)]))
        .join()
        .unwrap();
    assert_eq!(err.code(), Code::Internal);
    assert!(!err.callers().is_empty());
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(fast_config())]

    /// Last code and reason win, messages accumulate, the flag only clears.
    #[test]
    fn annotators_follow_overwrite_and_append_rules(
        base in "[a-z]{1,10}",
        steps in prop::collection::vec(arb_step(), 0..12),
    ) {
        let err = wrap(io::Error::other(base.clone()), steps.iter().map(Step::annotator));

        let mut code = Code::Unknown;
        let mut reason = "";
        let mut messages = vec![base];
        let mut report = true;
        for step in &steps {
            match step {
                Step::Code(c) => code = *c,
                Step::Reason(r) => reason = *r,
                Step::Message(m) => messages.push(m.clone()),
                Step::Ignore => report = false,
                Step::Noop => {}
            }
        }

        prop_assert_eq!(access::code(&err), code);
        prop_assert_eq!(access::reason(&err).to_string(), reason);
        prop_assert_eq!(access::message(&err), messages.join(" : "));
        prop_assert_eq!(access::should_report(&err), report);
        prop_assert!(!access::callers(&err).is_empty());
    }

    /// Re-wrapping never replaces the first capture.
    #[test]
    fn rewrap_keeps_callers(layers in prop::collection::vec(arb_step(), 1..6)) {
        let first = wrap(io::Error::other("base"), Vec::new());
        let frames = first.callers().to_vec();
        let mut err = first;
        for step in &layers {
            err = wrap(err, [step.annotator(), with_callers(0)]);
        }
        prop_assert_eq!(err.callers(), frames.as_slice());
    }

    /// Display always follows the fixed layout.
    #[test]
    fn display_layout(code in arb_code(), msg in "[a-z]{1,8}") {
        let err = wrap(AnnotatedError::new(msg.clone()), [with_code(code)]);
        prop_assert_eq!(
            err.to_string(),
            format!("reason: , code: {}, message: {}", code.as_i32(), msg)
        );
    }
}

// ── Interop ─────────────────────────────────────────────────────────────

#[test]
fn anyhow_errors_can_be_wrapped() {
    let err = anyhow::anyhow!("config missing").context("starting server");
    let werr = wrap(err, [with_code(Code::FailedPrecondition)]);
    assert_eq!(werr.code(), Code::FailedPrecondition);
    assert_eq!(werr.message(), "starting server");
    assert!(werr.source().is_some());
}
