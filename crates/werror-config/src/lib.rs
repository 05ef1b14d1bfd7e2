// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and installation for werror.
//!
//! [`WerrorConfig`] carries the process-wide stack-capture cap, the level for
//! the log filter returned by [`WerrorConfig::env_filter`], and the policy consumed by `werror-report`. Settings are
//! read from TOML, overridden from `WERROR_*` environment variables, checked
//! by [`validate_config`] and finally put in force with [`install`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::EnvFilter;
use werror_core::Code;
use werror_core::capture::{self, CaptureSettings, ConfigureError, DEFAULT_MAX_FRAMES};

pub use werror_core::capture::MAX_FRAMES_LIMIT;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while loading, validating or installing settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },

    /// Capture settings were already installed for this process.
    #[error("capture settings already installed (max_frames = {max_frames})")]
    AlreadyInstalled {
        /// Frame cap currently in force.
        max_frames: usize,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// The frame cap makes every capture noticeably more expensive.
    LargeMaxFrames {
        /// Configured cap.
        max_frames: usize,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeMaxFrames { max_frames } => {
                write!(f, "max_frames {max_frames} is above {LARGE_MAX_FRAMES_THRESHOLD}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level werror settings.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct WerrorConfig {
    /// Maximum frames recorded per capture. Unset means the built-in default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<usize>,

    /// Default level for [`WerrorConfig::env_filter`] (e.g. `"debug"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Reporting policy.
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for WerrorConfig {
    fn default() -> Self {
        Self {
            max_frames: None,
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            report: ReportConfig::default(),
        }
    }
}

impl WerrorConfig {
    /// Capture settings derived from this configuration.
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            max_frames: self.max_frames.unwrap_or(DEFAULT_MAX_FRAMES),
        }
    }

    /// Log filter for a `tracing-subscriber` built from `log_level`.
    ///
    /// An unset or unrecognised level falls back to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        let level = self
            .log_level
            .as_deref()
            .filter(|l| VALID_LOG_LEVELS.contains(l))
            .unwrap_or(DEFAULT_LOG_LEVEL);
        EnvFilter::new(level)
    }
}

/// Policy applied before an error reaches a notifier.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Master switch; when off nothing is reported.
    pub enabled: bool,

    /// Deployment stage attached to every report (e.g. `"production"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_stage: Option<String>,

    /// Status codes that are never reported.
    pub ignored_codes: Vec<Code>,

    /// Whether frame addresses are symbolised before notifying.
    pub resolve_symbols: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            release_stage: None,
            ignored_codes: Vec::new(),
            resolve_symbols: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Frame cap above which a warning is produced.
const LARGE_MAX_FRAMES_THRESHOLD: usize = 256;

/// Level used when `log_level` is unset.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`WerrorConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`WerrorConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<WerrorConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => WerrorConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`WerrorConfig`].
pub fn parse_toml(content: &str) -> Result<WerrorConfig, ConfigError> {
    toml::from_str::<WerrorConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `WERROR_MAX_FRAMES` (unsigned integer)
/// - `WERROR_LOG_LEVEL`
/// - `WERROR_REPORT_ENABLED` (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`)
/// - `WERROR_RELEASE_STAGE`
///
/// Values that do not parse are ignored and logged.
pub fn apply_env_overrides(config: &mut WerrorConfig) {
    if let Ok(val) = std::env::var("WERROR_MAX_FRAMES") {
        match val.trim().parse::<usize>() {
            Ok(n) => config.max_frames = Some(n),
            Err(_) => tracing::warn!(value = %val, "ignoring unparsable WERROR_MAX_FRAMES"),
        }
    }
    if let Ok(val) = std::env::var("WERROR_LOG_LEVEL") {
        config.log_level = Some(val);
    }
    if let Ok(val) = std::env::var("WERROR_REPORT_ENABLED") {
        match parse_bool(&val) {
            Some(b) => config.report.enabled = b,
            None => tracing::warn!(value = %val, "ignoring unparsable WERROR_REPORT_ENABLED"),
        }
    }
    if let Ok(val) = std::env::var("WERROR_RELEASE_STAGE") {
        config.report.release_stage = Some(val);
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (frame cap out of range, unknown log level, an ignored `OK`
/// code, an empty release stage) are returned as a
/// [`ConfigError::ValidationError`]; soft issues come back as warnings.
pub fn validate_config(config: &WerrorConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(n) = config.max_frames {
        if n == 0 || n > MAX_FRAMES_LIMIT {
            errors.push(format!(
                "max_frames {n} out of range (1..={MAX_FRAMES_LIMIT})"
            ));
        } else if n > LARGE_MAX_FRAMES_THRESHOLD {
            warnings.push(ConfigWarning::LargeMaxFrames { max_frames: n });
        }
    }

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    if config.report.ignored_codes.contains(&Code::Ok) {
        errors.push("report.ignored_codes must not contain OK".into());
    }

    match config.report.release_stage {
        Some(ref stage) if stage.trim().is_empty() => {
            errors.push("report.release_stage must not be empty".into());
        }
        Some(_) => {}
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "report.release_stage".into(),
            hint: "reports will not say which deployment produced them".into(),
        }),
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Values in `overlay` take precedence over `base`.
///
/// Ignored codes are combined without duplicates. The boolean switches are
/// off when either side turns them off.
pub fn merge_configs(base: WerrorConfig, overlay: WerrorConfig) -> WerrorConfig {
    let mut ignored_codes = base.report.ignored_codes;
    for code in overlay.report.ignored_codes {
        if !ignored_codes.contains(&code) {
            ignored_codes.push(code);
        }
    }
    WerrorConfig {
        max_frames: overlay.max_frames.or(base.max_frames),
        log_level: overlay.log_level.or(base.log_level),
        report: ReportConfig {
            enabled: base.report.enabled && overlay.report.enabled,
            release_stage: overlay.report.release_stage.or(base.report.release_stage),
            ignored_codes,
            resolve_symbols: base.report.resolve_symbols && overlay.report.resolve_symbols,
        },
    }
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

/// Validate `config` and install its capture settings for this process.
///
/// Returns the advisory warnings, which are also logged. Installation
/// happens once; a second call fails with [`ConfigError::AlreadyInstalled`].
pub fn install(config: &WerrorConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let warnings = validate_config(config)?;
    for warning in &warnings {
        tracing::warn!(target: "werror::config", "{warning}");
    }

    let settings = config.capture_settings();
    capture::configure(settings).map_err(|e| match e {
        ConfigureError::AlreadyConfigured { max_frames } => {
            ConfigError::AlreadyInstalled { max_frames }
        }
        ConfigureError::OutOfRange { .. } => ConfigError::ValidationError {
            reasons: vec![e.to_string()],
        },
    })?;
    tracing::debug!(
        target: "werror::config",
        max_frames = settings.max_frames,
        "installed capture settings"
    );
    Ok(warnings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
