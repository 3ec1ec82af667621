//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for the recorder listener,
//! supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults for unattended runs
//! - Explicit construction: the config is built once at startup and owned by
//!   the listener state, never held in a process-wide global
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DUT_RECORDER_SCREEN_RECORDING` | Screen recording mode (`never`/`yes`/`always`) | `never` |
//! | `DUT_RECORDER_EXECUTION_LOG` | Execution log mode (`never`/`yes`/`always`) | `never` |
//! | `DUT_RECORDER_BIT_RATE` | screenrecord bit rate (bits/s) | `8000000` |
//! | `DUT_RECORDER_TIME_LIMIT` | screenrecord time limit (seconds) | `180` |
//! | `DUT_RECORDER_STOP_GRACE` | Grace period before a stuck recorder is killed (seconds) | `5` |
//! | `DUT_RECORDER_ARCHIVE_REPORTS` | Move run reports into a timestamped folder on close | `false` |
//!
//! Invalid mode strings are the one fatal configuration error: no session can
//! ever be established from a config the policy evaluator cannot interpret.

use std::env;

use crate::policy::CaptureMode;

// ============================================================================
// Default Values
// ============================================================================

/// Default screen recording mode
pub const DEFAULT_SCREEN_RECORDING_MODE: CaptureMode = CaptureMode::Never;

/// Default execution log mode
pub const DEFAULT_EXECUTION_LOG_MODE: CaptureMode = CaptureMode::Never;

/// Default screenrecord bit rate (bits per second)
pub const DEFAULT_BIT_RATE: u32 = 8_000_000;

/// Default screenrecord time limit (seconds)
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 180;

/// Default settle delay after starting a recording (milliseconds)
pub const DEFAULT_START_SETTLE_MS: u64 = 500;

/// Default delay between stopping a recording and pulling the file
/// (milliseconds); the device needs a moment to finalize the container
pub const DEFAULT_STOP_FINALIZE_MS: u64 = 1_000;

/// Default grace period before a stuck capture process is killed (seconds)
pub const DEFAULT_STOP_GRACE_SECS: u64 = 5;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the screen recording mode
pub const ENV_SCREEN_RECORDING: &str = "DUT_RECORDER_SCREEN_RECORDING";

/// Environment variable for the execution log mode
pub const ENV_EXECUTION_LOG: &str = "DUT_RECORDER_EXECUTION_LOG";

/// Environment variable for the screenrecord bit rate
pub const ENV_BIT_RATE: &str = "DUT_RECORDER_BIT_RATE";

/// Environment variable for the screenrecord time limit
pub const ENV_TIME_LIMIT: &str = "DUT_RECORDER_TIME_LIMIT";

/// Environment variable for the stop grace period
pub const ENV_STOP_GRACE: &str = "DUT_RECORDER_STOP_GRACE";

/// Environment variable for report archiving
pub const ENV_ARCHIVE_REPORTS: &str = "DUT_RECORDER_ARCHIVE_REPORTS";

/// Environment variable for the comma-separated device list
pub const ENV_DUTS: &str = "DUTS";

/// Environment variable for a single device name
pub const ENV_DUT: &str = "DUT";

// ============================================================================
// Configuration
// ============================================================================

/// Centralized configuration for the recorder listener
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Screen recording policy
    pub video_mode: CaptureMode,
    /// Execution log policy
    pub log_mode: CaptureMode,
    /// Capture backend tuning
    pub adb: AdbSettings,
    /// Move run-level report files into a timestamped folder on close
    pub archive_reports: bool,
}

/// Tuning for the adb screenrecord backend
#[derive(Debug, Clone)]
pub struct AdbSettings {
    /// screenrecord bit rate (bits per second)
    pub bit_rate: u32,
    /// screenrecord time limit (seconds)
    pub time_limit_secs: u32,
    /// Settle delay after spawning the recorder (milliseconds)
    pub start_settle_ms: u64,
    /// Delay between stop and pull so the device can finalize the file
    /// (milliseconds)
    pub stop_finalize_ms: u64,
    /// Grace period before a stuck recorder is killed (seconds)
    pub stop_grace_secs: u64,
}

impl RecorderConfig {
    /// Create configuration from environment variables, falling back to
    /// defaults. An unparseable capture mode is a fatal configuration error.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            video_mode: parse_mode_var(ENV_SCREEN_RECORDING, DEFAULT_SCREEN_RECORDING_MODE)?,
            log_mode: parse_mode_var(ENV_EXECUTION_LOG, DEFAULT_EXECUTION_LOG_MODE)?,
            adb: AdbSettings::from_env(),
            archive_reports: env::var(ENV_ARCHIVE_REPORTS)
                .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            video_mode: DEFAULT_SCREEN_RECORDING_MODE,
            log_mode: DEFAULT_EXECUTION_LOG_MODE,
            adb: AdbSettings::defaults(),
            archive_reports: false,
        }
    }

    /// Set the screen recording mode
    pub fn with_video_mode(mut self, mode: CaptureMode) -> Self {
        self.video_mode = mode;
        self
    }

    /// Set the execution log mode
    pub fn with_log_mode(mut self, mode: CaptureMode) -> Self {
        self.log_mode = mode;
        self
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl AdbSettings {
    /// Create adb settings from environment variables
    pub fn from_env() -> Self {
        Self {
            bit_rate: env::var(ENV_BIT_RATE)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BIT_RATE),
            time_limit_secs: env::var(ENV_TIME_LIMIT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIME_LIMIT_SECS),
            start_settle_ms: DEFAULT_START_SETTLE_MS,
            stop_finalize_ms: DEFAULT_STOP_FINALIZE_MS,
            stop_grace_secs: env::var(ENV_STOP_GRACE)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_STOP_GRACE_SECS),
        }
    }

    /// Create adb settings with defaults
    pub fn defaults() -> Self {
        Self {
            bit_rate: DEFAULT_BIT_RATE,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            start_settle_ms: DEFAULT_START_SETTLE_MS,
            stop_finalize_ms: DEFAULT_STOP_FINALIZE_MS,
            stop_grace_secs: DEFAULT_STOP_GRACE_SECS,
        }
    }
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Parse a capture mode environment variable, falling back to a default when
/// the variable is unset
fn parse_mode_var(var: &str, default: CaptureMode) -> Result<CaptureMode, String> {
    match env::var(var) {
        Ok(value) => value.parse().map_err(|e| format!("{}: {}", var, e)),
        Err(_) => Ok(default),
    }
}
