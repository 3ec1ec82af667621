//! Artifact persistence policy.
//!
//! A capture mode decides two independent things for an artifact kind
//! (screen recording or execution log):
//! - whether capture should be *started* at test begin (intent), and
//! - whether the captured artifact should be *kept* once the final test
//!   outcome is known.
//!
//! The two are distinct because `OnFailure` must start capturing before the
//! outcome exists, then discard on a pass.

use std::fmt;
use std::str::FromStr;

/// Persistence policy for one artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Never capture, never keep.
    Never,
    /// Capture always, keep only when the test failed.
    /// Spelled `yes` in configuration.
    OnFailure,
    /// Capture always, keep always.
    Always,
}

impl CaptureMode {
    /// Whether capture should be started at test begin.
    pub fn intends_capture(self) -> bool {
        !matches!(self, CaptureMode::Never)
    }

    /// Whether a captured artifact should be kept for the given outcome.
    pub fn should_persist(self, failed: bool) -> bool {
        match self {
            CaptureMode::Never => false,
            CaptureMode::OnFailure => failed,
            CaptureMode::Always => true,
        }
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" | "no" => Ok(CaptureMode::Never),
            "yes" | "on-failure" => Ok(CaptureMode::OnFailure),
            "always" => Ok(CaptureMode::Always),
            other => Err(format!(
                "invalid capture mode '{}' (expected never, yes or always)",
                other
            )),
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureMode::Never => "never",
            CaptureMode::OnFailure => "yes",
            CaptureMode::Always => "always",
        };
        write!(f, "{}", name)
    }
}
