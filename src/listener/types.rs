use std::env;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::{ENV_DUT, ENV_DUTS};
use crate::recording::RecordingError;

/// Final status of a completed test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
}

impl TestStatus {
    /// Whether this outcome counts as a failure for persistence policy
    pub fn is_failure(self) -> bool {
        matches!(self, TestStatus::Fail)
    }

    /// CSS row class used in the summary export
    pub fn row_class(self) -> &'static str {
        match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Skip => "skip",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
            TestStatus::Skip => "SKIP",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PASS" => Ok(TestStatus::Pass),
            "FAIL" => Ok(TestStatus::Fail),
            "SKIP" => Ok(TestStatus::Skip),
            other => Err(format!("unknown test status '{}'", other)),
        }
    }
}

/// Final outcome of a test as delivered by the runner
#[derive(Debug, Clone, Copy)]
pub struct TestOutcome {
    /// Final status
    pub status: TestStatus,
    /// Completion time
    pub end_time: DateTime<Local>,
}

impl TestOutcome {
    /// Outcome with the current time as completion time
    pub fn now(status: TestStatus) -> Self {
        Self {
            status,
            end_time: Local::now(),
        }
    }
}

/// A device under test as resolved from the runtime context
///
/// The runner may hand over either a bare identifier or a structured
/// capability record; both forms resolve to a name through [`DeviceInfo::name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceInfo {
    /// Bare device identifier
    Named(String),
    /// Structured capability record
    Capability {
        name: String,
        serial: Option<String>,
        platform: Option<String>,
    },
}

impl DeviceInfo {
    /// The device name, whichever form it arrived in
    pub fn name(&self) -> &str {
        match self {
            DeviceInfo::Named(name) => name,
            DeviceInfo::Capability { name, .. } => name,
        }
    }
}

/// Runtime context for one test: the resolved device roster
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Devices the test runs against, in declaration order
    pub devices: Vec<DeviceInfo>,
}

impl RunContext {
    /// Context over an explicit device roster
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self { devices }
    }

    /// Resolve devices from the environment: the `DUTS` comma list first,
    /// falling back to a single `DUT`. Absence of both yields an empty
    /// roster, which downstream treats as a non-fatal skip.
    pub fn from_env() -> Self {
        if let Ok(list) = env::var(ENV_DUTS) {
            let devices = parse_device_list(&list);
            if !devices.is_empty() {
                return Self::new(devices);
            }
        }
        match env::var(ENV_DUT) {
            Ok(single) if !single.trim().is_empty() => {
                Self::new(vec![DeviceInfo::Named(single.trim().to_string())])
            }
            _ => Self::default(),
        }
    }

    /// Resolved device names, in order
    pub fn device_names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.name().to_string()).collect()
    }
}

/// Parse a comma-separated device list, dropping empty entries
pub fn parse_device_list(list: &str) -> Vec<DeviceInfo> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| DeviceInfo::Named(s.to_string()))
        .collect()
}

/// Result type for listener operations
pub type ListenerResult<T> = Result<T, ListenerError>;

/// Error types for listener operations
///
/// These never cross the runner boundary: every public callback routes its
/// internal result through a dispatcher that downgrades errors to warnings.
#[derive(Debug)]
pub enum ListenerError {
    /// Recording subsystem error
    Recording(RecordingError),

    /// I/O error
    Io(std::io::Error),

    /// Invalid configuration at init time
    Config(String),
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::Recording(err) => write!(f, "Recording error: {}", err),
            ListenerError::Io(err) => write!(f, "I/O error: {}", err),
            ListenerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Recording(err) => Some(err),
            ListenerError::Io(err) => Some(err),
            ListenerError::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for ListenerError {
    fn from(err: std::io::Error) -> Self {
        ListenerError::Io(err)
    }
}

impl From<RecordingError> for ListenerError {
    fn from(err: RecordingError) -> Self {
        ListenerError::Recording(err)
    }
}
