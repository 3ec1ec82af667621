//! Artifact-capture sessions and the registry of currently-running tests.
//!
//! One [`TestSession`] exists per running test, keyed by test name (unique
//! among active tests since the runner executes tests sequentially). Sessions
//! are created at test start, mutated only by the recording coordinator, and
//! removed from the [`SessionRegistry`] at test end so state never leaks into
//! a later run of a test with the same name.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Subdirectory of the output root holding pulled videos
pub const VIDEOS_SUBDIR: &str = "videos";

/// Subdirectory of the output root holding per-test execution logs
pub const LOGS_SUBDIR: &str = "execution_logs";

/// Per-device capture state within one session
#[derive(Debug, Clone)]
pub struct DeviceCapture {
    /// Device name as resolved from the runtime context
    pub device_name: String,
    /// Device-local recording target; `None` when starting the capture
    /// failed (degraded: the session continues without video for this device)
    pub remote_video_path: Option<PathBuf>,
    /// Destination once the recording is pulled; derived from device name,
    /// session timestamp and sanitized test name so it is unique per
    /// device/session
    pub local_video_path: PathBuf,
}

impl DeviceCapture {
    /// Whether a capture process was actually started for this device
    pub fn has_handle(&self) -> bool {
        self.remote_video_path.is_some()
    }
}

/// The artifact-capture state associated with one running test
#[derive(Debug, Clone)]
pub struct TestSession {
    /// Test name, the session key
    pub test_name: String,
    /// Per-device captures, ordered by first-seen
    pub device_captures: Vec<DeviceCapture>,
    /// Execution log path, assigned at start and immutable afterwards
    pub log_path: PathBuf,
    /// Test start time
    pub start_time: DateTime<Local>,
    /// Capture intent for video, fixed at test start from configuration
    pub record_video: bool,
    /// Capture intent for the execution log, fixed at test start
    pub record_log: bool,
}

impl TestSession {
    /// Create a session with no device captures yet
    pub fn new(
        test_name: impl Into<String>,
        log_path: PathBuf,
        record_video: bool,
        record_log: bool,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            device_captures: Vec::new(),
            log_path,
            start_time: Local::now(),
            record_video,
            record_log,
        }
    }

    /// Names of all devices in this session, in first-seen order
    pub fn device_names(&self) -> Vec<String> {
        self.device_captures
            .iter()
            .map(|c| c.device_name.clone())
            .collect()
    }

    /// Number of devices with an active capture handle
    pub fn active_captures(&self) -> usize {
        self.device_captures.iter().filter(|c| c.has_handle()).count()
    }
}

/// In-memory mapping from running test identity to its capture state
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, TestSession>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its test name, replacing any stale entry
    pub fn insert(&mut self, session: TestSession) {
        self.sessions.insert(session.test_name.clone(), session);
    }

    /// Look up the session for a test
    pub fn get(&self, test_name: &str) -> Option<&TestSession> {
        self.sessions.get(test_name)
    }

    /// Mutable lookup
    pub fn get_mut(&mut self, test_name: &str) -> Option<&mut TestSession> {
        self.sessions.get_mut(test_name)
    }

    /// Remove and return the session for a test; a second removal for the
    /// same test returns `None`, which makes double finalization a no-op
    pub fn remove(&mut self, test_name: &str) -> Option<TestSession> {
        self.sessions.remove(test_name)
    }

    /// Number of currently active sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no test is currently active
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Create the `videos/` and `execution_logs/` directories under the output
/// root (idempotent), returning their paths
pub fn ensure_output_layout(output_dir: &Path) -> std::io::Result<(PathBuf, PathBuf)> {
    let videos_dir = output_dir.join(VIDEOS_SUBDIR);
    let logs_dir = output_dir.join(LOGS_SUBDIR);
    fs::create_dir_all(&videos_dir)?;
    fs::create_dir_all(&logs_dir)?;
    Ok((videos_dir, logs_dir))
}

/// Generate a session timestamp in YYYYMMDD_HHMMSS format
pub fn session_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Sanitize a test name for use in filenames
pub fn sanitize_test_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}

/// Local video path for one device capture:
/// `{videos_dir}/{device}_{timestamp}_{test}.mp4`
pub fn video_path(videos_dir: &Path, device: &str, timestamp: &str, safe_test: &str) -> PathBuf {
    videos_dir.join(format!("{}_{}_{}.mp4", sanitize_test_name(device), timestamp, safe_test))
}

/// Execution log path for one test: `{logs_dir}/{timestamp}_{test}.log`
pub fn log_path(logs_dir: &Path, timestamp: &str, safe_test: &str) -> PathBuf {
    logs_dir.join(format!("{}_{}.log", timestamp, safe_test))
}
