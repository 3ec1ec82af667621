//! Capture backend abstraction for device screen recording.
//!
//! This module provides a unified interface over the ways a recording can be
//! produced:
//! - `AdbBackend` drives `adb shell screenrecord` as a background process per
//!   device and pulls the finished file off the device
//! - `MockBackend` for testing with scriptable per-device failures

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use super::types::{RecordingError, RecordingResult};
use crate::config::AdbSettings;
use crate::session::{sanitize_test_name, session_timestamp};

/// Trait for capture backends
///
/// `start` launches a recording on the given device and returns the
/// device-local path of the capture target. `stop` ends the recording and
/// retrieves the file to `local`, returning the local path. Either operation
/// may fail; the recording coordinator is responsible for catching failures
/// per device.
pub trait CaptureBackend: Send {
    /// Start recording on a device, returning the device-local capture path
    fn start(&mut self, device: &str, test_name: &str) -> RecordingResult<PathBuf>;

    /// Stop recording on a device and retrieve the file to `local`
    fn stop(&mut self, device: &str, remote: &Path, local: &Path) -> RecordingResult<PathBuf>;

    /// Get the backend type identifier (e.g., "adb", "mock")
    fn backend_type(&self) -> &str;
}

// ============================================================================
// adb screenrecord backend
// ============================================================================

/// Capture backend driving `adb shell screenrecord`
///
/// One background process is spawned per device; processes for different
/// devices record independently. Stop requests are serialized because the adb
/// host connection is a single control channel.
pub struct AdbBackend {
    settings: AdbSettings,
    children: HashMap<String, Child>,
}

impl AdbBackend {
    /// Create an adb backend with the given tuning
    pub fn new(settings: AdbSettings) -> Self {
        Self {
            settings,
            children: HashMap::new(),
        }
    }

    /// Number of devices with a live recorder process
    pub fn active(&self) -> usize {
        self.children.len()
    }
}

impl CaptureBackend for AdbBackend {
    fn start(&mut self, device: &str, test_name: &str) -> RecordingResult<PathBuf> {
        let remote = format!(
            "/sdcard/{}_{}_{}.mp4",
            sanitize_test_name(device),
            session_timestamp(),
            sanitize_test_name(test_name)
        );

        let child = Command::new("adb")
            .args(["-s", device, "shell", "screenrecord"])
            .args(["--bit-rate", &self.settings.bit_rate.to_string()])
            .args(["--time-limit", &self.settings.time_limit_secs.to_string()])
            .arg(&remote)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                RecordingError::Capture(format!(
                    "failed to spawn screenrecord on '{}': {}",
                    device, e
                ))
            })?;
        self.children.insert(device.to_string(), child);
        info!("started screen recording on {} -> {}", device, remote);

        // Give screenrecord a moment to actually begin writing
        thread::sleep(Duration::from_millis(self.settings.start_settle_ms));
        Ok(PathBuf::from(remote))
    }

    fn stop(&mut self, device: &str, remote: &Path, local: &Path) -> RecordingResult<PathBuf> {
        let mut child = self.children.remove(device).ok_or_else(|| {
            RecordingError::Capture(format!("no active recording for '{}'", device))
        })?;

        request_stop(&mut child);
        if !wait_with_grace(&mut child, Duration::from_secs(self.settings.stop_grace_secs)) {
            let _ = child.kill();
            let _ = child.wait();
            // Whatever the device wrote is truncated mid-stream; drop the
            // remote file and report the capture as lost.
            remove_remote_file(device, remote);
            return Err(RecordingError::Timeout(device.to_string()));
        }
        debug!("screenrecord on {} exited", device);

        // Let the device finalize the mp4 container before pulling
        thread::sleep(Duration::from_millis(self.settings.stop_finalize_ms));

        let output = Command::new("adb")
            .args(["-s", device, "pull"])
            .arg(remote)
            .arg(local)
            .output()?;
        // The remote file is removed even when the pull failed, so a broken
        // pull does not strand recordings on the device.
        remove_remote_file(device, remote);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecordingError::Capture(format!(
                "adb pull failed for '{}': {}",
                device,
                stderr.trim()
            )));
        }
        info!("video pulled to {}", local.display());
        Ok(local.to_path_buf())
    }

    fn backend_type(&self) -> &str {
        "adb"
    }
}

/// Ask the recorder process to stop. On unix screenrecord finalizes the file
/// on SIGINT; elsewhere the process is killed outright.
#[cfg(unix)]
fn request_stop(child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;
    let _ = kill(Pid::from_raw(child.id() as i32), Signal::SIGINT);
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child) {
    let _ = child.kill();
}

/// Wait for the child to exit within the grace period. Returns false if it
/// is still running when the period elapses.
fn wait_with_grace(child: &mut Child, grace: Duration) -> bool {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) => {}
            Err(_) => return true,
        }
        if start.elapsed() >= grace {
            return false;
        }
        thread::sleep(Duration::from_millis(100));
    }
}

/// Best-effort removal of the device-side capture file
fn remove_remote_file(device: &str, remote: &Path) {
    let _ = Command::new("adb")
        .args(["-s", device, "shell", "rm", "-f"])
        .arg(remote)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

// ============================================================================
// Mock backend
// ============================================================================

#[derive(Debug, Default)]
struct MockState {
    fail_start: HashSet<String>,
    fail_stop: HashSet<String>,
    start_calls: Vec<String>,
    stop_calls: Vec<(String, PathBuf)>,
    active: HashSet<String>,
}

/// Scriptable capture backend for tests
///
/// Clones share state, so a test can keep a handle for assertions while the
/// listener owns the backend. `stop` writes a stub file to the local path so
/// artifact presence can be asserted on disk.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a mock backend that succeeds for every device
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `start` fail for the given device
    pub fn fail_start_for(&self, device: &str) {
        self.inner.lock().unwrap().fail_start.insert(device.to_string());
    }

    /// Make `stop` fail for the given device
    pub fn fail_stop_for(&self, device: &str) {
        self.inner.lock().unwrap().fail_stop.insert(device.to_string());
    }

    /// Devices `start` was called for, in call order
    pub fn start_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().start_calls.clone()
    }

    /// `(device, local_path)` pairs `stop` was called with, in call order
    pub fn stop_calls(&self) -> Vec<(String, PathBuf)> {
        self.inner.lock().unwrap().stop_calls.clone()
    }

    /// Number of `stop` calls for one device
    pub fn stop_count(&self, device: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .stop_calls
            .iter()
            .filter(|(d, _)| d == device)
            .count()
    }
}

impl CaptureBackend for MockBackend {
    fn start(&mut self, device: &str, test_name: &str) -> RecordingResult<PathBuf> {
        let mut state = self.inner.lock().unwrap();
        state.start_calls.push(device.to_string());
        if state.fail_start.contains(device) {
            return Err(RecordingError::Capture(format!(
                "mock start failure for '{}'",
                device
            )));
        }
        state.active.insert(device.to_string());
        Ok(PathBuf::from(format!(
            "/sdcard/{}_{}.mp4",
            sanitize_test_name(device),
            sanitize_test_name(test_name)
        )))
    }

    fn stop(&mut self, device: &str, _remote: &Path, local: &Path) -> RecordingResult<PathBuf> {
        let mut state = self.inner.lock().unwrap();
        state.stop_calls.push((device.to_string(), local.to_path_buf()));
        if !state.active.remove(device) {
            return Err(RecordingError::Capture(format!(
                "no active recording for '{}'",
                device
            )));
        }
        if state.fail_stop.contains(device) {
            return Err(RecordingError::Capture(format!(
                "mock stop failure for '{}'",
                device
            )));
        }
        fs::write(local, b"mock video data")?;
        Ok(local.to_path_buf())
    }

    fn backend_type(&self) -> &str {
        "mock"
    }
}
