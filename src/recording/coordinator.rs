//! Per-test lifecycle of device capture processes.
//!
//! `begin_session` starts one capture per device at test begin;
//! `end_session` reaps them once the final outcome is known. Individual
//! device failures degrade that device only; they never fail the test or
//! affect the other devices.

use std::path::Path;

use log::{debug, warn};

use super::backend::CaptureBackend;
use super::types::RecordingResult;
use crate::config::RecorderConfig;
use crate::listener::TestOutcome;
use crate::session::{
    self, DeviceCapture, TestSession, ensure_output_layout, sanitize_test_name,
    session_timestamp,
};

/// Create the capture session for a starting test.
///
/// Returns `None` (non-fatal skip) when no device is resolvable. Output
/// directories are created before any capture starts. When video capture is
/// intended, one recording is started per device; a start failure on one
/// device is caught and logged, and that device is kept in the session
/// without a capture handle.
pub fn begin_session(
    backend: &mut dyn CaptureBackend,
    config: &RecorderConfig,
    devices: &[String],
    output_dir: &Path,
    test_name: &str,
) -> RecordingResult<Option<TestSession>> {
    if devices.is_empty() {
        warn!("no DUT/DUTS resolvable; skipping artifact capture for '{}'", test_name);
        return Ok(None);
    }

    let (videos_dir, logs_dir) = ensure_output_layout(output_dir)?;
    let timestamp = session_timestamp();
    let safe_test = sanitize_test_name(test_name);

    let mut session = TestSession::new(
        test_name,
        session::log_path(&logs_dir, &timestamp, &safe_test),
        config.video_mode.intends_capture(),
        config.log_mode.intends_capture(),
    );

    for device in devices {
        let local = session::video_path(&videos_dir, device, &timestamp, &safe_test);
        let remote = if session.record_video {
            match backend.start(device, test_name) {
                Ok(remote) => Some(remote),
                Err(e) => {
                    warn!("failed to start recording on '{}': {}", device, e);
                    None
                }
            }
        } else {
            None
        };
        session.device_captures.push(DeviceCapture {
            device_name: device.clone(),
            remote_video_path: remote,
            local_video_path: local,
        });
    }

    Ok(Some(session))
}

/// Stop and reap every capture in the session, returning the devices whose
/// video was persisted.
///
/// Each capture handle is taken out of the session before stopping, so a
/// second `end_session` on the same session stops nothing. Captures the
/// policy does not persist are still stopped and the pulled file discarded,
/// so no device-side recorder is left running after an aborted test.
/// Per-device stop failures are caught and logged.
pub fn end_session(
    backend: &mut dyn CaptureBackend,
    config: &RecorderConfig,
    session: &mut TestSession,
    outcome: &TestOutcome,
) -> Vec<String> {
    let persist = config.video_mode.should_persist(outcome.status.is_failure());
    let mut persisted = Vec::new();

    for capture in &mut session.device_captures {
        let Some(remote) = capture.remote_video_path.take() else {
            continue;
        };
        if persist {
            match backend.stop(&capture.device_name, &remote, &capture.local_video_path) {
                Ok(_) => persisted.push(capture.device_name.clone()),
                Err(e) => {
                    warn!("failed to stop recording on '{}': {}", capture.device_name, e)
                }
            }
        } else {
            // Stop and discard: the recorder must not keep running, but the
            // outcome does not warrant keeping the file.
            let scratch = capture.local_video_path.with_extension("discard.mp4");
            match backend.stop(&capture.device_name, &remote, &scratch) {
                Ok(pulled) => {
                    let _ = std::fs::remove_file(pulled);
                    debug!("discarded recording for '{}'", capture.device_name);
                }
                Err(e) => {
                    warn!(
                        "failed to stop discarded recording on '{}': {}",
                        capture.device_name, e
                    )
                }
            }
        }
    }

    persisted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::TestStatus;
    use crate::policy::CaptureMode;
    use crate::recording::MockBackend;

    fn config(video: CaptureMode) -> RecorderConfig {
        RecorderConfig::defaults().with_video_mode(video)
    }

    fn devices(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_begin_session_empty_device_list_skips() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = MockBackend::new();
        let session = begin_session(
            &mut backend,
            &config(CaptureMode::Always),
            &[],
            dir.path(),
            "t",
        )
        .unwrap();
        assert!(session.is_none());
        assert!(backend.start_calls().is_empty());
    }

    #[test]
    fn test_begin_session_never_mode_starts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = MockBackend::new();
        let session = begin_session(
            &mut backend,
            &config(CaptureMode::Never),
            &devices(&["Phone", "Main"]),
            dir.path(),
            "t",
        )
        .unwrap()
        .unwrap();
        assert!(backend.start_calls().is_empty());
        assert_eq!(session.device_captures.len(), 2);
        assert_eq!(session.active_captures(), 0);
        assert!(!session.record_video);
    }

    #[test]
    fn test_begin_session_partial_start_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = MockBackend::new();
        backend.fail_start_for("Main");

        let session = begin_session(
            &mut backend,
            &config(CaptureMode::Always),
            &devices(&["Phone", "Main"]),
            dir.path(),
            "t",
        )
        .unwrap()
        .unwrap();

        assert_eq!(backend.start_calls(), vec!["Phone", "Main"]);
        assert_eq!(session.active_captures(), 1);
        assert!(session.device_captures[0].has_handle());
        assert!(!session.device_captures[1].has_handle());
    }

    #[test]
    fn test_end_session_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(CaptureMode::Always);
        let mut backend = MockBackend::new();
        let mut session = begin_session(
            &mut backend,
            &cfg,
            &devices(&["Phone", "Main"]),
            dir.path(),
            "t",
        )
        .unwrap()
        .unwrap();

        let outcome = TestOutcome::now(TestStatus::Pass);
        let persisted = end_session(&mut backend, &cfg, &mut session, &outcome);
        assert_eq!(persisted, vec!["Phone", "Main"]);

        let again = end_session(&mut backend, &cfg, &mut session, &outcome);
        assert!(again.is_empty());
        assert_eq!(backend.stop_count("Phone"), 1);
        assert_eq!(backend.stop_count("Main"), 1);
    }

    #[test]
    fn test_end_session_discards_on_pass_with_on_failure_mode() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(CaptureMode::OnFailure);
        let mut backend = MockBackend::new();
        let mut session = begin_session(&mut backend, &cfg, &devices(&["Phone"]), dir.path(), "t")
            .unwrap()
            .unwrap();

        let persisted = end_session(
            &mut backend,
            &cfg,
            &mut session,
            &TestOutcome::now(TestStatus::Pass),
        );
        assert!(persisted.is_empty());
        // Recorder was still reaped, but neither the real file nor the
        // scratch file survives.
        assert_eq!(backend.stop_count("Phone"), 1);
        assert!(!session.device_captures[0].local_video_path.exists());
        assert!(
            !session.device_captures[0]
                .local_video_path
                .with_extension("discard.mp4")
                .exists()
        );
    }

    #[test]
    fn test_end_session_stop_failure_does_not_abort_others() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(CaptureMode::Always);
        let mut backend = MockBackend::new();
        backend.fail_stop_for("Phone");
        let mut session = begin_session(
            &mut backend,
            &cfg,
            &devices(&["Phone", "Main"]),
            dir.path(),
            "t",
        )
        .unwrap()
        .unwrap();

        let persisted = end_session(
            &mut backend,
            &cfg,
            &mut session,
            &TestOutcome::now(TestStatus::Fail),
        );
        assert_eq!(persisted, vec!["Main"]);
        assert_eq!(backend.stop_count("Phone"), 1);
        assert_eq!(backend.stop_count("Main"), 1);
    }
}
