//! Integration tests driving the full listener lifecycle over the mock
//! capture backend.

use std::fs;
use std::path::Path;

use dut_recorder::report::{REPORT_FILE, SUMMARY_CSV, SUMMARY_JSON};
use dut_recorder::{
    CaptureMode, DeviceInfo, ListenerState, MockBackend, RecorderConfig, RunContext, TestStatus,
};

fn listener(
    dir: &Path,
    video: CaptureMode,
    log: CaptureMode,
) -> (ListenerState, MockBackend) {
    let backend = MockBackend::new();
    let config = RecorderConfig::defaults()
        .with_video_mode(video)
        .with_log_mode(log);
    let state = ListenerState::new(config, Box::new(backend.clone()), dir);
    (state, backend)
}

fn ctx(devices: &[&str]) -> RunContext {
    RunContext::new(devices.iter().map(|d| DeviceInfo::Named(d.to_string())).collect())
}

fn csv_data_lines(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join(SUMMARY_CSV))
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[test]
fn test_on_failure_video_not_persisted_on_pass() {
    // screen_recording_mode=yes, execution_log_mode=always, one device, pass
    let dir = tempfile::tempdir().unwrap();
    let (mut state, backend) = listener(dir.path(), CaptureMode::OnFailure, CaptureMode::Always);

    state.start_test("Login Test", &ctx(&["Phone"]));
    state.start_keyword("Open App");
    state.end_keyword("Open App", true);
    state.end_test("Login Test", TestStatus::Pass);

    // Capture was started and reaped but the video was discarded.
    assert_eq!(backend.start_calls(), vec!["Phone"]);
    assert_eq!(backend.stop_count("Phone"), 1);
    let videos: Vec<_> = fs::read_dir(dir.path().join("videos"))
        .unwrap()
        .flatten()
        .collect();
    assert!(videos.is_empty(), "no video should survive a pass");

    let lines = csv_data_lines(dir.path());
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Login Test,Phone,PASS,"));
    assert!(lines[0].ends_with(",False,True"));
}

#[test]
fn test_on_failure_video_persisted_on_fail() {
    let dir = tempfile::tempdir().unwrap();
    let (mut state, backend) = listener(dir.path(), CaptureMode::OnFailure, CaptureMode::Always);

    state.start_test("Login Test", &ctx(&["Phone"]));
    state.end_test("Login Test", TestStatus::Fail);

    assert_eq!(backend.stop_count("Phone"), 1);
    let videos: Vec<_> = fs::read_dir(dir.path().join("videos"))
        .unwrap()
        .flatten()
        .collect();
    assert_eq!(videos.len(), 1);

    let lines = csv_data_lines(dir.path());
    assert!(lines[0].starts_with("Login Test,Phone,FAIL,"));
    assert!(lines[0].ends_with(",True,True"));
}

#[test]
fn test_never_mode_never_starts_capture() {
    let dir = tempfile::tempdir().unwrap();
    let (mut state, backend) = listener(dir.path(), CaptureMode::Never, CaptureMode::Always);

    state.start_test("Checkout", &ctx(&["Phone", "Main"]));
    state.end_test("Checkout", TestStatus::Fail);

    assert!(backend.start_calls().is_empty());
    assert!(backend.stop_calls().is_empty());

    let lines = csv_data_lines(dir.path());
    assert!(lines[0].starts_with("Checkout,\"Phone, Main\",FAIL,"));
    assert!(lines[0].ends_with(",False,True"));
}

#[test]
fn test_partial_start_failure_embeds_surviving_device_only() {
    // start throws for Main, succeeds for Phone; pass with mode=always
    let dir = tempfile::tempdir().unwrap();
    let (mut state, backend) = listener(dir.path(), CaptureMode::Always, CaptureMode::Never);
    backend.fail_start_for("Main");

    state.start_test("Sync", &ctx(&["Phone", "Main"]));
    state.end_test("Sync", TestStatus::Pass);
    state.close();

    // Only Phone's capture is stopped and pulled.
    assert_eq!(backend.stop_calls().len(), 1);
    assert_eq!(backend.stop_calls()[0].0, "Phone");

    let report = fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
    assert_eq!(report.matches("<video").count(), 1);
    assert!(report.contains("videos/Phone_"));
    assert!(!report.contains("videos/Main_"));

    // Degraded capture still yields a row; the surviving video counts.
    let lines = csv_data_lines(dir.path());
    assert!(lines[0].ends_with(",True,False"));
}

#[test]
fn test_execution_log_contents_across_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let (mut state, _backend) = listener(dir.path(), CaptureMode::Never, CaptureMode::Always);

    state.start_test("Login Test", &ctx(&["Phone"]));
    let log_path = state.registry().get("Login Test").unwrap().log_path.clone();
    state.start_keyword("Open App");
    state.log_message("INFO", "tapped login button");
    state.end_keyword("Open App", false);
    state.end_test("Login Test", TestStatus::Fail);

    let content = fs::read_to_string(&log_path).unwrap();
    assert!(content.starts_with("Test Name   : Login Test\n"));
    assert!(content.contains("--- Execution Timeline ---"));
    let timeline: Vec<&str> = content.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(timeline.len(), 3);
    assert!(timeline[0].ends_with("▶ KEYWORD START: Open App"));
    assert!(timeline[1].ends_with("INFO: tapped login button"));
    assert!(timeline[2].ends_with("✘ KEYWORD END: Open App (FAIL)"));
    assert!(content.contains("--- Summary ---"));
    assert!(content.contains("Status      : FAIL"));
}

#[test]
fn test_summary_files_current_after_every_test() {
    let dir = tempfile::tempdir().unwrap();
    let (mut state, _backend) = listener(dir.path(), CaptureMode::Never, CaptureMode::Never);

    let script = [
        ("alpha", TestStatus::Pass),
        ("beta", TestStatus::Fail),
        ("gamma", TestStatus::Skip),
    ];
    for (i, (name, status)) in script.iter().enumerate() {
        state.start_test(name, &ctx(&["Phone"]));
        state.end_test(name, *status);

        assert_eq!(csv_data_lines(dir.path()).len(), i + 1);
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_JSON)).unwrap())
                .unwrap();
        assert_eq!(json.as_array().unwrap().len(), i + 1);
    }

    state.close();
    let report = fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
    assert!(report.contains("PASS: 1 | FAIL: 1 | SKIP: 1"));
    // Summary table sits at the top, before any per-test fragment.
    let rows = ["alpha", "beta", "gamma"];
    for row in rows {
        assert!(report.contains(&format!("<td>{}</td>", row)));
    }
}

#[test]
fn test_report_header_rendered_once_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let (mut state, _backend) = listener(dir.path(), CaptureMode::Never, CaptureMode::Never);

    state.start_test("t1", &ctx(&["Phone"]));
    state.end_test("t1", TestStatus::Pass);
    state.close();
    // A second close keeps the single header and does not duplicate it.
    state.close();

    let report = fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
    assert_eq!(report.matches("Execution Summary").count(), 1);
}

#[test]
fn test_sessions_do_not_leak_across_same_named_tests() {
    let dir = tempfile::tempdir().unwrap();
    let (mut state, backend) = listener(dir.path(), CaptureMode::Always, CaptureMode::Never);

    state.start_test("repeat", &ctx(&["Phone"]));
    state.end_test("repeat", TestStatus::Pass);
    state.start_test("repeat", &ctx(&["Phone"]));
    state.end_test("repeat", TestStatus::Fail);

    assert_eq!(state.summary().rows().len(), 2);
    assert_eq!(backend.stop_count("Phone"), 2);
    assert!(state.registry().is_empty());
}
