//! DUT Recorder - Test artifact orchestration for device-under-test runs.
//!
//! This crate provides:
//! - Conditional screen recording per device, driven by a persistence policy
//!   (`never` / on-failure / `always`) evaluated against the final test outcome
//! - Timestamped per-test execution logs that survive a crash mid-test
//! - Per-test HTML artifact fragments and a run-level summary table
//! - Cumulative CSV/JSON summary exports that stay current after every test
//!
//! # Example
//!
//! ```rust,no_run
//! use dut_recorder::{
//!     CaptureMode, DeviceInfo, ListenerState, MockBackend, RecorderConfig, RunContext,
//!     TestStatus,
//! };
//!
//! let config = RecorderConfig::defaults()
//!     .with_video_mode(CaptureMode::OnFailure)
//!     .with_log_mode(CaptureMode::Always);
//! let mut listener = ListenerState::new(config, Box::new(MockBackend::new()), "./results");
//!
//! let ctx = RunContext::new(vec![DeviceInfo::Named("Phone".to_string())]);
//! listener.start_test("Login Test", &ctx);
//! listener.start_keyword("Open App");
//! listener.end_keyword("Open App", true);
//! listener.end_test("Login Test", TestStatus::Pass);
//! listener.close();
//! ```

pub mod config;
pub mod execlog;
pub mod listener;
pub mod policy;
pub mod recording;
pub mod report;
pub mod session;

// Re-export configuration
pub use config::{AdbSettings, RecorderConfig};

// Re-export listener types
pub use listener::{
    DeviceInfo, ListenerError, ListenerResult, ListenerState, RunContext, TestOutcome,
    TestStatus, parse_device_list,
};

// Re-export the persistence policy
pub use policy::CaptureMode;

// Re-export recording backends
pub use recording::{AdbBackend, CaptureBackend, MockBackend, RecordingError, RecordingResult};

// Re-export report types
pub use report::{ReportBuffer, SummaryAggregator, SummaryRow, SummaryTotals};

// Re-export session management
pub use session::{DeviceCapture, SessionRegistry, TestSession};
