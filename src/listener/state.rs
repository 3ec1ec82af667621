//! Listener state and lifecycle dispatch.
//!
//! [`ListenerState`] owns everything that lives for one report run: the
//! configuration, the capture backend, the session registry, the summary
//! aggregator and the report buffer. It is constructed once at process start
//! and passed by reference into every lifecycle callback, never held in a
//! process global.
//!
//! Every public callback delegates to an internal `Result`-returning
//! operation and downgrades any error to a warning. Artifact capture is
//! best-effort instrumentation: no error originating here may leak into the
//! test's own pass/fail result.

use std::path::PathBuf;

use log::{info, warn};

use super::types::{ListenerResult, RunContext, TestOutcome, TestStatus};
use crate::config::RecorderConfig;
use crate::execlog;
use crate::recording::{self, CaptureBackend};
use crate::report::{self, ReportBuffer, SummaryAggregator, SummaryRow};
use crate::session::SessionRegistry;

/// Per-run orchestrator state, driven by test lifecycle callbacks
pub struct ListenerState {
    config: RecorderConfig,
    backend: Box<dyn CaptureBackend>,
    output_dir: PathBuf,
    registry: SessionRegistry,
    summary: SummaryAggregator,
    report: ReportBuffer,
    /// Name of the test currently executing, for keyword/message relay
    active_test: Option<String>,
}

impl ListenerState {
    /// Create the listener state for one report run
    pub fn new(
        config: RecorderConfig,
        backend: Box<dyn CaptureBackend>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let output_dir = output_dir.into();
        info!(
            "listener config | screen_recording={}, execution_log={}, backend={}",
            config.video_mode,
            config.log_mode,
            backend.backend_type()
        );
        Self {
            config,
            backend,
            summary: SummaryAggregator::new(&output_dir),
            output_dir,
            registry: SessionRegistry::new(),
            report: ReportBuffer::new(),
            active_test: None,
        }
    }

    /// The run configuration
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// The cross-test summary recorded so far
    pub fn summary(&self) -> &SummaryAggregator {
        &self.summary
    }

    /// Currently active sessions
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Lifecycle callbacks
    // ------------------------------------------------------------------

    /// Called by the runner when a test starts
    pub fn start_test(&mut self, test_name: &str, ctx: &RunContext) {
        if let Err(e) = self.try_start_test(test_name, ctx) {
            warn!("failed to start artifact capture for '{}': {}", test_name, e);
        }
    }

    /// Called by the runner when a test ends, with its final status
    pub fn end_test(&mut self, test_name: &str, status: TestStatus) {
        if let Err(e) = self.try_end_test(test_name, TestOutcome::now(status)) {
            warn!("failed to finalize artifacts for '{}': {}", test_name, e);
        }
    }

    /// Keyword-start event for the currently active test
    pub fn start_keyword(&mut self, name: &str) {
        self.relay(&format!("▶ KEYWORD START: {}", name));
    }

    /// Keyword-end event for the currently active test
    pub fn end_keyword(&mut self, name: &str, passed: bool) {
        let (glyph, status) = if passed { ("✔", "PASS") } else { ("✘", "FAIL") };
        self.relay(&format!("{} KEYWORD END: {} ({})", glyph, name, status));
    }

    /// Generic log-message event for the currently active test
    pub fn log_message(&mut self, level: &str, message: &str) {
        self.relay(&format!("{}: {}", level, message.trim()));
    }

    /// Called once by the runner when the whole run ends. Renders the summary
    /// table at the top of the report, writes the report file and optionally
    /// archives the run-level files.
    pub fn close(&mut self) {
        if let Err(e) = self.try_close() {
            warn!("failed to finalize report: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Internal operations
    // ------------------------------------------------------------------

    fn try_start_test(&mut self, test_name: &str, ctx: &RunContext) -> ListenerResult<()> {
        let devices = ctx.device_names();
        let Some(session) = recording::begin_session(
            self.backend.as_mut(),
            &self.config,
            &devices,
            &self.output_dir,
            test_name,
        )?
        else {
            return Ok(());
        };

        if let Err(e) = execlog::open(&session, &devices) {
            warn!("failed to open execution log for '{}': {}", test_name, e);
        }
        self.active_test = Some(test_name.to_string());
        self.registry.insert(session);
        Ok(())
    }

    fn try_end_test(&mut self, test_name: &str, outcome: TestOutcome) -> ListenerResult<()> {
        if self.active_test.as_deref() == Some(test_name) {
            self.active_test = None;
        }
        // Removing the session first makes a second end-test a no-op and
        // guarantees no state leaks into a later test with the same name.
        let Some(mut session) = self.registry.remove(test_name) else {
            return Ok(());
        };

        let failed = outcome.status.is_failure();
        let persisted_videos =
            recording::end_session(self.backend.as_mut(), &self.config, &mut session, &outcome);

        let log_persisted = session.record_log && self.config.log_mode.should_persist(failed);
        if log_persisted {
            if let Err(e) = execlog::close(&session, outcome.status, outcome.end_time) {
                warn!("failed to finalize execution log for '{}': {}", test_name, e);
            }
        }

        if let Some(fragment) = report::render_artifacts(
            &session,
            &persisted_videos,
            log_persisted,
            &self.output_dir,
        ) {
            self.report.push_fragment(fragment);
        }

        let duration =
            (outcome.end_time - session.start_time).num_milliseconds().max(0) as f64 / 1000.0;
        let row = SummaryRow::new(
            test_name,
            &session.device_names(),
            outcome.status,
            duration,
            !persisted_videos.is_empty(),
            log_persisted,
        );
        self.summary.record_completion(row)?;
        Ok(())
    }

    /// Forward one timeline line to the active test's execution log. Dropped
    /// silently when no test is active or the test is not in the registry.
    fn relay(&mut self, line: &str) {
        let Some(test_name) = self.active_test.as_deref() else {
            return;
        };
        let Some(session) = self.registry.get(test_name) else {
            return;
        };
        if let Err(e) = execlog::append(session, line) {
            warn!("failed to append execution log line: {}", e);
        }
    }

    fn try_close(&mut self) -> ListenerResult<()> {
        if let Some(header) = self.summary.render_header_once() {
            self.report.set_header(header);
        }
        self.summary.export()?;
        self.report.write(&self.output_dir.join(report::REPORT_FILE))?;
        if self.config.archive_reports {
            report::archive_run_files(&self.output_dir)?;
        }
        Ok(())
    }
}
