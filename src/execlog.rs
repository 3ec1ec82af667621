//! Timestamped per-test execution logs.
//!
//! Every keyword-level event during a log-enabled test is appended as one
//! line. Each append opens the file in append mode and lets the handle drop
//! immediately, so there is no cross-call buffering and a crash mid-test
//! leaves a valid partial log on disk.
//!
//! All operations are silent no-ops when the session was started with
//! `record_log == false`. The flag is checked on every call, not just at
//! open, since it is test-scoped state.

use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::{DateTime, Local};

use crate::listener::TestStatus;
use crate::session::TestSession;

/// Create the log file and write the fixed header block
pub fn open(session: &TestSession, devices: &[String]) -> std::io::Result<()> {
    if !session.record_log {
        return Ok(());
    }
    let mut file = File::create(&session.log_path)?;
    writeln!(file, "Test Name   : {}", session.test_name)?;
    writeln!(file, "DUTs        : {}", devices.join(", "))?;
    writeln!(file, "Status      : RUNNING")?;
    writeln!(
        file,
        "Start Time  : {}",
        session.start_time.format("%Y-%m-%d %H:%M:%S%.3f")
    )?;
    writeln!(file)?;
    writeln!(file, "--- Execution Timeline ---")?;
    Ok(())
}

/// Append one timeline line, prefixed with a millisecond-precision timestamp
pub fn append(session: &TestSession, line: &str) -> std::io::Result<()> {
    append_at(session, line, Local::now())
}

/// Append one timeline line with an explicit timestamp
pub fn append_at(
    session: &TestSession,
    line: &str,
    timestamp: DateTime<Local>,
) -> std::io::Result<()> {
    if !session.record_log {
        return Ok(());
    }
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&session.log_path)?;
    writeln!(file, "[{}] {}", timestamp.format("%H:%M:%S%.3f"), line)?;
    Ok(())
}

/// Append the summary footer with the final status and duration
pub fn close(
    session: &TestSession,
    status: TestStatus,
    end_time: DateTime<Local>,
) -> std::io::Result<()> {
    if !session.record_log {
        return Ok(());
    }
    let duration = end_time - session.start_time;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&session.log_path)?;
    writeln!(file)?;
    writeln!(file, "--- Summary ---")?;
    writeln!(file, "Status      : {}", status)?;
    writeln!(file, "End Time    : {}", end_time.format("%Y-%m-%d %H:%M:%S%.3f"))?;
    writeln!(
        file,
        "Duration    : {:.3}s",
        duration.num_milliseconds() as f64 / 1000.0
    )?;
    Ok(())
}
