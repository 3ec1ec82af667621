//! Cross-test summary: one row per completed test, exported to CSV/JSON and
//! rendered once per run as a report-level table.
//!
//! Rows are append-only in completion order and never mutated after append.
//! Every `record_completion` rewrites both export files in full, so the files
//! on disk are a consistent snapshot after each completed test even when an
//! earlier export failed partway.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::escape_html;
use crate::listener::TestStatus;
use crate::session::sanitize_test_name;

/// Summary CSV filename under the output root
pub const SUMMARY_CSV: &str = "execution_summary.csv";

/// Summary JSON filename under the output root
pub const SUMMARY_JSON: &str = "execution_summary.json";

/// One completed test in the cross-test summary
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    /// Test name
    pub test: String,
    /// Sanitized test name, usable as an HTML anchor
    pub anchor: String,
    /// Joined device list
    pub duts: String,
    /// Final status
    pub status: TestStatus,
    /// Test duration in seconds
    pub duration: f64,
    /// CSS class for the table row
    pub row_class: String,
    /// Whether at least one device video was persisted
    pub video: bool,
    /// Whether the execution log was persisted
    pub log: bool,
}

impl SummaryRow {
    /// Build a row for a completed test
    pub fn new(
        test: &str,
        devices: &[String],
        status: TestStatus,
        duration_seconds: f64,
        has_video: bool,
        has_log: bool,
    ) -> Self {
        Self {
            test: test.to_string(),
            anchor: sanitize_test_name(test),
            duts: devices.join(", "),
            status,
            duration: duration_seconds,
            row_class: status.row_class().to_string(),
            video: has_video,
            log: has_log,
        }
    }
}

/// PASS/FAIL/SKIP counters, recomputed from the row set on every update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryTotals {
    pub pass: usize,
    pub fail: usize,
    pub skip: usize,
}

impl SummaryTotals {
    /// Recompute totals over a row set
    pub fn from_rows(rows: &[SummaryRow]) -> Self {
        let mut totals = Self::default();
        for row in rows {
            match row.status {
                TestStatus::Pass => totals.pass += 1,
                TestStatus::Fail => totals.fail += 1,
                TestStatus::Skip => totals.skip += 1,
            }
        }
        totals
    }
}

/// Header render state; `Rendered` is terminal for the report run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    NotRendered,
    Rendered,
}

/// Accumulates one row per completed test and keeps the CSV/JSON exports
/// current
#[derive(Debug)]
pub struct SummaryAggregator {
    rows: Vec<SummaryRow>,
    totals: SummaryTotals,
    header: HeaderState,
    csv_path: PathBuf,
    json_path: PathBuf,
}

impl SummaryAggregator {
    /// Create an aggregator exporting under the given output root
    pub fn new(output_dir: &Path) -> Self {
        Self {
            rows: Vec::new(),
            totals: SummaryTotals::default(),
            header: HeaderState::NotRendered,
            csv_path: output_dir.join(SUMMARY_CSV),
            json_path: output_dir.join(SUMMARY_JSON),
        }
    }

    /// Append a completion row, recompute totals and rewrite both exports.
    /// On return the files reflect exactly the rows recorded so far.
    pub fn record_completion(&mut self, row: SummaryRow) -> std::io::Result<()> {
        self.rows.push(row);
        self.totals = SummaryTotals::from_rows(&self.rows);
        self.export()
    }

    /// Rewrite the CSV and JSON exports in full (overwrite semantics)
    pub fn export(&self) -> std::io::Result<()> {
        fs::write(&self.csv_path, self.to_csv())?;
        let json = serde_json::to_string_pretty(&self.rows)
            .map_err(std::io::Error::other)?;
        fs::write(&self.json_path, json)?;
        Ok(())
    }

    /// Render the summary table on the first call; later calls are no-ops.
    /// The render state never transitions back within a report run.
    pub fn render_header_once(&mut self) -> Option<String> {
        match self.header {
            HeaderState::NotRendered => {
                self.header = HeaderState::Rendered;
                Some(self.render_table())
            }
            HeaderState::Rendered => None,
        }
    }

    /// Whether the header has been rendered for this run
    pub fn header_rendered(&self) -> bool {
        self.header == HeaderState::Rendered
    }

    /// Rows recorded so far, in completion order
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Current totals
    pub fn totals(&self) -> SummaryTotals {
        self.totals
    }

    fn to_csv(&self) -> String {
        let mut out = String::from("test,duts,status,duration,video,log\n");
        for row in &self.rows {
            out.push_str(&format!(
                "{},{},{},{:.2},{},{}\n",
                csv_field(&row.test),
                csv_field(&row.duts),
                row.status,
                row.duration,
                bool_field(row.video),
                bool_field(row.log),
            ));
        }
        out
    }

    fn render_table(&self) -> String {
        let mut html = String::from("<div class=\"execution-summary\">\n");
        html.push_str("<h2>Execution Summary</h2>\n");
        html.push_str("<table border=\"1\" cellpadding=\"4\">\n");
        html.push_str(
            "<tr><th>Test</th><th>DUTs</th><th>Status</th>\
             <th>Duration (s)</th><th>Video</th><th>Log</th></tr>\n",
        );
        for row in &self.rows {
            html.push_str(&format!(
                "<tr class=\"{}\" id=\"{}\"><td>{}</td><td>{}</td><td>{}</td>\
                 <td>{:.2}</td><td>{}</td><td>{}</td></tr>\n",
                row.row_class,
                row.anchor,
                escape_html(&row.test),
                escape_html(&row.duts),
                row.status,
                row.duration,
                bool_field(row.video),
                bool_field(row.log),
            ));
        }
        html.push_str("</table>\n");
        html.push_str(&format!(
            "<p>PASS: {} | FAIL: {} | SKIP: {}</p>\n</div>",
            self.totals.pass, self.totals.fail, self.totals.skip
        ));
        html
    }
}

/// Booleans spelled `True`/`False`, the format existing summary consumers
/// expect
fn bool_field(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Quote a CSV field when it contains a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn row(test: &str, status: TestStatus, video: bool, log: bool) -> SummaryRow {
        SummaryRow::new(test, &["Phone".to_string()], status, 1.5, video, log)
    }

    #[test]
    fn test_exports_consistent_at_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut aggregator = SummaryAggregator::new(dir.path());

        for (i, status) in [TestStatus::Pass, TestStatus::Fail, TestStatus::Skip]
            .iter()
            .enumerate()
        {
            aggregator
                .record_completion(row(&format!("test {}", i), *status, false, true))
                .unwrap();

            let csv = fs::read_to_string(dir.path().join(SUMMARY_CSV)).unwrap();
            assert_eq!(csv.lines().count(), i + 2, "header plus one row per test");
            assert!(csv.starts_with("test,duts,status,duration,video,log\n"));

            let json = fs::read_to_string(dir.path().join(SUMMARY_JSON)).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed.as_array().unwrap().len(), i + 1);
        }

        assert_eq!(
            aggregator.totals(),
            SummaryTotals { pass: 1, fail: 1, skip: 1 }
        );
    }

    #[test]
    fn test_json_schema_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut aggregator = SummaryAggregator::new(dir.path());
        aggregator
            .record_completion(row("Login Test", TestStatus::Fail, true, true))
            .unwrap();

        let json = fs::read_to_string(dir.path().join(SUMMARY_JSON)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entry = &parsed.as_array().unwrap()[0];
        assert_eq!(entry["test"], "Login Test");
        assert_eq!(entry["anchor"], "Login_Test");
        assert_eq!(entry["duts"], "Phone");
        assert_eq!(entry["status"], "FAIL");
        assert_eq!(entry["row_class"], "fail");
        assert_eq!(entry["video"], true);
        assert_eq!(entry["log"], true);
    }

    #[test]
    fn test_csv_booleans_and_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let mut aggregator = SummaryAggregator::new(dir.path());
        let mut tricky = row("a,b \"quoted\"", TestStatus::Pass, true, false);
        tricky.duts = "Phone, Main".to_string();
        aggregator.record_completion(tricky).unwrap();

        let csv = fs::read_to_string(dir.path().join(SUMMARY_CSV)).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        assert!(data_line.starts_with("\"a,b \"\"quoted\"\"\",\"Phone, Main\",PASS,"));
        assert!(data_line.ends_with(",True,False"));
    }

    #[test]
    fn test_render_header_once_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let mut aggregator = SummaryAggregator::new(dir.path());
        aggregator
            .record_completion(row("t1", TestStatus::Pass, false, false))
            .unwrap();

        assert!(!aggregator.header_rendered());
        let table = aggregator.render_header_once().unwrap();
        assert!(table.contains("<td>t1</td>"));
        assert!(table.contains("PASS: 1 | FAIL: 0 | SKIP: 0"));
        assert!(aggregator.header_rendered());
        assert!(aggregator.render_header_once().is_none());

        // Later completions still export; the header state never resets.
        aggregator
            .record_completion(row("t2", TestStatus::Fail, false, false))
            .unwrap();
        assert!(aggregator.render_header_once().is_none());
    }
}
