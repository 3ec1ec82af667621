//! Report assembly: per-test artifact fragments, the run-level summary table
//! and the static HTML report file written at close.

pub mod embed;
pub mod summary;

pub use embed::render_artifacts;
pub use summary::{SUMMARY_CSV, SUMMARY_JSON, SummaryAggregator, SummaryRow, SummaryTotals};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};

/// Report filename under the output root
pub const REPORT_FILE: &str = "execution_report.html";

/// Accumulates report fragments for one run and writes them out as a single
/// static HTML file, with the run-level summary table at the top.
#[derive(Debug, Default)]
pub struct ReportBuffer {
    header: Option<String>,
    fragments: Vec<String>,
}

impl ReportBuffer {
    /// Create an empty report buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a per-test fragment in completion order
    pub fn push_fragment(&mut self, fragment: String) {
        self.fragments.push(fragment);
    }

    /// Set the report-top block (the summary table)
    pub fn set_header(&mut self, header: String) {
        self.header = Some(header);
    }

    /// Number of per-test fragments so far
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Write the report document to the given path
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Execution Report</title>\n</head>\n<body>\n",
        );
        if let Some(header) = &self.header {
            html.push_str(header);
            html.push('\n');
        }
        for fragment in &self.fragments {
            html.push_str(fragment);
            html.push('\n');
        }
        html.push_str("</body>\n</html>\n");
        fs::write(path, html)
    }
}

/// Move the run-level report files into a timestamped `Report_*` folder under
/// the output root, returning the folder path. Files that were never written
/// are warned about and skipped.
pub fn archive_run_files(output_dir: &Path) -> std::io::Result<PathBuf> {
    let folder = output_dir.join(format!(
        "Report_{}",
        Local::now().format("%Y-%m-%d_%H-%M-%S")
    ));
    fs::create_dir_all(&folder)?;

    for name in [REPORT_FILE, SUMMARY_CSV, SUMMARY_JSON] {
        let src = output_dir.join(name);
        if src.exists() {
            fs::rename(&src, folder.join(name))?;
            info!("moved {} -> {}", name, folder.display());
        } else {
            warn!("not found, skipping archive: {}", src.display());
        }
    }
    Ok(folder)
}

/// Path relative to the report output root, joined with forward slashes
/// regardless of platform
pub(crate) fn rel_href(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Minimal HTML escaping for text interpolated into report fragments
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
