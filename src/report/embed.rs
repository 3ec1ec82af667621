//! Per-test artifact fragment for the HTML report.
//!
//! Renders a collapsible block with a playable reference and download link
//! for each *persisted* device video, and a download link for a persisted
//! execution log. Artifacts that were not configured or not persisted for
//! this outcome are simply absent; when nothing was persisted no block is
//! emitted at all.

use std::path::Path;

use super::{escape_html, rel_href};
use crate::session::TestSession;

/// Render the artifact block for a finished test, or `None` when there is
/// nothing to show. Paths are relative to the report output root and use
/// forward slashes regardless of platform.
pub fn render_artifacts(
    session: &TestSession,
    persisted_videos: &[String],
    log_persisted: bool,
    output_dir: &Path,
) -> Option<String> {
    if persisted_videos.is_empty() && !log_persisted {
        return None;
    }

    let mut html = String::from("<details style=\"margin:15px 0\">\n");
    html.push_str("<summary><b>Screen Recordings &amp; Execution Log</b></summary>\n");

    for capture in &session.device_captures {
        if !persisted_videos.contains(&capture.device_name) {
            continue;
        }
        let href = rel_href(&capture.local_video_path, output_dir);
        html.push_str(&format!(
            "<div style=\"margin-top:10px\">\n\
             <b>{}</b><br>\n\
             <video controls style=\"max-width:600px; max-height:400px;\">\n\
             <source src=\"{}\" type=\"video/mp4\">\n\
             </video><br>\n\
             <a href=\"{}\" target=\"_blank\">Download video</a>\n\
             </div>\n<hr>\n",
            escape_html(&capture.device_name),
            href,
            href,
        ));
    }

    if log_persisted {
        let href = rel_href(&session.log_path, output_dir);
        html.push_str(&format!(
            "<b>Execution Log</b><br>\n\
             <a href=\"{}\" target=\"_blank\">Download execution log</a>\n",
            href,
        ));
    }

    html.push_str("</details>");
    Some(html)
}
