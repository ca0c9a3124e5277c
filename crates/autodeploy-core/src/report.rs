//! Pending-deployment report.
//!
//! A read-only HTML listing of the projects a deploy run would pick up.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the rendered report.
pub const PENDING_REPORT_FILE: &str = "PendingDeployment.html";

/// Render the report body: a header and one table row per project.
pub fn render_pending_html(projects: &[String]) -> String {
    let mut out = String::new();
    out.push_str("<h1><b>Projects Pending Deployment</b></h1>");
    out.push_str("<br>");
    out.push_str("<table>");
    out.push_str("<tr><th>Project Name</th></tr>");
    for name in projects {
        out.push_str(&format!("<tr><td>{}</td></tr>", escape_html(name)));
    }
    out.push_str("</table>");
    out
}

/// Write `html` to `PendingDeployment.html` under `dir`, replacing any
/// previous report.
pub fn write_pending_report(dir: &Path, html: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;
    let path = dir.join(PENDING_REPORT_FILE);
    std::fs::write(&path, html).with_context(|| format!("write {:?}", path))?;
    info!(path = %path.display(), "Wrote pending deployment report");
    Ok(path)
}

/// Open the report with the platform's default handler. Failure is logged
/// and otherwise ignored.
pub fn open_report(path: &Path) {
    let mut cmd = opener(path);
    match cmd.spawn() {
        Ok(_) => info!(path = %path.display(), "Opened pending deployment report"),
        Err(e) => warn!(path = %path.display(), error = %e, "Could not open report"),
    }
}

#[cfg(target_os = "windows")]
fn opener(path: &Path) -> std::process::Command {
    let mut cmd = std::process::Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(target_os = "macos")]
fn opener(path: &Path) -> std::process::Command {
    let mut cmd = std::process::Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener(path: &Path) -> std::process::Command {
    let mut cmd = std::process::Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
