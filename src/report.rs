//! Report and status-marker emission
//!
//! Two unconditional side effects of a completed run: the JSON summary for
//! UI consumption and the plain-text marker the prepare-commit-msg hook
//! reads and deletes.

use crate::triage::IssueCounts;
use anyhow::{Context, Result};
use git2::Repository;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the status marker inside the `.git` directory.
pub const STATUS_MARKER_FILE: &str = ".sonar_task_status";

#[derive(Debug, Serialize)]
pub struct Report {
    pub status: String,
    pub issues: IssueCounts,
    pub security_hotspots: usize,
}

impl Report {
    /// Gate status "OK" is a success; any other value, including a gate
    /// that could not be fetched, reports as failed.
    pub fn new(gate_status: Option<&str>, issues: IssueCounts, security_hotspots: usize) -> Self {
        let status = if gate_status == Some("OK") {
            "success"
        } else {
            "failed"
        };
        Self {
            status: status.to_string(),
            issues,
            security_hotspots,
        }
    }
}

/// Write the JSON report, overwriting any prior content.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

/// Marker content the hook appends to the commit message first line.
pub fn format_status_marker(task_id: &str, gate_status: Option<&str>) -> String {
    format!("{}:{}", task_id, gate_status.unwrap_or("UNKNOWN"))
}

/// Locate the `.git` directory of the repository enclosing `start`.
pub fn git_dir(start: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(start).context("Not inside a git repository")?;
    Ok(repo.path().to_path_buf())
}

/// Write the status marker into the repository's `.git` directory for the
/// prepare-commit-msg hook to consume.
pub fn write_status_marker(start: &Path, task_id: &str, gate_status: Option<&str>) -> Result<()> {
    let marker_path = git_dir(start)?.join(STATUS_MARKER_FILE);
    fs::write(&marker_path, format_status_marker(task_id, gate_status))
        .with_context(|| format!("Failed to write status marker to {}", marker_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{format_status_marker, write_report, write_status_marker, Report};
    use crate::triage::IssueCounts;
    use git2::Repository;
    use tempfile::TempDir;

    #[test]
    fn ok_gate_maps_to_success() {
        let report = Report::new(Some("OK"), IssueCounts::default(), 0);
        assert_eq!(report.status, "success");
    }

    #[test]
    fn error_and_missing_gate_map_to_failed() {
        assert_eq!(
            Report::new(Some("ERROR"), IssueCounts::default(), 0).status,
            "failed"
        );
        assert_eq!(
            Report::new(None, IssueCounts::default(), 0).status,
            "failed"
        );
    }

    #[test]
    fn report_json_shape() {
        let counts = IssueCounts {
            major: 1,
            ..Default::default()
        };
        let report = Report::new(Some("ERROR"), counts, 2);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sonar-result.json");
        write_report(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["issues"]["major"], 1);
        assert_eq!(value["issues"]["blocker"], 0);
        assert_eq!(value["security_hotspots"], 2);
    }

    #[test]
    fn marker_format() {
        assert_eq!(
            format_status_marker("abc-123-def", Some("ERROR")),
            "abc-123-def:ERROR"
        );
        assert_eq!(
            format_status_marker("abc-123-def", None),
            "abc-123-def:UNKNOWN"
        );
    }

    #[test]
    fn marker_lands_in_git_dir() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();

        write_status_marker(dir.path(), "abc-123-def", Some("OK")).unwrap();

        let marker = dir.path().join(".git").join(".sonar_task_status");
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "abc-123-def:OK");
    }
}
