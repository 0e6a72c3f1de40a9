//! Analysis trigger: runs sonar-scanner and extracts the CE task id
//!
//! The scanner uploads the analysis and prints a Compute Engine task URL;
//! the id pulled from that URL is what the waiter polls afterwards.

use anyhow::{Context, Result};
use regex::Regex;
use std::process::Command;

#[cfg(windows)]
const SCANNER_BIN: &str = "sonar-scanner.bat";
#[cfg(not(windows))]
const SCANNER_BIN: &str = "sonar-scanner";

/// Run the scanner against the current directory and return its stdout.
/// A non-zero exit is fatal; the error carries the captured stderr.
pub fn run_analysis(host: &str, project_key: &str, token: &str) -> Result<String> {
    println!("Starting sonar-scanner analysis...");

    let output = Command::new(SCANNER_BIN)
        .arg(format!("-Dsonar.projectKey={}", project_key))
        .arg("-Dsonar.sources=.")
        .arg(format!("-Dsonar.host.url={}", host))
        .arg(format!("-Dsonar.login={}", token))
        .arg("-Dsonar.exclusions=venv/**")
        .arg("-Dsonar.inclusions=**/*.py")
        .arg("-Dsonar.python.coverage.reportPaths=coverage.xml")
        .output()
        .context("Failed to launch sonar-scanner (is it on PATH?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "sonar-scanner exited with {}:\n{}",
            output.status,
            stderr.trim()
        );
    }

    println!("Analysis triggered.");
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Extract the CE task id from scanner output.
///
/// The scanner prints a line containing `/api/ce/task?id=<uuid>`; returns
/// `None` when no line matches, which callers must treat as a fatal setup
/// error.
pub fn extract_ce_task_id(scanner_output: &str) -> Option<String> {
    // Task ids are UUID-shaped but SonarQube does not guarantee the exact
    // format, so accept any hex-and-dash run.
    let id_pattern = Regex::new(r"id=([a-f0-9\-]+)").ok()?;
    for line in scanner_output.lines() {
        if line.contains("/api/ce/task?id=") {
            if let Some(captures) = id_pattern.captures(line) {
                return Some(captures[1].to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::extract_ce_task_id;

    #[test]
    fn extracts_id_from_report_processing_line() {
        let output = "INFO: Analysis report uploaded in 52ms\n\
                      INFO: More about the report processing at \
                      http://localhost:9000/api/ce/task?id=abc-123-def\n\
                      INFO: EXECUTION SUCCESS";
        assert_eq!(extract_ce_task_id(output).as_deref(), Some("abc-123-def"));
    }

    #[test]
    fn extracts_uuid_shaped_id() {
        let output =
            "INFO: More about the report processing at \
             http://localhost:9000/api/ce/task?id=4f2d8c1e-9a0b-4c3d-8e7f-112233445566";
        assert_eq!(
            extract_ce_task_id(output).as_deref(),
            Some("4f2d8c1e-9a0b-4c3d-8e7f-112233445566")
        );
    }

    #[test]
    fn returns_none_without_task_url() {
        let output = "INFO: Analysis report uploaded\nINFO: EXECUTION SUCCESS";
        assert_eq!(extract_ce_task_id(output), None);
    }

    #[test]
    fn ignores_id_params_on_unrelated_lines() {
        let output = "INFO: fetched http://localhost:9000/api/other?id=deadbeef";
        assert_eq!(extract_ce_task_id(output), None);
    }
}
