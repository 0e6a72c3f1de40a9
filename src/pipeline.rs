//! The quality-gate pipeline
//!
//! Strictly sequential: trigger → wait → fetch issues/hotspots → evaluate
//! gate → emit report and marker → (on a failing gate) print suggestions.
//! Returns the process exit code; fatal setup errors propagate as `Err`
//! and are converted to exit 1 in `main`.

use crate::config::CheckConfig;
use crate::credentials;
use crate::report::{self, Report};
use crate::scanner;
use crate::sonar::{Hotspot, SonarClient};
use crate::suggest::SuggestionClient;
use crate::triage::{self, strip_key_prefix};
use anyhow::Result;
use std::path::Path;

fn print_hotspots(hotspots: &[Hotspot]) {
    if hotspots.is_empty() {
        println!(
            "\n{}  No Security Hotspots Found {}\n",
            "=".repeat(40),
            "=".repeat(40)
        );
        return;
    }

    println!(
        "\n{}  {} Security Hotspots Found {}\n",
        "=".repeat(40),
        hotspots.len(),
        "=".repeat(40)
    );
    for (idx, hotspot) in hotspots.iter().enumerate() {
        let component = strip_key_prefix(&hotspot.component);
        let line = hotspot
            .line
            .map(|l| l.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "{}. [{}] {}:{} — {}\n",
            idx + 1,
            hotspot.vulnerability_probability,
            component,
            line,
            hotspot.message
        );
    }
}

/// Run the whole gate check from the current directory.
pub async fn run_check(config: &CheckConfig) -> Result<i32> {
    let sonar_token = credentials::sonar_token().ok_or_else(|| {
        anyhow::anyhow!(
            "SONAR_TOKEN not found. Set the environment variable or run 'sonar-gate login'."
        )
    })?;

    // Trigger the scan and learn which CE task to watch.
    let output = scanner::run_analysis(&config.host, &config.project_key, &sonar_token)?;
    let task_id = scanner::extract_ce_task_id(&output)
        .ok_or_else(|| anyhow::anyhow!("Failed to extract CE task id from scanner output"))?;

    let client = SonarClient::new(&config.host, &sonar_token, config.http_timeout_secs)?;
    client
        .wait_for_analysis(&task_id, config.poll_interval_secs, config.max_poll_attempts)
        .await?;

    let issues = client
        .fetch_issues(&config.project_key, config.page_size)
        .await?;
    let triage = triage::triage_issues(&issues);
    triage::print_triage(&triage);

    let hotspots = client
        .fetch_hotspots(&config.project_key, config.page_size)
        .await?;
    print_hotspots(&hotspots);

    let gate_status = client.fetch_quality_gate_status(&config.project_key).await?;

    let report = Report::new(gate_status.as_deref(), triage.counts.clone(), hotspots.len());
    report::write_report(&report, &config.report_path)?;
    report::write_status_marker(Path::new("."), &task_id, gate_status.as_deref())?;

    if gate_status.as_deref() == Some("OK") {
        return Ok(0);
    }

    if config.skip_suggestions {
        println!("\nQuality gate failed; suggestions skipped (--skip-suggestions).");
        return Ok(1);
    }

    match credentials::hf_token() {
        Some(hf_token) => {
            let suggestions =
                SuggestionClient::new(&hf_token, &config.model, config.http_timeout_secs)?;
            suggestions
                .print_suggestions(&triage.error_records, config.context_lines)
                .await;
        }
        None => {
            eprintln!(
                "HF_TOKEN not found; skipping AI suggestions. Set the environment \
                 variable or run 'sonar-gate login' to enable them."
            );
        }
    }

    Ok(1)
}
