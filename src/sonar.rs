//! SonarQube Web API client
//!
//! Covers the four endpoints the pipeline needs: CE task status, issue
//! search, hotspot search, and the quality-gate verdict. All calls use
//! basic auth with the user token as username and an empty password.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Backoff cap for the CE task poll loop.
const MAX_POLL_DELAY: Duration = Duration::from_secs(30);

/// Statuses that end the poll loop.
const TERMINAL_STATUSES: &[&str] = &["SUCCESS", "FAILED", "CANCELED"];

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub component: String,
    pub line: Option<u32>,
    #[serde(default)]
    pub rule: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hotspot {
    #[serde(rename = "vulnerabilityProbability", default)]
    pub vulnerability_probability: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub component: String,
    pub line: Option<u32>,
}

#[derive(Deserialize)]
struct IssuesResponse {
    #[serde(default)]
    issues: Vec<Issue>,
}

#[derive(Deserialize)]
struct HotspotsResponse {
    #[serde(default)]
    hotspots: Vec<Hotspot>,
}

#[derive(Deserialize)]
struct TaskResponse {
    task: TaskBody,
}

#[derive(Deserialize)]
struct TaskBody {
    status: Option<String>,
}

#[derive(Deserialize)]
struct GateResponse {
    #[serde(rename = "projectStatus")]
    project_status: GateBody,
}

#[derive(Deserialize)]
struct GateBody {
    status: String,
}

fn is_terminal(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

/// Delay for the next poll attempt: doubles until the cap.
fn next_delay(current: Duration) -> Duration {
    (current * 2).min(MAX_POLL_DELAY)
}

pub struct SonarClient {
    http: reqwest::Client,
    host: String,
    token: String,
}

impl SonarClient {
    pub fn new(host: &str, token: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        self.http
            .get(url)
            .basic_auth(&self.token, Some(""))
            .send()
            .await
    }

    /// Poll the CE task until it reaches a terminal state.
    ///
    /// Transient failures (transport errors, non-200 responses) are logged
    /// and retried. The loop is bounded: running out of attempts is an
    /// error rather than an unkillable wait.
    pub async fn wait_for_analysis(
        &self,
        task_id: &str,
        interval_secs: u64,
        max_attempts: u32,
    ) -> Result<String> {
        let url = format!("{}/api/ce/task?id={}", self.host, task_id);
        println!("Waiting for CE Task ID: {} to complete...", task_id);

        let mut delay = Duration::from_secs(interval_secs.max(1));
        for attempt in 1..=max_attempts {
            match self.get(&url).await {
                Ok(resp) if resp.status().is_success() => {
                    // A garbled body is as transient as a failed request;
                    // keep polling rather than aborting the run.
                    match resp.json::<TaskResponse>().await {
                        Ok(task) => {
                            let status = task.task.status.unwrap_or_default();
                            println!("Current status: {}", status);
                            if is_terminal(&status) {
                                println!("CE Task completed with status: {}", status);
                                return Ok(status);
                            }
                        }
                        Err(err) => {
                            eprintln!("Error parsing task status: {}", err);
                        }
                    }
                }
                Ok(resp) => {
                    eprintln!("Failed to fetch task status. HTTP {}", resp.status());
                }
                Err(err) => {
                    eprintln!("Error fetching task status: {}", err);
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
                delay = next_delay(delay);
            }
        }

        anyhow::bail!(
            "CE task {} did not reach a terminal state after {} attempts",
            task_id,
            max_attempts
        )
    }

    /// Fetch unresolved issues for the project.
    ///
    /// Single page only: projects with more than `page_size` open issues
    /// are truncated at the page boundary. A non-200 response is logged
    /// and treated as "no data"; transport errors propagate.
    pub async fn fetch_issues(&self, project_key: &str, page_size: u32) -> Result<Vec<Issue>> {
        let url = format!(
            "{}/api/issues/search?componentKeys={}&resolved=false&ps={}",
            self.host, project_key, page_size
        );
        let resp = self.get(&url).await.context("Issue search request failed")?;

        if !resp.status().is_success() {
            eprintln!("Failed to fetch issues. HTTP {}", resp.status());
            eprintln!("{}", resp.text().await.unwrap_or_default());
            return Ok(Vec::new());
        }

        let body: IssuesResponse = resp.json().await.context("Malformed issues response")?;
        Ok(body.issues)
    }

    /// Fetch review-pending security hotspots. Same single-page and
    /// error-handling rules as `fetch_issues`.
    pub async fn fetch_hotspots(&self, project_key: &str, page_size: u32) -> Result<Vec<Hotspot>> {
        let url = format!(
            "{}/api/hotspots/search?projectKey={}&status=TO_REVIEW&ps={}",
            self.host, project_key, page_size
        );
        let resp = self
            .get(&url)
            .await
            .context("Hotspot search request failed")?;

        if !resp.status().is_success() {
            eprintln!("Failed to fetch security hotspots. HTTP {}", resp.status());
            eprintln!("{}", resp.text().await.unwrap_or_default());
            return Ok(Vec::new());
        }

        let body: HotspotsResponse = resp.json().await.context("Malformed hotspots response")?;
        Ok(body.hotspots)
    }

    /// Fetch the quality-gate verdict. `None` means the status could not
    /// be retrieved, which downstream reports as a failed gate.
    pub async fn fetch_quality_gate_status(&self, project_key: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/api/qualitygates/project_status?projectKey={}",
            self.host, project_key
        );
        let resp = self
            .get(&url)
            .await
            .context("Quality gate request failed")?;

        if !resp.status().is_success() {
            eprintln!("\nFailed to fetch quality gate status. HTTP {}", resp.status());
            return Ok(None);
        }

        let body: GateResponse = resp.json().await.context("Malformed quality gate response")?;
        println!("\nQuality Gate Status: {}", body.project_status.status);
        Ok(Some(body.project_status.status))
    }
}
