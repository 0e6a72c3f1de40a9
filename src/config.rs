//! Configuration management for sonar-gate
//!
//! Persistent settings live in ~/.config/sonar-gate/config.json. CLI flags
//! override file values; the merged `CheckConfig` is threaded explicitly
//! through every pipeline stage.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default SonarQube host for local developer setups.
pub const DEFAULT_HOST: &str = "http://localhost:9000";

/// Inference model used for remediation suggestions. The `:novita` suffix
/// routes the request through the Novita provider on the HF router.
pub const DEFAULT_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct:novita";

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_context_lines() -> usize {
    3
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_max_poll_attempts() -> u32 {
    150
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_report_path() -> PathBuf {
    PathBuf::from("sonar-result.json")
}

/// On-disk configuration. Every field carries a serde default so config
/// files written by older releases keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub project_key: Option<String>,
    /// Issues/hotspots page size. Only the first page is fetched; see the
    /// scale note on `sonar::SonarClient::fetch_issues`.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Lines of source context on each side of a flagged line.
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
    /// Initial delay between CE task status polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Upper bound on status polls before the run gives up.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            project_key: None,
            page_size: default_page_size(),
            context_lines: default_context_lines(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
            http_timeout_secs: default_http_timeout_secs(),
            model: default_model(),
            report_path: default_report_path(),
        }
    }
}

impl Config {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sonar-gate"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return defaults. A corrupt file is
    /// reported but never fatal.
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if let Ok(content) = fs::read_to_string(&path) {
                match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(err) => {
                        eprintln!(
                            "  Warning: Config file at {} is invalid ({}). Using defaults.",
                            path.display(),
                            err
                        );
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to disk (used by `sonar-gate config`).
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&dir)
    }

    /// Write `config.json` into `dir`, creating it if needed.
    pub fn save_to(&self, dir: &std::path::Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir)?;
        let path = dir.join("config.json");
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }
}

/// Fully-resolved settings for a single `check` run: file config with CLI
/// overrides applied and the project key made mandatory.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub host: String,
    pub project_key: String,
    pub page_size: u32,
    pub context_lines: usize,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    pub http_timeout_secs: u64,
    pub model: String,
    pub report_path: PathBuf,
    pub skip_suggestions: bool,
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.page_size, 100);
        assert_eq!(config.context_lines, 3);
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.max_poll_attempts, 150);
        assert_eq!(config.report_path.to_str(), Some("sonar-result.json"));
    }

    #[test]
    fn tolerates_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"host": "http://sonar:9000"}"#)
            .expect("partial config should deserialize");
        assert_eq!(config.host, "http://sonar:9000");
        assert_eq!(config.page_size, 100);
        assert!(config.project_key.is_none());
    }

    #[test]
    fn save_to_writes_loadable_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.project_key = Some("AQDPOC".to_string());
        config.host = "http://sonar:9000".to_string();
        config.save_to(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
        let back: Config = serde_json::from_str(&content).unwrap();
        assert_eq!(back.project_key.as_deref(), Some("AQDPOC"));
        assert_eq!(back.host, "http://sonar:9000");
    }

    #[test]
    fn round_trips_through_json() {
        let mut config = Config::default();
        config.project_key = Some("AQDPOC".to_string());
        config.max_poll_attempts = 20;
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.project_key.as_deref(), Some("AQDPOC"));
        assert_eq!(back.max_poll_attempts, 20);
    }
}
