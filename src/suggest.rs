//! AI remediation suggestions
//!
//! For each actionable error with a known line, extracts a small source
//! context window, builds a fixed-template prompt, and requests one
//! non-streaming chat completion. Every failure mode is per-item: a
//! missing line, an unreadable file, or a dead inference endpoint degrades
//! that one suggestion and never aborts the batch.

use crate::triage::ErrorRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// OpenAI-compatible chat completions endpoint on the HF router.
const INFERENCE_URL: &str = "https://router.huggingface.co/v1/chat/completions";

/// Marker appended to the flagged line inside the context snippet. The
/// prompt tells the model to confine its fix to this line.
const ISSUE_MARKER: &str = "# <-- Issue reported here";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

/// Per-item result of the enrichment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// Context extracted and a suggestion returned.
    Suggested { snippet: String, suggestion: String },
    /// Context extracted but the inference call failed; the error text is
    /// shown inline in place of a suggestion.
    Failed { snippet: String, error: String },
    /// No line number on the issue, so no context window exists.
    SkippedNoLine,
    /// The flagged file could not be read.
    SkippedUnreadable { error: String },
}

/// Extract a context window around `line_num` (1-based) with
/// `context_lines` lines on each side, clamped at file boundaries. The
/// flagged line is prefixed `>>> ` and carries the issue marker; all
/// other lines are indented.
pub fn extract_context(path: &Path, line_num: usize, context_lines: usize) -> std::io::Result<String> {
    let content = fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();

    let start = line_num.saturating_sub(context_lines + 1);
    let end = (line_num + context_lines).min(lines.len());

    let mut snippet = String::new();
    for (i, line) in lines.iter().enumerate().take(end).skip(start) {
        if i + 1 == line_num {
            snippet.push_str(&format!(">>> {}   {}\n", line, ISSUE_MARKER));
        } else {
            snippet.push_str(&format!("    {}\n", line));
        }
    }
    Ok(snippet)
}

/// Build the remediation prompt for one error record.
pub fn build_prompt(record: &ErrorRecord, line_num: u32, snippet: &str) -> String {
    format!(
        "Issue: {full_error}\n\
         Code context from {file} around line {line}:\n\
         {snippet}\n\
         - Please suggest a fix for this issue:\n\
         - Focus only on the line on which the issue occurred (denoted by {marker}), \
           avoid giving suggestions for other lines unless mandatory.\n\
         - Provide one complete and precise solution.\n\
         - Always check syntax, type mismatch, etc before providing the final solution.\n\
         - Try to answer in one paragraph only, strictly keep only 3 sections, \
           ##Cause, ##Resolution/Changes needed, ##Sample Code.\n\
         - Clearly mention what should be removed, changed, or added.\n\
         - Avoid generic advice; tailor your suggestion to the actual context.\n\
         - Assume the code is part of a production pipeline — avoid insecure \
           practices like hardcoding credentials.\n",
        full_error = record.full_error,
        file = record.file,
        line = line_num,
        snippet = snippet,
        marker = ISSUE_MARKER,
    )
}

pub struct SuggestionClient {
    http: reqwest::Client,
    token: String,
    model: String,
}

impl SuggestionClient {
    pub fn new(token: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            token: token.to_string(),
            model: model.to_string(),
        })
    }

    /// One non-streaming chat completion with a single user message.
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        let resp = self
            .http
            .post(INFERENCE_URL)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {}: {}", status, body.trim());
        }

        let chat: ChatResponse = resp.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("No choices in inference response"))?;
        Ok(content)
    }

    /// Produce the outcome for one error record. Inference errors come
    /// back as `Failed` with an inline error string, never as `Err`.
    pub async fn suggest_for(
        &self,
        record: &ErrorRecord,
        context_lines: usize,
    ) -> SuggestionOutcome {
        let line_num = match record.line {
            Some(line) => line,
            None => return SuggestionOutcome::SkippedNoLine,
        };

        let snippet = match extract_context(Path::new(&record.file), line_num as usize, context_lines)
        {
            Ok(snippet) => snippet,
            Err(err) => {
                return SuggestionOutcome::SkippedUnreadable {
                    error: err.to_string(),
                }
            }
        };

        let prompt = build_prompt(record, line_num, &snippet);
        match self.complete(&prompt).await {
            Ok(suggestion) => SuggestionOutcome::Suggested {
                snippet,
                suggestion,
            },
            Err(err) => SuggestionOutcome::Failed {
                snippet,
                error: format!("[Error contacting inference API]: {}", err),
            },
        }
    }

    /// Run the whole batch in input order, printing each item as it
    /// completes.
    pub async fn print_suggestions(&self, records: &[ErrorRecord], context_lines: usize) {
        println!("\n{} AI Suggestions {}\n", "=".repeat(40), "=".repeat(40));

        for (idx, record) in records.iter().enumerate() {
            match self.suggest_for(record, context_lines).await {
                SuggestionOutcome::SkippedNoLine => {
                    println!(
                        "Skipping suggestion for file: {} - Line info missing",
                        record.file
                    );
                }
                SuggestionOutcome::SkippedUnreadable { error } => {
                    eprintln!("[Error reading file: {}]", error);
                    println!(
                        "Skipping suggestion for file: {} - Unable to fetch code context",
                        record.file
                    );
                }
                SuggestionOutcome::Suggested {
                    snippet,
                    suggestion,
                }
                | SuggestionOutcome::Failed {
                    snippet,
                    error: suggestion,
                } => {
                    println!("{}. {}\n", idx + 1, record.full_error);
                    println!("Code Snippet:\n{}", snippet);
                    println!("AI Suggestion:\n{}\n", suggestion);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_prompt, extract_context, ISSUE_MARKER};
    use crate::triage::ErrorRecord;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(lines: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for i in 1..=lines {
            writeln!(file, "line {}", i).unwrap();
        }
        file
    }

    #[test]
    fn window_is_2n_plus_1_in_the_middle() {
        let file = fixture(20);
        let snippet = extract_context(file.path(), 10, 3).unwrap();
        let lines: Vec<&str> = snippet.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "    line 7");
        assert!(lines[3].starts_with(">>> line 10"));
        assert!(lines[3].ends_with(ISSUE_MARKER));
        assert_eq!(lines[6], "    line 13");
    }

    #[test]
    fn only_target_line_is_marked() {
        let file = fixture(20);
        let snippet = extract_context(file.path(), 10, 3).unwrap();
        let marked = snippet.lines().filter(|l| l.starts_with(">>> ")).count();
        assert_eq!(marked, 1);
    }

    #[test]
    fn window_clamps_at_file_start() {
        let file = fixture(20);
        let snippet = extract_context(file.path(), 1, 3).unwrap();
        let lines: Vec<&str> = snippet.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(">>> line 1"));
    }

    #[test]
    fn window_clamps_at_file_end() {
        let file = fixture(5);
        let snippet = extract_context(file.path(), 5, 3).unwrap();
        let lines: Vec<&str> = snippet.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[4].starts_with(">>> line 5"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(extract_context(std::path::Path::new("definitely/not/here.py"), 1, 3).is_err());
    }

    #[test]
    fn prompt_embeds_issue_and_sections() {
        let record = ErrorRecord {
            file: "foo.py".to_string(),
            line: Some(10),
            full_error: "[MAJOR] foo.py:10 — Unused variable (S1481)".to_string(),
        };
        let prompt = build_prompt(&record, 10, ">>> x = 1   # <-- Issue reported here\n");

        assert!(prompt.contains("[MAJOR] foo.py:10"));
        assert!(prompt.contains("from foo.py around line 10"));
        assert!(prompt.contains("##Cause"));
        assert!(prompt.contains("##Resolution/Changes needed"));
        assert!(prompt.contains("##Sample Code"));
        assert!(prompt.contains("hardcoding credentials"));
    }
}
