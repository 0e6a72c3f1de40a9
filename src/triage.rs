//! Issue classification
//!
//! Buckets fetched issues by severity, splits them into warnings
//! (minor/info) and errors (everything else), and produces the error
//! records the suggestion stage consumes.

use crate::sonar::Issue;
use serde::Serialize;

/// Issue severity, ordered blocker > critical > major > minor > info.
/// Severities SonarQube adds in the future land in `Unknown` so the report
/// schema stays stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
    Info,
    Unknown,
}

impl Severity {
    /// Case-insensitive parse; anything unrecognized is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "blocker" => Severity::Blocker,
            "critical" => Severity::Critical,
            "major" => Severity::Major,
            "minor" => Severity::Minor,
            "info" => Severity::Info,
            _ => Severity::Unknown,
        }
    }

    /// Minor and info issues are reported as warnings and never reach the
    /// suggestion stage.
    pub fn is_warning(self) -> bool {
        matches!(self, Severity::Minor | Severity::Info)
    }
}

/// Per-severity issue counts. Serialized as the `issues` object of the
/// JSON report; all six keys are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueCounts {
    pub blocker: u32,
    pub critical: u32,
    pub major: u32,
    pub minor: u32,
    pub info: u32,
    pub unknown: u32,
}

impl IssueCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Blocker => self.blocker += 1,
            Severity::Critical => self.critical += 1,
            Severity::Major => self.major += 1,
            Severity::Minor => self.minor += 1,
            Severity::Info => self.info += 1,
            Severity::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.blocker + self.critical + self.major + self.minor + self.info + self.unknown
    }
}

/// One actionable issue, carried to the suggestion stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Component path with the project-key prefix stripped.
    pub file: String,
    /// Absent for file-level issues; those are skipped downstream.
    pub line: Option<u32>,
    /// The full formatted message, as printed in the error list.
    pub full_error: String,
}

/// Outcome of classifying one page of issues. Warning and error lists
/// preserve the API response order.
#[derive(Debug, Default)]
pub struct Triage {
    pub counts: IssueCounts,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub error_records: Vec<ErrorRecord>,
}

/// Strip the `projectKey:` prefix from a component (or the language prefix
/// from a rule id).
pub fn strip_key_prefix(value: &str) -> &str {
    value.rsplit(':').next().unwrap_or(value)
}

fn format_issue(issue: &Issue) -> String {
    let component = strip_key_prefix(&issue.component);
    let rule = strip_key_prefix(&issue.rule);
    let line = issue
        .line
        .map(|l| l.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "[{}] {}:{} — {} ({})",
        issue.severity, component, line, issue.message, rule
    )
}

/// Classify fetched issues. Every issue increments exactly one severity
/// bucket; only non-warning issues produce error records.
pub fn triage_issues(issues: &[Issue]) -> Triage {
    let mut triage = Triage::default();

    for issue in issues {
        let severity = Severity::parse(&issue.severity);
        let msg = format_issue(issue);
        triage.counts.record(severity);

        if severity.is_warning() {
            triage.warnings.push(msg);
        } else {
            triage.error_records.push(ErrorRecord {
                file: strip_key_prefix(&issue.component).to_string(),
                line: issue.line,
                full_error: msg.clone(),
            });
            triage.errors.push(msg);
        }
    }

    triage
}

/// Render the warning and error lists with the banner style the rest of
/// the console output uses. The count banners print even when empty; the
/// "No Issues Found" banner is an extra line, not a replacement.
pub fn render_triage(triage: &Triage) -> String {
    let bar = "=".repeat(40);
    let mut out = String::new();

    if triage.counts.total() == 0 {
        out.push_str(&format!("\n{}  No Issues Found {}\n", bar, bar));
    }

    out.push_str(&format!(
        "\n{}  {} Warnings Found {}\n\n",
        bar,
        triage.warnings.len(),
        bar
    ));
    for (idx, warn) in triage.warnings.iter().enumerate() {
        out.push_str(&format!("{}. {}\n\n", idx + 1, warn));
    }

    out.push_str(&format!(
        "\n{} {} Errors Found {}\n\n",
        bar,
        triage.errors.len(),
        bar
    ));
    for (idx, error) in triage.errors.iter().enumerate() {
        out.push_str(&format!("{}. {}\n\n", idx + 1, error));
    }

    out
}

pub fn print_triage(triage: &Triage) {
    print!("{}", render_triage(triage));
}

#[cfg(test)]
mod tests {
    use super::{render_triage, triage_issues, IssueCounts, Severity};
    use crate::sonar::Issue;

    fn issue(severity: &str, component: &str, line: Option<u32>, message: &str) -> Issue {
        Issue {
            severity: severity.to_string(),
            message: message.to_string(),
            component: component.to_string(),
            line,
            rule: "python:S1481".to_string(),
        }
    }

    #[test]
    fn severity_parse_is_case_insensitive() {
        assert_eq!(Severity::parse("BLOCKER"), Severity::Blocker);
        assert_eq!(Severity::parse("Minor"), Severity::Minor);
        assert_eq!(Severity::parse("info"), Severity::Info);
        assert_eq!(Severity::parse("WHATEVER"), Severity::Unknown);
    }

    #[test]
    fn major_issue_becomes_error_record() {
        let issues = vec![issue("MAJOR", "proj:foo.py", Some(10), "Unused variable")];
        let triage = triage_issues(&issues);

        assert_eq!(
            triage.counts,
            IssueCounts {
                major: 1,
                ..Default::default()
            }
        );
        assert_eq!(triage.error_records.len(), 1);
        let record = &triage.error_records[0];
        assert_eq!(record.file, "foo.py");
        assert_eq!(record.line, Some(10));
        assert_eq!(
            record.full_error,
            "[MAJOR] foo.py:10 — Unused variable (S1481)"
        );
        assert!(triage.warnings.is_empty());
    }

    #[test]
    fn minor_and_info_are_warnings_only() {
        let issues = vec![
            issue("MINOR", "proj:a.py", Some(1), "m"),
            issue("INFO", "proj:b.py", None, "i"),
        ];
        let triage = triage_issues(&issues);

        assert_eq!(triage.warnings.len(), 2);
        assert!(triage.errors.is_empty());
        assert!(triage.error_records.is_empty());
        assert_eq!(triage.counts.minor, 1);
        assert_eq!(triage.counts.info, 1);
    }

    #[test]
    fn missing_line_formats_as_na_and_stays_none() {
        let issues = vec![issue("CRITICAL", "proj:c.py", None, "file-level")];
        let triage = triage_issues(&issues);

        assert_eq!(triage.error_records[0].line, None);
        assert!(triage.error_records[0].full_error.contains("c.py:N/A"));
    }

    #[test]
    fn counts_total_matches_input_size() {
        let issues = vec![
            issue("BLOCKER", "p:a.py", Some(1), "a"),
            issue("major", "p:b.py", Some(2), "b"),
            issue("INFO", "p:c.py", Some(3), "c"),
            issue("EXOTIC", "p:d.py", Some(4), "d"),
        ];
        let triage = triage_issues(&issues);
        assert_eq!(triage.counts.total(), 4);
        assert_eq!(triage.counts.unknown, 1);

        let empty = triage_issues(&[]);
        assert_eq!(empty.counts.total(), 0);
    }

    #[test]
    fn empty_triage_prints_all_three_banners() {
        let rendered = render_triage(&triage_issues(&[]));
        assert!(rendered.contains("No Issues Found"));
        assert!(rendered.contains("0 Warnings Found"));
        assert!(rendered.contains("0 Errors Found"));
    }

    #[test]
    fn nonempty_triage_skips_no_issues_banner() {
        let issues = vec![issue("MAJOR", "p:a.py", Some(1), "a")];
        let rendered = render_triage(&triage_issues(&issues));
        assert!(!rendered.contains("No Issues Found"));
        assert!(rendered.contains("1 Errors Found"));
        assert!(rendered.contains("1. [MAJOR] a.py:1 — a (S1481)"));
    }

    #[test]
    fn unknown_severity_is_treated_as_error() {
        let issues = vec![issue("EXOTIC", "p:d.py", Some(4), "d")];
        let triage = triage_issues(&issues);
        assert_eq!(triage.error_records.len(), 1);
    }
}
