//! prepare-commit-msg hook installer
//!
//! The hook appends the last-known gate status (written by the pipeline as
//! `.git/.sonar_task_status`) to the first line of the commit message,
//! then deletes the marker so it is consumed exactly once.

use anyhow::{Context, Result};
use git2::Repository;
use std::fs;
use std::path::Path;

const HOOK_NAME: &str = "prepare-commit-msg";

const HOOK_SCRIPT: &str = r#"#!/bin/bash

msg_file="$1"
status_file=".git/.sonar_task_status"

if [[ -f "$status_file" ]]; then
    task_status=$(cat "$status_file")

    first_line=$(head -n1 "$msg_file")
    rest=$(tail -n +2 "$msg_file")

    echo "${first_line} ${task_status}" > "$msg_file"
    echo "$rest" >> "$msg_file"

    rm -f "$status_file"
fi
"#;

/// Install the hook into the repository enclosing `start`, overwriting any
/// existing hook of the same name.
pub fn install(start: &Path) -> Result<()> {
    let repo = Repository::discover(start).context("Not inside a git repository")?;
    let hooks_dir = repo.path().join("hooks");
    fs::create_dir_all(&hooks_dir)?;

    let hook_path = hooks_dir.join(HOOK_NAME);
    fs::write(&hook_path, HOOK_SCRIPT)
        .with_context(|| format!("Failed to write hook to {}", hook_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&hook_path, fs::Permissions::from_mode(0o755))
            .context("Failed to make hook executable")?;
    }

    println!("prepare-commit-msg hook installed at {}", hook_path.display());
    Ok(())
}
