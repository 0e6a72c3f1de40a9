//! Credential storage for sonar-gate
//!
//! Two secrets: the SonarQube user token and the inference API token.
//! Resolution order is environment variable first, then the system
//! keychain via `keyring`. Keychain failures degrade to "no credential"
//! with a single warning rather than aborting the run.

use keyring::Entry;
use std::sync::atomic::{AtomicBool, Ordering};

const KEYRING_SERVICE: &str = "sonar-gate";
const SONAR_USERNAME: &str = "sonar_token";
const HF_USERNAME: &str = "hf_token";

pub const SONAR_TOKEN_ENV: &str = "SONAR_TOKEN";
pub const HF_TOKEN_ENV: &str = "HF_TOKEN";

static KEYRING_ERROR_WARNED: AtomicBool = AtomicBool::new(false);

/// Warn about keychain errors only once per run.
fn warn_keychain_error_once(context: &str, err: &keyring::Error) {
    if KEYRING_ERROR_WARNED.swap(true, Ordering::Relaxed) {
        return;
    }
    eprintln!(
        "  Warning: Couldn't access system keychain for {}: {}",
        context, err
    );
}

fn read_entry(username: &str, context: &str) -> Option<String> {
    let entry = match Entry::new(KEYRING_SERVICE, username) {
        Ok(entry) => entry,
        Err(err) => {
            warn_keychain_error_once(context, &err);
            return None;
        }
    };
    match entry.get_password() {
        Ok(token) => Some(token),
        Err(keyring::Error::NoEntry) => None,
        Err(err) => {
            warn_keychain_error_once(context, &err);
            None
        }
    }
}

fn resolve(env_var: &str, username: &str, context: &str) -> Option<String> {
    if let Ok(token) = std::env::var(env_var) {
        if !token.is_empty() {
            return Some(token);
        }
    }
    read_entry(username, context)
}

/// SonarQube token used for the scanner invocation and every API call.
/// Missing token is a fatal setup error for the caller.
pub fn sonar_token() -> Option<String> {
    resolve(SONAR_TOKEN_ENV, SONAR_USERNAME, "the SonarQube token")
}

/// Inference API token. Missing token only disables the suggestion stage.
pub fn hf_token() -> Option<String> {
    resolve(HF_TOKEN_ENV, HF_USERNAME, "the inference token")
}

/// Store a token in the keychain (used by `sonar-gate login`).
pub fn store_sonar_token(token: &str) -> anyhow::Result<()> {
    Entry::new(KEYRING_SERVICE, SONAR_USERNAME)?.set_password(token)?;
    Ok(())
}

pub fn store_hf_token(token: &str) -> anyhow::Result<()> {
    Entry::new(KEYRING_SERVICE, HF_USERNAME)?.set_password(token)?;
    Ok(())
}
