//! Claude CLI backend.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

use super::retry::retry_with_backoff;
use crate::config::timeout_from_env;
use crate::error::ClaudeError;

/// Default timeout for one Claude invocation.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "QUILL_CLAUDE_TIMEOUT";

fn get_timeout() -> Duration {
    timeout_from_env(TIMEOUT_ENV_VAR, DEFAULT_TIMEOUT_SECS)
}

/// Check if Claude Code CLI is installed and accessible.
///
/// Uses the `which` crate for cross-platform executable detection.
pub async fn check_claude_installed() -> Result<(), ClaudeError> {
    if which::which("claude").is_err() {
        return Err(ClaudeError::NotInstalled);
    }

    let version_check = Command::new("claude")
        .arg("--version")
        .output()
        .await
        .map_err(ClaudeError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(ClaudeError::NotInstalled);
    }

    Ok(())
}

/// Run Claude CLI once with `-p <prompt> --output-format json`.
///
/// Returns the text inside the CLI's JSON envelope. The timeout defaults to
/// 120 seconds and is configurable via `QUILL_CLAUDE_TIMEOUT`.
pub async fn run_claude(prompt: &str) -> Result<String, ClaudeError> {
    let timeout_duration = get_timeout();
    let timeout_secs = timeout_duration.as_secs();

    let output = timeout(
        timeout_duration,
        Command::new("claude")
            .arg("-p")
            .arg(prompt)
            .arg("--output-format")
            .arg("json")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output(),
    )
    .await
    .map_err(|_| ClaudeError::Timeout(timeout_secs))?
    .map_err(ClaudeError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(ClaudeError::NonZeroExit { code, stderr });
    }

    unwrap_envelope(&String::from_utf8_lossy(&output.stdout))
}

/// Claude CLI JSON envelope when using `--output-format json`.
#[derive(Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Pull the model text out of the CLI envelope, or pass raw output through.
fn unwrap_envelope(stdout: &str) -> Result<String, ClaudeError> {
    match serde_json::from_str::<ClaudeCliResponse>(stdout) {
        Ok(envelope) if envelope.is_error => Err(ClaudeError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(envelope.result),
        Err(_) => Ok(stdout.to_string()),
    }
}

/// Run Claude with retries. A missing CLI is not retried.
pub async fn generate_with_retry(prompt: &str) -> Result<String, ClaudeError> {
    check_claude_installed().await?;
    retry_with_backoff(
        || run_claude(prompt),
        |e| !matches!(e, ClaudeError::NotInstalled | ClaudeError::SpawnFailed(_)),
        |e| ClaudeError::RetriesExhausted(Box::new(e)),
    )
    .await
}
