//! Codex CLI backend.

use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;

use super::retry::retry_with_backoff;
use crate::config::timeout_from_env;
use crate::error::CodexError;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

const TIMEOUT_ENV_VAR: &str = "QUILL_CODEX_TIMEOUT";

/// JSON schema for the subject list, passed via `--output-schema`.
const SUBJECTS_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "subjects": {
      "type": "array",
      "items": { "type": "string" },
      "minItems": 1,
      "maxItems": 3
    }
  },
  "required": ["subjects"],
  "additionalProperties": false
}"#;

fn get_timeout() -> Duration {
    timeout_from_env(TIMEOUT_ENV_VAR, DEFAULT_TIMEOUT_SECS)
}

/// Check if Codex CLI is installed and accessible.
pub async fn check_codex_installed() -> Result<(), CodexError> {
    if which::which("codex").is_err() {
        return Err(CodexError::NotInstalled);
    }

    let version_check = Command::new("codex")
        .arg("--version")
        .output()
        .await
        .map_err(CodexError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(CodexError::NotInstalled);
    }

    Ok(())
}

/// Run `codex exec --output-schema <schema> <prompt>` once.
///
/// The schema file lives in a temp file for the duration of the call. The
/// timeout defaults to 120 seconds and is configurable via
/// `QUILL_CODEX_TIMEOUT`.
pub async fn run_codex(prompt: &str) -> Result<String, CodexError> {
    let mut schema_file = NamedTempFile::new()
        .map_err(|e| CodexError::ExecutionFailed(format!("Failed to create schema file: {}", e)))?;
    schema_file
        .write_all(SUBJECTS_SCHEMA.as_bytes())
        .map_err(|e| CodexError::ExecutionFailed(format!("Failed to write schema file: {}", e)))?;

    let timeout_duration = get_timeout();
    let timeout_secs = timeout_duration.as_secs();

    let mut cmd = Command::new("codex");
    cmd.arg("exec")
        .arg("--output-schema")
        .arg(schema_file.path())
        .arg(prompt)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = timeout(timeout_duration, cmd.output())
        .await
        .map_err(|_| CodexError::Timeout(timeout_secs))?
        .map_err(CodexError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(CodexError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Run Codex with retries. A missing CLI is not retried.
pub async fn generate_with_retry(prompt: &str) -> Result<String, CodexError> {
    check_codex_installed().await?;
    retry_with_backoff(
        || run_codex(prompt),
        |e| !matches!(e, CodexError::NotInstalled | CodexError::SpawnFailed(_)),
        |e| CodexError::RetriesExhausted(Box::new(e)),
    )
    .await
}
