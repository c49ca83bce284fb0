//! Error types for quill modules using thiserror.

use thiserror::Error;

/// Errors at the input boundary: change sets, styles, and option values.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid file status '{0}' (expected added, modified, deleted, renamed, or copied)")]
    InvalidStatus(String),

    #[error("Invalid style '{0}' (expected plain, conv, gitmoji, or mix)")]
    InvalidStyle(String),

    #[error("Invalid change type '{0}' (expected feat, fix, refactor, docs, test, style, or chore)")]
    InvalidChangeType(String),

    #[error("Invalid engine '{0}' (expected local, claude, or codex)")]
    InvalidEngine(String),

    #[error("Failed to parse change set JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("Change set contains a {0} file with an empty path")]
    EmptyPath(String),
}

/// Errors from staged-change collection and committing.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No staged changes (use `git add` first)")]
    NoChanges,

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ClaudeError>),
}

/// Errors from Codex CLI operations.
#[derive(Error, Debug)]
pub enum CodexError {
    #[error(
        "Codex CLI not found. Install with: npm install -g @openai/codex (then run `codex` or set CODEX_API_KEY)"
    )]
    NotInstalled,

    #[error("Codex CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Codex process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Codex process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Codex CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<CodexError>),
}

/// Errors from network subject backends.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Claude(#[from] ClaudeError),

    #[error(transparent)]
    Codex(#[from] CodexError),

    #[error("Backend returned no usable subjects: {0}")]
    InvalidResponse(String),
}
