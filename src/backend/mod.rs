//! Network subject backends with fallback to the local engine.
//!
//! A backend (Claude or Codex CLI) receives a prompt built from the change
//! set and the local analysis. Its subjects go through the same output
//! contract as engine candidates. Any failure falls back to the engine, so
//! callers always get at least one candidate.

pub mod claude;
pub mod codex;
pub mod json;
pub mod prompt;
pub mod retry;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::commit::ChangeSet;
use crate::engine::render::{MAX_CANDIDATES, capitalize_first, normalize_subject, parse_conventional};
use crate::engine::{EngineOptions, Style, analyze};
use crate::error::{BackendError, ClaudeError, CodexError, InputError};

pub use json::{extract_json, parse_subjects};
pub use prompt::build_prompt;

/// Where subjects come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// The deterministic offline engine; no network.
    #[default]
    Local,
    Claude,
    Codex,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Local => "local",
            Engine::Claude => "claude",
            Engine::Codex => "codex",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Engine {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "none" | "off" => Ok(Engine::Local),
            "claude" => Ok(Engine::Claude),
            "codex" => Ok(Engine::Codex),
            _ => Err(InputError::InvalidEngine(s.to_string())),
        }
    }
}

/// Subjects returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    /// 1 to 3 unique subjects.
    pub candidates: Vec<String>,
    /// Engine that actually produced `candidates`.
    pub source: Engine,
    /// Short description of the backend failure that forced a fallback.
    pub backend_error: Option<String>,
}

#[async_trait]
pub trait SubjectRunner: Send + Sync {
    /// Run `engine` with `prompt` and return its raw text answer.
    async fn run(&self, engine: Engine, prompt: &str) -> Result<String, BackendError>;
}

/// Runs the real CLIs with retry.
pub struct DefaultRunner;

#[async_trait]
impl SubjectRunner for DefaultRunner {
    async fn run(&self, engine: Engine, prompt: &str) -> Result<String, BackendError> {
        match engine {
            Engine::Claude => Ok(claude::generate_with_retry(prompt).await?),
            Engine::Codex => Ok(codex::generate_with_retry(prompt).await?),
            Engine::Local => Err(BackendError::InvalidResponse(
                "local engine has no backend".to_string(),
            )),
        }
    }
}

/// Produce subjects with `engine`, falling back to the local engine.
pub async fn suggest(
    changes: &ChangeSet,
    options: &EngineOptions,
    engine: Engine,
    max_length: usize,
) -> Suggestions {
    suggest_with_runner(changes, options, engine, max_length, &DefaultRunner).await
}

/// [`suggest`] with an injectable runner.
pub async fn suggest_with_runner<R: SubjectRunner + ?Sized>(
    changes: &ChangeSet,
    options: &EngineOptions,
    engine: Engine,
    max_length: usize,
    runner: &R,
) -> Suggestions {
    let analysis = analyze(changes, options);
    let local = || analysis.candidates(options.style);

    if engine == Engine::Local {
        return Suggestions {
            candidates: local(),
            source: Engine::Local,
            backend_error: None,
        };
    }

    let prompt = build_prompt(changes, &analysis, options.style, max_length);
    debug!(%engine, prompt_len = prompt.len(), "requesting backend subjects");

    let result = match runner.run(engine, &prompt).await {
        Ok(response) => parse_subjects(&response).and_then(|s| accept_subjects(s, options.style)),
        Err(e) => Err(e),
    };

    match result {
        Ok(candidates) => Suggestions {
            candidates,
            source: engine,
            backend_error: None,
        },
        Err(e) => {
            warn!(%engine, error = %e, "backend failed, using local engine");
            Suggestions {
                candidates: local(),
                source: Engine::Local,
                backend_error: Some(summarize_error(&e)),
            }
        }
    }
}

/// Apply the output contract to backend subjects.
///
/// Subjects are normalized and deduplicated; conventional style drops
/// anything that is not a valid `type(scope): description`.
fn accept_subjects(subjects: Vec<String>, style: Style) -> Result<Vec<String>, BackendError> {
    let mut accepted: Vec<String> = Vec::new();
    for subject in subjects {
        let first_line = subject.lines().next().unwrap_or_default();
        let mut subject = normalize_subject(first_line);
        match style {
            Style::Conv if parse_conventional(&subject).is_none() => continue,
            Style::Plain => subject = capitalize_first(&subject),
            _ => {}
        }
        if subject.is_empty() || accepted.contains(&subject) {
            continue;
        }
        accepted.push(subject);
        if accepted.len() >= MAX_CANDIDATES {
            break;
        }
    }

    if accepted.is_empty() {
        return Err(BackendError::InvalidResponse(format!(
            "no subject matched the {style} style"
        )));
    }
    Ok(accepted)
}

pub fn summarize_error(err: &BackendError) -> String {
    match err {
        BackendError::Claude(e) => summarize_claude_error(e),
        BackendError::Codex(e) => summarize_codex_error(e),
        BackendError::InvalidResponse(_) => "Backend returned no usable subjects".to_string(),
    }
}

fn summarize_claude_error(err: &ClaudeError) -> String {
    match err {
        ClaudeError::NotInstalled => "Claude CLI not found".to_string(),
        ClaudeError::ExecutionFailed(_) => "Claude CLI reported an error".to_string(),
        ClaudeError::SpawnFailed(_) => "Failed to start Claude CLI".to_string(),
        ClaudeError::Timeout(secs) => format!("Claude timed out after {}s", secs),
        ClaudeError::NonZeroExit { code, .. } => format!("Claude CLI exited with code {}", code),
        ClaudeError::RetriesExhausted(_) => "Claude failed after retries".to_string(),
    }
}

fn summarize_codex_error(err: &CodexError) -> String {
    match err {
        CodexError::NotInstalled => "Codex CLI not found".to_string(),
        CodexError::ExecutionFailed(_) => "Codex CLI reported an error".to_string(),
        CodexError::SpawnFailed(_) => "Failed to start Codex CLI".to_string(),
        CodexError::Timeout(secs) => format!("Codex timed out after {}s", secs),
        CodexError::NonZeroExit { code, .. } => format!("Codex CLI exited with code {}", code),
        CodexError::RetriesExhausted(_) => "Codex failed after retries".to_string(),
    }
}
