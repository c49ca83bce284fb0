//! quill - offline commit subject suggestions.
//!
//! # Overview
//!
//! quill reads the staged changes of a git repository (or a JSON change set
//! from another tool), analyses them with a deterministic heuristic engine,
//! and suggests up to three commit subject lines in plain, conventional, or
//! gitmoji style. Optional Claude or Codex CLI backends can phrase the
//! subjects instead, with the local engine as the fallback.

pub mod backend;
pub mod commit;
pub mod config;
pub mod engine;
pub mod error;

pub use backend::{Engine, Suggestions, suggest};
pub use commit::{ChangeSet, FileChange, FileStatus, collect_staged};
pub use config::Config;
pub use engine::{Analysis, ChangeType, EngineOptions, Style, analyze, generate_candidates};
pub use error::{BackendError, ClaudeError, CodexError, CommitError, InputError};
