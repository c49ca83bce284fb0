//! Subject length fitting and committing the staged index.

use git2::{ErrorCode, Oid, Repository};
use serde::Serialize;
use tracing::debug;

use crate::error::CommitError;

/// A subject measured against the configured maximum length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectFit {
    pub subject: String,
    /// Length in characters, not bytes.
    pub length: usize,
    pub over_length: bool,
}

/// Measure `subject` against `max_length`. A `max_length` of 0 disables the check.
pub fn fit_subject(subject: &str, max_length: usize) -> SubjectFit {
    let length = subject.chars().count();
    SubjectFit {
        subject: subject.to_string(),
        length,
        over_length: max_length > 0 && length > max_length,
    }
}

/// Shorten `subject` to at most `max_length` characters.
///
/// Cuts at the last word boundary that fits; a single overlong word is cut
/// mid-word. Trailing separators left by the cut are trimmed.
pub fn truncate_subject(subject: &str, max_length: usize) -> String {
    if max_length == 0 || subject.chars().count() <= max_length {
        return subject.to_string();
    }

    let hard_cut: String = subject.chars().take(max_length).collect();
    // The next char being a space means the cut already sits on a boundary.
    let on_boundary = subject.chars().nth(max_length).is_some_and(char::is_whitespace);
    let cut = if on_boundary {
        hard_cut.as_str()
    } else {
        match hard_cut.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &hard_cut[..idx],
            _ => hard_cut.as_str(),
        }
    };

    cut.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.'))
        .to_string()
}

/// Commit the current index on HEAD with `message`.
///
/// Unlike `git commit -a` nothing is staged here: what is in the index is
/// what gets committed. An unborn branch produces a root commit.
pub fn commit_staged(repo: &Repository, message: &str) -> Result<Oid, CommitError> {
    let mut index = repo.index().map_err(CommitError::CommitFailed)?;
    let tree_id = index.write_tree().map_err(CommitError::CommitFailed)?;
    let tree = repo.find_tree(tree_id).map_err(CommitError::CommitFailed)?;

    let sig = repo.signature().map_err(CommitError::ConfigError)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(CommitError::CommitFailed)?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(CommitError::CommitFailed(e)),
    };
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(CommitError::CommitFailed)?;
    debug!(%oid, parents = parents.len(), "created commit");

    Ok(oid)
}
