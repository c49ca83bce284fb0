//! Staged change model handed to the message engine.
//!
//! A [`ChangeSet`] is produced either by [`collect_staged`](super::diff::collect_staged)
//! or deserialized from JSON supplied by an external tool. Both paths go
//! through the same typed [`FileStatus`], so an unknown status is rejected
//! at the boundary instead of being guessed.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InputError;

/// Status of a staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Added => "Added",
            FileStatus::Modified => "Modified",
            FileStatus::Deleted => "Deleted",
            FileStatus::Renamed => "Renamed",
            FileStatus::Copied => "Copied",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileStatus {
    type Err = InputError;

    /// Accepts the full status name or the single-letter `git status` code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "added" | "a" => Ok(Self::Added),
            "modified" | "m" => Ok(Self::Modified),
            "deleted" | "d" => Ok(Self::Deleted),
            "renamed" | "r" => Ok(Self::Renamed),
            "copied" | "c" => Ok(Self::Copied),
            _ => Err(InputError::InvalidStatus(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for FileStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<FileStatus>().map_err(serde::de::Error::custom)
    }
}

/// A single staged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Repository-relative path with forward slashes.
    #[serde(deserialize_with = "deserialize_path")]
    pub path: String,
    pub status: FileStatus,
    #[serde(default)]
    pub additions: usize,
    #[serde(default)]
    pub deletions: usize,
    /// Comma-joined identifier names touched by the change.
    #[serde(default)]
    pub summary: Option<String>,
    /// Lockfiles, minified bundles and similar files whose diff text is not analysed.
    #[serde(default, alias = "isIgnored")]
    pub is_ignored: bool,
}

impl FileChange {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: normalize_path(&path.into()),
            status,
            additions: 0,
            deletions: 0,
            summary: None,
            is_ignored: false,
        }
    }

    pub fn with_lines(mut self, additions: usize, deletions: usize) -> Self {
        self.additions = additions;
        self.deletions = deletions;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn ignored(mut self) -> Self {
        self.is_ignored = true;
        self
    }

    /// Added plus deleted lines.
    pub fn churn(&self) -> usize {
        self.additions.saturating_add(self.deletions)
    }

    /// Churn with a floor of one, so binary or empty changes still count.
    pub fn weight(&self) -> usize {
        self.churn().max(1)
    }

    /// Identifier names listed in `summary`, in order.
    pub fn summary_identifiers(&self) -> impl Iterator<Item = &str> {
        self.summary
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Everything the engine knows about one set of staged changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub files: Vec<FileChange>,
    /// Unified diff text for the staged changes.
    #[serde(default)]
    pub diff: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub branch: String,
}

impl ChangeSet {
    pub fn new(files: Vec<FileChange>, diff: impl Into<String>) -> Self {
        Self {
            files,
            diff: diff.into(),
            repository: String::new(),
            branch: String::new(),
        }
    }

    /// Parse a change set from the JSON shape emitted by external collectors.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let set: ChangeSet = serde_json::from_str(json).map_err(InputError::Json)?;
        if let Some(file) = set.files.iter().find(|f| f.path.is_empty()) {
            return Err(InputError::EmptyPath(file.status.to_string()));
        }
        Ok(set)
    }

    pub fn additions(&self) -> usize {
        self.files.iter().fold(0, |sum, f| sum.saturating_add(f.additions))
    }

    pub fn deletions(&self) -> usize {
        self.files.iter().fold(0, |sum, f| sum.saturating_add(f.deletions))
    }
}

fn normalize_path(path: &str) -> String {
    path.trim().replace('\\', "/").trim_start_matches("./").to_string()
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_path(&raw))
}
