//! Staged change collection from the git index using git2.

use std::collections::HashSet;
use std::sync::LazyLock;

use git2::{Delta, Diff, DiffFindOptions, DiffFormat, DiffOptions, ErrorCode, Patch, Repository, Tree};
use regex_lite::Regex;
use tracing::warn;

use crate::commit::change::{ChangeSet, FileChange, FileStatus};
use crate::engine::paths::{file_name, is_lockfile};
use crate::error::CommitError;

/// Maximum characters for the unified diff text before truncation.
pub const MAX_DIFF_LENGTH: usize = 30_000;

/// Most identifiers kept in a file summary.
const MAX_SUMMARY_IDENTIFIERS: usize = 5;

/// Identifier in a hunk header's function context, e.g. `@@ -1,3 +1,4 @@ fn parse(`.
static HUNK_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:fn|def|func|function|class|struct|enum|trait|impl|interface|type)\s+([A-Za-z_$][\w$]*)|([A-Za-z_$][\w$]*)\s*\(",
    )
    .unwrap()
});

const GENERATED_SUFFIXES: &[&str] = &[".min.js", ".min.css", ".js.map", ".css.map", ".snap"];

/// Whether a path holds generated content whose text is not worth analysing.
pub fn is_generated(path: &str) -> bool {
    let name = file_name(path).to_lowercase();
    is_lockfile(path) || name.ends_with(".lock") || GENERATED_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// `Ok(Some(tree))` for repos with a valid HEAD, or `Err(CommitError::DiffFailed)`
/// for real errors (corrupt HEAD, permission issues, missing objects).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, CommitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(CommitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(CommitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Collect the staged changes (HEAD tree to index) as a [`ChangeSet`].
///
/// Renames and copies are detected, per-file line counts come from the
/// patch, and hunk-header function context becomes the file summary.
/// Diff text for generated files is left out, and the total text is capped
/// at [`MAX_DIFF_LENGTH`] characters.
pub fn collect_staged(repo: &Repository) -> Result<ChangeSet, CommitError> {
    let head_tree = resolve_head_tree(repo)?;

    let mut opts = DiffOptions::new();
    opts.context_lines(3);
    let mut diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        .map_err(CommitError::DiffFailed)?;

    let mut find = DiffFindOptions::new();
    find.renames(true).copies(true);
    diff.find_similar(Some(&mut find))
        .map_err(CommitError::DiffFailed)?;

    let files = collect_files(&diff)?;
    if files.is_empty() {
        return Err(CommitError::NoChanges);
    }

    let ignored: HashSet<String> = files
        .iter()
        .filter(|f| f.is_ignored)
        .map(|f| f.path.clone())
        .collect();
    let diff_text = diff_text(&diff, &ignored);

    Ok(ChangeSet {
        files,
        diff: diff_text,
        repository: repository_name(repo),
        branch: branch_name(repo),
    })
}

fn map_status(delta: Delta) -> Option<FileStatus> {
    match delta {
        Delta::Added | Delta::Untracked => Some(FileStatus::Added),
        Delta::Modified | Delta::Typechange => Some(FileStatus::Modified),
        Delta::Deleted => Some(FileStatus::Deleted),
        Delta::Renamed => Some(FileStatus::Renamed),
        Delta::Copied => Some(FileStatus::Copied),
        _ => None,
    }
}

/// One [`FileChange`] per delta, in diff order.
fn collect_files(diff: &Diff<'_>) -> Result<Vec<FileChange>, CommitError> {
    let mut files = Vec::new();

    for (idx, delta) in diff.deltas().enumerate() {
        let Some(status) = map_status(delta.status()) else {
            continue;
        };
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        if path.is_empty() {
            continue;
        }

        let mut file = FileChange::new(path, status);
        if let Some(mut patch) = Patch::from_diff(diff, idx).map_err(CommitError::DiffFailed)? {
            let (_, additions, deletions) = patch.line_stats().map_err(CommitError::DiffFailed)?;
            file = file.with_lines(additions, deletions);
            let identifiers = hunk_identifiers(&mut patch);
            if !identifiers.is_empty() {
                file = file.with_summary(identifiers.join(", "));
            }
        }
        if is_generated(&file.path) {
            file = file.ignored();
        }
        files.push(file);
    }

    Ok(files)
}

/// Unique function-context identifiers from the patch's hunk headers.
fn hunk_identifiers(patch: &mut Patch<'_>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for hunk_idx in 0..patch.num_hunks() {
        let Ok((hunk, _)) = patch.hunk(hunk_idx) else {
            continue;
        };
        let header = String::from_utf8_lossy(hunk.header()).to_string();
        let Some(context) = header.rsplit("@@").next() else {
            continue;
        };
        let name = HUNK_IDENTIFIER
            .captures(context)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string());
        if let Some(name) = name
            && !names.contains(&name)
        {
            names.push(name);
        }
        if names.len() >= MAX_SUMMARY_IDENTIFIERS {
            break;
        }
    }
    names
}

/// Unified diff text for non-ignored files, capped at [`MAX_DIFF_LENGTH`].
fn diff_text(diff: &Diff<'_>, ignored: &HashSet<String>) -> String {
    let mut text = String::new();
    let mut truncated = false;

    if let Err(e) = diff.print(DiffFormat::Patch, |delta, _hunk, line| {
        if truncated {
            return true;
        }
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().replace('\\', "/"));
        if path.is_some_and(|p| ignored.contains(&p)) {
            return true;
        }

        let content = String::from_utf8_lossy(line.content());
        if text.len() + content.len() + 1 > MAX_DIFF_LENGTH {
            truncated = true;
            return true;
        }

        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&content);
        true
    }) {
        warn!("Failed to collect diff text: {e}");
    }

    if truncated {
        warn!(limit = MAX_DIFF_LENGTH, "staged diff truncated");
    }
    text
}

fn repository_name(repo: &Repository) -> String {
    repo.workdir()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Current branch name, including on an unborn branch.
fn branch_name(repo: &Repository) -> String {
    if let Ok(head) = repo.head()
        && let Some(name) = head.shorthand()
    {
        return name.to_string();
    }
    repo.find_reference("HEAD")
        .ok()
        .and_then(|r| r.symbolic_target().map(|t| t.trim_start_matches("refs/heads/").to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn init_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn write_and_stage(dir: &Path, repo: &Repository, path: &str, content: &str) {
        let full = dir.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
    }

    fn commit_index(repo: &Repository, message: &str) {
        let sig = git2::Signature::now("Test", "test@test.com").unwrap();
        let mut index = repo.index().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
    }

    #[test]
    fn test_clean_index_returns_no_changes() {
        let (dir, repo) = init_repo();
        write_and_stage(dir.path(), &repo, "a.txt", "a\n");
        commit_index(&repo, "init");

        let result = collect_staged(&repo);
        assert!(matches!(result, Err(CommitError::NoChanges)));
    }

    #[test]
    fn test_unstaged_files_are_not_collected() {
        let (dir, repo) = init_repo();
        write_and_stage(dir.path(), &repo, "a.txt", "a\n");
        commit_index(&repo, "init");
        std::fs::write(dir.path().join("b.txt"), "untracked\n").unwrap();

        assert!(matches!(collect_staged(&repo), Err(CommitError::NoChanges)));
    }

    #[test]
    fn test_unborn_head_collects_added_files() {
        let (dir, repo) = init_repo();
        write_and_stage(dir.path(), &repo, "src/lib.rs", "pub fn hello() {}\n");

        let changes = collect_staged(&repo).unwrap();
        assert_eq!(changes.files.len(), 1);
        let file = &changes.files[0];
        assert_eq!(file.path, "src/lib.rs");
        assert_eq!(file.status, FileStatus::Added);
        assert_eq!(file.additions, 1);
        assert!(changes.diff.contains("+pub fn hello() {}"));
        assert!(!changes.branch.is_empty());
    }

    #[test]
    fn test_modification_line_stats_and_summary() {
        let (dir, repo) = init_repo();
        let original = "fn parse(input: &str) {\n    let a = 1;\n    let b = 2;\n    let c = 3;\n    let d = 4;\n    let e = 5;\n}\n";
        write_and_stage(dir.path(), &repo, "src/parser.rs", original);
        commit_index(&repo, "init");

        let changed = original.replace("let e = 5;", "let e = 6;\n    let f = 7;");
        write_and_stage(dir.path(), &repo, "src/parser.rs", &changed);

        let changes = collect_staged(&repo).unwrap();
        let file = &changes.files[0];
        assert_eq!(file.status, FileStatus::Modified);
        assert_eq!(file.additions, 2);
        assert_eq!(file.deletions, 1);
        assert_eq!(file.summary.as_deref(), Some("parse"));
        assert!(changes.diff.contains("+    let f = 7;"));
        assert!(changes.diff.contains("-    let e = 5;"));
    }

    #[test]
    fn test_lockfile_is_ignored_and_left_out_of_diff() {
        let (dir, repo) = init_repo();
        write_and_stage(dir.path(), &repo, "Cargo.lock", "[[package]]\nname = \"secret-crate\"\n");
        write_and_stage(dir.path(), &repo, "src/main.rs", "fn main() {}\n");

        let changes = collect_staged(&repo).unwrap();
        let lock = changes.files.iter().find(|f| f.path == "Cargo.lock").unwrap();
        assert!(lock.is_ignored);
        assert_eq!(lock.additions, 2);
        assert!(!changes.diff.contains("secret-crate"));
        assert!(changes.diff.contains("fn main()"));
    }

    #[test]
    fn test_rename_is_detected() {
        let (dir, repo) = init_repo();
        let body = "line one\nline two\nline three\nline four\nline five\n";
        write_and_stage(dir.path(), &repo, "old_name.txt", body);
        commit_index(&repo, "init");

        std::fs::rename(dir.path().join("old_name.txt"), dir.path().join("new_name.txt")).unwrap();
        let mut index = repo.index().unwrap();
        index.remove_path(Path::new("old_name.txt")).unwrap();
        index.add_path(Path::new("new_name.txt")).unwrap();
        index.write().unwrap();

        let changes = collect_staged(&repo).unwrap();
        assert_eq!(changes.files.len(), 1);
        assert_eq!(changes.files[0].status, FileStatus::Renamed);
        assert_eq!(changes.files[0].path, "new_name.txt");
    }

    #[test]
    fn test_corrupt_head_propagates_error() {
        let (dir, repo) = init_repo();
        write_and_stage(dir.path(), &repo, "a.txt", "a\n");
        commit_index(&repo, "init");

        std::fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/\0invalid").unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        let result = collect_staged(&repo);
        assert!(
            matches!(result, Err(CommitError::DiffFailed(_))),
            "Expected DiffFailed for corrupt HEAD, got: {:?}",
            result
        );
    }

    #[test]
    fn test_generated_paths() {
        assert!(is_generated("package-lock.json"));
        assert!(is_generated("web/dist/app.min.js"));
        assert!(is_generated("flake.lock"));
        assert!(!is_generated("src/lock.rs"));
    }
}
