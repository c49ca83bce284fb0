//! Path helpers shared by the analysers.

use crate::commit::{FileChange, FileStatus};

/// Extensions treated as documentation.
const DOC_EXTENSIONS: &[&str] = &["md", "mdx", "markdown", "rst", "adoc"];

/// Plain-text files that are documentation by name. Other `.txt` files only
/// count as docs inside a docs directory.
const DOC_TEXT_STEMS: &[&str] = &[
    "readme", "license", "licence", "copying", "notice", "authors", "contributors",
    "changes", "changelog", "history", "news", "install",
];

const DOC_DIRS: &[&str] = &["doc", "docs", "documentation"];

/// Directory and file names that carry no meaning as a scope.
const GENERIC_SEGMENTS: &[&str] = &[
    "src", "lib", "app", "apps", "pkg", "packages", "crates", "internal", "source", "sources",
    "main", "index", "mod", "code", "modules", "dist", "build", "out",
];

/// Lockfiles produced by package managers.
const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "cargo.lock",
    "go.sum",
    "poetry.lock",
    "pipfile.lock",
    "gemfile.lock",
    "composer.lock",
];

/// Dependency manifests.
const MANIFESTS: &[&str] = &[
    "package.json",
    "cargo.toml",
    "go.mod",
    "requirements.txt",
    "pipfile",
    "pyproject.toml",
    "gemfile",
    "composer.json",
];

/// Lower-cased path segments.
pub fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Final path component.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File name without its last extension.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Lower-cased last extension, if any.
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(name[idx + 1..].to_lowercase()),
    }
}

/// Directory part of the path, empty for top-level files.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

pub fn is_doc_file(path: &str) -> bool {
    if is_manifest(path) || is_lockfile(path) {
        return false;
    }
    match extension(path).as_deref() {
        Some("txt") => {
            let stem = file_stem(path).to_lowercase();
            DOC_TEXT_STEMS.contains(&stem.as_str())
                || segments(path)
                    .split_last()
                    .is_some_and(|(_, dirs)| dirs.iter().any(|d| DOC_DIRS.contains(&d.as_str())))
        }
        Some(ext) => DOC_EXTENSIONS.contains(&ext),
        None => false,
    }
}

pub fn is_lockfile(path: &str) -> bool {
    LOCKFILES.contains(&file_name(path).to_lowercase().as_str())
}

pub fn is_manifest(path: &str) -> bool {
    MANIFESTS.contains(&file_name(path).to_lowercase().as_str())
}

pub fn is_generic_segment(segment: &str) -> bool {
    GENERIC_SEGMENTS.contains(&segment.to_lowercase().as_str())
}

/// Split files into (documentation, code) subsets, preserving order.
pub fn split_docs(files: &[FileChange]) -> (Vec<&FileChange>, Vec<&FileChange>) {
    files.iter().partition(|f| is_doc_file(&f.path))
}

/// Sum of `max(1, churn)` over the files, saturating.
pub fn total_weight<'a>(files: impl IntoIterator<Item = &'a FileChange>) -> usize {
    files
        .into_iter()
        .fold(0, |sum, f| sum.saturating_add(f.weight()))
}

/// Deleted/added file pairs living in the same directory.
///
/// Each added file is paired at most once, with the first matching deletion.
pub fn replacement_pairs<'a>(files: &[&'a FileChange]) -> Vec<(&'a FileChange, &'a FileChange)> {
    let mut pairs = Vec::new();
    let mut used: Vec<&str> = Vec::new();

    for deleted in files.iter().copied().filter(|f| f.status == FileStatus::Deleted) {
        let candidate = files.iter().copied().find(|added| {
            added.status == FileStatus::Added
                && !is_doc_file(&added.path)
                && !used.contains(&added.path.as_str())
                && parent(&added.path) == parent(&deleted.path)
        });
        if let Some(added) = candidate {
            used.push(added.path.as_str());
            pairs.push((deleted, added));
        }
    }

    pairs
}

/// Turn an identifier-like stem into lower-case words.
///
/// `user_service`, `user-service` and `userService` all become `user service`.
pub fn humanize(stem: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in stem.chars() {
        if ch == '_' || ch == '-' || ch == '.' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join(" ")
}

/// Join phrases as `a`, `a and b`, or `a, b, and c`.
pub fn join_natural<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [one] => one.as_ref().to_string(),
        [a, b] => format!("{} and {}", a.as_ref(), b.as_ref()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(|s| s.as_ref()).collect();
            format!("{}, and {}", head.join(", "), last.as_ref())
        }
    }
}
