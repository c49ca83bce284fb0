//! Scope inference for `type(scope): ...` subjects.
//!
//! Each domain is a keyword pattern over the lower-cased path. Matching files
//! add their churn to the domain; the heaviest domain wins when it is
//! significant. Otherwise the scope comes from the path itself.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::commit::FileChange;
use crate::engine::paths::{self, is_doc_file, is_generic_segment};

/// Longest scope token that is kept.
pub const MAX_SCOPE_LEN: usize = 15;

/// Absolute weight at which a domain is significant regardless of share.
pub const MIN_DOMAIN_WEIGHT: usize = 20;

struct Domain {
    name: &'static str,
    pattern: Regex,
}

static DOMAINS: LazyLock<Vec<Domain>> = LazyLock::new(|| {
    [
        ("engine", r"(^|/)engines?/"),
        ("cli", r"(^|/)(cli|bin|commands?|cmd)/|(^|/)(cli|main)\.\w+$"),
        ("api", r"(^|/)(api|routes?|handlers?|endpoints?)/|(^|/)api\.\w+$"),
        ("auth", r"auth|login|session|oauth|credential"),
        ("db", r"(^|/)(db|database|migrations?|models?|schema)/|\.sql$"),
        ("config", r"(^|/)(config|settings)(/|\.)|\.(toml|ya?ml|ini|env)$|(^|/)\.[\w.-]+rc(\.\w+)?$"),
        ("build", r"(^|/)(makefile|dockerfile|build\.rs|cmakelists\.txt)$|(webpack|vite|rollup|esbuild)\.config\.|(^|/)(package\.json|cargo\.toml)$"),
        ("test", r"(^|/)(tests?|__tests__|spec)/|\.(test|spec)\.\w+$|_test\.\w+$"),
        ("ui", r"(^|/)(components?|ui|views?|pages|widgets)/|\.(tsx|jsx|vue|svelte)$"),
        ("docs", r"(^|/)docs?/|\.(md|mdx|markdown|rst|adoc)$|(^|/)readme"),
        ("styles", r"\.(css|scss|sass|less|styl)$|(^|/)styles?/"),
        ("theme", r"theme|palette|colou?rs?\b"),
        ("ci", r"(^|/)\.github/|(^|/)\.gitlab-ci|(^|/)\.circleci/|jenkinsfile"),
    ]
    .into_iter()
    .map(|(name, pattern)| Domain {
        name,
        pattern: Regex::new(pattern).unwrap(),
    })
    .collect()
});

/// Pick a short scope token for the change, or an empty string.
pub fn detect_scope(files: &[FileChange]) -> String {
    if files.is_empty() {
        return String::new();
    }

    let scope = domain_scope(files).unwrap_or_else(|| path_scope(files));
    if scope.chars().count() > MAX_SCOPE_LEN {
        tracing::debug!(%scope, "discarding overlong scope");
        return String::new();
    }
    scope
}

fn domain_scope(files: &[FileChange]) -> Option<String> {
    let has_code = files.iter().any(|f| !is_doc_file(&f.path));
    let code_churn = paths::total_weight(files.iter().filter(|f| !is_doc_file(&f.path)));
    let reference_total = if has_code {
        code_churn
    } else {
        paths::total_weight(files)
    };

    let mut best: Option<(&'static str, usize)> = None;
    for domain in DOMAINS.iter() {
        if domain.name == "docs" && has_code {
            continue;
        }
        let weight = paths::total_weight(
            files
                .iter()
                .filter(|f| domain.pattern.is_match(&f.path.to_lowercase())),
        );
        if weight > 0 && best.is_none_or(|(_, w)| weight > w) {
            best = Some((domain.name, weight));
        }
    }

    let (name, weight) = best?;
    let significant = weight >= MIN_DOMAIN_WEIGHT || weight.saturating_mul(2) >= reference_total;
    tracing::debug!(domain = name, weight, reference_total, significant, "scope domain");
    significant.then(|| name.to_string())
}

fn path_scope(files: &[FileChange]) -> String {
    if let [file] = files {
        return single_file_scope(&file.path);
    }

    let dirs: Vec<Vec<String>> = files
        .iter()
        .map(|f| {
            let mut segs = paths::segments(&f.path);
            segs.pop();
            segs
        })
        .collect();

    let Some((first, rest)) = dirs.split_first() else {
        return String::new();
    };
    let common_len = first
        .iter()
        .enumerate()
        .take_while(|(i, seg)| rest.iter().all(|d| d.get(*i) == Some(*seg)))
        .count();

    first[..common_len]
        .iter()
        .rev()
        .find(|seg| !is_generic_segment(seg))
        .cloned()
        .unwrap_or_default()
}

fn single_file_scope(path: &str) -> String {
    let mut segs = paths::segments(path);
    segs.pop();

    if let Some(dir) = segs.iter().rev().find(|seg| !is_generic_segment(seg)) {
        return dir.clone();
    }

    let stem = paths::file_stem(path).to_lowercase();
    if stem.starts_with('.') || is_generic_segment(&stem) {
        String::new()
    } else {
        stem
    }
}
