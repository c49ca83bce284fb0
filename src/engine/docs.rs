//! Documentation significance and topic detection.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::commit::FileChange;
use crate::engine::Thresholds;
use crate::engine::focus::PrimaryFocus;
use crate::engine::paths::{self, file_stem, is_doc_file};

/// Longest markdown heading that is used verbatim as a topic.
const MAX_HEADING_TOPIC_LEN: usize = 30;

static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+(.+?)\s*#*\s*$").unwrap());

/// Keyword cues checked in order against added doc lines and doc paths.
static TOPIC_CUES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\binstall(ation|ing)?\b", "installation instructions"),
        (r"(?i)\busage\b|\bexamples?\b", "usage examples"),
        (r"(?i)\bapi\b", "API reference"),
        (r"(?i)\bconfig(uration)?\b", "configuration docs"),
        (r"(?i)\bcontribut(e|ing|ors?)\b", "contributing guide"),
        (r"(?i)\bchangelog\b", "changelog"),
    ]
    .into_iter()
    .map(|(pattern, topic)| (Regex::new(pattern).unwrap(), topic))
    .collect()
});

/// Whether documentation changes carry enough weight to shape the message.
///
/// With no code files any doc change is significant. Otherwise doc churn must
/// reach a share of the total; the bar is higher while the focus is a
/// structural refactor.
pub fn docs_significant(
    docs: &[&FileChange],
    code: &[&FileChange],
    focus: &PrimaryFocus,
    thresholds: &Thresholds,
) -> bool {
    if docs.is_empty() {
        return false;
    }
    if code.is_empty() {
        return true;
    }

    let doc_weight = paths::total_weight(docs.iter().copied()) as f64;
    let code_weight = paths::total_weight(code.iter().copied()) as f64;
    let threshold = if focus.kind.is_architectural() {
        thresholds.architectural_docs
    } else {
        thresholds.default_docs
    };
    let share = doc_weight / (doc_weight + code_weight);

    tracing::debug!(share, threshold, "documentation share");
    share >= threshold
}

/// Name the documentation topic touched by the change.
///
/// The first added markdown heading wins, then keyword cues, then the README,
/// then plain "documentation".
pub fn doc_topic(docs: &[&FileChange], diff: &str) -> String {
    let doc_lines = added_doc_lines(diff);

    if let Some(heading) = doc_lines
        .iter()
        .find_map(|line| MARKDOWN_HEADING.captures(line).and_then(|c| c.get(1)))
    {
        let heading = heading.as_str().trim().to_lowercase();
        if !heading.is_empty() && heading.chars().count() <= MAX_HEADING_TOPIC_LEN {
            return if heading.ends_with("docs") || heading.ends_with("documentation") {
                heading
            } else {
                format!("{heading} docs")
            };
        }
    }

    for (cue, topic) in TOPIC_CUES.iter() {
        let in_lines = doc_lines.iter().any(|line| cue.is_match(line));
        let in_paths = docs.iter().any(|f| cue.is_match(&paths::humanize(file_stem(&f.path))));
        if in_lines || in_paths {
            return (*topic).to_string();
        }
    }

    if docs
        .iter()
        .any(|f| file_stem(&f.path).eq_ignore_ascii_case("readme"))
    {
        "README".to_string()
    } else {
        "documentation".to_string()
    }
}

/// Added lines that belong to documentation files in the diff.
fn added_doc_lines(diff: &str) -> Vec<&str> {
    let mut in_doc = false;
    let mut in_hunk = false;
    let mut lines = Vec::new();
    for line in diff.lines() {
        if line.starts_with("@@") {
            in_hunk = true;
            continue;
        }
        if !in_hunk && let Some(rest) = line.strip_prefix("+++ ") {
            in_doc = is_doc_file(rest.trim());
            continue;
        }
        if let Some(rest) = line.strip_prefix("diff --git ") {
            in_doc = rest.rsplit(" b/").next().is_some_and(is_doc_file);
            in_hunk = false;
            continue;
        }
        if in_doc {
            if let Some(text) = line.strip_prefix('+') {
                lines.push(text);
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::FileStatus;
    use crate::engine::focus::FocusKind;

    fn file(path: &str, additions: usize, deletions: usize) -> FileChange {
        FileChange::new(path, FileStatus::Modified).with_lines(additions, deletions)
    }

    fn focus(kind: FocusKind) -> PrimaryFocus {
        PrimaryFocus {
            kind,
            detail: String::new(),
            weight: kind.weight(),
        }
    }

    #[test]
    fn test_docs_without_code_are_significant() {
        let readme = file("README.md", 1, 0);
        assert!(docs_significant(&[&readme], &[], &PrimaryFocus::generic(), &Thresholds::default()));
        assert!(!docs_significant(&[], &[], &PrimaryFocus::generic(), &Thresholds::default()));
    }

    #[test]
    fn test_threshold_depends_on_focus() {
        // 50% documentation share.
        let readme = file("README.md", 10, 0);
        let code = file("src/engines/a.ts", 10, 0);
        let t = Thresholds::default();
        assert!(docs_significant(&[&readme], &[&code], &focus(FocusKind::SingleFile), &t));
        assert!(!docs_significant(&[&readme], &[&code], &focus(FocusKind::EngineRefactor), &t));
        assert!(!docs_significant(&[&readme], &[&code], &focus(FocusKind::CoreRefactor), &t));
    }

    #[test]
    fn test_incidental_doc_touch_is_not_significant() {
        let readme = file("README.md", 1, 1);
        let code = file("src/lib.rs", 40, 20);
        assert!(!docs_significant(&[&readme], &[&code], &PrimaryFocus::generic(), &Thresholds::default()));
    }

    #[test]
    fn test_topic_from_heading() {
        let readme = file("README.md", 4, 0);
        let diff = "+++ b/README.md\n+## Quick Start\n+Run it.\n";
        assert_eq!(doc_topic(&[&readme], diff), "quick start docs");
    }

    #[test]
    fn test_code_comment_headings_are_ignored() {
        let readme = file("README.md", 4, 0);
        let diff = "+++ b/src/main.py\n+# Parse args\n+++ b/README.md\n+Some words.\n";
        assert_eq!(doc_topic(&[&readme], diff), "README");
    }

    #[test]
    fn test_topic_from_keywords_and_paths() {
        let readme = file("README.md", 4, 0);
        let diff = "+++ b/README.md\n+Run cargo install quill to get started.\n";
        assert_eq!(doc_topic(&[&readme], diff), "installation instructions");

        let contributing = file("CONTRIBUTING.md", 4, 0);
        assert_eq!(doc_topic(&[&contributing], ""), "contributing guide");
    }

    #[test]
    fn test_topic_fallbacks() {
        let readme = file("README.md", 1, 0);
        assert_eq!(doc_topic(&[&readme], ""), "README");
        let notes = file("docs/notes.md", 1, 0);
        assert_eq!(doc_topic(&[&notes], ""), "documentation");
    }
}
