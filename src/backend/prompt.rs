//! Prompt construction for backend-generated subjects.

use crate::commit::ChangeSet;
use crate::engine::{Analysis, Style};

/// Maximum length for sanitized diff text.
const MAX_DIFF_SANITIZED_LENGTH: usize = 20_000;

/// Phrases that try to steer the model away from the task.
const INJECTION_PATTERNS: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous instructions",
    "disregard previous instructions",
    "you are now",
    "system prompt",
];

/// Build the prompt asking a backend for commit subjects.
///
/// The local engine's analysis is passed along as hints so backend output
/// stays close to the conventions of the deterministic candidates.
pub fn build_prompt(
    changes: &ChangeSet,
    analysis: &Analysis,
    style: Style,
    max_length: usize,
) -> String {
    let files_section = changes
        .files
        .iter()
        .map(|f| {
            let ignored = if f.is_ignored { ", generated" } else { "" };
            format!(
                "- {} ({}, +{} -{}{ignored})",
                f.path, f.status, f.additions, f.deletions
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let sanitized_diff = sanitize_diff(&changes.diff, MAX_DIFF_SANITIZED_LENGTH);
    let scope_hint = if analysis.scope.is_empty() {
        "none".to_string()
    } else {
        analysis.scope.clone()
    };
    let draft = analysis.candidates(style).into_iter().next().unwrap_or_default();

    format!(
        r#"You are writing a Git commit subject line for staged changes.

## Changed Files ({additions} additions, {deletions} deletions)
{files_section}

## Diff
```
{sanitized_diff}
```

## Local Analysis
Change type: {change_type}
Scope: {scope_hint}
Primary focus: {focus}
Draft subject: {draft}

## Subject Rules (STRICT)
{style_rules}
- Imperative mood ("add", "fix", "remove"), no period at the end
- Each subject MUST be at most {max_length} characters
- Give up to 3 distinct alternatives, best first

## Output Format
Respond with ONLY a JSON object (no markdown, no explanation):
{{"subjects": ["first subject", "second subject"]}}"#,
        additions = changes.additions(),
        deletions = changes.deletions(),
        change_type = analysis.change_type,
        focus = analysis.focus.detail,
        style_rules = style_rules(style),
    )
}

fn style_rules(style: Style) -> &'static str {
    match style {
        Style::Conv => {
            "- Format: `type(scope): description` or `type: description`\n- Type: one of feat, fix, refactor, docs, test, style, chore\n- Lowercase after the colon"
        }
        Style::Plain => "- Plain sentence, first letter capitalized, no type prefix",
        Style::Gitmoji => {
            "- Start with a single gitmoji (e.g. ✨ feature, 🐛 fix, ♻️ refactor, 📝 docs) then a capitalized sentence"
        }
        Style::Mix => {
            "- Mix styles: one `type(scope): description`, one plain capitalized sentence, one gitmoji-prefixed sentence"
        }
    }
}

/// Sanitize diff text for inclusion in a prompt.
///
/// Strips control characters (except newlines and tabs) and ANSI escape
/// sequences, neutralizes known injection phrases, and truncates to
/// `max_len` bytes on a char boundary.
pub fn sanitize_diff(text: &str, max_len: usize) -> String {
    let mut result = String::with_capacity(text.len().min(max_len));
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // CSI sequence: ESC [ params final-byte
            if chars.peek() == Some(&'[') {
                chars.next();
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            continue;
        }
        if ch.is_control() && ch != '\n' && ch != '\t' {
            continue;
        }
        result.push(ch);
    }

    let lowered = result.to_lowercase();
    if INJECTION_PATTERNS.iter().any(|p| lowered.contains(p)) {
        result = result
            .lines()
            .map(|line| {
                let lower = line.to_lowercase();
                if INJECTION_PATTERNS.iter().any(|p| lower.contains(p)) {
                    "[filtered]"
                } else {
                    line
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    if result.len() > max_len {
        let mut end = max_len;
        while end > 0 && !result.is_char_boundary(end) {
            end -= 1;
        }
        result.truncate(end);
    }

    result
}
