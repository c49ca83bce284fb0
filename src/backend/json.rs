//! Subject extraction from backend responses.
//!
//! CLI backends return subjects wrapped in markdown code blocks, surrounded
//! by conversational text, or as plain lines. This module digs the subject
//! list out of all of those shapes.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Deserialize;

use crate::error::BackendError;

/// Leading list markers: `-`, `*`, `1.`, `2)`.
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+").unwrap());

#[derive(Deserialize)]
struct SubjectsPayload {
    subjects: Vec<String>,
}

/// Extract a JSON object from a response that may be wrapped in markdown.
///
/// Tries, in order:
/// 1. Markdown ` ```json ... ``` ` fenced block
/// 2. Bare ` ``` ... ``` ` fenced block (if the content starts with `{` or `[`)
/// 3. Proper JSON parsing / balanced-brace extraction from surrounding text
/// 4. Returns the input unchanged as a last resort
pub fn extract_json(response: &str) -> String {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json")
        && let Some(end) = trimmed[start + 7..].find("```")
    {
        return trimmed[start + 7..start + 7 + end].trim().to_string();
    }

    if let Some(start) = trimmed.find("```")
        && let Some(end) = trimmed[start + 3..].find("```")
    {
        let inner = trimmed[start + 3..start + 3 + end].trim();
        if inner.starts_with('{') || inner.starts_with('[') {
            return inner.to_string();
        }
    }

    if let Some(json_str) = find_valid_json(trimmed, '{', '}') {
        return json_str;
    }
    if let Some(json_str) = find_valid_json(trimmed, '[', ']') {
        return json_str;
    }

    trimmed.to_string()
}

/// Find the first valid JSON value opened by `open` using balanced matching.
///
/// For each `open` in the input, first tries a full `serde_json` parse
/// (which copes with trailing text via the stream deserializer), then falls
/// back to balanced extraction with string-escape awareness.
fn find_valid_json(text: &str, open: char, close: char) -> Option<String> {
    for (start_idx, _) in text.match_indices(open) {
        let candidate = &text[start_idx..];

        let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
        if let Some(Ok(value)) = stream.next()
            && let Ok(json_str) = serde_json::to_string(&value)
        {
            return Some(json_str);
        }

        if let Some(json_str) = extract_balanced(candidate, open, close)
            && serde_json::from_str::<serde_json::Value>(&json_str).is_ok()
        {
            return Some(json_str);
        }
    }

    None
}

/// Extract a substring with balanced delimiters starting at the first `open`.
///
/// Tracks depth while respecting JSON string literals (including escaped
/// characters), so `{"msg": "use { and } carefully"}` is handled correctly.
fn extract_balanced(text: &str, open: char, close: char) -> Option<String> {
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[..=idx].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a list of subject lines out of a backend response.
///
/// Accepts `{"subjects": [...]}`, a bare JSON array of strings, or one
/// subject per line (list markers and wrapping quotes are stripped).
pub fn parse_subjects(response: &str) -> Result<Vec<String>, BackendError> {
    let json_str = extract_json(response);

    let subjects = if let Ok(payload) = serde_json::from_str::<SubjectsPayload>(&json_str) {
        payload.subjects
    } else if let Ok(list) = serde_json::from_str::<Vec<String>>(&json_str) {
        list
    } else {
        subject_lines(response)
    };

    let subjects: Vec<String> = subjects
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if subjects.is_empty() {
        let preview: String = response.chars().take(200).collect();
        return Err(BackendError::InvalidResponse(format!(
            "no subjects found in response: {preview}"
        )));
    }
    Ok(subjects)
}

fn subject_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .filter(|line| !line.ends_with(':'))
        .map(|line| {
            let line = LIST_MARKER.replace(line, "");
            line.trim_matches(|c| c == '"' || c == '`' || c == '\'').to_string()
        })
        .collect()
}
