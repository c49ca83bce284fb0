//! Declaration and dependency extraction from unified diff text.
//!
//! Only lines added by the diff are scanned for declarations. Dependency
//! changes are read from `package.json` hunks with a small state machine
//! that tracks whether the current line sits inside a `*dependencies` block.
//! Nothing here fails: lines that match no pattern are skipped.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use crate::commit::FileChange;
use crate::engine::paths::{file_name, is_doc_file};

static CLASS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)",
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+([A-Za-z_]\w*)",
        r"^\s*(?:export\s+)?interface\s+([A-Za-z_$][\w$]*)",
    ])
});

static COMPONENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^\s*(?:export\s+)?(?:default\s+)?function\s+([A-Z][A-Za-z0-9]*)\s*\(",
        r"^\s*(?:export\s+)?(?:const|let)\s+([A-Z][A-Za-z0-9]*)\s*(?::[^=]+)?=\s*(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>",
        r"^\s*(?:export\s+)?(?:const|let)\s+([A-Z][A-Za-z0-9]*)\s*=\s*(?:React\.)?(?:memo|forwardRef|styled)\b",
    ])
});

static FUNCTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*\(",
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+([A-Za-z_]\w*)",
        r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(",
        r"^\s*func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)\s*\(",
        r"^\s*(?:export\s+)?(?:const|let|var)\s+([a-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>",
    ])
});

static VARIABLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=",
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:static|const)\s+([A-Z_][A-Z0-9_]*)\s*:",
    ])
});

static ERROR_HANDLING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\btry\s*\{|\bcatch\s*\(|\.catch\(|\bexcept\b|\bfinally\s*[:{]|\bthrow\s+new\b|\braise\s+\w|map_err|\.ok_or|if\s+err\s*!=\s*nil|\bResult<",
    )
    .unwrap()
});

static DEPENDENCY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"(\w*[dD]ependencies)"\s*:\s*\{\s*$"#).unwrap());

static DEPENDENCY_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"([^"]+)"\s*:\s*"[^"]*"\s*,?\s*$"#).unwrap());

static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\}\s*,?\s*$").unwrap());

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Identifiers and dependency names discovered in a diff.
///
/// Each list holds unique names in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedEntities {
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub components: Vec<String>,
    pub variables: Vec<String>,
    pub dependencies_added: Vec<String>,
    pub dependencies_removed: Vec<String>,
    pub has_error_handling: bool,
}

impl ExtractedEntities {
    /// Whether any function, class or component declaration was added.
    pub fn has_new_declarations(&self) -> bool {
        !self.functions.is_empty() || !self.classes.is_empty() || !self.components.is_empty()
    }

    pub fn has_dependency_changes(&self) -> bool {
        !self.dependencies_added.is_empty() || !self.dependencies_removed.is_empty()
    }
}

fn insert_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}

/// Kind of diff line, by its leading marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Added,
    Removed,
    Context,
}

/// Per-file scanning state.
#[derive(Debug, Default)]
struct FileState {
    path: String,
    skip_declarations: bool,
    is_package_json: bool,
    in_dependency_block: bool,
}

impl FileState {
    fn for_path(path: String) -> Self {
        Self {
            skip_declarations: is_doc_file(&path),
            is_package_json: file_name(&path) == "package.json",
            path,
            in_dependency_block: false,
        }
    }
}

/// Scan diff text for declarations, error handling and dependency changes.
///
/// `files` supplies the `is_ignored` flag: sections for ignored files are
/// skipped entirely.
pub fn extract_entities(diff: &str, files: &[FileChange]) -> ExtractedEntities {
    let mut entities = ExtractedEntities::default();
    // A headerless diff of a single file belongs to that file.
    let mut state = match files {
        [only] => FileState::for_path(only.path.clone()),
        _ => FileState::default(),
    };
    let mut skip_file = files.len() == 1 && files[0].is_ignored;
    // `---`/`+++` are file headers only before the first hunk of a section.
    let mut in_hunk = false;

    for line in diff.lines() {
        if line.starts_with("diff --git ") {
            in_hunk = false;
        } else if line.starts_with("@@") {
            in_hunk = true;
        }
        if let Some(path) = section_path(line, in_hunk) {
            skip_file = files.iter().any(|f| f.path == path && f.is_ignored);
            state = FileState::for_path(path);
            continue;
        }
        if skip_file || is_header(line, in_hunk) {
            continue;
        }

        let (kind, content) = match line.as_bytes().first() {
            Some(b'+') => (LineKind::Added, &line[1..]),
            Some(b'-') => (LineKind::Removed, &line[1..]),
            Some(b' ') => (LineKind::Context, &line[1..]),
            _ => continue,
        };

        if state.is_package_json {
            scan_dependency_line(&mut state, kind, content, &mut entities);
            continue;
        }

        if kind == LineKind::Added && !state.skip_declarations {
            scan_declarations(content, &mut entities);
        }
    }

    // A name both removed and added is a version bump, which counts as an addition.
    let added = entities.dependencies_added.clone();
    entities.dependencies_removed.retain(|name| !added.contains(name));

    tracing::debug!(
        functions = entities.functions.len(),
        classes = entities.classes.len(),
        components = entities.components.len(),
        deps_added = entities.dependencies_added.len(),
        deps_removed = entities.dependencies_removed.len(),
        "extracted diff entities"
    );

    entities
}

/// Path of a new file section, from `diff --git a/x b/y` or `+++ b/y` headers.
fn section_path(line: &str, in_hunk: bool) -> Option<String> {
    if let Some(rest) = line.strip_prefix("diff --git ") {
        let target = rest.rsplit(" b/").next()?;
        return Some(target.trim().to_string());
    }
    if !in_hunk && let Some(rest) = line.strip_prefix("+++ ") {
        let rest = rest.trim();
        if rest == "/dev/null" {
            return None;
        }
        return Some(rest.strip_prefix("b/").unwrap_or(rest).to_string());
    }
    None
}

fn is_header(line: &str, in_hunk: bool) -> bool {
    (!in_hunk && (line.starts_with("--- ") || line.starts_with("+++ ")))
        || line.starts_with("@@")
        || line.starts_with("index ")
        || line.starts_with("new file mode")
        || line.starts_with("deleted file mode")
        || line.starts_with("similarity index")
        || line.starts_with("rename ")
        || line.starts_with("Binary files")
}

fn scan_declarations(content: &str, entities: &mut ExtractedEntities) {
    if ERROR_HANDLING.is_match(content) {
        entities.has_error_handling = true;
    }

    if let Some(name) = first_capture(&CLASS_PATTERNS, content) {
        insert_unique(&mut entities.classes, name);
    } else if let Some(name) = first_capture(&COMPONENT_PATTERNS, content) {
        insert_unique(&mut entities.components, name);
    } else if let Some(name) = first_capture(&FUNCTION_PATTERNS, content) {
        insert_unique(&mut entities.functions, name);
    } else if let Some(name) = first_capture(&VARIABLE_PATTERNS, content) {
        insert_unique(&mut entities.variables, name);
    }
}

fn first_capture<'a>(patterns: &[Regex], content: &'a str) -> Option<&'a str> {
    patterns
        .iter()
        .find_map(|re| re.captures(content).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
}

fn scan_dependency_line(
    state: &mut FileState,
    kind: LineKind,
    content: &str,
    entities: &mut ExtractedEntities,
) {
    if !state.in_dependency_block {
        if DEPENDENCY_BLOCK.is_match(content) {
            state.in_dependency_block = true;
        }
        return;
    }

    if BLOCK_END.is_match(content) {
        state.in_dependency_block = false;
        return;
    }

    let Some(name) = DEPENDENCY_ENTRY
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    else {
        return;
    };

    match kind {
        LineKind::Added => insert_unique(&mut entities.dependencies_added, name),
        LineKind::Removed => insert_unique(&mut entities.dependencies_removed, name),
        LineKind::Context => {}
    }
    tracing::trace!(file = %state.path, dependency = name, "dependency line");
}
