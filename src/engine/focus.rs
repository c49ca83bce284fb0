//! Primary-focus detection from the shape of the change set.
//!
//! The detector looks at code files only. Signals are computed once, then an
//! ordered rule table is walked and the first matching rule decides the
//! focus kind. Rules run from the most specific shape (an engine refactor)
//! down to the generic fallback.

use std::fmt;

use serde::Serialize;

use crate::commit::{FileChange, FileStatus};
use crate::engine::Thresholds;
use crate::engine::categories::{self, Category, ENGINE_DIRS};
use crate::engine::paths::{self, file_stem, humanize, is_generic_segment, join_natural};

/// Stems that are shared infrastructure rather than an engine of their own.
const SHARED_STEMS: &[&str] = &[
    "utils", "util", "shared", "common", "helpers", "helper", "base", "types", "index", "mod",
];

/// Stems and directories whose addition next to an engine signals a shared layer.
const SHARED_MODULE_STEMS: &[&str] = &[
    "utils", "util", "shared", "common", "helpers", "helper", "base", "types",
];

/// Minimum churn of a modified peer before it counts as restructured.
const STRUCTURAL_MIN_CHURN: usize = 10;

/// Share of a modified peer's churn that must be deletions to count as restructured.
const STRUCTURAL_DELETION_SHARE: f64 = 0.4;

/// Architectural shape of a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusKind {
    EngineRefactor,
    NewEngine,
    MultiEngine,
    CoreRefactor,
    Deps,
    SingleFile,
    ScopeSpecific,
    MultiCategory,
    Generic,
}

impl FocusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusKind::EngineRefactor => "engine-refactor",
            FocusKind::NewEngine => "new-engine",
            FocusKind::MultiEngine => "multi-engine",
            FocusKind::CoreRefactor => "core-refactor",
            FocusKind::Deps => "deps",
            FocusKind::SingleFile => "single-file",
            FocusKind::ScopeSpecific => "scope-specific",
            FocusKind::MultiCategory => "multi-category",
            FocusKind::Generic => "generic",
        }
    }

    /// Significance used to order descriptions.
    pub fn weight(&self) -> u32 {
        match self {
            FocusKind::EngineRefactor => 100,
            FocusKind::NewEngine => 90,
            FocusKind::MultiEngine => 80,
            FocusKind::CoreRefactor => 75,
            FocusKind::Deps => 60,
            FocusKind::SingleFile => 50,
            FocusKind::ScopeSpecific => 40,
            FocusKind::MultiCategory => 30,
            FocusKind::Generic => 10,
        }
    }

    /// Structural reorganizations, as opposed to feature growth.
    pub fn is_architectural(&self) -> bool {
        matches!(self, FocusKind::EngineRefactor | FocusKind::CoreRefactor)
    }

    pub fn is_engine_feature(&self) -> bool {
        matches!(self, FocusKind::NewEngine | FocusKind::MultiEngine)
    }
}

impl fmt::Display for FocusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detected focus with a readable detail phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryFocus {
    pub kind: FocusKind,
    pub detail: String,
    pub weight: u32,
}

impl PrimaryFocus {
    pub fn generic() -> Self {
        Self::new(FocusKind::Generic, "code")
    }

    fn new(kind: FocusKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            weight: kind.weight(),
        }
    }
}

/// Everything the focus rules look at, computed once per change set.
#[derive(Debug, Default)]
struct FocusSignals {
    file_count: usize,
    added_engines: Vec<String>,
    modified_engines: Vec<String>,
    restructured_engines: usize,
    added_shared: bool,
    core_files: usize,
    core_additions: usize,
    core_deletions: usize,
    all_dependencies: bool,
    single_file: Option<String>,
    dominant_scope: Option<(String, f64)>,
    categories: Vec<Category>,
    scope_dominance: f64,
}

struct FocusRule {
    kind: FocusKind,
    applies: fn(&FocusSignals) -> bool,
}

/// Ordered from most to least specific; first match wins.
static FOCUS_RULES: &[FocusRule] = &[
    FocusRule {
        kind: FocusKind::EngineRefactor,
        applies: |s| {
            !s.added_engines.is_empty() && (s.restructured_engines >= 2 || s.added_shared)
        },
    },
    FocusRule {
        kind: FocusKind::NewEngine,
        applies: |s| !s.added_engines.is_empty(),
    },
    FocusRule {
        kind: FocusKind::MultiEngine,
        applies: |s| s.modified_engines.len() >= 3,
    },
    FocusRule {
        kind: FocusKind::CoreRefactor,
        applies: |s| s.core_files >= 2 && s.core_deletions > 0 && s.core_deletions >= s.core_additions,
    },
    FocusRule {
        kind: FocusKind::Deps,
        applies: |s| s.all_dependencies,
    },
    FocusRule {
        kind: FocusKind::SingleFile,
        applies: |s| s.single_file.is_some(),
    },
    FocusRule {
        kind: FocusKind::ScopeSpecific,
        applies: |s| {
            s.file_count >= 2
                && s.dominant_scope
                    .as_ref()
                    .is_some_and(|(_, share)| *share >= s.scope_dominance)
        },
    },
    FocusRule {
        kind: FocusKind::MultiCategory,
        applies: |s| s.categories.len() >= 2,
    },
];

/// Classify the shape of the code-only part of a change set.
pub fn detect_focus(code_files: &[&FileChange], thresholds: &Thresholds) -> PrimaryFocus {
    if code_files.is_empty() {
        return PrimaryFocus::generic();
    }

    let signals = gather_signals(code_files, thresholds);
    let kind = FOCUS_RULES
        .iter()
        .find(|rule| (rule.applies)(&signals))
        .map(|rule| rule.kind)
        .unwrap_or(FocusKind::Generic);

    let focus = PrimaryFocus::new(kind, focus_detail(kind, &signals));
    tracing::debug!(kind = %focus.kind, detail = %focus.detail, "primary focus");
    focus
}

fn focus_detail(kind: FocusKind, s: &FocusSignals) -> String {
    match kind {
        FocusKind::EngineRefactor => {
            format!("engine architecture for {} integration", join_natural(&s.added_engines))
        }
        FocusKind::NewEngine => engine_phrase(&s.added_engines),
        FocusKind::MultiEngine => engine_phrase(&s.modified_engines),
        FocusKind::CoreRefactor => "core modules".to_string(),
        FocusKind::Deps => "dependencies".to_string(),
        FocusKind::SingleFile => s.single_file.clone().unwrap_or_else(|| "code".to_string()),
        FocusKind::ScopeSpecific => s
            .dominant_scope
            .as_ref()
            .map(|(scope, _)| format!("{} module", humanize(scope)))
            .unwrap_or_else(|| "code".to_string()),
        FocusKind::MultiCategory => {
            let nouns: Vec<&str> = s.categories.iter().take(2).map(Category::noun).collect();
            join_natural(&nouns)
        }
        FocusKind::Generic => "code".to_string(),
    }
}

/// `Gemini engine`, `Gemini and Ollama engines`, or `4 engines`.
pub fn engine_phrase(names: &[String]) -> String {
    match names.len() {
        0 => "engines".to_string(),
        1 => format!("{} engine", names[0]),
        2 | 3 => format!("{} engines", join_natural(names)),
        n => format!("{n} engines"),
    }
}

/// Name of the engine a path belongs to, when the file is a direct child of
/// an engines directory and not a shared helper.
pub fn engine_name(path: &str) -> Option<String> {
    let segs = paths::segments(path);
    let (file, dirs) = segs.split_last()?;
    let parent = dirs.last()?;
    if !ENGINE_DIRS.contains(&parent.as_str()) {
        return None;
    }
    let stem = file_stem(file);
    if SHARED_STEMS.contains(&stem) || stem.contains(".test") || stem.contains(".spec") {
        return None;
    }
    Some(display_engine_name(stem))
}

/// Engine names for every peer module in the files, in order, without duplicates.
pub fn engine_names<'a>(files: impl IntoIterator<Item = &'a FileChange>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in files.into_iter().filter_map(|f| engine_name(&f.path)) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn display_engine_name(stem: &str) -> String {
    match stem {
        "openai" => "OpenAI".to_string(),
        "llm" => "LLM".to_string(),
        "gpt" => "GPT".to_string(),
        _ => {
            let words: Vec<String> = humanize(stem)
                .split(' ')
                .map(|w| {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect();
            words.join(" ")
        }
    }
}

fn is_shared_module(path: &str) -> bool {
    let segs = paths::segments(path);
    let stem = file_stem(path).to_lowercase();
    SHARED_MODULE_STEMS.contains(&stem.as_str())
        || segs
            .split_last()
            .is_some_and(|(_, dirs)| dirs.iter().any(|d| SHARED_MODULE_STEMS.contains(&d.as_str())))
}

fn is_restructured(file: &FileChange) -> bool {
    let churn = file.churn();
    churn >= STRUCTURAL_MIN_CHURN
        && (file.deletions as f64) >= (churn as f64) * STRUCTURAL_DELETION_SHARE
}

/// First meaningful directory of a path, used to find a dominant area.
fn path_area(path: &str) -> Option<String> {
    let mut segs = paths::segments(path);
    segs.pop();
    segs.into_iter().find(|s| !is_generic_segment(s) && !s.starts_with('.'))
}

fn gather_signals(files: &[&FileChange], thresholds: &Thresholds) -> FocusSignals {
    let mut s = FocusSignals {
        file_count: files.len(),
        scope_dominance: thresholds.scope_dominance,
        ..Default::default()
    };

    for file in files {
        if let Some(name) = engine_name(&file.path) {
            match file.status {
                FileStatus::Added | FileStatus::Copied => {
                    if !s.added_engines.contains(&name) {
                        s.added_engines.push(name);
                    }
                }
                FileStatus::Modified | FileStatus::Renamed => {
                    if !s.modified_engines.contains(&name) {
                        s.modified_engines.push(name);
                    }
                    if is_restructured(file) {
                        s.restructured_engines += 1;
                    }
                }
                FileStatus::Deleted => {}
            }
        } else if file.status == FileStatus::Added && is_shared_module(&file.path) {
            s.added_shared = true;
        }

        if paths::segments(&file.path).iter().rev().skip(1).any(|d| d == "core") {
            s.core_files += 1;
            s.core_additions = s.core_additions.saturating_add(file.additions);
            s.core_deletions = s.core_deletions.saturating_add(file.deletions);
        }
    }

    s.all_dependencies = files
        .iter()
        .all(|f| categories::categorize_path(&f.path) == Category::Dependencies);

    if let [file] = files {
        let stem = file_stem(&file.path);
        let words = humanize(stem);
        s.single_file = Some(if words.is_empty() || is_generic_segment(stem) {
            paths::file_name(&file.path).to_string()
        } else {
            words
        });
    }

    let mut areas: Vec<(String, usize)> = Vec::new();
    for area in files.iter().filter_map(|f| path_area(&f.path)) {
        match areas.iter_mut().find(|(name, _)| *name == area) {
            Some((_, count)) => *count += 1,
            None => areas.push((area, 1)),
        }
    }
    // First area wins ties.
    let mut dominant: Option<(String, usize)> = None;
    for (area, count) in areas {
        if dominant.as_ref().is_none_or(|(_, best)| count > *best) {
            dominant = Some((area, count));
        }
    }
    s.dominant_scope = dominant.map(|(area, count)| (area, count as f64 / files.len() as f64));

    s.categories = categories::categorize(files.iter().copied())
        .ranked()
        .into_iter()
        .map(|(c, _)| c)
        .collect();

    s
}
