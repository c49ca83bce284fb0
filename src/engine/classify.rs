//! Change-type classification.
//!
//! Signals are gathered once from the files, the diff and the extracted
//! entities, then an ordered rule table is evaluated. The first rule that
//! applies decides the type; later, weaker rules never override it.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::commit::{FileChange, FileStatus};
use crate::engine::categories::{self, Category};
use crate::engine::entities::ExtractedEntities;
use crate::engine::focus::PrimaryFocus;
use crate::engine::paths::{is_doc_file, replacement_pairs};
use crate::error::InputError;

/// Conventional commit types produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Feat,
    Fix,
    Refactor,
    Docs,
    Test,
    Style,
    Chore,
}

impl ChangeType {
    pub const ALL: [ChangeType; 7] = [
        ChangeType::Feat,
        ChangeType::Fix,
        ChangeType::Refactor,
        ChangeType::Docs,
        ChangeType::Test,
        ChangeType::Style,
        ChangeType::Chore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Refactor => "refactor",
            Self::Docs => "docs",
            Self::Test => "test",
            Self::Style => "style",
            Self::Chore => "chore",
        }
    }

    /// Verb a description starts from before pool selection.
    pub fn default_verb(&self) -> &'static str {
        match self {
            Self::Feat => "add",
            Self::Fix => "fix",
            Self::Refactor => "refactor",
            Self::Docs => "update",
            Self::Test => "update",
            Self::Style => "format",
            Self::Chore => "update",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeType {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feat" | "feature" => Ok(Self::Feat),
            "fix" => Ok(Self::Fix),
            "refactor" => Ok(Self::Refactor),
            "docs" | "doc" => Ok(Self::Docs),
            "test" | "tests" => Ok(Self::Test),
            "style" => Ok(Self::Style),
            "chore" => Ok(Self::Chore),
            _ => Err(InputError::InvalidChangeType(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ChangeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<ChangeType>().map_err(serde::de::Error::custom)
    }
}

static FIX_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(fix(e[sd])?|bug|issues?|resolve[sd]?|patch|crash(es)?|regression|hotfix)\b")
        .unwrap()
});

static TEST_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(describe|it|test)\s*\(|#\[(tokio::)?test\]|\bassert(_eq|_ne)?!\s*\(|\bexpect\s*\(|\bdef\s+test_\w+|\bfunc\s+Test\w+")
        .unwrap()
});

static REFACTOR_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(refactor\w*|restructur\w*|reorganiz\w*|simplif\w*|extract(ed|s)?|clean\s?up|renamed?)\b")
        .unwrap()
});

static FORMATTING_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(prettier|rustfmt|gofmt|black|stylelint|whitespace|indentation|trailing\s+spaces?)\b")
        .unwrap()
});

/// Everything the type rules look at.
#[derive(Debug, Default)]
struct TypeSignals {
    all_docs: bool,
    architectural_focus: bool,
    engine_feature_focus: bool,
    dependency_changes: bool,
    replacement: bool,
    added_code: bool,
    new_declarations: bool,
    fix_hits: usize,
    error_handling: bool,
    test_paths: bool,
    test_keywords: bool,
    refactor_keywords: bool,
    renamed: bool,
    style_files: bool,
    formatting_keywords: bool,
    lockfile: bool,
    first_added: bool,
}

struct TypeRule {
    name: &'static str,
    change_type: ChangeType,
    applies: fn(&TypeSignals) -> bool,
}

static TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        name: "docs-only",
        change_type: ChangeType::Docs,
        applies: |s| s.all_docs,
    },
    TypeRule {
        name: "architectural-focus",
        change_type: ChangeType::Refactor,
        applies: |s| s.architectural_focus,
    },
    TypeRule {
        name: "engine-feature-focus",
        change_type: ChangeType::Feat,
        applies: |s| s.engine_feature_focus,
    },
    TypeRule {
        name: "dependency-changes",
        change_type: ChangeType::Chore,
        applies: |s| s.dependency_changes,
    },
    TypeRule {
        name: "file-replacement",
        change_type: ChangeType::Refactor,
        applies: |s| s.replacement,
    },
    TypeRule {
        name: "new-code",
        change_type: ChangeType::Feat,
        applies: |s| s.added_code || s.new_declarations,
    },
    TypeRule {
        name: "fix-keywords",
        change_type: ChangeType::Fix,
        applies: |s| s.fix_hits >= 2 || (s.fix_hits >= 1 && s.error_handling),
    },
    TypeRule {
        name: "tests",
        change_type: ChangeType::Test,
        applies: |s| s.test_paths || s.test_keywords,
    },
    TypeRule {
        name: "refactor-keywords",
        change_type: ChangeType::Refactor,
        applies: |s| s.refactor_keywords || s.renamed,
    },
    TypeRule {
        name: "style",
        change_type: ChangeType::Style,
        applies: |s| s.style_files || s.formatting_keywords,
    },
    TypeRule {
        name: "lockfile",
        change_type: ChangeType::Chore,
        applies: |s| s.lockfile,
    },
];

/// Resolved type plus the name of the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub change_type: ChangeType,
    pub rule: &'static str,
}

/// Resolve the change type of a change set.
pub fn classify(
    files: &[FileChange],
    diff: &str,
    entities: &ExtractedEntities,
    focus: &PrimaryFocus,
) -> Classification {
    let signals = gather_signals(files, diff, entities, focus);

    let classification = TYPE_RULES
        .iter()
        .find(|rule| (rule.applies)(&signals))
        .map(|rule| Classification {
            change_type: rule.change_type,
            rule: rule.name,
        })
        .unwrap_or(if signals.first_added {
            Classification {
                change_type: ChangeType::Feat,
                rule: "default-first-added",
            }
        } else {
            Classification {
                change_type: ChangeType::Chore,
                rule: "default",
            }
        });

    tracing::debug!(
        change_type = %classification.change_type,
        rule = classification.rule,
        "classified change"
    );
    classification
}

fn gather_signals(
    files: &[FileChange],
    diff: &str,
    entities: &ExtractedEntities,
    focus: &PrimaryFocus,
) -> TypeSignals {
    let code: Vec<&FileChange> = files.iter().filter(|f| !is_doc_file(&f.path)).collect();

    let mut signals = TypeSignals {
        all_docs: !files.is_empty() && code.is_empty(),
        architectural_focus: focus.kind.is_architectural(),
        engine_feature_focus: focus.kind.is_engine_feature(),
        dependency_changes: entities.has_dependency_changes(),
        replacement: !replacement_pairs(&code).is_empty(),
        added_code: code.iter().any(|f| f.status == FileStatus::Added),
        new_declarations: entities.has_new_declarations(),
        error_handling: entities.has_error_handling,
        test_paths: code.iter().any(|f| categories::is_test_path(&f.path)),
        renamed: files.iter().any(|f| f.status == FileStatus::Renamed),
        style_files: code
            .iter()
            .any(|f| categories::categorize_path(&f.path) == Category::Styles),
        lockfile: files.iter().any(categories::is_lockfile_change),
        first_added: files.first().is_some_and(|f| f.status == FileStatus::Added),
        ..Default::default()
    };

    for line in changed_lines(diff) {
        signals.fix_hits += FIX_KEYWORDS.find_iter(line.text).count();
        if line.added && TEST_KEYWORDS.is_match(line.text) {
            signals.test_keywords = true;
        }
        if REFACTOR_KEYWORDS.is_match(line.text) {
            signals.refactor_keywords = true;
        }
        if FORMATTING_KEYWORDS.is_match(line.text) {
            signals.formatting_keywords = true;
        }
    }

    signals
}

struct ChangedLine<'a> {
    added: bool,
    text: &'a str,
}

/// Added and removed diff lines, without file headers.
///
/// `---`/`+++` lines are headers only before the first hunk of a section.
fn changed_lines(diff: &str) -> impl Iterator<Item = ChangedLine<'_>> {
    diff.lines().scan(false, |in_hunk, line| {
        if line.starts_with("diff --git ") {
            *in_hunk = false;
        } else if line.starts_with("@@") {
            *in_hunk = true;
        }
        let header = !*in_hunk && (line.starts_with("+++") || line.starts_with("---"));
        let changed = if header {
            None
        } else if let Some(text) = line.strip_prefix('+') {
            Some(ChangedLine { added: true, text })
        } else {
            line.strip_prefix('-')
                .map(|text| ChangedLine { added: false, text })
        };
        Some(changed)
    })
    .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::focus::FocusKind;

    fn run(files: &[FileChange], diff: &str) -> Classification {
        let entities = crate::engine::entities::extract_entities(diff, files);
        classify(files, diff, &entities, &PrimaryFocus::generic())
    }

    fn modified(path: &str) -> FileChange {
        FileChange::new(path, FileStatus::Modified).with_lines(3, 2)
    }

    #[test]
    fn test_change_type_from_str() {
        assert_eq!("feat".parse::<ChangeType>().unwrap(), ChangeType::Feat);
        assert_eq!("DOCS".parse::<ChangeType>().unwrap(), ChangeType::Docs);
        let err = "perf".parse::<ChangeType>().unwrap_err();
        assert!(matches!(err, InputError::InvalidChangeType(s) if s == "perf"));
    }

    #[test]
    fn test_docs_only_wins_over_everything() {
        let files = vec![FileChange::new("docs/new.md", FileStatus::Added).with_lines(30, 0)];
        let diff = "+++ b/docs/new.md\n+fix the bug in the crash handler\n+try {\n";
        let result = run(&files, diff);
        assert_eq!(result.change_type, ChangeType::Docs);
        assert_eq!(result.rule, "docs-only");
    }

    #[test]
    fn test_focus_rules() {
        let files = vec![modified("src/engines/a.ts")];
        let entities = ExtractedEntities::default();
        let refactor = PrimaryFocus {
            kind: FocusKind::EngineRefactor,
            detail: String::new(),
            weight: 100,
        };
        assert_eq!(classify(&files, "", &entities, &refactor).change_type, ChangeType::Refactor);

        let new_engine = PrimaryFocus {
            kind: FocusKind::NewEngine,
            detail: String::new(),
            weight: 90,
        };
        assert_eq!(classify(&files, "", &entities, &new_engine).change_type, ChangeType::Feat);
    }

    #[test]
    fn test_dependency_change_is_chore() {
        let files = vec![modified("package.json")];
        let diff = "+++ b/package.json\n   \"dependencies\": {\n+    \"lodash\": \"^4.17.21\",\n   }\n";
        let result = run(&files, diff);
        assert_eq!(result.change_type, ChangeType::Chore);
        assert_eq!(result.rule, "dependency-changes");
    }

    #[test]
    fn test_replacement_beats_new_file() {
        let files = vec![
            FileChange::new("src/http/client.ts", FileStatus::Deleted).with_lines(0, 40),
            FileChange::new("src/http/fetcher.ts", FileStatus::Added).with_lines(50, 0),
        ];
        assert_eq!(run(&files, "").change_type, ChangeType::Refactor);
    }

    #[test]
    fn test_new_file_or_declaration_is_feat() {
        let files = vec![FileChange::new("src/export.rs", FileStatus::Added).with_lines(20, 0)];
        assert_eq!(run(&files, "").rule, "new-code");

        let files = vec![modified("src/lib.rs")];
        let diff = "+++ b/src/lib.rs\n+pub fn export_csv(rows: &[Row]) -> String {\n";
        assert_eq!(run(&files, diff).change_type, ChangeType::Feat);
    }

    #[test]
    fn test_fix_needs_strong_evidence() {
        let files = vec![modified("src/parser.rs")];
        let diff = "+++ b/src/parser.rs\n-    // TODO: bug here\n+    // fixes crash on empty input\n";
        assert_eq!(run(&files, diff).change_type, ChangeType::Fix);

        let diff = "+++ b/src/parser.rs\n+    // see issue tracker\n";
        assert_ne!(run(&files, diff).change_type, ChangeType::Fix);

        let diff = "+++ b/src/parser.rs\n+    // fix\n+    let v = parse(s).map_err(Error::Parse)?;\n";
        assert_eq!(run(&files, diff).change_type, ChangeType::Fix);
    }

    #[test]
    fn test_test_files_and_keywords() {
        let files = vec![modified("tests/scope_test.rs"), modified("src/lexer.spec.ts")];
        assert_eq!(run(&files, "").change_type, ChangeType::Test);

        let files = vec![modified("src/lexer.rs")];
        let diff = "+++ b/src/lexer.rs\n+        assert_eq!(tokens.len(), 3);\n";
        assert_eq!(run(&files, diff).change_type, ChangeType::Test);
    }

    #[test]
    fn test_removed_sql_comment_inside_hunk_counts() {
        let files = vec![modified("db/schema.sql")];
        let diff = "\
diff --git a/db/schema.sql b/db/schema.sql
--- a/db/schema.sql
+++ b/db/schema.sql
@@ -1,3 +1,3 @@
--- workaround for the import bug
+-- resolved upstream
";
        assert_eq!(run(&files, diff).rule, "fix-keywords");
    }

    #[test]
    fn test_any_test_path_marks_mixed_change_as_test() {
        let files = vec![
            FileChange::new("src/lexer.rs", FileStatus::Modified).with_lines(3, 1),
            FileChange::new("tests/lexer_test.rs", FileStatus::Modified).with_lines(30, 2),
        ];
        let result = run(&files, "");
        assert_eq!(result.change_type, ChangeType::Test);
        assert_eq!(result.rule, "tests");
    }

    #[test]
    fn test_requirements_txt_is_not_docs() {
        for path in ["requirements.txt", "CMakeLists.txt"] {
            let result = run(&[modified(path)], "");
            assert_eq!(result.change_type, ChangeType::Chore, "{path}");
            assert_ne!(result.rule, "docs-only", "{path}");
        }
    }

    #[test]
    fn test_refactor_keywords_and_renames() {
        let files = vec![modified("src/store.rs")];
        let diff = "+++ b/src/store.rs\n+    // simplified lookup\n";
        assert_eq!(run(&files, diff).change_type, ChangeType::Refactor);

        let files = vec![FileChange::new("src/new_name.rs", FileStatus::Renamed)];
        assert_eq!(run(&files, "").change_type, ChangeType::Refactor);
    }

    #[test]
    fn test_style_sheets_are_style() {
        let files = vec![modified("src/theme/app.css")];
        assert_eq!(run(&files, "").change_type, ChangeType::Style);
    }

    #[test]
    fn test_lockfile_only_is_chore() {
        let files = vec![modified("Cargo.lock")];
        let result = run(&files, "");
        assert_eq!(result.change_type, ChangeType::Chore);
        assert_eq!(result.rule, "lockfile");
    }

    #[test]
    fn test_defaults() {
        let files = vec![modified("src/store.rs")];
        let result = run(&files, "+++ b/src/store.rs\n+    let total = a + b;\n");
        assert_eq!(result.change_type, ChangeType::Chore);
        assert_eq!(result.rule, "default");

        assert_eq!(run(&[], "").change_type, ChangeType::Chore);
    }
}
