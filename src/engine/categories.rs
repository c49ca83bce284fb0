//! File categorization weighted by churn.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use crate::commit::{FileChange, FileStatus};
use crate::engine::paths::{self, extension, file_name, is_doc_file, is_lockfile, is_manifest};

/// Semantic category of a changed file.
///
/// Declaration order is the tie-break priority when two categories carry
/// the same weight: earlier variants rank first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Engine,
    Api,
    Cli,
    Ui,
    Code,
    Tests,
    Docs,
    Styles,
    Config,
    Build,
    Ci,
    Dependencies,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Engine => "engine",
            Category::Api => "api",
            Category::Cli => "cli",
            Category::Ui => "ui",
            Category::Code => "code",
            Category::Tests => "tests",
            Category::Docs => "docs",
            Category::Styles => "styles",
            Category::Config => "config",
            Category::Build => "build",
            Category::Ci => "ci",
            Category::Dependencies => "dependencies",
        }
    }

    /// Readable noun used in descriptions.
    ///
    /// `Engine` has no fixed noun: callers derive it from the engine names
    /// involved and fall back to "engines".
    pub fn noun(&self) -> &'static str {
        match self {
            Category::Engine => "engines",
            Category::Api => "API",
            Category::Cli => "CLI",
            Category::Ui => "UI components",
            Category::Code => "code",
            Category::Tests => "tests",
            Category::Docs => "documentation",
            Category::Styles => "styles",
            Category::Config => "configuration",
            Category::Build => "build setup",
            Category::Ci => "CI workflows",
            Category::Dependencies => "dependencies",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static TEST_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|/)(tests?|__tests__|spec|specs)/|\.(test|spec)\.\w+$|_test\.\w+$|(^|/)test_\w+\.\w+$")
        .unwrap()
});

static CI_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|/)\.github/workflows/|(^|/)\.gitlab-ci\.ya?ml$|(^|/)\.circleci/|(^|/)jenkinsfile$|(^|/)azure-pipelines\.ya?ml$")
        .unwrap()
});

static BUILD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|/)(makefile|dockerfile|build\.rs|cmakelists\.txt|justfile)$|(^|/)(webpack|vite|rollup|esbuild|tsup)\.config\.\w+$")
        .unwrap()
});

static CONFIG_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(json|ya?ml|toml|ini|env|cfg|conf)$|(^|/)\.[\w.-]+rc(\.\w+)?$|\.config\.\w+$|(^|/)\.env(\.\w+)?$|(^|/)config/")
        .unwrap()
});

const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl", "pcss"];
const UI_EXTENSIONS: &[&str] = &["tsx", "jsx", "vue", "svelte"];

/// Directory names that mark peer engine modules.
pub(crate) const ENGINE_DIRS: &[&str] = &["engine", "engines"];

/// One ordered predicate per category; the first match wins.
struct CategoryRule {
    category: Category,
    matches: fn(&str, &[String]) -> bool,
}

static CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Dependencies,
        matches: |path, _| is_manifest(path) || is_lockfile(path),
    },
    CategoryRule {
        category: Category::Styles,
        matches: |path, _| extension(path).is_some_and(|e| STYLE_EXTENSIONS.contains(&e.as_str())),
    },
    CategoryRule {
        category: Category::Engine,
        matches: |_, segs| {
            segs.split_last()
                .is_some_and(|(_, dirs)| dirs.iter().any(|s| ENGINE_DIRS.contains(&s.as_str())))
        },
    },
    CategoryRule {
        category: Category::Tests,
        matches: |path, _| is_test_path(path),
    },
    CategoryRule {
        category: Category::Docs,
        matches: |path, segs| is_doc_file(path) || segs.first().is_some_and(|s| s == "docs"),
    },
    CategoryRule {
        category: Category::Ci,
        matches: |path, _| CI_PATH.is_match(&path.to_lowercase()),
    },
    CategoryRule {
        category: Category::Build,
        matches: |path, _| BUILD_PATH.is_match(&path.to_lowercase()),
    },
    CategoryRule {
        category: Category::Config,
        matches: |path, _| CONFIG_PATH.is_match(&path.to_lowercase()),
    },
    CategoryRule {
        category: Category::Cli,
        matches: |_, segs| has_dir(segs, &["cli", "bin", "commands", "cmd"]),
    },
    CategoryRule {
        category: Category::Api,
        matches: |_, segs| has_dir(segs, &["api", "routes", "handlers", "endpoints"]),
    },
    CategoryRule {
        category: Category::Ui,
        matches: |path, segs| {
            has_dir(segs, &["components", "ui", "views", "pages", "widgets"])
                || extension(path).is_some_and(|e| UI_EXTENSIONS.contains(&e.as_str()))
        },
    },
];

fn has_dir(segs: &[String], names: &[&str]) -> bool {
    segs.split_last()
        .is_some_and(|(_, dirs)| dirs.iter().any(|s| names.contains(&s.as_str())))
}

/// Assign a single category to a path.
pub fn categorize_path(path: &str) -> Category {
    let segs = paths::segments(path);
    CATEGORY_RULES
        .iter()
        .find(|rule| (rule.matches)(path, &segs))
        .map(|rule| rule.category)
        .unwrap_or(Category::Code)
}

/// Accumulated churn weight per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryWeights {
    weights: BTreeMap<Category, usize>,
}

impl CategoryWeights {
    /// Categories by descending weight, ties broken by category priority.
    pub fn ranked(&self) -> Vec<(Category, usize)> {
        let mut ranked: Vec<(Category, usize)> =
            self.weights.iter().map(|(c, w)| (*c, *w)).collect();
        // BTreeMap iteration is in priority order and the sort is stable.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Churn weight a file contributes; new files count double.
pub fn file_weight(file: &FileChange) -> usize {
    let weight = file.weight();
    if file.status == FileStatus::Added {
        weight.saturating_mul(2)
    } else {
        weight
    }
}

/// Categorize every file and accumulate weights.
pub fn categorize<'a>(files: impl IntoIterator<Item = &'a FileChange>) -> CategoryWeights {
    let mut weights = BTreeMap::new();
    for file in files {
        let weight = weights.entry(categorize_path(&file.path)).or_insert(0usize);
        *weight = weight.saturating_add(file_weight(file));
    }
    CategoryWeights { weights }
}

/// Whether the path follows a test naming or directory convention.
pub fn is_test_path(path: &str) -> bool {
    TEST_PATH.is_match(&path.to_lowercase())
}

/// Whether a file is a lockfile that was touched, by name.
pub fn is_lockfile_change(file: &FileChange) -> bool {
    is_lockfile(&file.path) || file_name(&file.path).ends_with(".lock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_path_rules_in_order() {
        assert_eq!(categorize_path("package.json"), Category::Dependencies);
        assert_eq!(categorize_path("web/yarn.lock"), Category::Dependencies);
        assert_eq!(categorize_path("src/theme/main.scss"), Category::Styles);
        assert_eq!(categorize_path("src/engines/gemini.ts"), Category::Engine);
        assert_eq!(categorize_path("src/engine/tests/gemini.test.ts"), Category::Engine);
        assert_eq!(categorize_path("tests/scope_test.rs"), Category::Tests);
        assert_eq!(categorize_path("src/utils/format.spec.ts"), Category::Tests);
        assert_eq!(categorize_path("README.md"), Category::Docs);
        assert_eq!(categorize_path("docs/diagram.svg"), Category::Docs);
        assert_eq!(categorize_path(".github/workflows/ci.yml"), Category::Ci);
        assert_eq!(categorize_path("Dockerfile"), Category::Build);
        assert_eq!(categorize_path("vite.config.ts"), Category::Build);
        assert_eq!(categorize_path(".eslintrc.json"), Category::Config);
        assert_eq!(categorize_path("config/settings.ts"), Category::Config);
        assert_eq!(categorize_path("src/cli/args.rs"), Category::Cli);
        assert_eq!(categorize_path("src/api/users.ts"), Category::Api);
        assert_eq!(categorize_path("src/components/Header.vue"), Category::Ui);
        assert_eq!(categorize_path("src/App.tsx"), Category::Ui);
        assert_eq!(categorize_path("src/utils/format.ts"), Category::Code);
    }

    #[test]
    fn test_engine_name_as_file_is_not_engine_category() {
        assert_eq!(categorize_path("src/engine.rs"), Category::Code);
    }

    #[test]
    fn test_new_files_weigh_double() {
        let files = vec![
            FileChange::new("src/a.rs", FileStatus::Added).with_lines(10, 0),
            FileChange::new("src/b.rs", FileStatus::Modified).with_lines(10, 5),
            FileChange::new("src/c.rs", FileStatus::Deleted),
        ];
        let weights = categorize(&files);
        assert_eq!(weights.ranked(), vec![(Category::Code, 20 + 15 + 1)]);
    }

    #[test]
    fn test_ranked_breaks_ties_by_priority() {
        let files = vec![
            FileChange::new("README.md", FileStatus::Modified).with_lines(5, 5),
            FileChange::new("tests/a_test.rs", FileStatus::Modified).with_lines(5, 5),
            FileChange::new("src/api/x.rs", FileStatus::Modified).with_lines(5, 5),
        ];
        let weights = categorize(&files);
        let order: Vec<Category> = weights.ranked().into_iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec![Category::Api, Category::Tests, Category::Docs]);
    }

    #[test]
    fn test_ranked_prefers_heavier_category() {
        let files = vec![
            FileChange::new("src/api/x.rs", FileStatus::Modified).with_lines(1, 0),
            FileChange::new("README.md", FileStatus::Modified).with_lines(40, 2),
        ];
        assert_eq!(categorize(&files).ranked()[0].0, Category::Docs);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let files = vec![
            FileChange::new("src/a.rs", FileStatus::Added).with_lines(usize::MAX, usize::MAX),
            FileChange::new("src/b.rs", FileStatus::Modified).with_lines(usize::MAX, 1),
        ];
        assert_eq!(categorize(&files).ranked(), vec![(Category::Code, usize::MAX)]);
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("tests/lexer_test.rs"));
        assert!(is_test_path("src/Lexer.spec.ts"));
        assert!(!is_test_path("src/lexer.rs"));
    }

    #[test]
    fn test_empty_input_gives_empty_map() {
        let files: Vec<FileChange> = Vec::new();
        assert!(categorize(&files).ranked().is_empty());
    }
}
