//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};
use quill::{ChangeSet, FileChange, FileStatus};

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Read a change set fixture as a string.
pub fn changeset_fixture(name: &str) -> String {
    let path = fixtures_dir().join("changesets").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

pub fn added(path: &str, additions: usize) -> FileChange {
    FileChange::new(path, FileStatus::Added).with_lines(additions, 0)
}

pub fn modified(path: &str, additions: usize, deletions: usize) -> FileChange {
    FileChange::new(path, FileStatus::Modified).with_lines(additions, deletions)
}

pub fn deleted(path: &str, deletions: usize) -> FileChange {
    FileChange::new(path, FileStatus::Deleted).with_lines(0, deletions)
}

/// The new-engine change: Gemini added next to two existing engines.
pub fn gemini_change_set() -> ChangeSet {
    ChangeSet::new(
        vec![
            added("src/engines/gemini.ts", 120),
            modified("src/engines/ollama.ts", 4, 2),
            modified("src/engines/openai.ts", 3, 1),
        ],
        "+export class GeminiEngine implements Engine {\n+  async generate(prompt: string) {\n",
    )
}

/// A single README edit.
pub fn readme_change_set() -> ChangeSet {
    ChangeSet::new(
        vec![modified("README.md", 12, 3)],
        "+## Installation\n+Run `npm install quill`.\n",
    )
}

/// One dependency added to package.json.
pub fn lodash_change_set() -> ChangeSet {
    ChangeSet::new(
        vec![modified("package.json", 1, 0)],
        " \"dependencies\": {\n+    \"lodash\": \"^4.17.21\",\n     \"react\": \"^18.2.0\"\n",
    )
}

/// A varied set of change sets for property-style checks.
pub fn assorted_change_sets() -> Vec<ChangeSet> {
    vec![
        gemini_change_set(),
        readme_change_set(),
        lodash_change_set(),
        ChangeSet::default(),
        ChangeSet::new(vec![modified("src/parser/lexer.rs", 30, 12)], ""),
        ChangeSet::new(
            vec![
                modified("src/components/Header.tsx", 20, 4),
                modified("src/components/Footer.tsx", 8, 2),
                added("src/components/Nav.tsx", 40),
            ],
            "+export function Nav() {\n",
        ),
        ChangeSet::new(
            vec![
                modified("src/api/handlers.rs", 10, 40),
                deleted("src/api/legacy.rs", 200),
                modified("tests/api_test.rs", 15, 5),
                modified("docs/api.md", 30, 10),
            ],
            "-fn legacy_handler() {\n+    // handle error\n+    return Err(e);\n",
        ),
        ChangeSet::new(
            vec![
                modified("src/internationalization_support_layer/mod.rs", 5, 5),
                modified("src/internationalization_support_layer/locale.rs", 5, 5),
            ],
            "",
        ),
    ]
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory with user config.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open config");
            config.set_str("user.name", "Test User").expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file and add it to the index.
    pub fn stage(&self, path: &str, content: &str) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&full, content).expect("Failed to write file");
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(path)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Commit whatever is in the index. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let sig = self.signature();
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }
}
