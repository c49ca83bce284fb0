//! Deterministic commit subject synthesis.
//!
//! Every function in this module is pure: the same [`ChangeSet`] and
//! [`EngineOptions`] always produce the same candidates. The `variant`
//! counter is how callers ask for different phrasing of the same change.

pub mod categories;
pub mod classify;
pub mod describe;
pub mod docs;
pub mod entities;
pub mod focus;
pub mod paths;
pub mod pools;
pub mod render;
pub mod scope;

use serde::Serialize;

use crate::commit::ChangeSet;

pub use categories::{Category, CategoryWeights};
pub use classify::ChangeType;
pub use describe::Description;
pub use entities::ExtractedEntities;
pub use focus::{FocusKind, PrimaryFocus};
pub use render::{DocsMode, Style};

/// Heuristic bars used by the analysers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// Documentation share needed during a structural refactor.
    pub architectural_docs: f64,
    /// Documentation share needed otherwise.
    pub default_docs: f64,
    /// Share of files one directory must hold to be the focus.
    pub scope_dominance: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            architectural_docs: 0.6,
            default_docs: 0.4,
            scope_dominance: 0.6,
        }
    }
}

/// Per-request engine settings.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub style: Style,
    /// Regeneration counter; each increment rotates phrasing.
    pub variant: u64,
    pub thresholds: Thresholds,
    /// Replaces the classified type when set.
    pub change_type: Option<ChangeType>,
    /// Replaces the detected scope when set. An empty string means no scope.
    pub scope: Option<String>,
}

/// Intermediate results of one engine run.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub entities: ExtractedEntities,
    pub categories: CategoryWeights,
    pub scope: String,
    pub focus: PrimaryFocus,
    pub change_type: ChangeType,
    /// Name of the classification rule that fired, or `override`.
    pub type_rule: &'static str,
    pub descriptions: Vec<Description>,
    pub docs_significant: bool,
    pub docs: DocsMode,
    pub variant: u64,
}

impl Analysis {
    /// Render 1 to 3 candidates in `style`.
    pub fn candidates(&self, style: Style) -> Vec<String> {
        let ctx = render::RenderContext {
            change_type: self.change_type,
            scope: &self.scope,
            descriptions: &self.descriptions,
            docs: &self.docs,
            variant: self.variant,
        };
        render::render_candidates(&ctx, style)
    }
}

/// Run every analyser over the change set.
pub fn analyze(changes: &ChangeSet, options: &EngineOptions) -> Analysis {
    let thresholds = &options.thresholds;
    let (doc_files, code_files) = paths::split_docs(&changes.files);

    let entities = entities::extract_entities(&changes.diff, &changes.files);
    let focus = focus::detect_focus(&code_files, thresholds);
    let classification = classify::classify(&changes.files, &changes.diff, &entities, &focus);

    let (change_type, type_rule) = match options.change_type {
        Some(change_type) => (change_type, "override"),
        None => (classification.change_type, classification.rule),
    };
    let scope = match &options.scope {
        Some(scope) => scope.trim().to_lowercase(),
        None => scope::detect_scope(&changes.files),
    };

    let subject_files = if code_files.is_empty() {
        &doc_files
    } else {
        &code_files
    };
    let subject_categories = categories::categorize(subject_files.iter().copied());
    let descriptions = describe::build_descriptions(
        &describe::DescribeContext {
            files: subject_files,
            change_type,
            focus: &focus,
            entities: &entities,
            categories: &subject_categories,
        },
        options.variant,
    );

    let docs_significant = docs::docs_significant(&doc_files, &code_files, &focus, thresholds);
    let docs = if !docs_significant {
        DocsMode::Ignored
    } else {
        let topic = docs::doc_topic(&doc_files, &changes.diff);
        if code_files.is_empty() {
            DocsMode::Alone(topic)
        } else {
            DocsMode::Compound(topic)
        }
    };

    tracing::debug!(
        files = changes.files.len(),
        %change_type,
        %scope,
        focus = %focus.kind,
        docs_significant,
        "analysis complete"
    );

    Analysis {
        entities,
        categories: categories::categorize(&changes.files),
        scope,
        focus,
        change_type,
        type_rule,
        descriptions,
        docs_significant,
        docs,
        variant: options.variant,
    }
}

/// Candidate subjects for a change set: 1 to 3 unique strings.
pub fn generate_candidates(changes: &ChangeSet, options: &EngineOptions) -> Vec<String> {
    analyze(changes, options).candidates(options.style)
}
