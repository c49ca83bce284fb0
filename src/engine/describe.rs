//! Description building.
//!
//! Independent strategies each propose `(verb, noun)` pairs. They are merged
//! in priority order, near-duplicate nouns are dropped, and the caller's
//! variant rotates which description leads.

use serde::Serialize;

use crate::commit::FileChange;
use crate::engine::categories::{Category, CategoryWeights};
use crate::engine::classify::ChangeType;
use crate::engine::entities::ExtractedEntities;
use crate::engine::focus::{self, FocusKind, PrimaryFocus};
use crate::engine::paths::{file_stem, join_natural, replacement_pairs};

/// Focus weight at which the focus description outranks entity descriptions.
pub const FOCUS_LEADS_WEIGHT: u32 = 75;

/// Most categories named in a category description.
const MAX_CATEGORY_NOUNS: usize = 3;

/// A verb and the thing it acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Description {
    pub verb: String,
    pub noun: String,
}

impl Description {
    pub fn new(verb: impl Into<String>, noun: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            noun: noun.into(),
        }
    }

    /// Literal used when nothing else could be described.
    pub fn fallback() -> Self {
        Self::new("update", "files")
    }

    pub fn phrase(&self) -> String {
        format!("{} {}", self.verb, self.noun)
    }
}

/// Inputs shared by every strategy.
pub struct DescribeContext<'a> {
    pub files: &'a [&'a FileChange],
    pub change_type: ChangeType,
    pub focus: &'a PrimaryFocus,
    pub entities: &'a ExtractedEntities,
    pub categories: &'a CategoryWeights,
}

/// Ordered, deduplicated descriptions, rotated so `variant` picks the lead.
pub fn build_descriptions(ctx: &DescribeContext<'_>, variant: u64) -> Vec<Description> {
    let mut list = DescriptionList::default();

    let focus_leads = ctx.focus.weight >= FOCUS_LEADS_WEIGHT;
    if focus_leads {
        list.extend(focus_description(ctx));
    }
    list.extend(entity_descriptions(ctx));
    if !focus_leads {
        list.extend(focus_description(ctx));
    }
    list.extend(category_description(ctx));
    if list.is_empty() {
        list.extend(count_description(ctx));
    }

    let mut descriptions = list.into_inner();
    if descriptions.is_empty() {
        descriptions.push(Description::fallback());
    }

    let rotated = rotate(descriptions, variant);
    tracing::debug!(
        count = rotated.len(),
        primary = %rotated[0].phrase(),
        "built descriptions"
    );
    rotated
}

/// Accumulates descriptions, rejecting nouns that repeat or contain one another.
#[derive(Default)]
struct DescriptionList {
    items: Vec<Description>,
}

impl DescriptionList {
    fn push(&mut self, description: Description) {
        let noun = description.noun.trim().to_lowercase();
        if noun.is_empty() {
            return;
        }
        let duplicate = self.items.iter().any(|existing| {
            let other = existing.noun.to_lowercase();
            other == noun || other.contains(&noun) || noun.contains(&other)
        });
        if !duplicate {
            self.items.push(description);
        }
    }

    fn extend(&mut self, descriptions: impl IntoIterator<Item = Description>) {
        for description in descriptions {
            self.push(description);
        }
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn into_inner(self) -> Vec<Description> {
        self.items
    }
}

/// `list[variant % len]` first, followed by the entries after it, wrapping.
fn rotate(mut descriptions: Vec<Description>, variant: u64) -> Vec<Description> {
    if descriptions.len() > 1 {
        let start = (variant % descriptions.len() as u64) as usize;
        descriptions.rotate_left(start);
    }
    descriptions
}

fn entity_descriptions(ctx: &DescribeContext<'_>) -> Vec<Description> {
    let mut out = Vec::new();
    let entities = ctx.entities;

    if let Some(deps) = dependency_description(entities) {
        out.push(deps);
    }

    if let Some((old, new)) = replacement_pairs(ctx.files).first() {
        out.push(Description::new(
            "replace",
            format!("{} with {}", file_stem(&old.path), file_stem(&new.path)),
        ));
    }

    match ctx.change_type {
        ChangeType::Feat | ChangeType::Refactor => {
            let verb = ctx.change_type.default_verb();
            if let Some(noun) = declaration_noun(&entities.components, "component") {
                out.push(Description::new(verb, noun));
            }
            if let Some(noun) = declaration_noun(&entities.classes, "class") {
                out.push(Description::new(verb, noun));
            }
            if let Some(noun) = declaration_noun(&entities.functions, "function") {
                out.push(Description::new(verb, noun));
            }
        }
        ChangeType::Fix => {
            let target = entities
                .functions
                .first()
                .cloned()
                .or_else(|| summary_identifier(ctx.files));
            if let Some(name) = target {
                let what = if entities.has_error_handling { "error" } else { "issue" };
                out.push(Description::new("fix", format!("{what} in {name} function")));
            }
        }
        _ => {}
    }

    out
}

fn dependency_description(entities: &ExtractedEntities) -> Option<Description> {
    let added = &entities.dependencies_added;
    let removed = &entities.dependencies_removed;
    match (added.is_empty(), removed.is_empty()) {
        (true, true) => None,
        (false, false) => Some(Description::new("manage", "dependencies")),
        (false, true) => Some(match added.len() {
            1 => Description::new("update", format!("{} dependency", added[0])),
            _ => Description::new("add", dependency_list(added)),
        }),
        (true, false) => Some(Description::new(
            "remove",
            match removed.len() {
                1 => format!("{} dependency", removed[0]),
                _ => dependency_list(removed),
            },
        )),
    }
}

fn dependency_list(names: &[String]) -> String {
    if names.len() == 2 {
        format!("{} dependencies", join_natural(names))
    } else {
        format!("{} dependencies", names.len())
    }
}

/// `Foo class`, `a and b functions`, or `4 functions`.
fn declaration_noun(names: &[String], kind: &str) -> Option<String> {
    let plural = if kind.ends_with('s') {
        format!("{kind}es")
    } else {
        format!("{kind}s")
    };
    match names.len() {
        0 => None,
        1 => Some(format!("{} {kind}", names[0])),
        2 => Some(format!("{} {plural}", join_natural(names))),
        n => Some(format!("{n} {plural}")),
    }
}

/// First identifier from any file's summary.
fn summary_identifier(files: &[&FileChange]) -> Option<String> {
    files
        .iter()
        .flat_map(|f| f.summary_identifiers())
        .next()
        .map(str::to_string)
}

fn focus_description(ctx: &DescribeContext<'_>) -> Option<Description> {
    let focus = ctx.focus;
    let verb = match focus.kind {
        FocusKind::Generic => return None,
        FocusKind::EngineRefactor | FocusKind::CoreRefactor => "refactor",
        FocusKind::NewEngine if ctx.change_type == ChangeType::Feat => "add",
        FocusKind::NewEngine => "implement",
        FocusKind::MultiEngine | FocusKind::Deps => "update",
        _ => ctx.change_type.default_verb(),
    };
    Some(Description::new(verb, focus.detail.clone()))
}

fn category_description(ctx: &DescribeContext<'_>) -> Option<Description> {
    let nouns: Vec<String> = ctx
        .categories
        .ranked()
        .into_iter()
        .take(MAX_CATEGORY_NOUNS)
        .map(|(category, _)| category_noun(category, ctx.files))
        .collect();
    if nouns.is_empty() {
        return None;
    }
    Some(Description::new(ctx.change_type.default_verb(), join_natural(&nouns)))
}

fn category_noun(category: Category, files: &[&FileChange]) -> String {
    if category == Category::Engine {
        let names = focus::engine_names(files.iter().copied());
        if !names.is_empty() {
            return focus::engine_phrase(&names);
        }
    }
    category.noun().to_string()
}

fn count_description(ctx: &DescribeContext<'_>) -> Option<Description> {
    match ctx.files.len() {
        0 => None,
        1 => Some(Description::new(ctx.change_type.default_verb(), "1 file")),
        n => Some(Description::new(ctx.change_type.default_verb(), format!("{n} files"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::FileStatus;
    use crate::engine::categories::categorize;

    fn describe(
        files: &[FileChange],
        change_type: ChangeType,
        focus: &PrimaryFocus,
        entities: &ExtractedEntities,
        variant: u64,
    ) -> Vec<Description> {
        let refs: Vec<&FileChange> = files.iter().collect();
        let categories = categorize(files);
        let ctx = DescribeContext {
            files: &refs,
            change_type,
            focus,
            entities,
            categories: &categories,
        };
        build_descriptions(&ctx, variant)
    }

    fn new_engine_focus() -> PrimaryFocus {
        PrimaryFocus {
            kind: FocusKind::NewEngine,
            detail: "Gemini engine".to_string(),
            weight: 90,
        }
    }

    fn engine_files() -> Vec<FileChange> {
        vec![
            FileChange::new("src/engines/gemini.ts", FileStatus::Added).with_lines(120, 0),
            FileChange::new("src/engines/ollama.ts", FileStatus::Modified).with_lines(3, 1),
            FileChange::new("src/engines/openai.ts", FileStatus::Modified).with_lines(2, 0),
        ]
    }

    #[test]
    fn test_strong_focus_leads() {
        let entities = ExtractedEntities {
            classes: vec!["GeminiEngine".to_string()],
            ..Default::default()
        };
        let list = describe(&engine_files(), ChangeType::Feat, &new_engine_focus(), &entities, 0);
        assert_eq!(list[0], Description::new("add", "Gemini engine"));
        assert_eq!(list[1], Description::new("add", "GeminiEngine class"));
    }

    #[test]
    fn test_engine_category_noun_is_derived_from_names() {
        let entities = ExtractedEntities::default();
        let list = describe(&engine_files(), ChangeType::Feat, &PrimaryFocus::generic(), &entities, 0);
        assert_eq!(list[0].noun, "Gemini, Ollama, and OpenAI engines");
    }

    #[test]
    fn test_near_duplicates_are_dropped() {
        let entities = ExtractedEntities::default();
        // Focus detail "Gemini engine" is contained in the engine category noun.
        let files = vec![FileChange::new("src/engines/gemini.ts", FileStatus::Added).with_lines(10, 0)];
        let list = describe(&files, ChangeType::Feat, &new_engine_focus(), &entities, 0);
        assert_eq!(list, vec![Description::new("add", "Gemini engine")]);
    }

    #[test]
    fn test_variant_rotates_primary() {
        let entities = ExtractedEntities {
            classes: vec!["GeminiEngine".to_string()],
            ..Default::default()
        };
        let files = engine_files();
        let first = describe(&files, ChangeType::Feat, &new_engine_focus(), &entities, 0);
        let second = describe(&files, ChangeType::Feat, &new_engine_focus(), &entities, 1);
        assert_eq!(second[0], first[1]);
        assert_eq!(second.last(), first.first());
        let wrapped = describe(&files, ChangeType::Feat, &new_engine_focus(), &entities, first.len() as u64);
        assert_eq!(wrapped, first);
    }

    #[test]
    fn test_single_dependency_wording() {
        let files = vec![FileChange::new("package.json", FileStatus::Modified).with_lines(1, 0)];
        let entities = ExtractedEntities {
            dependencies_added: vec!["lodash".to_string()],
            ..Default::default()
        };
        let focus = PrimaryFocus {
            kind: FocusKind::Deps,
            detail: "dependencies".to_string(),
            weight: 60,
        };
        let list = describe(&files, ChangeType::Chore, &focus, &entities, 0);
        assert_eq!(list[0], Description::new("update", "lodash dependency"));
    }

    #[test]
    fn test_dependency_wording_by_shape() {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let entities = ExtractedEntities {
            dependencies_added: names(&["zod", "chalk"]),
            ..Default::default()
        };
        assert_eq!(
            dependency_description(&entities),
            Some(Description::new("add", "zod and chalk dependencies"))
        );

        let entities = ExtractedEntities {
            dependencies_removed: names(&["a", "b", "c"]),
            ..Default::default()
        };
        assert_eq!(
            dependency_description(&entities),
            Some(Description::new("remove", "3 dependencies"))
        );

        let entities = ExtractedEntities {
            dependencies_added: names(&["a"]),
            dependencies_removed: names(&["b"]),
            ..Default::default()
        };
        assert_eq!(
            dependency_description(&entities),
            Some(Description::new("manage", "dependencies"))
        );
    }

    #[test]
    fn test_replacement_description() {
        let files = vec![
            FileChange::new("src/http/client.ts", FileStatus::Deleted).with_lines(0, 40),
            FileChange::new("src/http/fetcher.ts", FileStatus::Added).with_lines(50, 0),
        ];
        let list = describe(&files, ChangeType::Refactor, &PrimaryFocus::generic(), &ExtractedEntities::default(), 0);
        assert_eq!(list[0], Description::new("replace", "client with fetcher"));
    }

    #[test]
    fn test_fix_description_uses_summary_when_no_function() {
        let files = vec![
            FileChange::new("src/parser.rs", FileStatus::Modified)
                .with_lines(2, 1)
                .with_summary("parse_header, read_line"),
        ];
        let list = describe(&files, ChangeType::Fix, &PrimaryFocus::generic(), &ExtractedEntities::default(), 0);
        assert_eq!(list[0], Description::new("fix", "issue in parse_header function"));

        let entities = ExtractedEntities {
            functions: vec!["tokenize".to_string()],
            has_error_handling: true,
            ..Default::default()
        };
        let list = describe(&files, ChangeType::Fix, &PrimaryFocus::generic(), &entities, 0);
        assert_eq!(list[0], Description::new("fix", "error in tokenize function"));
    }

    #[test]
    fn test_two_functions_are_joined() {
        let files = vec![FileChange::new("src/lib.rs", FileStatus::Modified).with_lines(8, 0)];
        let entities = ExtractedEntities {
            functions: vec!["load".to_string(), "save".to_string()],
            ..Default::default()
        };
        let list = describe(&files, ChangeType::Feat, &PrimaryFocus::generic(), &entities, 0);
        assert_eq!(list[0], Description::new("add", "load and save functions"));
    }

    #[test]
    fn test_empty_input_gets_fallback() {
        let list = describe(&[], ChangeType::Chore, &PrimaryFocus::generic(), &ExtractedEntities::default(), 3);
        assert_eq!(list, vec![Description::fallback()]);
    }
}
