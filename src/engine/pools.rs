//! Fixed phrase pools and deterministic selection.
//!
//! Pools are read-only tables built once. Selection never uses a random
//! source: the same variant and salt always pick the same entry, and
//! incrementing the variant walks through the pool.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::engine::classify::ChangeType;

/// Emoji used for the documentation half of a compound gitmoji subject.
pub const DOCS_EMOJI: &str = "📝";

static VERB_POOLS: LazyLock<HashMap<ChangeType, &'static [&'static str]>> = LazyLock::new(|| {
    HashMap::from([
        (ChangeType::Feat, &["add", "introduce", "implement", "support"] as &[&str]),
        (ChangeType::Fix, &["fix", "resolve", "correct", "repair"] as &[&str]),
        (ChangeType::Refactor, &["refactor", "restructure", "simplify", "reorganize"] as &[&str]),
        (ChangeType::Docs, &["update", "clarify", "improve", "expand"] as &[&str]),
        (ChangeType::Test, &["update", "extend", "improve", "expand"] as &[&str]),
        (ChangeType::Style, &["format", "tidy", "polish", "clean up"] as &[&str]),
        (ChangeType::Chore, &["update", "maintain", "adjust", "tidy"] as &[&str]),
    ])
});

static EMOJI_POOLS: LazyLock<HashMap<ChangeType, &'static [&'static str]>> = LazyLock::new(|| {
    HashMap::from([
        (ChangeType::Feat, &["✨", "🚀"] as &[&str]),
        (ChangeType::Fix, &["🐛", "🩹", "🚑️"] as &[&str]),
        (ChangeType::Refactor, &["♻️", "🏗️"] as &[&str]),
        (ChangeType::Docs, &["📝", "📚"] as &[&str]),
        (ChangeType::Test, &["✅", "🧪"] as &[&str]),
        (ChangeType::Style, &["💄", "🎨"] as &[&str]),
        (ChangeType::Chore, &["🔧", "🔨", "📦"] as &[&str]),
    ])
});

/// Last-resort phrases when descriptions run out.
static ALTERNATIVE_POOLS: LazyLock<HashMap<ChangeType, &'static [&'static str]>> =
    LazyLock::new(|| {
        HashMap::from([
            (
                ChangeType::Feat,
                &["add new functionality", "introduce new capability", "extend existing features"] as &[&str],
            ),
            (
                ChangeType::Fix,
                &["fix incorrect behavior", "resolve reported issue", "correct edge case handling"] as &[&str],
            ),
            (
                ChangeType::Refactor,
                &["restructure internal code", "simplify implementation", "improve code organization"] as &[&str],
            ),
            (
                ChangeType::Docs,
                &["update documentation", "clarify usage notes", "improve project docs"] as &[&str],
            ),
            (
                ChangeType::Test,
                &["update test coverage", "extend test cases", "improve test reliability"] as &[&str],
            ),
            (
                ChangeType::Style,
                &["format source files", "tidy code style", "apply consistent formatting"] as &[&str],
            ),
            (
                ChangeType::Chore,
                &["update project files", "maintain repository setup", "adjust project configuration"] as &[&str],
            ),
        ])
    });

pub fn verb_pool(change_type: ChangeType) -> &'static [&'static str] {
    VERB_POOLS.get(&change_type).copied().unwrap_or(&["update"])
}

pub fn emoji_pool(change_type: ChangeType) -> &'static [&'static str] {
    EMOJI_POOLS.get(&change_type).copied().unwrap_or(&["🔧"])
}

pub fn alternative_pool(change_type: ChangeType) -> &'static [&'static str] {
    ALTERNATIVE_POOLS
        .get(&change_type)
        .copied()
        .unwrap_or(&["update files"])
}

/// Stable salt for a pool key and an auxiliary string.
pub fn salt(key: &str, aux: &str) -> u64 {
    key.bytes()
        .chain(std::iter::once(b':'))
        .chain(aux.bytes())
        .map(u64::from)
        .sum()
}

/// Index into a pool of `len` entries for a variant and salt.
///
/// `(variant * 9301 + 49297 + salt * 233) % 233280 % len`.
pub fn seeded_index(len: usize, variant: u64, salt: u64) -> usize {
    if len == 0 {
        return 0;
    }
    let seed = variant
        .wrapping_mul(9301)
        .wrapping_add(49297)
        .wrapping_add(salt.wrapping_mul(233))
        % 233_280;
    (seed % len as u64) as usize
}

/// Pick an entry from a pool for a variant and salt.
pub fn seeded_choice<'a, T>(pool: &'a [T], variant: u64, salt: u64) -> Option<&'a T> {
    pool.get(seeded_index(pool.len(), variant, salt))
}
