//! Candidate rendering in the requested styles.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::classify::ChangeType;
use crate::engine::describe::Description;
use crate::engine::pools::{self, DOCS_EMOJI, salt, seeded_choice, seeded_index};
use crate::error::InputError;

/// Most candidates returned for one request.
pub const MAX_CANDIDATES: usize = 3;

/// Output style of a subject line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Plain,
    #[default]
    Conv,
    Gitmoji,
    /// One candidate in each of the other styles.
    Mix,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Conv => "conv",
            Self::Gitmoji => "gitmoji",
            Self::Mix => "mix",
        }
    }

    /// Concrete styles to render, primary first.
    pub fn expand(&self) -> &'static [Style] {
        match self {
            Self::Plain => &[Style::Plain],
            Self::Conv => &[Style::Conv],
            Self::Gitmoji => &[Style::Gitmoji],
            Self::Mix => &[Style::Conv, Style::Plain, Style::Gitmoji],
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Style {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "conv" | "conventional" => Ok(Self::Conv),
            "gitmoji" | "emoji" => Ok(Self::Gitmoji),
            "mix" | "mixed" => Ok(Self::Mix),
            _ => Err(InputError::InvalidStyle(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Style>().map_err(serde::de::Error::custom)
    }
}

/// How documentation changes take part in the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "topic", rename_all = "kebab-case")]
pub enum DocsMode {
    /// Documentation is incidental and left out.
    Ignored,
    /// Code subject with a documentation half appended.
    Compound(String),
    /// Documentation is the whole change.
    Alone(String),
}

/// Everything the renderer needs for one request.
pub struct RenderContext<'a> {
    pub change_type: ChangeType,
    pub scope: &'a str,
    pub descriptions: &'a [Description],
    pub docs: &'a DocsMode,
    pub variant: u64,
}

/// Render up to three distinct candidates, never zero.
pub fn render_candidates(ctx: &RenderContext<'_>, style: Style) -> Vec<String> {
    let styles = style.expand();
    let primary_style = styles[0];
    let mut out = CandidateList::default();

    for s in styles {
        out.push(render_primary(ctx, *s));
    }

    let (change_type, scope) = effective_type_and_scope(ctx);
    for description in ctx.descriptions.iter().skip(1) {
        if out.is_full() {
            break;
        }
        let verb = resolve_verb(change_type, description, ctx.variant);
        out.push(format_subject(
            primary_style,
            change_type,
            scope,
            &format!("{verb} {}", description.noun),
            ctx.variant,
        ));
    }

    let alternatives = pools::alternative_pool(change_type);
    let start = seeded_index(alternatives.len(), ctx.variant, salt(change_type.as_str(), "alt"));
    for offset in 0..alternatives.len() {
        if out.is_full() {
            break;
        }
        let phrase = alternatives[(start + offset) % alternatives.len()];
        out.push(format_subject(primary_style, change_type, scope, phrase, ctx.variant));
    }

    let mut candidates = out.into_inner();
    if candidates.is_empty() {
        candidates.push(fallback_subject(primary_style));
    }
    candidates
}

/// Literal used when no candidate survives.
pub fn fallback_subject(style: Style) -> String {
    match style {
        Style::Conv | Style::Mix => "chore: update files".to_string(),
        Style::Plain | Style::Gitmoji => "Update files".to_string(),
    }
}

fn effective_type_and_scope<'a>(ctx: &RenderContext<'a>) -> (ChangeType, &'a str) {
    match ctx.docs {
        DocsMode::Alone(_) => (ChangeType::Docs, ""),
        _ => (ctx.change_type, ctx.scope),
    }
}

fn render_primary(ctx: &RenderContext<'_>, style: Style) -> String {
    let (change_type, scope) = effective_type_and_scope(ctx);

    if let DocsMode::Alone(topic) = ctx.docs {
        let verb = docs_verb(topic, ctx.variant);
        return format_subject(style, change_type, scope, &format!("{verb} {topic}"), ctx.variant);
    }

    let description = ctx.descriptions.first().cloned().unwrap_or_else(Description::fallback);
    let verb = resolve_verb(change_type, &description, ctx.variant);
    let code_half = format!("{verb} {}", description.noun);
    let subject = format_subject(style, change_type, scope, &code_half, ctx.variant);

    match ctx.docs {
        DocsMode::Compound(topic) => {
            let docs_half = format!("{} {topic}", docs_verb(topic, ctx.variant));
            match style {
                Style::Plain => format!("{subject} and {docs_half}"),
                Style::Gitmoji => format!("{subject}; {DOCS_EMOJI} {docs_half}"),
                Style::Conv | Style::Mix => format!("{subject}; {docs_half}"),
            }
        }
        _ => subject,
    }
}

/// Keep a specific verb; vary the type's generic verb through its pool.
fn resolve_verb(change_type: ChangeType, description: &Description, variant: u64) -> String {
    if description.verb != change_type.default_verb() {
        return description.verb.clone();
    }
    let pool = pools::verb_pool(change_type);
    seeded_choice(pool, variant, salt(change_type.as_str(), &description.noun))
        .map(|v| v.to_string())
        .unwrap_or_else(|| description.verb.clone())
}

fn docs_verb(topic: &str, variant: u64) -> &'static str {
    seeded_choice(pools::verb_pool(ChangeType::Docs), variant, salt("docs", topic))
        .copied()
        .unwrap_or("update")
}

fn format_subject(
    style: Style,
    change_type: ChangeType,
    scope: &str,
    phrase: &str,
    variant: u64,
) -> String {
    match style {
        Style::Plain => capitalize_first(phrase),
        Style::Gitmoji => {
            let emoji = seeded_choice(pools::emoji_pool(change_type), variant, salt(change_type.as_str(), "emoji"))
                .copied()
                .unwrap_or("🔧");
            format!("{emoji} {}", capitalize_first(phrase))
        }
        Style::Conv | Style::Mix => {
            if scope.is_empty() || scope == change_type.as_str() {
                format!("{change_type}: {phrase}")
            } else {
                format!("{change_type}({scope}): {phrase}")
            }
        }
    }
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Trim, collapse inner whitespace and strip trailing periods.
pub fn normalize_subject(subject: &str) -> String {
    let collapsed = subject.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches('.').trim_end().to_string()
}

/// Deduplicating candidate accumulator capped at [`MAX_CANDIDATES`].
#[derive(Default)]
struct CandidateList {
    items: Vec<String>,
}

impl CandidateList {
    fn push(&mut self, candidate: String) {
        let candidate = normalize_subject(&candidate);
        if candidate.is_empty() || self.is_full() || self.items.contains(&candidate) {
            return;
        }
        self.items.push(candidate);
    }

    fn is_full(&self) -> bool {
        self.items.len() >= MAX_CANDIDATES
    }

    fn into_inner(self) -> Vec<String> {
        self.items
    }
}

static CONVENTIONAL_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)(?:\(([^)]+)\))?(!)?\s*:\s*(.+)$").unwrap());

/// Parts of a `type(scope): description` subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalSubject {
    pub change_type: ChangeType,
    pub scope: Option<String>,
    pub breaking: bool,
    pub description: String,
}

/// Parse a conventional subject whose type is one the engine produces.
pub fn parse_conventional(subject: &str) -> Option<ConventionalSubject> {
    let first_line = subject.lines().next().unwrap_or("");
    let caps = CONVENTIONAL_SUBJECT.captures(first_line)?;
    let change_type = caps.get(1)?.as_str().parse::<ChangeType>().ok()?;
    Some(ConventionalSubject {
        change_type,
        scope: caps.get(2).map(|m| m.as_str().to_string()),
        breaking: caps.get(3).is_some(),
        description: caps.get(4)?.as_str().to_string(),
    })
}
