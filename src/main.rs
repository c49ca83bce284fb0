//! quill - CLI entry point.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use git2::Repository;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use quill::backend::{self, Engine, Suggestions};
use quill::commit::{ChangeSet, SubjectFit, collect_staged, commit_staged, fit_subject, truncate_subject};
use quill::config::Config;
use quill::engine::{ChangeType, EngineOptions, Style, analyze};

/// Suggest commit subject lines for staged changes.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Suggest commit subject lines for staged changes")]
#[command(version)]
struct Cli {
    /// Subject style: plain, conv, gitmoji, or mix [env: QUILL_STYLE]
    #[arg(short, long)]
    style: Option<Style>,

    /// Regeneration counter; each value rephrases the same change [env: QUILL_REGEN]
    #[arg(short, long)]
    regen: Option<u64>,

    /// Subject source: local (or none/off), claude, or codex [env: QUILL_ENGINE]
    #[arg(short, long)]
    engine: Option<Engine>,

    /// Flag subjects longer than this; 0 disables [env: QUILL_MAX_LENGTH]
    #[arg(long)]
    max_length: Option<usize>,

    /// Read a JSON change set from a file ("-" for stdin) instead of the git index
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Repository to read staged changes from
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Force the change type (feat, fix, refactor, docs, test, style, chore)
    #[arg(long = "type")]
    change_type: Option<ChangeType>,

    /// Force the scope; an empty value drops it
    #[arg(long)]
    scope: Option<String>,

    /// Commit the staged changes with candidate N (1-based)
    #[arg(long, value_name = "N")]
    commit: Option<usize>,

    /// Print candidates as JSON
    #[arg(long)]
    json: bool,

    /// Print the engine's intermediate analysis
    #[arg(long)]
    explain: bool,

    /// Debug logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    source: Engine,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend_error: Option<&'a str>,
    max_length: usize,
    candidates: Vec<SubjectFit>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(&cli);
    let changes = load_changes(&cli)?;

    let options = EngineOptions {
        style: config.style,
        variant: config.variant,
        change_type: cli.change_type,
        scope: cli.scope.clone(),
        ..Default::default()
    };

    if cli.explain {
        let analysis = analyze(&changes, &options);
        let rendered =
            serde_json::to_string_pretty(&analysis).context("Failed to serialize analysis")?;
        eprintln!("{rendered}");
    }

    let suggestions = backend::suggest(&changes, &options, config.engine, config.max_length).await;
    if let Some(err) = &suggestions.backend_error {
        eprintln!("Warning: {} backend failed ({}). Using local engine.", config.engine, err);
    }

    if cli.json {
        print_json(&suggestions, config.max_length)?;
    } else {
        print_candidates(&suggestions, config.max_length);
    }

    if let Some(n) = cli.commit {
        let Some(subject) = n.checked_sub(1).and_then(|i| suggestions.candidates.get(i)) else {
            bail!(
                "No candidate {} (choose 1 to {})",
                n,
                suggestions.candidates.len()
            );
        };
        let message = truncate_subject(subject, config.max_length);
        let repo = open_repo(&cli.repo)?;
        let oid = commit_staged(&repo, &message).context("Failed to create commit")?;
        let short = oid.to_string().chars().take(7).collect::<String>();
        println!("✓ Committed {}: {}", short, message);
    }

    Ok(())
}

/// Install a stderr fmt subscriber. `RUST_LOG` wins over the defaults.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Environment values overlaid with CLI flags.
fn resolve_config(cli: &Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(style) = cli.style {
        config.style = style;
    }
    if let Some(regen) = cli.regen {
        config.variant = regen;
    }
    if let Some(engine) = cli.engine {
        config.engine = engine;
    }
    if let Some(max_length) = cli.max_length {
        config.max_length = max_length;
    }
    config
}

fn open_repo(path: &Path) -> Result<Repository> {
    Repository::discover(path)
        .context("Not a git repository. Run quill from within a git repository or pass --input.")
}

fn load_changes(cli: &Cli) -> Result<ChangeSet> {
    let Some(input) = &cli.input else {
        let repo = open_repo(&cli.repo)?;
        return collect_staged(&repo).context("Failed to collect staged changes");
    };

    let json = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read change set from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?
    };

    ChangeSet::from_json(&json).context("Invalid change set")
}

fn print_candidates(suggestions: &Suggestions, max_length: usize) {
    for (i, subject) in suggestions.candidates.iter().enumerate() {
        let fit = fit_subject(subject, max_length);
        if fit.over_length {
            println!("{}. {}  [{} > {} chars]", i + 1, subject, fit.length, max_length);
        } else {
            println!("{}. {}", i + 1, subject);
        }
    }
}

fn print_json(suggestions: &Suggestions, max_length: usize) -> Result<()> {
    let output = JsonOutput {
        source: suggestions.source,
        backend_error: suggestions.backend_error.as_deref(),
        max_length,
        candidates: suggestions
            .candidates
            .iter()
            .map(|s| fit_subject(s, max_length))
            .collect(),
    };
    let rendered = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}
