//! commit-suggester - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::{Confirm, Input, Select};
use tracing_subscriber::EnvFilter;

use commit_suggester::commit::{SuggestionEngine, SuggestionReport, validate_custom_message};
use commit_suggester::config::{SuggestConfig, parse_template_override};
use commit_suggester::git::GitRepository;

/// Suggest conventional commit messages for your staged changes.
#[derive(Parser, Debug)]
#[command(name = "commit-suggester")]
#[command(about = "Suggest conventional commit messages for your staged changes")]
#[command(version)]
struct Cli {
    /// Stage all changes (like `git add -A`) before suggesting
    #[arg(short, long)]
    all: bool,

    /// Pick a suggestion (or write your own) and commit it
    #[arg(short, long)]
    interactive: bool,

    /// Commit with the top suggestion without asking
    #[arg(long, conflicts_with = "interactive")]
    commit: bool,

    /// Fail instead of falling back to rule-based suggestions when no API key is set
    #[arg(long)]
    require_ai: bool,

    /// Override a rule template, e.g. `feat=feat({scope}): introduce {component}`
    #[arg(long = "template", value_name = "TYPE=TEMPLATE", value_parser = parse_template_override)]
    templates: Vec<(String, String)>,

    /// Per-file diff character cap
    #[arg(long, value_name = "N")]
    max_diff_chars: Option<usize>,

    /// Maximum subject line length
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(10..))]
    max_subject_len: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Run as if started in PATH
    #[arg(short = 'C', value_name = "PATH", default_value = ".")]
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "commit_suggester=debug"
    } else {
        "commit_suggester=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let repo = GitRepository::open(&cli.path).map_err(commit_suggester::SuggestError::from)?;

    if cli.all {
        repo.stage_all().context("Failed to stage changes")?;
    }

    let mut config = SuggestConfig::from_env();
    config.require_ai = cli.require_ai;
    config.templates.extend(cli.templates);
    if let Some(n) = cli.max_diff_chars {
        config.limits.max_file_diff_chars = n;
    }
    if let Some(n) = cli.max_subject_len {
        config.max_subject_len = usize::from(n);
    }

    let engine = SuggestionEngine::from_env(repo.clone(), config)?;
    match engine.provider() {
        Some(provider) => println!("Analyzing staged changes with {provider}..."),
        None => println!("Analyzing staged changes (rule-based)..."),
    }

    let report = engine.generate_suggestions().await?;
    print_report(&report);

    let message = if cli.commit {
        report
            .suggestions
            .first()
            .map(|s| s.message.clone())
            .context("No suggestion to commit with")?
    } else if cli.interactive {
        match choose_message(&report)? {
            Some(message) => message,
            None => {
                println!("Aborted. Nothing committed.");
                return Ok(());
            }
        }
    } else {
        return Ok(());
    };

    let oid = repo.commit_staged(&message)?;
    let short_id: String = oid.to_string().chars().take(7).collect();
    println!("  [DONE] Committed {short_id}: {message}");
    Ok(())
}

fn print_report(report: &SuggestionReport) {
    let stats = report.stats;
    println!();
    println!(
        "{} file(s) changed, +{} -{} [{}]",
        stats.files,
        stats.additions,
        stats.deletions,
        report.scopes.join(", ")
    );
    if let (Some(provider), Some(model)) = (report.provider, report.model.as_deref()) {
        println!("Suggested by {provider} ({model})");
    }
    println!();

    for (idx, suggestion) in report.suggestions.iter().enumerate() {
        println!("  {}. {}  [{}]", idx + 1, suggestion.message, suggestion.source);
        if let Some(explanation) = &suggestion.explanation {
            println!("     {explanation}");
        }
    }
    println!();
}

/// `None` when the user declines to commit.
fn choose_message(report: &SuggestionReport) -> Result<Option<String>> {
    let mut items: Vec<&str> = report
        .suggestions
        .iter()
        .map(|s| s.message.as_str())
        .collect();
    items.push("Write a custom message");

    let picked = Select::new()
        .with_prompt("Choose a commit message")
        .items(&items)
        .default(0)
        .interact()
        .context("Selection cancelled")?;

    let message = if picked == report.suggestions.len() {
        let typed: String = Input::new()
            .with_prompt("Commit message")
            .validate_with(|input: &String| {
                validate_custom_message(input)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
            .interact_text()
            .context("Input cancelled")?;
        validate_custom_message(&typed)?
    } else {
        report.suggestions[picked].message.clone()
    };

    let confirmed = Confirm::new()
        .with_prompt(format!("Commit with \"{message}\"?"))
        .default(true)
        .interact()
        .context("Confirmation cancelled")?;

    Ok(confirmed.then_some(message))
}
