//! label-sync CLI - converge GitHub repositories to the label taxonomy.
//!
//! Run `label-sync --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use label_sync::{
    Config, DryRun, GitHubTracker, Pass, RepoRef, RepoReport, SyncRunner, DEFAULT_API_URL,
};

/// Synchronize issue labels across GitHub repositories.
#[derive(Parser)]
#[command(name = "label-sync")]
#[command(about = "Synchronize the issue label taxonomy across GitHub repositories")]
#[command(version)]
struct Cli {
    /// Taxonomy file (YAML); defaults to the bundled taxonomy
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Repository in owner/repo format (repeatable; replaces the configured list)
    #[arg(short, long = "repo")]
    repos: Vec<RepoRef>,

    /// GitHub token (or set `GITHUB_TOKEN` env var)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API root (or set `GITHUB_API_URL` env var)
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Pass to run (repeatable); defaults to all, always run in order
    #[arg(short, long = "pass", value_enum)]
    passes: Vec<Pass>,

    /// Log the writes instead of performing them
    #[arg(long)]
    dry_run: bool,

    /// Summary format: text, json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Log format: text, json
    #[arg(long, default_value = "text")]
    log_format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::bundled().context("Failed to load bundled taxonomy")?,
    }
    .with_repositories(cli.repos);
    config.ensure_repositories()?;

    let github = GitHubTracker::new(cli.token, &cli.api_url)
        .context("Failed to create GitHub client")?;

    let runner = if cli.dry_run {
        info!("Dry run: no changes will be made");
        SyncRunner::new(DryRun::new(github), config.taxonomy)
    } else {
        SyncRunner::new(github, config.taxonomy)
    }
    .with_passes(&cli.passes);

    info!(
        repositories = config.repositories.len(),
        passes = ?runner.passes(),
        "Starting label sync"
    );

    let reports = match runner.run(&config.repositories).await {
        Ok(reports) => reports,
        Err(e) => {
            error!(error = %e, "Label sync failed");
            return Err(e.into());
        }
    };

    print_summary(&reports, cli.format, cli.dry_run)?;
    Ok(())
}

/// Initialize tracing; `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, format: OutputFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        OutputFormat::Text => registry.with(fmt::layer().with_target(false)).init(),
        OutputFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

fn print_summary(reports: &[RepoReport], format: OutputFormat, dry_run: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reports)?);
        }
        OutputFormat::Text => {
            let header = if dry_run {
                "Planned changes"
            } else {
                "Applied changes"
            };
            println!("{header} ({} repositories):", reports.len());
            for entry in reports {
                let r = &entry.report;
                println!(
                    "  {}: {} created, {} updated, {} migrated, {} collapsed, {} deleted",
                    entry.repository, r.created, r.updated, r.migrated, r.collapsed, r.deleted
                );
            }
        }
    }
    Ok(())
}
