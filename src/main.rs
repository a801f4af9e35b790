//! Braggard command line
//!
//! Thin front end over the collect, analyze, render and deploy stages.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use braggard::analysis;
use braggard::collection::{self, CollectOptions, CollectOverrides, HttpTransport};
use braggard::config::Config;
use braggard::publish::{self, DeployOptions, SystemRunner};
use braggard::render::{self, OutputFormat};

#[derive(Parser)]
#[command(name = "braggard")]
#[command(about = "Build a static profile report from your GitHub repositories", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of the default lookup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch repository data from GitHub and write a snapshot
    Collect {
        /// Account to collect; defaults to user.handle
        user: Option<String>,

        #[arg(long, env = "BRAGGARD_TOKEN", hide_env_values = true)]
        token: Option<String>,

        #[arg(long)]
        include_private: bool,

        /// Only keep repositories pushed at or after this ISO 8601 time or date
        #[arg(long)]
        since: Option<String>,

        /// Count every commit instead of the configured number of years
        #[arg(long)]
        full_history: bool,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Summarize collected snapshots
    Analyze {
        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render the summary as a static report
    Render {
        #[arg(long)]
        summary: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long, default_value = "html")]
        format: String,
    },
    /// Publish the rendered report to a branch
    Deploy {
        #[arg(long)]
        source: Option<PathBuf>,

        #[arg(long, default_value = publish::DEFAULT_BRANCH)]
        branch: String,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Collect {
            user,
            token,
            include_private,
            since,
            full_history,
            data_dir,
        } => {
            let options = CollectOptions::resolve(
                &config,
                CollectOverrides {
                    login: user,
                    include_private: include_private.then_some(true),
                    since,
                    full_history,
                    data_dir,
                },
            )?;
            let token = token.or_else(|| std::env::var("GITHUB_TOKEN").ok());
            let transport = Arc::new(HttpTransport::new(
                config.api.endpoint.clone(),
                token,
                Duration::from_secs(config.api.timeout_secs),
            ));

            let rt = Runtime::new().context("failed to start async runtime")?;
            let report = rt.block_on(collection::collect(transport, &options))?;
            println!(
                "Wrote {} of {} repositories to {}",
                report.written,
                report.listed,
                report.snapshot.display()
            );
            for degraded in &report.enrichment.degraded {
                println!("  {} ({}): {}", degraded.repository, degraded.query, degraded.cause);
            }
        }
        Commands::Analyze { data_dir, output } => {
            let data_dir = data_dir.unwrap_or_else(|| config.paths.data_dir.clone());
            let output = output.unwrap_or_else(|| config.paths.summary_path.clone());
            let summary = analysis::analyze(&data_dir, &output, None)?;
            println!(
                "Summarized {} repositories ({} stars) into {}",
                summary.aggregate.repo_count,
                summary.aggregate.total_stars,
                output.display()
            );
        }
        Commands::Render {
            summary,
            output_dir,
            format,
        } => {
            let format: OutputFormat = format.parse()?;
            let summary = summary.unwrap_or_else(|| config.paths.summary_path.clone());
            let output_dir = output_dir.unwrap_or_else(|| config.paths.output_dir.clone());
            let path = render::render(&summary, &output_dir, format)?;
            println!("Rendered {}", path.display());
        }
        Commands::Deploy { source, branch } => {
            let options = DeployOptions {
                source: source.unwrap_or_else(|| config.paths.output_dir.clone()),
                branch,
                ..DeployOptions::default()
            };
            publish::deploy(&options, &SystemRunner)?;
            println!("Published to {}", options.branch);
        }
    }

    Ok(())
}
