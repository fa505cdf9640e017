//! Deadlink-Patrol main entry point
//!
//! This is the command-line interface for the Deadlink-Patrol broken-link checker.

use anyhow::Context;
use clap::Parser;
use deadlink_patrol::config::{compute_config_hash, load_raw_config, validate, Config};
use deadlink_patrol::report::reports_to_json;
use deadlink_patrol::schedule::run_scheduled;
use deadlink_patrol::Manager;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Deadlink-Patrol: a periodic broken-link checker
///
/// Deadlink-Patrol crawls the configured websites, reports every link that
/// fails to resolve and notifies the configured channels about them.
#[derive(Parser, Debug)]
#[command(name = "deadlink-patrol")]
#[command(version)]
#[command(about = "A periodic broken-link checker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the reports of all sites as JSON after each run
    #[arg(long)]
    json: bool,

    /// Run once immediately, ignoring the cron schedule
    #[arg(long)]
    now: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Read the raw configuration first so its `verbose` setting reaches the logger
    let raw = load_raw_config(&cli.config);
    let config_verbose = raw.as_ref().map(|raw| raw.verbose).unwrap_or(false);
    setup_logging(cli.verbose, cli.quiet, config_verbose);

    let (config, config_hash) = match raw
        .and_then(validate)
        .and_then(|config| Ok((config, compute_config_hash(&cli.config)?)))
    {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).with_context(|| {
                format!("Invalid configuration in {}", cli.config.display())
            });
        }
    };
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    let manager = Manager::new(&config.crawler).context("Failed to initialize manager")?;

    match (&config.schedule, cli.now) {
        (Some(schedule), false) => {
            tracing::info!("Running on schedule, press Ctrl+C to stop");
            let (manager, config, json) = (&manager, &config, cli.json);
            run_scheduled(schedule, move || async move {
                // A failed run is reported and the schedule keeps going
                if let Err(e) = run_once(manager, config, json).await {
                    tracing::error!("Run failed: {:#}", e);
                }
            })
            .await;
        }
        _ => run_once(&manager, &config, cli.json).await?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, config_verbose: bool) {
    let verbose = if verbose == 0 && config_verbose { 1 } else { verbose };
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("deadlink_patrol=info,warn"),
            1 => EnvFilter::new("deadlink_patrol=debug,info"),
            _ => EnvFilter::new("deadlink_patrol=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Executes a single run and optionally prints its reports
async fn run_once(manager: &Manager, config: &Config, json: bool) -> anyhow::Result<()> {
    tracing::info!("Checking {} site(s)", config.sites.len());
    let reports = manager.run(config).await;

    let broken = reports
        .values()
        .filter(|report| !report.broken_links_by_page_url.is_empty())
        .count();
    tracing::info!(
        "Run finished: {} site(s) checked, {} with broken links",
        reports.len(),
        broken
    );

    if json {
        let output = reports_to_json(&reports).context("Failed to print reports")?;
        println!("{}", output);
    }
    Ok(())
}
