//! Main entry point for the EPA rating batch runner
//!
//! Loads a season of match records, rates every team on a worker pool and
//! writes the resulting report as JSON.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use epa_engine::config::AppConfig;
use epa_engine::metrics::MetricsCollector;
use epa_engine::rating::RatingEngine;
use epa_engine::types::{MatchRecord, Season, SeasonReport, TeamId};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// EPA Engine - Expected Points Added season ratings
#[derive(Parser)]
#[command(
    name = "epa-engine",
    version,
    about = "Rate every team in a season from its match results",
    long_about = "EPA Engine folds a season of match results into per-team Expected Points \
                 Added ratings, split into early, mid and end phase contributions, and scores \
                 how much each rating can be trusted."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Season match records
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "JSON array of match records for the season"
    )]
    matches: Option<PathBuf>,

    /// Prior-season participants
    #[arg(
        long,
        value_name = "FILE",
        help = "JSON array of team ids that competed in the previous season"
    )]
    veterans: Option<PathBuf>,

    /// Season being rated
    #[arg(short, long, value_name = "YEAR")]
    season: Option<Season>,

    /// Report destination
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Write the JSON report here instead of stdout"
    )]
    output: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Worker pool size override
    #[arg(short, long, value_name = "N", help = "Override worker thread count")]
    workers: Option<usize>,

    /// Enable two-phase carry
    #[arg(
        long,
        help = "Recompute carry against teammates' preliminary ratings"
    )]
    two_phase: bool,

    /// Print metrics after the run
    #[arg(long, help = "Print Prometheus metrics to stderr after the run")]
    print_metrics: bool,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without rating")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(workers) = args.workers {
        config.batch.worker_threads = workers;
    }

    if args.two_phase {
        config.batch.two_phase = true;
    }

    epa_engine::config::validate_config(&config)?;
    Ok(config)
}

/// Display startup banner with run information
fn display_startup_banner(config: &AppConfig, season: Option<Season>) {
    info!("EPA Engine {}", epa_engine::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Workers: {}", config.batch.worker_threads);
    info!("   Two-phase carry: {}", config.batch.two_phase);
    info!(
        "   Legacy model before: {}",
        config.rating.legacy_cutoff_season
    );
    if let Some(season) = season {
        info!("   Season: {}", season);
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let season = args
        .season
        .ok_or_else(|| anyhow!("--season is required"))?;
    let matches_path = args
        .matches
        .as_deref()
        .ok_or_else(|| anyhow!("--matches is required"))?;

    let matches: Vec<MatchRecord> = read_json(matches_path).await?;
    let veterans: HashSet<TeamId> = match &args.veterans {
        Some(path) => read_json::<Vec<TeamId>>(path).await?.into_iter().collect(),
        None => HashSet::new(),
    };
    info!(
        "Loaded {} matches and {} veteran teams",
        matches.len(),
        veterans.len()
    );

    let metrics = Arc::new(MetricsCollector::new()?);
    let engine = RatingEngine::from_app_config(&config)?.with_metrics(metrics.clone());
    let two_phase = config.batch.two_phase;

    let batch = tokio::task::spawn_blocking(move || -> SeasonReport {
        if two_phase {
            engine.rate_season_two_phase(season, &matches, &veterans)
        } else {
            engine.rate_season(season, &matches, &veterans)
        }
    });

    // The batch has no cancellation points; an interrupted run is discarded
    let report = tokio::select! {
        result = batch => result.context("Rating batch panicked")?,
        _ = wait_for_shutdown_signal() => {
            warn!("Shutdown requested, discarding unfinished batch");
            return Err(anyhow!("Interrupted before the batch completed"));
        }
    };

    if !report.failed_teams.is_empty() {
        warn!(
            "{} teams could not be rated: {:?}",
            report.failed_teams.len(),
            report.failed_teams
        );
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    if args.print_metrics {
        eprintln!("{}", metrics.render()?);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config, args.season);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("Dry run completed - exiting without rating");
        return Ok(());
    }

    if let Err(e) = run(args, config).await {
        error!("Rating run failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
