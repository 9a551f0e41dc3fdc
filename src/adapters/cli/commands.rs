//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the momentum radar.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::presenter::{OutputFormat, TablePresenter};
use crate::application::{RankingEngine, RunOutcome};
use crate::config::{load_config, Config};

/// Momentum Radar - early-move ranking for crypto markets
#[derive(Parser, Debug)]
#[command(
    name = "momentum-radar",
    version = env!("CARGO_PKG_VERSION"),
    about = "Ranks crypto assets by how early they are in their current move",
    long_about = "Momentum Radar pulls perpetual tickers and trending coins from public market \
                  APIs, merges them per asset and ranks them by a momentum score that rewards \
                  liquidity, magnitude and earliness. A broad listing is used as fallback."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refresh once and print the ranked view
    Rank(RankCmd),

    /// Refresh on an interval until Ctrl-C
    Watch(WatchCmd),

    /// Load and validate a configuration file
    CheckConfig(CheckConfigCmd),
}

impl Command {
    fn config_path(&self) -> &Path {
        match self {
            Command::Rank(cmd) => cmd.config.as_path(),
            Command::Watch(cmd) => cmd.config.as_path(),
            Command::CheckConfig(cmd) => cmd.config.as_path(),
        }
    }
}

/// One-shot ranking
#[derive(Parser, Debug)]
pub struct RankCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Only show tokens whose name or symbol contains this text
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Continuous ranking
#[derive(Parser, Debug)]
pub struct WatchCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Seconds between refreshes
    #[arg(short, long, value_name = "SECS", default_value = "60")]
    pub interval: u64,

    /// Only show tokens whose name or symbol contains this text
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Configuration check
#[derive(Parser, Debug)]
pub struct CheckConfigCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = read_config(app.command.config_path())?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Rank(cmd) => rank_command(cmd, config).await,
        Command::Watch(cmd) => watch_command(cmd, config).await,
        Command::CheckConfig(cmd) => check_config_command(cmd, config),
    }
}

/// Load config from a path that may start with `~`
fn read_config(path: &Path) -> Result<Config> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
    load_config(&expanded).with_context(|| format!("Failed to load configuration from {}", expanded))
}

/// Initialize logging system. `RUST_LOG` wins over every flag.
pub fn init_logging(verbose: bool, debug: bool, configured_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Handle rank command
async fn rank_command(cmd: RankCmd, config: Config) -> Result<()> {
    let engine = RankingEngine::from_config(&config).context("Failed to build ranking engine")?;
    if let Some(ref query) = cmd.query {
        engine.set_query(query).await;
    }

    let outcome = engine.refresh().await;
    engine.present(&TablePresenter::new(cmd.format)).await;
    report_outcome(outcome, cmd.format);

    outcome.into_result().context("Ranking produced no data")?;
    Ok(())
}

/// Handle watch command
async fn watch_command(cmd: WatchCmd, config: Config) -> Result<()> {
    if cmd.interval == 0 {
        anyhow::bail!("--interval must be at least 1 second");
    }

    let engine = RankingEngine::from_config(&config)
        .context("Failed to build ranking engine")?
        .with_refresh_interval(Duration::from_secs(cmd.interval));
    if let Some(ref query) = cmd.query {
        engine.set_query(query).await;
    }

    // Setup Ctrl+C handler
    let handle = engine.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.stop().await;
    });

    engine.run(&TablePresenter::new(cmd.format)).await;
    Ok(())
}

/// Handle check-config command
fn check_config_command(cmd: CheckConfigCmd, config: Config) -> Result<()> {
    println!("Configuration OK: {}", cmd.config.display());
    println!();
    println!("[pipeline]");
    println!("  top_n:              {}", config.pipeline.top_n);
    println!("  highlight_fraction: {}", config.pipeline.highlight_fraction);
    println!("  rank_key:           {:?}", config.pipeline.rank_key);
    println!("  scoring_strategy:   {:?}", config.pipeline.scoring_strategy);
    println!("  adapter_wait_secs:  {}", config.pipeline.adapter_wait_secs);
    println!("[sources]");
    println!("  coingecko_api_url:  {}", config.sources.get_coingecko_api_url());
    println!("  okx_api_url:        {}", config.sources.get_okx_api_url());
    println!("  vs_currency:        {}", config.sources.vs_currency);
    println!("  listing_per_page:   {}", config.sources.listing_per_page);
    println!("  request_timeout:    {}s", config.sources.request_timeout_secs);
    println!("[filters]");
    println!("  denylist:           {}", config.filters.denylist.join(", "));
    println!("[logging]");
    println!("  level:              {}", config.logging.level);
    Ok(())
}

/// Outcome goes to stderr so JSON on stdout stays parseable
fn report_outcome(outcome: RunOutcome, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(line) = serde_json::to_string(&outcome) {
                eprintln!("{}", line);
            }
        }
        OutputFormat::Text => eprintln!("Outcome: {}", outcome),
    }
}
