use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use market_data_ingestor::providers::alpha_vantage::AlphaVantageProvider;
use series_sync::clock::SystemClock;
use series_sync::config::{Config, load_config_path};
use series_sync::db::{connection, migrate};
use series_sync::freshness::FreshnessOracle;
use series_sync::ingest::Ingestor;
use series_sync::kind::{Resolution, SeriesKind};
use series_sync::retrieval::Retrieval;
use series_sync::rollup::refresh_rollup;
use series_sync::symbol::Symbol;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Keep a local SQLite copy of market time series in sync")]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending schema migrations.
    Migrate,
    /// Fetch and merge categories for one or more symbols.
    Sync {
        #[arg(required = true)]
        symbols: Vec<String>,
        /// overview, daily or intraday; all three when omitted.
        #[arg(long)]
        kind: Option<SeriesKind>,
        /// Fetch even when stored data is fresh.
        #[arg(long)]
        force: bool,
    },
    /// Recompute averages from stored daily bars.
    Rollup {
        symbol: String,
        #[arg(long, default_value = "weekly")]
        resolution: Resolution,
    },
    /// Print a category as JSON, syncing first when stale.
    Get {
        symbol: String,
        #[arg(long, default_value = "daily")]
        kind: SeriesKind,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let mut cfg = match path {
        Some(p) => load_config_path(p)?,
        None => Config::default(),
    };
    if let Ok(url) = std::env::var("DATABASE_URL") {
        cfg.database.url = url;
    }
    Ok(cfg)
}

fn build_ingestor(cfg: &Config) -> Result<Ingestor<AlphaVantageProvider>> {
    let source = AlphaVantageProvider::from_env(&cfg.source.api_key_env)?
        .with_requests_per_minute(cfg.source.requests_per_minute);
    let oracle = FreshnessOracle::new(cfg.freshness_policy()?, Arc::new(SystemClock));
    Ok(Ingestor::new(source, oracle, cfg.ingest_settings()).with_budget(cfg.call_budget()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    migrate::run_all(&cfg.database.url).context("running migrations")?;
    if matches!(cli.cmd, Cmd::Migrate) {
        info!(url = %cfg.database.url, "migrations applied");
        return Ok(());
    }
    let mut conn = connection::connect_sqlite(&cfg.database.url)?;

    match cli.cmd {
        Cmd::Migrate => {}
        Cmd::Sync {
            symbols,
            kind,
            force,
        } => {
            let mut ingestor = build_ingestor(&cfg)?;
            let mut failures = 0usize;
            for raw in symbols {
                let symbol = match Symbol::parse(&raw) {
                    Ok(s) => s,
                    Err(e) => {
                        error!(symbol = %raw, error = %e, "skipping symbol");
                        failures += 1;
                        continue;
                    }
                };
                let outcomes = match kind {
                    Some(k) if force => vec![(k, ingestor.sync_forced(&mut conn, &symbol, k).await)],
                    Some(k) => vec![(k, ingestor.sync(&mut conn, &symbol, k).await)],
                    None if force => {
                        let mut out = Vec::with_capacity(3);
                        for k in [SeriesKind::Overview, SeriesKind::Daily, SeriesKind::Intraday] {
                            out.push((k, ingestor.sync_forced(&mut conn, &symbol, k).await));
                        }
                        out
                    }
                    None => ingestor.sync_all(&mut conn, &symbol).await,
                };
                for (k, outcome) in outcomes {
                    match outcome {
                        Ok(report) => println!("{}", serde_json::to_string(&report)?),
                        Err(e) => {
                            eprintln!("{symbol} {k}: {e}");
                            failures += 1;
                        }
                    }
                }
            }
            info!(
                calls_made = ingestor.budget().calls_made(),
                remaining = ingestor.budget().remaining(),
                "budget after run"
            );
            if failures > 0 {
                anyhow::bail!("{failures} sync(s) failed");
            }
        }
        Cmd::Rollup { symbol, resolution } => {
            let symbol = Symbol::parse(&symbol)?;
            let report = refresh_rollup(&mut conn, &symbol, resolution, &SystemClock)?;
            println!("{}", serde_json::to_string(&report)?);
        }
        Cmd::Get { symbol, kind } => {
            let symbol = Symbol::parse(&symbol)?;
            let mut retrieval = Retrieval::new(build_ingestor(&cfg)?);
            let out = retrieval.get(&mut conn, &symbol, kind).await?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}
