//! deltamin-bench - drives the minimizer against a synthetic failure.
//!
//! Builds the change set `0..size`, hides a failing subset in it, and runs
//! delta debugging with an oracle that is interesting whenever the candidate
//! still contains the whole hidden set. The run succeeds when the minimizer
//! recovers exactly the hidden set.
//!
//! # Usage
//!
//! ```bash
//! # Reference fixture, staged strategy
//! deltamin-bench
//!
//! # Random 97-element hidden set, combined strategy, early exit
//! deltamin-bench --fixture random-size --hidden-size 97 --seed 7 \
//!     --strategy combined --eager-cancellation
//!
//! # Start from a configuration file
//! deltamin-bench --config bench.toml --json
//! ```

mod config;
mod fixture;
mod generate;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use config::BenchConfig;
use deltamin::{DeltaDebugMinimizer, SearchStats, Strategy, SupersetOracle};
use fixture::FixtureKind;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI arguments for the harness.
#[derive(Parser, Debug)]
#[command(
    name = "deltamin-bench",
    about = "Minimize a synthetic failing change set with parallel delta debugging",
    version
)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Evaluation strategy (staged, combined).
    #[arg(short, long, value_name = "STRATEGY")]
    strategy: Option<Strategy>,

    /// Initial number of partitions.
    #[arg(short = 'n', long, value_name = "N")]
    granularity: Option<usize>,

    /// Maximum concurrent oracle evaluations.
    #[arg(short = 'j', long, value_name = "N")]
    max_concurrency: Option<usize>,

    /// Skip evaluations once a lower partition has hit.
    #[arg(long)]
    eager_cancellation: bool,

    /// Hidden set fixture (reference, random-size, random-density).
    #[arg(short, long, value_name = "KIND")]
    fixture: Option<FixtureKind>,

    /// Number of changes in the input.
    #[arg(long, value_name = "N")]
    size: Option<u32>,

    /// Hidden set size for the random-size fixture.
    #[arg(long, value_name = "N")]
    hidden_size: Option<usize>,

    /// Keep probability for the random-density fixture.
    #[arg(long, value_name = "P")]
    density: Option<f64>,

    /// RNG seed for random fixtures.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enable JSON log output.
    #[arg(long)]
    json_logs: bool,

    /// Print the run report as JSON.
    #[arg(long)]
    json: bool,

    /// Print the default configuration and exit.
    #[arg(long)]
    print_config: bool,
}

/// Outcome of one harness run.
#[derive(Debug, Serialize)]
struct RunReport {
    strategy: Strategy,
    result: Vec<u32>,
    expected: Vec<u32>,
    matches: bool,
    elapsed_secs: f64,
    stats: SearchStats,
}

/// Initialize tracing/logging.
fn init_tracing(config: &config::LoggingConfig, json_logs: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Failed to parse log filter")?;

    let format = if json_logs || config.format == "json" {
        "json"
    } else {
        &config.format
    };

    let registry = tracing_subscriber::registry().with(filter);
    let initialized = match format {
        "json" => registry.with(fmt::layer().json()).try_init(),
        "compact" => registry.with(fmt::layer().compact()).try_init(),
        _ => registry.with(fmt::layer().pretty()).try_init(),
    };
    initialized.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

async fn run(config: &BenchConfig) -> Result<RunReport> {
    let changes = config.fixture.changes();
    let expected = config
        .fixture
        .hidden_set()
        .context("Failed to build hidden set")?;

    info!(
        fixture = ?config.fixture.kind,
        size = changes.len(),
        hidden = expected.len(),
        "Fixture ready"
    );

    let oracle = Arc::new(SupersetOracle::new(expected.iter().copied()));
    let minimizer = DeltaDebugMinimizer::new(config.search.clone());

    let start = Instant::now();
    let minimized = minimizer
        .minimize(changes, oracle)
        .await
        .context("Minimization failed")?;
    let elapsed = start.elapsed();

    Ok(RunReport {
        strategy: config.search.strategy,
        matches: minimized.changes == expected,
        result: minimized.changes,
        expected,
        elapsed_secs: elapsed.as_secs_f64(),
        stats: minimized.stats,
    })
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("res: {:?}", report.result);
    println!("act: {:?}", report.expected);
    println!("{}", report.stats);
    println!(
        "{} strategy ran in {:.6} s",
        report.strategy, report.elapsed_secs
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    if args.print_config {
        let config = BenchConfig::default();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut config = if let Some(ref config_path) = args.config {
        BenchConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        BenchConfig::default()
    };

    config.merge_cli_args(&args);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging, args.json_logs)?;

    info!(version = env!("CARGO_PKG_VERSION"), "deltamin-bench starting");

    let report = run(&config).await?;
    print_report(&report, args.json)?;

    if !report.matches {
        error!(
            result = report.result.len(),
            expected = report.expected.len(),
            "Minimized set differs from the hidden set"
        );
        anyhow::bail!("minimized set differs from the hidden set");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_parsing() {
        let args = CliArgs::parse_from(["deltamin-bench"]);
        assert!(args.config.is_none());
        assert!(args.strategy.is_none());
        assert!(!args.eager_cancellation);
        assert!(!args.json);
    }

    #[test]
    fn test_cli_args_with_options() {
        let args = CliArgs::parse_from([
            "deltamin-bench",
            "--strategy",
            "combined",
            "-n",
            "4",
            "-j",
            "8",
            "--fixture",
            "random-size",
            "--hidden-size",
            "97",
            "--seed",
            "11",
            "--json-logs",
        ]);

        assert_eq!(args.strategy, Some(Strategy::Combined));
        assert_eq!(args.granularity, Some(4));
        assert_eq!(args.max_concurrency, Some(8));
        assert_eq!(args.fixture, Some(FixtureKind::RandomSize));
        assert_eq!(args.hidden_size, Some(97));
        assert_eq!(args.seed, Some(11));
        assert!(args.json_logs);
    }

    #[test]
    fn test_invalid_strategy_rejected() {
        assert!(CliArgs::try_parse_from(["deltamin-bench", "--strategy", "binary"]).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reference_run() {
        let config = BenchConfig::default();
        let report = run(&config).await.unwrap();

        assert!(report.matches);
        assert_eq!(report.result, fixture::REFERENCE_SET.to_vec());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_random_density_run() {
        let mut config = BenchConfig::default();
        config.fixture.kind = FixtureKind::RandomDensity;
        config.fixture.size = 300;
        config.fixture.density = 0.05;
        config.fixture.seed = Some(21);
        config.search.strategy = Strategy::Combined;

        let report = run(&config).await.unwrap();
        assert!(report.matches);
        assert!(serde_json::to_string(&report).unwrap().contains("\"combined\""));
    }
}
