use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use techlag::config::AnalysisConfig;
use techlag::lag::aggregator::ScopeAggregator;
use techlag::lag::calculator::LagCalculator;
use techlag::lag::hotpath::HotPathAnalyzer;
use techlag::logging::init_logging;
use techlag::sbom::types::Manifest;
use techlag::version::registries::deps_dev::DepsDevRegistry;

#[derive(Parser)]
#[command(name = "techlag")]
#[command(version, about = "Measure the technical lag of the dependencies in a CycloneDX SBOM")]
struct Cli {
    /// CycloneDX JSON SBOM to analyze
    input: PathBuf,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (defaults to $XDG_CONFIG_HOME/techlag/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of concurrent registry workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Fraction of a scope's lag the hot path has to cover
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Registry base URL
    #[arg(long)]
    registry_url: Option<String>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs as JSON lines to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli.log_level, cli.log_file.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let started = Instant::now();

    let mut config = AnalysisConfig::load(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.max_workers = workers;
    }
    if let Some(threshold) = cli.threshold {
        config.hotpath_threshold = threshold;
    }
    if let Some(url) = cli.registry_url {
        config.registry.base_url = url;
    }
    let config = config.normalized();

    let manifest = Manifest::from_path(&cli.input)
        .with_context(|| format!("failed to load SBOM {}", cli.input.display()))?;
    if let Some(stats) = manifest.component_stats() {
        info!(
            "Loaded {} components ({} with package URL, {} without) by scope: {:?}",
            stats.total, stats.with_purl, stats.without_purl, stats.by_scope
        );
    }

    let fetch_timeout = Duration::from_millis(config.fetch_timeout_ms);
    let registry = Arc::new(DepsDevRegistry::with_timeout(
        &config.registry.base_url,
        fetch_timeout,
    ));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with the components processed so far");
            interrupt.cancel();
        }
    });

    let calculation = LagCalculator::new(registry)
        .with_max_workers(config.max_workers)
        .with_fetch_timeout(fetch_timeout)
        .calculate(&manifest, &cancel)
        .await
        .context("technical lag calculation failed")?;

    let mut report = ScopeAggregator::new(&manifest).aggregate(&calculation.lags);
    report.hot_paths = HotPathAnalyzer::new(config.hotpath_threshold).analyze_report(&report);

    info!("Technical lag:\n{}", report);

    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    match &cli.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?,
        None => println!("{}", json),
    }

    info!(
        "Analysis finished in {:.2?} ({} components, {} failed)",
        started.elapsed(),
        calculation.lags.len() + calculation.failures.len(),
        calculation.failures.len()
    );

    Ok(())
}
