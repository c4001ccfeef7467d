//! `run` and `search`: execute suites against the browser

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tracing::{error, info};

use sauce_harness::{HarnessConfig, Orchestrator, PlaywrightLauncher, RunLogging, SuiteKind};

use crate::output::{self, OutputFormat};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Suites to run in order: login, product-data, cart, product-search.
    /// Defaults to login, product-data, cart.
    #[arg(value_name = "SUITE")]
    pub suites: Vec<SuiteKind>,

    /// Do not write test-results.json
    #[arg(long)]
    pub no_results: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Product search document (overrides paths.product_search_config)
    #[arg(long)]
    pub product_config: Option<PathBuf>,
}

pub async fn execute(args: RunArgs, config: HarnessConfig, verbose: bool, format: OutputFormat) -> anyhow::Result<i32> {
    let suites = if args.suites.is_empty() {
        SuiteKind::DEFAULT_ORDER.to_vec()
    } else {
        args.suites
    };
    run_suites(config, &suites, verbose, format, !args.no_results).await
}

pub async fn search(args: SearchArgs, mut config: HarnessConfig, verbose: bool, format: OutputFormat) -> anyhow::Result<i32> {
    if let Some(path) = args.product_config {
        config.paths.product_search_config = path;
    }
    run_suites(config, &[SuiteKind::ProductSearch], verbose, format, true).await
}

async fn run_suites(
    config: HarnessConfig,
    suites: &[SuiteKind],
    verbose: bool,
    format: OutputFormat,
    write_results: bool,
) -> anyhow::Result<i32> {
    let logging = RunLogging::init(&config.paths.logs_dir, verbose).context("Failed to set up logging")?;
    info!("Starting test run against {}", config.app.base_url);

    let outcome = run_logged(config, suites, format, write_results).await;
    if let Err(e) = &outcome {
        error!("Run aborted: {:#}", e);
    }
    logging.finish();
    outcome
}

async fn run_logged(
    config: HarnessConfig,
    suites: &[SuiteKind],
    format: OutputFormat,
    write_results: bool,
) -> anyhow::Result<i32> {
    let launcher = PlaywrightLauncher::new(config.playwright());
    launcher
        .check_installed()
        .await
        .context("Browser automation is not available")?;

    let results_dir = config.paths.results_dir.clone();
    let orchestrator = Orchestrator::new(config, Arc::new(launcher));
    orchestrator.initialize().await?;

    let summary = orchestrator.run(suites).await;
    for line in summary.render().lines() {
        info!("{}", line);
    }

    output::print_list(&summary.results, format);
    if write_results {
        summary.write_results(&results_dir)?;
    }

    if summary.overall_success() {
        output::print_success("All tests passed");
    } else {
        output::print_warning(&format!(
            "{} of {} suites failed",
            summary.totals.failed, summary.totals.total
        ));
    }

    Ok(summary.exit_code())
}
