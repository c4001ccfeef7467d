//! Sauce Harness CLI - Main Entry Point
//!
//! Exit status: 0 when every suite passed, 1 when any suite failed, 2 when
//! the run could not start (configuration, logging, browser setup).

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use sauce_harness::config::RetryConfig;
use sauce_harness::{load_config_with_retry, logging};

mod commands;
mod output;

use commands::{run, validate};

const FATAL_EXIT: i32 = 2;

/// Sauce Harness - acceptance suites for the demo storefront
#[derive(Parser)]
#[command(name = "sauce-harness")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Harness configuration file (TOML); defaults apply when it is absent
    #[arg(short, long, default_value = "harness.toml", env = "SAUCE_HARNESS_CONFIG", global = true)]
    config: PathBuf,

    /// Application entry point
    #[arg(long, env = "SAUCE_HARNESS_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Directory holding the suite definitions
    #[arg(long, env = "SAUCE_HARNESS_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run suites (the default)
    Run(run::RunArgs),

    /// Run the product search workflow only
    Search(run::SearchArgs),

    /// Check configuration and suite definitions without a browser
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            FATAL_EXIT
        }
    };
    std::process::exit(code);
}

async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let policy = RetryConfig::default().config.policy();
    let mut config = {
        // the run log needs paths.logs_dir, so retries report to stderr only
        let _console = logging::startup_console(cli.verbose, std::io::stderr);
        load_config_with_retry(&cli.config, &policy)
            .await
            .with_context(|| format!("Cannot load {}", cli.config.display()))?
    };

    if let Some(base_url) = cli.base_url {
        config.app.base_url = base_url;
    }
    if let Some(data_dir) = cli.data_dir {
        config.paths.data_dir = data_dir;
    }
    if cli.headed {
        config.browser.headless = false;
    }
    config.validate()?;

    match cli.command.unwrap_or_else(|| Commands::Run(run::RunArgs::default())) {
        Commands::Run(args) => run::execute(args, config, cli.verbose, cli.format).await,
        Commands::Search(args) => run::search(args, config, cli.verbose, cli.format).await,
        Commands::Validate => validate::execute(&config, cli.format),
    }
}
