//! Run logging: console plus a per-run log file

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing::subscriber::DefaultGuard;
use tracing::{info, Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::error::{HarnessError, HarnessResult};

/// Console lines as `LEVEL - message`
struct LevelDashMessage;

impl<S, N> FormatEvent<S, N> for LevelDashMessage
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        write!(writer, "{} - ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Console-only logging for the current thread until the guard drops.
///
/// Covers start-up work that happens before the logs directory is known,
/// such as configuration loading. Drop the guard before [`RunLogging::init`].
pub fn startup_console<W>(verbose: bool, writer: W) -> DefaultGuard
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::registry().with(level_filter(verbose)).with(
        tracing_subscriber::fmt::layer()
            .event_format(LevelDashMessage)
            .with_writer(writer),
    );
    tracing::subscriber::set_default(subscriber)
}

/// Installed subscriber for one run. Call [`RunLogging::finish`] at the end.
pub struct RunLogging {
    log_path: PathBuf,
    file: File,
}

impl RunLogging {
    /// Install the global subscriber. Writes `logs_dir/test_run_<ts>.log`.
    pub fn init(logs_dir: &Path, verbose: bool) -> HarnessResult<Self> {
        std::fs::create_dir_all(logs_dir)?;
        let log_path = logs_dir.join(format!(
            "test_run_{}.log",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        let file = File::create(&log_path)?;
        let writer = file.try_clone()?;

        tracing_subscriber::registry()
            .with(level_filter(verbose))
            .with(tracing_subscriber::fmt::layer().event_format(LevelDashMessage))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(writer)),
            )
            .try_init()
            .map_err(|e| HarnessError::config(format!("cannot install logger: {}", e)))?;

        info!("Logging to {}", log_path.display());
        Ok(Self { log_path, file })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Flush the run log to disk. Dropping the handle does the same.
    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for RunLogging {
    fn drop(&mut self) {
        info!("Run log complete: {}", self.log_path.display());
        if let Err(e) = self.file.sync_all() {
            eprintln!("failed to flush {}: {}", self.log_path.display(), e);
        }
    }
}
