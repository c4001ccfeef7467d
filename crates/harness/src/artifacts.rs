//! Failure evidence: screenshots, the validation-error log and the product
//! export. Every artifact is written once and recorded in an append-only
//! ledger for the run; nothing here deletes or rewrites earlier output.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::driver::Driver;
use crate::error::HarnessResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Screenshot,
    LogEntry,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// File path for screenshots and exports, the log line for log entries
    pub path_or_text: String,
    pub timestamp: DateTime<Local>,
    pub test_case_name: String,
}

/// One row of the product export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
}

/// Process-wide artifact sink for one run
#[derive(Debug)]
pub struct ArtifactStore {
    screenshots_dir: PathBuf,
    validation_log: PathBuf,
    records: Mutex<Vec<Artifact>>,
}

impl ArtifactStore {
    pub fn new(screenshots_dir: impl Into<PathBuf>, validation_log: impl Into<PathBuf>) -> Self {
        Self {
            screenshots_dir: screenshots_dir.into(),
            validation_log: validation_log.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn screenshots_dir(&self) -> &Path {
        &self.screenshots_dir
    }

    pub fn validation_log(&self) -> &Path {
        &self.validation_log
    }

    /// Create output directories and start a fresh validation-error log
    pub fn begin_run(&self) -> HarnessResult<()> {
        std::fs::create_dir_all(&self.screenshots_dir)?;
        if let Some(parent) = self.validation_log.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(
            &self.validation_log,
            format!("=== Test Run Started at {} ===\n\n", Local::now().format("%Y-%m-%d %H:%M:%S%.6f")),
        )?;
        Ok(())
    }

    /// Append `[timestamp] Test Case: <name> - Error: <message>`
    pub fn log_validation_error(&self, case_name: &str, message: &str) -> HarnessResult<()> {
        let now = Local::now();
        let entry = format!(
            "[{}] Test Case: {} - Error: {}",
            now.format("%Y-%m-%d %H:%M:%S"),
            case_name,
            message
        );

        if let Some(parent) = self.validation_log.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.validation_log)?;
        writeln!(file, "{}", entry)?;

        self.record(Artifact {
            kind: ArtifactKind::LogEntry,
            path_or_text: entry,
            timestamp: now,
            test_case_name: case_name.to_string(),
        });
        Ok(())
    }

    /// Screenshot named `failure_<case>_<timestamp>.png`
    pub async fn capture_failure(&self, driver: &mut dyn Driver, case_name: &str) -> HarnessResult<PathBuf> {
        info!("Capturing failure screenshot for test case: {}", case_name);
        self.capture(driver, &format!("failure_{}", sanitize(case_name)), case_name)
            .await
    }

    /// Screenshot named `<label>_<timestamp>.png`, used for success evidence
    pub async fn capture_named(&self, driver: &mut dyn Driver, label: &str) -> HarnessResult<PathBuf> {
        self.capture(driver, &sanitize(label), label).await
    }

    async fn capture(&self, driver: &mut dyn Driver, stem: &str, case_name: &str) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(&self.screenshots_dir)?;
        let now = Local::now();
        let path = unique_path(
            &self.screenshots_dir,
            &format!("{}_{}", stem, now.format("%Y%m%d_%H%M%S")),
            "png",
        );
        driver.screenshot(&path).await?;
        info!("Screenshot captured: {}", path.display());

        self.record(Artifact {
            kind: ArtifactKind::Screenshot,
            path_or_text: path.to_string_lossy().to_string(),
            timestamp: now,
            test_case_name: case_name.to_string(),
        });
        Ok(path)
    }

    /// Best-effort failure evidence: screenshot plus validation log entry.
    /// Problems capturing evidence are logged and never replace the failure.
    pub async fn record_failure(&self, driver: &mut dyn Driver, case_name: &str, message: &str) {
        if let Err(e) = self.capture_failure(driver, case_name).await {
            error!("Screenshot capture failed for {}: {}", case_name, e);
        }
        if let Err(e) = self.log_validation_error(case_name, message) {
            error!("Could not write validation log entry for {}: {}", case_name, e);
        }
    }

    /// Write the product export; the header row is present even with no rows
    pub fn write_products(&self, path: &Path, products: &[ProductRecord]) -> HarnessResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(["name", "description", "price", "image_url"])?;
        for product in products {
            writer.serialize(product)?;
        }
        writer.flush()?;

        info!("Successfully saved {} products to {}", products.len(), path.display());
        self.record(Artifact {
            kind: ArtifactKind::Export,
            path_or_text: path.to_string_lossy().to_string(),
            timestamp: Local::now(),
            test_case_name: "product_data".to_string(),
        });
        Ok(())
    }

    fn record(&self, artifact: Artifact) {
        self.records.lock().push(artifact);
    }

    /// Snapshot of everything recorded so far, in order
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.records.lock().clone()
    }
}

/// Keep file names portable: anything outside `[A-Za-z0-9_-]` becomes `_`
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// First of `stem.ext`, `stem_1.ext`, `stem_2.ext`, ... that does not exist yet
fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.{}", stem, ext));
    if !candidate.exists() {
        return candidate;
    }
    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{}_{}.{}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
