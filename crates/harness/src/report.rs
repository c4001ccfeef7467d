//! Run results

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::artifacts::Artifact;
use crate::error::{HarnessError, HarnessResult};
use crate::executor::CaseReport;

/// Outcome of one suite after all its attempts
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub suite_name: String,
    pub passed: bool,
    pub attempts: u32,
    pub duration_ms: u64,
    /// Cases of the final attempt that reached `Passed`
    pub cases: Vec<CaseReport>,
    pub error: Option<String>,
    pub stack_trace: Option<String>,
}

impl RunResult {
    pub fn passed(suite_name: &str, attempts: u32, duration_ms: u64, cases: Vec<CaseReport>) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            passed: true,
            attempts,
            duration_ms,
            cases,
            error: None,
            stack_trace: None,
        }
    }

    pub fn failed(suite_name: &str, attempts: u32, duration_ms: u64, error: &HarnessError) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            passed: false,
            attempts,
            duration_ms,
            cases: Vec::new(),
            error: Some(error.to_string()),
            stack_trace: Some(error.trace()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub totals: Totals,
    pub results: Vec<RunResult>,
    pub artifacts: Vec<Artifact>,
}

impl RunSummary {
    pub fn new(
        started_at: DateTime<Local>,
        results: Vec<RunResult>,
        artifacts: Vec<Artifact>,
    ) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Local::now(),
            totals: Totals {
                total: results.len(),
                passed,
                failed: results.len() - passed,
            },
            results,
            artifacts,
        }
    }

    pub fn overall_success(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// 0 when every suite passed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.overall_success() {
            0
        } else {
            1
        }
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    /// Plain-text summary block for the log
    pub fn render(&self) -> String {
        let mut out = String::from("=== Test Summary ===\n");
        for result in &self.results {
            let status = if result.passed { "PASSED" } else { "FAILED" };
            out.push_str(&format!(
                "{}: {} ({} attempt{}, {} ms)\n",
                result.suite_name,
                status,
                result.attempts,
                if result.attempts == 1 { "" } else { "s" },
                result.duration_ms
            ));
            if let Some(error) = &result.error {
                out.push_str(&format!("  error: {}\n", error));
            }
            if let Some(trace) = &result.stack_trace {
                out.push_str("  stack trace:\n");
                for line in trace.lines() {
                    out.push_str(&format!("    {}\n", line));
                }
            }
        }
        out.push_str(&format!(
            "{} passed, {} failed, {} total",
            self.totals.passed, self.totals.failed, self.totals.total
        ));
        out
    }

    /// Write `test-results.json` into `dir`
    pub fn write_results(&self, dir: &Path) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
