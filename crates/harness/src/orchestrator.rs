//! Suite orchestration
//!
//! Suites run one after another. Each attempt of a suite gets a fresh browser
//! session, and a suite that exhausts its retries is recorded as failed
//! without stopping the suites after it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::artifacts::ArtifactStore;
use crate::config::HarnessConfig;
use crate::driver::{Driver, DriverLauncher};
use crate::error::{HarnessError, HarnessResult};
use crate::executor::{CaseFailure, CaseReport, InteractionExecutor};
use crate::loader::SuiteLoader;
use crate::model::{Credentials, ProductExpectation, TestSuite};
use crate::report::{RunResult, RunSummary};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::session::SessionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuiteKind {
    Login,
    ProductData,
    Cart,
    ProductSearch,
}

impl SuiteKind {
    /// Suites run when none are named
    pub const DEFAULT_ORDER: [SuiteKind; 3] = [SuiteKind::Login, SuiteKind::ProductData, SuiteKind::Cart];

    pub const ALL: [SuiteKind; 4] = [
        SuiteKind::Login,
        SuiteKind::ProductData,
        SuiteKind::Cart,
        SuiteKind::ProductSearch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SuiteKind::Login => "login",
            SuiteKind::ProductData => "product-data",
            SuiteKind::Cart => "cart",
            SuiteKind::ProductSearch => "product-search",
        }
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SuiteKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> HarnessResult<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        SuiteKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| HarnessError::config(format!("unknown suite '{}'", s)))
    }
}

/// Load configuration, retrying every failure. Exhaustion is a
/// configuration error.
pub async fn load_config_with_retry(path: &Path, policy: &RetryPolicy) -> HarnessResult<HarnessConfig> {
    let outcome = run_with_retry(policy, "Configuration loading", |_| async move {
        HarnessConfig::load(path)
    })
    .await;
    let attempts = outcome.attempts;
    outcome.into_result().map_err(|e| match e {
        HarnessError::Configuration(_) => e,
        other => HarnessError::config(format!(
            "failed to load {} after {} attempt(s): {}",
            path.display(),
            attempts,
            other
        )),
    })
}

/// Work loaded for one suite attempt before a browser is launched
enum SuitePlan {
    Login(TestSuite),
    Cart(TestSuite),
    ProductData(Credentials),
    ProductSearch(Credentials, ProductExpectation),
}

pub struct Orchestrator {
    config: HarnessConfig,
    sessions: SessionManager,
    artifacts: ArtifactStore,
    loader: SuiteLoader,
}

impl Orchestrator {
    pub fn new(config: HarnessConfig, launcher: Arc<dyn DriverLauncher>) -> Self {
        let sessions = SessionManager::new(launcher, config.timeouts.launch());
        let artifacts = ArtifactStore::new(
            config.paths.screenshots_dir.clone(),
            config.validation_log_path(),
        );
        let loader = SuiteLoader::new(config.paths.data_dir.clone());
        Self {
            config,
            sessions,
            artifacts,
            loader,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn loader(&self) -> &SuiteLoader {
        &self.loader
    }

    /// Create output directories and start the validation log
    pub async fn initialize(&self) -> HarnessResult<()> {
        let policy = self.config.retry.config.policy();
        run_with_retry(&policy, "Run initialisation", |_| async {
            self.artifacts.begin_run()
        })
        .await
        .into_result()
        .map_err(|e| HarnessError::config(format!("run initialisation failed: {}", e)))?;
        info!("Validation log started at {}", self.artifacts.validation_log().display());
        Ok(())
    }

    /// Run the suites in order and summarise
    pub async fn run(&self, suites: &[SuiteKind]) -> RunSummary {
        let started_at = Local::now();
        let mut results = Vec::with_capacity(suites.len());

        for &kind in suites {
            info!("Running {} tests...", kind);
            results.push(self.run_suite(kind).await);
        }

        let summary = RunSummary::new(started_at, results, self.artifacts.artifacts());
        if summary.overall_success() {
            info!("All tests passed");
        } else {
            for failure in summary.failures() {
                error!(
                    "{} tests failed: {}",
                    failure.suite_name,
                    failure.error.as_deref().unwrap_or("unknown error")
                );
                if let Some(trace) = &failure.stack_trace {
                    error!("Stack trace: {}", trace);
                }
            }
        }
        summary
    }

    /// Run one suite under the suite retry policy
    pub async fn run_suite(&self, kind: SuiteKind) -> RunResult {
        let start = Instant::now();
        let policy = self.config.retry.suite.policy();

        let outcome = run_with_retry(&policy, kind.name(), |attempt| async move {
            info!("Starting {} suite, attempt {}/{}", kind, attempt, policy.max_attempts());
            self.attempt_suite(kind).await
        })
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome.result {
            Ok(cases) => {
                info!("{} tests passed", kind);
                RunResult::passed(kind.name(), outcome.attempts, duration_ms, cases)
            }
            Err(e) => {
                let err = HarnessError::SuiteFailed {
                    suite: kind.name().to_string(),
                    source: Box::new(e),
                };
                error!("{} after {} attempt(s)", err, outcome.attempts);
                RunResult::failed(kind.name(), outcome.attempts, duration_ms, &err)
            }
        }
    }

    async fn attempt_suite(&self, kind: SuiteKind) -> HarnessResult<Vec<CaseReport>> {
        let plan = self.plan(kind)?;

        let mut session = self.sessions.acquire().await?;
        let result = self.execute(plan, session.driver()).await;
        session.release().await;
        result
    }

    fn plan(&self, kind: SuiteKind) -> HarnessResult<SuitePlan> {
        let plan = match kind {
            SuiteKind::Login => SuitePlan::Login(self.loader.load("login")?),
            SuiteKind::Cart => SuitePlan::Cart(self.loader.load("cart")?),
            SuiteKind::ProductData => SuitePlan::ProductData(self.config.product_data.credentials()),
            SuiteKind::ProductSearch => {
                let product = self
                    .loader
                    .load_product_search(&self.config.paths.product_search_config)?;
                SuitePlan::ProductSearch(self.config.product_data.credentials(), product)
            }
        };
        Ok(plan)
    }

    async fn execute(&self, plan: SuitePlan, driver: &mut dyn Driver) -> HarnessResult<Vec<CaseReport>> {
        let executor = InteractionExecutor::new(&self.config, &self.artifacts);

        match plan {
            SuitePlan::Login(suite) => {
                if suite.is_empty() {
                    warn!("Suite '{}' has no test cases", suite.name());
                }
                let mut reports = Vec::with_capacity(suite.len());
                for case in suite.cases() {
                    let result = executor.run_login_case(driver, case).await;
                    reports.push(self.contain(driver, result).await?);
                }
                Ok(reports)
            }
            SuitePlan::Cart(suite) => {
                if suite.is_empty() {
                    warn!("Suite '{}' has no test cases", suite.name());
                }
                let mut reports = Vec::with_capacity(suite.len());
                for case in suite.cases() {
                    let result = executor.run_cart_case(driver, case).await;
                    reports.push(self.contain(driver, result).await?);
                }
                Ok(reports)
            }
            SuitePlan::ProductData(credentials) => {
                let result = executor.run_product_scrape(driver, &credentials).await;
                let (report, products) = match result {
                    Ok(scraped) => scraped,
                    Err(failure) => return Err(self.record(driver, failure).await),
                };
                self.artifacts
                    .write_products(&self.config.paths.export_path, &products)?;
                Ok(vec![report])
            }
            SuitePlan::ProductSearch(credentials, product) => {
                let result = executor
                    .run_product_search(driver, &credentials, &product)
                    .await;
                let report = self.contain(driver, result).await?;
                if let Err(e) = self.artifacts.capture_named(driver, "success").await {
                    warn!("Could not capture success screenshot: {}", e);
                }
                Ok(vec![report])
            }
        }
    }

    /// Suite boundary for a single case: failures leave evidence behind and
    /// come back annotated with the case and step.
    async fn contain(
        &self,
        driver: &mut dyn Driver,
        result: Result<CaseReport, CaseFailure>,
    ) -> HarnessResult<CaseReport> {
        match result {
            Ok(report) => Ok(report),
            Err(failure) => Err(self.record(driver, failure).await),
        }
    }

    async fn record(&self, driver: &mut dyn Driver, failure: CaseFailure) -> HarnessError {
        self.artifacts
            .record_failure(driver, &failure.case, &failure.error.to_string())
            .await;
        failure.into_error()
    }
}
