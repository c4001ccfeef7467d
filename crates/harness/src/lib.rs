//! Sauce Harness
//!
//! Test-execution engine for browser-driven acceptance suites against a demo
//! storefront:
//! - loads declarative suites (JSON or YAML) into validated cases
//! - drives a real browser through a Playwright bridge process
//! - checks prices exactly, texts after normalisation and response times
//!   against per-user thresholds
//! - retries whole suites with a fresh browser session per attempt
//! - leaves screenshots, a validation-error log and a product export behind
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                               │
//! │    ├── SuiteLoader::load(id) -> TestSuite                   │
//! │    ├── run_with_retry(policy, suite attempt)                │
//! │    │     ├── SessionManager::acquire() -> Session           │
//! │    │     ├── InteractionExecutor::run_*_case(driver, case)  │
//! │    │     │     └── assertions::*                            │
//! │    │     ├── ArtifactStore::record_failure(..)              │
//! │    │     └── Session::release()                             │
//! │    └── RunSummary (exit code, test-results.json)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Driver (trait)  ── PlaywrightDriver (node bridge, JSON)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod artifacts;
pub mod assertions;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod loader;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod playwright;
pub mod report;
pub mod retry;
pub mod session;

pub use artifacts::{Artifact, ArtifactKind, ArtifactStore, ProductRecord};
pub use config::HarnessConfig;
pub use driver::{Driver, DriverLauncher, LoadState, Locator, UrlPattern, WaitState};
pub use error::{HarnessError, HarnessResult};
pub use executor::{CaseFailure, CaseReport, CaseState, InteractionExecutor};
pub use loader::SuiteLoader;
pub use logging::RunLogging;
pub use model::{
    AdditionalValidations, CartItem, CheckoutInfo, Credentials, ExpectedResult, ProductExpectation,
    TestCase, TestSuite, ValidationRules,
};
pub use orchestrator::{load_config_with_retry, Orchestrator, SuiteKind};
pub use playwright::{Browser, PlaywrightConfig, PlaywrightLauncher};
pub use report::{RunResult, RunSummary};
pub use retry::{run_with_retry, RetryOutcome, RetryPolicy};
pub use session::{Session, SessionManager};
