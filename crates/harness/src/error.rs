//! Error types for the acceptance harness

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timeout waiting for {what} after {timeout_ms} ms")]
    InteractionTimeout { what: String, timeout_ms: u64 },

    #[error("Price mismatch for {item}: expected ${expected}, got ${actual}")]
    PriceMismatch {
        item: String,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("Description mismatch.\nExpected: {expected}\nGot: {actual}")]
    DescriptionMismatch { expected: String, actual: String },

    #[error("Expected error indicator was not shown{}", expected_suffix(.expected))]
    ExpectedErrorNotShown { expected: Option<String> },

    #[error("Response time {measured_ms} ms exceeded threshold of {threshold_ms} ms")]
    PerformanceThresholdExceeded { measured_ms: u64, threshold_ms: u64 },

    #[error("Assertion failed: {0}")]
    AssertionFailure(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Test case '{case}' failed at step '{step}': {source}")]
    CaseFailed {
        case: String,
        step: String,
        #[source]
        source: Box<HarnessError>,
    },

    #[error("Suite '{suite}' failed: {source}")]
    SuiteFailed {
        suite: String,
        #[source]
        source: Box<HarnessError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl HarnessError {
    pub fn config(msg: impl Into<String>) -> Self {
        HarnessError::Configuration(msg.into())
    }

    pub fn assertion(msg: impl Into<String>) -> Self {
        HarnessError::AssertionFailure(msg.into())
    }

    pub fn timeout(what: impl Into<String>, timeout_ms: u64) -> Self {
        HarnessError::InteractionTimeout {
            what: what.into(),
            timeout_ms,
        }
    }

    /// Innermost error, skipping the case/suite annotation wrappers
    pub fn root(&self) -> &HarnessError {
        match self {
            HarnessError::CaseFailed { source, .. } | HarnessError::SuiteFailed { source, .. } => {
                source.root()
            }
            other => other,
        }
    }

    /// Whether this error came from a wait that never completed
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), HarnessError::InteractionTimeout { .. })
    }

    /// Whether the underlying cause is an expected-vs-actual mismatch
    pub fn is_assertion(&self) -> bool {
        matches!(
            self.root(),
            HarnessError::PriceMismatch { .. }
                | HarnessError::DescriptionMismatch { .. }
                | HarnessError::ExpectedErrorNotShown { .. }
                | HarnessError::PerformanceThresholdExceeded { .. }
                | HarnessError::AssertionFailure(_)
        )
    }

    /// Render the error followed by its source chain, one cause per line.
    pub fn trace(&self) -> String {
        use std::error::Error as _;

        let mut out = self.to_string();
        let mut current: Option<&(dyn std::error::Error + 'static)> = self.source();
        let mut depth = 0;
        while let Some(cause) = current {
            out.push_str(&format!("\n  {}: {}", depth, cause));
            depth += 1;
            current = cause.source();
        }
        out
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

fn expected_suffix(expected: &Option<String>) -> String {
    match expected {
        Some(message) => format!(" (expected '{}')", message),
        None => String::new(),
    }
}
