//! Suite definition loading

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{HarnessError, HarnessResult};
use crate::model::{
    AdditionalValidations, CartItem, CheckoutInfo, Credentials, ExpectedResult,
    ProductExpectation, ProductSearchConfig, TestCase, TestSuite,
};

const SUITE_FILE_SUFFIX: &str = "_test_cases";
const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

#[derive(Debug, Deserialize)]
struct SuiteDocument {
    test_cases: Vec<RawTestCase>,
}

/// On-disk case shape. Credentials may be nested or given as top-level
/// `username`/`password`.
#[derive(Debug, Deserialize)]
struct RawTestCase {
    name: String,
    #[serde(default)]
    credentials: Option<Credentials>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    items: Vec<CartItem>,
    expected_result: ExpectedResult,
    #[serde(default)]
    expected_error_message: Option<String>,
    #[serde(default)]
    expected_url_fragment: Option<String>,
    #[serde(default)]
    max_response_time_ms: Option<u64>,
    #[serde(default)]
    additional_validations: Option<AdditionalValidations>,
    #[serde(default)]
    checkout_info: Option<CheckoutInfo>,
}

impl RawTestCase {
    fn into_case(self) -> HarnessResult<TestCase> {
        let credentials = match (self.credentials, self.username, self.password) {
            (Some(nested), _, _) => nested,
            (None, Some(username), Some(password)) => Credentials { username, password },
            _ => {
                return Err(HarnessError::config(format!(
                    "test case '{}' has no credentials",
                    self.name
                )))
            }
        };

        Ok(TestCase {
            name: self.name,
            credentials,
            items: self.items,
            expected_result: self.expected_result,
            expected_error_message: self.expected_error_message,
            expected_url_fragment: self.expected_url_fragment,
            max_response_time_ms: self.max_response_time_ms,
            additional_validations: self.additional_validations,
            checkout_info: self.checkout_info,
        })
    }
}

/// Reads `<data_dir>/<suite>_test_cases.{json,yaml,yml}`
#[derive(Debug, Clone)]
pub struct SuiteLoader {
    data_dir: PathBuf,
}

impl SuiteLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// First existing definition file for `suite_id`
    pub fn locate(&self, suite_id: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| {
                self.data_dir
                    .join(format!("{}{}.{}", suite_id, SUITE_FILE_SUFFIX, ext))
            })
            .find(|path| path.is_file())
    }

    /// Load and validate a whole suite. Any bad case rejects the suite.
    pub fn load(&self, suite_id: &str) -> HarnessResult<TestSuite> {
        let path = self.locate(suite_id).ok_or_else(|| {
            HarnessError::config(format!(
                "no test cases for suite '{}' in {}",
                suite_id,
                self.data_dir.display()
            ))
        })?;
        debug!("Loading suite '{}' from {}", suite_id, path.display());

        let document: SuiteDocument = parse_file(&path)?;
        let cases = document
            .test_cases
            .into_iter()
            .map(RawTestCase::into_case)
            .collect::<HarnessResult<Vec<_>>>()
            .map_err(|e| HarnessError::config(format!("{}: {}", path.display(), e)))?;

        let suite = TestSuite::new(suite_id, cases)?;
        info!("Loaded {} test case(s) for suite '{}'", suite.len(), suite_id);
        Ok(suite)
    }

    /// Suite ids with a definition file in the data directory, sorted
    pub fn discover(&self) -> Vec<String> {
        let mut ids: Vec<String> = walkdir::WalkDir::new(&self.data_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| EXTENSIONS.contains(&ext))
                    .unwrap_or(false)
            })
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| stem.strip_suffix(SUITE_FILE_SUFFIX))
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
            })
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Parse the product-search document through the validated builders
    pub fn load_product_search(&self, path: &Path) -> HarnessResult<ProductExpectation> {
        if !path.is_file() {
            return Err(HarnessError::config(format!(
                "product search configuration not found: {}",
                path.display()
            )));
        }
        let document: ProductSearchConfig = parse_file(path)?;
        Ok(document.product_search)
    }
}

/// JSON or YAML by extension; every failure is a configuration error
fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> HarnessResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| HarnessError::config(format!("{}: {}", path.display(), e)))?;
    let yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if yaml {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| HarnessError::config(format!("{}: {}", path.display(), e)))
}
