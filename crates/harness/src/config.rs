//! Harness configuration

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};
use crate::model::Credentials;
use crate::playwright::{Browser, PlaywrightConfig};
use crate::retry::RetryPolicy;

/// Top-level harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Application under test
    pub app: AppConfig,

    /// Input and output locations
    pub paths: PathsConfig,

    /// Browser launch settings
    pub browser: BrowserConfig,

    /// Wait budgets
    pub timeouts: TimeoutConfig,

    /// Response-time thresholds
    pub performance: PerformanceConfig,

    /// Retry policies
    pub retry: RetryConfig,

    /// Account used by the product-data scrape and the product search
    pub product_data: ProductDataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Entry point every case navigates to first
    pub base_url: String,

    /// Number of inventory items a logged-in user must see
    pub inventory_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.saucedemo.com/".to_string(),
            inventory_size: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `<suite>_test_cases.json` files
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub results_dir: PathBuf,
    /// CSV written by the product-data suite
    pub export_path: PathBuf,
    pub product_search_config: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("test_data"),
            logs_dir: PathBuf::from("logs"),
            screenshots_dir: PathBuf::from("screenshots"),
            results_dir: PathBuf::from("test-results"),
            export_path: PathBuf::from("products.csv"),
            product_search_config: PathBuf::from("test_data/product_search_config.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub kind: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub node_binary: PathBuf,
    pub node_modules: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            node_modules: None,
        }
    }
}

/// All values in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub launch_ms: u64,
    pub navigation_ms: u64,
    pub element_ms: u64,
    pub load_state_ms: u64,
    /// Pause after actions whose effect renders asynchronously (cart badge)
    pub settle_ms: u64,
    pub completion_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            launch_ms: 30_000,
            navigation_ms: 30_000,
            element_ms: 10_000,
            load_state_ms: 30_000,
            settle_ms: 500,
            completion_ms: 5_000,
        }
    }
}

impl TimeoutConfig {
    pub fn launch(&self) -> Duration {
        Duration::from_millis(self.launch_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    pub fn load_state(&self) -> Duration {
        Duration::from_millis(self.load_state_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn completion(&self) -> Duration {
        Duration::from_millis(self.completion_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub default_threshold_ms: u64,

    /// Per-username overrides, e.g. a deliberately slow account
    pub user_thresholds: BTreeMap<String, u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        let mut user_thresholds = BTreeMap::new();
        user_thresholds.insert("performance_glitch_user".to_string(), 6_000);
        Self {
            default_threshold_ms: 4_000,
            user_thresholds,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Extra attempts after the first one
    pub retries: u32,
    pub delay_ms: u64,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::with_retries(self.retries, Duration::from_millis(self.delay_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Configuration loading and run initialisation
    pub config: RetrySettings,
    /// Whole-suite execution
    pub suite: RetrySettings,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            config: RetrySettings {
                retries: 3,
                delay_ms: 5_000,
            },
            suite: RetrySettings {
                retries: 2,
                delay_ms: 5_000,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDataConfig {
    pub username: String,
    pub password: String,
}

impl Default for ProductDataConfig {
    fn default() -> Self {
        Self {
            username: "standard_user".to_string(),
            password: "secret_sauce".to_string(),
        }
    }
}

impl ProductDataConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> HarnessResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| HarnessError::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> HarnessResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HarnessError::config(format!("cannot serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.app.base_url.trim().is_empty() {
            return Err(HarnessError::config("app.base_url must not be empty"));
        }
        if self.timeouts.element_ms == 0 || self.timeouts.load_state_ms == 0 {
            return Err(HarnessError::config("timeouts must be greater than zero"));
        }
        Ok(())
    }

    /// Response-time threshold for a user when the case sets none
    pub fn threshold_for_user(&self, username: &str) -> u64 {
        self.performance
            .user_thresholds
            .get(username)
            .copied()
            .unwrap_or(self.performance.default_threshold_ms)
    }

    pub fn playwright(&self) -> PlaywrightConfig {
        PlaywrightConfig {
            browser: self.browser.kind,
            headless: self.browser.headless,
            viewport_width: self.browser.viewport_width,
            viewport_height: self.browser.viewport_height,
            node_binary: self.browser.node_binary.clone(),
            node_modules: self.browser.node_modules.clone(),
            launch_timeout: self.timeouts.launch(),
            ..PlaywrightConfig::default()
        }
    }

    pub fn validation_log_path(&self) -> PathBuf {
        self.paths.logs_dir.join("validation_errors.log")
    }
}
