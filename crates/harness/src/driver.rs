//! Browser driver abstraction
//!
//! The executor only talks to a browser through [`Driver`]. Elements are
//! addressed with structured [`Locator`]s which the Playwright adapter renders
//! into selector chains and test doubles can match on directly.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::error::HarnessResult;

/// One hop in a locator chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocatorStep {
    /// Plain CSS selector, scoped to the previous hop when there is one
    Css(String),
    /// Elements matching `css` that contain an `inner` element with `text`
    HasText {
        css: String,
        inner: String,
        text: String,
    },
    /// The n-th (zero-based) element of the previous hop
    Nth(usize),
}

/// Structured element address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    steps: Vec<LocatorStep>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            steps: vec![LocatorStep::Css(selector.into())],
        }
    }

    /// Elements matching `css` which contain `inner` with the given text
    pub fn has_text(
        css: impl Into<String>,
        inner: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            steps: vec![LocatorStep::HasText {
                css: css.into(),
                inner: inner.into(),
                text: text.into(),
            }],
        }
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.steps.push(LocatorStep::Nth(index));
        self
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Descend into `selector` within the current match
    pub fn child(&self, selector: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(LocatorStep::Css(selector.into()));
        Self { steps }
    }

    pub fn steps(&self) -> &[LocatorStep] {
        &self.steps
    }
}

impl fmt::Display for Locator {
    /// Playwright selector-chain syntax
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            parts.push(match step {
                LocatorStep::Css(css) => css.clone(),
                LocatorStep::HasText { css, inner, text } => format!(
                    "{}:has({}:has-text(\"{}\"))",
                    css,
                    inner,
                    text.replace('\\', "\\\\").replace('"', "\\\"")
                ),
                LocatorStep::Nth(n) => format!("nth={}", n),
            });
        }
        write!(f, "{}", parts.join(" >> "))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Load,
    DomContentLoaded,
    #[default]
    NetworkIdle,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Load => "load",
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

/// Condition on the page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// Playwright glob such as `**/inventory-item.html`
    Glob(String),
    EndsWith(String),
    Contains(String),
}

impl UrlPattern {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::Glob(glob) => glob_matches(glob, url),
            UrlPattern::EndsWith(suffix) => url.ends_with(suffix.as_str()),
            UrlPattern::Contains(fragment) => url.contains(fragment.as_str()),
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::Glob(glob) => write!(f, "url matching '{}'", glob),
            UrlPattern::EndsWith(suffix) => write!(f, "url ending with '{}'", suffix),
            UrlPattern::Contains(fragment) => write!(f, "url containing '{}'", fragment),
        }
    }
}

/// Playwright-style URL glob: `**` spans path separators, `*` and `?` do
/// not. A pattern that fails to parse matches nothing.
fn glob_matches(pattern: &str, url: &str) -> bool {
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };
    Pattern::new(pattern)
        .map(|p| p.matches_with(url, options))
        .unwrap_or(false)
}

/// Browser automation primitives consumed by the executor.
///
/// Every wait takes an explicit timeout and reports expiry as
/// [`HarnessError::InteractionTimeout`](crate::error::HarnessError). Reads on
/// a locator use its first match; `is_visible` is false for both absent and
/// hidden elements.
#[async_trait]
pub trait Driver: Send {
    async fn goto(&mut self, url: &str, timeout: Duration) -> HarnessResult<()>;

    async fn fill(&mut self, target: &Locator, value: &str, timeout: Duration) -> HarnessResult<()>;

    async fn click(&mut self, target: &Locator, timeout: Duration) -> HarnessResult<()>;

    async fn count(&mut self, target: &Locator) -> HarnessResult<usize>;

    async fn is_visible(&mut self, target: &Locator) -> HarnessResult<bool>;

    /// Text content of the first match, `None` if nothing matches
    async fn text_content(&mut self, target: &Locator) -> HarnessResult<Option<String>>;

    async fn attribute(&mut self, target: &Locator, name: &str) -> HarnessResult<Option<String>>;

    async fn wait_for(
        &mut self,
        target: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> HarnessResult<()>;

    async fn wait_for_url(&mut self, pattern: &UrlPattern, timeout: Duration) -> HarnessResult<()>;

    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration) -> HarnessResult<()>;

    async fn current_url(&mut self) -> HarnessResult<String>;

    async fn screenshot(&mut self, path: &Path) -> HarnessResult<()>;

    /// Close the browser. Called at most once by the session.
    async fn close(&mut self) -> HarnessResult<()>;
}

/// Creates fresh driver instances, one per session
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    async fn launch(&self) -> HarnessResult<Box<dyn Driver>>;
}
