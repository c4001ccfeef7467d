//! Playwright browser automation
//!
//! A browser session is a long-lived Node.js process running a small bridge
//! script. Commands go to its stdin as one JSON object per line and every
//! command gets exactly one JSON reply on stdout, correlated by `id`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::driver::{Driver, DriverLauncher, LoadState, Locator, UrlPattern, WaitState};
use crate::error::{HarnessError, HarnessResult};

const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {
  const kind = process.env.HARNESS_BROWSER || 'chromium';
  const browser = await playwright[kind].launch({ headless: process.env.HARNESS_HEADLESS !== '0' });
  const context = await browser.newContext({
    viewport: {
      width: parseInt(process.env.HARNESS_VIEWPORT_WIDTH || '1280', 10),
      height: parseInt(process.env.HARNESS_VIEWPORT_HEIGHT || '720', 10),
    },
  });
  const page = await context.newPage();
  const first = (c) => page.locator(c.selector).first();

  const ops = {
    goto: async (c) => { await page.goto(c.url, { timeout: c.timeout_ms }); return null; },
    fill: async (c) => { await first(c).fill(c.value, { timeout: c.timeout_ms }); return null; },
    click: async (c) => { await first(c).click({ timeout: c.timeout_ms }); return null; },
    count: async (c) => page.locator(c.selector).count(),
    visible: async (c) => first(c).isVisible(),
    text: async (c) => ((await page.locator(c.selector).count()) > 0 ? first(c).textContent() : null),
    attribute: async (c) => ((await page.locator(c.selector).count()) > 0 ? first(c).getAttribute(c.name) : null),
    wait_for: async (c) => { await first(c).waitFor({ state: c.state, timeout: c.timeout_ms }); return null; },
    wait_for_url: async (c) => {
      const matcher = c.kind === 'glob' ? c.value
        : c.kind === 'suffix' ? (u) => u.toString().endsWith(c.value)
        : (u) => u.toString().includes(c.value);
      await page.waitForURL(matcher, { timeout: c.timeout_ms });
      return null;
    },
    load_state: async (c) => { await page.waitForLoadState(c.state, { timeout: c.timeout_ms }); return null; },
    url: async () => page.url(),
    screenshot: async (c) => { await page.screenshot({ path: c.path, fullPage: true }); return null; },
    close: async () => { await browser.close(); return null; },
  };

  reply({ id: null, ok: true, ready: true });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    let cmd;
    try {
      cmd = JSON.parse(line);
    } catch (e) {
      reply({ id: null, ok: false, error: 'malformed command: ' + e.message });
      continue;
    }
    const op = ops[cmd.op];
    if (!op) {
      reply({ id: cmd.id, ok: false, error: 'unknown op: ' + cmd.op });
      continue;
    }
    try {
      const value = await op(cmd);
      reply({ id: cmd.id, ok: true, value: value === undefined ? null : value });
    } catch (e) {
      reply({ id: cmd.id, ok: false, error: e.message, timeout: e.name === 'TimeoutError' });
    }
    if (cmd.op === 'close') break;
  }
  await browser.close().catch(() => {});
  process.exit(0);
})().catch((e) => {
  reply({ id: null, ok: false, fatal: true, error: e.message });
  process.exit(1);
});
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for launching Playwright sessions
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Node.js executable
    pub node_binary: PathBuf,
    /// Directory holding `node_modules/playwright`; inherited `NODE_PATH` when unset
    pub node_modules: Option<PathBuf>,
    /// How long the browser may take to come up
    pub launch_timeout: Duration,
    /// Slack on top of a command's own timeout before the bridge is presumed hung
    pub reply_grace: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            node_modules: None,
            launch_timeout: Duration::from_secs(30),
            reply_grace: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: Option<u64>,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
    #[serde(default)]
    ready: bool,
}

/// Launches one bridge process per session
#[derive(Debug, Clone)]
pub struct PlaywrightLauncher {
    config: PlaywrightConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    /// Check that node can resolve the playwright package
    pub async fn check_installed(&self) -> HarnessResult<()> {
        let mut cmd = Command::new(&self.config.node_binary);
        cmd.args(["-e", "require.resolve('playwright')"])
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.config.node_modules {
            cmd.env("NODE_PATH", dir);
        }

        match cmd.status().await {
            Ok(status) if status.success() => Ok(()),
            Ok(_) => Err(HarnessError::Session(
                "Playwright not found. Install with: npm install playwright && npx playwright install"
                    .to_string(),
            )),
            Err(e) => Err(HarnessError::Session(format!(
                "Failed to run {}: {}",
                self.config.node_binary.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl DriverLauncher for PlaywrightLauncher {
    async fn launch(&self) -> HarnessResult<Box<dyn Driver>> {
        let driver = PlaywrightDriver::launch(&self.config).await?;
        Ok(Box::new(driver))
    }
}

/// Driver backed by a Playwright bridge process
pub struct PlaywrightDriver {
    child: Child,
    stdin: ChildStdin,
    replies: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    reply_grace: Duration,
    // Holds the bridge script on disk for the lifetime of the process
    _script_dir: tempfile::TempDir,
}

impl PlaywrightDriver {
    pub async fn launch(config: &PlaywrightConfig) -> HarnessResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        debug!("Starting Playwright bridge: {}", script_path.display());

        let mut cmd = Command::new(&config.node_binary);
        cmd.arg(&script_path)
            .env("HARNESS_BROWSER", config.browser.as_str())
            .env("HARNESS_HEADLESS", if config.headless { "1" } else { "0" })
            .env("HARNESS_VIEWPORT_WIDTH", config.viewport_width.to_string())
            .env("HARNESS_VIEWPORT_HEIGHT", config.viewport_height.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &config.node_modules {
            cmd.env("NODE_PATH", dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            HarnessError::Session(format!(
                "Failed to spawn {}: {}",
                config.node_binary.display(),
                e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HarnessError::Session("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HarnessError::Session("bridge stdout unavailable".to_string()))?;

        let mut driver = Self {
            child,
            stdin,
            replies: BufReader::new(stdout).lines(),
            next_id: 1,
            reply_grace: config.reply_grace,
            _script_dir: script_dir,
        };

        let ready = driver.read_reply(config.launch_timeout).await.map_err(|e| {
            HarnessError::Session(format!("browser did not start: {}", e))
        })?;
        if !ready.ready {
            return Err(HarnessError::Session(format!(
                "browser failed to start: {}",
                ready.error.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        info!(
            "{} session started (pid: {:?})",
            config.browser.as_str(),
            driver.child.id()
        );
        Ok(driver)
    }

    async fn read_reply(&mut self, wait: Duration) -> HarnessResult<BridgeReply> {
        let line = tokio::time::timeout(wait, self.replies.next_line())
            .await
            .map_err(|_| HarnessError::Session("bridge stopped responding".to_string()))??;
        let line = line.ok_or_else(|| HarnessError::Session("bridge process exited".to_string()))?;
        Ok(serde_json::from_str(&line)?)
    }

    /// Send one command and wait for its reply
    async fn send(&mut self, what: &str, timeout: Duration, mut command: Value) -> HarnessResult<Value> {
        let id = self.next_id;
        self.next_id += 1;
        let timeout_ms = timeout.as_millis() as u64;

        if let Some(obj) = command.as_object_mut() {
            obj.insert("id".to_string(), json!(id));
            obj.insert("timeout_ms".to_string(), json!(timeout_ms));
        }
        let mut line = serde_json::to_string(&command)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let deadline = timeout + self.reply_grace;
        loop {
            let reply = self.read_reply(deadline).await?;
            if reply.id != Some(id) {
                if let Some(error) = reply.error {
                    warn!("Bridge reported: {}", error);
                }
                continue;
            }
            if reply.ok {
                return Ok(reply.value);
            }
            if reply.timeout {
                return Err(HarnessError::timeout(what, timeout_ms));
            }
            return Err(HarnessError::Driver(format!(
                "{}: {}",
                what,
                reply.error.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
    }

    /// Ask the process to exit, escalating to SIGTERM and then SIGKILL
    async fn terminate(&mut self) {
        let graceful = tokio::time::timeout(Duration::from_secs(2), self.child.wait()).await;
        if graceful.is_ok() {
            return;
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && tokio::time::timeout(Duration::from_millis(500), self.child.wait())
                        .await
                        .is_ok()
                {
                    return;
                }
            }
        }

        let _ = self.child.kill().await;
    }
}

fn url_payload(pattern: &UrlPattern) -> Value {
    match pattern {
        UrlPattern::Glob(glob) => json!({ "kind": "glob", "value": glob }),
        UrlPattern::EndsWith(suffix) => json!({ "kind": "suffix", "value": suffix }),
        UrlPattern::Contains(fragment) => json!({ "kind": "contains", "value": fragment }),
    }
}

// Reads are answered from the live DOM, so they get a short fixed budget.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
impl Driver for PlaywrightDriver {
    async fn goto(&mut self, url: &str, timeout: Duration) -> HarnessResult<()> {
        self.send(&format!("navigation to {}", url), timeout, json!({ "op": "goto", "url": url }))
            .await?;
        Ok(())
    }

    async fn fill(&mut self, target: &Locator, value: &str, timeout: Duration) -> HarnessResult<()> {
        let selector = target.to_string();
        self.send(
            &selector,
            timeout,
            json!({ "op": "fill", "selector": selector, "value": value }),
        )
        .await?;
        Ok(())
    }

    async fn click(&mut self, target: &Locator, timeout: Duration) -> HarnessResult<()> {
        let selector = target.to_string();
        self.send(&selector, timeout, json!({ "op": "click", "selector": selector }))
            .await?;
        Ok(())
    }

    async fn count(&mut self, target: &Locator) -> HarnessResult<usize> {
        let selector = target.to_string();
        let value = self
            .send(&selector, READ_TIMEOUT, json!({ "op": "count", "selector": selector }))
            .await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| HarnessError::Driver(format!("count returned {}", value)))
    }

    async fn is_visible(&mut self, target: &Locator) -> HarnessResult<bool> {
        let selector = target.to_string();
        let value = self
            .send(&selector, READ_TIMEOUT, json!({ "op": "visible", "selector": selector }))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn text_content(&mut self, target: &Locator) -> HarnessResult<Option<String>> {
        let selector = target.to_string();
        let value = self
            .send(&selector, READ_TIMEOUT, json!({ "op": "text", "selector": selector }))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn attribute(&mut self, target: &Locator, name: &str) -> HarnessResult<Option<String>> {
        let selector = target.to_string();
        let value = self
            .send(
                &selector,
                READ_TIMEOUT,
                json!({ "op": "attribute", "selector": selector, "name": name }),
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn wait_for(
        &mut self,
        target: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> HarnessResult<()> {
        let selector = target.to_string();
        self.send(
            &format!("{} to be {}", selector, state.as_str()),
            timeout,
            json!({ "op": "wait_for", "selector": selector, "state": state.as_str() }),
        )
        .await?;
        Ok(())
    }

    async fn wait_for_url(&mut self, pattern: &UrlPattern, timeout: Duration) -> HarnessResult<()> {
        let mut command = url_payload(pattern);
        if let Some(obj) = command.as_object_mut() {
            obj.insert("op".to_string(), json!("wait_for_url"));
        }
        self.send(&pattern.to_string(), timeout, command).await?;
        Ok(())
    }

    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration) -> HarnessResult<()> {
        self.send(
            &format!("load state '{}'", state.as_str()),
            timeout,
            json!({ "op": "load_state", "state": state.as_str() }),
        )
        .await?;
        Ok(())
    }

    async fn current_url(&mut self) -> HarnessResult<String> {
        let value = self.send("page url", READ_TIMEOUT, json!({ "op": "url" })).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| HarnessError::Driver(format!("url returned {}", value)))
    }

    async fn screenshot(&mut self, path: &Path) -> HarnessResult<()> {
        let path_str = path.to_string_lossy().to_string();
        self.send(
            &format!("screenshot {}", path_str),
            Duration::from_secs(30),
            json!({ "op": "screenshot", "path": path_str }),
        )
        .await?;
        Ok(())
    }

    async fn close(&mut self) -> HarnessResult<()> {
        let result = self
            .send("browser close", Duration::from_secs(10), json!({ "op": "close" }))
            .await;
        self.terminate().await;
        result.map(|_| ())
    }
}
