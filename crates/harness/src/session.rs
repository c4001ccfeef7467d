//! Browser session lifecycle

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::driver::{Driver, DriverLauncher};
use crate::error::{HarnessError, HarnessResult};

static SESSION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Hands out browser sessions from a launcher
#[derive(Clone)]
pub struct SessionManager {
    launcher: Arc<dyn DriverLauncher>,
    launch_timeout: Duration,
}

impl SessionManager {
    pub fn new(launcher: Arc<dyn DriverLauncher>, launch_timeout: Duration) -> Self {
        Self {
            launcher,
            launch_timeout,
        }
    }

    /// Launch a fresh browser session
    pub async fn acquire(&self) -> HarnessResult<Session> {
        let id = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
        debug!("Acquiring browser session #{}", id);

        let driver = tokio::time::timeout(self.launch_timeout, self.launcher.launch())
            .await
            .map_err(|_| {
                HarnessError::Session(format!(
                    "browser launch timed out after {} ms",
                    self.launch_timeout.as_millis()
                ))
            })?
            .map_err(|e| match e {
                HarnessError::Session(_) => e,
                other => HarnessError::Session(other.to_string()),
            })?;

        info!("Browser session #{} created", id);
        Ok(Session {
            id,
            driver,
            released: false,
        })
    }
}

/// One live browser session.
///
/// Call [`Session::release`] when done. A session dropped without release is
/// reported, and the driver's own drop tears the browser down.
pub struct Session {
    id: u64,
    driver: Box<dyn Driver>,
    released: bool,
}

impl Session {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn driver(&mut self) -> &mut dyn Driver {
        self.driver.as_mut()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Close the browser. Idempotent; failures are logged, never returned.
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match self.driver.close().await {
            Ok(()) => info!("Browser session #{} closed", self.id),
            Err(e) => warn!("Failed to close browser session #{}: {}", self.id, e),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.released {
            warn!("Browser session #{} dropped without release", self.id);
        }
    }
}
