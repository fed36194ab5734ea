//! Browser process lifecycle.
//!
//! A launcher starts one browser per ephemeral audit and reports the remote
//! debugging port the audit engine should drive. `OwnedBrowser` ties the
//! process lifetime to the audit: it is killed explicitly on every exit path,
//! and a drop without an explicit release (the audit future was cancelled)
//! still schedules the kill.
//!
//! Without a configured user data dir every launch gets its own temporary
//! profile, removed once the browser is gone.

use crate::error::{AuditError, Result};
use crate::launch_config::LaunchOptions;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// Starts browser processes.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn LaunchedBrowser>>;
}

/// A running browser owned by exactly one audit.
#[async_trait]
pub trait LaunchedBrowser: Send {
    /// Remote debugging port, if the browser reported one.
    fn port(&self) -> Option<u16>;

    /// Terminate the process.
    async fn kill(&mut self) -> Result<()>;
}

/// Launches Chrome/Chromium through the DevTools protocol client.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    /// Custom Chrome/Edge binary path. Auto-detected when unset.
    pub executable: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn LaunchedBrowser>> {
        // Headless mode comes from the composed flags, so the builder must not
        // add its own.
        let mut builder = BrowserConfig::builder().with_head();

        if let Some(ref path) = self.executable {
            builder = builder.chrome_executable(path);
        }

        let (user_data_dir, scratch_profile) = profile_dir(options)?;
        builder = builder
            .user_data_dir(&user_data_dir)
            .args(options.flags.iter().cloned());

        let config = builder.build().map_err(AuditError::Launch)?;

        tracing::debug!(
            flags = ?options.flags,
            user_data_dir = %user_data_dir.display(),
            "Launching browser"
        );

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AuditError::Launch(format!("Failed to launch browser: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let port = debugging_port(browser.websocket_address());
        tracing::info!(port = ?port, "Browser launched");

        Ok(Box::new(ChromeProcess {
            browser,
            handler_task,
            port,
            _scratch_profile: scratch_profile,
        }))
    }
}

/// The configured user data dir, or a fresh temporary one owned by the launch.
fn profile_dir(options: &LaunchOptions) -> Result<(PathBuf, Option<TempDir>)> {
    if let Some(ref dir) = options.user_data_dir {
        return Ok((dir.clone(), None));
    }

    let scratch = tempfile::Builder::new()
        .prefix("lighthouse-profile-")
        .tempdir()
        .map_err(|source| AuditError::Io {
            context: "Failed to create temporary browser profile",
            path: std::env::temp_dir(),
            source,
        })?;
    Ok((scratch.path().to_path_buf(), Some(scratch)))
}

struct ChromeProcess {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    port: Option<u16>,
    // Dropped after `browser`, so the directory outlives the process.
    _scratch_profile: Option<TempDir>,
}

#[async_trait]
impl LaunchedBrowser for ChromeProcess {
    fn port(&self) -> Option<u16> {
        self.port
    }

    async fn kill(&mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            tracing::debug!(error = %e, "Graceful browser close failed, killing process");
        }

        let outcome = match self.browser.kill().await {
            Some(Err(e)) => Err(AuditError::Launch(format!("Failed to kill browser: {}", e))),
            _ => Ok(()),
        };

        self.handler_task.abort();
        outcome
    }
}

/// Port of a DevTools websocket address such as
/// `ws://127.0.0.1:9222/devtools/browser/<id>`.
pub fn debugging_port(ws_address: &str) -> Option<u16> {
    let authority = ws_address
        .split_once("://")
        .map_or(ws_address, |(_, rest)| rest)
        .split('/')
        .next()?;

    let (_, port) = authority.rsplit_once(':')?;
    port.parse().ok().filter(|p| *p > 0)
}

/// A launched browser that must be killed when its audit ends.
pub struct OwnedBrowser {
    inner: Option<Box<dyn LaunchedBrowser>>,
}

impl OwnedBrowser {
    pub fn new(browser: Box<dyn LaunchedBrowser>) -> Self {
        Self {
            inner: Some(browser),
        }
    }

    pub fn port(&self) -> Option<u16> {
        self.inner.as_ref().and_then(|b| b.port())
    }

    /// Kill the browser. Failures are logged, never returned, so cleanup
    /// cannot mask the audit outcome.
    pub async fn release(mut self) {
        if let Some(mut browser) = self.inner.take() {
            if let Err(e) = browser.kill().await {
                tracing::warn!(error = %e, "Failed to terminate browser after audit");
            }
        }
    }
}

impl Drop for OwnedBrowser {
    fn drop(&mut self) {
        let Some(mut browser) = self.inner.take() else {
            return;
        };

        tracing::warn!("Audit cancelled before browser release, terminating browser");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = browser.kill().await {
                        tracing::warn!(error = %e, "Failed to terminate abandoned browser");
                    }
                });
            }
            Err(_) => {
                tracing::warn!("No runtime available to terminate abandoned browser");
            }
        }
    }
}
