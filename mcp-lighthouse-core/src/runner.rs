//! One audit cycle: obtain a browser, run the engine, release the browser.

use crate::browser::{BrowserLauncher, OwnedBrowser};
use crate::engine::AuditEngine;
use crate::error::{AuditError, Result};
use crate::gate::AuditGate;
use crate::launch_config::{ConfigCell, LaunchConfig, LaunchSettings};
use crate::normalize::{filter_audits_by_category, AuditSummary, NormalizedAuditResult};
use crate::options::{AuditOptions, Category, Device};
use crate::report::RawAuditResult;
use std::sync::Arc;

/// Raw result of a single-category audit plus the audits that category
/// references.
#[derive(Debug, Clone)]
pub struct DetailedAuditResults {
    pub raw: RawAuditResult,
    pub audits: Vec<AuditSummary>,
}

/// Runs audits against either a freshly launched browser per call or a
/// shared, already-running browser on a fixed debugging port.
///
/// Fresh browsers are exclusive to their call, so those audits run
/// concurrently. Calls sharing the fixed port go through the `AuditGate` one
/// at a time.
pub struct AuditRunner {
    config: ConfigCell,
    launcher: Arc<dyn BrowserLauncher>,
    engine: Arc<dyn AuditEngine>,
    gate: AuditGate,
}

impl AuditRunner {
    pub fn new(
        config: LaunchConfig,
        launcher: Arc<dyn BrowserLauncher>,
        engine: Arc<dyn AuditEngine>,
    ) -> Self {
        Self {
            config: ConfigCell::new(config),
            launcher,
            engine,
            gate: AuditGate::new(),
        }
    }

    /// Replace the launch config. Only call this while no audit is running.
    pub async fn set_config(&self, settings: LaunchSettings) {
        self.config.set_config(settings).await;
    }

    /// Copy of the active launch config.
    pub async fn config(&self) -> LaunchConfig {
        self.config.config().await
    }

    /// Run the engine once and return its unprocessed result.
    pub async fn run_raw_audit(
        &self,
        url: &str,
        categories: Option<&[Category]>,
        device: Device,
        throttling: bool,
    ) -> Result<RawAuditResult> {
        let config = self.config.config().await;

        tracing::info!(
            url,
            %device,
            throttling,
            attached = config.remote_debugging_port.is_some(),
            "Starting audit"
        );

        match config.remote_debugging_port {
            Some(port) => {
                self.gate
                    .run(self.audit_on_port(&config, port, url, categories, device, throttling))
                    .await
            }
            None => {
                let options = config.prepare_launch().await?;
                let browser = OwnedBrowser::new(self.launcher.launch(&options).await?);

                let outcome = match browser.port() {
                    Some(port) => {
                        self.audit_on_port(&config, port, url, categories, device, throttling)
                            .await
                    }
                    None => Err(AuditError::Configuration(
                        "launched browser did not report a remote debugging port".to_string(),
                    )),
                };

                browser.release().await;
                outcome
            }
        }
    }

    async fn audit_on_port(
        &self,
        config: &LaunchConfig,
        port: u16,
        url: &str,
        categories: Option<&[Category]>,
        device: Device,
        throttling: bool,
    ) -> Result<RawAuditResult> {
        if port == 0 {
            return Err(AuditError::Configuration(
                "no usable remote debugging port".to_string(),
            ));
        }

        let options = AuditOptions::new(
            port,
            device,
            categories,
            throttling,
            config.is_profile_config(),
        );

        let result = self
            .engine
            .run(url, &options)
            .await?
            .ok_or_else(|| AuditError::Engine("audit engine returned no result".to_string()))?;

        tracing::info!(url, %device, final_url = %result.final_displayed_url, "Audit finished");
        Ok(result)
    }

    /// Run an audit and normalize the result.
    pub async fn run_formatted_audit(
        &self,
        url: &str,
        categories: Option<&[Category]>,
        device: Device,
        throttling: bool,
    ) -> Result<NormalizedAuditResult> {
        let raw = self.run_raw_audit(url, categories, device, throttling).await?;
        Ok(NormalizedAuditResult::from_raw(&raw, device))
    }

    /// Single-category audit with the per-audit breakdown for that category.
    pub async fn detailed_audit_results(
        &self,
        url: &str,
        category: Category,
        device: Device,
    ) -> Result<DetailedAuditResults> {
        let raw = self.run_raw_audit(url, Some(&[category]), device, false).await?;
        let audits = filter_audits_by_category(&raw, category.as_str());
        Ok(DetailedAuditResults { raw, audits })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process fakes for the launcher and the engine.

    use super::*;
    use crate::browser::LaunchedBrowser;
    use crate::launch_config::LaunchOptions;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    pub struct FakeLauncher {
        pub launches: AtomicUsize,
        pub kills: Arc<AtomicUsize>,
        pub port: Option<u16>,
        pub fail: bool,
        pub last_options: Mutex<Option<LaunchOptions>>,
    }

    impl FakeLauncher {
        pub fn with_port(port: u16) -> Self {
            Self {
                port: Some(port),
                ..Default::default()
            }
        }
    }

    struct FakeBrowser {
        port: Option<u16>,
        kills: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LaunchedBrowser for FakeBrowser {
        fn port(&self) -> Option<u16> {
            self.port
        }

        async fn kill(&mut self) -> Result<()> {
            self.kills.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl BrowserLauncher for FakeLauncher {
        async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn LaunchedBrowser>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            *self.last_options.lock().unwrap() = Some(options.clone());
            if self.fail {
                return Err(AuditError::Launch("chrome not found".into()));
            }
            Ok(Box::new(FakeBrowser {
                port: self.port,
                kills: self.kills.clone(),
            }))
        }
    }

    pub enum Reply {
        Result(serde_json::Value),
        Empty,
        Fail(&'static str),
    }

    /// Replies in order; repeats the last reply when the queue runs dry.
    pub struct FakeEngine {
        replies: Mutex<VecDeque<Reply>>,
        pub calls: Mutex<Vec<(String, AuditOptions)>>,
        pub delay: Duration,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl FakeEngine {
        pub fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn returning(value: serde_json::Value) -> Self {
            Self::new(vec![Reply::Result(value)])
        }

        pub fn calls(&self) -> Vec<(String, AuditOptions)> {
            self.calls.lock().unwrap().clone()
        }

        fn next_reply(&self) -> Result<Option<RawAuditResult>> {
            let mut replies = self.replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().map(|r| match r {
                    Reply::Result(v) => Reply::Result(v.clone()),
                    Reply::Empty => Reply::Empty,
                    Reply::Fail(m) => Reply::Fail(*m),
                })
            };

            match reply {
                Some(Reply::Result(value)) => Ok(Some(serde_json::from_value(value)?)),
                Some(Reply::Empty) | None => Ok(None),
                Some(Reply::Fail(message)) => Err(AuditError::Engine(message.to_string())),
            }
        }
    }

    #[async_trait]
    impl AuditEngine for FakeEngine {
        async fn run(&self, url: &str, options: &AuditOptions) -> Result<Option<RawAuditResult>> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), options.clone()));

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.next_reply()
        }
    }

    pub fn runner(
        config: LaunchConfig,
        launcher: Arc<FakeLauncher>,
        engine: Arc<FakeEngine>,
    ) -> AuditRunner {
        AuditRunner::new(config, launcher, engine)
    }

    /// Runner over a fixed port so no launcher is involved.
    pub fn attached_runner(engine: Arc<FakeEngine>) -> AuditRunner {
        let config = LaunchConfig {
            remote_debugging_port: Some(9222),
            ..Default::default()
        };
        AuditRunner::new(config, Arc::new(FakeLauncher::default()), engine)
    }
}
