//! Audit engine adapter.
//!
//! The engine is the Lighthouse CLI: it connects to the browser on the given
//! debugging port, audits the page, and prints the result JSON on stdout.

use crate::error::{AuditError, Result};
use crate::options::AuditOptions;
use crate::report::RawAuditResult;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Runs one page audit against an already-debuggable browser.
#[async_trait]
pub trait AuditEngine: Send + Sync {
    /// `Ok(None)` means the engine finished without producing a result.
    async fn run(&self, url: &str, options: &AuditOptions) -> Result<Option<RawAuditResult>>;
}

/// Spawns the `lighthouse` binary per audit.
#[derive(Debug, Clone)]
pub struct LighthouseCli {
    pub binary: String,
}

impl Default for LighthouseCli {
    fn default() -> Self {
        Self {
            binary: "lighthouse".to_string(),
        }
    }
}

impl LighthouseCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Command-line arguments for one run, excluding the binary.
    pub fn args(url: &str, options: &AuditOptions) -> Vec<String> {
        let emulation = &options.screen_emulation;
        let throttling = &options.throttling;

        let mut args = vec![
            url.to_string(),
            format!("--port={}", options.port),
            "--output=json".to_string(),
            "--output-path=stdout".to_string(),
            "--quiet".to_string(),
            "--no-enable-error-reporting".to_string(),
            format!("--form-factor={}", options.form_factor),
            format!("--screenEmulation.mobile={}", emulation.mobile),
            format!("--screenEmulation.width={}", emulation.width),
            format!("--screenEmulation.height={}", emulation.height),
            format!(
                "--screenEmulation.deviceScaleFactor={}",
                emulation.device_scale_factor
            ),
            format!("--screenEmulation.disabled={}", emulation.disabled),
            format!("--throttling.rttMs={}", throttling.rtt_ms),
            format!("--throttling.throughputKbps={}", throttling.throughput_kbps),
            format!(
                "--throttling.cpuSlowdownMultiplier={}",
                throttling.cpu_slowdown_multiplier
            ),
        ];

        if let Some(ref categories) = options.only_categories {
            let joined = categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(",");
            args.push(format!("--only-categories={}", joined));
        }

        if options.disable_storage_reset {
            args.push("--disable-storage-reset".to_string());
        }

        args
    }
}

#[async_trait]
impl AuditEngine for LighthouseCli {
    async fn run(&self, url: &str, options: &AuditOptions) -> Result<Option<RawAuditResult>> {
        let args = Self::args(url, options);
        tracing::debug!(binary = %self.binary, ?args, "Spawning audit engine");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AuditError::Engine(format!("Failed to start {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(AuditError::Engine(format!(
                "{} failed for {}: {}",
                self.binary,
                url,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_output(&output.stdout)
    }
}

/// Parse engine stdout. Blank output is "no result", not an error.
pub fn parse_output(stdout: &[u8]) -> Result<Option<RawAuditResult>> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(stdout)?))
}
