//! Browser launch configuration and flag composition.
//!
//! A `LaunchConfig` decides, per audit, whether a fresh browser is launched
//! with composed flags or an already-running one is attached to through a
//! fixed remote debugging port. It is built once at startup from CLI input and
//! held by the runner in a `ConfigCell`; readers always get an owned copy.

use crate::constants::{
    DEFAULT_CHROME_FLAGS, HEADLESS_FLAG_PREFIX, PROFILE_DIRECTORY_FLAG_PREFIX,
    USER_DATA_DIR_FLAG_PREFIX,
};
use crate::error::{AuditError, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// How to obtain a debuggable browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub headless: bool,
    /// Reuse this on-disk profile instead of a throwaway one.
    pub user_data_dir: Option<PathBuf>,
    /// Named sub-profile inside the user data dir.
    pub profile_directory: Option<String>,
    /// Attach to a browser already listening here instead of launching one.
    pub remote_debugging_port: Option<u16>,
    /// Appended after the computed defaults. May override headless mode.
    pub extra_flags: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            headless: true,
            user_data_dir: None,
            profile_directory: None,
            remote_debugging_port: None,
            extra_flags: Vec::new(),
        }
    }
}

/// Partial configuration, merged over the defaults by `LaunchConfig::merged`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSettings {
    pub headless: Option<bool>,
    pub user_data_dir: Option<PathBuf>,
    pub profile_directory: Option<String>,
    pub remote_debugging_port: Option<u16>,
    pub extra_flags: Option<Vec<String>>,
}

impl LaunchConfig {
    /// Merge `settings` over the built-in defaults.
    ///
    /// The extra flag list is replaced wholesale, never appended to.
    pub fn merged(settings: LaunchSettings) -> Self {
        let defaults = Self::default();
        Self {
            headless: settings.headless.unwrap_or(defaults.headless),
            user_data_dir: settings.user_data_dir,
            profile_directory: settings.profile_directory,
            remote_debugging_port: settings.remote_debugging_port,
            extra_flags: settings.extra_flags.unwrap_or(defaults.extra_flags),
        }
    }

    /// True when this config points the browser at a persistent profile, in
    /// which case storage must not be reset between runs.
    pub fn is_profile_config(&self) -> bool {
        if self.user_data_dir.is_some() || self.profile_directory.is_some() {
            return true;
        }

        self.extra_flags.iter().any(|flag| {
            flag.starts_with(USER_DATA_DIR_FLAG_PREFIX)
                || flag.starts_with(PROFILE_DIRECTORY_FLAG_PREFIX)
        })
    }

    /// Compose the ordered, de-duplicated flag list for a launch.
    ///
    /// A headless-prefixed entry in `extra_flags` wins over both the default
    /// `--headless` and `headless: false`.
    pub fn build_flags(&self) -> Vec<String> {
        let is_headless = |flag: &str| flag.starts_with(HEADLESS_FLAG_PREFIX);

        let has_headless_override = self.extra_flags.iter().any(|f| is_headless(f));
        let allow_headless = self.headless || has_headless_override;

        let defaults = DEFAULT_CHROME_FLAGS
            .iter()
            .copied()
            .filter(|flag| !(has_headless_override && is_headless(flag)));

        let mut combined: Vec<String> = defaults
            .filter(|flag| allow_headless || !is_headless(flag))
            .map(str::to_string)
            .collect();

        if let Some(ref profile) = self.profile_directory {
            combined.push(format!("{}={}", PROFILE_DIRECTORY_FLAG_PREFIX, profile));
        }

        combined.extend(
            self.extra_flags
                .iter()
                .filter(|flag| allow_headless || !is_headless(flag))
                .cloned(),
        );

        dedupe(combined)
    }

    /// Options for launching a browser from this config.
    ///
    /// A `--user-data-dir=<path>` extra flag is lifted out of the flag list
    /// into `user_data_dir`, since the launcher always passes its own data
    /// dir and Chrome honours the last one. An explicit `user_data_dir` wins
    /// over the flag.
    pub fn launch_options(&self) -> LaunchOptions {
        let mut user_data_dir = self.user_data_dir.clone();
        let mut flags = Vec::new();

        for flag in self.build_flags() {
            let value = flag
                .strip_prefix(USER_DATA_DIR_FLAG_PREFIX)
                .and_then(|rest| rest.strip_prefix('='));
            match value {
                Some(dir) => {
                    if user_data_dir.is_none() {
                        user_data_dir = Some(PathBuf::from(dir));
                    }
                }
                None => flags.push(flag),
            }
        }

        LaunchOptions {
            flags,
            user_data_dir,
        }
    }

    /// Like `launch_options`, but first creates the user data dir if one is
    /// configured and missing. This is the only filesystem write in the
    /// audit path and must happen before the browser starts.
    pub async fn prepare_launch(&self) -> Result<LaunchOptions> {
        let options = self.launch_options();

        if let Some(ref dir) = options.user_data_dir {
            let exists = tokio::fs::try_exists(dir).await.unwrap_or(false);
            if !exists {
                tracing::info!(path = %dir.display(), "Creating user data dir");
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|source| AuditError::Io {
                        context: "Failed to create user data dir",
                        path: dir.clone(),
                        source,
                    })?;
            }
        }

        Ok(options)
    }
}

/// What a launcher needs to start a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub flags: Vec<String>,
    pub user_data_dir: Option<PathBuf>,
}

fn dedupe(flags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    flags
        .into_iter()
        .filter(|flag| seen.insert(flag.clone()))
        .collect()
}

/// Shared holder for the active launch config.
///
/// Written at startup, read before every audit. Writes while audits are in
/// flight are not supported.
#[derive(Debug, Default)]
pub struct ConfigCell {
    inner: RwLock<LaunchConfig>,
}

impl ConfigCell {
    pub fn new(config: LaunchConfig) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    /// Replace the active config with `settings` merged over the defaults.
    pub async fn set_config(&self, settings: LaunchSettings) {
        *self.inner.write().await = LaunchConfig::merged(settings);
    }

    /// Owned copy of the active config.
    pub async fn config(&self) -> LaunchConfig {
        self.inner.read().await.clone()
    }
}
