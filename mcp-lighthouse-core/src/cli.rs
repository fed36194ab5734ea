//! Command-line launch options.

use crate::launch_config::LaunchSettings;
use clap::Args;
use std::path::{Path, PathBuf};

/// Browser launch options shared by every subcommand that audits.
#[derive(Args, Debug, Clone, Default)]
pub struct LaunchArgs {
    /// Run the browser headless (the default)
    #[arg(long)]
    pub headless: bool,

    /// Run the browser with a visible window; wins over --headless
    #[arg(long)]
    pub no_headless: bool,

    /// Persistent browser profile root
    #[arg(long)]
    pub user_data_dir: Option<PathBuf>,

    /// Profile directory name inside --user-data-dir
    #[arg(long)]
    pub profile_directory: Option<String>,

    /// Full path to a profile; sets both --user-data-dir and --profile-directory
    #[arg(long)]
    pub profile_path: Option<PathBuf>,

    /// Attach to a browser already listening on this debugging port
    #[arg(long)]
    pub chrome_port: Option<String>,

    /// Same as --chrome-port; wins when both are given
    #[arg(long)]
    pub remote_debugging_port: Option<String>,

    /// Extra browser flag, repeatable (e.g. --chrome-flag --disable-gpu)
    #[arg(long = "chrome-flag", allow_hyphen_values = true)]
    pub chrome_flags: Vec<String>,
}

/// A positive port number, or `None` for anything else.
pub fn parse_port(value: Option<&str>) -> Option<u16> {
    value?.trim().parse::<u16>().ok().filter(|p| *p > 0)
}

impl LaunchArgs {
    pub fn into_settings(self) -> LaunchSettings {
        let headless = if self.no_headless {
            Some(false)
        } else if self.headless {
            Some(true)
        } else {
            None
        };

        let mut user_data_dir = self.user_data_dir;
        let mut profile_directory = self.profile_directory;

        if let Some(ref path) = self.profile_path {
            // A bare name lives in the current directory.
            let parent = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            user_data_dir = Some(parent.to_path_buf());
            profile_directory = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }

        let remote_debugging_port = parse_port(self.remote_debugging_port.as_deref())
            .or_else(|| parse_port(self.chrome_port.as_deref()));

        LaunchSettings {
            headless,
            user_data_dir,
            profile_directory,
            remote_debugging_port,
            extra_flags: (!self.chrome_flags.is_empty()).then_some(self.chrome_flags),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        launch: LaunchArgs,
    }

    fn settings(args: &[&str]) -> LaunchSettings {
        let argv = std::iter::once("lighthouse-server").chain(args.iter().copied());
        TestCli::parse_from(argv).launch.into_settings()
    }

    #[test]
    fn test_profile_and_headless_settings() {
        let s = settings(&[
            "--user-data-dir",
            "/tmp/chrome-profile",
            "--profile-directory=Custom Profile",
            "--chrome-flag",
            "--disable-gpu",
            "--no-headless",
        ]);

        assert_eq!(s.user_data_dir, Some(PathBuf::from("/tmp/chrome-profile")));
        assert_eq!(s.profile_directory.as_deref(), Some("Custom Profile"));
        assert_eq!(s.extra_flags, Some(vec!["--disable-gpu".to_string()]));
        assert_eq!(s.headless, Some(false));
    }

    #[test]
    fn test_chrome_flag_equals_syntax_and_repeats() {
        let s = settings(&["--chrome-flag=--disable-web-security", "--chrome-flag", "--mute-audio"]);
        assert_eq!(
            s.extra_flags,
            Some(vec!["--disable-web-security".to_string(), "--mute-audio".to_string()])
        );
    }

    #[test]
    fn test_remote_debugging_port_wins() {
        let s = settings(&["--chrome-port", "9222", "--remote-debugging-port=9223"]);
        assert_eq!(s.remote_debugging_port, Some(9223));

        let s = settings(&["--chrome-port", "9222"]);
        assert_eq!(s.remote_debugging_port, Some(9222));
    }

    #[test]
    fn test_invalid_ports_are_ignored() {
        let s = settings(&["--chrome-port", "abc", "--remote-debugging-port", "0"]);
        assert_eq!(s.remote_debugging_port, None);

        let s = settings(&["--chrome-port", "9222", "--remote-debugging-port=-5"]);
        assert_eq!(s.remote_debugging_port, Some(9222));

        assert_eq!(parse_port(Some("70000")), None);
        assert_eq!(parse_port(None), None);
    }

    #[test]
    fn test_profile_path_splits() {
        let path = Path::new("tmp").join("chrome-profile").join("Custom Profile");
        let s = settings(&["--profile-path", path.to_str().unwrap()]);

        assert_eq!(s.user_data_dir, Some(Path::new("tmp").join("chrome-profile")));
        assert_eq!(s.profile_directory.as_deref(), Some("Custom Profile"));

        let s = settings(&["--profile-path", "MyProfile"]);
        assert_eq!(s.user_data_dir, Some(PathBuf::from(".")));
        assert_eq!(s.profile_directory.as_deref(), Some("MyProfile"));
    }

    #[test]
    fn test_profile_path_overrides_explicit_values() {
        let s = settings(&[
            "--user-data-dir",
            "/a",
            "--profile-directory",
            "B",
            "--profile-path",
            "/c/D",
        ]);
        assert_eq!(s.user_data_dir, Some(PathBuf::from("/c")));
        assert_eq!(s.profile_directory.as_deref(), Some("D"));
    }

    #[test]
    fn test_defaults_are_unset() {
        let s = settings(&[]);
        assert_eq!(s, LaunchSettings::default());
    }
}
