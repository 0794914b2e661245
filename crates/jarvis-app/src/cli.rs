//! Command-line arguments for the `jarvis` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Jarvis: drafts tracker issues from a chat conversation.
///
/// Runs an offline console session: every line read from stdin is a message
/// in one chat thread, and replies are printed to stdout.
#[derive(Parser, Debug)]
#[command(name = "jarvis", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Channel id used for the console thread.
    #[arg(long = "channel", default_value = "console")]
    pub channel: String,

    /// Thread id used for the console thread.
    #[arg(long = "thread", default_value = "1700000000.000100")]
    pub thread: String,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > JARVIS_CONFIG env var > ~/.jarvis/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("JARVIS_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Log filter directive when RUST_LOG is absent.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if self.verbose {
            "debug".to_string()
        } else if config_level.trim().is_empty() {
            "info".to_string()
        } else {
            config_level.trim().to_string()
        }
    }
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".jarvis").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".jarvis").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["jarvis"]);
        assert!(args.config.is_none());
        assert!(!args.verbose);
        assert_eq!(args.channel, "console");
        assert_eq!(args.thread, "1700000000.000100");
    }

    #[test]
    fn test_explicit_config_wins() {
        let args = CliArgs::parse_from(["jarvis", "--config", "/tmp/jarvis.toml", "-v"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/jarvis.toml"));
        assert!(args.verbose);
    }

    #[test]
    fn test_log_level_resolution() {
        let quiet = CliArgs::parse_from(["jarvis"]);
        assert_eq!(quiet.resolve_log_level("warn"), "warn");
        assert_eq!(quiet.resolve_log_level("  "), "info");
        let verbose = CliArgs::parse_from(["jarvis", "--verbose"]);
        assert_eq!(verbose.resolve_log_level("warn"), "debug");
    }
}
