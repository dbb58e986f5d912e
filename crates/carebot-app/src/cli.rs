//! CLI argument definitions for the carebot binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Carebot: a conversational assistant for hospital branches and practitioners.
#[derive(Parser, Debug)]
#[command(name = "carebot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the practitioner roster JSON.
    #[arg(short = 'r', long = "roster")]
    pub roster: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CAREBOT_CONFIG env var > ~/.carebot/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CAREBOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the roster path.
    ///
    /// Priority: --roster flag > config file value, with `~` expanded.
    pub fn resolve_roster_path(&self, config_path: &str) -> PathBuf {
        match self.roster {
            Some(ref p) => p.clone(),
            None => expand_home(config_path),
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn home_dir() -> Option<String> {
    let var = if cfg!(target_os = "windows") {
        "USERPROFILE"
    } else {
        "HOME"
    };
    std::env::var(var).ok()
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => PathBuf::from(home).join(".carebot").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path.starts_with("~\\") {
        let home = home_dir().unwrap_or_else(|| ".".to_string());
        PathBuf::from(home).join(&path[2..])
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let args = CliArgs::parse_from([
            "carebot",
            "--config",
            "/etc/carebot.toml",
            "-r",
            "/srv/roster.json",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/etc/carebot.toml"));
        assert_eq!(
            args.resolve_roster_path("~/.carebot/roster.json"),
            PathBuf::from("/srv/roster.json")
        );
        assert_eq!(args.resolve_log_level("info"), "debug");
    }

    #[test]
    fn test_config_values_used_without_flags() {
        let args = CliArgs::parse_from(["carebot"]);
        assert_eq!(args.resolve_log_level("warn"), "warn");
        assert_eq!(
            args.resolve_roster_path("/data/roster.json"),
            PathBuf::from("/data/roster.json")
        );
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert!(expand_home("~/.carebot/roster.json").ends_with(".carebot/roster.json"));
        assert!(!expand_home("~/.carebot/roster.json").starts_with("~"));
    }
}
