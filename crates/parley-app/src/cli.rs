//! CLI argument definitions for the Parley console assistant.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Parley - a small voice assistant that answers from a fixed phrase table.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Answer a single question and exit, without speech.
    #[arg(short = 'a', long = "ask", value_name = "QUESTION")]
    pub ask: Option<String>,

    /// Never speak answers aloud.
    #[arg(long = "mute")]
    pub mute: bool,

    /// Disable speech input.
    #[arg(long = "no-voice")]
    pub no_voice: bool,

    /// Print the dialogue history as JSON on exit.
    #[arg(long = "dump-history")]
    pub dump_history: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PARLEY_CONFIG env var > platform default (~/.parley/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PARLEY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value. `RUST_LOG` is honored
    /// by the subscriber before either.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Whether speech input may be used, given the config switch.
    pub fn voice_input_enabled(&self, config_enabled: bool) -> bool {
        config_enabled && !self.no_voice
    }

    /// Whether answers may be spoken, given the config switch.
    pub fn voice_output_enabled(&self, config_enabled: bool) -> bool {
        config_enabled && !self.mute
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("parley").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_args() {
        let args = parse(&[]);
        assert!(args.config.is_none());
        assert!(args.ask.is_none());
        assert!(!args.mute);
        assert!(!args.no_voice);
        assert!(!args.dump_history);
    }

    #[test]
    fn test_all_flags() {
        let args = parse(&[
            "--config",
            "/tmp/parley.toml",
            "--log-level",
            "debug",
            "--ask",
            "what is your name",
            "--mute",
            "--no-voice",
            "--dump-history",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/parley.toml"));
        assert_eq!(args.ask.as_deref(), Some("what is your name"));
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert!(!args.voice_input_enabled(true));
        assert!(!args.voice_output_enabled(true));
        assert!(args.dump_history);
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let args = parse(&[]);
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }

    #[test]
    fn test_config_switches_win_over_missing_flags() {
        let args = parse(&[]);
        assert!(args.voice_input_enabled(true));
        assert!(!args.voice_input_enabled(false));
        assert!(!args.voice_output_enabled(false));
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let result = CliArgs::try_parse_from(["parley", "--port", "3030"]);
        assert!(result.is_err());
    }
}
