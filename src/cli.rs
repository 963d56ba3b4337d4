//! Command-line interface for deja
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Repeat-question companion: listen, verify, remember
#[derive(Parser, Debug)]
#[command(name = "deja", version, about = "Repeat-question companion: listen, verify, remember")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verify/transcribe server URL override
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Audio input device (e.g., hw:0)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Listen for speech and flag repeated questions (default)
    Listen,

    /// Record a voice sample and register it with the server
    Enroll {
        /// Seconds of audio to record
        #[arg(long, short = 's', value_name = "SECONDS", default_value_t = crate::defaults::ENROLL_SECS)]
        seconds: u64,
    },

    /// List available audio input devices
    Devices,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_command() {
        let cli = Cli::try_parse_from(["deja"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert!(cli.server.is_none());
        assert!(cli.device.is_none());
        assert!(!cli.quiet);
    }

    #[test]
    fn parse_listen() {
        let cli = Cli::try_parse_from(["deja", "listen"]).unwrap();
        match cli.command {
            Some(Commands::Listen) => {}
            _ => panic!("Expected Listen command"),
        }
    }

    #[test]
    fn parse_enroll_default_seconds() {
        let cli = Cli::try_parse_from(["deja", "enroll"]).unwrap();
        match cli.command {
            Some(Commands::Enroll { seconds }) => assert_eq!(seconds, 5),
            _ => panic!("Expected Enroll command"),
        }
    }

    #[test]
    fn parse_enroll_with_seconds() {
        let cli = Cli::try_parse_from(["deja", "enroll", "--seconds", "10"]).unwrap();
        match cli.command {
            Some(Commands::Enroll { seconds }) => assert_eq!(seconds, 10),
            _ => panic!("Expected Enroll command"),
        }
    }

    #[test]
    fn parse_devices() {
        let cli = Cli::try_parse_from(["deja", "devices"]).unwrap();
        match cli.command {
            Some(Commands::Devices) => {}
            _ => panic!("Expected Devices command"),
        }
    }

    #[test]
    fn parse_global_config() {
        let cli = Cli::try_parse_from(["deja", "--config", "/path/to/config.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_global_server_after_command() {
        // Global options should work before or after the command
        let cli = Cli::try_parse_from(["deja", "listen", "--server", "http://host:5001"]).unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://host:5001"));
    }

    #[test]
    fn parse_quiet_short_flag() {
        let cli = Cli::try_parse_from(["deja", "-q"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn parse_device_option() {
        let cli = Cli::try_parse_from(["deja", "--device", "hw:0"]).unwrap();
        assert_eq!(cli.device.as_deref(), Some("hw:0"));
    }

    #[test]
    fn invalid_command_returns_error() {
        let result = Cli::try_parse_from(["deja", "invalid"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn help_flag() {
        // Clap returns an error for --help but with DisplayHelp kind
        let result = Cli::try_parse_from(["deja", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn version_flag() {
        let result = Cli::try_parse_from(["deja", "--version"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
