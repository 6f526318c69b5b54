//! Command-line interface for sendguard.
//!
//! The `sendguard` binary inspects and maintains the local detection log:
//! it never runs the live monitor (that is embedded in the host
//! integration), but shares its store document and detector.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, DismissCommand, IssuesCommand, ScanCommand, StatusCommand};

/// sendguard - pre-submission detector for sensitive identifiers
///
/// Inspect the durable detection log, dismiss findings for 24 hours, and
/// scan ad-hoc text with the built-in email grammar.
#[derive(Debug, Parser)]
#[command(name = "sendguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show detection and dismissal counts
    Status(StatusCommand),

    /// List detected email addresses
    Issues(IssuesCommand),

    /// Dismiss a detected email address for 24 hours
    Dismiss(DismissCommand),

    /// Scan text for email addresses
    Scan(ScanCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "sendguard");
    }

    #[test]
    fn test_verbosity_mapping() {
        let cli = Cli::try_parse_from(["sendguard", "-q", "status"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Quiet);

        let cli = Cli::try_parse_from(["sendguard", "status"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Normal);

        let cli = Cli::try_parse_from(["sendguard", "-v", "status"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Verbose);

        let cli = Cli::try_parse_from(["sendguard", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_status() {
        let cli = Cli::try_parse_from(["sendguard", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Status(StatusCommand { json: true })));
    }

    #[test]
    fn test_parse_issues() {
        let cli = Cli::try_parse_from(["sendguard", "issues", "--all"]).unwrap();
        match cli.command {
            Command::Issues(cmd) => {
                assert!(cmd.all);
                assert!(!cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_dismiss() {
        let cli = Cli::try_parse_from(["sendguard", "dismiss", "a@b.com"]).unwrap();
        match cli.command {
            Command::Dismiss(cmd) => assert_eq!(cmd.email, "a@b.com"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_scan_with_text() {
        let cli = Cli::try_parse_from(["sendguard", "scan", "mail a@b.com"]).unwrap();
        match cli.command {
            Command::Scan(cmd) => assert_eq!(cmd.text.as_deref(), Some("mail a@b.com")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::try_parse_from(["sendguard", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }

    #[test]
    fn test_parse_with_custom_config() {
        let cli = Cli::try_parse_from(["sendguard", "-c", "/tmp/cfg.toml", "status"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/cfg.toml")));
    }
}
