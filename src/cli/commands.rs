//! Argument structures for the `sendguard` subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Arguments for the `status` command.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `issues` command.
#[derive(Debug, Args)]
pub struct IssuesCommand {
    /// Include issues whose value is currently dismissed
    #[arg(short, long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `dismiss` command.
#[derive(Debug, Args)]
pub struct DismissCommand {
    /// The email address to suppress for the next 24 hours
    pub email: String,
}

/// Arguments for the `scan` command.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Text to scan; reads stdin when omitted
    pub text: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration file path
    Path,

    /// Validate a configuration file
    Validate {
        /// Path to the file to validate (defaults to the standard location)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}
