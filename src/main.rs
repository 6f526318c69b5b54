//! `sendguard` - CLI for the pre-submission email detector.
//!
//! Inspects and maintains the local detection log shared with the live
//! monitor integration.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use sendguard::cli::{Cli, Command, ConfigCommand, IssuesCommand, ScanCommand, StatusCommand};
use sendguard::detect::EmailDetector;
use sendguard::gate::NotificationGate;
use sendguard::store::{DismissalStore, FileStore};
use sendguard::{init_logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Status(cmd) => handle_status(&config, &cmd).await,
        Command::Issues(cmd) => handle_issues(&config, &cmd).await,
        Command::Dismiss(cmd) => handle_dismiss(&config, &cmd.email).await,
        Command::Scan(cmd) => handle_scan(&cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_gate(config: &Config) -> anyhow::Result<NotificationGate> {
    let backend = FileStore::open(config.store_path()).context("opening store document")?;
    let store = DismissalStore::new(Arc::new(backend));
    Ok(NotificationGate::new(store))
}

async fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let gate = open_gate(config)?;
    let summary = gate.summary().await?;

    if cmd.json {
        let status = serde_json::json!({
            "total_detected": summary.total_detected,
            "currently_dismissed": summary.currently_dismissed,
            "active": summary.active_issues.len(),
            "store_path": config.store_path(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("sendguard status");
        println!("----------------");
        println!("Total detected:      {}", summary.total_detected);
        println!("Currently dismissed: {}", summary.currently_dismissed);
        println!("Active issues:       {}", summary.active_issues.len());
        println!("Store:               {}", config.store_path().display());
    }
    Ok(())
}

async fn handle_issues(config: &Config, cmd: &IssuesCommand) -> anyhow::Result<()> {
    let gate = open_gate(config)?;
    let summary = gate.summary().await?;

    let issues = if cmd.all {
        &summary.all_issues
    } else {
        &summary.active_issues
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(issues)?);
        return Ok(());
    }

    if issues.is_empty() {
        println!("No issues.");
        return Ok(());
    }

    for issue in issues {
        println!("{}  (last seen {})", issue.value, issue.detected_at.to_rfc3339());
    }
    Ok(())
}

async fn handle_dismiss(config: &Config, email: &str) -> anyhow::Result<()> {
    let detector = EmailDetector::new();
    if !detector.is_valid(email) {
        anyhow::bail!("'{email}' is not a valid email address");
    }

    let gate = open_gate(config)?;
    gate.dismiss(email).await?;
    println!("Dismissed {email} for the next 24 hours.");
    Ok(())
}

fn handle_scan(cmd: &ScanCommand) -> anyhow::Result<()> {
    let text = match &cmd.text {
        Some(text) => text.clone(),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            buffer
        }
    };

    let detection = EmailDetector::new().detect(&text);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&detection.values)?);
        return Ok(());
    }

    if detection.found {
        for value in &detection.values {
            println!("{value}");
        }
    } else {
        println!("No email addresses found.");
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Selectors]");
                println!("  Editor:           {}", config.selectors.editor);
                println!("  Submit control:   {}", config.selectors.submit_control);
                println!(
                    "  Composer form:    class '{}' / data-type '{}'",
                    config.selectors.composer_form_class, config.selectors.composer_form_data_type
                );
                println!("  Overlay:          {}", config.selectors.overlay_container);
                println!();
                println!("[Monitor]");
                println!("  Poll interval:    {}ms", config.monitor.poll_interval_ms);
                println!(
                    "  Discovery limit:  {}ms",
                    config.monitor.discovery_timeout_ms
                );
                println!("  Alert delay:      {}ms", config.monitor.alert_delay_ms);
                println!();
                println!("[Store]");
                println!("  Document:         {}", config.store_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
