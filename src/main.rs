use anyhow::Result;
use clap::Parser;
use tracing::warn;

mod cli;
mod commands;
mod error;
mod kinds;
mod kubectl;
mod report;

use cli::Cli;
use kinds::SCAN_ORDER;
use kubectl::Kubectl;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    // Diagnostics go to stderr so the report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let kubectl = Kubectl::new();
    if which::which(kubectl.binary()).is_err() {
        warn!(
            "'{}' not found on PATH; every cluster query will come back empty",
            kubectl.binary()
        );
    }

    let kinds = match cli.resource_type {
        Some(kind) => vec![kind],
        None => SCAN_ORDER.to_vec(),
    };

    if cli.list_only {
        commands::list::execute(&kubectl, &kinds, cli.namespace.as_deref(), cli.name.as_deref())
            .await?;
    } else {
        commands::diagnose::execute(
            &kubectl,
            &kinds,
            cli.namespace.as_deref(),
            cli.name.as_deref(),
            cli.verbose,
            cli.long_output,
        )
        .await?;
    }

    Ok(())
}
