#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::process;

use anyhow::Context;
use bucketsync_core::StorageService;
use bucketsync_migrate::{ExitStatus, MigrationSummary, Migrator};
use bucketsync_reqwest::{ReqwestClient, ReqwestConfig, StorageEndpoint};

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "bucketsync_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "bucketsync_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "bucketsync_cli::config";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let result = run().await;
    let code = exit_code(&result);

    match result {
        Ok(_) => {
            tracing::info!(
                target: TRACING_TARGET_SHUTDOWN,
                exit_code = code,
                "application terminated"
            );
        }
        Err(error) if tracing::enabled!(tracing::Level::ERROR) => {
            tracing::error!(
                target: TRACING_TARGET_SHUTDOWN,
                error = %format!("{error:#}"),
                "application terminated with error"
            );
        }
        Err(error) => eprintln!("Error: {error:#}"),
    }

    process::exit(code);
}

/// Maps the outcome of a run onto the process exit status.
///
/// Any error, including invalid arguments, is a configuration or aborted
/// run and exits with [`ExitStatus::Error`].
fn exit_code(result: &anyhow::Result<ExitStatus>) -> i32 {
    match result {
        Ok(status) => status.code(),
        Err(_) => ExitStatus::Error.code(),
    }
}

/// Main application entry point.
async fn run() -> anyhow::Result<ExitStatus> {
    let cli = Cli::init()?;

    telemetry::init_tracing(cli.telemetry.log_format)?;
    cli.validate()?;
    cli.log();

    let source = create_service(cli.endpoints.source()?, &cli.http, "source")
        .context("failed to create source client")?;
    let destination = create_service(cli.endpoints.destination()?, &cli.http, "destination")
        .context("failed to create destination client")?;

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = cli.migration.dry_run,
        "starting bucket migration"
    );

    let migrator = Migrator::new(source, destination, cli.migration.to_options());
    let summary = migrator.run().await.context("migration aborted")?;

    print_summary(&summary)?;
    Ok(summary.exit_status())
}

/// Creates a labelled storage service for one project.
fn create_service(
    endpoint: StorageEndpoint,
    http: &ReqwestConfig,
    label: &'static str,
) -> anyhow::Result<StorageService> {
    let client = ReqwestClient::new(endpoint, http.clone())?;
    Ok(client.into_service(label))
}

/// Prints the per-bucket summary as pretty JSON on standard output.
fn print_summary(summary: &MigrationSummary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary).context("failed to render summary")?;
    println!("\n=== Summary ===");
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_exit_with_error_status() {
        let result = Cli::from_args(["bucketsync", "--page-size", "0"]).map(|_| ExitStatus::Success);
        assert_eq!(exit_code(&result), 1);
    }

    #[test]
    fn test_run_outcomes_map_to_exit_codes() {
        assert_eq!(exit_code(&Ok(ExitStatus::Success)), 0);
        assert_eq!(exit_code(&Ok(ExitStatus::PartialFailure)), 2);
        assert_eq!(exit_code(&Err(anyhow::anyhow!("migration aborted"))), 1);
    }
}
