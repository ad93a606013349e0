//! CloudKeeper command-line dashboard.

mod cli;
mod commands;
mod prompt;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cloudkeeper_app::{setup_sql, AppState, AppStateBuilder};
use cloudkeeper_core::CoreError;
use cloudkeeper_toolbox::ToolboxConfig;

use crate::cli::{Cli, GlobalOpts};

/// Upper bound on waiting for audit writes before exiting.
const AUDIT_FLUSH_TIMEOUT: Duration = Duration::from_secs(20);

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if err
                .downcast_ref::<CoreError>()
                .is_some_and(CoreError::is_setup_error)
            {
                eprintln!("\nThe remote tables are missing. Run this SQL on the database:\n");
                eprintln!("{}", setup_sql());
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let state = build_state(&cli.global)?;
    let result = dispatch(cli, &state).await;

    if tokio::time::timeout(AUDIT_FLUSH_TIMEOUT, state.audit.flush())
        .await
        .is_err()
    {
        tracing::warn!(
            "Audit entries still pending after {}s, some may be lost",
            AUDIT_FLUSH_TIMEOUT.as_secs()
        );
    }
    result
}

async fn dispatch(cli: Cli, state: &AppState) -> Result<()> {
    if let Err(e) = state.run_startup().await {
        if cli.command.needs_records() {
            return Err(e.into());
        }
        tracing::warn!("Loading records failed: {e}");
    }
    tracing::debug!(command = ?cli.command, "dispatching command");
    commands::dispatch(cli.command, state, &cli.global).await
}

fn build_state(global: &GlobalOpts) -> Result<AppState> {
    let data_dir = data_dir(global)?;
    tracing::debug!("data directory: {}", data_dir.display());

    let toolbox_config = ToolboxConfig {
        ai_api_key: global.gemini_api_key.clone(),
        probe_timeout: Duration::from_secs(global.probe_timeout.max(1)),
        ..ToolboxConfig::default()
    };

    Ok(AppStateBuilder::new()
        .data_dir(data_dir)
        .toolbox_config(toolbox_config)
        .build()?)
}

fn data_dir(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(dir) = &global.data_dir {
        return Ok(dir.clone());
    }
    dirs::data_dir()
        .map(|dir| dir.join("cloudkeeper"))
        .context("No data directory on this platform; pass --data-dir")
}
