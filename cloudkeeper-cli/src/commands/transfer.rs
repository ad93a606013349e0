//! JSON import / export of records.

use std::path::Path;

use anyhow::{Context, Result};

use cloudkeeper_app::AppState;
use cloudkeeper_core::types::DomainRecord;

pub async fn import(state: &AppState, file: &Path) -> Result<()> {
    let raw = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let records: Vec<DomainRecord> = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not a list of domain records", file.display()))?;
    let count = state.controller.import(records).await?;
    println!("Imported {count} records.");
    Ok(())
}

pub async fn export(state: &AppState, file: &Path) -> Result<()> {
    let records = state.controller.export().await;
    let body = serde_json::to_string_pretty(&records)?;
    tokio::fs::write(file, body)
        .await
        .with_context(|| format!("writing {}", file.display()))?;
    println!("Exported {} records to {}", records.len(), file.display());
    Ok(())
}
