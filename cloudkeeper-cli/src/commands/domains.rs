//! Record commands.

use std::time::Duration;

use anyhow::{bail, Result};

use cloudkeeper_app::AppState;
use cloudkeeper_core::services::SweepScheduler;
use cloudkeeper_core::traits::FixedAnswer;
use cloudkeeper_core::types::DomainRecordUpdate;

use super::print_json;
use crate::cli::{EditArgs, GlobalOpts};
use crate::prompt::StdinConfirm;
use crate::render;

pub async fn list(state: &AppState, search: Option<&str>, global: &GlobalOpts) -> Result<()> {
    let records = match search {
        Some(query) => state.controller.filter(query).await,
        None => state.controller.records().await,
    };
    if global.json {
        return print_json(&serde_json::to_value(&records)?);
    }
    print!("{}", render::record_table(&records));
    Ok(())
}

pub async fn show(state: &AppState, id: &str, global: &GlobalOpts) -> Result<()> {
    state.controller.select(Some(id)).await?;
    let Some(record) = state.controller.selected().await else {
        bail!("Domain not found: {id}");
    };
    if global.json {
        return print_json(&serde_json::to_value(&record)?);
    }
    print!("{}", render::record_detail(&record));
    Ok(())
}

pub async fn add(state: &AppState, url: &str, global: &GlobalOpts) -> Result<()> {
    let provisional = state.controller.begin_add(url).await?;
    eprintln!("Added {} ({}), gathering details...", provisional.name, provisional.id);

    let record = state.controller.complete_add(provisional).await;
    if global.json {
        return print_json(&serde_json::to_value(&record)?);
    }
    print!("{}", render::record_detail(&record));
    Ok(())
}

pub async fn refresh(state: &AppState, id: &str) -> Result<()> {
    let status = state.controller.refresh(id).await?;
    println!("{id}: {status}");
    Ok(())
}

pub async fn analyze(state: &AppState, id: &str, global: &GlobalOpts) -> Result<()> {
    let record = state.controller.analyze(id).await?;
    if global.json {
        return print_json(&serde_json::to_value(&record)?);
    }
    print!("{}", render::record_detail(&record));
    Ok(())
}

pub async fn edit(state: &AppState, args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let update = DomainRecordUpdate {
        name: args.name,
        description: args.description,
        owner: args.owner,
        ..DomainRecordUpdate::default()
    };
    let record = state.controller.edit(&args.id, &update).await?;
    if global.json {
        return print_json(&serde_json::to_value(&record)?);
    }
    print!("{}", render::record_detail(&record));
    Ok(())
}

pub async fn delete(state: &AppState, id: &str, yes: bool) -> Result<()> {
    let deleted = if yes {
        state.controller.delete(id, &FixedAnswer(true)).await?
    } else {
        state.controller.delete(id, &StdinConfirm).await?
    };
    if deleted {
        println!("Deleted {id}.");
    } else {
        println!("Cancelled.");
    }
    Ok(())
}

pub async fn watch(state: &AppState, interval: u64, now: bool) -> Result<()> {
    if interval == 0 {
        bail!("--interval must be at least 1 second");
    }
    if now {
        let report = state.controller.sweep().await?;
        println!(
            "Checked {}: {} online, {} offline",
            report.checked, report.online, report.offline
        );
    }

    let handle = SweepScheduler::spawn(state.controller.clone(), Duration::from_secs(interval));
    eprintln!("Sweeping every {interval}s, press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await?;
    handle.stop().await;
    print!("{}", render::record_table(&state.controller.records().await));
    Ok(())
}
