//! Command handlers.

mod auth;
mod domains;
mod logs;
mod storage;
mod transfer;

use anyhow::{bail, Result};
use serde_json::Value;

use cloudkeeper_app::AppState;

use crate::cli::{Command, GlobalOpts};

pub async fn dispatch(cmd: Command, state: &AppState, global: &GlobalOpts) -> Result<()> {
    if !cmd.is_public() && !state.auth.is_authenticated().await? {
        bail!("Not logged in. Run `cloudkeeper login --username <name>` first.");
    }

    match cmd {
        Command::Login { username, password } => auth::login(state, &username, password).await,
        Command::Logout => auth::logout(state).await,
        Command::List { search } => domains::list(state, search.as_deref(), global).await,
        Command::Show { id } => domains::show(state, &id, global).await,
        Command::Add { url } => domains::add(state, &url, global).await,
        Command::Refresh { id } => domains::refresh(state, &id).await,
        Command::Analyze { id } => domains::analyze(state, &id, global).await,
        Command::Edit(args) => domains::edit(state, args, global).await,
        Command::Delete { id, yes } => domains::delete(state, &id, yes).await,
        Command::Watch { interval, now } => domains::watch(state, interval, now).await,
        Command::Storage(cmd) => storage::handle(state, cmd).await,
        Command::Logs(cmd) => logs::handle(state, cmd, global).await,
        Command::Import { file } => transfer::import(state, &file).await,
        Command::Export { file } => transfer::export(state, &file).await,
    }
}

/// Print pretty JSON to stdout.
fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
