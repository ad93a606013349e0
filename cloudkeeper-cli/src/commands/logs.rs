use anyhow::Result;

use cloudkeeper_app::AppState;

use super::print_json;
use crate::cli::{GlobalOpts, LogsCommand};
use crate::render;

pub async fn handle(state: &AppState, cmd: LogsCommand, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LogsCommand::Show { limit } => {
            let mut entries = state.audit.logs().await;
            entries.truncate(limit);
            if global.json {
                return print_json(&serde_json::to_value(&entries)?);
            }
            print!("{}", render::audit_table(&entries));
        }
        LogsCommand::Export { dir } => {
            let path = state.audit.export_logs(&dir).await?;
            println!("Wrote {}", path.display());
        }
        LogsCommand::Clear => {
            state.audit.clear_local_logs().await?;
            println!("Local audit log cleared.");
        }
    }
    Ok(())
}
