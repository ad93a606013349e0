use anyhow::Result;

use cloudkeeper_app::{setup_sql, AppState};
use cloudkeeper_core::types::StorageConfig;

use crate::cli::StorageCommand;
use crate::render;

pub async fn handle(state: &AppState, cmd: StorageCommand) -> Result<()> {
    match cmd {
        StorageCommand::Local => {
            let count = state.configure_storage(StorageConfig::local()).await?;
            println!("Using local storage ({count} records).");
        }
        StorageCommand::Remote { url, key } => {
            let count = state
                .configure_storage(StorageConfig::remote(url, key))
                .await?;
            println!("Connected to remote storage ({count} records).");
        }
        StorageCommand::Show => {
            print!("{}", render::storage(&state.storage.config().await?));
        }
        StorageCommand::SetupSql => print!("{}", setup_sql()),
    }
    Ok(())
}
