//! Batch command handlers

use anyhow::Result;
use colored::*;
use sqlx::SqlitePool;

use crate::cli::BatchCommands;
use crate::services::batches;
use crate::storage::sqlite::SqliteStore;

pub async fn handle(pool: &SqlitePool, command: BatchCommands) -> Result<()> {
    match command {
        BatchCommands::List => {
            let mut conn = pool.acquire().await?;
            let mut store = SqliteStore::new(&mut conn);
            for batch in batches::filter(&mut store).await? {
                println!("  #{} {} ${}", batch.id, batch.name.cyan(), batch.value);
            }
        }
    }
    Ok(())
}
